use std::path::{Component, Path, PathBuf};

/// Canonicalise `.` and `..` path segments without touching the filesystem.
pub fn normalize_path(path: PathBuf) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Compute a relative path from `from` to `to`. Returns `None` when the paths
/// reside on different filesystem roots (e.g., different Windows drives).
pub fn relative_path(from: &Path, to: &Path) -> Option<PathBuf> {
    let from_components: Vec<_> = from.components().collect();
    let to_components: Vec<_> = to.components().collect();

    if has_mismatched_prefix(&from_components, &to_components) {
        return None;
    }

    let mut common = 0usize;
    while common < from_components.len()
        && common < to_components.len()
        && components_equal(from_components[common], to_components[common])
    {
        common += 1;
    }

    let mut result = PathBuf::new();
    for component in from_components.iter().skip(common) {
        match component {
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            _ => result.push(".."),
        }
    }

    for component in to_components.iter().skip(common) {
        match component {
            Component::CurDir => {}
            _ => result.push(component.as_os_str()),
        }
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }

    Some(result)
}

/// Render a path as a Markdown link target using forward slashes.
pub fn link_target(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_mismatched_prefix(from: &[Component<'_>], to: &[Component<'_>]) -> bool {
    match (from.first(), to.first()) {
        (Some(Component::Prefix(fp)), Some(Component::Prefix(tp))) => fp.kind() != tp.kind(),
        (Some(Component::Prefix(_)), _) | (_, Some(Component::Prefix(_))) => true,
        _ => false,
    }
}

fn components_equal(a: Component<'_>, b: Component<'_>) -> bool {
    match (a, b) {
        (Component::Prefix(pa), Component::Prefix(pb)) => pa.kind() == pb.kind(),
        _ => a.as_os_str() == b.as_os_str(),
    }
}
