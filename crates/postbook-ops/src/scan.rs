use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use postbook_config::{Config, IGNORE_FILE_NAME};
use tracing::trace;

use crate::{normalize_path, OperationError};

/// Collect post files under `directory`, relative to it, in collection order.
///
/// Files are selected by the collection include/exclude globs and the project
/// exclude list. The generated index (`index.output`) is never collected, so a
/// collection rooted at the project root does not pick up its own index.
/// Order is file name first, relative path second.
pub(crate) fn collect_targets(
    config: &Config,
    directory: &Path,
    respect_ignore: bool,
) -> Result<Vec<PathBuf>, OperationError> {
    if !directory.is_dir() {
        return Err(OperationError::MissingDirectory {
            path: directory.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(directory);
    builder
        .standard_filters(respect_ignore)
        .hidden(true)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    if respect_ignore {
        builder.add_custom_ignore_filename(IGNORE_FILE_NAME);
    }

    let index_output = normalize_path(config.index.output.clone());
    let mut targets = Vec::new();
    for result in builder.build() {
        let entry = result.map_err(|err| {
            let message = err.to_string();
            OperationError::Io {
                path: directory.to_path_buf(),
                source: err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message)),
            }
        })?;

        if !entry.file_type().is_some_and(|kind| kind.is_file()) {
            continue;
        }

        let absolute = entry.path();
        let Ok(relative) = absolute.strip_prefix(directory) else {
            continue;
        };

        if normalize_path(absolute.to_path_buf()) == index_output {
            trace!(path = %relative.display(), "skipping generated index");
            continue;
        }

        if !is_selected(config, absolute, relative) {
            trace!(path = %relative.display(), "skipping file outside collection patterns");
            continue;
        }

        targets.push(relative.to_path_buf());
    }

    targets.sort_by(compare_collection_order);
    Ok(targets)
}

fn is_selected(config: &Config, absolute: &Path, relative: &Path) -> bool {
    let collection = &config.collection;
    if !collection.include.matches(relative) || collection.exclude.matches(relative) {
        return false;
    }

    let project_relative = absolute
        .strip_prefix(&config.project.root)
        .unwrap_or(relative);
    !config.project.exclude.matches(project_relative)
}

fn compare_collection_order(a: &PathBuf, b: &PathBuf) -> Ordering {
    a.file_name()
        .cmp(&b.file_name())
        .then_with(|| a.cmp(b))
}
