//! Shared test harness utilities for postbook crates.

use std::fs;
use std::path::{Path, PathBuf};

use postbook_config::{Config, LoadOptions};
use tempfile::TempDir;

/// Build post source text with `layout` and `title` headers.
pub fn post(layout: &str, title: &str, body: &str) -> String {
    format!("---\nlayout: {layout}\ntitle: \"{title}\"\n---\n{body}")
}

/// Write `contents` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(&path, contents).expect("write file");
    path
}

/// Temporary site with the given files under `_posts/`.
pub fn site_with_posts(posts: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir");
    fs::create_dir_all(temp.path().join("_posts")).expect("create _posts");
    for (name, contents) in posts {
        write_file(temp.path(), &format!("_posts/{name}"), contents);
    }
    temp
}

/// Load configuration rooted at `dir`, as the CLI would from that directory.
pub fn config_for(dir: &Path) -> Config {
    let working_dir = fs::canonicalize(dir).expect("canonicalize working dir");
    Config::load(LoadOptions::default().with_working_dir(working_dir)).expect("load config")
}
