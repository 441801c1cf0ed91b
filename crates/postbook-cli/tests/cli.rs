use std::fs;

use assert_cmd::Command;
use postbook_test_support::{post, site_with_posts, write_file};
use predicates::prelude::*;

fn postbook() -> Command {
    let mut cmd = Command::cargo_bin("postbook").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_prints_posts_in_filename_order() {
    let site = site_with_posts(&[
        ("2014-02-10-es6.md", &post("post", "ES6 features", "let\n")),
        ("2013-11-20-backbone.md", &post("post", "Backbone views", "v\n")),
    ]);

    let output = postbook()
        .current_dir(site.path())
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("stdout utf8");
    let backbone = stdout.find("Backbone views").expect("backbone listed");
    let es6 = stdout.find("ES6 features").expect("es6 listed");
    assert!(backbone < es6);
}

#[test]
fn list_json_accepts_explicit_directory() {
    let site = site_with_posts(&[]);
    write_file(
        site.path(),
        "blog/posts/2015-01-02-json-api.md",
        &post("post", "JSON API", "links\n"),
    );

    let output = postbook()
        .current_dir(site.path())
        .args(["list", "blog/posts", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(value[0]["title"], "JSON API");
    assert_eq!(value[0]["date"], "2015-01-02");
}

#[test]
fn malformed_header_fails_with_file_name() {
    let site = site_with_posts(&[(
        "2014-01-02-unclosed.md",
        "---\nlayout: post\ntitle: Oops\n",
    )]);

    postbook()
        .current_dir(site.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("2014-01-02-unclosed.md"))
        .stderr(predicate::str::contains("not closed"));
}

#[test]
fn check_reports_all_failures_and_quiet_success() {
    let site = site_with_posts(&[
        ("2014-01-01-a.md", "---\nlayout: post\n---\nbody\n"),
        ("2014-01-02-b.md", "no header at all\n"),
    ]);

    postbook()
        .current_dir(site.path())
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("2014-01-01-a.md: missing required front matter key 'title'"))
        .stdout(predicate::str::contains("2014-01-02-b.md: missing front matter"))
        .stdout(predicate::str::contains("Checked 2 posts: 2 errors"));

    let clean = site_with_posts(&[("2014-01-01-a.md", &post("post", "A", "a\n"))]);
    postbook()
        .current_dir(clean.path())
        .args(["check", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn index_writes_markdown_file() {
    let site = site_with_posts(&[(
        "2014-04-02-requirejs.md",
        &post("post", "RequireJS modules", "define\n"),
    )]);

    postbook()
        .current_dir(site.path())
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 post to"));

    let index = fs::read_to_string(site.path().join("POSTS.md")).expect("read index");
    assert!(index.contains("## 2014"));
    assert!(index.contains("[RequireJS modules](_posts/2014-04-02-requirejs.md)"));
}

#[test]
fn index_stdout_does_not_touch_disk() {
    let site = site_with_posts(&[("about.md", &post("page", "About", "me\n"))]);

    postbook()
        .current_dir(site.path())
        .args(["index", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Undated"));

    assert!(!site.path().join("POSTS.md").exists());
}

#[test]
fn invalid_config_exits_with_code_two() {
    let site = site_with_posts(&[]);
    write_file(
        site.path(),
        ".postbook.toml",
        "[collection]\ninclude_patterns = [\"[[\"]\n",
    );

    postbook()
        .current_dir(site.path())
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid glob pattern"));
}

#[test]
fn missing_collection_directory_exits_with_code_four() {
    let site = site_with_posts(&[]);

    postbook()
        .current_dir(site.path())
        .args(["list", "nowhere"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn json_logs_go_to_stderr_and_keep_stdout_parseable() {
    let site = site_with_posts(&[("2014-02-10-es6.md", &post("post", "ES6 features", "let\n"))]);

    let assert = postbook()
        .current_dir(site.path())
        .args(["-v", "--log-format", "json", "list", "--format", "json"])
        .assert()
        .success();
    let output = assert.get_output();

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(listing[0]["title"], "ES6 features");

    let stderr = String::from_utf8(output.stderr.clone()).expect("stderr utf8");
    assert!(stderr.contains("loaded collection"));
    for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
        serde_json::from_str::<serde_json::Value>(line).expect("json log line");
    }
}
