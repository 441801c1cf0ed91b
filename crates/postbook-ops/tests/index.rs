use std::fs;

use postbook_format::IndexFormat;
use postbook_ops::{IndexOptions, Operations, ScanOptions};
use postbook_test_support::{config_for, post, site_with_posts, write_file};

#[test]
fn markdown_index_is_written_with_links_relative_to_output() {
    let site = site_with_posts(&[
        (
            "2013-12-01-grunt.md",
            &post("post", "Scaffolding with Grunt", "grunt init\n"),
        ),
        (
            "2014-04-02-requirejs.md",
            &post("post", "RequireJS modules", "define([], fn)\n"),
        ),
    ]);
    write_file(
        site.path(),
        ".postbook.toml",
        "[index]\noutput = \"site/index.md\"\ntitle = \"Archive\"\n",
    );

    let ops = Operations::new(config_for(site.path()));
    let outcome = ops
        .index(IndexOptions {
            scan: ScanOptions::default(),
            format: IndexFormat::Markdown,
            output_path: None,
            write_to_disk: true,
        })
        .expect("index");

    let written = outcome.written_to.expect("index written");
    assert!(written.ends_with("site/index.md"));
    assert_eq!(outcome.post_count, 2);

    let on_disk = fs::read_to_string(&written).expect("read index");
    assert_eq!(on_disk, outcome.rendered);
    assert!(on_disk.starts_with("# Archive\n"));
    assert!(on_disk.contains("- 2014-04-02 [RequireJS modules](../_posts/2014-04-02-requirejs.md)"));
    assert!(on_disk.contains("- 2013-12-01 [Scaffolding with Grunt](../_posts/2013-12-01-grunt.md)"));

    let newest = on_disk.find("## 2014").expect("2014 heading");
    let oldest = on_disk.find("## 2013").expect("2013 heading");
    assert!(newest < oldest);
}

#[test]
fn json_index_is_not_written() {
    let site = site_with_posts(&[(
        "2015-01-02-json-api.md",
        "---\nlayout: post\ntitle: JSON API\ntags: [api, json]\n---\nResources carry a `type`.\n\nMore.\n",
    )]);

    let ops = Operations::new(config_for(site.path()));
    let outcome = ops
        .index(IndexOptions {
            scan: ScanOptions::default(),
            format: IndexFormat::Json,
            output_path: None,
            write_to_disk: true,
        })
        .expect("index");

    assert!(outcome.written_to.is_none());
    assert!(!site.path().join("POSTS.md").exists());

    let value: serde_json::Value = serde_json::from_str(&outcome.rendered).expect("json");
    assert_eq!(value["title"], "Posts");
    assert_eq!(value["total"], 1);
    let first = &value["posts"][0];
    assert_eq!(first["link"], "_posts/2015-01-02-json-api.md");
    assert_eq!(first["tags"][1], "json");
    assert_eq!(first["excerpt"], "Resources carry a type.");
}
