use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use postbook_config::{Config, LoadOptions};
use postbook_parser::{
    parse_document, DocumentError, ParseErrorKind, ParseRules, ParserContext,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn parse(path: &str, contents: &str) -> Result<postbook_parser::Document, postbook_parser::ParseError> {
    parse_document(Path::new(path), contents, &ParseRules::default())
}

#[test]
fn minimal_post_loads_layout_title_and_body() {
    let doc = parse("example.md", "---\nlayout: post\ntitle: Example\n---\nHello")
        .expect("parse example");

    assert_eq!(doc.layout(), Some("post"));
    assert_eq!(doc.title(), "Example");
    assert_eq!(doc.body(), "Hello");
    assert_eq!(doc.slug(), "example");
    assert_eq!(doc.date(), None);
    assert_eq!(doc.path(), Path::new("example.md"));
}

#[test]
fn dated_post_keeps_extra_keys_in_order() {
    let contents = r#"---
layout: post
title: "Spies, stubs and mocks"
comments: true
tags:
  - sinon
  - mocha
---

Sinon spies record calls.

```js
var spy = sinon.spy();
```
"#;

    let doc = parse("2014-05-12-spies-stubs-mocks.md", contents).expect("parse post");

    assert_eq!(doc.date(), NaiveDate::from_ymd_opt(2014, 5, 12));
    assert_eq!(doc.slug(), "spies-stubs-mocks");
    assert_eq!(doc.title(), "Spies, stubs and mocks");
    assert_eq!(doc.tags(), vec!["sinon".to_string(), "mocha".to_string()]);

    let keys: Vec<&str> = doc
        .front_matter()
        .keys()
        .filter_map(|key| key.as_str())
        .collect();
    assert_eq!(keys, vec!["layout", "title", "comments", "tags"]);
    assert!(doc.body().starts_with("\nSinon spies record calls."));
    assert!(doc.body().ends_with("```\n"));
}

#[test]
fn round_trip_preserves_header_keys_and_body() {
    let contents = "---\ntitle: JSON API conventions\nlayout: post\ndate: 2015-01-02 10:00:00\ncategories: [api]\n---\nBody with --- inside.\n\n---\n\nTrailing rule above.\n";
    let doc = parse("2015-01-02-json-api.md", contents).expect("parse post");

    let source = doc.to_source().expect("serialize post");
    let reparsed = parse("2015-01-02-json-api.md", &source).expect("reparse post");

    assert_eq!(reparsed.front_matter(), doc.front_matter());
    assert_eq!(reparsed.body(), doc.body());
    assert_eq!(reparsed, doc);
}

#[test]
fn malformed_posts_fail_without_partial_documents() {
    let cases: Vec<(&str, ParseErrorKind)> = vec![
        (
            "layout: post\ntitle: A\n---\nbody",
            ParseErrorKind::MissingOpeningDelimiter,
        ),
        (
            "---\nlayout: post\ntitle: A\nbody\n",
            ParseErrorKind::MissingClosingDelimiter,
        ),
        (
            "---\n- layout\n- title\n---\nbody",
            ParseErrorKind::NotAMapping,
        ),
        (
            "---\nlayout: post\n---\nbody",
            ParseErrorKind::MissingKey("title".into()),
        ),
        (
            "---\ntitle: A\n---\nbody",
            ParseErrorKind::MissingKey("layout".into()),
        ),
        (
            "---\nlayout: post\ntitle: [a, b]\n---\nbody",
            ParseErrorKind::InvalidValue("title".into()),
        ),
        (
            "---\nlayout: post\ntitle: \"  \"\n---\nbody",
            ParseErrorKind::InvalidValue("title".into()),
        ),
        (
            "---\nlayout: post\ntitle: A\n---\n  \n\n",
            ParseErrorKind::EmptyBody,
        ),
    ];

    for (contents, expected) in cases {
        let err = parse("broken.md", contents).expect_err(contents);
        assert_eq!(err.path, PathBuf::from("broken.md"));
        assert_eq!(err.kind, expected, "input: {contents:?}");
    }
}

#[test]
fn invalid_yaml_names_the_file() {
    let err = parse("bad-yaml.md", "---\ntitle: \"unterminated\n---\nbody")
        .expect_err("invalid yaml");
    assert!(matches!(err.kind, ParseErrorKind::InvalidYaml(_)));
    assert!(err.to_string().starts_with("bad-yaml.md: invalid front matter YAML"));
}

#[test]
fn numeric_titles_are_accepted_as_text() {
    let doc = parse("1984.md", "---\nlayout: post\ntitle: 1984\n---\nBig brother.\n")
        .expect("numeric title");
    assert_eq!(doc.title(), "1984");
}

#[test]
fn context_applies_configured_rules() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join(".postbook.toml"),
        "[collection]\nrequired_keys = [\"title\"]\nrequire_date = true\n",
    )
    .expect("write config");
    let config =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).expect("load config");
    let parser = ParserContext::new(&config);
    assert_eq!(parser.rules().required_keys, vec!["title"]);
    assert!(parser.rules().require_date);

    let doc = parser
        .document_from_str(Path::new("2013-11-30-es6.md"), "---\ntitle: ES6\n---\nlet it be\n")
        .expect("layout is optional under this config");
    assert_eq!(doc.layout(), None);

    let err = parser
        .document_from_str(Path::new("es6.md"), "---\ntitle: ES6\n---\nlet it be\n")
        .expect_err("date prefix required");
    assert_eq!(err.kind, ParseErrorKind::MissingDate);
}

#[test]
fn document_for_path_reads_from_disk() {
    let temp = TempDir::new().expect("tempdir");
    let posts = temp.path().join("_posts");
    fs::create_dir_all(&posts).expect("create posts");
    fs::write(
        posts.join("2014-01-01-bower.md"),
        "---\nlayout: post\ntitle: Bower\n---\nbower install\n",
    )
    .expect("write post");

    let parser = ParserContext::default();
    let doc = parser
        .document_for_path(&posts, Path::new("2014-01-01-bower.md"))
        .expect("read post");
    assert_eq!(doc.title(), "Bower");
    assert_eq!(doc.path(), Path::new("2014-01-01-bower.md"));

    let missing = parser
        .document_for_path(&posts, Path::new("missing.md"))
        .expect_err("missing file");
    assert!(matches!(missing, DocumentError::Io { .. }));
}

#[test]
fn non_utf8_post_is_a_parse_error_naming_the_file() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(
        temp.path().join("2014-01-02-latin1.md"),
        b"---\nlayout: post\ntitle: Caf\xe9\n---\nbody\n",
    )
    .expect("write post");

    let err = ParserContext::default()
        .document_for_path(temp.path(), Path::new("2014-01-02-latin1.md"))
        .expect_err("invalid utf-8");
    match err {
        DocumentError::Parse(parse) => {
            assert_eq!(parse.path, PathBuf::from("2014-01-02-latin1.md"));
            assert_eq!(parse.kind, ParseErrorKind::InvalidEncoding(27));
        }
        other => panic!("unexpected error: {other}"),
    }
}
