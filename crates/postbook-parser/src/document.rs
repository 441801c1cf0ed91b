use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::error::{ParseError, ParseErrorKind};
use crate::front_matter::{parse_header, render_source, split_front_matter};

/// Validation rules applied while turning source text into a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRules {
    pub required_keys: Vec<String>,
    pub require_date: bool,
}

impl Default for ParseRules {
    fn default() -> Self {
        ParseRules {
            required_keys: vec!["layout".into(), "title".into()],
            require_date: false,
        }
    }
}

/// A single post: front matter, filename-derived metadata and Markdown body.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    path: PathBuf,
    slug: String,
    date: Option<NaiveDate>,
    title: String,
    layout: Option<String>,
    front_matter: Mapping,
    body: String,
}

impl Document {
    /// Path relative to the collection directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Publication date taken from the `YYYY-MM-DD-` filename prefix.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Every header key in file order.
    pub fn front_matter(&self) -> &Mapping {
        &self.front_matter
    }

    /// Markdown body exactly as it appeared after the closing delimiter.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Values under `tags`, given either as a YAML list or a space separated string.
    pub fn tags(&self) -> Vec<String> {
        string_list(self.front_matter.get("tags"))
    }

    /// Values under `categories`, using the same rules as [`Document::tags`].
    pub fn categories(&self) -> Vec<String> {
        string_list(self.front_matter.get("categories"))
    }

    /// Plain text of the first Markdown paragraph, if the body has one.
    pub fn excerpt(&self) -> Option<String> {
        let mut text = String::new();
        let mut in_paragraph = false;

        for event in Parser::new(&self.body) {
            match event {
                Event::Start(Tag::Paragraph) => in_paragraph = true,
                Event::End(Tag::Paragraph) if in_paragraph => break,
                Event::Text(chunk) | Event::Code(chunk) if in_paragraph => text.push_str(&chunk),
                Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
                _ => {}
            }
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Re-serialize the header and body into post source text.
    pub fn to_source(&self) -> Result<String, serde_yaml::Error> {
        render_source(&self.front_matter, &self.body)
    }
}

/// Parse a post from its source text.
///
/// `path` is used for the filename date and slug and is attached to any error.
pub fn parse_document(
    path: &Path,
    contents: &str,
    rules: &ParseRules,
) -> Result<Document, ParseError> {
    build_document(path, contents, rules).map_err(|kind| ParseError::new(path, kind))
}

fn build_document(
    path: &Path,
    contents: &str,
    rules: &ParseRules,
) -> Result<Document, ParseErrorKind> {
    let (date, slug) = parse_filename(path)?;
    if rules.require_date && date.is_none() {
        return Err(ParseErrorKind::MissingDate);
    }

    let split = split_front_matter(contents)?;
    let front_matter = parse_header(split.header)?;

    for key in &rules.required_keys {
        match front_matter.get(key.as_str()) {
            None | Some(Value::Null) => return Err(ParseErrorKind::MissingKey(key.clone())),
            Some(_) => {}
        }
    }

    let title = scalar_field(&front_matter, "title")?
        .ok_or_else(|| ParseErrorKind::MissingKey("title".into()))?;
    let layout = scalar_field(&front_matter, "layout")?;

    if split.body.trim().is_empty() {
        return Err(ParseErrorKind::EmptyBody);
    }

    Ok(Document {
        path: path.to_path_buf(),
        slug,
        date,
        title,
        layout,
        front_matter,
        body: split.body.to_string(),
    })
}

/// Extract the optional date prefix and slug from a post filename.
pub fn parse_filename(path: &Path) -> Result<(Option<NaiveDate>, String), ParseErrorKind> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(captures) = date_prefix().captures(&stem) else {
        return Ok((None, stem));
    };

    let raw_date = &captures[1];
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| ParseErrorKind::InvalidDate(raw_date.to_string()))?;
    Ok((Some(date), captures[2].to_string()))
}

fn date_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})-(.+)$").expect("date prefix pattern is valid")
    })
}

fn scalar_field(front_matter: &Mapping, key: &str) -> Result<Option<String>, ParseErrorKind> {
    let text = match front_matter.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(value)) => value.trim().to_string(),
        Some(Value::Number(value)) => value.to_string(),
        Some(Value::Bool(value)) => value.to_string(),
        Some(_) => return Err(ParseErrorKind::InvalidValue(key.to_string())),
    };

    if text.is_empty() {
        return Err(ParseErrorKind::InvalidValue(key.to_string()));
    }
    Ok(Some(text))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => text.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
