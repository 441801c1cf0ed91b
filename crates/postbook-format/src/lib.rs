//! Output formatters for postbook commands.
//!
//! Rendering is kept apart from collection so the CLI can stream listings and
//! reports as plain text or JSON, and the index operation can write Markdown.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};
use postbook_config::Config;
use postbook_parser::Document;
use serde::Serialize;

/// Output format for `list`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListFormat {
    Plain,
    Json,
}

/// Output format for `check`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CheckFormat {
    Plain,
    Json,
}

/// Output format for `index`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexFormat {
    Markdown,
    Json,
}

/// A file that failed to parse during `check`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CheckFinding {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregated result of checking a collection.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CheckReport {
    pub files_scanned: usize,
    pub findings: Vec<CheckFinding>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// A document paired with the link the index should use for it.
#[derive(Clone, Debug)]
pub struct IndexEntry<'a> {
    pub document: &'a Document,
    pub link: String,
}

#[derive(Serialize)]
struct PostRecord<'a> {
    path: String,
    slug: &'a str,
    date: Option<NaiveDate>,
    layout: Option<&'a str>,
    title: &'a str,
    tags: Vec<String>,
    categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<String>,
}

impl<'a> PostRecord<'a> {
    fn from_document(document: &'a Document) -> Self {
        PostRecord {
            path: display_path(document),
            slug: document.slug(),
            date: document.date(),
            layout: document.layout(),
            title: document.title(),
            tags: document.tags(),
            categories: document.categories(),
            link: None,
            excerpt: None,
        }
    }
}

#[derive(Serialize)]
struct IndexPayload<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    generated_at: String,
    total: usize,
    posts: Vec<PostRecord<'a>>,
}

/// Renders collections and reports using settings from configuration.
pub struct Renderer {
    index_title: String,
    project_name: Option<String>,
}

impl Renderer {
    /// Build a renderer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index_title: config.index.title.clone(),
            project_name: config.project.name.clone(),
        }
    }

    /// One line per post in collection order, or a JSON array.
    pub fn render_listing(
        &self,
        documents: &[Document],
        format: ListFormat,
    ) -> serde_json::Result<String> {
        match format {
            ListFormat::Json => {
                let records: Vec<_> = documents.iter().map(PostRecord::from_document).collect();
                serde_json::to_string_pretty(&records)
            }
            ListFormat::Plain => {
                let mut out = String::new();
                for document in documents {
                    let date = document
                        .date()
                        .map(|date| date.to_string())
                        .unwrap_or_else(|| "----------".into());
                    out.push_str(&format!(
                        "{date}  {:<8}  {}  ({})\n",
                        document.layout().unwrap_or("-"),
                        document.title(),
                        display_path(document)
                    ));
                }
                Ok(out)
            }
        }
    }

    pub fn render_check(
        &self,
        report: &CheckReport,
        format: CheckFormat,
    ) -> serde_json::Result<String> {
        match format {
            CheckFormat::Json => serde_json::to_string_pretty(report),
            CheckFormat::Plain => {
                let mut out = String::new();
                for finding in &report.findings {
                    out.push_str(&format!(
                        "{}: {}\n",
                        finding.path.display(),
                        finding.message
                    ));
                }
                let errors = match report.findings.len() {
                    0 => "no errors".to_string(),
                    1 => "1 error".to_string(),
                    count => format!("{count} errors"),
                };
                out.push_str(&format!(
                    "Checked {}: {errors}\n",
                    post_count(report.files_scanned)
                ));
                Ok(out)
            }
        }
    }

    /// Render the navigable index.
    ///
    /// Markdown groups dated posts by year, newest first, followed by undated
    /// posts in collection order. JSON keeps collection order.
    pub fn render_index(
        &self,
        entries: &[IndexEntry<'_>],
        format: IndexFormat,
    ) -> serde_json::Result<String> {
        match format {
            IndexFormat::Json => {
                let posts = entries
                    .iter()
                    .map(|entry| PostRecord {
                        link: Some(entry.link.as_str()),
                        excerpt: entry.document.excerpt(),
                        ..PostRecord::from_document(entry.document)
                    })
                    .collect();
                let payload = IndexPayload {
                    title: &self.index_title,
                    project: self.project_name.as_deref(),
                    generated_at: Utc::now().to_rfc3339(),
                    total: entries.len(),
                    posts,
                };
                serde_json::to_string_pretty(&payload)
            }
            IndexFormat::Markdown => Ok(self.render_index_markdown(entries)),
        }
    }

    fn render_index_markdown(&self, entries: &[IndexEntry<'_>]) -> String {
        let mut by_year: BTreeMap<i32, Vec<&IndexEntry<'_>>> = BTreeMap::new();
        let mut undated = Vec::new();
        for entry in entries {
            match entry.document.date() {
                Some(date) => by_year.entry(date.year()).or_default().push(entry),
                None => undated.push(entry),
            }
        }

        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.index_title));
        if let Some(name) = &self.project_name {
            out.push_str(&format!("_{name}: {}_\n\n", post_count(entries.len())));
        }

        for (year, mut posts) in by_year.into_iter().rev() {
            // Stable sort keeps collection order for posts sharing a date.
            posts.sort_by(|a, b| b.document.date().cmp(&a.document.date()));
            out.push_str(&format!("## {year}\n\n"));
            for entry in posts {
                let date = entry
                    .document
                    .date()
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                out.push_str(&format!(
                    "- {date} [{}]({})\n",
                    escape_link_text(entry.document.title()),
                    entry.link
                ));
            }
            out.push('\n');
        }

        if !undated.is_empty() {
            out.push_str("## Undated\n\n");
            for entry in undated {
                out.push_str(&format!(
                    "- [{}]({})\n",
                    escape_link_text(entry.document.title()),
                    entry.link
                ));
            }
            out.push('\n');
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

/// `"1 post"`, `"3 posts"`.
pub fn post_count(count: usize) -> String {
    if count == 1 {
        "1 post".to_string()
    } else {
        format!("{count} posts")
    }
}

fn display_path(document: &Document) -> String {
    document.path().to_string_lossy().replace('\\', "/")
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
