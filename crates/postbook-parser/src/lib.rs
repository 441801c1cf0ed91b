//! Front matter parsing for Jekyll-style posts.
//!
//! A post is a text file whose first line is `---`, followed by a YAML header,
//! a closing `---` (or `...`) line and a Markdown body. The parser turns that
//! text into an immutable [`Document`], attaching the filename-derived date and
//! slug. Malformed input never yields a partially populated document: every
//! failure is reported as a [`ParseError`] naming the offending file.

mod document;
mod error;
mod front_matter;

use std::fs;
use std::path::{Path, PathBuf};

use postbook_config::Config;
use tracing::debug;

pub use document::{parse_document, parse_filename, Document, ParseRules};
pub use error::{DocumentError, ParseError, ParseErrorKind};
pub use front_matter::{parse_header, render_source, split_front_matter, FrontMatterSplit};

/// High-level parser context configured with resolved settings.
#[derive(Clone, Debug)]
pub struct ParserContext {
    rules: ParseRules,
}

impl ParserContext {
    /// Construct a parser using the collection rules from `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_rules(ParseRules {
            required_keys: config.collection.required_keys.clone(),
            require_date: config.collection.require_date,
        })
    }

    pub fn with_rules(rules: ParseRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ParseRules {
        &self.rules
    }

    /// Read and parse the post at `root.join(relative)`.
    ///
    /// Errors and the resulting document carry `relative` as their path.
    pub fn document_for_path(
        &self,
        root: &Path,
        relative: &Path,
    ) -> Result<Document, DocumentError> {
        let absolute: PathBuf = root.join(relative);
        let bytes = fs::read(&absolute).map_err(|source| DocumentError::Io {
            path: absolute.clone(),
            source,
        })?;
        let contents = String::from_utf8(bytes).map_err(|err| {
            ParseError::new(
                relative,
                ParseErrorKind::InvalidEncoding(err.utf8_error().valid_up_to()),
            )
        })?;

        let document = self.document_from_str(relative, &contents)?;
        debug!(
            path = %relative.display(),
            title = document.title(),
            bytes = contents.len(),
            "parsed post"
        );
        Ok(document)
    }

    /// Parse a post from an in-memory buffer.
    pub fn document_from_str(&self, path: &Path, contents: &str) -> Result<Document, ParseError> {
        parse_document(path, contents, &self.rules)
    }
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::with_rules(ParseRules::default())
    }
}
