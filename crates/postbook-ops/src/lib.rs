//! High-level operations shared by postbook commands.
//!
//! [`Operations::load`] is the content collector: it scans a directory, parses
//! every selected post and returns the documents in filename order. The other
//! operations build listings, batch checks and the post index on top of it.

mod paths;
mod scan;

use std::io;
use std::path::{Path, PathBuf};

use postbook_config::Config;
use postbook_format::{
    CheckFinding, CheckFormat, CheckReport, IndexEntry, IndexFormat, ListFormat, Renderer,
};
use postbook_parser::{Document, DocumentError, ParseError, ParserContext};
use postbook_utils::atomic_write;
use thiserror::Error;
use tracing::{debug, info};

pub use paths::{link_target, normalize_path, relative_path};

/// Errors surfaced by postbook operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("collection directory {} does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl OperationError {
    /// Process exit code the CLI reports for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(_) | Self::Render(_) => 1,
            Self::MissingDirectory { .. } | Self::Io { .. } => 4,
        }
    }
}

impl From<DocumentError> for OperationError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Io { path, source } => OperationError::Io { path, source },
            DocumentError::Parse(err) => OperationError::Parse(err),
        }
    }
}

/// Which directory to scan and whether ignore files apply.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Collection directory; `None` uses `collection.dir` from config.
    pub directory: Option<PathBuf>,
    pub respect_ignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            directory: None,
            respect_ignore: true,
        }
    }
}

impl ScanOptions {
    pub fn for_directory(directory: impl Into<PathBuf>) -> Self {
        ScanOptions {
            directory: Some(directory.into()),
            ..ScanOptions::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ListOptions {
    pub scan: ScanOptions,
    pub format: ListFormat,
}

#[derive(Debug)]
pub struct ListOutcome {
    pub documents: Vec<Document>,
    pub rendered: String,
}

#[derive(Clone, Debug)]
pub struct CheckOptions {
    pub scan: ScanOptions,
    pub format: CheckFormat,
}

#[derive(Debug)]
pub struct CheckOutcome {
    pub report: CheckReport,
    pub rendered: String,
    pub exit_code: i32,
}

#[derive(Clone, Debug)]
pub struct IndexOptions {
    pub scan: ScanOptions,
    pub format: IndexFormat,
    /// Destination override; `None` uses `index.output` from config.
    pub output_path: Option<PathBuf>,
    /// Markdown output is written to disk only when this is set.
    pub write_to_disk: bool,
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub rendered: String,
    pub written_to: Option<PathBuf>,
    pub post_count: usize,
}

/// Operation bundle wiring configuration, parser and renderer together.
pub struct Operations {
    config: Config,
    parser: ParserContext,
    renderer: Renderer,
}

impl Operations {
    pub fn new(config: Config) -> Self {
        let parser = ParserContext::new(&config);
        let renderer = Renderer::from_config(&config);
        Self {
            config,
            parser,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load every post under `directory`, in filename order.
    ///
    /// The first malformed post aborts the load with its [`ParseError`].
    pub fn load(&self, directory: &Path) -> Result<Vec<Document>, OperationError> {
        self.load_with(&ScanOptions::for_directory(directory))
    }

    /// Load the collection described by `scan`.
    pub fn load_with(&self, scan: &ScanOptions) -> Result<Vec<Document>, OperationError> {
        let directory = self.resolve_directory(scan.directory.as_deref());
        let targets = scan::collect_targets(&self.config, &directory, scan.respect_ignore)?;

        let mut documents = Vec::with_capacity(targets.len());
        for relative in &targets {
            documents.push(self.parser.document_for_path(&directory, relative)?);
        }

        info!(
            directory = %directory.display(),
            posts = documents.len(),
            "loaded collection"
        );
        Ok(documents)
    }

    pub fn list(&self, options: ListOptions) -> Result<ListOutcome, OperationError> {
        let documents = self.load_with(&options.scan)?;
        let rendered = self.renderer.render_listing(&documents, options.format)?;
        Ok(ListOutcome {
            documents,
            rendered,
        })
    }

    /// Parse every post and report all failures instead of stopping at the first.
    pub fn check(&self, options: CheckOptions) -> Result<CheckOutcome, OperationError> {
        let directory = self.resolve_directory(options.scan.directory.as_deref());
        let targets =
            scan::collect_targets(&self.config, &directory, options.scan.respect_ignore)?;

        let mut report = CheckReport {
            files_scanned: targets.len(),
            findings: Vec::new(),
        };

        for relative in &targets {
            match self.parser.document_for_path(&directory, relative) {
                Ok(_) => {}
                Err(DocumentError::Parse(err)) => {
                    debug!(path = %err.path.display(), error = %err.kind, "post failed to parse");
                    report.findings.push(CheckFinding {
                        path: err.path,
                        message: err.kind.to_string(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            directory = %directory.display(),
            posts = report.files_scanned,
            errors = report.findings.len(),
            "checked collection"
        );

        let rendered = self.renderer.render_check(&report, options.format)?;
        let exit_code = if report.is_clean() { 0 } else { 1 };
        Ok(CheckOutcome {
            report,
            rendered,
            exit_code,
        })
    }

    /// Render the post index, writing Markdown output to disk when requested.
    pub fn index(&self, options: IndexOptions) -> Result<IndexOutcome, OperationError> {
        let directory = self.resolve_directory(options.scan.directory.as_deref());
        let documents = self.load_with(&ScanOptions {
            directory: Some(directory.clone()),
            respect_ignore: options.scan.respect_ignore,
        })?;

        let output_path = options
            .output_path
            .map(|path| self.resolve_path(&path))
            .unwrap_or_else(|| self.config.index.output.clone());
        let output_dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.project.root.clone());

        let entries: Vec<IndexEntry<'_>> = documents
            .iter()
            .map(|document| {
                let target = directory.join(document.path());
                let link = relative_path(&output_dir, &target).unwrap_or(target);
                IndexEntry {
                    document,
                    link: link_target(&link),
                }
            })
            .collect();

        let rendered = self.renderer.render_index(&entries, options.format)?;

        let written_to = if options.write_to_disk && options.format == IndexFormat::Markdown {
            atomic_write(&output_path, &rendered).map_err(|source| OperationError::Io {
                path: output_path.clone(),
                source,
            })?;
            info!(path = %output_path.display(), posts = documents.len(), "wrote index");
            Some(output_path)
        } else {
            None
        };

        Ok(IndexOutcome {
            rendered,
            written_to,
            post_count: documents.len(),
        })
    }

    fn resolve_directory(&self, directory: Option<&Path>) -> PathBuf {
        match directory {
            Some(path) => self.resolve_path(path),
            None => self.config.collection.dir.clone(),
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path.to_path_buf())
        } else {
            normalize_path(self.config.sources.working_directory.join(path))
        }
    }
}
