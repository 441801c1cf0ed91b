//! Configuration primitives and loader for the postbook toolkit.
//!
//! The loader resolves configuration using a fixed precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed settings are normalised into typed structures so downstream crates
//! can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".postbook.toml";

/// Name of the per-directory ignore file honoured by collection scans.
pub const IGNORE_FILE_NAME: &str = ".postbook-ignore";

const DEFAULT_COLLECTION_DIR: &str = "_posts";
const DEFAULT_INDEX_OUTPUT: &str = "POSTS.md";
const DEFAULT_INDEX_TITLE: &str = "Posts";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub project: ProjectSettings,
    pub collection: CollectionSettings,
    pub index: IndexSettings,
    pub sources: ConfigSources,
}

/// Project-level settings that declare repository scope boundaries.
#[derive(Clone, Debug)]
pub struct ProjectSettings {
    pub name: Option<String>,
    pub root: PathBuf,
    pub exclude: PatternList,
}

/// Settings that govern which files form the post collection and how they parse.
#[derive(Clone, Debug)]
pub struct CollectionSettings {
    pub dir: PathBuf,
    pub include: PatternList,
    pub exclude: PatternList,
    pub required_keys: Vec<String>,
    pub require_date: bool,
}

/// Settings for the generated post index.
#[derive(Clone, Debug)]
pub struct IndexSettings {
    pub output: PathBuf,
    pub title: String,
}

/// Pattern plus compiled matcher helper.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    matcher: GlobMatcher,
}

impl Pattern {
    fn new(source: &ConfigSource, value: String) -> Result<Self, ConfigValidationError> {
        match Glob::new(&value) {
            Ok(glob) => Ok(Pattern {
                original: value,
                matcher: glob.compile_matcher(),
            }),
            Err(err) => Err(ConfigValidationError::new(
                Some(source.clone()),
                format!("invalid glob pattern '{value}': {err}"),
            )),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

/// Ordered list of glob patterns.
#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    fn new(patterns: Vec<Pattern>) -> Self {
        PatternList { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Returns true when any pattern in the list matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(&default_source));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, &source)?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, &source)?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, &source)?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            project: resolved.project,
            collection: resolved.collection,
            index: resolved.index,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Absolute path of the configured post directory.
    pub fn collection_dir(&self) -> &Path {
        &self.collection.dir
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: &ConfigSource) -> PartialConfig {
    let project = ProjectPartial {
        root: Some(Located::new(PathBuf::from("."), source.clone())),
        exclude: Some(Located::new(Vec::new(), source.clone())),
        ..ProjectPartial::default()
    };

    let collection = CollectionPartial {
        dir: Some(Located::new(
            PathBuf::from(DEFAULT_COLLECTION_DIR),
            source.clone(),
        )),
        include_patterns: Some(Located::new(
            vec!["**/*.md".into(), "**/*.markdown".into()],
            source.clone(),
        )),
        exclude_patterns: Some(Located::new(Vec::new(), source.clone())),
        required_keys: Some(Located::new(
            vec!["layout".into(), "title".into()],
            source.clone(),
        )),
        require_date: Some(Located::new(false, source.clone())),
    };

    let index = IndexPartial {
        output: Some(Located::new(
            PathBuf::from(DEFAULT_INDEX_OUTPUT),
            source.clone(),
        )),
        title: Some(Located::new(DEFAULT_INDEX_TITLE.into(), source.clone())),
    };

    PartialConfig {
        project: Some(project),
        collection: Some(collection),
        index: Some(index),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    project: Option<ProjectPartial>,
    collection: Option<CollectionPartial>,
    index: Option<IndexPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_project) = other.project.take() {
            match &mut self.project {
                Some(project) => project.merge(other_project),
                None => self.project = Some(other_project),
            }
        }

        if let Some(other_collection) = other.collection.take() {
            match &mut self.collection {
                Some(collection) => collection.merge(other_collection),
                None => self.collection = Some(other_collection),
            }
        }

        if let Some(other_index) = other.index.take() {
            match &mut self.index {
                Some(index) => index.merge(other_index),
                None => self.index = Some(other_index),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let project_partial = self.project.unwrap_or_default();
        let project_root_loc = project_partial
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from("."), fallback()));
        let project_root = resolve_path(&project_root_loc);
        let project_exclude = compile_patterns(
            project_partial.exclude.unwrap_or_default(),
            "project.exclude",
            &mut errors,
        );

        let collection_partial = self.collection.unwrap_or_default();
        let dir_loc = collection_partial
            .dir
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_COLLECTION_DIR), fallback()));
        let collection_dir = resolve_path(&dir_loc);

        let include_loc = collection_partial.include_patterns.unwrap_or_default();
        if include_loc.value.is_empty() {
            errors.push(
                ConfigValidationError::new(
                    Some(include_loc.source.clone()),
                    "at least one include pattern is required".into(),
                )
                .with_context("collection.include_patterns"),
            );
        }
        let include = compile_patterns(include_loc, "collection.include_patterns", &mut errors);
        let exclude = compile_patterns(
            collection_partial.exclude_patterns.unwrap_or_default(),
            "collection.exclude_patterns",
            &mut errors,
        );

        let required_keys = collection_partial
            .required_keys
            .map(|located| validate_required_keys(located, &mut errors))
            .unwrap_or_else(|| vec!["layout".into(), "title".into()]);

        let require_date = collection_partial
            .require_date
            .map(|located| located.value)
            .unwrap_or(false);

        let index_partial = self.index.unwrap_or_default();
        let output_loc = index_partial
            .output
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_INDEX_OUTPUT), fallback()));
        let index_output = resolve_path(&output_loc);

        let title_loc = index_partial
            .title
            .unwrap_or_else(|| Located::new(DEFAULT_INDEX_TITLE.into(), fallback()));
        if title_loc.value.trim().is_empty() {
            errors.push(
                ConfigValidationError::new(
                    Some(title_loc.source.clone()),
                    "cannot be empty".into(),
                )
                .with_context("index.title"),
            );
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            project: ProjectSettings {
                name: project_partial.name.map(|name| name.value),
                root: project_root,
                exclude: PatternList::new(project_exclude),
            },
            collection: CollectionSettings {
                dir: collection_dir,
                include: PatternList::new(include),
                exclude: PatternList::new(exclude),
                required_keys,
                require_date,
            },
            index: IndexSettings {
                output: index_output,
                title: title_loc.value,
            },
        })
    }
}

#[derive(Clone, Debug, Default)]
struct ProjectPartial {
    name: Option<Located<String>>,
    root: Option<Located<PathBuf>>,
    exclude: Option<Located<Vec<String>>>,
}

impl ProjectPartial {
    fn merge(&mut self, other: ProjectPartial) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct CollectionPartial {
    dir: Option<Located<PathBuf>>,
    include_patterns: Option<Located<Vec<String>>>,
    exclude_patterns: Option<Located<Vec<String>>>,
    required_keys: Option<Located<Vec<String>>>,
    require_date: Option<Located<bool>>,
}

impl CollectionPartial {
    fn merge(&mut self, other: CollectionPartial) {
        if other.dir.is_some() {
            self.dir = other.dir;
        }
        if other.include_patterns.is_some() {
            self.include_patterns = other.include_patterns;
        }
        if other.exclude_patterns.is_some() {
            self.exclude_patterns = other.exclude_patterns;
        }
        if other.required_keys.is_some() {
            self.required_keys = other.required_keys;
        }
        if other.require_date.is_some() {
            self.require_date = other.require_date;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct IndexPartial {
    output: Option<Located<PathBuf>>,
    title: Option<Located<String>>,
}

impl IndexPartial {
    fn merge(&mut self, other: IndexPartial) {
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.title.is_some() {
            self.title = other.title;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

impl Default for Located<Vec<String>> {
    fn default() -> Self {
        Located::new(Vec::new(), ConfigSource::default(PathBuf::from(".")))
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

fn compile_patterns(
    located: Located<Vec<String>>,
    context: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for pattern in located.value {
        match Pattern::new(&located.source, pattern) {
            Ok(compiled) => patterns.push(compiled),
            Err(err) => errors.push(err.with_context(context)),
        }
    }
    patterns
}

fn validate_required_keys(
    located: Located<Vec<String>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(located.value.len());
    for key in located.value {
        let trimmed = key.trim();
        if trimmed.is_empty() {
            errors.push(
                ConfigValidationError::new(
                    Some(located.source.clone()),
                    "keys cannot be blank".into(),
                )
                .with_context("collection.required_keys"),
            );
            continue;
        }
        if !keys.iter().any(|existing| existing == trimmed) {
            keys.push(trimmed.to_string());
        }
    }

    // `title` backs the document invariant, so it is always enforced.
    if !keys.iter().any(|key| key == "title") {
        keys.insert(0, "title".into());
    }
    keys
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    project: ProjectSettings,
    collection: CollectionSettings,
    index: IndexSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    project: Option<RawProject>,
    #[serde(default)]
    collection: Option<RawCollection>,
    #[serde(default)]
    index: Option<RawIndex>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        PartialConfig {
            project: self.project.map(|project| project.into_partial(source)),
            collection: self
                .collection
                .map(|collection| collection.into_partial(source)),
            index: self.index.map(|index| index.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    root: Option<PathBuf>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

impl RawProject {
    fn into_partial(self, source: &ConfigSource) -> ProjectPartial {
        ProjectPartial {
            name: self.name.map(|value| Located::new(value, source.clone())),
            root: self.root.map(|value| Located::new(value, source.clone())),
            exclude: self
                .exclude
                .map(|value| Located::new(value, source.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCollection {
    #[serde(default)]
    dir: Option<PathBuf>,
    #[serde(default)]
    include_patterns: Option<Vec<String>>,
    #[serde(default)]
    exclude_patterns: Option<Vec<String>>,
    #[serde(default)]
    required_keys: Option<Vec<String>>,
    #[serde(default)]
    require_date: Option<bool>,
}

impl RawCollection {
    fn into_partial(self, source: &ConfigSource) -> CollectionPartial {
        CollectionPartial {
            dir: self.dir.map(|value| Located::new(value, source.clone())),
            include_patterns: self
                .include_patterns
                .map(|value| Located::new(value, source.clone())),
            exclude_patterns: self
                .exclude_patterns
                .map(|value| Located::new(value, source.clone())),
            required_keys: self
                .required_keys
                .map(|value| Located::new(value, source.clone())),
            require_date: self
                .require_date
                .map(|value| Located::new(value, source.clone())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIndex {
    #[serde(default)]
    output: Option<PathBuf>,
    #[serde(default)]
    title: Option<String>,
}

impl RawIndex {
    fn into_partial(self, source: &ConfigSource) -> IndexPartial {
        IndexPartial {
            output: self.output.map(|value| Located::new(value, source.clone())),
            title: self.title.map(|value| Located::new(value, source.clone())),
        }
    }
}
