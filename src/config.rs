//! Configuration management for padcell.
//!
//! This module provides the [`Config`] struct which controls probing, reporting
//! and the formats (named step chains) to enforce. Configuration can be loaded from:
//! - TOML files (`padcell.toml`)
//! - CLI arguments (which override file settings)
//!
//! Config files are auto-discovered by searching parent directories from the
//! project root up to the filesystem root, plus the user's home directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diff::report::{DEFAULT_MAX_FILES_TO_LIST, DEFAULT_MAX_MESSAGE_LINES};
use crate::error::ConfigError;
use crate::process::{Exemptions, DEFAULT_MAX_ITERATIONS, MIN_ITERATIONS};
use crate::step::{Formatter, LineEnding, StepChain, StepSpec};

/// Config file names to search for (in order of priority, later overrides earlier)
pub const CONFIG_FILE_NAMES: &[&str] = &["padcell.toml"];

/// The only configuration schema this build understands.
pub const CONFIG_VERSION: u32 = 1;

/// Parent of the per-format diagnostic directories.
pub const DEFAULT_DIAGNOSE_DIR: &str = "build/padcell-diagnose";

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}
fn default_max_message_lines() -> usize {
    DEFAULT_MAX_MESSAGE_LINES
}
fn default_max_files_to_list() -> usize {
    DEFAULT_MAX_FILES_TO_LIST
}
fn default_diagnose_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DIAGNOSE_DIR)
}

/// Main configuration struct for padcell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema version (must be 1)
    #[serde(default = "default_version")]
    pub version: u32,

    /// Applications of a format before it is declared divergent (default: 10)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Diff lines shown across all files in one report (default: 50)
    #[serde(default = "default_max_message_lines")]
    pub max_message_lines: usize,

    /// Files that may get a diff body before falling back to names (default: 10)
    #[serde(default = "default_max_files_to_list")]
    pub max_files_to_list: usize,

    /// Tolerate misbehaving steps and dump their orbits (default: false)
    #[serde(default)]
    pub padded_cell: bool,

    /// Line ending for formats that don't set their own (default: unix)
    #[serde(default)]
    pub line_ending: LineEnding,

    /// Where orbit dumps go, relative to the root (default: build/padcell-diagnose)
    #[serde(default = "default_diagnose_dir")]
    pub diagnose_dir: PathBuf,

    /// Named step chains, in declaration order
    #[serde(default, rename = "format")]
    pub formats: Vec<FormatConfig>,
}

/// A `(step, path glob)` exemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    pub step: String,
    pub path: String,
}

/// One `[[format]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    pub name: String,

    /// Root-relative globs selecting files (empty selects everything)
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub steps: Vec<StepSpec>,

    #[serde(default)]
    pub skip_steps: Vec<String>,

    #[serde(default)]
    pub skip_paths: Vec<String>,

    #[serde(default)]
    pub skip: Vec<SkipRule>,

    #[serde(default)]
    pub ignore_errors_for_steps: Vec<String>,

    #[serde(default)]
    pub ignore_errors_for_paths: Vec<String>,

    /// Overrides the top-level `line_ending`
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
}

/// Partial configuration for TOML parsing
///
/// All scalar fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub version: Option<u32>,
    pub max_iterations: Option<usize>,
    pub max_message_lines: Option<usize>,
    pub max_files_to_list: Option<usize>,
    pub padded_cell: Option<bool>,
    pub line_ending: Option<LineEnding>,
    pub diagnose_dir: Option<PathBuf>,
    #[serde(default, rename = "format")]
    pub formats: Vec<FormatConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: CONFIG_VERSION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_message_lines: DEFAULT_MAX_MESSAGE_LINES,
            max_files_to_list: DEFAULT_MAX_FILES_TO_LIST,
            padded_cell: false,
            line_ending: LineEnding::default(),
            diagnose_dir: default_diagnose_dir(),
            formats: Vec::new(),
        }
    }
}

impl Config {
    /// Validate configuration values are within reasonable bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        let minimums = [
            ("max_iterations", MIN_ITERATIONS, self.max_iterations),
            ("max_message_lines", 1, self.max_message_lines),
            ("max_files_to_list", 1, self.max_files_to_list),
        ];
        for (key, min, value) in minimums {
            if value < min {
                return Err(ConfigError::BelowMinimum { key, min, value });
            }
        }

        let mut seen = HashSet::new();
        for format in &self.formats {
            if !seen.insert(format.name.as_str()) {
                return Err(ConfigError::DuplicateFormat(format.name.clone()));
            }
            format.validate()?;
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text on top of the defaults
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let partial: PartialConfig = toml::from_str(contents)?;
        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    ///
    /// Formats are merged by name: a later table replaces an earlier one with
    /// the same name, new names are appended.
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.version {
            self.version = v;
        }
        if let Some(v) = partial.max_iterations {
            self.max_iterations = v;
        }
        if let Some(v) = partial.max_message_lines {
            self.max_message_lines = v;
        }
        if let Some(v) = partial.max_files_to_list {
            self.max_files_to_list = v;
        }
        if let Some(v) = partial.padded_cell {
            self.padded_cell = v;
        }
        if let Some(v) = partial.line_ending {
            self.line_ending = v;
        }
        if let Some(v) = partial.diagnose_dir {
            self.diagnose_dir = v;
        }
        for format in partial.formats {
            match self.formats.iter_mut().find(|f| f.name == format.name) {
                Some(existing) => *existing = format,
                None => self.formats.push(format),
            }
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_file() {
            start_path.parent().map(Path::to_path_buf)
        } else if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::env::current_dir().ok()
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Unreadable or malformed files are skipped with a warning.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in Self::discover_config_files(start_path) {
            debug!("Loading config from {}", path.display());
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }

    /// Look up a format by name
    pub fn format(&self, name: &str) -> Result<&FormatConfig, ConfigError> {
        self.formats
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ConfigError::UnknownFormat(name.to_string()))
    }
}

impl FormatConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptyFormat(self.name.clone()));
        }
        self.build(LineEnding::default())?;
        self.exemptions()?;
        self.include_patterns()?;
        self.exclude_patterns()?;
        Ok(())
    }

    /// Instantiate every step, falling back to `default_line_ending`.
    pub fn build(&self, default_line_ending: LineEnding) -> Result<Formatter, ConfigError> {
        let mut chain = StepChain::new();
        for spec in &self.steps {
            let step = spec.build().map_err(|source| ConfigError::InvalidRegex {
                format: self.name.clone(),
                step: spec.name().to_string(),
                source,
            })?;
            chain.push(step);
        }
        Ok(Formatter::new(
            self.name.clone(),
            chain,
            self.line_ending.unwrap_or(default_line_ending),
        ))
    }

    /// Compile the skip and ignore-errors settings.
    pub fn exemptions(&self) -> Result<Exemptions, ConfigError> {
        let mut exemptions = Exemptions::default();
        for step in &self.skip_steps {
            exemptions = exemptions.skip_step(step.clone());
        }
        for pattern in self.compile(&self.skip_paths)? {
            exemptions = exemptions.skip_path(pattern);
        }
        for rule in &self.skip {
            let pattern = self.compile_one(&rule.path)?;
            exemptions = exemptions.skip_step_for_path(rule.step.clone(), pattern);
        }
        for step in &self.ignore_errors_for_steps {
            exemptions = exemptions.ignore_errors_for_step(step.clone());
        }
        for pattern in self.compile(&self.ignore_errors_for_paths)? {
            exemptions = exemptions.ignore_errors_for_path(pattern);
        }
        Ok(exemptions)
    }

    pub fn include_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.compile(&self.include)
    }

    pub fn exclude_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.compile(&self.exclude)
    }

    fn compile(&self, patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
        patterns.iter().map(|p| self.compile_one(p)).collect()
    }

    fn compile_one(&self, pattern: &str) -> Result<Pattern, ConfigError> {
        Pattern::new(pattern).map_err(|source| ConfigError::InvalidGlob {
            format: self.name.clone(),
            pattern: pattern.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
max_iterations = 5
padded_cell = true

[[format]]
name = "misc"
include = ["**/*.txt"]
skip_paths = ["vendor/**"]
steps = [
    { kind = "trim-trailing-whitespace" },
    { kind = "end-with-newline" },
    { kind = "replace-regex", name = "no-tabs", pattern = "\t", replacement = "  " },
]

[[format.skip]]
step = "end-with-newline"
path = "*.raw.txt"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.max_message_lines, 50);
        assert_eq!(config.max_files_to_list, 10);
        assert!(!config.padded_cell);
        assert_eq!(config.line_ending, LineEnding::Unix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.max_iterations, 5);
        assert!(config.padded_cell);
        assert_eq!(config.max_message_lines, 50);
        let misc = config.format("misc").unwrap();
        assert_eq!(misc.steps.len(), 3);
        assert_eq!(misc.steps[2].name(), "no-tabs");
        assert_eq!(
            misc.skip,
            [SkipRule {
                step: "end-with-newline".to_string(),
                path: "*.raw.txt".to_string()
            }]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_build_formatter_runs_steps_in_order() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let formatter = config.format("misc").unwrap().build(LineEnding::Unix).unwrap();
        assert_eq!(formatter.name(), "misc");
        assert_eq!(formatter.compute("a\tb  ").unwrap(), "a  b\n");
    }

    #[test]
    fn test_exemptions_from_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let exemptions = config.format("misc").unwrap().exemptions().unwrap();
        assert!(exemptions.skips_path("vendor/lib/a.txt"));
        assert!(!exemptions.skips_path("src/a.txt"));
        assert!(exemptions.skips_step("end-with-newline", "notes.raw.txt"));
        assert!(!exemptions.skips_step("trim-trailing-whitespace", "notes.raw.txt"));
    }

    #[test]
    fn test_config_apply_partial_preserves_unset() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        let partial: PartialConfig = toml::from_str("max_message_lines = 20").unwrap();
        config.apply_partial(partial);
        assert_eq!(config.max_message_lines, 20);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.formats.len(), 1);
    }

    #[test]
    fn test_later_format_replaces_same_name() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        let partial: PartialConfig = toml::from_str(
            r#"
[[format]]
name = "misc"
steps = [{ kind = "end-with-newline" }]

[[format]]
name = "other"
steps = [{ kind = "indent", style = "tabs" }]
"#,
        )
        .unwrap();
        config.apply_partial(partial);
        let names: Vec<&str> = config.formats.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["misc", "other"]);
        assert_eq!(config.formats[0].steps, [StepSpec::EndWithNewline]);
    }

    #[test]
    fn test_discover_config_files_nonexistent_path() {
        let files = Config::discover_config_files(Path::new("/nonexistent/path/to/file"));
        assert!(files.iter().all(|f| f.is_file()));
    }

    #[test]
    fn test_validate_max_iterations() {
        let config = Config {
            max_iterations: 1,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BelowMinimum {
                key: "max_iterations",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_zero_message_lines() {
        let config = Config {
            max_message_lines: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_version() {
        let config = Config::from_toml_str("version = 2").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_validate_duplicate_and_empty_formats() {
        let mut dup = Config::from_toml_str(SAMPLE).unwrap();
        dup.formats.push(dup.formats[0].clone());
        assert!(matches!(dup.validate(), Err(ConfigError::DuplicateFormat(_))));

        let empty = Config::from_toml_str("[[format]]\nname = \"bare\"\n").unwrap();
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyFormat(_))));
    }

    #[test]
    fn test_validate_bad_regex_and_glob() {
        let regex = Config::from_toml_str(
            r#"
[[format]]
name = "x"
steps = [{ kind = "replace-regex", name = "broken", pattern = "(", replacement = "" }]
"#,
        )
        .unwrap();
        assert!(matches!(regex.validate(), Err(ConfigError::InvalidRegex { .. })));

        let glob = Config::from_toml_str(
            r#"
[[format]]
name = "x"
include = ["[unclosed"]
steps = [{ kind = "end-with-newline" }]
"#,
        )
        .unwrap();
        assert!(matches!(glob.validate(), Err(ConfigError::InvalidGlob { .. })));
    }

    #[test]
    fn test_unknown_format() {
        let config = Config::default();
        assert!(matches!(config.format("nope"), Err(ConfigError::UnknownFormat(_))));
    }
}
