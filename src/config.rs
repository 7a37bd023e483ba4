// Configuration file handling and reporter options

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the artifact root for attachments
pub const ENV_TEAMCITY_ARTIFACTS: &str = "TEAMCITY_ARTIFACTS_PW_RESULT";

/// Artifact root used when neither configuration nor environment name one
pub const DEFAULT_ARTIFACTS: &str = "test-results";

/// Configuration file name, looked up in the current then the home directory
pub const CONFIG_FILE_NAME: &str = ".teamcity-reporter.toml";

/// Which of the two report layouts to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportDesign {
    /// One flow id per test, hierarchy inferred from test names
    #[default]
    FlowKeyed,
    /// One flow id per run, explicit suite envelopes replayed from buffers
    SuiteReplay,
}

impl FromStr for ReportDesign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flow" | "flow-keyed" => Ok(Self::FlowKeyed),
            "suite" | "suite-replay" => Ok(Self::SuiteReplay),
            other => Err(format!(
                "unknown report design '{}' (expected flow-keyed or suite-replay)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reporter: ReporterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Artifact root path or archive name attachments are addressed under
    #[serde(default)]
    pub test_metadata_artifacts: Option<String>,

    /// Emit the run configuration as a `message`
    #[serde(default)]
    pub log_config: bool,

    /// Report layout
    #[serde(default)]
    pub design: ReportDesign,

    /// Depth of the suites results are grouped under (root=0, project=1, file=2)
    #[serde(default = "default_suite_depth")]
    pub suite_depth: usize,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            test_metadata_artifacts: None,
            log_config: false,
            design: ReportDesign::default(),
            suite_depth: default_suite_depth(),
        }
    }
}

pub fn default_suite_depth() -> usize {
    2
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Option<Self> {
        // Check locations in order:
        // 1. .teamcity-reporter.toml (current directory)
        // 2. ~/.teamcity-reporter.toml (home directory)

        let paths = search_paths(std::env::current_dir().ok(), dirs::home_dir());
        Self::load_first(&paths)
    }

    /// Load the first candidate that exists
    fn load_first(paths: &[PathBuf]) -> Option<Self> {
        paths
            .iter()
            .find(|path| path.exists())
            .and_then(|path| Self::load_from_file(path))
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Generate default configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }
}

/// Candidate config files; a missing directory only drops its own candidate
fn search_paths(cwd: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    [cwd, home]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .collect()
}

/// Settings the reporter reads, resolved once at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterOptions {
    pub test_metadata_artifacts: String,
    pub log_config: bool,
    pub design: ReportDesign,
    pub suite_depth: usize,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            test_metadata_artifacts: DEFAULT_ARTIFACTS.to_string(),
            log_config: false,
            design: ReportDesign::default(),
            suite_depth: default_suite_depth(),
        }
    }
}

impl ReporterOptions {
    /// Resolve against the process environment
    pub fn resolve(config: &ReporterConfig) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// The artifact root comes from the configuration, then
    /// `TEAMCITY_ARTIFACTS_PW_RESULT`, then `test-results`.
    pub fn resolve_with(config: &ReporterConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let test_metadata_artifacts = config
            .test_metadata_artifacts
            .clone()
            .or_else(|| env(ENV_TEAMCITY_ARTIFACTS))
            .unwrap_or_else(|| DEFAULT_ARTIFACTS.to_string());

        Self {
            test_metadata_artifacts,
            log_config: config.log_config,
            design: config.design,
            suite_depth: config.suite_depth,
        }
    }
}
