// CLI argument definitions using Clap

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ReportDesign, ReporterConfig};

/// Translate recorded test run events into TeamCity service messages
#[derive(Parser, Debug)]
#[command(name = "teamcity-reporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report test run events to TeamCity as service messages", long_about = None)]
pub struct Cli {
    /// JSON-lines event file to replay (stdin when omitted or "-")
    #[arg(value_name = "EVENTS")]
    pub events: Option<PathBuf>,

    /// Report layout: flow-keyed (one flow per test) or suite-replay
    #[arg(long, value_name = "DESIGN")]
    pub design: Option<ReportDesign>,

    /// Artifact root (directory or .zip archive) attachments are addressed under
    #[arg(long, value_name = "PATH")]
    pub artifacts: Option<String>,

    /// Emit the run configuration as a service message
    #[arg(long, default_value_t = false)]
    pub log_config: bool,

    /// Do not emit the run configuration, even if the config file asks for it
    #[arg(long, default_value_t = false, conflicts_with = "log_config")]
    pub no_log_config: bool,

    /// Depth of the suites results are grouped under in suite-replay
    #[arg(long, value_name = "DEPTH")]
    pub suite_depth: Option<usize>,

    /// Enable verbose debug output
    #[arg(short = 'v', long, default_value_t = false)]
    pub verbose: bool,

    /// Create default configuration file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub init_config: Option<PathBuf>,

    /// Print shell completion (bash, zsh, fish, elvish, powershell)
    #[arg(long, value_name = "SHELL_TYPE", value_parser = ["bash", "zsh", "fish", "elvish", "powershell"])]
    pub completion: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut ReporterConfig) {
        if let Some(design) = self.design {
            config.design = design;
        }
        if let Some(artifacts) = &self.artifacts {
            config.test_metadata_artifacts = Some(artifacts.clone());
        }
        if self.log_config {
            config.log_config = true;
        }
        if self.no_log_config {
            config.log_config = false;
        }
        if let Some(depth) = self.suite_depth {
            config.suite_depth = depth;
        }
    }

    /// Events path, `None` meaning stdin
    pub fn events_path(&self) -> Option<&PathBuf> {
        self.events.as_ref().filter(|path| path.as_os_str() != "-")
    }
}
