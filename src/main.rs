// Main entry point for teamcity-reporter

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use teamcity_reporter::cli::Cli;
use teamcity_reporter::config::{Config, ReporterOptions};
use teamcity_reporter::execution::RunDriver;
use teamcity_reporter::report::TeamcityReporter;

use std::fs::File;
use std::io::{self, BufReader};

fn main() -> Result<()> {
    let cli = Cli::parse();

    teamcity_reporter::logging::init(cli.verbose);

    // Handle init_config flag
    if let Some(config_file) = &cli.init_config {
        let toml_content = Config::default().to_toml();
        std::fs::write(config_file, toml_content).with_context(|| {
            format!("Failed to write configuration file: {}", config_file.display())
        })?;
        info!("Configuration file created: {}", config_file.display());
        return Ok(());
    }

    // Handle completion flag
    if let Some(shell_type) = &cli.completion {
        return handle_completion(shell_type);
    }

    // Configuration precedence:
    //   1. Command-line arguments (highest)
    //   2. Configuration file
    //   3. Environment variables
    //   4. Built-in defaults (lowest)
    let mut config = Config::load().unwrap_or_default();
    cli.apply(&mut config.reporter);
    let options = ReporterOptions::resolve(&config.reporter);
    debug!("reporter options: {:?}", options);

    let mut driver = RunDriver::new(TeamcityReporter::new(options));
    match cli.events_path() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open events file: {}", path.display()))?;
            driver.replay(BufReader::new(file))?;
        }
        None => {
            driver.replay(io::stdin().lock())?;
        }
    }

    Ok(())
}

fn handle_completion(shell_type: &str) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{Shell, generate};

    let shell = match shell_type {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" => Shell::PowerShell,
        _ => return Err(anyhow::anyhow!("Unsupported shell type '{}'", shell_type)),
    };

    let mut command = Cli::command();
    generate(shell, &mut command, "teamcity-reporter", &mut io::stdout());
    Ok(())
}
