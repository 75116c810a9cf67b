//! Config validation CLI tool
//!
//! Validates a focusd configuration file and reports any errors.

use focus_util::{default_config_path, format_countdown};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a focusd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match focus_config::load_config(&config_path) {
        Ok(config) => {
            let timer = &config.timer;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", focus_config::CURRENT_CONFIG_VERSION);
            println!("  Focus:          {}", format_countdown(timer.focus_seconds));
            println!("  Short break:    {}", format_countdown(timer.short_break_seconds));
            println!("  Long break:     {}", format_countdown(timer.long_break_seconds));
            if timer.long_breaks_enabled() {
                println!("  Long break every {} sessions", timer.sessions_per_round);
            } else {
                println!("  Long breaks disabled");
            }
            if timer.daily_goal > 0 {
                println!("  Daily goal:     {} sessions", timer.daily_goal);
            } else {
                println!("  Daily goal:     off");
            }
            println!("  Data dir:       {}", config.service.data_dir.display());

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                focus_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                focus_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                focus_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                focus_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        focus_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
