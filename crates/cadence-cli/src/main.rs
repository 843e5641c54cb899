use clap::Parser;
use owo_colors::{OwoColorize, Style};
use cadence_core::error::CoreError;

mod calendar;
mod cli;
mod commands;
mod config;
mod logging;
mod views;

fn main() {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    let config = config::Config::new().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable configuration");
        config::Config::default()
    });

    let result = match cli.command {
        cli::Commands::Zone(command) => commands::zone::show_zone(command),
        cli::Commands::Occurrences(command) => {
            commands::occurrences::list_occurrences(command, &config)
        }
        cli::Commands::Transitions(command) => {
            commands::transitions::list_transitions(command, &config)
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        Some(CoreError::UnrecognizedTimeZone(id)) => {
            eprintln!(
                "{} '{}' is not a recognized time zone. Use IANA names like 'America/New_York'",
                "Error:".style(error_style),
                id.yellow()
            );
        }
        Some(CoreError::NonPositiveInterval(interval)) => {
            eprintln!(
                "{} Rule interval must be at least 1, got {}",
                "Error:".style(error_style),
                interval.yellow()
            );
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            if err.chain().count() > 1 {
                eprintln!("  in: {}", err);
            }
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
