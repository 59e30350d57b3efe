use std::fs;

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use librarian_client::Settings;
use librarian_client::settings::{MAX_K, MIN_K, data_dir};
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub mod ask;
pub mod health;
pub mod interactive;

const LOG_ENV: &str = "LIBRARIAN_LOG";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Base URL of the Smart Librarian backend
    #[arg(long, global = true, env = "LIBRARIAN_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive terminal UI (the default)
    Tui {
        /// Question to pre-fill the input with
        #[arg(value_name = "QUESTION")]
        question: Option<String>,

        /// Keep TUI output visible after exit (default: erase)
        #[arg(long)]
        keep: bool,

        /// Probe the backend's health as soon as the UI starts
        #[arg(long)]
        check_health: bool,
    },

    /// Ask a single question and print the answer
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,

        /// How many candidate books the backend should consider
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_K)..=i64::from(MAX_K)))]
        k: Option<u8>,
    },

    /// Check whether the backend is up
    Health,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui {
        question: None,
        keep: false,
        check_health: false,
    });

    init_tracing(cli.verbose, matches!(command, Commands::Tui { .. }))?;

    let mut settings = Settings::new()?;
    if let Some(api_base) = cli.api_base {
        settings = settings.with_api_base(api_base);
    }

    match command {
        Commands::Tui {
            question,
            keep,
            check_health,
        } => interactive::run(&settings, question, keep, check_health).await,
        Commands::Ask { question, k } => ask::run(&settings, &question, k).await,
        Commands::Health => health::run(&settings).await,
    }
}

fn env_filter(level: Level) -> Result<EnvFilter> {
    // LIBRARIAN_LOG replaces the defaults entirely when set
    if std::env::var_os(LOG_ENV).is_some() {
        return Ok(EnvFilter::from_env(LOG_ENV));
    }

    let level = level.as_str().to_lowercase();
    Ok(EnvFilter::default()
        .add_directive(format!("librarian={level}").parse()?)
        .add_directive(format!("librarian_client={level}").parse()?))
}

/// Interactive mode logs to a daily file so the inline viewport stays clean;
/// one-shot commands log to stderr, and only with `--verbose`.
fn init_tracing(verbose: bool, interactive: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = env_filter(level)?;

    if interactive {
        let log_dir = data_dir().join("logs");
        fs::create_dir_all(&log_dir)
            .wrap_err_with(|| format!("could not create log directory {}", log_dir.display()))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("librarian")
            .filename_suffix("log")
            .build(&log_dir)
            .wrap_err("could not open log file")?;

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_filter(filter),
            )
            .init();
    } else if verbose {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry().init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["librarian"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_ask_parses_k() {
        let cli = Cli::try_parse_from(["librarian", "ask", "Ce este 1984?", "--k", "5"]).unwrap();
        match cli.command {
            Some(Commands::Ask { question, k }) => {
                assert_eq!(question, "Ce este 1984?");
                assert_eq!(k, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_rejects_out_of_range_k() {
        assert!(Cli::try_parse_from(["librarian", "ask", "q", "--k", "0"]).is_err());
        assert!(Cli::try_parse_from(["librarian", "ask", "q", "--k", "9"]).is_err());
    }

    #[test]
    fn test_api_base_flag_is_global() {
        let cli =
            Cli::try_parse_from(["librarian", "health", "--api-base", "http://books:9000"])
                .unwrap();
        assert_eq!(cli.api_base.as_deref(), Some("http://books:9000"));
    }
}
