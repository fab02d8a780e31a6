//! `mdify`: scrape documentation pages into Markdown files and serve them.

mod commands;
mod input;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use mdify_logging::{mdify_error, LogDestination};

use commands::{ScrapeArgs, ServeArgs};
use settings::FileSettings;

/// Convert web documentation to Markdown files.
#[derive(Debug, Parser)]
#[command(name = "mdify", version)]
#[command(
    about = "Convert web documentation to markdown files",
    long_about = "Scrape docs sites and convert them to markdown for LLM consumption, \
                  preserving directory structure."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write the log to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Keep the terminal silent and log to the --log-file only.
    #[arg(long, short, global = true, requires = "log_file")]
    quiet: bool,

    /// RON settings file with defaults for the subcommands.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn log_destination(&self) -> LogDestination<'_> {
        match (self.log_file.as_deref(), self.quiet) {
            (Some(path), true) => LogDestination::File(path),
            (Some(path), false) => LogDestination::Both(path),
            (None, _) => LogDestination::Terminal,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scrape URLs and convert them to markdown.
    #[command(after_help = "Examples:
  mdify scrape --selector \".content\" urls.txt
  cat urls.txt | mdify scrape --selector \".content\"
  mdify scrape --sitemap https://example.com/sitemap.xml --filter \"/docs/\" --selector \".prose\"")]
    Scrape(ScrapeArgs),
    /// Serve markdown files over HTTP.
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    mdify_logging::initialize(cli.log_destination(), level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            mdify_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file_settings = match cli.config.as_deref() {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };

    match cli.command {
        Command::Scrape(args) => {
            commands::scrape(args, &file_settings).await?;
        }
        Command::Serve(args) => commands::serve(args, &file_settings).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sitemap_and_url_file_are_mutually_exclusive() {
        let parsed = Cli::try_parse_from([
            "mdify",
            "scrape",
            "-s",
            ".content",
            "--sitemap",
            "https://example.com/sitemap.xml",
            "urls.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn selector_is_required() {
        assert!(Cli::try_parse_from(["mdify", "scrape", "urls.txt"]).is_err());
    }

    #[test]
    fn scrape_flags_parse() {
        let cli = Cli::try_parse_from([
            "mdify", "scrape", "-s", "main", "-w", "8", "-o", "out", "--retries", "1", "list.txt",
        ])
        .unwrap();
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.selector, "main");
        assert_eq!(args.workers, Some(8));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.retries, Some(1));
        assert_eq!(args.urls_file, Some(PathBuf::from("list.txt")));
    }

    #[test]
    fn log_destination_follows_flags() {
        let cli = Cli::try_parse_from(["mdify", "serve"]).unwrap();
        assert_eq!(cli.log_destination(), LogDestination::Terminal);

        let cli = Cli::try_parse_from(["mdify", "serve", "--log-file", "run.log"]).unwrap();
        assert_eq!(
            cli.log_destination(),
            LogDestination::Both(Path::new("run.log"))
        );

        let cli =
            Cli::try_parse_from(["mdify", "serve", "--log-file", "run.log", "--quiet"]).unwrap();
        assert_eq!(
            cli.log_destination(),
            LogDestination::File(Path::new("run.log"))
        );
    }

    #[test]
    fn quiet_needs_a_log_file() {
        assert!(Cli::try_parse_from(["mdify", "serve", "--quiet"]).is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["mdify", "serve", "-p", "9000", "--verbose"]).unwrap();
        assert!(cli.verbose);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9000));
    }
}
