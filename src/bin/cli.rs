//! Quotes Crawler CLI
//!
//! Local execution entry point.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quotes_crawler::{
    error::{AppError, Result},
    models::{Config, Quote, Termination},
    pipeline::{self, CollectionRequest},
    services::StopSignal,
    storage::LocalStorage,
};

/// Quotes Crawler - collects quotes, authors and tags
#[derive(Parser, Debug)]
#[command(
    name = "quotes-crawler",
    version,
    about = "Collects quotes from quotes.toscrape.com"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of pages to fetch (overrides scraping.max_pages)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// Output file for bulk collection (overrides storage.output_file)
    #[arg(short, long)]
    output: Option<String>,

    /// Only collect quotes by this author
    #[arg(short, long)]
    author: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        if !self.config.exists() {
            return Err(AppError::config(format!(
                "configuration file {} not found",
                self.config.display()
            )));
        }

        let mut config = Config::load(&self.config)?;
        if let Some(pages) = self.pages {
            config.scraping.max_pages = Some(pages);
        }
        if let Some(output) = &self.output {
            if !output.ends_with(".json") {
                return Err(AppError::config("--output must have a .json extension"));
            }
            config.storage.output_file = output.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn request(&self) -> Result<CollectionRequest> {
        match self.author.as_deref().map(str::trim) {
            None => Ok(CollectionRequest::Bulk),
            Some("") => Err(AppError::config("--author must not be empty")),
            Some(author) => Ok(CollectionRequest::Author(author.to_string())),
        }
    }
}

/// Copies every log line to stderr and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize logging. `RUST_LOG` wins, then `--verbose`, then the config.
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        config.logging.level_filter()?
    };
    let level = level.to_string().to_lowercase();
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();
    if let Some(file) = config.storage.open_log_file()? {
        builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
    }
    builder.init();
    Ok(())
}

/// Trip `stop` on Ctrl-C and, if configured, when the run deadline passes.
/// A second Ctrl-C exits at once.
fn spawn_stop_watchers(stop: &StopSignal, run_timeout_secs: Option<u64>) {
    let ctrl_c = stop.clone();
    tokio::spawn(async move {
        let mut interrupted = false;
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupted {
                log::warn!("Interrupted again, exiting now");
                std::process::exit(130);
            }
            interrupted = true;
            log::warn!("Interrupted, finishing after the current page (Ctrl-C again to exit)");
            ctrl_c.stop();
        }
    });

    if let Some(secs) = run_timeout_secs {
        let deadline = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            log::warn!("Run timeout of {}s reached, stopping", secs);
            deadline.stop();
        });
    }
}

fn print_author_quotes(author: &str, quotes: &[Quote]) {
    if quotes.is_empty() {
        println!("No quotes found for author: {author}");
        return;
    }

    println!("\nFound {} quotes by {}:", quotes.len(), author);
    for (i, quote) in quotes.iter().enumerate() {
        println!("\n{}. {}", i + 1, quote.text);
        if !quote.tags.is_empty() {
            println!("   Tags: {}", quote.tags.join(", "));
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let request = cli.request()?;
    init_logging(cli.verbose, &config)?;

    log::info!("Quotes Crawler starting...");
    log::info!("Loaded configuration from {}", cli.config.display());

    let stop = StopSignal::new();
    spawn_stop_watchers(&stop, config.scraping.run_timeout_secs);

    let report = pipeline::run_collection(&config, &request, stop).await?;

    if let CollectionRequest::Author(author) = &request {
        print_author_quotes(author, &report.result.quotes);
    }

    let storage = LocalStorage::new(".");
    let written = pipeline::write_report(&config, &storage, &report).await?;
    log::info!(
        "Saved {} quotes to {}",
        written.quote_count,
        written.path.display()
    );

    if let Termination::Aborted(error) = &report.result.termination {
        log::error!("Collection aborted: {}", error);
        return Err(AppError::Fetch(error.clone()));
    }

    log::info!("Done!");
    Ok(())
}
