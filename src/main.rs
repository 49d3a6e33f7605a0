// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use spokenpull::config::{
    DEFAULT_CATEGORY, DEFAULT_COMMONS_API, DEFAULT_NAMESPACE, DEFAULT_PAGE_SIZE,
    DEFAULT_USER_AGENT, DEFAULT_WIKI_API,
};
use spokenpull::wiki::{fetch_wikitext, resolve_file_url};
use spokenpull::wikitext::reference_lines;
use spokenpull::{
    AnalysisMode, CrawlOptions, CrawlResult, HttpSettings, NoopReporter, PacingIntervals, Pacer,
    ProgressEvent, ProgressReporter, ReqwestClient, SharedProgressReporter, SymphoniaReader,
    analyze_directory, crawl_category, crawl_titles, extract_audio_references, render_summary,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static BOOK: Emoji<'_, '_> = Emoji("📖 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static HOURGLASS: Emoji<'_, '_> = Emoji("⏳ ", "[.] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Harvest spoken-article audio and transcripts from Chinese Wikipedia
#[derive(Parser, Debug)]
#[command(name = "spokenpull")]
#[command(about = "Harvest spoken-article audio and transcripts from Chinese Wikipedia")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download transcripts and audio for every article in a category
    Crawl(CrawlArgs),
    /// Show the audio references found in one article
    Inspect(InspectArgs),
    /// Summarize downloaded audio by probable language
    Analyze(AnalyzeArgs),
}

/// Endpoints shared by the commands that talk to the wikis
#[derive(Args, Debug)]
struct EndpointArgs {
    /// Action API of the wiki that hosts the articles
    #[arg(long, default_value = DEFAULT_WIKI_API)]
    wiki_api: Url,

    /// Action API of the media repository that hosts the audio files
    #[arg(long, default_value = DEFAULT_COMMONS_API)]
    commons_api: Url,

    /// User-Agent sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Timeout for a single API request, in seconds
    #[arg(long, default_value_t = 30)]
    api_timeout_secs: u64,

    /// Timeout for each read while downloading audio, in seconds
    #[arg(long, default_value_t = 60)]
    download_timeout_secs: u64,
}

impl EndpointArgs {
    fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            user_agent: self.user_agent.clone(),
            api_timeout: Duration::from_secs(self.api_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
        }
    }
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Output directory, one subdirectory per article
    #[arg(default_value = "data")]
    output_dir: PathBuf,

    /// Category whose member articles are crawled
    #[arg(long, default_value = DEFAULT_CATEGORY)]
    category: String,

    /// Crawl these titles instead of the category (repeatable)
    #[arg(short, long = "title")]
    titles: Vec<String>,

    /// Maximum number of articles to process
    #[arg(short, long)]
    limit: Option<usize>,

    /// Namespace the category listing is restricted to
    #[arg(long, default_value_t = DEFAULT_NAMESPACE)]
    namespace: u32,

    /// Titles requested per category listing page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Delay between category listing pages, in milliseconds
    #[arg(long, default_value_t = 500)]
    page_delay_ms: u64,

    /// Delay between articles, in milliseconds
    #[arg(long, default_value_t = 1000)]
    article_delay_ms: u64,

    /// Delay after each downloaded file, in milliseconds
    #[arg(long, default_value_t = 3000)]
    download_delay_ms: u64,

    /// Backoff after the server signals rate limiting, in seconds
    #[arg(long, default_value_t = 30)]
    backoff_secs: u64,

    #[command(flatten)]
    endpoints: EndpointArgs,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl CrawlArgs {
    fn crawl_options(&self) -> CrawlOptions {
        CrawlOptions {
            wiki_api: self.endpoints.wiki_api.clone(),
            commons_api: self.endpoints.commons_api.clone(),
            category: self.category.clone(),
            namespace: self.namespace,
            page_size: self.page_size,
            limit: self.limit,
            pacing: PacingIntervals {
                between_pages: Duration::from_millis(self.page_delay_ms),
                between_articles: Duration::from_millis(self.article_delay_ms),
                after_download: Duration::from_millis(self.download_delay_ms),
                rate_limit_backoff: Duration::from_secs(self.backoff_secs),
            },
        }
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Article title
    title: String,

    /// Read markup from this file instead of fetching it
    #[arg(long)]
    file: Option<PathBuf>,

    /// Also look up the download URL of every reference
    #[arg(long)]
    resolve: bool,

    #[command(flatten)]
    endpoints: EndpointArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Directory written by `crawl`
    #[arg(default_value = "data")]
    data_dir: PathBuf,

    /// What to measure besides file counts
    #[arg(long, value_enum, default_value_t = ModeArg::Duration)]
    mode: ModeArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Decode headers for playing time
    Duration,
    /// Sum file sizes and estimate playing time
    Size,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Duration => AnalysisMode::Duration,
            ModeArg::Size => AnalysisMode::Size,
        }
    }
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    download_bar: Mutex<Option<ProgressBar>>,
    main_bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_bar = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} {wide_msg}") {
            main_bar.set_style(style);
        }
        main_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            download_bar: Mutex::new(None),
            main_bar,
        }
    }

    fn start_download_bar(&self, filename: &str, content_length: Option<u64>) {
        let bar = self.multi.add(ProgressBar::new(content_length.unwrap_or(0)));
        if let Ok(style) = ProgressStyle::default_bar().template(&format!(
            "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
        )) {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar.set_message(truncate_title(filename, 40));

        if let Ok(mut slot) = self.download_bar.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn with_download_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(slot) = self.download_bar.lock() {
            if let Some(bar) = slot.as_ref() {
                f(bar);
            }
        }
    }

    fn finish_download_bar(&self) {
        let bar = self.download_bar.lock().ok().and_then(|mut slot| slot.take());
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::ListingCategory { category } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Listing {}", category.cyan()));
            }

            ProgressEvent::TitlesReady {
                total_titles,
                to_process,
            } => {
                self.println(format!(
                    "{BOOK}{} articles found, {} to process",
                    total_titles.to_string().cyan(),
                    to_process.to_string().yellow()
                ));
            }

            ProgressEvent::ArticleStarting {
                title,
                article_index,
                total_articles,
            } => {
                self.main_bar.set_message(format!(
                    "[{}/{}] {}",
                    (article_index + 1).to_string().cyan(),
                    total_articles.to_string().cyan(),
                    truncate_title(&title, 40).bold()
                ));
            }

            ProgressEvent::TranscriptSaved { .. } => {}

            ProgressEvent::ReferencesFound { title, filenames } => {
                if filenames.is_empty() {
                    self.println(format!(
                        "  {} {}",
                        truncate_title(&title, 40),
                        "no audio references".dimmed()
                    ));
                }
            }

            ProgressEvent::AudioAlreadyPresent { filename } => {
                self.println(format!("  {SUCCESS}{} {}", filename, "(exists)".dimmed()));
            }

            ProgressEvent::AudioUnresolved { filename } => {
                self.println(format!(
                    "  {FAILURE}{} {}",
                    filename.yellow(),
                    "not found on the media repository".dimmed()
                ));
            }

            ProgressEvent::DownloadStarting {
                filename,
                content_length,
            } => {
                self.start_download_bar(&filename, content_length);
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
                ..
            } => {
                self.with_download_bar(|bar| {
                    if let Some(total) = total_bytes {
                        bar.set_length(total);
                    }
                    bar.set_position(bytes_downloaded);
                });
            }

            ProgressEvent::DownloadCompleted { filename, .. } => {
                self.finish_download_bar();
                self.println(format!("  {SUCCESS}{}", filename.green()));
            }

            ProgressEvent::DownloadFailed { filename, error } => {
                self.finish_download_bar();
                self.println(format!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&filename, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::RateLimited { backoff } => {
                self.main_bar.set_message(format!(
                    "{HOURGLASS}{} waiting {}s",
                    "Rate limited,".yellow(),
                    backoff.as_secs()
                ));
            }

            ProgressEvent::ArticleFailed { title, error } => {
                self.println(format!(
                    "{FAILURE}{} - {}",
                    truncate_title(&title, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::CrawlCompleted {
                articles,
                downloaded_count,
                existing_count,
                unresolved_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} articles, {} downloaded, {} existing, {} unresolved, {} failed",
                    "Crawl complete:".bold().green(),
                    articles.to_string().cyan(),
                    downloaded_count.to_string().green().bold(),
                    existing_count.to_string().yellow(),
                    unresolved_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "spokenpull=warn",
        1 => "spokenpull=info",
        _ => "spokenpull=debug",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_client(endpoints: &EndpointArgs) -> Result<ReqwestClient> {
    ReqwestClient::new(&endpoints.http_settings()).context("Failed to create HTTP client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Crawl(args) => run_crawl(args).await,
        Command::Inspect(args) => run_inspect(args).await,
        Command::Analyze(args) => run_analyze(args),
    }
}

async fn run_crawl(args: CrawlArgs) -> Result<()> {
    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "spokenpull".bold().magenta(),
            "- Spoken Wikipedia Harvester".dimmed()
        );
    }

    let client = build_client(&args.endpoints)?;

    let options = args.crawl_options();
    let pacer = Pacer::with_tokio(options.pacing);

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let result = if args.titles.is_empty() {
        crawl_category(&client, &args.output_dir, &options, &pacer, reporter)
            .await
            .context("Failed to crawl category")?
    } else {
        crawl_titles(
            &client,
            args.titles.clone(),
            &args.output_dir,
            &options,
            &pacer,
            reporter,
        )
        .await
        .context("Failed to crawl titles")?
    };

    if !args.quiet {
        print_failures(&result);
        println!(
            "\n{FOLDER}Output: {}\n",
            args.output_dir.display().to_string().cyan()
        );
    }

    if result.failed > 0 && result.downloaded == 0 && result.already_present == 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn print_failures(result: &CrawlResult) {
    if !result.failures.is_empty() {
        println!("\n{}", "Failed items:".red().bold());
        for (context, error) in &result.failures {
            println!("  {}{} - {}", CROSS, context.yellow(), error.dimmed());
        }
    }

    let unresolved: Vec<_> = result
        .reports
        .iter()
        .flat_map(|report| {
            report
                .unresolved
                .iter()
                .map(move |filename| (&report.title, filename))
        })
        .collect();
    if !unresolved.is_empty() {
        println!("\n{}", "Unresolved files (check manually):".yellow().bold());
        for (title, filename) in unresolved {
            println!("  {}{} / {}", CROSS, title, filename.as_str().yellow());
        }
    }
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let client = build_client(&args.endpoints)?;

    let wikitext = match &args.file {
        Some(path) => read_markup(path)?,
        None => fetch_wikitext(&client, &args.endpoints.wiki_api, &args.title)
            .await
            .with_context(|| format!("Failed to fetch markup of {}", args.title))?,
    };

    println!("\n{}{}", BOOK, args.title.bold());
    println!("Markup length: {}", wikitext.chars().count());

    let lines = reference_lines(&wikitext);
    if lines.is_empty() {
        println!("\n{}", "No lines mention spoken, zh- or file_name".dimmed());
    } else {
        println!("\n{} relevant lines:", lines.len().to_string().cyan());
        for (index, line) in lines.iter().enumerate() {
            println!("  {}. {}", index + 1, truncate_title(line, 200));
        }
    }

    let references = extract_audio_references(&wikitext);
    if references.is_empty() {
        println!("\n{}No audio references found", FAILURE);
        return Ok(());
    }

    println!(
        "\n{}{} audio references:",
        SUCCESS,
        references.len().to_string().green()
    );
    for filename in &references {
        if !args.resolve {
            println!("  - {filename}");
            continue;
        }

        match resolve_file_url(&client, &args.endpoints.commons_api, filename).await {
            Ok(Some(url)) => println!("  - {} {}", filename, url.as_str().cyan()),
            Ok(None) => println!("  - {} {}", filename, "(not found)".yellow()),
            Err(e) => println!("  - {} {}", filename, e.to_string().red()),
        }
    }

    Ok(())
}

fn read_markup(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read markup from {}", path.display()))
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let mode = AnalysisMode::from(args.mode);

    println!(
        "\n{}Analyzing {}\n",
        SEARCH,
        args.data_dir.display().to_string().cyan()
    );

    let report = analyze_directory(&args.data_dir, mode, &SymphoniaReader)
        .context("Failed to analyze data directory")?;

    println!(
        "Found {} audio files\n",
        report.total_files().to_string().cyan()
    );
    print!("{}", render_summary(&report));

    Ok(())
}
