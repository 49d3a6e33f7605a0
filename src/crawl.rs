// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::article::{ArticleDir, DownloadOutcome, download_audio};
use crate::config::CrawlOptions;
use crate::error::CrawlError;
use crate::http::HttpClient;
use crate::pacing::{Pacer, Pause};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::wiki::{
    CategoryListing, ResolvedAsset, fetch_extract, fetch_wikitext, list_category_members,
    resolve_asset,
};
use crate::wikitext::{AudioFilename, extract_audio_references};

/// What happened to one article
#[derive(Debug, Clone, Default)]
pub struct ArticleReport {
    pub title: String,
    /// Output directory, if it could be created
    pub directory: Option<PathBuf>,
    pub transcript_written: bool,
    /// Audio references extracted from the markup
    pub references: Vec<AudioFilename>,
    pub downloaded: Vec<AudioFilename>,
    pub already_present: Vec<AudioFilename>,
    pub unresolved: Vec<AudioFilename>,
    /// Files that failed to resolve or download (filename, error message)
    pub failed: Vec<(String, String)>,
    /// Error that ended processing of the article early
    pub skipped: Option<String>,
}

impl ArticleReport {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

/// Result of a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Number of articles processed
    pub articles: usize,
    /// Number of transcripts written
    pub transcripts: usize,
    /// Number of audio files downloaded
    pub downloaded: usize,
    /// Number of audio files already on disk
    pub already_present: usize,
    /// Number of references the media repository could not resolve
    pub unresolved: usize,
    /// Number of articles skipped plus files that failed
    pub failed: usize,
    /// Details of failures (title or "title / filename", error message)
    pub failures: Vec<(String, String)>,
    /// Per-article details, in crawl order
    pub reports: Vec<ArticleReport>,
}

impl CrawlResult {
    fn from_reports(reports: Vec<ArticleReport>) -> Self {
        let mut result = CrawlResult {
            articles: reports.len(),
            ..Default::default()
        };

        for report in &reports {
            result.transcripts += usize::from(report.transcript_written);
            result.downloaded += report.downloaded.len();
            result.already_present += report.already_present.len();
            result.unresolved += report.unresolved.len();

            if let Some(error) = &report.skipped {
                result.failures.push((report.title.clone(), error.clone()));
            }
            for (filename, error) in &report.failed {
                result
                    .failures
                    .push((format!("{} / {}", report.title, filename), error.clone()));
            }
        }

        result.failed = result.failures.len();
        result.reports = reports;
        result
    }
}

/// Crawl every article in the configured category
///
/// This is the main entry point for the library. It:
/// 1. Lists the category members (any failure here is fatal)
/// 2. Crawls each title with [`crawl_titles`]
pub async fn crawl_category<C: HttpClient>(
    client: &C,
    output_dir: &Path,
    options: &CrawlOptions,
    pacer: &Pacer,
    reporter: SharedProgressReporter,
) -> Result<CrawlResult, CrawlError> {
    reporter.report(ProgressEvent::ListingCategory {
        category: options.category.clone(),
    });
    info!(category = %options.category, "listing category members");

    let listing = CategoryListing {
        api: &options.wiki_api,
        category: &options.category,
        namespace: options.namespace,
        page_size: options.page_size,
    };
    let titles = list_category_members(client, &listing, pacer).await?;

    info!(titles = titles.len(), "category listed");

    crawl_titles(client, titles, output_dir, options, pacer, reporter).await
}

/// Crawl an explicit list of article titles
///
/// Articles are processed one at a time. A failure on one article or file is
/// recorded and the crawl moves on.
pub async fn crawl_titles<C: HttpClient>(
    client: &C,
    mut titles: Vec<String>,
    output_dir: &Path,
    options: &CrawlOptions,
    pacer: &Pacer,
    reporter: SharedProgressReporter,
) -> Result<CrawlResult, CrawlError> {
    std::fs::create_dir_all(output_dir).map_err(|e| CrawlError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let total_titles = titles.len();
    if let Some(limit) = options.limit {
        titles.truncate(limit);
    }
    let total_articles = titles.len();

    reporter.report(ProgressEvent::TitlesReady {
        total_titles,
        to_process: total_articles,
    });

    let context = ArticleContext {
        client,
        output_dir,
        options,
        pacer,
        reporter: &reporter,
    };

    let mut reports = Vec::with_capacity(total_articles);
    for (article_index, title) in titles.iter().enumerate() {
        if article_index > 0 {
            pacer.pause(Pause::BetweenArticles).await;
        }

        reporter.report(ProgressEvent::ArticleStarting {
            title: title.clone(),
            article_index,
            total_articles,
        });

        reports.push(context.process_article(title).await);
    }

    let result = CrawlResult::from_reports(reports);

    reporter.report(ProgressEvent::CrawlCompleted {
        articles: result.articles,
        downloaded_count: result.downloaded,
        existing_count: result.already_present,
        unresolved_count: result.unresolved,
        failed_count: result.failed,
    });
    info!(
        articles = result.articles,
        downloaded = result.downloaded,
        already_present = result.already_present,
        unresolved = result.unresolved,
        failed = result.failed,
        "crawl complete"
    );

    Ok(result)
}

/// Everything one article's processing needs from the crawl
struct ArticleContext<'a, C> {
    client: &'a C,
    output_dir: &'a Path,
    options: &'a CrawlOptions,
    pacer: &'a Pacer,
    reporter: &'a SharedProgressReporter,
}

impl<C: HttpClient> ArticleContext<'_, C> {
    async fn process_article(&self, title: &str) -> ArticleReport {
        let mut report = ArticleReport::new(title);

        let dir = match ArticleDir::prepare(self.output_dir, title) {
            Ok(dir) => dir,
            Err(e) => {
                self.skip_article(&mut report, e.to_string());
                return report;
            }
        };
        if dir.partial_files_cleaned > 0 {
            debug!(title, count = dir.partial_files_cleaned, "removed partial downloads");
        }
        report.directory = Some(dir.path().to_path_buf());

        let transcript = match fetch_extract(self.client, &self.options.wiki_api, title).await {
            Ok(text) => text,
            Err(e) => {
                if e.is_rate_limited() {
                    self.back_off().await;
                }
                self.skip_article(&mut report, format!("failed to fetch text: {e}"));
                return report;
            }
        };

        if transcript.trim().is_empty() {
            info!(title, "article has no text, transcript not written");
        } else {
            let path = dir.transcript_path();
            match tokio::fs::write(&path, transcript.as_bytes()).await {
                Ok(()) => {
                    report.transcript_written = true;
                    self.reporter.report(ProgressEvent::TranscriptSaved {
                        title: title.to_string(),
                    });
                    debug!(title, path = %path.display(), "transcript saved");
                }
                Err(e) => {
                    warn!(title, path = %path.display(), error = %e, "failed to write transcript");
                }
            }
        }

        let wikitext = match fetch_wikitext(self.client, &self.options.wiki_api, title).await {
            Ok(text) => text,
            Err(e) => {
                if e.is_rate_limited() {
                    self.back_off().await;
                }
                self.skip_article(&mut report, format!("failed to fetch markup: {e}"));
                return report;
            }
        };

        let references = extract_audio_references(&wikitext).into_vec();
        self.reporter.report(ProgressEvent::ReferencesFound {
            title: title.to_string(),
            filenames: references.iter().map(|f| f.to_string()).collect(),
        });

        if references.is_empty() {
            info!(title, "no audio references found");
        } else {
            info!(title, count = references.len(), "found audio references");
        }

        for filename in &references {
            self.fetch_audio(&dir, filename, &mut report).await;
        }

        report.references = references;
        report
    }

    /// Resolve and download one referenced file
    async fn fetch_audio(
        &self,
        dir: &ArticleDir,
        filename: &AudioFilename,
        report: &mut ArticleReport,
    ) {
        let destination = dir.audio_path(filename);

        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            debug!(filename = %filename, "already downloaded, skipping");
            self.mark_already_present(filename, report);
            return;
        }

        let resolved =
            resolve_asset(self.client, &self.options.commons_api, filename.clone()).await;
        let url = match resolved {
            Ok(ResolvedAsset { url: Some(url), .. }) => url,
            Ok(ResolvedAsset {
                filename: unresolved,
                url: None,
            }) => {
                warn!(
                    title = %report.title,
                    filename = %unresolved,
                    "no download URL on the media repository, check manually"
                );
                self.reporter.report(ProgressEvent::AudioUnresolved {
                    filename: unresolved.to_string(),
                });
                report.unresolved.push(unresolved);
                return;
            }
            Err(e) => {
                let rate_limited = e.is_rate_limited();
                self.fail_file(filename, format!("failed to resolve URL: {e}"), report);
                if rate_limited {
                    self.back_off().await;
                }
                return;
            }
        };

        match download_audio(self.client, &url, &destination, self.reporter).await {
            Ok(DownloadOutcome::Downloaded { bytes }) => {
                info!(filename = %filename, %url, bytes, "downloaded audio");
                report.downloaded.push(filename.clone());
                self.pacer.pause(Pause::AfterDownload).await;
            }
            Ok(DownloadOutcome::AlreadyPresent) => {
                self.mark_already_present(filename, report);
            }
            Err(e) => {
                let rate_limited = e.is_rate_limited();
                self.fail_file(filename, e.to_string(), report);
                if rate_limited {
                    self.back_off().await;
                }
            }
        }
    }

    fn mark_already_present(&self, filename: &AudioFilename, report: &mut ArticleReport) {
        self.reporter.report(ProgressEvent::AudioAlreadyPresent {
            filename: filename.to_string(),
        });
        report.already_present.push(filename.clone());
    }

    fn fail_file(&self, filename: &AudioFilename, error: String, report: &mut ArticleReport) {
        warn!(title = %report.title, filename = %filename, error = %error, "audio file failed");
        self.reporter.report(ProgressEvent::DownloadFailed {
            filename: filename.to_string(),
            error: error.clone(),
        });
        report.failed.push((filename.to_string(), error));
    }

    fn skip_article(&self, report: &mut ArticleReport, error: String) {
        warn!(title = %report.title, error = %error, "skipping article");
        self.reporter.report(ProgressEvent::ArticleFailed {
            title: report.title.clone(),
            error: error.clone(),
        });
        report.skipped = Some(error);
    }

    async fn back_off(&self) {
        self.reporter.report(ProgressEvent::RateLimited {
            backoff: self.pacer.intervals().rate_limit_backoff,
        });
        self.pacer.back_off().await;
    }
}
