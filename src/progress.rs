// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

/// Events emitted during a crawl for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The category listing is being fetched
    ListingCategory { category: String },

    /// The title list is ready
    TitlesReady { total_titles: usize, to_process: usize },

    /// Processing of an article is starting
    ArticleStarting {
        title: String,
        /// Index of this article in the crawl
        article_index: usize,
        /// Total number of articles in the crawl
        total_articles: usize,
    },

    /// The transcript was written to disk
    TranscriptSaved { title: String },

    /// Audio references were extracted from the markup
    ReferencesFound { title: String, filenames: Vec<String> },

    /// The audio file was already on disk
    AudioAlreadyPresent { filename: String },

    /// The media repository has no URL for this file
    AudioUnresolved { filename: String },

    /// A download is starting
    DownloadStarting {
        filename: String,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        filename: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed successfully
    DownloadCompleted { filename: String, bytes_downloaded: u64 },

    /// Resolving or downloading a file failed
    DownloadFailed { filename: String, error: String },

    /// The server signalled rate limiting; the crawl is backing off
    RateLimited { backoff: Duration },

    /// The article could not be fetched and was skipped
    ArticleFailed { title: String, error: String },

    /// Crawl completed
    CrawlCompleted {
        articles: usize,
        downloaded_count: usize,
        existing_count: usize,
        unresolved_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during a crawl.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every reported event for later assertions
    #[derive(Default)]
    pub struct CollectingReporter {
        pub events: Mutex<Vec<ProgressEvent>>,
    }

    impl CollectingReporter {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for CollectingReporter {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
