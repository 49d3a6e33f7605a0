// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod analyze;
pub mod article;
pub mod config;
pub mod crawl;
pub mod error;
pub mod http;
pub mod pacing;
pub mod progress;
pub mod wiki;
pub mod wikitext;

// Re-export main types for convenience
pub use analyze::{AnalysisMode, AnalysisReport, SymphoniaReader, analyze_directory, render_summary};
pub use article::{ArticleDir, DownloadOutcome, download_audio};
pub use config::{CrawlOptions, HttpSettings, PacingIntervals};
pub use crawl::{ArticleReport, CrawlResult, crawl_category, crawl_titles};
pub use error::{AnalyzeError, CrawlError, DownloadError, LayoutError, WikiError};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use pacing::{Pacer, Pause};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use wikitext::{AudioFilename, AudioReferenceSet, extract_audio_references};
