// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use url::Url;

/// zh.wikipedia.org action API
pub const DEFAULT_WIKI_API: &str = "https://zh.wikipedia.org/w/api.php";

/// Wikimedia Commons action API, where spoken recordings are hosted
pub const DEFAULT_COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";

/// Category that tags articles with a spoken recording
pub const DEFAULT_CATEGORY: &str = "Category:有声条目";

/// Main (article) namespace
pub const DEFAULT_NAMESPACE: u32 = 0;

/// Largest `cmlimit` anonymous clients may request
pub const DEFAULT_PAGE_SIZE: u32 = 500;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "spokenpull/",
    env!("CARGO_PKG_VERSION"),
    " (spoken article harvester)"
);

/// Delays inserted between remote requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingIntervals {
    /// Between category listing pages
    pub between_pages: Duration,
    /// Between two articles
    pub between_articles: Duration,
    /// After each completed audio download
    pub after_download: Duration,
    /// After the server signalled rate limiting
    pub rate_limit_backoff: Duration,
}

impl Default for PacingIntervals {
    fn default() -> Self {
        Self {
            between_pages: Duration::from_millis(500),
            between_articles: Duration::from_secs(1),
            after_download: Duration::from_secs(3),
            rate_limit_backoff: Duration::from_secs(30),
        }
    }
}

impl PacingIntervals {
    /// No delays at all, for tests and local mirrors
    pub fn none() -> Self {
        Self {
            between_pages: Duration::ZERO,
            between_articles: Duration::ZERO,
            after_download: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
        }
    }
}

/// Settings for the underlying HTTP client
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    /// Bound on a whole API request
    pub api_timeout: Duration,
    /// Bound on each read while streaming a download
    pub download_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
        }
    }
}

/// Options for a crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Wiki whose articles and markup are read
    pub wiki_api: Url,
    /// Media repository that resolves audio filenames to download URLs
    pub commons_api: Url,
    /// Category listing the articles to crawl
    pub category: String,
    /// Namespace filter for the category listing
    pub namespace: u32,
    /// Titles requested per listing page
    pub page_size: u32,
    /// Maximum number of articles to process (None = all)
    pub limit: Option<usize>,
    pub pacing: PacingIntervals,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            wiki_api: Url::parse(DEFAULT_WIKI_API).expect("valid default wiki API URL"),
            commons_api: Url::parse(DEFAULT_COMMONS_API).expect("valid default commons API URL"),
            category: DEFAULT_CATEGORY.to_string(),
            namespace: DEFAULT_NAMESPACE,
            page_size: DEFAULT_PAGE_SIZE,
            limit: None,
            pacing: PacingIntervals::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pacing_matches_courtesy_intervals() {
        let pacing = PacingIntervals::default();
        assert_eq!(pacing.between_pages, Duration::from_millis(500));
        assert_eq!(pacing.between_articles, Duration::from_secs(1));
        assert_eq!(pacing.after_download, Duration::from_secs(3));
        assert_eq!(pacing.rate_limit_backoff, Duration::from_secs(30));
    }

    #[test]
    fn default_options_target_zh_wikipedia() {
        let options = CrawlOptions::default();
        assert_eq!(options.wiki_api.host_str(), Some("zh.wikipedia.org"));
        assert_eq!(options.commons_api.host_str(), Some("commons.wikimedia.org"));
        assert_eq!(options.category, "Category:有声条目");
        assert_eq!(options.namespace, 0);
        assert!(options.limit.is_none());
    }

    #[test]
    fn user_agent_names_the_tool() {
        assert!(HttpSettings::default().user_agent.starts_with("spokenpull/"));
    }
}
