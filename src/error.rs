// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// HTTP status the wiki servers use to signal throttling
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Errors that can occur when querying the wiki or media repository APIs
#[derive(Error, Debug)]
pub enum WikiError {
    #[error("API request failed for {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected API response from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API error from {url}: {code}: {info}")]
    Api {
        url: String,
        code: String,
        info: String,
    },
}

impl WikiError {
    /// Whether the server answered with a rate-limit status
    pub fn is_rate_limited(&self) -> bool {
        match self {
            WikiError::RequestFailed { source, .. } => source
                .status()
                .is_some_and(|status| status.as_u16() == TOO_MANY_REQUESTS),
            WikiError::Api { code, .. } => code == "ratelimited",
            _ => false,
        }
    }
}

/// Errors that can occur while downloading an audio file
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to move download into place at {path}: {source}")]
    FinalizeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Whether the server answered with a rate-limit status
    pub fn is_rate_limited(&self) -> bool {
        match self {
            DownloadError::HttpStatus { status, .. } => *status == TOO_MANY_REQUESTS,
            DownloadError::HttpFailed { source, .. } | DownloadError::StreamFailed { source, .. } => {
                source
                    .status()
                    .is_some_and(|status| status.as_u16() == TOO_MANY_REQUESTS)
            }
            _ => false,
        }
    }
}

/// Errors that can occur when preparing an article's output directory
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors for a crawl
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Failed to list category members: {0}")]
    Listing(#[from] WikiError),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while analyzing downloaded audio
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Data directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to walk data directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read metadata of {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
