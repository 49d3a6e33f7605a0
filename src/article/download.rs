// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::error::DownloadError;
use crate::http::{HttpClient, HttpResponse};
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::layout::partial_path;

/// Size of the write buffer between the response stream and the file
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// What a download attempt did to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file was written; carries the number of bytes
    Downloaded { bytes: u64 },
    /// A file already existed at the destination and was left untouched
    AlreadyPresent,
}

/// Download `url` to `destination`, never overwriting an existing file
///
/// Streams the body into a `.partial` sibling private to this call, then
/// publishes it with a hard link, which fails if the destination already
/// exists. Of several concurrent writers exactly one reports
/// [`DownloadOutcome::Downloaded`]; the others see
/// [`DownloadOutcome::AlreadyPresent`]. Parent directories are created as
/// needed.
pub async fn download_audio<C: HttpClient>(
    client: &C,
    url: &Url,
    destination: &Path,
    reporter: &SharedProgressReporter,
) -> Result<DownloadOutcome, DownloadError> {
    if destination_exists(destination).await {
        return Ok(DownloadOutcome::AlreadyPresent);
    }

    let response = client
        .get_stream(url.as_str())
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !(200..300).contains(&response.status) {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::DirectoryCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let filename = display_name(destination);

    reporter.report(ProgressEvent::DownloadStarting {
        filename: filename.clone(),
        content_length: response.content_length,
    });

    let partial = partial_path(destination);
    let streamed = stream_to_file(url, response, &partial, &filename, reporter).await;
    let published = match streamed {
        Ok(bytes) => publish(&partial, destination).await.map(|linked| (bytes, linked)),
        Err(e) => Err(e),
    };
    let _ = tokio::fs::remove_file(&partial).await;
    let (bytes_downloaded, linked) = published?;

    if !linked {
        return Ok(DownloadOutcome::AlreadyPresent);
    }

    reporter.report(ProgressEvent::DownloadCompleted {
        filename,
        bytes_downloaded,
    });

    Ok(DownloadOutcome::Downloaded {
        bytes: bytes_downloaded,
    })
}

/// Link a finished partial file into place; `false` if another writer won
async fn publish(partial: &Path, destination: &Path) -> Result<bool, DownloadError> {
    match tokio::fs::hard_link(partial, destination).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(DownloadError::FinalizeFailed {
            path: destination.to_path_buf(),
            source: e,
        }),
    }
}

async fn stream_to_file(
    url: &Url,
    response: HttpResponse,
    output_path: &Path,
    filename: &str,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let file = File::create(output_path)
        .await
        .map_err(|e| DownloadError::FileCreateFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            filename: filename.to_string(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes_downloaded)
}

async fn destination_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
