// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::error::LayoutError;
use crate::wikitext::AudioFilename;

/// Name of the plain-text transcript inside an article directory
pub const TRANSCRIPT_FILENAME: &str = "transcript.txt";

/// Suffix of a download that has not been moved into place yet
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Longest on-disk audio name, leaving room for the partial-file suffix
pub const MAX_AUDIO_NAME_BYTES: usize = 200;

/// Partial files untouched for this long belong to a dead writer
pub const STALE_PARTIAL_AGE: Duration = Duration::from_secs(10 * 60);

/// Characters that are illegal in directory names on common filesystems
const ILLEGAL_DIRNAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

static PARTIAL_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Turn an article title into a directory name
///
/// Replaces `\ / : * ? " < > |` with `_`. Everything else, including CJK
/// text and spaces, is kept as is.
pub fn sanitize_dirname(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if ILLEGAL_DIRNAME_CHARS.contains(&c) { '_' } else { c })
        .collect();

    // "." and ".." would resolve outside the article directory
    if sanitized.chars().all(|c| c == '.') {
        return sanitized.replace('.', "_");
    }

    sanitized
}

/// On-disk name for an audio file
///
/// Markup is untrusted input, so the name is passed through
/// `sanitize-filename` to keep it inside the article directory. Long names
/// are shortened in the stem so the audio extension survives.
pub fn audio_file_name(filename: &AudioFilename) -> String {
    let options = sanitize_filename::Options {
        truncate: false,
        windows: true,
        replacement: "_",
    };
    let sanitized = sanitize_filename::sanitize_with_options(filename.as_str(), options);
    truncate_keeping_extension(sanitized, MAX_AUDIO_NAME_BYTES)
}

fn truncate_keeping_extension(name: String, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name;
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if name.len() - dot < max_bytes => name.split_at(dot),
        _ => (name.as_str(), ""),
    };

    let mut end = max_bytes - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &stem[..end], extension)
}

/// A fresh in-progress path for `destination`, unique to this writer
///
/// The name carries the process id and a per-process sequence number, so
/// concurrent downloads of the same file never share a partial file.
pub fn partial_path(destination: &Path) -> PathBuf {
    let sequence = PARTIAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut name = destination.as_os_str().to_os_string();
    name.push(format!(".{}-{}{}", std::process::id(), sequence, PARTIAL_SUFFIX));
    PathBuf::from(name)
}

/// An article's output directory
#[derive(Debug, Clone)]
pub struct ArticleDir {
    path: PathBuf,
    /// Number of stale partial files removed while preparing the directory
    pub partial_files_cleaned: usize,
}

impl ArticleDir {
    /// Create (if needed) the directory for `title` under `output_root`
    ///
    /// Also removes `.partial` files left behind by an interrupted download.
    /// Partial files modified within [`STALE_PARTIAL_AGE`] may belong to a
    /// concurrent run and are left alone.
    pub fn prepare(output_root: &Path, title: &str) -> Result<Self, LayoutError> {
        let path = output_root.join(sanitize_dirname(title));

        std::fs::create_dir_all(&path).map_err(|e| LayoutError::CreateDirectoryFailed {
            path: path.clone(),
            source: e,
        })?;

        let partial_files_cleaned = clean_stale_partial_files(&path, SystemTime::now())?;

        Ok(Self {
            path,
            partial_files_cleaned,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.path.join(TRANSCRIPT_FILENAME)
    }

    pub fn audio_path(&self, filename: &AudioFilename) -> PathBuf {
        self.path.join(audio_file_name(filename))
    }
}

fn clean_stale_partial_files(dir: &Path, now: SystemTime) -> Result<usize, LayoutError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LayoutError::ReadDirectoryFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut cleaned = 0;
    for entry in entries {
        let entry = entry.map_err(|e| LayoutError::ReadDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        let is_partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX));
        if !is_partial {
            continue;
        }

        let is_stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age >= STALE_PARTIAL_AGE);

        if is_stale && std::fs::remove_file(&path).is_ok() {
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
