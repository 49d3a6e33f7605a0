// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::fmt;

/// Extensions a spoken-article recording may carry
pub const AUDIO_EXTENSIONS: [&str; 3] = ["ogg", "oga", "opus"];

/// Extension appended to explicit `file_name =` values that lack one
pub const DEFAULT_EXTENSION: &str = "ogg";

/// Namespace prefixes that name a file page on zh.wikipedia and Commons
const FILE_NAMESPACES: [&str; 6] = ["file", "image", "media", "文件", "檔案", "档案"];

/// A normalized audio filename referenced from article markup
///
/// Never carries a namespace prefix or surrounding whitespace, and always ends
/// in one of [`AUDIO_EXTENSIONS`]. Two filenames that differ only in
/// underscore/space form share the same [`canonical_key`](Self::canonical_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioFilename(String);

impl AudioFilename {
    /// Normalize a raw capture into a filename
    ///
    /// Strips a leading namespace prefix and surrounding whitespace. Returns
    /// `None` when nothing but an extension (or nothing at all) remains, or
    /// when the result does not end in a recognized audio extension.
    pub fn normalize(raw: &str) -> Option<Self> {
        let name = strip_namespace(raw.trim()).trim();

        let stem = audio_stem(name)?;
        if stem.trim().is_empty() {
            return None;
        }

        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which underscore and space spellings collapse
    pub fn canonical_key(&self) -> String {
        self.0.replace('_', " ")
    }

    /// Title of the file page on the media repository
    pub fn file_page_title(&self) -> String {
        format!("File:{}", self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AudioFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AudioFilename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free collection of the audio files one article references
///
/// Iteration order is first-seen order. Deduplication is by canonical key, so
/// the first spelling encountered is the one that is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioReferenceSet {
    filenames: Vec<AudioFilename>,
    seen: HashSet<String>,
}

impl AudioReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filename, returning false if an equivalent one is already present
    pub fn insert(&mut self, filename: AudioFilename) -> bool {
        if !self.seen.insert(filename.canonical_key()) {
            return false;
        }
        self.filenames.push(filename);
        true
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AudioFilename> {
        self.filenames.iter()
    }

    pub fn into_vec(self) -> Vec<AudioFilename> {
        self.filenames
    }
}

impl<'a> IntoIterator for &'a AudioReferenceSet {
    type Item = &'a AudioFilename;
    type IntoIter = std::slice::Iter<'a, AudioFilename>;

    fn into_iter(self) -> Self::IntoIter {
        self.filenames.iter()
    }
}

impl IntoIterator for AudioReferenceSet {
    type Item = AudioFilename;
    type IntoIter = std::vec::IntoIter<AudioFilename>;

    fn into_iter(self) -> Self::IntoIter {
        self.filenames.into_iter()
    }
}

/// Check whether a name ends in a recognized audio extension (case-insensitive)
pub fn has_audio_extension(name: &str) -> bool {
    audio_stem(name).is_some()
}

/// Check whether a value starts with a file namespace prefix such as `File:`
pub fn has_namespace_prefix(value: &str) -> bool {
    namespace_len(value).is_some()
}

/// Remove a leading file namespace prefix, if any
pub fn strip_namespace(value: &str) -> &str {
    match namespace_len(value) {
        Some(len) => &value[len..],
        None => value,
    }
}

/// Byte length of the `Namespace :` prefix at the start of `value`
fn namespace_len(value: &str) -> Option<usize> {
    let (head, _) = value.split_once(':')?;
    let namespace = head.trim().to_lowercase();

    FILE_NAMESPACES
        .contains(&namespace.as_str())
        .then_some(head.len() + 1)
}

/// The part of `name` before a recognized audio extension
fn audio_stem(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    AUDIO_EXTENSIONS
        .iter()
        .any(|known| ext.eq_ignore_ascii_case(known))
        .then_some(stem)
}
