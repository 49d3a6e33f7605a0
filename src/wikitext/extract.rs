// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::filename::{AudioFilename, AudioReferenceSet};
use super::rules::ReferenceRule;

/// Extract the audio files an article's markup references
///
/// Runs every [`ReferenceRule`] over the markup, normalizes each capture
/// (namespace prefix and whitespace stripped) and merges the results in rule
/// order, dropping later spellings of a filename already seen. Any input is
/// accepted; markup without recognized idioms yields an empty set.
pub fn extract_audio_references(wikitext: &str) -> AudioReferenceSet {
    let mut references = AudioReferenceSet::new();

    for rule in ReferenceRule::ALL {
        for raw in rule.captures(wikitext) {
            if let Some(filename) = AudioFilename::normalize(&raw) {
                references.insert(filename);
            }
        }
    }

    references
}

/// Substrings that mark a markup line as likely to carry an audio reference
const REFERENCE_HINTS: [&str; 3] = ["spoken", "zh-", "file_name"];

/// Lines of the markup that mention spoken-audio idioms, trimmed
///
/// Matching is case-insensitive. Used to show what the extractor saw.
pub fn reference_lines(wikitext: &str) -> Vec<&str> {
    wikitext
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            REFERENCE_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .map(str::trim)
        .collect()
}
