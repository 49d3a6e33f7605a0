// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// Probable spoken language of a recording, guessed from its filename
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Mandarin,
    Cantonese,
    English,
    Other,
}

impl Language {
    /// All languages in report order
    pub const ALL: [Language; 4] = [
        Language::Mandarin,
        Language::Cantonese,
        Language::English,
        Language::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Mandarin => "mandarin",
            Language::Cantonese => "cantonese",
            Language::English => "english",
            Language::Other => "other",
        }
    }

    /// Heading used in the analysis summary
    pub fn label(self) -> &'static str {
        match self {
            Language::Mandarin => "Mandarin",
            Language::Cantonese => "Cantonese",
            Language::English => "English filename",
            Language::Other => "Other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const CANTONESE_MARKERS: [char; 2] = ['粵', '粤'];

/// Classify a bare filename by probable spoken language
///
/// Rules are applied in order:
/// 1. `yue` in any case, or a Cantonese script marker: cantonese
/// 2. only ASCII letters, digits, `-`, `_`, `.` and whitespace: english
/// 3. any CJK Unified Ideograph: mandarin
/// 4. anything else: other
pub fn classify_language(filename: &str) -> Language {
    if filename.to_lowercase().contains("yue") || filename.contains(CANTONESE_MARKERS) {
        return Language::Cantonese;
    }

    if !filename.is_empty() && filename.chars().all(is_plain_ascii) {
        return Language::English;
    }

    if filename.chars().any(is_cjk_ideograph) {
        return Language::Mandarin;
    }

    Language::Other
}

fn is_plain_ascii(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') || c.is_whitespace()
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn romanized_marker_means_cantonese() {
        assert_eq!(classify_language("Zh-yue-example.ogg"), Language::Cantonese);
        assert_eq!(classify_language("ZH-YUE-香港.ogg"), Language::Cantonese);
    }

    #[test]
    fn script_marker_means_cantonese() {
        assert_eq!(classify_language("粵語朗讀.ogg"), Language::Cantonese);
        assert_eq!(classify_language("粤语朗读.ogg"), Language::Cantonese);
    }

    #[test]
    fn plain_ascii_means_english() {
        assert_eq!(classify_language("introduction.ogg"), Language::English);
        assert_eq!(classify_language("Spoken article 2010_v2.ogg"), Language::English);
    }

    #[test]
    fn cjk_means_mandarin() {
        assert_eq!(classify_language("中文條目.ogg"), Language::Mandarin);
        assert_eq!(classify_language("Zh-颱風.ogg"), Language::Mandarin);
    }

    #[test]
    fn mixed_ascii_and_cjk_means_mandarin() {
        assert_eq!(classify_language("123_混合.ogg"), Language::Mandarin);
    }

    #[test]
    fn other_scripts_fall_through() {
        assert_eq!(classify_language("Ελληνικά.ogg"), Language::Other);
        assert_eq!(classify_language("café.ogg"), Language::Other);
        assert_eq!(classify_language(""), Language::Other);
    }

    #[test]
    fn report_order_starts_with_mandarin() {
        assert_eq!(Language::ALL[0], Language::Mandarin);
        assert_eq!(Language::Cantonese.to_string(), "cantonese");
    }
}
