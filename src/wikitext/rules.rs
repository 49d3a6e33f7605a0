// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The four markup idioms spoken articles use to reference their recordings.
//!
//! Each rule is a pure `&str -> Vec<String>` capture function. Rule-specific
//! clean-up (extension completion, underscore conversion) happens here; prefix
//! stripping and deduplication are shared and happen in [`super::extract`].

use std::sync::LazyLock;

use regex::Regex;

use super::filename::{DEFAULT_EXTENSION, has_audio_extension, has_namespace_prefix};

/// `file_name = Zh-Example` inside an infobox-style template
static EXPLICIT_PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfile_name\s*=[^\S\r\n]*([^|}\r\n]+)")
        .expect("EXPLICIT_PARAMETER_RE should compile")
});

/// `[[File:Zh-Example.ogg|thumb]]`
static FILE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[\s*(?:file|image|media|文件|檔案|档案)\s*:\s*([^|\]#\r\n]+\.ogg)\s*[|\]#]")
        .expect("FILE_LINK_RE should compile")
});

/// `{{Spoken Wikipedia|Zh-Example.ogg|2020-01-01}}`
static SPOKEN_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*spoken[\s_]+wikipedia\s*\|\s*([^|{}\r\n]+\.ogg)\s*(?:\||\}\})")
        .expect("SPOKEN_TEMPLATE_RE should compile")
});

/// `{{Spoken Wikipedia-2|Zh-A.ogg|Zh-B.ogg|...}}`
static MULTI_SPOKEN_TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*spoken[\s_]+wikipedia-\d+\s*\|([^{}]+)\}\}")
        .expect("MULTI_SPOKEN_TEMPLATE_RE should compile")
});

/// Longest run inside one template parameter that ends in `.ogg`
static OGG_PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[^|}\r\n]+\.ogg").expect("OGG_PARAMETER_RE should compile")
});

/// One authoring convention for referencing a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRule {
    /// `file_name = <value>`; the only rule that completes a missing extension
    ExplicitParameter,
    /// `[[File:<name>.ogg|...]]`; underscores become spaces
    FileLink,
    /// `{{Spoken Wikipedia|<name>.ogg|...}}`; first positional parameter verbatim
    SpokenTemplate,
    /// `{{Spoken Wikipedia-2|<a>.ogg|<b>.ogg|...}}`; every `.ogg` parameter
    MultiSpokenTemplate,
}

impl ReferenceRule {
    /// All rules in the order their results are merged
    pub const ALL: [ReferenceRule; 4] = [
        ReferenceRule::ExplicitParameter,
        ReferenceRule::FileLink,
        ReferenceRule::SpokenTemplate,
        ReferenceRule::MultiSpokenTemplate,
    ];

    /// Raw filename captures for this rule, in document order
    pub fn captures(self, wikitext: &str) -> Vec<String> {
        match self {
            ReferenceRule::ExplicitParameter => explicit_parameter(wikitext),
            ReferenceRule::FileLink => file_link(wikitext),
            ReferenceRule::SpokenTemplate => spoken_template(wikitext),
            ReferenceRule::MultiSpokenTemplate => multi_spoken_template(wikitext),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReferenceRule::ExplicitParameter => "explicit-parameter",
            ReferenceRule::FileLink => "file-link",
            ReferenceRule::SpokenTemplate => "spoken-template",
            ReferenceRule::MultiSpokenTemplate => "multi-spoken-template",
        }
    }
}

fn explicit_parameter(wikitext: &str) -> Vec<String> {
    EXPLICIT_PARAMETER_RE
        .captures_iter(wikitext)
        .filter_map(|caps| {
            let value = caps[1].trim();

            // Link syntax in a parameter belongs to the file-link rule
            if value.is_empty() || has_namespace_prefix(value) {
                return None;
            }

            if has_audio_extension(value) {
                Some(value.to_string())
            } else {
                Some(format!("{value}.{DEFAULT_EXTENSION}"))
            }
        })
        .collect()
}

fn file_link(wikitext: &str) -> Vec<String> {
    FILE_LINK_RE
        .captures_iter(wikitext)
        .map(|caps| caps[1].replace('_', " ").trim().to_string())
        .collect()
}

fn spoken_template(wikitext: &str) -> Vec<String> {
    SPOKEN_TEMPLATE_RE
        .captures_iter(wikitext)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

fn multi_spoken_template(wikitext: &str) -> Vec<String> {
    MULTI_SPOKEN_TEMPLATE_RE
        .captures_iter(wikitext)
        .flat_map(|caps| {
            caps[1]
                .split('|')
                .map(str::trim)
                .filter(|param| param.to_lowercase().contains(".ogg"))
                .filter_map(|param| OGG_PARAMETER_RE.find(param))
                .map(|m| m.as_str().trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_parameter_appends_default_extension() {
        let captures = explicit_parameter("{{Spoken\n| file_name = Zh-韓國教育-part_2\n}}");
        assert_eq!(captures, ["Zh-韓國教育-part_2.ogg"]);
    }

    #[test]
    fn explicit_parameter_keeps_known_extensions() {
        let text = "|file_name=Zh-A.oga|x=1 |FILE_NAME = Zh-B.OPUS}}";
        assert_eq!(explicit_parameter(text), ["Zh-A.oga", "Zh-B.OPUS"]);
    }

    #[test]
    fn explicit_parameter_stops_at_delimiters() {
        assert_eq!(explicit_parameter("{{X|file_name = Zh-A }}"), ["Zh-A.ogg"]);
        assert_eq!(explicit_parameter("{{X|file_name = Zh-A|date=2020}}"), ["Zh-A.ogg"]);
    }

    #[test]
    fn explicit_parameter_skips_prefixed_values() {
        assert!(explicit_parameter("file_name = File:Zh-A.ogg").is_empty());
    }

    #[test]
    fn explicit_parameter_skips_empty_values() {
        assert!(explicit_parameter("{{X|file_name = |date=2020}}").is_empty());
        assert!(explicit_parameter("{{X|file_name =\nZh-A}}").is_empty());
    }

    #[test]
    fn explicit_parameter_requires_whole_key() {
        assert!(explicit_parameter("sound_file_name = Zh-A").is_empty());
    }

    #[test]
    fn file_link_converts_underscores() {
        assert_eq!(
            file_link("[[File:Zh-Some_Title.ogg|thumb]]"),
            ["Zh-Some Title.ogg"]
        );
    }

    #[test]
    fn file_link_strips_fragment() {
        assert_eq!(file_link("[[File:Zh-A.ogg#t=10|play]]"), ["Zh-A.ogg"]);
    }

    #[test]
    fn file_link_only_matches_ogg() {
        assert!(file_link("[[File:Zh-A.opus|thumb]]").is_empty());
        assert!(file_link("[[File:Photo.jpg|thumb]]").is_empty());
        assert!(file_link("[[File:Zh-A.ogg.png|thumb]]").is_empty());
    }

    #[test]
    fn file_link_accepts_namespace_aliases() {
        assert_eq!(
            file_link("[[image : Zh-A.OGG]] [[文件:Zh-B.ogg]]"),
            ["Zh-A.OGG", "Zh-B.ogg"]
        );
    }

    #[test]
    fn file_link_accepts_media_namespace() {
        assert_eq!(file_link("[[Media:Zh-A.ogg]] [[media: Zh-B.ogg|listen]]"), ["Zh-A.ogg", "Zh-B.ogg"]);
    }

    #[test]
    fn file_link_does_not_cross_lines() {
        assert!(file_link("[[File:Zh-A\n.ogg]]").is_empty());
    }

    #[test]
    fn spoken_template_captures_first_parameter() {
        assert_eq!(
            spoken_template("{{Spoken Wikipedia|Zh-Test.ogg|2020-01-01}}"),
            ["Zh-Test.ogg"]
        );
        assert_eq!(
            spoken_template("{{ spoken  wikipedia | Zh-Some_Name.ogg }}"),
            ["Zh-Some_Name.ogg"]
        );
    }

    #[test]
    fn spoken_template_ignores_multi_variant() {
        assert!(spoken_template("{{Spoken Wikipedia-2|Zh-A.ogg|Zh-B.ogg}}").is_empty());
    }

    #[test]
    fn spoken_template_requires_ogg_parameter() {
        assert!(spoken_template("{{Spoken Wikipedia|2020-01-01|Zh-A.ogg}}").is_empty());
        assert!(spoken_template("{{Spoken Wikipedia|Zh-A.ogg.bak}}").is_empty());
    }

    #[test]
    fn multi_spoken_template_captures_every_file() {
        assert_eq!(
            multi_spoken_template("{{Spoken Wikipedia-2|2020-01-01|Zh-A.ogg|Zh-B.OGG}}"),
            ["Zh-A.ogg", "Zh-B.OGG"]
        );
    }

    #[test]
    fn multi_spoken_template_takes_prefix_ending_in_ogg() {
        assert_eq!(
            multi_spoken_template("{{Spoken Wikipedia-2| Zh-A.ogg (part 1) |Zh-B.ogg}}"),
            ["Zh-A.ogg", "Zh-B.ogg"]
        );
    }

    #[test]
    fn multi_spoken_template_requires_closed_template() {
        let text = "{{Spoken Wikipedia-2|Zh-A.ogg|Zh-B.ogg\n{{Other|Zh-C.ogg}}";
        assert!(multi_spoken_template(text).is_empty());
    }

    #[test]
    fn rules_run_in_merge_order() {
        let names: Vec<_> = ReferenceRule::ALL.iter().map(|rule| rule.name()).collect();
        assert_eq!(
            names,
            [
                "explicit-parameter",
                "file-link",
                "spoken-template",
                "multi-spoken-template"
            ]
        );
    }
}
