// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::AnalyzeError;
use crate::wikitext::has_audio_extension;

use super::classify::{Language, classify_language};
use super::duration::DurationReader;

/// Number of example filenames listed per language
pub const EXAMPLE_COUNT: usize = 5;

/// Average storage used by a minute of spoken audio, for size-based estimates
pub const ESTIMATED_MB_PER_MINUTE: f64 = 0.5;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// What the analysis measures besides file counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Decode each file's headers for its playing time
    #[default]
    Duration,
    /// Sum file sizes only
    Size,
}

/// Totals for one language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageStats {
    pub count: usize,
    /// Filenames in walk order
    pub files: Vec<String>,
    pub total_duration_secs: f64,
    pub total_bytes: u64,
    /// Files whose duration could not be read
    pub unreadable: usize,
}

impl LanguageStats {
    pub fn hours(&self) -> f64 {
        self.total_duration_secs / 3600.0
    }

    pub fn megabytes(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB
    }

    /// Hours of audio implied by the total size
    pub fn estimated_hours(&self) -> f64 {
        self.megabytes() / ESTIMATED_MB_PER_MINUTE / 60.0
    }
}

/// Per-language totals for a data directory
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub mode: AnalysisMode,
    pub languages: BTreeMap<Language, LanguageStats>,
}

impl AnalysisReport {
    fn new(mode: AnalysisMode) -> Self {
        Self {
            mode,
            languages: Language::ALL
                .into_iter()
                .map(|language| (language, LanguageStats::default()))
                .collect(),
        }
    }

    pub fn stats(&self, language: Language) -> &LanguageStats {
        // Every language is inserted on construction
        &self.languages[&language]
    }

    pub fn total_files(&self) -> usize {
        self.languages.values().map(|s| s.count).sum()
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.languages.values().map(|s| s.total_duration_secs).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.languages.values().map(|s| s.total_bytes).sum()
    }
}

/// Classify and measure every audio file below `dir`
pub fn analyze_directory(
    dir: &Path,
    mode: AnalysisMode,
    reader: &dyn DurationReader,
) -> Result<AnalysisReport, AnalyzeError> {
    if !dir.is_dir() {
        return Err(AnalyzeError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut report = AnalysisReport::new(mode);
    let mut processed = 0usize;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().into_owned();
        if !has_audio_extension(&filename) {
            continue;
        }

        let path = entry.path();
        let metadata = std::fs::metadata(path).map_err(|e| AnalyzeError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;

        let language = classify_language(&filename);
        let stats = report.languages.entry(language).or_default();

        stats.count += 1;
        stats.total_bytes += metadata.len();

        if mode == AnalysisMode::Duration {
            match reader.duration_secs(path) {
                Some(secs) => stats.total_duration_secs += secs,
                None => {
                    debug!(path = %path.display(), "could not read duration");
                    stats.unreadable += 1;
                }
            }
        }

        stats.files.push(filename);

        processed += 1;
        if processed % 20 == 0 {
            info!(processed, "analyzing audio files");
        }
    }

    Ok(report)
}

/// Plain-text summary of a report
pub fn render_summary(report: &AnalysisReport) -> String {
    let rule = "=".repeat(70);
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Summary");
    let _ = writeln!(out, "{rule}");

    for language in Language::ALL {
        let stats = report.stats(language);
        let _ = writeln!(out, "\n{}:", language.label());
        let _ = writeln!(out, "  Files: {}", stats.count);

        match report.mode {
            AnalysisMode::Duration => {
                let _ = writeln!(
                    out,
                    "  Duration: {:.1} s = {:.2} h",
                    stats.total_duration_secs,
                    stats.hours()
                );
                if stats.unreadable > 0 {
                    let _ = writeln!(out, "  Unreadable: {}", stats.unreadable);
                }
            }
            AnalysisMode::Size => {
                let _ = writeln!(out, "  Size: {:.1} MB", stats.megabytes());
            }
        }

        if stats.count > 0 {
            let _ = writeln!(out, "  Examples:");
            for name in stats.files.iter().take(EXAMPLE_COUNT) {
                let _ = writeln!(out, "    - {name}");
            }
            if stats.count > EXAMPLE_COUNT {
                let _ = writeln!(out, "    ... and {} more", stats.count - EXAMPLE_COUNT);
            }
        }
    }

    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "Total files: {}", report.total_files());
    match report.mode {
        AnalysisMode::Duration => {
            let total = report.total_duration_secs();
            let _ = writeln!(out, "Total duration: {:.1} s = {:.2} h", total, total / 3600.0);
        }
        AnalysisMode::Size => {
            let total_mb = report.total_bytes() as f64 / BYTES_PER_MB;
            let _ = writeln!(
                out,
                "Total size: {:.1} MB = {:.2} GB",
                total_mb,
                total_mb / 1024.0
            );
        }
    }
    let _ = writeln!(out, "{rule}");

    if report.mode == AnalysisMode::Size {
        let _ = writeln!(
            out,
            "\nEstimated duration at {ESTIMATED_MB_PER_MINUTE} MB per minute:"
        );
        for language in [Language::Mandarin, Language::Cantonese] {
            let _ = writeln!(
                out,
                "  {}: about {:.1} h",
                language.label(),
                report.stats(language).estimated_hours()
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Returns fixed durations by filename
    struct FakeDurations(HashMap<String, f64>);

    impl FakeDurations {
        fn new(entries: &[(&str, f64)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(name, secs)| (name.to_string(), *secs))
                    .collect(),
            )
        }
    }

    impl DurationReader for FakeDurations {
        fn duration_secs(&self, path: &Path) -> Option<f64> {
            let name = path.file_name()?.to_str()?;
            self.0.get(name).copied()
        }
    }

    fn write_file(dir: &Path, relative: &str, size: usize) -> PathBuf {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    #[test]
    fn duration_mode_sums_by_language() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "颱風/Zh-颱風.ogg", 10);
        write_file(dir.path(), "颱風/transcript.txt", 10);
        write_file(dir.path(), "香港/Zh-yue-香港.ogg", 10);
        write_file(dir.path(), "Moon/Moon.ogg", 10);
        write_file(dir.path(), "壞/Zh-壞.ogg", 10);

        let durations = FakeDurations::new(&[
            ("Zh-颱風.ogg", 120.0),
            ("Zh-yue-香港.ogg", 60.5),
            ("Moon.ogg", 30.0),
        ]);

        let report = analyze_directory(dir.path(), AnalysisMode::Duration, &durations).unwrap();

        let mandarin = report.stats(Language::Mandarin);
        assert_eq!(mandarin.count, 2);
        assert_eq!(mandarin.total_duration_secs, 120.0);
        assert_eq!(mandarin.unreadable, 1);

        assert_eq!(report.stats(Language::Cantonese).total_duration_secs, 60.5);
        assert_eq!(report.stats(Language::English).files, ["Moon.ogg"]);
        assert_eq!(report.total_files(), 4);
        assert_eq!(report.total_duration_secs(), 210.5);
    }

    #[test]
    fn size_mode_skips_durations_and_sums_bytes() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "a/Zh-甲.ogg", 1024);
        write_file(dir.path(), "b/Zh-乙.opus", 2048);
        write_file(dir.path(), "b/Zh-乙.ogg.partial", 4096);

        let durations = FakeDurations::new(&[("Zh-甲.ogg", 99.0)]);
        let report = analyze_directory(dir.path(), AnalysisMode::Size, &durations).unwrap();

        let mandarin = report.stats(Language::Mandarin);
        assert_eq!(mandarin.count, 2);
        assert_eq!(mandarin.total_bytes, 3072);
        assert_eq!(mandarin.total_duration_secs, 0.0);
    }

    #[test]
    fn estimate_uses_half_megabyte_per_minute() {
        let stats = LanguageStats {
            total_bytes: 15 * 1024 * 1024,
            ..Default::default()
        };
        assert!((stats.estimated_hours() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = analyze_directory(
            &dir.path().join("absent"),
            AnalysisMode::Size,
            &FakeDurations::new(&[]),
        );
        assert!(matches!(result, Err(AnalyzeError::DirectoryNotFound(_))));
    }

    #[test]
    fn summary_lists_at_most_five_examples() {
        let dir = tempdir().unwrap();
        for i in 0..7 {
            write_file(dir.path(), &format!("t/track{i}.ogg"), 1);
        }

        let report =
            analyze_directory(dir.path(), AnalysisMode::Size, &FakeDurations::new(&[])).unwrap();
        let summary = render_summary(&report);

        assert!(summary.contains("    - track4.ogg"));
        assert!(!summary.contains("    - track5.ogg"));
        assert!(summary.contains("... and 2 more"));
        assert!(summary.contains("Total files: 7"));
        assert!(summary.contains("Estimated duration"));
    }

    #[test]
    fn duration_summary_reports_hours() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "t/Zh-長.ogg", 1);

        let durations = FakeDurations::new(&[("Zh-長.ogg", 7200.0)]);
        let report = analyze_directory(dir.path(), AnalysisMode::Duration, &durations).unwrap();
        let summary = render_summary(&report);

        assert!(summary.contains("Duration: 7200.0 s = 2.00 h"));
        assert!(!summary.contains("Estimated duration"));
    }
}
