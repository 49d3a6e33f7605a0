// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod classify;
mod duration;
mod report;

pub use classify::{Language, classify_language};
pub use duration::{DurationReader, SymphoniaReader};
pub use report::{
    AnalysisMode, AnalysisReport, ESTIMATED_MB_PER_MINUTE, EXAMPLE_COUNT, LanguageStats,
    analyze_directory, render_summary,
};
