// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Measures the playing time of an audio file
pub trait DurationReader: Send + Sync {
    /// Duration in seconds, or `None` if the file cannot be read
    fn duration_secs(&self, path: &Path) -> Option<f64>;
}

/// Reads durations from container headers with symphonia
///
/// Falls back to summing packet durations when the container does not
/// declare a frame count.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaReader;

impl DurationReader for SymphoniaReader {
    fn duration_secs(&self, path: &Path) -> Option<f64> {
        let file = File::open(path).ok()?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let opened = match symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        ) {
            Ok(opened) => opened,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unrecognized audio container");
                return None;
            }
        };

        track_duration(opened.format)
    }
}

fn track_duration(mut format: Box<dyn FormatReader>) -> Option<f64> {
    let track = format.default_track()?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let frames = match params.n_frames {
        Some(frames) => frames,
        None => {
            let mut frames = 0u64;
            while let Ok(packet) = format.next_packet() {
                if packet.track_id() == track_id {
                    frames += packet.dur;
                }
            }
            frames
        }
    };

    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(frames);
        return Some(time.seconds as f64 + time.frac);
    }

    params
        .sample_rate
        .filter(|rate| *rate > 0)
        .map(|rate| frames as f64 / f64::from(rate))
}
