// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request pacing for the wiki and media servers.
//!
//! All remote calls go through one [`Pacer`], which inserts fixed politeness
//! delays and a longer backoff after a rate-limit response. Sleeping is
//! delegated to a [`Sleeper`] so tests can observe pacing without waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::PacingIntervals;

/// Suspends the current task for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Points in the crawl where a politeness delay applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    BetweenPages,
    BetweenArticles,
    AfterDownload,
}

/// Fixed-interval pacer shared by every stage that talks to the servers
#[derive(Clone)]
pub struct Pacer {
    intervals: PacingIntervals,
    sleeper: Arc<dyn Sleeper>,
}

impl Pacer {
    pub fn new(intervals: PacingIntervals, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { intervals, sleeper }
    }

    /// Pacer backed by the tokio timer
    pub fn with_tokio(intervals: PacingIntervals) -> Self {
        Self::new(intervals, Arc::new(TokioSleeper))
    }

    pub fn intervals(&self) -> &PacingIntervals {
        &self.intervals
    }

    /// Wait out the politeness delay for `pause`
    pub async fn pause(&self, pause: Pause) {
        let duration = match pause {
            Pause::BetweenPages => self.intervals.between_pages,
            Pause::BetweenArticles => self.intervals.between_articles,
            Pause::AfterDownload => self.intervals.after_download,
        };
        self.wait(duration).await;
    }

    /// Wait out the extended delay after a rate-limit response
    pub async fn back_off(&self) {
        tracing::warn!(
            backoff_secs = self.intervals.rate_limit_backoff.as_secs_f64(),
            "rate limited, backing off"
        );
        self.wait(self.intervals.rate_limit_backoff).await;
    }

    async fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            self.sleeper.sleep(duration).await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::recording_pacer;
    use super::*;

    #[tokio::test]
    async fn pause_uses_configured_interval() {
        let (pacer, sleeper) = recording_pacer();

        pacer.pause(Pause::BetweenPages).await;
        pacer.pause(Pause::BetweenArticles).await;
        pacer.pause(Pause::AfterDownload).await;
        pacer.back_off().await;

        assert_eq!(
            sleeper.recorded(),
            [
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(30),
            ]
        );
    }

    #[tokio::test]
    async fn zero_intervals_do_not_sleep() {
        let sleeper = Arc::new(testing::RecordingSleeper::default());
        let pacer = Pacer::new(PacingIntervals::none(), sleeper.clone());

        pacer.pause(Pause::AfterDownload).await;
        pacer.back_off().await;

        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn tokio_sleeper_returns() {
        TokioSleeper.sleep(Duration::from_millis(1)).await;
    }
}
