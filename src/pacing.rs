//! Pacing between successive page fetches.
//!
//! The collector never sleeps directly; it asks a [`Pacer`] to wait. The
//! production pacer suspends the task with `tokio::time::sleep`, tests inject
//! one that records the requested delays and returns immediately.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument};

/// Something that can hold the collector back between two requests.
pub trait Pacer {
    /// Wait for `delay` before the next request is issued.
    async fn pause(&self, delay: Duration);
}

/// Pacer backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    #[instrument(level = "debug", skip(self))]
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        info!(secs = delay.as_secs(), "Waiting before the next request");
        sleep(delay).await;
    }
}
