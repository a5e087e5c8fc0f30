//! Time source for confirmation polling.
//!
//! The engine never calls `tokio::time::sleep` directly. Tests inject a
//! [`RecordingClock`] so a 60-attempt budget finishes instantly and the
//! requested delays can be asserted.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Something that can wait.
#[async_trait]
pub trait Clock: Send + Sync {
	/// Suspends the current task for `duration`.
	async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
	async fn sleep(&self, duration: Duration) {
		tokio::time::sleep(duration).await;
	}
}

/// A clock that returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingClock {
	sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every delay requested so far, in order.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps
			.lock()
			.map(|sleeps| sleeps.clone())
			.unwrap_or_default()
	}
}

#[async_trait]
impl Clock for RecordingClock {
	async fn sleep(&self, duration: Duration) {
		if let Ok(mut sleeps) = self.sleeps.lock() {
			sleeps.push(duration);
		}
		tokio::task::yield_now().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_recording_clock_records_without_waiting() {
		let clock = RecordingClock::new();
		clock.sleep(Duration::from_secs(3600)).await;
		clock.sleep(Duration::from_secs(2)).await;
		assert_eq!(
			clock.sleeps(),
			vec![Duration::from_secs(3600), Duration::from_secs(2)]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_tokio_clock_advances_paused_time() {
		let start = tokio::time::Instant::now();
		TokioClock.sleep(Duration::from_secs(5)).await;
		assert!(start.elapsed() >= Duration::from_secs(5));
	}
}
