//! Single transient status message with self-expiry.
//!
//! Each `show` replaces the current message and arms a timer scoped to that message. Messages
//! carry a generation number; an expiry timer only clears the slot if the generation it was
//! armed for is still current, so a superseded timer can never clear its replacement.
//! An optional change notifier is bumped whenever the displayed message changes, including on
//! expiry.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
	Success,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackMessage {
	pub kind: FeedbackKind,
	pub text: String,
	#[serde(skip_serializing)]
	pub expires_at: Instant,
}

#[derive(Default)]
struct FeedbackSlot {
	message: Option<FeedbackMessage>,
	generation: u64,
	timer: Option<JoinHandle<()>>,
}

impl FeedbackSlot {
	fn cancel_timer(&mut self) {
		if let Some(timer) = self.timer.take() {
			timer.abort();
		}
	}
}

fn lock(slot: &Mutex<FeedbackSlot>) -> MutexGuard<'_, FeedbackSlot> {
	slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Version counter bumped on every change
pub type ChangeNotifier = Arc<watch::Sender<u64>>;

fn bump(notifier: Option<&ChangeNotifier>) {
	if let Some(notifier) = notifier {
		notifier.send_modify(|version| *version += 1);
	}
}

pub struct FeedbackController {
	slot: Arc<Mutex<FeedbackSlot>>,
	ttl: Duration,
	notifier: Option<ChangeNotifier>,
}

impl FeedbackController {
	pub fn new(ttl: Duration) -> Self {
		Self {
			slot: Arc::new(Mutex::new(FeedbackSlot::default())),
			ttl,
			notifier: None,
		}
	}

	/// Bump `notifier` whenever the message is shown, cleared or expires.
	pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
		self.notifier = Some(notifier);
		self
	}

	/// Replace the current message and restart the expiry timer for the new one.
	///
	/// Must be called inside a Tokio runtime; the expiry timer is a spawned task.
	pub fn show(&self, kind: FeedbackKind, text: impl Into<String>) {
		let text = text.into();
		let mut slot = lock(&self.slot);

		slot.cancel_timer();
		slot.generation += 1;
		let generation = slot.generation;

		debug!("Feedback #{} ({:?}): {}", generation, kind, text);
		slot.message = Some(FeedbackMessage {
			kind,
			text,
			expires_at: Instant::now() + self.ttl,
		});
		slot.timer = Some(tokio::spawn(expire(
			Arc::downgrade(&self.slot),
			generation,
			self.ttl,
			self.notifier.clone(),
		)));
		drop(slot);
		bump(self.notifier.as_ref());
	}

	pub fn success(&self, text: impl Into<String>) {
		self.show(FeedbackKind::Success, text);
	}

	pub fn error(&self, text: impl Into<String>) {
		self.show(FeedbackKind::Error, text);
	}

	/// Remove the message now and cancel its timer.
	pub fn clear(&self) {
		let mut slot = lock(&self.slot);
		slot.cancel_timer();
		slot.generation += 1;
		slot.message = None;
		drop(slot);
		bump(self.notifier.as_ref());
	}

	pub fn current(&self) -> Option<FeedbackMessage> {
		lock(&self.slot).message.clone()
	}
}

impl Drop for FeedbackController {
	fn drop(&mut self) {
		lock(&self.slot).cancel_timer();
	}
}

async fn expire(
	slot: Weak<Mutex<FeedbackSlot>>,
	generation: u64,
	ttl: Duration,
	notifier: Option<ChangeNotifier>,
) {
	tokio::time::sleep(ttl).await;

	let Some(slot) = slot.upgrade() else {
		return;
	};
	{
		let mut slot = lock(&slot);
		if slot.generation != generation {
			return;
		}
		slot.message = None;
		slot.timer = None;
	}
	debug!("Feedback #{} expired", generation);
	bump(notifier.as_ref());
}
