//! Single-assignment handoff slot between loader tasks and the render loop.
//!
//! A slot is written at most once by a producer (fulfill or fail) and read
//! from the render thread by polling. The decoded image is moved out exactly
//! once; after that the slot only remembers that it was claimed, so the
//! decoded bitmap can be reclaimed while the rendered form lives on.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::ports::CacheError;

/// Internal slot state. `Claimed` means the image was taken by the consumer.
enum SlotState {
    Pending,
    Ready(Arc<image::DynamicImage>),
    Failed(CacheError),
    Claimed,
}

/// Cheap per-frame view of a slot, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPoll {
    /// No result yet.
    Pending,
    /// A decoded image is waiting to be taken.
    Ready,
    /// Resolution failed. Terminal.
    Failed,
    /// The image was already taken.
    Claimed,
}

/// A thread-safe, single-assignment cell carrying one decoded image.
///
/// Producers may complete the slot from any thread; consumers poll it from
/// the render thread. The first write wins and later writes are ignored.
#[derive(Clone)]
pub struct ImageSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ImageSlot {
    /// Creates an empty slot awaiting a result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Pending)),
        }
    }

    /// Creates a slot that already holds a decoded image.
    /// Used when a cache hit resolves a request at construction time.
    #[must_use]
    pub fn ready(image: Arc<image::DynamicImage>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Ready(image))),
        }
    }

    /// Creates a slot that already failed.
    #[must_use]
    pub fn failed(error: CacheError) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotState::Failed(error))),
        }
    }

    /// Completes the slot with a decoded image.
    /// Returns false if the slot was already completed.
    pub fn fulfill(&self, image: Arc<image::DynamicImage>) -> bool {
        let mut state = self.inner.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Ready(image);
            true
        } else {
            debug!("Ignoring fulfill on completed slot");
            false
        }
    }

    /// Completes the slot with an error.
    /// Returns false if the slot was already completed.
    pub fn fail(&self, error: CacheError) -> bool {
        let mut state = self.inner.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Failed(error);
            true
        } else {
            debug!("Ignoring fail on completed slot");
            false
        }
    }

    /// Returns the current state without touching the payload.
    #[must_use]
    pub fn poll(&self) -> SlotPoll {
        match *self.inner.lock() {
            SlotState::Pending => SlotPoll::Pending,
            SlotState::Ready(_) => SlotPoll::Ready,
            SlotState::Failed(_) => SlotPoll::Failed,
            SlotState::Claimed => SlotPoll::Claimed,
        }
    }

    /// Moves the decoded image out, leaving the slot claimed.
    /// Returns None unless the slot is in the ready state.
    #[must_use]
    pub fn take_ready(&self) -> Option<Arc<image::DynamicImage>> {
        let mut state = self.inner.lock();
        if matches!(*state, SlotState::Ready(_)) {
            match std::mem::replace(&mut *state, SlotState::Claimed) {
                SlotState::Ready(image) => Some(image),
                _ => unreachable!(),
            }
        } else {
            None
        }
    }

    /// Returns the failure, if the slot failed.
    #[must_use]
    pub fn error(&self) -> Option<CacheError> {
        match &*self.inner.lock() {
            SlotState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

impl Default for ImageSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("state", &self.poll())
            .finish()
    }
}
