//! Percentage shared between a running commit and its poller.

use std::sync::atomic::{AtomicU8, Ordering};

const NO_DATA: u8 = u8::MAX;

#[derive(Debug)]
pub struct ProgressState {
    value: AtomicU8,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            value: AtomicU8::new(NO_DATA),
        }
    }

    /// Marks the state as having no data.
    pub fn reset(&self) {
        self.value.store(NO_DATA, Ordering::Release);
    }

    /// Records a percentage, clamped to 100.
    pub fn set(&self, percent: u8) {
        self.value.store(percent.min(100), Ordering::Release);
    }

    /// Latest percentage, or `None` when no data has been written since the last reset.
    pub fn get(&self) -> Option<u8> {
        match self.value.load(Ordering::Acquire) {
            NO_DATA => None,
            percent => Some(percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_starts_without_data() {
        let state = ProgressState::new();
        assert_eq!(state.get(), None);
    }

    #[test]
    fn test_set_reset() {
        let state = ProgressState::new();
        state.set(42);
        assert_eq!(state.get(), Some(42));
        state.set(250);
        assert_eq!(state.get(), Some(100));
        state.reset();
        assert_eq!(state.get(), None);
    }

    #[test]
    fn test_cross_thread_visibility() {
        let state = Arc::new(ProgressState::new());
        let writer = state.clone();
        thread::spawn(move || {
            for p in 0..=100 {
                writer.set(p);
            }
        })
        .join()
        .unwrap();
        assert_eq!(state.get(), Some(100));
    }
}
