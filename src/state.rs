//! Shared behavioral state
//!
//! Four independent flags coordinate every control loop in the head. Each
//! flag is a single `AtomicBool`; no invariant spans two flags, so readers
//! never need a lock and must tolerate a flag changing between check and use.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide behavioral flags.
///
/// The conversation driver writes `armed`/`thinking`/`speaking`, failure
/// handlers write `offline`, and the behavior loops only read. `running` is
/// the shutdown flag; clearing it is the only way any loop terminates.
#[derive(Debug)]
pub struct HeadState {
    armed: AtomicBool,
    thinking: AtomicBool,
    speaking: AtomicBool,
    offline: AtomicBool,
    running: AtomicBool,
}

impl Default for HeadState {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadState {
    pub fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            thinking: AtomicBool::new(false),
            speaking: AtomicBool::new(false),
            offline: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn set_armed(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking.load(Ordering::SeqCst)
    }

    pub fn set_thinking(&self, thinking: bool) {
        self.thinking.store(thinking, Ordering::SeqCst);
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    pub fn set_speaking(&self, speaking: bool) {
        self.speaking.store(speaking, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown of every loop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Select the gaze behavior for this iteration.
    ///
    /// The flags are sampled once so one iteration acts on one coherent-ish
    /// snapshot even if a writer races the selection.
    pub fn gaze_mode(&self) -> GazeMode {
        if self.is_offline() {
            GazeMode::Offline
        } else if !self.is_armed() {
            GazeMode::Asleep
        } else if self.is_thinking() {
            GazeMode::Thinking
        } else if self.is_speaking() {
            GazeMode::Speaking
        } else {
            GazeMode::Idle
        }
    }
}

/// Gaze behavior selected from the flags, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeMode {
    Offline,
    Asleep,
    Thinking,
    Speaking,
    Idle,
}
