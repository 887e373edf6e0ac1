/// Countdown for the active round.
///
/// Integer seconds, floored at zero. The zero-crossing is reported exactly
/// once; after that (or after `cancel`) further ticks are no-ops, so a stale
/// tick can never mutate a round whose lifetime has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    armed: bool,
}

impl Countdown {
    pub fn start(secs: u32) -> Self {
        Self {
            remaining: secs,
            armed: secs > 0,
        }
    }

    /// A countdown that is not running. `cancel` and `tick` are safe on it.
    pub fn idle() -> Self {
        Self {
            remaining: 0,
            armed: false,
        }
    }

    /// Advance one second. Returns true exactly when the countdown first
    /// reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.armed = false;
            return true;
        }
        false
    }

    /// Idempotent; safe when nothing is running.
    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_running(&self) -> bool {
        self.armed
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Two-digit zero-padded display, e.g. "09s".
    pub fn label(&self) -> String {
        format!("{:02}s", self.remaining)
    }
}
