//! Handle state machine.

/// Lifecycle state of one reserved message.
///
/// State transitions:
/// - Reserved -> Deleted
/// - Reserved -> Released (the remote side now holds a new, separate message)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// Handed to a worker, not yet finalized.
    Reserved,

    /// Acknowledged; removed from the remote queue (or auto-acknowledged if pushed).
    Deleted,

    /// Re-published with an incremented attempt count.
    Released,
}

impl HandleState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, HandleState::Deleted | HandleState::Released)
    }
}

/// Finalize bookkeeping shared with the worker.
///
/// A pull-mode release deletes the old reservation first, so both flags can be
/// set at once. `state()` reports `Released` in that case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settlement {
    deleted: bool,
    released: bool,
}

impl Settlement {
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub fn mark_released(&mut self) {
        self.released = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn is_deleted_or_released(&self) -> bool {
        self.deleted || self.released
    }

    pub fn state(&self) -> HandleState {
        if self.released {
            HandleState::Released
        } else if self.deleted {
            HandleState::Deleted
        } else {
            HandleState::Reserved
        }
    }
}
