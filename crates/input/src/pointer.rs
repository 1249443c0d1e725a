/// Phase of the pointer-capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockPhase {
    #[default]
    Unlocked,
    /// A lock was requested from the host and has not resolved yet.
    Pending,
    Locked,
}

/// Pointer-lock session.
///
/// Acquiring the lock is asynchronous on most hosts: a request is issued and
/// resolves later. Until it resolves the session counts as unlocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerLock {
    phase: LockPhase,
}

impl PointerLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> LockPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.phase == LockPhase::Locked
    }

    /// Start a lock request. Returns `true` if the host should be asked to
    /// capture the pointer.
    pub fn request(&mut self) -> bool {
        match self.phase {
            LockPhase::Unlocked => {
                self.phase = LockPhase::Pending;
                tracing::debug!("pointer lock requested");
                true
            }
            LockPhase::Pending | LockPhase::Locked => false,
        }
    }

    /// The host answered a pending request.
    pub fn resolve(&mut self, granted: bool) {
        if self.phase != LockPhase::Pending {
            tracing::debug!(granted, "ignoring stale pointer lock resolution");
            return;
        }
        self.phase = if granted {
            tracing::info!("pointer locked");
            LockPhase::Locked
        } else {
            tracing::warn!("pointer lock denied by host");
            LockPhase::Unlocked
        };
    }

    /// The user or the host ended the session.
    pub fn release(&mut self) {
        if self.phase != LockPhase::Unlocked {
            tracing::info!("pointer unlocked");
        }
        self.phase = LockPhase::Unlocked;
    }
}
