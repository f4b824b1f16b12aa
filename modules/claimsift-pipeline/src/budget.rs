use std::sync::atomic::{AtomicU32, Ordering};

/// Tracks news-API calls against the per-run ceiling.
/// Monotone: the counter is never decremented, only reset by building
/// a fresh budget at the start of a run. Atomic so accounting stays
/// exact even under a concurrent caller.
pub struct CallBudget {
    ceiling: u32,
    used: AtomicU32,
}

impl CallBudget {
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            used: AtomicU32::new(0),
        }
    }

    /// Claim one call unit. Returns false (without consuming) when the
    /// ceiling is already reached. This is the only mutation path.
    pub fn try_consume(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                if used < self.ceiling {
                    Some(used + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    pub fn is_exhausted(&self) -> bool {
        self.used() >= self.ceiling
    }

    /// Calls made so far this run.
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> u32 {
        self.ceiling.saturating_sub(self.used())
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}
