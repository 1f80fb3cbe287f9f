//! Invocation context and deadline translation.
//!
//! The hosting platform hands every probe an absolute deadline. The probe
//! translates it once into a whole-second budget (embedded into connection
//! strings for drivers that take a client-side timeout parameter) and keeps
//! the absolute instant for scoping each network-bound phase.

use std::time::{Duration, Instant};

use crate::error::ConfigError;

/// The invocation context supplied by the hosting platform.
///
/// A probe requires the context to carry an absolute deadline; absence is a
/// configuration error, not a default-timeout fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunContext {
    deadline: Option<Instant>,
}

impl RunContext {
    /// A context without a deadline. `run` rejects it; useful for hosts that
    /// attach the deadline separately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires at the given instant.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// The absolute deadline, when set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// The deadline translated into the two forms the lifecycle consumes.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineBudget {
    /// Absolute deadline for phase scoping.
    pub deadline: Instant,
    /// Whole-second floor of the remaining budget, computed once.
    pub remaining_secs: i64,
}

impl DeadlineBudget {
    /// Translate the context's deadline.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoDeadline`] when the context carries none.
    pub fn derive(ctx: &RunContext) -> Result<Self, ConfigError> {
        let deadline = ctx.deadline().ok_or(ConfigError::NoDeadline)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        Ok(Self {
            deadline,
            // i64 keeps the non-positive case representable for the
            // strategies' budget check
            remaining_secs: remaining.as_secs() as i64,
        })
    }
}
