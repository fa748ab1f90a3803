//! Cooperative cancellation for decision calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PolicyError;

/// Cancellation signal accepted by a decision call.
///
/// The engine checks the token between expression evaluations and at cache
/// refresh boundaries; once it observes cancellation, partial work is
/// discarded and the call returns [`PolicyError::Canceled`]. Deadlines are
/// the caller's policy: a token built with [`CancelToken::with_deadline`]
/// trips itself once the deadline passes, but the engine never imposes one.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    canceled: AtomicBool,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only cancels when [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that additionally trips once `deadline` has elapsed.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            inner: Arc::new(TokenState {
                canceled: AtomicBool::new(false),
                deadline: Some(Instant::now() + deadline),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        if self.inner.canceled.load(Ordering::Acquire) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    pub(crate) fn check(&self) -> Result<(), PolicyError> {
        if self.is_canceled() {
            Err(PolicyError::Canceled)
        } else {
            Ok(())
        }
    }
}
