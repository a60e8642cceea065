//! Composable cancellation tokens.
//!
//! An [`AbortSignal`] is a shared flag that fires at most once. Transports
//! observe it to abandon an in-flight exchange. Signals combine with
//! [`AbortSignal::any`]: the combined signal fires as soon as any parent does.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::{Error, Result};

/// Why a signal fired.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AbortReason {
    /// A timer fired after the given duration.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// [`AbortController::abort`] was called.
    #[error("cancelled by caller")]
    Cancelled,
}

impl AbortReason {
    /// Returns `true` for [`AbortReason::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

struct Inner {
    reason: watch::Sender<Option<AbortReason>>,
    // Combined signals created from this one. Weak so a discarded combination
    // does not stay alive through its parents.
    dependents: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn new() -> Self {
        let (reason, _) = watch::channel(None);
        Self {
            reason,
            dependents: Mutex::new(Vec::new()),
        }
    }

    fn reason(&self) -> Option<AbortReason> {
        self.reason.borrow().clone()
    }

    fn abort(&self, reason: AbortReason) {
        let fired = self.reason.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
        if !fired {
            return;
        }

        let dependents = std::mem::take(&mut *lock(&self.dependents));
        for dependent in dependents {
            if let Some(dependent) = dependent.upgrade() {
                dependent.abort(reason.clone());
            }
        }
    }

    fn register(&self, dependent: &Arc<Inner>) {
        let mut dependents = lock(&self.dependents);
        // Combined signals dropped without firing leave dead entries behind.
        dependents.retain(|weak| weak.strong_count() > 0);
        dependents.push(Arc::downgrade(dependent));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read side of a cancellation token. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<Inner>,
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortSignal")
            .field("reason", &self.reason())
            .finish()
    }
}

impl AbortSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new(Inner::new()),
        }
    }

    /// Returns `true` once the signal has fired.
    pub fn is_aborted(&self) -> bool {
        self.inner.reason.borrow().is_some()
    }

    /// Returns the reason the signal fired with, if it has.
    pub fn reason(&self) -> Option<AbortReason> {
        self.inner.reason()
    }

    /// Resolves when the signal fires. Resolves immediately if it already has.
    pub async fn aborted(&self) -> AbortReason {
        let mut rx = self.inner.reason.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Unreachable while `self` holds the sender.
                return std::future::pending().await;
            }
        }
    }

    /// Combines signals: the result fires as soon as any input fires, with
    /// that input's reason. An input that already fired makes the result
    /// fire immediately.
    pub fn any<'a, I>(signals: I) -> Self
    where
        I: IntoIterator<Item = &'a AbortSignal>,
    {
        let combined = Self::new();
        for signal in signals {
            signal.inner.register(&combined.inner);
            // Covers a parent that fired before registration went through.
            if let Some(reason) = signal.reason() {
                combined.inner.abort(reason);
                break;
            }
        }
        combined
    }

    /// Returns a signal that fires with [`AbortReason::Timeout`] after
    /// `duration`, measured on the tokio clock.
    ///
    /// Fails with [`Error::Other`] outside a tokio runtime, since the timer
    /// runs as a spawned task.
    pub fn timeout(duration: Duration) -> Result<Self> {
        let handle = Handle::try_current().map_err(Error::other)?;
        let controller = AbortController::new();
        let signal = controller.signal();
        handle.spawn(async move {
            tokio::time::sleep(duration).await;
            controller.abort_with(AbortReason::Timeout(duration));
        });
        Ok(signal)
    }
}

/// Write side of a cancellation token.
#[derive(Clone, Debug)]
pub struct AbortController {
    signal: AbortSignal,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    /// Creates a controller with an unfired signal.
    pub fn new() -> Self {
        Self {
            signal: AbortSignal::new(),
        }
    }

    /// Returns the signal controlled by this controller.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fires the signal with [`AbortReason::Cancelled`].
    pub fn abort(&self) {
        self.abort_with(AbortReason::Cancelled);
    }

    /// Fires the signal. Only the first call has an effect.
    pub fn abort_with(&self, reason: AbortReason) {
        #[cfg(feature = "tracing")]
        tracing::debug!(%reason, "aborting signal");

        self.signal.inner.abort(reason);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AbortController, AbortReason, AbortSignal};

    #[test]
    fn abort_is_idempotent_and_first_reason_wins() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        controller.abort_with(AbortReason::Timeout(Duration::from_millis(5)));
        controller.abort();

        assert_eq!(
            signal.reason(),
            Some(AbortReason::Timeout(Duration::from_millis(5)))
        );
    }

    #[test]
    fn any_fires_when_either_parent_fires() {
        let first = AbortController::new();
        let second = AbortController::new();
        let combined = AbortSignal::any([&first.signal(), &second.signal()]);
        assert!(!combined.is_aborted());

        second.abort();
        assert_eq!(combined.reason(), Some(AbortReason::Cancelled));
        assert!(!first.signal().is_aborted());
    }

    #[test]
    fn any_of_already_fired_parent_is_fired() {
        let parent = AbortController::new();
        parent.abort();
        let combined = AbortSignal::any([&parent.signal()]);
        assert!(combined.is_aborted());
    }

    #[test]
    fn combined_signal_does_not_fire_parents() {
        let parent = AbortController::new();
        let combined = AbortSignal::any([&parent.signal()]);
        let nested = AbortSignal::any([&combined]);

        parent.abort();
        assert!(combined.is_aborted());
        assert!(nested.is_aborted());
    }

    #[test]
    fn any_of_nothing_never_fires() {
        let combined = AbortSignal::any([]);
        assert!(!combined.is_aborted());
    }

    #[test]
    fn dropped_combinations_do_not_accumulate_on_parent() {
        let parent = AbortController::new();
        let parent_signal = parent.signal();

        for _ in 0..10_000 {
            let other = AbortController::new();
            let combined = AbortSignal::any([&parent_signal, &other.signal()]);
            other.abort();
            assert!(combined.is_aborted());
        }

        let retained = super::lock(&parent_signal.inner.dependents).len();
        assert!(retained <= 1, "parent retained {retained} dependents");
        assert!(!parent_signal.is_aborted());
    }

    #[test]
    fn timeout_outside_runtime_is_an_error() {
        assert!(AbortSignal::timeout(Duration::from_millis(10)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_resolves_after_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.aborted().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();

        let reason = waiter.await.expect("waiter task must not panic");
        assert_eq!(reason, AbortReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_signal_fires_after_duration() {
        let signal =
            AbortSignal::timeout(Duration::from_millis(100)).expect("runtime must be present");

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(!signal.is_aborted());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(
            signal.reason(),
            Some(AbortReason::Timeout(Duration::from_millis(100)))
        );
    }
}
