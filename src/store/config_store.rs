//! Lock-free configuration store with change notification.
//!
//! `ConfigStore<T>` keeps the current `(config, version)` pair in an
//! `ArcSwapOption` and publishes the applied version on a watch channel so
//! consumers can react to reloads without polling.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use super::version::VersionToken;

/// An immutable configuration paired with the version it was loaded at.
#[derive(Debug)]
pub struct Snapshot<T> {
    config: T,
    version: VersionToken,
}

impl<T> Snapshot<T> {
    pub fn config(&self) -> &T {
        &self.config
    }

    pub fn version(&self) -> VersionToken {
        self.version
    }
}

/// Returned by [`StoreSubscription::changed`] once every store handle is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("configuration store closed")]
pub struct StoreClosed;

/// A shared, versioned configuration store.
///
/// Created empty; populated by the first successful reload. Cloning is
/// cheap and every clone observes the same state.
pub struct ConfigStore<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    current: ArcSwapOption<Snapshot<T>>,
    version_tx: watch::Sender<VersionToken>,
}

/// Receives the version of each applied swap.
pub struct StoreSubscription {
    version_rx: watch::Receiver<VersionToken>,
}

// -- ConfigStore --------------------------------------------------------

impl<T> ConfigStore<T> {
    /// Create an empty store at [`VersionToken::UNSET`].
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(VersionToken::UNSET);
        Self {
            inner: Arc::new(StoreInner {
                current: ArcSwapOption::empty(),
                version_tx,
            }),
        }
    }

    /// Current snapshot.
    ///
    /// Callers must only reach this after the initial load has succeeded;
    /// `None` means that precondition was violated.
    pub fn get(&self) -> Option<Arc<Snapshot<T>>> {
        self.inner.current.load_full()
    }

    /// Version of the stored snapshot, `UNSET` while empty.
    pub fn current_version(&self) -> VersionToken {
        let current = self.inner.current.load();
        match &*current {
            Some(snapshot) => snapshot.version,
            None => VersionToken::UNSET,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.current.load().is_some()
    }

    /// Replace the stored pair unconditionally.
    pub fn swap(&self, config: T, version: VersionToken) {
        self.inner
            .current
            .store(Some(Arc::new(Snapshot { config, version })));
        self.inner.version_tx.send_replace(version);
    }

    /// Replace the stored pair only if `version` is strictly newer than the
    /// stored one at the moment of the swap.
    ///
    /// Returns whether the swap was applied. Racing callers cannot move the
    /// store backwards: a loser re-checks against the winner's version.
    pub fn swap_if_newer(&self, config: T, version: VersionToken) -> bool {
        let next = Some(Arc::new(Snapshot { config, version }));
        let mut current = self.inner.current.load();

        loop {
            if let Some(existing) = &*current {
                if existing.version >= version {
                    return false;
                }
            }

            let previous = self.inner.current.compare_and_swap(&current, next.clone());
            if same_snapshot(&previous, &current) {
                self.inner.version_tx.send_if_modified(|latest| {
                    if version > *latest {
                        *latest = version;
                        true
                    } else {
                        false
                    }
                });
                return true;
            }
            current = previous;
        }
    }

    /// Subscribe to applied swaps.
    pub fn subscribe(&self) -> StoreSubscription {
        StoreSubscription {
            version_rx: self.inner.version_tx.subscribe(),
        }
    }
}

fn same_snapshot<T>(a: &Option<Arc<Snapshot<T>>>, b: &Option<Arc<Snapshot<T>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ConfigStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- StoreSubscription --------------------------------------------------

impl StoreSubscription {
    /// Wait for the next applied swap and return its version.
    pub async fn changed(&mut self) -> Result<VersionToken, StoreClosed> {
        self.version_rx.changed().await.map_err(|_| StoreClosed)?;
        Ok(*self.version_rx.borrow_and_update())
    }

    /// Latest version seen on the channel, without waiting.
    pub fn latest(&self) -> VersionToken {
        *self.version_rx.borrow()
    }
}
