//! Deferred Resource Disposal
//!
//! GPU commands execute asynchronously: a command buffer submitted this frame may
//! still read a buffer or texture long after the CPU side stopped caring about it.
//! Native destroy calls are immediate, so destruction has to wait until every
//! submission that referenced the resource has completed.
//!
//! [`Disposer`] keeps a reference count per resource key. Each submission collects
//! the keys it touches in a [`ResourceSet`], taking one reference per distinct
//! key. Once the submission's fence signals, the driver releases the set; a
//! resource whose count drops to zero moves to the graveyard, and its destructor
//! runs on the next [`Disposer::gc`].
//!
//! ```text
//! create_disposable ──► Active (refcount ≥ 1) ──remove_reference──► Condemned
//!                          ▲        │                                 │
//!                          └─acquire┘                               gc()
//!                                                                     ▼
//!                                                                 Destroyed
//! ```

use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};

use rustc_hash::{FxHashMap, FxHashSet};

use vesper_core::errors::{Result, VesperError};

/// Native teardown of one resource.
pub type Destructor = Box<dyn FnOnce() + Send>;

struct Disposable {
    refcount: usize,
    destructor: Destructor,
}

/// Keys referenced by one unit of GPU work.
///
/// Acquiring the same key twice into a set takes a single reference. The set is
/// emptied by [`Disposer::release`] and can be reused for the next submission.
///
/// Membership stands for references held, so a set cannot be cloned:
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<vesper_driver::ResourceSet<u32>>();
/// ```
#[derive(Debug)]
pub struct ResourceSet<K> {
    keys: FxHashSet<K>,
}

impl<K: Copy + Eq + Hash> ResourceSet<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }
}

impl<K: Copy + Eq + Hash> Default for ResourceSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference-counted deferred destruction keyed by `K`.
///
/// Not internally synchronized; the owner serializes all calls.
pub struct Disposer<K> {
    disposables: FxHashMap<K, Disposable>,
    graveyard: FxHashMap<K, Destructor>,
}

impl<K: Copy + Eq + Hash + fmt::Debug> Disposer<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            disposables: FxHashMap::default(),
            graveyard: FxHashMap::default(),
        }
    }

    /// Starts tracking `key` with a reference count of 1.
    ///
    /// Fails if `key` is still live or condemned; a key becomes available again
    /// once [`gc`](Self::gc) has destroyed it.
    pub fn create_disposable(
        &mut self,
        key: K,
        destructor: impl FnOnce() + Send + 'static,
    ) -> Result<()> {
        if self.graveyard.contains_key(&key) {
            return Err(VesperError::DisposableCondemned(format!("{key:?}")));
        }
        match self.disposables.entry(key) {
            Entry::Occupied(_) => Err(VesperError::DuplicateDisposable(format!("{key:?}"))),
            Entry::Vacant(slot) => {
                slot.insert(Disposable {
                    refcount: 1,
                    destructor: Box::new(destructor),
                });
                Ok(())
            }
        }
    }

    pub fn add_reference(&mut self, key: K) -> Result<()> {
        match self.disposables.get_mut(&key) {
            Some(disposable) => {
                disposable.refcount += 1;
                Ok(())
            }
            None => Err(self.missing(key)),
        }
    }

    /// Drops one reference. At zero the resource is condemned: it leaves the live
    /// map and its destructor waits for the next [`gc`](Self::gc).
    pub fn remove_reference(&mut self, key: K) -> Result<()> {
        let Some(disposable) = self.disposables.get_mut(&key) else {
            return Err(self.missing(key));
        };

        disposable.refcount -= 1;
        if disposable.refcount == 0
            && let Some(disposable) = self.disposables.remove(&key)
        {
            log::trace!("Disposable {key:?} condemned");
            self.graveyard.insert(key, disposable.destructor);
        }
        Ok(())
    }

    /// Attributes one reference on `key` to `set`, unless the set already holds it.
    pub fn acquire(&mut self, key: K, set: &mut ResourceSet<K>) -> Result<()> {
        if set.contains(&key) {
            return Ok(());
        }
        self.add_reference(key)?;
        set.keys.insert(key);
        Ok(())
    }

    /// Drops the reference each key in `set` holds and empties the set.
    ///
    /// Every key is processed even if some fail; the first failure is returned.
    pub fn release(&mut self, set: &mut ResourceSet<K>) -> Result<()> {
        let mut first_error = None;
        for key in set.keys.drain() {
            if let Err(err) = self.remove_reference(key) {
                log::error!("Failed to release {key:?} from resource set: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Runs the destructor of every condemned resource and empties the graveyard.
    ///
    /// Destructors run in no particular order. Only call this once the GPU has
    /// finished all work that could reference condemned resources.
    ///
    /// Returns the number of destructors run.
    ///
    /// # Panics
    ///
    /// A panicking destructor does not stop the others: every condemned
    /// destructor runs, then the first panic is resumed.
    pub fn gc(&mut self) -> usize {
        if self.graveyard.is_empty() {
            return 0;
        }

        let graveyard = std::mem::take(&mut self.graveyard);
        let count = graveyard.len();
        let mut first_panic = None;
        for (key, destructor) in graveyard {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(destructor)) {
                log::error!("Destructor for {key:?} panicked");
                first_panic.get_or_insert(payload);
            }
        }
        log::trace!("Disposer collected {count} resources");

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        count
    }

    /// Current reference count of a live resource.
    #[must_use]
    pub fn refcount(&self, key: K) -> Option<usize> {
        self.disposables.get(&key).map(|d| d.refcount)
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self, key: K) -> bool {
        self.disposables.contains_key(&key)
    }

    #[inline]
    #[must_use]
    pub fn is_condemned(&self, key: K) -> bool {
        self.graveyard.contains_key(&key)
    }

    /// Number of resources with a non-zero reference count.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.disposables.len()
    }

    /// Number of condemned resources waiting for [`gc`](Self::gc).
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.graveyard.len()
    }

    fn missing(&self, key: K) -> VesperError {
        if self.graveyard.contains_key(&key) {
            VesperError::DisposableCondemned(format!("{key:?}"))
        } else {
            VesperError::UnknownDisposable(format!("{key:?}"))
        }
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> Default for Disposer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for Disposer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("live_count", &self.disposables.len())
            .field("pending_count", &self.graveyard.len())
            .finish()
    }
}

impl<K> Drop for Disposer<K> {
    fn drop(&mut self) {
        if !self.disposables.is_empty() || !self.graveyard.is_empty() {
            log::warn!(
                "Disposer dropped with {} live and {} condemned resources; their destructors will not run",
                self.disposables.len(),
                self.graveyard.len()
            );
        }
    }
}
