//! Register data store
//!
//! [`RegisterStore`] caches the raw words read from one device. Writers go
//! through [`RegisterStore::perform_update`], which hands a write-only
//! [`StoreHandle`] to a closure and commits everything it saved in one step.
//! Readers take a [`Snapshot`], an independent copy that needs no locking.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use parking_lot::Mutex;

use crate::helpers::now_epoch_ms;

#[derive(Debug, Default)]
struct StoreState {
    words: BTreeMap<u32, u16>,
    /// Epoch milliseconds of the last changed update, 0 when never updated or expired
    timestamp: i64,
}

fn expired(timestamp: i64, max_age: Duration) -> bool {
    let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    timestamp == 0 || now_epoch_ms().saturating_sub(timestamp) > max_age_ms
}

/// Thread safe cache of device words
#[derive(Debug, Default)]
pub struct RegisterStore {
    state: Mutex<StoreState>,
}

impl RegisterStore {
    pub fn new() -> Self {
        RegisterStore::default()
    }

    /// Run one update round.
    ///
    /// The action saves words through the handle and returns whether anything
    /// changed. Saved words are committed only if the action returns `Ok`;
    /// on `Err` the store is left exactly as it was. The timestamp moves to the
    /// current time only when the action returns `Ok(true)`, and never moves
    /// backwards.
    pub fn perform_update<F, E>(&self, action: F) -> Result<bool, E>
    where
        F: FnOnce(&mut StoreHandle) -> Result<bool, E>,
    {
        let mut handle = StoreHandle::default();
        let changed = action(&mut handle)?;

        let mut state = self.state.lock();
        state.words.extend(handle.staged);
        if changed {
            state.timestamp = state.timestamp.max(now_epoch_ms());
        }
        Ok(changed)
    }

    /// [`RegisterStore::perform_update`] for actions that cannot fail
    pub fn update<F>(&self, action: F) -> bool
    where
        F: FnOnce(&mut StoreHandle) -> bool,
    {
        match self.perform_update(|h| Ok::<_, Infallible>(action(h))) {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }

    /// Copy the current words and timestamp
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            words: state.words.clone(),
            timestamp: state.timestamp,
        }
    }

    /// Mark the data as stale without discarding any words
    pub fn expire(&self) {
        self.state.lock().timestamp = 0;
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        expired(self.timestamp(), max_age)
    }

    pub fn timestamp(&self) -> i64 {
        self.state.lock().timestamp
    }

    pub fn get(&self, address: u32) -> Option<u16> {
        self.state.lock().words.get(&address).copied()
    }

    pub fn get_run(&self, address: u32, count: usize) -> Option<Vec<u16>> {
        run(&self.state.lock().words, address, count)
    }
}

fn run(words: &BTreeMap<u32, u16>, address: u32, count: usize) -> Option<Vec<u16>> {
    let last = address.checked_add(u32::try_from(count).ok()?.checked_sub(1)?)?;
    let values: Vec<u16> = words.range(address..=last).map(|(_, w)| *w).collect();
    if values.len() == count {
        Some(values)
    } else {
        None
    }
}

/// Write-only view handed to update actions
#[derive(Debug, Default)]
pub struct StoreHandle {
    staged: BTreeMap<u32, u16>,
}

impl StoreHandle {
    pub fn save_word(&mut self, address: u32, value: u16) {
        self.staged.insert(address, value);
    }

    /// Save a contiguous run starting at `address`; words past the end of the
    /// address space are dropped
    pub fn save_words(&mut self, address: u32, values: &[u16]) {
        for (addr, value) in (address..=u32::MAX).zip(values) {
            self.staged.insert(addr, *value);
        }
    }

    pub fn save_word_map<I>(&mut self, words: I)
    where
        I: IntoIterator<Item = (u32, u16)>,
    {
        self.staged.extend(words);
    }

    /// Number of distinct addresses saved so far in this round
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

/// Independent point-in-time copy of a store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    words: BTreeMap<u32, u16>,
    timestamp: i64,
}

impl Snapshot {
    pub fn new(words: BTreeMap<u32, u16>, timestamp: i64) -> Self {
        Snapshot { words, timestamp }
    }

    /// The word at `address`, or `None` if it was never read
    pub fn get(&self, address: u32) -> Option<u16> {
        self.words.get(&address).copied()
    }

    /// `count` words starting at `address`, or `None` if any of them is missing
    pub fn get_run(&self, address: u32, count: usize) -> Option<Vec<u16>> {
        run(&self.words, address, count)
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        expired(self.timestamp, max_age)
    }

    pub fn words(&self) -> &BTreeMap<u32, u16> {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
