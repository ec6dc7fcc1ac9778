//! Refreshing a register store from a transport

use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::Error as BackoffError;
use rangeset::RangeSet;

use super::transport::{TransportError, WordTransport};
use crate::constants::{defaults, envvars};
use crate::helpers::backoff_retry;
use crate::registers::{DeviceFamily, ReadFunction, ReadGroup, RegisterStore, Snapshot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Longest coalesced read, in words
    pub max_read_words: u32,
    pub retry_initial_interval: Duration,
    /// Give up retrying a transaction after this long
    pub retry_max_elapsed: Duration,
    /// Age after which a sample is refreshed
    pub sample_max_age: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            max_read_words: defaults::MAX_READ_WORDS,
            retry_initial_interval: defaults::RETRY_INITIAL_INTERVAL,
            retry_max_elapsed: defaults::RETRY_MAX_ELAPSED,
            sample_max_age: defaults::SAMPLE_MAX_AGE,
        }
    }
}

fn env_value<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring unparsable {}='{}'", key, raw);
            None
        }
    }
}

impl ReaderConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = ReaderConfig::default();
        if let Some(words) = env_value::<i64>(envvars::MAX_READ_WORDS) {
            config.set_max_read_words(words);
        }
        if let Some(ms) = env_value::<u64>(envvars::RETRY_TIMEOUT_MS) {
            config.retry_max_elapsed = Duration::from_millis(ms);
        }
        if let Some(ms) = env_value::<u64>(envvars::SAMPLE_MAX_AGE_MS) {
            config.sample_max_age = Duration::from_millis(ms);
        }
        config
    }

    /// Set the maximum read length; values below 1 are ignored
    pub fn set_max_read_words(&mut self, words: i64) {
        match u32::try_from(words) {
            Ok(w) if w > 0 => self.max_read_words = w,
            _ => log::warn!(
                "Ignoring max read words {}, keeping {}",
                words,
                self.max_read_words
            ),
        }
    }
}

/// Totals of one refresh
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub transactions: usize,
    pub words: usize,
}

/// The read transactions for a set of addresses, per function
pub fn plan_reads(
    sets: &BTreeMap<ReadFunction, RangeSet>,
    max_read_words: u32,
) -> BTreeMap<ReadFunction, RangeSet> {
    sets.iter()
        .filter(|(_, set)| !set.is_empty())
        .map(|(function, set)| (*function, set.coalesce(max_read_words)))
        .collect()
}

fn classify(err: TransportError) -> BackoffError<TransportError> {
    if err.is_transient() {
        BackoffError::transient(err)
    } else {
        BackoffError::permanent(err)
    }
}

/// Read every address in `sets` and save the words to `store`.
///
/// All transactions are completed before the store is touched, and the words
/// are then saved in one update round. If any transaction fails for good the
/// store is left unchanged.
pub fn refresh<T>(
    store: &RegisterStore,
    transport: &mut T,
    sets: &BTreeMap<ReadFunction, RangeSet>,
    config: &ReaderConfig,
) -> Result<ReadSummary, TransportError>
where
    T: WordTransport + ?Sized,
{
    let mut summary = ReadSummary::default();
    let mut batch: Vec<(u32, Vec<u16>)> = Vec::new();

    for (function, set) in plan_reads(sets, config.max_read_words) {
        for range in set.iter() {
            let address = range.first();
            let count = usize::try_from(range.len()).unwrap_or(usize::MAX);
            let words = backoff_retry(
                config.retry_initial_interval,
                config.retry_max_elapsed,
                || {
                    let words = transport
                        .read_words(function, address, count)
                        .map_err(classify)?;
                    if words.len() != count {
                        return Err(BackoffError::transient(TransportError::ShortRead {
                            address,
                            expected: count,
                            actual: words.len(),
                        }));
                    }
                    Ok(words)
                },
            )?;
            log::debug!(
                "Read {} {} words from {} ({})",
                count,
                function,
                address,
                range
            );
            summary.transactions += 1;
            summary.words += words.len();
            batch.push((address, words));
        }
    }

    store.update(|h| {
        for (address, words) in &batch {
            h.save_words(*address, words);
        }
        !batch.is_empty()
    });
    Ok(summary)
}

/// Polls one device, reading configuration data only when needed
pub struct DevicePoller<F: DeviceFamily> {
    family: F,
    store: Arc<RegisterStore>,
    config: ReaderConfig,
    config_loaded: AtomicBool,
}

impl<F: DeviceFamily> DevicePoller<F> {
    pub fn new(family: F, config: ReaderConfig) -> Self {
        DevicePoller::with_store(family, config, Arc::new(RegisterStore::new()))
    }

    pub fn with_store(family: F, config: ReaderConfig, store: Arc<RegisterStore>) -> Self {
        DevicePoller {
            family,
            store,
            config,
            config_loaded: AtomicBool::new(false),
        }
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    pub fn store(&self) -> Arc<RegisterStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The address sets the next poll will read
    pub fn next_read_sets(&self) -> BTreeMap<ReadFunction, RangeSet> {
        let mut sets = self.family.address_sets(Some(ReadGroup::Runtime));
        if !self.config_loaded.load(Ordering::Acquire) {
            for (function, set) in self.family.address_sets(Some(ReadGroup::Config)) {
                sets.entry(function).or_default().extend_from(&set);
            }
        }
        sets
    }

    /// Refresh the store; the first successful poll also reads configuration data
    pub fn poll<T>(&self, transport: &mut T) -> Result<ReadSummary, TransportError>
    where
        T: WordTransport + ?Sized,
    {
        let with_config = !self.config_loaded.load(Ordering::Acquire);
        let sets = self.next_read_sets();
        match refresh(&self.store, transport, &sets, &self.config) {
            Ok(summary) => {
                if with_config {
                    self.config_loaded.store(true, Ordering::Release);
                }
                log::info!(
                    "Refreshed {}{}: {} transactions, {} words",
                    self.family.name(),
                    if with_config { " (with config)" } else { "" },
                    summary.transactions,
                    summary.words
                );
                Ok(summary)
            }
            Err(e) => {
                log::error!("Refresh of {} abandoned: {}", self.family.name(), e);
                Err(e)
            }
        }
    }

    /// A snapshot no older than `max_age`, polling first if the store is stale
    pub fn sample<T>(&self, transport: &mut T, max_age: Duration) -> Result<Snapshot, TransportError>
    where
        T: WordTransport + ?Sized,
    {
        if self.store.is_expired(max_age) {
            self.poll(transport)?;
        }
        Ok(self.store.snapshot())
    }

    /// Mark the data stale; the next poll reads configuration data again
    pub fn invalidate(&self) {
        self.store.expire();
        self.config_loaded.store(false, Ordering::Release);
    }
}
