//! In-memory transport
//!
//! [`StaticWordMap`] serves reads from a fixed address map. It stands in for a
//! device when replaying register dumps and in tests, and records every read
//! transaction so read plans can be checked.

use std::collections::{BTreeMap, VecDeque};

use super::transport::{TransportError, WordTransport, WriteFunction};
use crate::registers::ReadFunction;

/// One recorded read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTransaction {
    pub function: ReadFunction,
    pub address: u32,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct StaticWordMap {
    spaces: BTreeMap<ReadFunction, BTreeMap<u32, u16>>,
    transactions: Vec<ReadTransaction>,
    failures: VecDeque<TransportError>,
    /// Addresses that answer every read with a device exception code
    exceptions: BTreeMap<(ReadFunction, u32), u8>,
}

impl StaticWordMap {
    pub fn new() -> Self {
        StaticWordMap::default()
    }

    /// A map with `words` in one address space
    pub fn with_words(function: ReadFunction, words: BTreeMap<u32, u16>) -> Self {
        let mut map = StaticWordMap::new();
        map.spaces.insert(function, words);
        map
    }

    pub fn set_words(&mut self, function: ReadFunction, address: u32, values: &[u16]) {
        let space = self.spaces.entry(function).or_default();
        for (addr, value) in (address..=u32::MAX).zip(values) {
            space.insert(addr, *value);
        }
    }

    pub fn word(&self, function: ReadFunction, address: u32) -> Option<u16> {
        self.spaces.get(&function)?.get(&address).copied()
    }

    /// Fail the next read with `err`; queued failures are used in order
    pub fn fail_next(&mut self, err: TransportError) {
        self.failures.push_back(err);
    }

    /// Answer every read covering `address` with exception `code`
    pub fn fail_address(&mut self, function: ReadFunction, address: u32, code: u8) {
        self.exceptions.insert((function, address), code);
    }

    pub fn transactions(&self) -> &[ReadTransaction] {
        &self.transactions
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }
}

impl WordTransport for StaticWordMap {
    /// Unset addresses read as 0
    fn read_words(
        &mut self,
        function: ReadFunction,
        address: u32,
        count: usize,
    ) -> Result<Vec<u16>, TransportError> {
        self.transactions.push(ReadTransaction {
            function,
            address,
            count,
        });
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        let last = address.saturating_add(u32::try_from(count).unwrap_or(u32::MAX).saturating_sub(1));
        if let Some(((_, addr), code)) = self
            .exceptions
            .range((function, address)..=(function, last))
            .next()
        {
            return Err(TransportError::Exception {
                function: function.code(),
                address: *addr,
                code: *code,
            });
        }
        let space = self.spaces.get(&function);
        Ok((address..=u32::MAX)
            .take(count)
            .map(|a| space.and_then(|s| s.get(&a)).copied().unwrap_or(0))
            .collect())
    }

    fn write_words(
        &mut self,
        function: WriteFunction,
        address: u32,
        values: &[u16],
    ) -> Result<(), TransportError> {
        self.set_words(function.read_function(), address, values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_fill_holes_with_zero() {
        let mut map = StaticWordMap::new();
        map.set_words(ReadFunction::InputRegister, 10, &[1, 2]);
        let words = map.read_words(ReadFunction::InputRegister, 9, 4).unwrap();
        assert_eq!(words, vec![0, 1, 2, 0]);
        // other spaces are separate
        let words = map.read_words(ReadFunction::HoldingRegister, 10, 2).unwrap();
        assert_eq!(words, vec![0, 0]);
        assert_eq!(map.transactions().len(), 2);
        assert_eq!(
            map.transactions()[0],
            ReadTransaction {
                function: ReadFunction::InputRegister,
                address: 9,
                count: 4
            }
        );
    }

    #[test]
    fn test_writes_update_map() {
        let mut map = StaticWordMap::new();
        map.write_words(WriteFunction::HoldingRegisters, 3, &[7, 8]).unwrap();
        assert_eq!(map.word(ReadFunction::HoldingRegister, 4), Some(8));
        assert_eq!(map.word(ReadFunction::InputRegister, 4), None);
    }

    #[test]
    fn test_injected_failures_are_used_once() {
        let mut map = StaticWordMap::new();
        map.fail_next(TransportError::Timeout);
        assert!(matches!(
            map.read_words(ReadFunction::Coil, 0, 1),
            Err(TransportError::Timeout)
        ));
        assert_eq!(map.read_words(ReadFunction::Coil, 0, 1).unwrap(), vec![0]);
        assert_eq!(map.transactions().len(), 2);
    }

    #[test]
    fn test_exception_addresses() {
        let mut map = StaticWordMap::new();
        map.fail_address(ReadFunction::InputRegister, 12, 2);
        assert!(map.read_words(ReadFunction::InputRegister, 0, 12).is_ok());
        assert!(map.read_words(ReadFunction::HoldingRegister, 10, 4).is_ok());
        let err = map.read_words(ReadFunction::InputRegister, 10, 4).unwrap_err();
        assert_eq!(err.to_string(), "Device exception 2 for function 4 at address 12");
    }
}
