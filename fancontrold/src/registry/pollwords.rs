//! Pollword notification
//!
//! A pollword is a word a client watches to learn about registry events
//! without asking. Each registered word names up to three bits: one set when
//! the controller is dying, one when fans come or go, and one when a fan
//! reports an error. Bits are only ever set here; the client clears them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fancontroller_core::{FanControllerError, Result};
use tracing::debug;

/// Highest bit number a selector may name
const MAX_BIT: u8 = 31;

/// Storage behind pollword addresses
pub trait PollwordMemory: Send {
    /// OR `mask` into the word at `address`
    fn set_bits(&mut self, address: u32, mask: u32);
}

/// Registry event signalled through pollwords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollwordEvent {
    Dying,
    Registrations,
    Errors,
}

/// One registered pollword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollwordEntry {
    pub address: u32,
    pub dying: Option<u8>,
    pub registrations: Option<u8>,
    pub errors: Option<u8>,
}

impl PollwordEntry {
    fn bit_for(&self, event: PollwordEvent) -> Option<u8> {
        match event {
            PollwordEvent::Dying => self.dying,
            PollwordEvent::Registrations => self.registrations,
            PollwordEvent::Errors => self.errors,
        }
    }
}

/// The set of registered pollwords
pub struct PollwordSet {
    entries: BTreeMap<u32, PollwordEntry>,
    memory: Box<dyn PollwordMemory>,
}

impl PollwordSet {
    pub fn new(memory: Box<dyn PollwordMemory>) -> Self {
        Self {
            entries: BTreeMap::new(),
            memory,
        }
    }

    /// Register a pollword, replacing any entry at the same address
    pub fn add(
        &mut self,
        address: u32,
        dying: Option<u8>,
        registrations: Option<u8>,
        errors: Option<u8>,
    ) -> Result<()> {
        for (name, bit) in [
            ("dying", dying),
            ("registrations", registrations),
            ("errors", errors),
        ] {
            if let Some(bit) = bit.filter(|&b| b > MAX_BIT) {
                return Err(FanControllerError::InvalidInput(format!(
                    "Pollword {} bit {} out of range (0-{})",
                    name, bit, MAX_BIT
                )));
            }
        }

        let entry = PollwordEntry {
            address,
            dying,
            registrations,
            errors,
        };
        if self.entries.insert(address, entry).is_some() {
            debug!("Replaced pollword &{:08x}", address);
        } else {
            debug!("Added pollword &{:08x}", address);
        }
        Ok(())
    }

    /// Remove a pollword; unknown addresses are ignored
    pub fn remove(&mut self, address: u32) -> bool {
        let removed = self.entries.remove(&address).is_some();
        if removed {
            debug!("Removed pollword &{:08x}", address);
        }
        removed
    }

    #[cfg(test)]
    pub fn get(&self, address: u32) -> Option<&PollwordEntry> {
        self.entries.get(&address)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set the bit for `event` in every pollword that asked for it
    pub fn notify(&mut self, event: PollwordEvent) {
        for entry in self.entries.values() {
            if let Some(bit) = entry.bit_for(event) {
                self.memory.set_bits(entry.address, 1 << bit);
            }
        }
        debug!("Notified {} pollword(s) of {:?}", self.entries.len(), event);
    }

    pub fn notify_dying(&mut self) {
        self.notify(PollwordEvent::Dying);
    }

    pub fn notify_registrations(&mut self) {
        self.notify(PollwordEvent::Registrations);
    }

    pub fn notify_errors(&mut self) {
        self.notify(PollwordEvent::Errors);
    }

    /// Forget every pollword
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// In-process pollword storage shared between the registry and readers
#[derive(Debug, Clone, Default)]
pub struct PollwordTable {
    words: Arc<Mutex<HashMap<u32, u32>>>,
}

impl PollwordTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn words(&self) -> MutexGuard<'_, HashMap<u32, u32>> {
        self.words.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current word at `address`
    pub fn peek(&self, address: u32) -> u32 {
        self.words().get(&address).copied().unwrap_or(0)
    }

    /// Read the word at `address` and clear it
    pub fn take(&self, address: u32) -> u32 {
        self.words().remove(&address).unwrap_or(0)
    }
}

impl PollwordMemory for PollwordTable {
    fn set_bits(&mut self, address: u32, mask: u32) {
        *self.words().entry(address).or_insert(0) |= mask;
    }
}
