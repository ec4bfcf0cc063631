//! Mock implementations for testing
//!
//! This module provides a register-file mock of [`RegisterBus`] and a
//! recording `DelayNs`, for use in unit and integration tests of device
//! drivers.

#![cfg(any(test, feature = "std"))]

use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::peripheral::{Opcode, RegisterBus};

/// One recorded bus transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusOp {
    /// Transfer direction.
    pub opcode: Opcode,
    /// Start address.
    pub address: u16,
    /// Bytes written, or bytes returned for a read.
    pub data: Vec<u8>,
}

/// Error injected by [`MockRegisterBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    /// A transfer touched an address marked with [`MockRegisterBus::fail_on`].
    Injected {
        /// Address of the failed transfer.
        address: u16,
    },
}

/// Mock register bus
///
/// Backed by a sparse register file (unset registers read as zero). Writes
/// update the file, so read-modify-write sequences behave as on hardware.
/// Status registers that change while polled can be scripted with
/// [`script`](Self::script): each read pops one value and the last value
/// sticks.
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    regs: BTreeMap<u16, u8>,
    scripts: BTreeMap<u16, VecDeque<u8>>,
    log: Vec<BusOp>,
    fail_address: Option<u16>,
}

impl MockRegisterBus {
    /// Create an empty mock bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a register value
    pub fn set(&mut self, address: u16, value: u8) -> &mut Self {
        self.regs.insert(address, value);
        self
    }

    /// Current register file value
    pub fn get(&self, address: u16) -> u8 {
        self.regs.get(&address).copied().unwrap_or(0)
    }

    /// Queue successive read values for a polled register
    pub fn script(&mut self, address: u16, values: &[u8]) -> &mut Self {
        self.scripts
            .entry(address)
            .or_default()
            .extend(values.iter().copied());
        self
    }

    /// Fail every transfer that touches `address`
    pub fn fail_on(&mut self, address: u16) -> &mut Self {
        self.fail_address = Some(address);
        self
    }

    /// All transactions so far, in order
    pub fn log(&self) -> &[BusOp] {
        &self.log
    }

    /// Forget recorded transactions (register contents are kept)
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Every written byte as `(address, value)`, expanding auto-increment
    /// bursts into consecutive addresses
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.log
            .iter()
            .filter(|op| op.opcode == Opcode::Write)
            .flat_map(|op| {
                op.data
                    .iter()
                    .zip(op.address..)
                    .map(|(value, address)| (address, *value))
            })
            .collect()
    }

    /// Values written to one register, in order
    pub fn writes_to(&self, address: u16) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, v)| v)
            .collect()
    }

    /// Number of read transactions that started at `address`
    pub fn reads_of(&self, address: u16) -> usize {
        self.log
            .iter()
            .filter(|op| op.opcode == Opcode::Read && op.address == address)
            .count()
    }

    fn read_one(&mut self, address: u16) -> u8 {
        if let Some(queue) = self.scripts.get_mut(&address) {
            match queue.len() {
                0 => {}
                1 => return queue.front().copied().unwrap_or(0),
                _ => return queue.pop_front().unwrap_or(0),
            }
        }
        self.get(address)
    }
}

impl RegisterBus for MockRegisterBus {
    type Error = MockBusError;

    fn transact(
        &mut self,
        opcode: Opcode,
        address: u16,
        payload: &mut [u8],
    ) -> Result<(), Self::Error> {
        let span = address..address.saturating_add(u16::try_from(payload.len()).unwrap_or(u16::MAX));
        if let Some(bad) = self.fail_address {
            if span.contains(&bad) {
                return Err(MockBusError::Injected { address: bad });
            }
        }

        match opcode {
            Opcode::Read => {
                for (slot, addr) in payload.iter_mut().zip(span) {
                    *slot = self.read_one(addr);
                }
            }
            Opcode::Write => {
                for (value, addr) in payload.iter().zip(span) {
                    self.regs.insert(addr, *value);
                }
            }
        }
        self.log.push(BusOp {
            opcode,
            address,
            data: payload.to_vec(),
        });
        Ok(())
    }
}

/// Mock delay that records how long the driver asked to wait
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MockDelay {
    total_ns: u64,
    calls: u32,
}

impl MockDelay {
    /// Create a mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in milliseconds (rounded down)
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    /// Number of delay calls
    pub fn calls(&self) -> u32 {
        self.calls
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns = self.total_ns.saturating_add(u64::from(ns));
        self.calls = self.calls.saturating_add(1);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns = self
            .total_ns
            .saturating_add(u64::from(ms).saturating_mul(1_000_000));
        self.calls = self.calls.saturating_add(1);
    }
}
