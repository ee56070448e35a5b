//! Simulated slave device

use crate::SimOp;
use std::cmp::min;
use std::collections::{BTreeSet, VecDeque};

/// A device with 256 byte-wide registers and a raw byte stream
///
/// Register access goes through the SMBus data operations. Raw reads consume the
/// readout queue and are padded with [`SimDevice::FILL`] once it runs dry; raw writes are
/// appended to [`SimDevice::received`].
#[derive(Debug, Clone)]
pub struct SimDevice {
    registers: [u8; 256],
    readout: VecDeque<u8>,
    received: Vec<u8>,
    failing: BTreeSet<SimOp>,
    transfer_limit: Option<usize>,
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDevice {
    /// Byte returned by raw reads once the readout queue is empty.
    pub const FILL: u8 = 0x2a;

    /// A device with all registers zeroed and nothing to read out.
    pub const fn new() -> Self {
        Self {
            registers: [0; 256],
            readout: VecDeque::new(),
            received: Vec::new(),
            failing: BTreeSet::new(),
            transfer_limit: None,
        }
    }

    /// Preset a register.
    pub fn with_register(mut self, register: u8, value: u8) -> Self {
        self.registers[usize::from(register)] = value;
        self
    }

    /// Queue bytes for raw reads.
    pub fn with_readout(mut self, bytes: impl IntoIterator<Item = u8>) -> Self {
        self.readout.extend(bytes);
        self
    }

    /// Current value of a register.
    pub fn register(&self, register: u8) -> u8 {
        self.registers[usize::from(register)]
    }

    /// Everything written to the device without a register address, in order.
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    pub(crate) fn fail(&mut self, op: SimOp) {
        self.failing.insert(op);
    }

    pub(crate) fn limit_transfers(&mut self, limit: usize) {
        self.transfer_limit = Some(limit);
    }

    pub(crate) fn fails(&self, op: SimOp) -> bool {
        self.failing.contains(&op)
    }

    pub(crate) fn read_word(&self, register: u8) -> u16 {
        let lo = self.register(register);
        let hi = self.register(register.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn write_byte(&mut self, register: u8, value: u8) {
        self.registers[usize::from(register)] = value;
    }

    pub(crate) fn write_word(&mut self, register: u8, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.write_byte(register, lo);
        self.write_byte(register.wrapping_add(1), hi);
    }

    pub(crate) fn receive(&mut self) -> u8 {
        self.readout.pop_front().unwrap_or(Self::FILL)
    }

    pub(crate) fn send(&mut self, byte: u8) {
        self.received.push(byte);
    }

    fn allowed(&self, requested: usize) -> usize {
        self.transfer_limit
            .map_or(requested, |limit| min(limit, requested))
    }

    pub(crate) fn read(&mut self, buffer: &mut [u8]) -> usize {
        let len = self.allowed(buffer.len());
        for byte in &mut buffer[..len] {
            *byte = self.receive();
        }
        len
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> usize {
        let len = self.allowed(bytes.len());
        self.received.extend_from_slice(&bytes[..len]);
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_wrap_around_the_register_file() {
        let mut device = SimDevice::new();
        device.write_word(0xff, 0x1234);
        assert_eq!(device.register(0xff), 0x34);
        assert_eq!(device.register(0x00), 0x12);
        assert_eq!(device.read_word(0xff), 0x1234);
    }

    #[test]
    fn overreading_is_filled() {
        let mut device = SimDevice::new().with_readout([1, 2]);
        let mut buf = [0; 4];
        assert_eq!(device.read(&mut buf), 4);
        assert_eq!(buf, [1, 2, SimDevice::FILL, SimDevice::FILL]);
    }

    #[test]
    fn transfers_are_limited() {
        let mut device = SimDevice::new().with_readout([1, 2, 3]);
        device.limit_transfers(2);

        let mut buf = [0; 3];
        assert_eq!(device.read(&mut buf), 2);
        assert_eq!(buf, [1, 2, 0]);

        assert_eq!(device.write(&[7, 8, 9]), 2);
        assert_eq!(device.received(), &[7, 8]);
    }
}
