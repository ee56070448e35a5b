use crate::{Operation, OperationError};
use i2c_driver::{I2cBus, SlaveAddress};
use log::debug;

/// An opened bus bound to one slave address
///
/// Created by [`crate::I2cPort::open`]. The bus is released by [`I2cSlaveDevice::close`]
/// or, without reporting errors, when the device is dropped.
pub struct I2cSlaveDevice<B> {
    bus: B,
    port_number: u16,
    slave_address: SlaveAddress,
}

impl<B: I2cBus> I2cSlaveDevice<B> {
    pub(crate) const fn new(bus: B, port_number: u16, slave_address: SlaveAddress) -> Self {
        Self {
            bus,
            port_number,
            slave_address,
        }
    }

    pub const fn slave_address(&self) -> SlaveAddress {
        self.slave_address
    }

    /// Number of the port this device was opened on.
    pub const fn port_number(&self) -> u16 {
        self.port_number
    }

    /// Read the byte register `register`.
    pub async fn read8(&mut self, register: u8) -> Result<u8, OperationError> {
        self.bus
            .read_byte(self.slave_address, register)
            .await
            .map_err(|e| OperationError::new(Operation::Read8, e))
    }

    /// Read the word register `register`.
    pub async fn read16(&mut self, register: u8) -> Result<u16, OperationError> {
        self.bus
            .read_word(self.slave_address, register)
            .await
            .map_err(|e| OperationError::new(Operation::Read16, e))
    }

    /// Write the byte register `register`, returning the value written.
    pub async fn write8(&mut self, register: u8, value: u8) -> Result<u8, OperationError> {
        self.bus
            .write_byte(self.slave_address, register, value)
            .await
            .map_err(|e| OperationError::new(Operation::Write8, e))?;
        Ok(value)
    }

    /// Write the word register `register`, returning the value written.
    pub async fn write16(&mut self, register: u8, value: u16) -> Result<u16, OperationError> {
        self.bus
            .write_word(self.slave_address, register, value)
            .await
            .map_err(|e| OperationError::new(Operation::Write16, e))?;
        Ok(value)
    }

    /// Read one byte without addressing a register.
    pub async fn read_byte(&mut self) -> Result<u8, OperationError> {
        self.bus
            .receive_byte(self.slave_address)
            .await
            .map_err(|e| OperationError::new(Operation::ReadByte, e))
    }

    /// Read up to `length` bytes in a single transfer.
    ///
    /// A single I2C message carries at most `u16::MAX` bytes. The result holds the bytes the
    /// driver actually transferred, which can be fewer.
    pub async fn read_bytes(&mut self, length: u16) -> Result<Vec<u8>, OperationError> {
        let mut buffer = vec![0; usize::from(length)];
        let read = self
            .bus
            .i2c_read(self.slave_address, &mut buffer)
            .await
            .map_err(|e| OperationError::new(Operation::ReadBytes, e))?;
        buffer.truncate(read);
        Ok(buffer)
    }

    /// Write one byte without addressing a register, returning the byte written.
    pub async fn write_byte(&mut self, byte: u8) -> Result<u8, OperationError> {
        self.bus
            .send_byte(self.slave_address, byte)
            .await
            .map_err(|e| OperationError::new(Operation::WriteByte, e))?;
        Ok(byte)
    }

    /// Write `bytes` in a single transfer.
    ///
    /// Returns the leading part of `bytes` the driver actually transferred.
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> Result<Vec<u8>, OperationError> {
        let written = self
            .bus
            .i2c_write(self.slave_address, bytes)
            .await
            .map_err(|e| OperationError::new(Operation::WriteBytes, e))?;
        Ok(bytes[..written.min(bytes.len())].to_vec())
    }

    /// Release the bus.
    pub async fn close(self) -> Result<(), OperationError> {
        debug!(
            "i2c-{}: closing slave {:#x}",
            self.port_number, self.slave_address
        );
        self.bus
            .close()
            .await
            .map_err(|e| OperationError::new(Operation::Close, e))
    }
}
