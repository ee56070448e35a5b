#![allow(async_fn_in_trait)]
#![warn(missing_docs)]

//! The seam between the Web I2C polyfill and whatever actually drives the bus.
//!
//! An [`I2cDriver`] opens a bus by number and hands out an [`I2cBus`]. The bus handle
//! exposes the SMBus and raw transfer primitives, each addressed to a slave on that bus.
//!
//! Two backends live here: [`smbus`] frames the primitives on top of any
//! `embedded-hal-async` controller, and `linux` (feature `linux`) talks to `/dev/i2c-N`.

pub use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource, SevenBitAddress};
pub use embedded_hal_async::i2c::I2c as AsyncI2cController;

#[cfg(feature = "linux")]
pub mod linux;
pub mod smbus;

#[cfg(feature = "linux")]
pub use linux::{LinuxBus, LinuxDriver, LinuxError};
pub use smbus::{FnDriver, Smbus, SmbusError};

/// Address of a slave device on a bus.
///
/// Wide enough for ten-bit addressing; backends decide which addresses they accept.
pub type SlaveAddress = u16;

/// Something that can open I2C buses by number.
pub trait I2cDriver {
    /// Handle to an opened bus.
    type Bus: I2cBus;
    /// Failure to open a bus.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the bus with the given number, e.g. `1` for `/dev/i2c-1`.
    async fn open(&self, bus_number: u16) -> Result<Self::Bus, Self::Error>;
}

/// An opened bus.
///
/// Dropping the handle releases it. [`I2cBus::close`] does the same but reports failures.
pub trait I2cBus: Sized {
    /// Failure of a single bus transaction.
    type Error: std::error::Error + Send + Sync + 'static;

    /// SMBus "read byte data": read the register `command`.
    async fn read_byte(&mut self, address: SlaveAddress, command: u8) -> Result<u8, Self::Error>;

    /// SMBus "read word data". The word is transferred least significant byte first.
    async fn read_word(&mut self, address: SlaveAddress, command: u8)
    -> Result<u16, Self::Error>;

    /// SMBus "write byte data".
    async fn write_byte(
        &mut self,
        address: SlaveAddress,
        command: u8,
        byte: u8,
    ) -> Result<(), Self::Error>;

    /// SMBus "write word data". The word is transferred least significant byte first.
    async fn write_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
        word: u16,
    ) -> Result<(), Self::Error>;

    /// SMBus "receive byte": read one byte without a register address.
    async fn receive_byte(&mut self, address: SlaveAddress) -> Result<u8, Self::Error>;

    /// SMBus "send byte": write one byte without a register address.
    async fn send_byte(&mut self, address: SlaveAddress, byte: u8) -> Result<(), Self::Error>;

    /// Plain I2C read into `buffer`.
    ///
    /// Returns how many bytes were actually read, which may be less than `buffer.len()`.
    async fn i2c_read(
        &mut self,
        address: SlaveAddress,
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error>;

    /// Plain I2C write of `bytes`.
    ///
    /// Returns how many bytes were actually written, which may be less than `bytes.len()`.
    async fn i2c_write(&mut self, address: SlaveAddress, bytes: &[u8])
    -> Result<usize, Self::Error>;

    /// Release the bus.
    async fn close(self) -> Result<(), Self::Error>;
}
