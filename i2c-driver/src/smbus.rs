//! SMBus framing on top of an `embedded-hal-async` controller

use crate::{AsyncI2cController, ErrorKind, I2cBus, I2cDriver, SlaveAddress};
use log::trace;

/// Errors of the [`Smbus`] adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SmbusError {
    /// The controller reported a failure.
    #[error("i2c controller error: {0:?}")]
    Bus(ErrorKind),
    /// The controller only speaks seven-bit addresses.
    #[error("address {0:#x} does not fit in seven bits")]
    Address(SlaveAddress),
    /// No controller is wired up for this bus number.
    #[error("no i2c bus {0}")]
    NoBus(u16),
}

/// Bus handle that speaks SMBus over an `embedded-hal-async` controller
///
/// Words are sent least significant byte first, as SMBus specifies.
pub struct Smbus<I> {
    i2c: I,
}

impl<I: AsyncI2cController> Smbus<I> {
    /// Wrap a controller.
    pub const fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the controller back.
    pub fn into_inner(self) -> I {
        self.i2c
    }
}

fn seven_bit(address: SlaveAddress) -> Result<u8, SmbusError> {
    u8::try_from(address)
        .ok()
        .filter(|a| *a <= 0x7f)
        .ok_or(SmbusError::Address(address))
}

fn bus_error<E: crate::Error>(e: E) -> SmbusError {
    SmbusError::Bus(e.kind())
}

impl<I: AsyncI2cController> I2cBus for Smbus<I> {
    type Error = SmbusError;

    async fn read_byte(&mut self, address: SlaveAddress, command: u8) -> Result<u8, Self::Error> {
        let mut buf = [0];
        self.i2c
            .write_read(seven_bit(address)?, &[command], &mut buf)
            .await
            .map_err(bus_error)?;
        trace!("read byte {:#04x} from {address:#x}@{command:#04x}", buf[0]);
        Ok(buf[0])
    }

    async fn read_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
    ) -> Result<u16, Self::Error> {
        let mut buf = [0; 2];
        self.i2c
            .write_read(seven_bit(address)?, &[command], &mut buf)
            .await
            .map_err(bus_error)?;
        let word = u16::from_le_bytes(buf);
        trace!("read word {word:#06x} from {address:#x}@{command:#04x}");
        Ok(word)
    }

    async fn write_byte(
        &mut self,
        address: SlaveAddress,
        command: u8,
        byte: u8,
    ) -> Result<(), Self::Error> {
        trace!("write byte {byte:#04x} to {address:#x}@{command:#04x}");
        self.i2c
            .write(seven_bit(address)?, &[command, byte])
            .await
            .map_err(bus_error)
    }

    async fn write_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
        word: u16,
    ) -> Result<(), Self::Error> {
        trace!("write word {word:#06x} to {address:#x}@{command:#04x}");
        let [lo, hi] = word.to_le_bytes();
        self.i2c
            .write(seven_bit(address)?, &[command, lo, hi])
            .await
            .map_err(bus_error)
    }

    async fn receive_byte(&mut self, address: SlaveAddress) -> Result<u8, Self::Error> {
        let mut buf = [0];
        self.i2c
            .read(seven_bit(address)?, &mut buf)
            .await
            .map_err(bus_error)?;
        trace!("received {:#04x} from {address:#x}", buf[0]);
        Ok(buf[0])
    }

    async fn send_byte(&mut self, address: SlaveAddress, byte: u8) -> Result<(), Self::Error> {
        trace!("send {byte:#04x} to {address:#x}");
        self.i2c
            .write(seven_bit(address)?, &[byte])
            .await
            .map_err(bus_error)
    }

    // embedded-hal transfers are all-or-nothing, so a successful transfer is a full one.
    async fn i2c_read(
        &mut self,
        address: SlaveAddress,
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.i2c
            .read(seven_bit(address)?, buffer)
            .await
            .map_err(bus_error)?;
        trace!("read {} bytes from {address:#x}", buffer.len());
        Ok(buffer.len())
    }

    async fn i2c_write(
        &mut self,
        address: SlaveAddress,
        bytes: &[u8],
    ) -> Result<usize, Self::Error> {
        trace!("write {} bytes to {address:#x}", bytes.len());
        self.i2c
            .write(seven_bit(address)?, bytes)
            .await
            .map_err(bus_error)?;
        Ok(bytes.len())
    }

    async fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Driver that obtains a controller per bus number from a closure
///
/// ```rust,ignore
/// let driver = FnDriver::new(|bus: u16| match bus {
///     1 => Ok(board.i2c1.clone()),
///     n => Err(SmbusError::NoBus(n)),
/// });
/// ```
pub struct FnDriver<F> {
    open: F,
}

impl<F> FnDriver<F> {
    /// Create a driver from a bus-number-to-controller function.
    pub const fn new(open: F) -> Self {
        Self { open }
    }
}

impl<F, I> I2cDriver for FnDriver<F>
where
    F: Fn(u16) -> Result<I, SmbusError>,
    I: AsyncI2cController,
{
    type Bus = Smbus<I>;
    type Error = SmbusError;

    async fn open(&self, bus_number: u16) -> Result<Self::Bus, Self::Error> {
        (self.open)(bus_number).map(Smbus::new)
    }
}
