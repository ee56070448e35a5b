//! Linux `/dev/i2c-N` backend
//!
//! The character device is blocking, so every transfer runs on tokio's blocking pool.
//! A handle holds one open file per bus and retargets it with `I2C_SLAVE` before each
//! transfer whose address differs from the last one.

use crate::{I2cBus, I2cDriver, SlaveAddress};
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::{JoinError, spawn_blocking};

/// Errors of the Linux backend
#[derive(Debug, thiserror::Error)]
pub enum LinuxError {
    /// The kernel rejected an open, ioctl or transfer.
    #[error(transparent)]
    Device(#[from] LinuxI2CError),
    /// The blocking task running the transfer did not finish.
    #[error("i2c transfer task failed: {0}")]
    Task(#[from] JoinError),
    /// A previous transfer panicked while holding the device.
    #[error("i2c device lock poisoned")]
    Poisoned,
}

/// Driver for the Linux i2c-dev interface
#[derive(Debug, Clone)]
pub struct LinuxDriver {
    dev_dir: PathBuf,
}

impl Default for LinuxDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxDriver {
    /// Open buses as `/dev/i2c-N`.
    pub fn new() -> Self {
        Self::with_dev_dir("/dev")
    }

    /// Open buses as `<dir>/i2c-N`.
    pub fn with_dev_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dir.into(),
        }
    }

    /// Device node path for a bus number.
    pub fn path(&self, bus_number: u16) -> PathBuf {
        self.dev_dir.join(format!("i2c-{bus_number}"))
    }
}

impl I2cDriver for LinuxDriver {
    type Bus = LinuxBus;
    type Error = LinuxError;

    async fn open(&self, bus_number: u16) -> Result<Self::Bus, Self::Error> {
        let path = self.path(bus_number);
        debug!("opening {}", path.display());
        let device = spawn_blocking(move || open_device(&path)).await??;

        Ok(LinuxBus {
            inner: Arc::new(Mutex::new(Targeted {
                device,
                address: 0,
            })),
        })
    }
}

fn open_device(path: &Path) -> Result<LinuxI2CDevice, LinuxI2CError> {
    LinuxI2CDevice::new(path, 0)
}

struct Targeted {
    device: LinuxI2CDevice,
    address: SlaveAddress,
}

/// An opened `/dev/i2c-N`
///
/// Dropping the last reference closes the file.
pub struct LinuxBus {
    inner: Arc<Mutex<Targeted>>,
}

impl LinuxBus {
    async fn run<T, F>(
        &self,
        op: &'static str,
        address: SlaveAddress,
        transfer: F,
    ) -> Result<T, LinuxError>
    where
        T: Send + 'static,
        F: FnOnce(&mut LinuxI2CDevice) -> Result<T, LinuxI2CError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        spawn_blocking(move || -> Result<T, LinuxError> {
            let mut targeted = inner.lock().map_err(|_| LinuxError::Poisoned)?;
            if targeted.address != address {
                trace!("retargeting to {address:#x}");
                targeted.device.set_slave_address(address)?;
                targeted.address = address;
            }
            trace!("{op} at {address:#x}");
            Ok(transfer(&mut targeted.device)?)
        })
        .await?
    }
}

impl I2cBus for LinuxBus {
    type Error = LinuxError;

    async fn read_byte(&mut self, address: SlaveAddress, command: u8) -> Result<u8, Self::Error> {
        self.run("read byte", address, move |d| d.smbus_read_byte_data(command))
            .await
    }

    async fn read_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
    ) -> Result<u16, Self::Error> {
        self.run("read word", address, move |d| d.smbus_read_word_data(command))
            .await
    }

    async fn write_byte(
        &mut self,
        address: SlaveAddress,
        command: u8,
        byte: u8,
    ) -> Result<(), Self::Error> {
        self.run("write byte", address, move |d| d.smbus_write_byte_data(command, byte))
            .await
    }

    async fn write_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
        word: u16,
    ) -> Result<(), Self::Error> {
        self.run("write word", address, move |d| d.smbus_write_word_data(command, word))
            .await
    }

    async fn receive_byte(&mut self, address: SlaveAddress) -> Result<u8, Self::Error> {
        self.run("receive byte", address, |d| d.smbus_read_byte()).await
    }

    async fn send_byte(&mut self, address: SlaveAddress, byte: u8) -> Result<(), Self::Error> {
        self.run("send byte", address, move |d| d.smbus_write_byte(byte)).await
    }

    async fn i2c_read(
        &mut self,
        address: SlaveAddress,
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let len = buffer.len();
        let data = self
            .run("read", address, move |d| {
                let mut data = vec![0; len];
                d.read(&mut data)?;
                Ok(data)
            })
            .await?;
        buffer.copy_from_slice(&data);
        Ok(len)
    }

    async fn i2c_write(
        &mut self,
        address: SlaveAddress,
        bytes: &[u8],
    ) -> Result<usize, Self::Error> {
        let data = bytes.to_vec();
        self.run("write", address, move |d| d.write(&data).map(|()| data.len()))
            .await
    }

    async fn close(self) -> Result<(), Self::Error> {
        debug!("closing i2c device");
        Ok(())
    }
}
