#![warn(missing_docs)]

//! This crate provides an in-memory [`I2cDriver`] that can be run locally.
//!
//! Buses and devices are created up front, faults can be injected per device and
//! operation, and the driver keeps count of handles that have not been released yet.
//!
//! # Example
//! ```rust
//! use i2c_driver::{I2cBus, I2cDriver};
//! use simulator::{SimDevice, SimDriver};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let driver = SimDriver::new();
//! driver
//!     .attach(1, 0x40, SimDevice::new().with_register(0x10, 0xab))
//!     .await;
//!
//! let mut bus = driver.open(1).await.unwrap();
//! assert_eq!(bus.read_byte(0x40, 0x10).await.unwrap(), 0xab);
//! assert_eq!(driver.open_handles(), 1);
//!
//! bus.close().await.unwrap();
//! assert_eq!(driver.open_handles(), 0);
//! # }
//! ```

use i2c_driver::{I2cDriver, SlaveAddress};
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub mod bus;
pub mod device;

pub use bus::SimBus;
pub use device::SimDevice;

/// Bus operations that can be made to fail with [`SimDriver::fail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimOp {
    /// [`i2c_driver::I2cBus::read_byte`]
    ReadByte,
    /// [`i2c_driver::I2cBus::read_word`]
    ReadWord,
    /// [`i2c_driver::I2cBus::write_byte`]
    WriteByte,
    /// [`i2c_driver::I2cBus::write_word`]
    WriteWord,
    /// [`i2c_driver::I2cBus::receive_byte`]
    ReceiveByte,
    /// [`i2c_driver::I2cBus::send_byte`]
    SendByte,
    /// [`i2c_driver::I2cBus::i2c_read`]
    Read,
    /// [`i2c_driver::I2cBus::i2c_write`]
    Write,
}

/// Errors reported by the simulated driver
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// The bus was never added to the driver.
    #[error("no such i2c bus: {0}")]
    NoSuchBus(u16),
    /// Opening the bus was made to fail.
    #[error("failed to open i2c bus {0}")]
    OpenFailed(u16),
    /// Closing the bus was made to fail.
    #[error("failed to close i2c bus {0}")]
    CloseFailed(u16),
    /// Nothing acknowledged the address.
    #[error("no device at address {address:#x} on i2c bus {bus}")]
    NoDevice {
        /// Bus the transfer was sent on
        bus: u16,
        /// Address nobody answered to
        address: SlaveAddress,
    },
    /// The operation was made to fail.
    #[error("{op:?} failed at address {address:#x}")]
    Injected {
        /// Failed operation
        op: SimOp,
        /// Address of the device the operation was sent to
        address: SlaveAddress,
    },
}

#[derive(Default)]
struct SimState {
    buses: BTreeMap<u16, SimBusState>,
}

#[derive(Default)]
struct SimBusState {
    devices: BTreeMap<SlaveAddress, SimDevice>,
    fail_open: bool,
    fail_close: bool,
}

/// Simulated I2C driver
///
/// Cloning gives another handle to the same buses and devices.
#[derive(Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SimState>>,
    open_handles: Arc<AtomicUsize>,
}

impl SimDriver {
    /// Create a driver without any buses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty bus. Adding an existing bus keeps its devices.
    pub async fn add_bus(&self, bus: u16) {
        self.state.lock().await.buses.entry(bus).or_default();
    }

    /// Put a device on a bus, adding the bus if needed.
    ///
    /// A device already at that address is replaced.
    pub async fn attach(&self, bus: u16, address: SlaveAddress, device: SimDevice) {
        debug!("attaching device at {address:#x} to i2c-{bus}");
        self.state
            .lock()
            .await
            .buses
            .entry(bus)
            .or_default()
            .devices
            .insert(address, device);
    }

    /// Make every future open of `bus` fail.
    pub async fn fail_open(&self, bus: u16) {
        self.state.lock().await.buses.entry(bus).or_default().fail_open = true;
    }

    /// Make every future close of a handle to `bus` fail. The handle is released anyway.
    pub async fn fail_close(&self, bus: u16) {
        self.state.lock().await.buses.entry(bus).or_default().fail_close = true;
    }

    /// Make `op` fail for the device at `address`. Does nothing if there is no such device.
    pub async fn fail(&self, bus: u16, address: SlaveAddress, op: SimOp) {
        self.update(bus, address, |d| d.fail(op)).await;
    }

    /// Let raw reads and writes to the device at `address` move at most `limit` bytes.
    pub async fn limit_transfers(&self, bus: u16, address: SlaveAddress, limit: usize) {
        self.update(bus, address, |d| d.limit_transfers(limit)).await;
    }

    /// Snapshot of the device at `address`.
    pub async fn device(&self, bus: u16, address: SlaveAddress) -> Option<SimDevice> {
        let state = self.state.lock().await;
        state.buses.get(&bus)?.devices.get(&address).cloned()
    }

    /// Number of bus handles that were opened and not yet released.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    async fn update(&self, bus: u16, address: SlaveAddress, f: impl FnOnce(&mut SimDevice)) {
        let mut state = self.state.lock().await;
        if let Some(device) = state
            .buses
            .get_mut(&bus)
            .and_then(|b| b.devices.get_mut(&address))
        {
            f(device);
        }
    }
}

impl I2cDriver for SimDriver {
    type Bus = SimBus;
    type Error = SimError;

    async fn open(&self, bus_number: u16) -> Result<Self::Bus, Self::Error> {
        let state = self.state.lock().await;
        let bus = state
            .buses
            .get(&bus_number)
            .ok_or(SimError::NoSuchBus(bus_number))?;
        if bus.fail_open {
            return Err(SimError::OpenFailed(bus_number));
        }

        debug!("opened i2c-{bus_number}");
        Ok(SimBus::new(
            bus_number,
            Arc::clone(&self.state),
            Arc::clone(&self.open_handles),
        ))
    }
}
