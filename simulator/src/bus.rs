//! Bus handle half of the simulator

use crate::{SimDevice, SimError, SimOp, SimState};
use i2c_driver::{I2cBus, SlaveAddress};
use log::{debug, trace};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

#[cfg(doc)]
use crate::SimDriver;

/// Handle to a simulated bus
///
/// This is created by [`SimDriver`]'s `open`. Every transfer is dispatched to the
/// [`SimDevice`] attached at the addressed slot, as if there was a real I2C bus
/// connecting the two. Dropping the handle releases it.
pub struct SimBus {
    bus: u16,
    state: Arc<Mutex<SimState>>,
    open_handles: Arc<AtomicUsize>,
}

impl SimBus {
    pub(crate) fn new(
        bus: u16,
        state: Arc<Mutex<SimState>>,
        open_handles: Arc<AtomicUsize>,
    ) -> Self {
        open_handles.fetch_add(1, Ordering::SeqCst);
        Self {
            bus,
            state,
            open_handles,
        }
    }

    /// Number of the bus this handle was opened on.
    pub fn bus_number(&self) -> u16 {
        self.bus
    }

    async fn transfer<T>(
        &self,
        address: SlaveAddress,
        op: SimOp,
        f: impl FnOnce(&mut SimDevice) -> T,
    ) -> Result<T, SimError> {
        let mut state = self.state.lock().await;
        let device = state
            .buses
            .get_mut(&self.bus)
            .and_then(|b| b.devices.get_mut(&address))
            .ok_or(SimError::NoDevice {
                bus: self.bus,
                address,
            })?;

        if device.fails(op) {
            return Err(SimError::Injected { op, address });
        }

        trace!("i2c-{}: {op:?} at {address:#x}", self.bus);
        Ok(f(device))
    }
}

impl Drop for SimBus {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl I2cBus for SimBus {
    type Error = SimError;

    async fn read_byte(&mut self, address: SlaveAddress, command: u8) -> Result<u8, Self::Error> {
        self.transfer(address, SimOp::ReadByte, |d| d.register(command))
            .await
    }

    async fn read_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
    ) -> Result<u16, Self::Error> {
        self.transfer(address, SimOp::ReadWord, |d| d.read_word(command))
            .await
    }

    async fn write_byte(
        &mut self,
        address: SlaveAddress,
        command: u8,
        byte: u8,
    ) -> Result<(), Self::Error> {
        self.transfer(address, SimOp::WriteByte, |d| d.write_byte(command, byte))
            .await
    }

    async fn write_word(
        &mut self,
        address: SlaveAddress,
        command: u8,
        word: u16,
    ) -> Result<(), Self::Error> {
        self.transfer(address, SimOp::WriteWord, |d| d.write_word(command, word))
            .await
    }

    async fn receive_byte(&mut self, address: SlaveAddress) -> Result<u8, Self::Error> {
        self.transfer(address, SimOp::ReceiveByte, SimDevice::receive)
            .await
    }

    async fn send_byte(&mut self, address: SlaveAddress, byte: u8) -> Result<(), Self::Error> {
        self.transfer(address, SimOp::SendByte, |d| d.send(byte)).await
    }

    async fn i2c_read(
        &mut self,
        address: SlaveAddress,
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error> {
        self.transfer(address, SimOp::Read, |d| d.read(buffer)).await
    }

    async fn i2c_write(
        &mut self,
        address: SlaveAddress,
        bytes: &[u8],
    ) -> Result<usize, Self::Error> {
        self.transfer(address, SimOp::Write, |d| d.write(bytes)).await
    }

    async fn close(self) -> Result<(), Self::Error> {
        let fail = self
            .state
            .lock()
            .await
            .buses
            .get(&self.bus)
            .is_some_and(|b| b.fail_close);

        debug!("closing i2c-{}", self.bus);
        if fail {
            Err(SimError::CloseFailed(self.bus))
        } else {
            Ok(())
        }
    }
}
