use crate::{I2cPort, I2cPortMap, I2cSlaveDevice, OperationError};
use i2c_driver::{I2cDriver, SlaveAddress};

/// Entry point to the I2C buses of a driver
pub struct I2cAccess<D> {
    driver: D,
    ports: I2cPortMap,
}

impl<D> I2cAccess<D> {
    /// Access without any ports.
    pub fn new(driver: D) -> Self {
        Self::with_ports(driver, I2cPortMap::new())
    }

    pub fn with_ports(driver: D, ports: I2cPortMap) -> Self {
        Self { driver, ports }
    }

    pub fn ports(&self) -> &I2cPortMap {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut I2cPortMap {
        &mut self.ports
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: I2cDriver> I2cAccess<D> {
    /// Open `port` through this access' driver.
    pub async fn open(
        &self,
        port: &I2cPort,
        slave_address: SlaveAddress,
    ) -> Result<I2cSlaveDevice<D::Bus>, OperationError> {
        port.open(&self.driver, slave_address).await
    }
}
