use crate::{I2cSlaveDevice, Operation, OperationError, RangeError, parse_uint16};
use i2c_driver::{I2cDriver, SlaveAddress};
use log::{debug, warn};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

const PORT_NAME_PREFIX: &str = "i2c-";

/// One I2C bus, named `i2c-<number>`
///
/// A port is only a number until [`I2cPort::open`] asks the driver for the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct I2cPort {
    port_number: u16,
}

impl I2cPort {
    pub const fn new(port_number: u16) -> Self {
        Self { port_number }
    }

    /// Create a port from anything that prints as a decimal number.
    ///
    /// The printed form goes through [`parse_uint16`]: `1.5` is port 1, while `-1`, `65536`
    /// or `"abc"` are rejected with a [`RangeError`].
    pub fn try_new(port_number: impl fmt::Display) -> Result<Self, RangeError> {
        parse_uint16(&port_number.to_string()).map(Self::new)
    }

    pub const fn port_number(&self) -> u16 {
        self.port_number
    }

    pub fn port_name(&self) -> String {
        self.to_string()
    }

    /// Open the bus and bind it to a slave device.
    ///
    /// The address is handed to the driver as is.
    pub async fn open<D: I2cDriver>(
        &self,
        driver: &D,
        slave_address: SlaveAddress,
    ) -> Result<I2cSlaveDevice<D::Bus>, OperationError> {
        let bus = driver
            .open(self.port_number)
            .await
            .map_err(|e| OperationError::new(Operation::Open, e))?;
        debug!("{self}: opened for slave {slave_address:#x}");

        Ok(I2cSlaveDevice::new(bus, self.port_number, slave_address))
    }

    /// Open a slave device, run `f` against it and close it again.
    ///
    /// The device is closed whether `f` succeeds or not. An error from `f` wins over an
    /// error from closing.
    pub async fn with_device<D, T>(
        &self,
        driver: &D,
        slave_address: SlaveAddress,
        f: impl AsyncFnOnce(&mut I2cSlaveDevice<D::Bus>) -> Result<T, OperationError>,
    ) -> Result<T, OperationError>
    where
        D: I2cDriver,
    {
        let mut device = self.open(driver, slave_address).await?;
        let result = f(&mut device).await;
        let closed = device.close().await;

        match (result, closed) {
            (Ok(value), closed) => closed.map(|()| value),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close)) => {
                warn!("{self}: {close} after {e}");
                Err(e)
            }
        }
    }
}

impl fmt::Display for I2cPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PORT_NAME_PREFIX}{}", self.port_number)
    }
}

/// Ports by number
///
/// Iteration is in ascending port number order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct I2cPortMap {
    ports: BTreeMap<u16, I2cPort>,
}

impl I2cPortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the port previously stored under `port_number`, if any.
    pub fn insert(&mut self, port_number: u16, port: I2cPort) -> Option<I2cPort> {
        self.ports.insert(port_number, port)
    }

    pub fn remove(&mut self, port_number: u16) -> Option<I2cPort> {
        self.ports.remove(&port_number)
    }

    pub fn get(&self, port_number: u16) -> Option<&I2cPort> {
        self.ports.get(&port_number)
    }

    /// Look a port up by its `i2c-<number>` name.
    ///
    /// Names of another shape are simply not found. A name of the right shape whose
    /// number does not fit in a `u16`, like `i2c-99999`, is a [`RangeError`].
    pub fn get_by_name(&self, port_name: &str) -> Result<Option<&I2cPort>, RangeError> {
        let Some(digits) = port_name
            .strip_prefix(PORT_NAME_PREFIX)
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        else {
            return Ok(None);
        };

        Ok(self.get(parse_uint16(digits)?))
    }

    pub fn contains(&self, port_number: u16) -> bool {
        self.ports.contains_key(&port_number)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, u16, I2cPort> {
        self.ports.iter()
    }
}

impl FromIterator<(u16, I2cPort)> for I2cPortMap {
    fn from_iter<T: IntoIterator<Item = (u16, I2cPort)>>(iter: T) -> Self {
        Self {
            ports: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a I2cPortMap {
    type Item = (&'a u16, &'a I2cPort);
    type IntoIter = btree_map::Iter<'a, u16, I2cPort>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
