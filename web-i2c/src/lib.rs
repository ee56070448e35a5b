//! Web I2C style access to I2C buses.
//!
//! [`request_i2c_access`] lists ports `i2c-0` to `i2c-31`. A port is opened against a slave
//! address, which gives an [`I2cSlaveDevice`] for register and raw byte transfers. The bus
//! work itself is done by an [`i2c_driver::I2cDriver`].
//!
//! ```rust,ignore
//! let access = web_i2c::request_i2c_access(i2c_driver::LinuxDriver::new());
//! let port = access.ports().get_by_name("i2c-1")?.unwrap();
//! let mut sensor = access.open(port, 0x48).await?;
//! let temperature = sensor.read16(0x00).await?;
//! sensor.close().await?;
//! ```

mod access;
mod device;
mod error;
mod port;
mod uint16;

pub use access::I2cAccess;
pub use device::I2cSlaveDevice;
pub use error::{Operation, OperationError, RangeError};
pub use i2c_driver::SlaveAddress;
pub use port::{I2cPort, I2cPortMap};
pub use uint16::parse_uint16;

/// Number of ports listed by [`request_i2c_access`].
pub const PORT_MAP_SIZE_MAX: u16 = 32;

/// Largest valid port number.
pub const UINT16_MAX: u16 = u16::MAX;

/// List ports `0..PORT_MAP_SIZE_MAX` on `driver`.
///
/// Nothing is opened; whether a bus exists only shows when its port is opened.
pub fn request_i2c_access<D: i2c_driver::I2cDriver>(driver: D) -> I2cAccess<D> {
    let ports = (0..PORT_MAP_SIZE_MAX)
        .map(|n| (n, I2cPort::new(n)))
        .collect();
    I2cAccess::with_ports(driver, ports)
}
