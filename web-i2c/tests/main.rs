use simulator::{SimDevice, SimDriver, SimError, SimOp};
use std::error::Error as _;
use web_i2c::{I2cAccess, I2cPort, Operation, OperationError, request_i2c_access};

const ADDR: u16 = 0x40;

async fn access_with(device: SimDevice) -> I2cAccess<SimDriver> {
    let _ = env_logger::try_init();
    let driver = SimDriver::new();
    driver.attach(1, ADDR, device).await;
    request_i2c_access(driver)
}

fn cause(err: &OperationError) -> &SimError {
    err.source()
        .and_then(|e| e.downcast_ref::<SimError>())
        .expect("driver error is kept as the source")
}

#[tokio::test]
async fn register_access() {
    let access = access_with(SimDevice::new().with_register(0x05, 0x99)).await;
    let port = access.ports().get_by_name("i2c-1").unwrap().unwrap();
    let mut device = access.open(port, ADDR).await.unwrap();
    assert_eq!(device.slave_address(), ADDR);
    assert_eq!(device.port_number(), 1);

    assert_eq!(device.read8(0x05).await.unwrap(), 0x99);
    assert_eq!(device.write8(0x06, 0x12).await.unwrap(), 0x12);
    assert_eq!(device.write16(0x20, 0xcafe).await.unwrap(), 0xcafe);
    assert_eq!(device.read8(0x06).await.unwrap(), 0x12);
    assert_eq!(device.read16(0x20).await.unwrap(), 0xcafe);

    device.close().await.unwrap();

    let sim = access.driver().device(1, ADDR).await.unwrap();
    assert_eq!(sim.register(0x20), 0xfe);
    assert_eq!(sim.register(0x21), 0xca);
}

#[tokio::test]
async fn raw_access() {
    let access = access_with(SimDevice::new().with_readout([1, 2, 3, 4])).await;
    let port = access.ports().get(1).unwrap();
    let mut device = port.open(access.driver(), ADDR).await.unwrap();

    assert_eq!(device.read_byte().await.unwrap(), 1);
    assert_eq!(device.read_bytes(3).await.unwrap(), [2, 3, 4]);
    assert!(device.read_bytes(0).await.unwrap().is_empty());

    assert_eq!(device.write_byte(0x55).await.unwrap(), 0x55);
    assert_eq!(device.write_bytes(&[6, 7]).await.unwrap(), [6, 7]);

    let sim = access.driver().device(1, ADDR).await.unwrap();
    assert_eq!(sim.received(), &[0x55, 6, 7]);
}

#[tokio::test]
async fn largest_read_is_one_full_message() {
    let access = access_with(SimDevice::new().with_readout([5])).await;
    let port = access.ports().get(1).unwrap();
    let mut device = access.open(port, ADDR).await.unwrap();

    let bytes = device.read_bytes(u16::MAX).await.unwrap();
    assert_eq!(bytes.len(), usize::from(u16::MAX));
    assert_eq!(bytes[0], 5);
    assert!(bytes[1..].iter().all(|&b| b == SimDevice::FILL));
}

#[tokio::test]
async fn short_transfers_report_what_moved() {
    let access = access_with(SimDevice::new().with_readout([9, 8, 7, 6])).await;
    access.driver().limit_transfers(1, ADDR, 2).await;
    let port = access.ports().get(1).unwrap();
    let mut device = access.open(port, ADDR).await.unwrap();

    assert_eq!(device.read_bytes(4).await.unwrap(), [9, 8]);
    assert_eq!(device.write_bytes(&[1, 2, 3]).await.unwrap(), [1, 2]);
}

#[tokio::test]
async fn open_failure_is_an_operation_error() {
    let access = access_with(SimDevice::new()).await;
    access.driver().fail_open(1).await;

    let port = access.ports().get(1).unwrap();
    let err = access.open(port, ADDR).await.err().unwrap();
    assert_eq!(err.name(), "OperationError");
    assert_eq!(err.operation(), Operation::Open);
    assert_eq!(cause(&err), &SimError::OpenFailed(1));

    let missing = access.ports().get(5).unwrap();
    let err = access.open(missing, ADDR).await.err().unwrap();
    assert_eq!(cause(&err), &SimError::NoSuchBus(5));

    assert_eq!(access.driver().open_handles(), 0);
}

#[tokio::test]
async fn failing_operation_leaves_the_rest_usable() {
    let access = access_with(SimDevice::new().with_register(0, 0x11)).await;
    access.driver().fail(1, ADDR, SimOp::ReadByte).await;
    let port = access.ports().get(1).unwrap();
    let mut device = access.open(port, ADDR).await.unwrap();

    let err = device.read8(0).await.unwrap_err();
    assert_eq!(err.operation(), Operation::Read8);
    assert_eq!(
        cause(&err),
        &SimError::Injected {
            op: SimOp::ReadByte,
            address: ADDR
        }
    );

    assert_eq!(device.read16(0).await.unwrap(), 0x11);
    assert_eq!(device.write8(1, 2).await.unwrap(), 2);
    assert_eq!(device.read_bytes(1).await.unwrap(), [SimDevice::FILL]);
}

#[tokio::test]
async fn every_operation_wraps_its_failure() {
    let access = access_with(SimDevice::new()).await;
    let port = access.ports().get(1).unwrap();

    // Nothing answers at this address, so every transfer fails.
    let mut device = access.open(port, 0x3ff).await.unwrap();
    let errors = [
        device.read8(0).await.unwrap_err(),
        device.read16(0).await.unwrap_err(),
        device.write8(0, 0).await.unwrap_err(),
        device.write16(0, 0).await.unwrap_err(),
        device.read_byte().await.unwrap_err(),
        device.read_bytes(2).await.unwrap_err(),
        device.write_byte(0).await.unwrap_err(),
        device.write_bytes(&[0]).await.unwrap_err(),
    ];
    let operations = [
        Operation::Read8,
        Operation::Read16,
        Operation::Write8,
        Operation::Write16,
        Operation::ReadByte,
        Operation::ReadBytes,
        Operation::WriteByte,
        Operation::WriteBytes,
    ];

    for (err, operation) in errors.iter().zip(operations) {
        assert_eq!(err.operation(), operation);
        assert_eq!(
            cause(err),
            &SimError::NoDevice {
                bus: 1,
                address: 0x3ff
            }
        );
    }
}

#[tokio::test]
async fn devices_are_released() {
    let access = access_with(SimDevice::new()).await;
    let port = access.ports().get(1).unwrap();

    let a = access.open(port, ADDR).await.unwrap();
    let b = access.open(port, ADDR).await.unwrap();
    assert_eq!(access.driver().open_handles(), 2);

    drop(a);
    b.close().await.unwrap();
    assert_eq!(access.driver().open_handles(), 0);

    access.driver().fail_close(1).await;
    let c = access.open(port, ADDR).await.unwrap();
    let err = c.close().await.unwrap_err();
    assert_eq!(err.operation(), Operation::Close);
    assert_eq!(access.driver().open_handles(), 0);
}

#[tokio::test]
async fn with_device_always_closes() {
    let access = access_with(SimDevice::new()).await;
    let driver = access.driver();
    let port = I2cPort::new(1);

    let value = port
        .with_device(driver, ADDR, async |device| {
            device.write8(3, 30).await?;
            device.read8(3).await
        })
        .await
        .unwrap();
    assert_eq!(value, 30);
    assert_eq!(driver.open_handles(), 0);

    driver.fail(1, ADDR, SimOp::WriteWord).await;
    let err = port
        .with_device(driver, ADDR, async |device| device.write16(0, 1).await)
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Operation::Write16);
    assert_eq!(driver.open_handles(), 0);

    driver.fail_close(1).await;
    let err = port
        .with_device(driver, ADDR, async |device| device.read8(3).await)
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Operation::Close);

    let err = port
        .with_device(driver, ADDR, async |device| device.write16(0, 1).await)
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Operation::Write16);
    assert_eq!(driver.open_handles(), 0);
}

#[tokio::test]
async fn sessions_are_independent() {
    let driver = SimDriver::new();
    driver.attach(0, 0x10, SimDevice::new()).await;
    driver.attach(3, 0x10, SimDevice::new()).await;
    let access = request_i2c_access(driver);

    let mut zero = access
        .open(access.ports().get(0).unwrap(), 0x10)
        .await
        .unwrap();
    let mut three = access
        .open(access.ports().get_by_name("i2c-3").unwrap().unwrap(), 0x10)
        .await
        .unwrap();

    zero.write8(0, 1).await.unwrap();
    three.write8(0, 2).await.unwrap();
    assert_eq!(zero.read8(0).await.unwrap(), 1);
    assert_eq!(three.read8(0).await.unwrap(), 2);
}
