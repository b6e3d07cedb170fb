use crate::{Transport, I2C_ADDR};
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use std::{io, path::Path};

/// Tuner on a Linux `/dev/i2c-N` character device
pub struct I2cBus(LinuxI2CDevice);

pub fn open<P: AsRef<Path>>(path: P) -> io::Result<I2cBus> {
    let dev = LinuxI2CDevice::new(path, I2C_ADDR.into()).map_err(io::Error::other)?;
    Ok(I2cBus(dev))
}

impl Transport for I2cBus {
    fn write(&mut self, addr: u8, value: u8) -> io::Result<()> {
        self.0.write(&[addr, value]).map_err(io::Error::other)
    }

    // Register pointer write and data read are separate transfers, the chip
    // does not take a repeated start here.
    fn read(&mut self, addr: u8) -> io::Result<u8> {
        let mut data = [0];
        self.0.write(&[addr]).map_err(io::Error::other)?;
        self.0.read(&mut data).map_err(io::Error::other)?;
        Ok(data[0])
    }
}
