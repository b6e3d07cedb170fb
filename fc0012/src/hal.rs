use crate::{Transport, I2C_ADDR};
use embedded_hal::i2c::I2c;
use std::io;

/// Tuner on any `embedded-hal` I2C bus
pub struct HalBus<I>(pub I);

fn bus_error<E: embedded_hal::i2c::Error>(e: E) -> io::Error {
    io::Error::other(format!("{:?}", e.kind()))
}

impl<I: I2c> Transport for HalBus<I> {
    fn write(&mut self, addr: u8, value: u8) -> io::Result<()> {
        self.0.write(I2C_ADDR, &[addr, value]).map_err(bus_error)
    }

    fn read(&mut self, addr: u8) -> io::Result<u8> {
        let mut data = [0];
        self.0.write(I2C_ADDR, &[addr]).map_err(bus_error)?;
        self.0.read(I2C_ADDR, &mut data).map_err(bus_error)?;
        Ok(data[0])
    }
}
