use std::{io, marker::PhantomData};
use thiserror::Error;
use tracing::trace;

use registers::*;

pub mod config;
pub mod dump;
pub mod hal;
pub mod linux;
pub mod registers;
pub mod tuner;

#[cfg(test)]
mod mock;

pub use tuner::Tuner;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I2C communication failed")]
    Io(#[from] io::Error),
    #[error("Invalid value 0x{value:02X} returned from register 0x{addr:02X}")]
    Decode { addr: u8, value: u8 },
    #[error("Unexpected chip id 0x{0:02X}, not an FC0012")]
    ChipId(u8),
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

/// 7-bit bus address, 0xC6 in 8-bit notation
pub const I2C_ADDR: u8 = 0x63;

/// Byte wide register channel to the tuner, bound to its I2C address.
///
/// Every call blocks until the bus transaction finishes. Nothing is retried.
pub trait Transport {
    fn write(&mut self, addr: u8, value: u8) -> io::Result<()>;
    fn read(&mut self, addr: u8) -> io::Result<u8>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, addr: u8, value: u8) -> io::Result<()> {
        (**self).write(addr, value)
    }
    fn read(&mut self, addr: u8) -> io::Result<u8> {
        (**self).read(addr)
    }
}

pub trait IO {
    type Bus: Transport;
    fn bus(&mut self) -> &mut Self::Bus;
    fn addr(&self) -> u8;
}

pub trait RX: IO {
    type Value: TryFrom<Reg8>;
    fn read(&mut self) -> Result<Self::Value> {
        let addr = self.addr();
        let value = self.bus().read(addr)?;
        trace!("R{:02X} -> {:02X}", addr, value);
        Reg8(value)
            .try_into()
            .map_err(|_| Error::Decode { addr, value })
    }
}

pub trait TX: IO {
    type Value: Into<Reg8>;
    fn write(&mut self, value: Self::Value) -> Result<()> {
        let addr = self.addr();
        let Reg8(value) = value.into();
        trace!("R{:02X} <- {:02X}", addr, value);
        self.bus().write(addr, value)?;
        Ok(())
    }
}

pub struct ReadWrite<'a, B, V: TryFrom<Reg8> + Into<Reg8>> {
    data: PhantomData<V>,
    bus: &'a mut B,
    addr: u8,
}

impl<B: Transport, V: TryFrom<Reg8> + Into<Reg8>> IO for ReadWrite<'_, B, V> {
    type Bus = B;
    fn bus(&mut self) -> &mut B {
        &mut *self.bus
    }
    fn addr(&self) -> u8 {
        self.addr
    }
}

impl<B: Transport, V: TryFrom<Reg8> + Into<Reg8>> RX for ReadWrite<'_, B, V> {
    type Value = V;
}

impl<B: Transport, V: TryFrom<Reg8> + Into<Reg8>> TX for ReadWrite<'_, B, V> {
    type Value = V;
}

pub struct ReadOnly<'a, B, V: TryFrom<Reg8>> {
    data: PhantomData<V>,
    bus: &'a mut B,
    addr: u8,
}

impl<B: Transport, V: TryFrom<Reg8>> IO for ReadOnly<'_, B, V> {
    type Bus = B;
    fn bus(&mut self) -> &mut B {
        &mut *self.bus
    }
    fn addr(&self) -> u8 {
        self.addr
    }
}

impl<B: Transport, V: TryFrom<Reg8>> RX for ReadOnly<'_, B, V> {
    type Value = V;
}

pub struct WriteOnly<'a, B, V: Into<Reg8>> {
    data: PhantomData<V>,
    bus: &'a mut B,
    addr: u8,
}

impl<B: Transport, V: Into<Reg8>> IO for WriteOnly<'_, B, V> {
    type Bus = B;
    fn bus(&mut self) -> &mut B {
        &mut *self.bus
    }
    fn addr(&self) -> u8 {
        self.addr
    }
}

impl<B: Transport, V: Into<Reg8>> TX for WriteOnly<'_, B, V> {
    type Value = V;
}

// Name: Type [Addr, Access],
macro_rules! registers {
    (
        $vis:vis struct $name:ident {
            $($reg:ident: $T:ty [ $addr:literal, $access:ident ],)*
        }
    ) => {

        $vis struct $name<B> {
            bus: B,
        }

        #[allow(non_snake_case)]
        impl<B: Transport> $name<B> {
            $(
                pub fn $reg(&mut self) -> $access<'_, B, $T> {
                    $access {
                        data: PhantomData,
                        bus: &mut self.bus,
                        addr: $addr,
                    }
                }
            )*
        }
    }
}

/* Register map as documented for the rtl-sdr FC0012 driver. Addresses
 * missing here are only touched by the init table. */
registers! {
    pub struct Registers {
        CHIP_ID:       u8          [0x00, ReadOnly ], // Chip ID, always 0xA1
        RF_A:          u8          [0x01, ReadWrite], // Count-to-9 cycles in RF divider
        RF_M:          u8          [0x02, ReadWrite], // Total cycles (to-8 and to-9) in RF divider
        RF_K_HIGH:     u8          [0x03, ReadWrite], // Fractional divider, high byte
        RF_K_LOW:      u8          [0x04, ReadWrite], // Fractional divider, low byte
        RF_OUTDIV_A:   u8          [0x05, ReadWrite], // RF output divider
        VCO_CTRL:      VcoCtrl     [0x06, ReadWrite], // VCO range, bandwidth, output divider B
        XTAL_SPEED:    XtalSpeed   [0x07, ReadWrite], // Crystal speed select
        AGC_PARAMS:    u8          [0x08, ReadWrite], // AGC clock, gain and loop bandwidth
        RSSI_CAL:      u8          [0x09, ReadWrite], // RSSI calibration, loop through
        AGC_MODE:      AgcMode     [0x0C, ReadWrite], // AGC on/off
        FORCE:         u8          [0x0D, ReadWrite], // LNA/AGC forcing
        VCO_CALIB_CMD: VcoCalibCmd [0x0E, WriteOnly], // VCO calibration trigger
        VCO_CALIB:     VcoCalib    [0x0E, ReadOnly ], // VCO control voltage
        SEC_GAIN:      u8          [0x12, ReadWrite], // Secondary gain, 0x00-0x1F
        LNA_GAIN:      LnaGain     [0x13, ReadWrite], // Low noise amplifier gain
        LNA_COMPS:     u8          [0x15, ReadWrite], // LNA compensation
    }
}

impl<B: Transport> Registers<B> {
    pub fn new(bus: B) -> Self {
        Registers { bus }
    }

    /// Write by address, for register tables that are not typed.
    pub fn write_raw(&mut self, addr: u8, value: u8) -> Result<()> {
        trace!("R{:02X} <- {:02X}", addr, value);
        self.bus.write(addr, value)?;
        Ok(())
    }

    pub fn read_raw(&mut self, addr: u8) -> Result<u8> {
        let value = self.bus.read(addr)?;
        trace!("R{:02X} -> {:02X}", addr, value);
        Ok(value)
    }

    pub fn into_inner(self) -> B {
        self.bus
    }
}
