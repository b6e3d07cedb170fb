use crate::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod calibrate;
pub mod gain;
pub mod init;
pub mod synth;

pub use calibrate::{Calibration, VcoBand};
pub use gain::{GainMode, GainPlan};
pub use synth::{SynthPlan, TuningRequest};

#[cfg(test)] use proptest::prelude::*;

pub type Hz = u32;
pub type KHz = u32;

/// Reference clock of the RTL2832U dongles this tuner ships on
pub const RTL2832_XTAL: Hz = 28_800_000;

fn div_nearest(dividend: u64, divisor: u64) -> u64 {
    (dividend + (divisor >> 1)) / divisor
}

#[cfg(test)]
proptest! {
    #[test]
    fn div_even(n: u8) {
        let v = u64::from(n);
        assert_eq!(v, div_nearest(v*2, 2));
    }

    #[test]
    fn div_odd(n: u8) {
        let v = u64::from(n);
        assert_eq!(v+1, div_nearest((v+1)*2, 2));
    }
}

/// All divider arithmetic runs in kHz
#[must_use]
pub fn to_khz(hz: Hz) -> KHz {
    // Fits: u32::MAX / 1000 rounded is far below u32::MAX
    div_nearest(u64::from(hz), 1000) as KHz
}

#[test]
fn to_khz_rounds() {
    assert_eq!(to_khz(28_800_000), 28_800);
    assert_eq!(to_khz(28_800_499), 28_800);
    assert_eq!(to_khz(28_800_500), 28_801);
    assert_eq!(to_khz(499), 0);
}

/// Channel bandwidth. Anything not 6 or 7MHz is treated as 8MHz.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Bandwidth {
    Mhz6,
    Mhz7,
    #[default]
    Mhz8,
}

impl Bandwidth {
    #[must_use]
    pub fn from_mhz(mhz: u32) -> Self {
        match mhz {
            6 => Self::Mhz6,
            7 => Self::Mhz7,
            _ => Self::Mhz8,
        }
    }

    /// Merge the bandwidth bits into a register 0x06 value
    #[must_use]
    pub fn apply(self, vco: VcoCtrl) -> VcoCtrl {
        match self {
            Self::Mhz6 => vco.union(VcoCtrl::BW_6MHZ),
            Self::Mhz7 => vco.difference(VcoCtrl::BW_6MHZ).union(VcoCtrl::BW_7MHZ),
            Self::Mhz8 => vco.difference(VcoCtrl::BANDWIDTH),
        }
    }
}

#[test]
fn bandwidth_fallback() {
    assert_eq!(Bandwidth::from_mhz(6), Bandwidth::Mhz6);
    assert_eq!(Bandwidth::from_mhz(7), Bandwidth::Mhz7);
    assert_eq!(Bandwidth::from_mhz(8), Bandwidth::Mhz8);
    assert_eq!(Bandwidth::from_mhz(5), Bandwidth::Mhz8);
    assert_eq!(Bandwidth::from_mhz(0), Bandwidth::Mhz8);
}

#[cfg(test)]
proptest! {
    #[test]
    fn bandwidth_leaves_other_bits(bw: Bandwidth, b in prop::bits::u8::ANY) {
        let vco = VcoCtrl::from_bits_retain(b);
        let out = bw.apply(vco);
        assert_eq!(out.difference(VcoCtrl::BANDWIDTH), vco.difference(VcoCtrl::BANDWIDTH));
        match bw {
            Bandwidth::Mhz6 => assert!(out.contains(VcoCtrl::BW_6MHZ)),
            Bandwidth::Mhz7 => assert_eq!(out.intersection(VcoCtrl::BANDWIDTH), VcoCtrl::BW_7MHZ),
            Bandwidth::Mhz8 => assert!(out.intersection(VcoCtrl::BANDWIDTH).is_empty()),
        }
    }
}

/// Settings for the command line tool, usually read from a TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// I2C character device the tuner sits on
    pub device: PathBuf,
    pub reference_clock: Hz,
    pub frequency: Option<KHz>,
    /// MHz, 6, 7 or 8
    pub bandwidth: u32,
    /// dB, automatic gain control when absent
    pub gain: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/i2c-1"),
            reference_clock: RTL2832_XTAL,
            frequency: None,
            bandwidth: 8,
            gain: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn bandwidth(&self) -> Bandwidth {
        Bandwidth::from_mhz(self.bandwidth)
    }

    #[must_use]
    pub fn gain_mode(&self) -> GainMode {
        match self.gain {
            Some(_) => GainMode::Manual,
            None => GainMode::Automatic,
        }
    }
}

#[test]
fn config_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.bandwidth(), Bandwidth::Mhz8);
    assert_eq!(config.gain_mode(), GainMode::Automatic);
}

#[test]
fn config_from_toml() {
    let config: Config = toml::from_str(
        r#"
        device = "/dev/i2c-7"
        reference_clock = 36000000
        frequency = 100000
        bandwidth = 6
        gain = -5
        "#,
    )
    .unwrap();
    assert_eq!(config.device, PathBuf::from("/dev/i2c-7"));
    assert_eq!(config.reference_clock, 36_000_000);
    assert_eq!(config.frequency, Some(100_000));
    assert_eq!(config.bandwidth(), Bandwidth::Mhz6);
    assert_eq!(config.gain, Some(-5));
    assert_eq!(config.gain_mode(), GainMode::Manual);
}
