/* Register type definitions
 *
 * Since one type can be used for multiple registers, defaults should not be
 * set here.
 * */
use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
#[cfg(test)] use proptest::prelude::*;
#[cfg(test)] use proptest_derive::Arbitrary;

// newtype to placate the orphan rule
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reg8(pub u8);

impl From<u8> for Reg8 {
    fn from(item: u8) -> Self {
        Self(item)
    }
}

impl TryFrom<Reg8> for u8 {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        Ok(item.0)
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn reg8_u8_inverse(n: u8) {
        assert_eq!(n, Reg8::from(n).try_into().unwrap());
    }
}

bitflags! {
    /// Register 0x06
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VcoCtrl: u8 {
        const BW_6MHZ        = 0x80;
        const BW_7MHZ        = 0x40;
        const VCO_HIGH       = 0x08; // 0: ca. 1.1-1.5GHz, 1: ca. 1.4-1.8GHz
        const OUTDIV_3       = 0x02; // RF output divider 3 instead of 2
        const LNA_POWER_DOWN = 0x01;
    }
}

impl VcoCtrl {
    /// Both bandwidth bits, clear for 8MHz
    pub const BANDWIDTH: Self = Self::BW_6MHZ.union(Self::BW_7MHZ);
}

impl TryFrom<Reg8> for VcoCtrl {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        // bits 2, 4 and 5 are undocumented, keep whatever the chip reports
        Ok(Self::from_bits_retain(item.0))
    }
}

impl From<VcoCtrl> for Reg8 {
    fn from(item: VcoCtrl) -> Self {
        item.bits().into()
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn vcoctrl_inverse(b in prop::bits::u8::ANY.prop_map(VcoCtrl::from_bits_retain)) {
        assert_eq!(b, Reg8::from(b).try_into().unwrap())
    }
}

/// Writing START then CLEAR pulses the VCO self calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[rustfmt::skip]
pub enum VcoCalibCmd {
    CLEAR = 0x00,
    START = 0x80,
}

impl From<VcoCalibCmd> for Reg8 {
    fn from(item: VcoCalibCmd) -> Self {
        u8::from(item).into()
    }
}

/// Control voltage of the VCO after calibration. A large value means the VCO
/// sits at the low frequency end of its range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VcoCalib {
    pub voltage: u8,
}

impl VcoCalib {
    pub const VOLTAGE_MASK: u8 = 0x3F;
}

impl TryFrom<Reg8> for VcoCalib {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        Ok(Self {
            voltage: item.0 & Self::VOLTAGE_MASK,
        })
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn vcocalib_masks_six_bits(b in prop::bits::u8::ANY) {
        let calib = VcoCalib::try_from(Reg8(b)).unwrap();
        assert!(calib.voltage <= 0x3F);
        assert_eq!(calib.voltage, b & 0x3F);
    }
}

/// Register 0x07
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(test, derive(Arbitrary))]
#[repr(u8)]
#[rustfmt::skip]
pub enum XtalSpeed {
    Mhz36   = 0x00,
    Mhz28_8 = 0x20,
}

impl XtalSpeed {
    /// Pick the crystal setting closest to the reference clock
    #[must_use]
    pub fn from_reference(hz: u32) -> Self {
        // halfway between 28.8MHz and 36MHz
        if hz >= 32_400_000 {
            Self::Mhz36
        } else {
            Self::Mhz28_8
        }
    }
}

impl TryFrom<Reg8> for XtalSpeed {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        Self::try_from(item.0 & 0x20).or(Err(item))
    }
}

impl From<XtalSpeed> for Reg8 {
    fn from(item: XtalSpeed) -> Self {
        u8::from(item).into()
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn xtalspeed_inverse(t: XtalSpeed) {
        assert_eq!(t, Reg8::from(t).try_into().unwrap());
    }
}

#[test]
fn xtalspeed_from_reference() {
    assert_eq!(XtalSpeed::from_reference(28_800_000), XtalSpeed::Mhz28_8);
    assert_eq!(XtalSpeed::from_reference(36_000_000), XtalSpeed::Mhz36);
    assert_eq!(XtalSpeed::from_reference(32_399_999), XtalSpeed::Mhz28_8);
}

/// Register 0x13, with the gain each code gives
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(test, derive(Arbitrary))]
#[repr(u8)]
#[rustfmt::skip]
pub enum LnaGain {
    Lowest = 0x02, // -9.9dB
    Low    = 0x00, // -4.0dB
    Mid    = 0x08, //  7.1dB
    Hi     = 0x17, // 17.9dB
    Max    = 0x10, // 19.2dB
}

impl TryFrom<Reg8> for LnaGain {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        Self::try_from(item.0).or(Err(item))
    }
}

impl From<LnaGain> for Reg8 {
    fn from(item: LnaGain) -> Self {
        u8::from(item).into()
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn lnagain_inverse(t: LnaGain) {
        assert_eq!(t, Reg8::from(t).try_into().unwrap());
    }
}

#[test]
fn lnagain_unknown_code() {
    assert_eq!(LnaGain::try_from(Reg8(0x18)), Err(Reg8(0x18)));
}

/// Register 0x0C
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(test, derive(Arbitrary))]
#[repr(u8)]
#[rustfmt::skip]
pub enum AgcMode {
    On  = 0xFC,
    Off = 0xEC,
}

impl TryFrom<Reg8> for AgcMode {
    type Error = Reg8;
    fn try_from(item: Reg8) -> Result<Self, Self::Error> {
        Self::try_from(item.0).or(Err(item))
    }
}

impl From<AgcMode> for Reg8 {
    fn from(item: AgcMode) -> Self {
        u8::from(item).into()
    }
}

#[cfg(test)]
proptest! {
    #[test]
    fn agcmode_inverse(t: AgcMode) {
        assert_eq!(t, Reg8::from(t).try_into().unwrap());
    }
}
