use crate::config::Bandwidth;
use crate::*;
use std::fmt;

/// Number of registers covered by a dump, 0x00 through 0x15
pub const DUMP_LEN: usize = 0x16;

/// Raw snapshot of the register file with decoders for the known fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterDump {
    pub regs: [u8; DUMP_LEN],
}

impl RegisterDump {
    pub fn read<B: Transport>(radio: &mut Registers<B>) -> Result<Self> {
        let mut regs = [0; DUMP_LEN];
        for (addr, reg) in (0u8..).zip(regs.iter_mut()) {
            *reg = radio.read_raw(addr)?;
        }
        Ok(Self { regs })
    }

    #[must_use]
    pub fn chip_id(&self) -> u8 {
        self.regs[0x00]
    }

    fn vco(&self) -> VcoCtrl {
        VcoCtrl::from_bits_retain(self.regs[0x06])
    }

    #[must_use]
    pub fn lna_powered_down(&self) -> bool {
        self.vco().contains(VcoCtrl::LNA_POWER_DOWN)
    }

    #[must_use]
    pub fn vco_high(&self) -> bool {
        self.vco().contains(VcoCtrl::VCO_HIGH)
    }

    /// 0x80 wins over 0x40, the same way the bits are written
    #[must_use]
    pub fn bandwidth(&self) -> Bandwidth {
        let vco = self.vco();
        if vco.contains(VcoCtrl::BW_6MHZ) {
            Bandwidth::Mhz6
        } else if vco.contains(VcoCtrl::BW_7MHZ) {
            Bandwidth::Mhz7
        } else {
            Bandwidth::Mhz8
        }
    }

    #[must_use]
    pub fn xtal(&self) -> XtalSpeed {
        if self.regs[0x07] & u8::from(XtalSpeed::Mhz28_8) != 0 {
            XtalSpeed::Mhz28_8
        } else {
            XtalSpeed::Mhz36
        }
    }

    #[must_use]
    pub fn rssi_calibrating(&self) -> bool {
        self.regs[0x09] & 0x10 != 0
    }

    #[must_use]
    pub fn lna_forced(&self) -> bool {
        self.regs[0x0D] & 0x01 != 0
    }

    /// `None` for codes outside the gain table
    #[must_use]
    pub fn lna_gain(&self) -> Option<LnaGain> {
        LnaGain::try_from(self.regs[0x13]).ok()
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.regs.chunks(8).enumerate() {
            write!(f, "{:02X}:", row * 8)?;
            for b in chunk {
                write!(f, " {b:02X}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "chip id:        0x{:02X}", self.chip_id())?;
        writeln!(f, "LNA power down: {}", yes_no(self.lna_powered_down()))?;
        writeln!(f, "VCO band:       {}", if self.vco_high() { "high" } else { "low" })?;
        writeln!(f, "bandwidth:      {:?}", self.bandwidth())?;
        writeln!(f, "crystal:        {:?}", self.xtal())?;
        writeln!(f, "RSSI calibrate: {}", yes_no(self.rssi_calibrating()))?;
        writeln!(f, "LNA forced:     {}", yes_no(self.lna_forced()))?;
        match self.lna_gain() {
            Some(gain) => writeln!(f, "LNA gain:       {gain:?}"),
            None => writeln!(f, "LNA gain:       unknown 0x{:02X}", self.regs[0x13]),
        }
    }
}
