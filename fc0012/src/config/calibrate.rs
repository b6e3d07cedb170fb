use crate::config::*;
use tracing::debug;

/// Control voltage above which the high band VCO is at its low frequency edge
pub const HIGH_BAND_LIMIT: u8 = 0x3C;
/// Control voltage below which the low band VCO is at its high frequency edge
pub const LOW_BAND_LIMIT: u8 = 0x02;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VcoBand {
    Low,
    High,
}

impl From<VcoCtrl> for VcoBand {
    fn from(v: VcoCtrl) -> Self {
        if v.contains(VcoCtrl::VCO_HIGH) {
            Self::High
        } else {
            Self::Low
        }
    }
}

/// Outcome of a tune. `voltage` is the reading that decided the band, it is
/// not read again after a correction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Calibration {
    pub voltage: u8,
    pub band: VcoBand,
    pub corrected: bool,
}

/// Register 0x06 value for the other band if `voltage` says the VCO is at
/// the edge of the current one.
#[must_use]
pub fn correction(vco: VcoCtrl, voltage: u8) -> Option<VcoCtrl> {
    match VcoBand::from(vco) {
        VcoBand::High if voltage > HIGH_BAND_LIMIT => Some(vco.difference(VcoCtrl::VCO_HIGH)),
        VcoBand::Low if voltage < LOW_BAND_LIMIT => Some(vco.union(VcoCtrl::VCO_HIGH)),
        _ => None,
    }
}

/// Band correction runs at most once, there is no edge back from Corrected.
enum Step {
    Initial(VcoCtrl),
    Corrected { vco: VcoCtrl, voltage: u8 },
    Done(Calibration),
}

fn pulse<B: Transport>(radio: &mut Registers<B>) -> Result<()> {
    radio.VCO_CALIB_CMD().write(VcoCalibCmd::START)?;
    radio.VCO_CALIB_CMD().write(VcoCalibCmd::CLEAR)?;
    Ok(())
}

impl Step {
    fn next<B: Transport>(self, radio: &mut Registers<B>) -> Result<Self> {
        Ok(match self {
            Step::Initial(vco) => {
                pulse(radio)?;
                radio.VCO_CALIB_CMD().write(VcoCalibCmd::CLEAR)?;
                let VcoCalib { voltage } = radio.VCO_CALIB().read()?;
                match correction(vco, voltage) {
                    Some(corrected) => {
                        debug!(
                            voltage,
                            "VCO at the edge of the {:?} band, switching to {:?}",
                            VcoBand::from(vco),
                            VcoBand::from(corrected)
                        );
                        radio.VCO_CTRL().write(corrected)?;
                        pulse(radio)?;
                        Step::Corrected {
                            vco: corrected,
                            voltage,
                        }
                    }
                    None => Step::Done(Calibration {
                        voltage,
                        band: vco.into(),
                        corrected: false,
                    }),
                }
            }
            Step::Corrected { vco, voltage } => Step::Done(Calibration {
                voltage,
                band: vco.into(),
                corrected: true,
            }),
            done @ Step::Done(_) => done,
        })
    }
}

/// Pulse the VCO self calibration and move to the other band once if the
/// control voltage reads at the limit. A second marginal reading is accepted.
pub fn calibrate<B: Transport>(radio: &mut Registers<B>, vco: VcoCtrl) -> Result<Calibration> {
    let mut step = Step::Initial(vco);
    loop {
        step = step.next(radio)?;
        if let Step::Done(calibration) = step {
            debug!(?calibration, "VCO calibrated");
            return Ok(calibration);
        }
    }
}

impl SynthPlan {
    /// Write the dividers, then calibrate. Stops at the first failed
    /// transfer and leaves the chip as the last good write set it.
    pub fn write<B: Transport>(&self, radio: &mut Registers<B>) -> Result<Calibration> {
        radio.RF_A().write(self.divider_a)?;
        radio.RF_M().write(self.divider_m)?;
        radio.RF_K_HIGH().write(self.frac_high)?;
        radio.RF_K_LOW().write(self.frac_low)?;
        radio.RF_OUTDIV_A().write(self.output_divider)?;
        radio.VCO_CTRL().write(self.vco)?;
        calibrate(radio, self.vco)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBus, Op};

    const CALIB: u8 = 0x0E;

    fn plan() -> SynthPlan {
        SynthPlan::new(&TuningRequest {
            freq: 100_000,
            bandwidth: Bandwidth::Mhz8,
            reference_clock: RTL2832_XTAL,
        })
        .unwrap()
    }

    fn pulses(bus: &MockBus) -> usize {
        bus.writes_to(CALIB).iter().filter(|v| **v == 0x80).count()
    }

    #[test]
    fn write_order() {
        let p = plan();
        let mut bus = MockBus::with_value(CALIB, 0x20);
        let cal = p.write(&mut Registers::new(&mut bus)).unwrap();

        let mut expected: Vec<Op> = p.registers().iter().map(|(a, v)| Op::Write(*a, *v)).collect();
        expected.extend([
            Op::Write(CALIB, 0x80),
            Op::Write(CALIB, 0x00),
            Op::Write(CALIB, 0x00),
            Op::Read(CALIB),
        ]);
        assert_eq!(bus.ops, expected);
        assert_eq!(
            cal,
            Calibration {
                voltage: 0x20,
                band: VcoBand::High,
                corrected: false
            }
        );
    }

    #[test]
    fn no_correction_at_limit() {
        for voltage in [0x00, 0x01, 0x3B, HIGH_BAND_LIMIT] {
            let mut bus = MockBus::with_value(CALIB, voltage);
            let cal = plan().write(&mut Registers::new(&mut bus)).unwrap();
            assert_eq!(pulses(&bus), 1);
            assert_eq!(bus.writes_to(0x06).len(), 1);
            assert!(!cal.corrected);
        }
    }

    #[test]
    fn high_band_at_low_edge() {
        let p = plan();
        let mut bus = MockBus::with_value(CALIB, 0x3D);
        let cal = p.write(&mut Registers::new(&mut bus)).unwrap();

        let vco_writes = bus.writes_to(0x06);
        assert_eq!(vco_writes, [p.vco.bits(), p.vco.difference(VcoCtrl::VCO_HIGH).bits()]);
        assert_eq!(pulses(&bus), 2);
        // the corrective pass does not read back
        assert_eq!(bus.ops.iter().filter(|op| **op == Op::Read(CALIB)).count(), 1);
        assert_eq!(
            bus.ops[bus.ops.len() - 3..],
            [
                Op::Write(0x06, p.vco.difference(VcoCtrl::VCO_HIGH).bits()),
                Op::Write(CALIB, 0x80),
                Op::Write(CALIB, 0x00),
            ]
        );
        assert_eq!(
            cal,
            Calibration {
                voltage: 0x3D,
                band: VcoBand::Low,
                corrected: true
            }
        );
    }

    #[test]
    fn voltage_masked_to_six_bits() {
        // 0xFD & 0x3F = 0x3D
        let mut bus = MockBus::with_value(CALIB, 0xFD);
        let cal = plan().write(&mut Registers::new(&mut bus)).unwrap();
        assert_eq!(cal.voltage, 0x3D);
        assert!(cal.corrected);

        // 0xC0 & 0x3F = 0
        let mut bus = MockBus::with_value(CALIB, 0xC0);
        let cal = plan().write(&mut Registers::new(&mut bus)).unwrap();
        assert_eq!(cal.voltage, 0);
        assert!(!cal.corrected);
    }

    #[test]
    fn low_band_at_high_edge() {
        let vco = VcoCtrl::OUTDIV_3;
        let mut bus = MockBus::with_value(CALIB, 0x01);
        let cal = calibrate(&mut Registers::new(&mut bus), vco).unwrap();
        assert_eq!(bus.writes_to(0x06), [(vco | VcoCtrl::VCO_HIGH).bits()]);
        assert_eq!(pulses(&bus), 2);
        assert_eq!(cal.band, VcoBand::High);
        assert!(cal.corrected);

        let mut bus = MockBus::with_value(CALIB, LOW_BAND_LIMIT);
        let cal = calibrate(&mut Registers::new(&mut bus), vco).unwrap();
        assert!(bus.writes_to(0x06).is_empty());
        assert_eq!(pulses(&bus), 1);
        assert_eq!(cal.band, VcoBand::Low);
        assert!(!cal.corrected);
    }

    #[test]
    fn correction_rules() {
        let high = VcoCtrl::VCO_HIGH | VcoCtrl::BW_6MHZ;
        assert_eq!(correction(high, 0x3C), None);
        assert_eq!(correction(high, 0x3D), Some(VcoCtrl::BW_6MHZ));
        assert_eq!(correction(VcoCtrl::BW_6MHZ, 0x02), None);
        assert_eq!(correction(VcoCtrl::BW_6MHZ, 0x01), Some(high));
    }

    #[test]
    fn failed_write_stops_sequence() {
        // 6 register writes, 3 calibration writes, plus a corrective rewrite
        // and pulse because 0x3F is past the limit
        for fail in 0..12 {
            let mut bus = MockBus::with_value(CALIB, 0x3F);
            bus.fail_write = Some(fail);
            let r = plan().write(&mut Registers::new(&mut bus));
            assert!(matches!(r, Err(Error::Io(_))), "write {fail}");
            assert_eq!(bus.writes().len(), fail);
        }
    }

    #[test]
    fn failed_read_stops_sequence() {
        let mut bus = MockBus {
            fail_read: true,
            ..Default::default()
        };
        let r = plan().write(&mut Registers::new(&mut bus));
        assert!(matches!(r, Err(Error::Io(_))));
        // nothing after the failed read
        assert_eq!(bus.writes().len(), 9);
        assert_eq!(bus.ops.len(), 9);
    }
}
