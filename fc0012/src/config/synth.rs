use crate::config::*;
use tracing::debug;

/// Ceiling for `freq * multiplier`, i.e. twice the top of the VCO range, kHz
pub const DOUBLE_VCO_MAX: KHz = 3_560_000;

/// One row of the output divider table: the multiplier between the tuned
/// frequency and the doubled VCO frequency, with the register 0x05 and 0x06
/// bit patterns that select it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VcoDivider {
    pub multiplier: u8,
    pub outdiv_a: u8,
    pub vco: VcoCtrl,
}

#[rustfmt::skip]
pub const VCO_DIVIDERS: [VcoDivider; 10] = [
    VcoDivider { multiplier: 96, outdiv_a: 0x82, vco: VcoCtrl::empty()   },
    VcoDivider { multiplier: 64, outdiv_a: 0x82, vco: VcoCtrl::OUTDIV_3 },
    VcoDivider { multiplier: 48, outdiv_a: 0x42, vco: VcoCtrl::empty()   },
    VcoDivider { multiplier: 32, outdiv_a: 0x42, vco: VcoCtrl::OUTDIV_3 },
    VcoDivider { multiplier: 24, outdiv_a: 0x22, vco: VcoCtrl::empty()   },
    VcoDivider { multiplier: 16, outdiv_a: 0x22, vco: VcoCtrl::OUTDIV_3 },
    VcoDivider { multiplier: 12, outdiv_a: 0x12, vco: VcoCtrl::empty()   },
    VcoDivider { multiplier:  8, outdiv_a: 0x12, vco: VcoCtrl::OUTDIV_3 },
    VcoDivider { multiplier:  6, outdiv_a: 0x0A, vco: VcoCtrl::empty()   },
    VcoDivider { multiplier:  4, outdiv_a: 0x0A, vco: VcoCtrl::OUTDIV_3 }, // fallback
];

impl VcoDivider {
    /// Largest multiplier that keeps the doubled VCO below `DOUBLE_VCO_MAX`.
    /// Frequencies too high for every row get the last one.
    #[must_use]
    pub fn select(freq: KHz) -> &'static Self {
        let (rows, fallback) = VCO_DIVIDERS.split_at(VCO_DIVIDERS.len() - 1);
        rows.iter()
            .find(|d| {
                freq.checked_mul(d.multiplier.into())
                    .is_some_and(|vco| vco < DOUBLE_VCO_MAX)
            })
            .unwrap_or(&fallback[0])
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TuningRequest {
    pub freq: KHz,
    pub bandwidth: Bandwidth,
    pub reference_clock: Hz,
}

impl TuningRequest {
    fn validate(&self) -> Result<()> {
        if self.freq == 0 {
            return Err(Error::InvalidInput("frequency is zero"));
        }
        if self.reference_clock == 0 {
            return Err(Error::InvalidInput("reference clock is zero"));
        }
        // crystal / 4 is the rounding threshold and crystal / 2 the divisor
        let crystal = to_khz(self.reference_clock);
        if crystal < 4 {
            return Err(Error::InvalidInput("reference clock below 4kHz"));
        }
        if crystal / 2 > KHz::from(u16::MAX) {
            return Err(Error::InvalidInput("reference clock above 131MHz"));
        }
        Ok(())
    }
}

/// Register values for one tune. Recomputed every time, nothing is cached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SynthPlan {
    pub multiplier: u8,
    pub divider_a: u8,      // 0x01
    pub divider_m: u8,      // 0x02
    pub frac_high: u8,      // 0x03
    pub frac_low: u8,       // 0x04
    pub output_divider: u8, // 0x05
    pub vco: VcoCtrl,       // 0x06
}

/// `xdiv = double_vco / half_clock`, rounded half up, in 16 bits
fn integer_divider(double_vco: KHz, crystal: KHz) -> u16 {
    let half = crystal / 2;
    let xdiv = (double_vco / half) as u16;
    if double_vco - KHz::from(xdiv) * half >= crystal / 4 {
        xdiv.wrapping_add(1)
    } else {
        xdiv
    }
}

/// Sigma-delta input: the remainder of `double_vco / half` scaled to 15
/// bits. Codes with bit 14 set get bit 15 set as well, which is what the
/// fractional accumulator expects.
fn fractional(double_vco: KHz, half: KHz) -> u16 {
    let quotient = (double_vco / half) as u16;
    let xin = (double_vco - KHz::from(quotient) * half) as u16;
    let xin = ((u32::from(xin) << 15) / u32::from(half as u16)) as u16;
    if xin >= 16384 {
        xin.wrapping_add(32768)
    } else {
        xin
    }
}

/// Split `xdiv` into the A and M counts. A below 2 is not a valid count, so
/// borrow one cycle of 8 from M.
fn split_divider(xdiv: u16) -> (u8, u8) {
    let pm = (xdiv / 8) as u8;
    let am = u32::from(xdiv).wrapping_sub(8 * u32::from(pm)) as u8;
    if am < 2 {
        (am + 8, pm.wrapping_sub(1))
    } else {
        (am, pm)
    }
}

impl SynthPlan {
    pub fn new(request: &TuningRequest) -> Result<Self> {
        request.validate()?;
        let crystal = to_khz(request.reference_clock);

        let divider = VcoDivider::select(request.freq);
        let double_vco = request
            .freq
            .checked_mul(divider.multiplier.into())
            .ok_or(Error::InvalidInput("frequency out of range"))?;

        // Always start on the high VCO band, calibration moves it down if
        // the control voltage says so.
        let vco = divider.vco.union(VcoCtrl::VCO_HIGH);

        let xdiv = integer_divider(double_vco, crystal);
        let (divider_a, divider_m) = split_divider(xdiv);
        let xin = fractional(double_vco, crystal / 2);
        let [frac_high, frac_low] = xin.to_be_bytes();

        let plan = Self {
            multiplier: divider.multiplier,
            divider_a,
            divider_m,
            frac_high,
            frac_low,
            output_divider: divider.outdiv_a,
            vco: request.bandwidth.apply(vco),
        };
        debug!(
            freq = request.freq,
            multiplier = plan.multiplier,
            xdiv,
            xin,
            "synthesizer plan {:02X?}",
            plan.registers()
        );
        Ok(plan)
    }

    #[must_use]
    pub fn frac(&self) -> u16 {
        u16::from_be_bytes([self.frac_high, self.frac_low])
    }

    #[must_use]
    pub fn vco_band_is_high(&self) -> bool {
        self.vco.contains(VcoCtrl::VCO_HIGH)
    }

    #[must_use]
    pub fn bandwidth_bits(&self) -> VcoCtrl {
        self.vco.intersection(VcoCtrl::BANDWIDTH)
    }

    /// Registers 0x01 to 0x06 in write order
    #[must_use]
    pub fn registers(&self) -> [(u8, u8); 6] {
        [
            (0x01, self.divider_a),
            (0x02, self.divider_m),
            (0x03, self.frac_high),
            (0x04, self.frac_low),
            (0x05, self.output_divider),
            (0x06, self.vco.bits()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use proptest::prelude::*;

    fn plan(freq: KHz, bandwidth: Bandwidth) -> SynthPlan {
        SynthPlan::new(&TuningRequest {
            freq,
            bandwidth,
            reference_clock: RTL2832_XTAL,
        })
        .unwrap()
    }

    #[test]
    fn highest_frequencies_use_multiplier_4() {
        // 900MHz * 6 is past the VCO ceiling, so only the fallback row fits
        let p = plan(900_000, Bandwidth::Mhz8);
        assert_eq!(p.multiplier, 4);
        assert_eq!(p.output_divider, 0x0A);
        // 3_600_000 / 14_400 = 250 exactly
        assert_eq!((p.divider_a, p.divider_m), (2, 31));
        assert_eq!(p.frac(), 0);
        assert!(p.bandwidth_bits().is_empty());
        assert!(p.vco_band_is_high());
        assert_eq!(p.vco, VcoCtrl::VCO_HIGH | VcoCtrl::OUTDIV_3);
        assert_eq!(p.vco.bits(), 0x0A);
    }

    #[test]
    fn fm_broadcast() {
        // 100MHz: 32 is the first multiplier below 3.56GHz
        let p = plan(100_000, Bandwidth::Mhz6);
        assert_eq!(p.multiplier, 32);
        assert_eq!(p.output_divider, 0x42);
        // 3_200_000 = 222 * 14_400 + 3_200, 3_200 < 7_200 so no round up
        assert_eq!((p.divider_a, p.divider_m), (6, 27));
        // (3_200 << 15) / 14_400 = 7281
        assert_eq!(p.frac(), 7281);
        assert_eq!((p.frac_high, p.frac_low), (0x1C, 0x71));
        assert_eq!(p.vco.bits(), 0x8A);
    }

    #[test]
    fn divider_borrow() {
        // 57.6MHz * 48 = 192 * 14_400, so A would be 0
        let p = plan(57_600, Bandwidth::Mhz7);
        assert_eq!(p.multiplier, 48);
        assert_eq!((p.divider_a, p.divider_m), (8, 23));
        assert_eq!(p.frac(), 0);
        assert_eq!(p.vco.bits(), 0x48);
    }

    #[test]
    fn fractional_wraparound() {
        // 100.25MHz * 32 = 222 * 14_400 + 11_200, rounds xdiv up to 223
        let p = plan(100_250, Bandwidth::Mhz8);
        assert_eq!(p.multiplier, 32);
        assert_eq!((p.divider_a, p.divider_m), (7, 27));
        // (11_200 << 15) / 14_400 = 25486, past 16384 so bit 15 is added
        assert_eq!(p.frac(), 25486 + 32768);
        assert_eq!((p.frac_high, p.frac_low), (0xE3, 0x8E));
    }

    #[test]
    fn register_order() {
        let p = plan(100_000, Bandwidth::Mhz8);
        let addrs: Vec<u8> = p.registers().iter().map(|(a, _)| *a).collect();
        assert_eq!(addrs, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn invalid_requests() {
        for (freq, reference_clock) in [(0, RTL2832_XTAL), (100_000, 0), (100_000, 3_000), (100_000, 200_000_000)] {
            let r = SynthPlan::new(&TuningRequest {
                freq,
                bandwidth: Bandwidth::Mhz8,
                reference_clock,
            });
            assert!(matches!(r, Err(Error::InvalidInput(_))), "{freq} {reference_clock}");
        }
        let r = SynthPlan::new(&TuningRequest {
            freq: u32::MAX,
            bandwidth: Bandwidth::Mhz8,
            reference_clock: RTL2832_XTAL,
        });
        assert!(matches!(r, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn multiplier_table_order() {
        let multipliers: Vec<u8> = VCO_DIVIDERS.iter().map(|d| d.multiplier).collect();
        assert_eq!(multipliers, [96, 64, 48, 32, 24, 16, 12, 8, 6, 4]);
    }

    proptest! {
        #[test]
        fn low_frequencies_use_multiplier_96(freq in 1..(DOUBLE_VCO_MAX + 95) / 96) {
            assert_eq!(VcoDivider::select(freq).multiplier, 96);
        }

        #[test]
        fn multiplier_never_increases(freqs in prop::collection::vec(1..2_000_000_u32, 2..32)) {
            let sorted: Vec<u32> = freqs.into_iter().sorted().collect();
            for (lo, hi) in sorted.iter().tuple_windows() {
                assert!(VcoDivider::select(*lo).multiplier >= VcoDivider::select(*hi).multiplier);
            }
        }

        #[test]
        fn selected_row_stays_below_ceiling(freq in 1..2_000_000_u32) {
            let d = VcoDivider::select(freq);
            if d.multiplier != 4 {
                assert!(freq * u32::from(d.multiplier) < DOUBLE_VCO_MAX);
            }
            // and the next larger multiplier would not have fit
            if let Some(prev) = VCO_DIVIDERS.iter().rev().find(|r| r.multiplier > d.multiplier) {
                assert!(freq * u32::from(prev.multiplier) >= DOUBLE_VCO_MAX);
            }
        }

        #[test]
        fn deterministic(freq in 1..1_000_000_u32, bw: Bandwidth, clock in 10_000_000..60_000_000_u32) {
            let request = TuningRequest { freq, bandwidth: bw, reference_clock: clock };
            assert_eq!(SynthPlan::new(&request).unwrap(), SynthPlan::new(&request).unwrap());
        }

        #[test]
        fn band_forced_high(freq in 1..1_000_000_u32, bw: Bandwidth) {
            assert!(plan(freq, bw).vco_band_is_high());
        }

        #[test]
        fn fractional_recovers_remainder(freq in 1..1_000_000_u32, clock in 10_000_000..60_000_000_u32) {
            let half = to_khz(clock) / 2;
            let double_vco = freq * u32::from(VcoDivider::select(freq).multiplier);
            let code = fractional(double_vco, half);
            // wraparound applied exactly once: bit 15 mirrors bit 14
            assert_eq!(code >> 15, (code >> 14) & 1);
            let c = u32::from(code & 0x7FFF);
            assert_eq!((c * half).div_ceil(1 << 15), double_vco % half);
        }

        #[test]
        fn divider_counts(freq in 2_000..1_000_000_u32) {
            let p = plan(freq, Bandwidth::Mhz8);
            assert!((2..=9).contains(&p.divider_a));
            let double_vco = freq * u32::from(p.multiplier);
            let xdiv = u32::from(p.divider_m) * 8 + u32::from(p.divider_a);
            // round half up of double_vco / 14_400
            assert_eq!(xdiv, (double_vco + 7_200) / 14_400);
        }
    }
}
