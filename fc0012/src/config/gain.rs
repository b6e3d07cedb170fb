use crate::config::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SEC_GAIN_MAX: u8 = 0x1F;

/// Gain past this many dB goes into the secondary stage
const SEC_GAIN_FROM_DB: i32 = 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GainMode {
    Automatic,
    Manual,
}

struct Breakpoint {
    min_db: i32,
    lna: LnaGain,
}

/* Measured calibration points, checked top to bottom. Below the last one the
 * LNA is at Lowest. */
#[rustfmt::skip]
const LNA_BREAKPOINTS: [Breakpoint; 4] = [
    Breakpoint { min_db: 19, lna: LnaGain::Max },
    Breakpoint { min_db: 18, lna: LnaGain::Hi  },
    Breakpoint { min_db:  7, lna: LnaGain::Mid },
    Breakpoint { min_db: -4, lna: LnaGain::Low },
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GainPlan {
    pub lna: LnaGain,
    pub secondary: u8,
}

impl GainPlan {
    #[must_use]
    pub fn new(db: i32) -> Self {
        let lna = LNA_BREAKPOINTS
            .iter()
            .find(|b| db >= b.min_db)
            .map_or(LnaGain::Lowest, |b| b.lna);
        let secondary = match lna {
            LnaGain::Max => db
                .saturating_sub(SEC_GAIN_FROM_DB)
                .clamp(0, SEC_GAIN_MAX.into()) as u8,
            _ => 0,
        };
        Self { lna, secondary }
    }

    /// Settings restored when AGC takes over again
    #[must_use]
    pub fn automatic() -> Self {
        Self {
            lna: LnaGain::Max,
            secondary: SEC_GAIN_MAX,
        }
    }

    pub fn write<B: Transport>(&self, radio: &mut Registers<B>) -> Result<()> {
        radio.SEC_GAIN().write(self.secondary)?;
        radio.LNA_GAIN().write(self.lna)?;
        Ok(())
    }
}

impl GainMode {
    pub fn write<B: Transport>(self, radio: &mut Registers<B>) -> Result<()> {
        debug!(mode = ?self, "gain mode");
        match self {
            // Leave the gain stages where AGC had them
            GainMode::Manual => radio.AGC_MODE().write(AgcMode::Off),
            GainMode::Automatic => {
                GainPlan::automatic().write(radio)?;
                radio.AGC_MODE().write(AgcMode::On)
            }
        }
    }
}
