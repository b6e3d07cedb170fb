use crate::config::{init, Bandwidth, Calibration, GainMode, GainPlan, Hz, KHz, SynthPlan, TuningRequest};
use crate::dump::RegisterDump;
use crate::*;
use tracing::{debug, info};

/// Content of register 0x00 on every FC0012
pub const CHIP_ID: u8 = 0xA1;

/// An FC0012 behind a register transport.
///
/// Only the reference clock is kept between calls, every operation works
/// from the request it is given and the chip's own registers.
pub struct Tuner<B> {
    radio: Registers<B>,
    reference_clock: Hz,
}

impl<B: Transport> Tuner<B> {
    /// Wrap a transport without touching the chip
    pub fn new(bus: B, reference_clock: Hz) -> Self {
        Self {
            radio: Registers::new(bus),
            reference_clock,
        }
    }

    /// Check the chip id and load the initial register set.
    pub fn open(bus: B, reference_clock: Hz) -> Result<Self> {
        let mut tuner = Self::new(bus, reference_clock);
        tuner.probe()?;
        tuner.init()?;
        Ok(tuner)
    }

    pub fn probe(&mut self) -> Result<()> {
        let id = self.radio.CHIP_ID().read()?;
        if id != CHIP_ID {
            return Err(Error::ChipId(id));
        }
        info!("found FC0012");
        Ok(())
    }

    pub fn init(&mut self) -> Result<()> {
        let xtal = XtalSpeed::from_reference(self.reference_clock);
        init::write(&mut self.radio, xtal)?;
        info!(reference_clock = self.reference_clock, ?xtal, "FC0012 initialised");
        Ok(())
    }

    #[must_use]
    pub fn reference_clock(&self) -> Hz {
        self.reference_clock
    }

    /// Tune the PLL. Nothing is written if the request is rejected.
    pub fn set_frequency(&mut self, freq: KHz, bandwidth: Bandwidth) -> Result<Calibration> {
        let plan = SynthPlan::new(&TuningRequest {
            freq,
            bandwidth,
            reference_clock: self.reference_clock,
        })?;
        let calibration = plan.write(&mut self.radio)?;
        info!(freq, ?bandwidth, "tuned");
        Ok(calibration)
    }

    pub fn set_gain_mode(&mut self, mode: GainMode) -> Result<()> {
        mode.write(&mut self.radio)
    }

    /// Set the gain closest to `db`. Only sticks while AGC is off.
    pub fn set_gain(&mut self, db: i32) -> Result<GainPlan> {
        let plan = GainPlan::new(db);
        debug!(db, ?plan, "gain");
        plan.write(&mut self.radio)?;
        Ok(plan)
    }

    pub fn dump(&mut self) -> Result<RegisterDump> {
        RegisterDump::read(&mut self.radio)
    }

    /// Typed access for anything the operations above do not cover
    pub fn registers(&mut self) -> &mut Registers<B> {
        &mut self.radio
    }

    pub fn into_inner(self) -> B {
        self.radio.into_inner()
    }
}
