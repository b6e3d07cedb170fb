use crate::config::*;
use tracing::debug;

/// Register values applied once at open, in this order. The trailing
/// writes to 0x0D, 0x11 and 0x15 repeat earlier ones and are needed anyway.
#[rustfmt::skip]
pub const INIT_SEQUENCE: [(u8, u8); 24] = [
    (0x01, 0x05), // RF_A
    (0x02, 0x10), // RF_M
    (0x03, 0x00), // RF_K_HIGH
    (0x04, 0x00), // RF_K_LOW
    (0x05, 0x0F), // RF_OUTDIV_A, output divider B off
    (0x06, 0x00), // divider 2, VCO slow, 8MHz
    (0x07, 0x20), // 28.8MHz crystal, overwritten below
    (0x08, 0xFF), // AGC clock /256, AGC gain 1/256, loop bandwidth 1/8
    (0x09, 0x6E), // disable loop through
    (0x0A, 0xB8), // disable LO test buffer
    (0x0B, 0x82),
    (0x0C, 0xFC), // AGC on
    (0x0D, 0x02), // AGC not forcing, LNA forcing
    (0x0E, 0x00),
    (0x0F, 0x00),
    (0x10, 0x00),
    (0x11, 0x00),
    (0x12, 0x1F), // secondary gain max
    (0x13, 0x17), // LNA gain Hi
    (0x14, 0x00),
    (0x15, 0x04), // LNA compensation
    (0x0D, 0x02),
    (0x11, 0x00),
    (0x15, 0x04),
];

pub fn write<B: Transport>(radio: &mut Registers<B>, xtal: XtalSpeed) -> Result<()> {
    for (addr, value) in INIT_SEQUENCE {
        radio.write_raw(addr, value)?;
    }
    radio.XTAL_SPEED().write(xtal)?;
    debug!(?xtal, "init sequence written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBus, Op};

    #[test]
    fn sequence_then_crystal() {
        let mut bus = MockBus::default();
        write(&mut Registers::new(&mut bus), XtalSpeed::Mhz36).unwrap();

        let writes = bus.writes();
        assert_eq!(writes.len(), 25);
        assert_eq!(writes[..24], INIT_SEQUENCE);
        assert_eq!(writes[24], (0x07, 0x00));
        assert!(bus.ops.iter().all(|op| matches!(op, Op::Write(..))));
    }

    #[test]
    fn crystal_28_8() {
        let mut bus = MockBus::default();
        write(&mut Registers::new(&mut bus), XtalSpeed::Mhz28_8).unwrap();
        assert_eq!(bus.writes_to(0x07), [0x20, 0x20]);
    }

    #[test]
    fn aborts_on_failed_write() {
        let mut bus = MockBus {
            fail_write: Some(10),
            ..Default::default()
        };
        let r = write(&mut Registers::new(&mut bus), XtalSpeed::Mhz28_8);
        assert!(matches!(r, Err(Error::Io(_))));
        assert_eq!(bus.writes(), INIT_SEQUENCE[..10]);
    }
}
