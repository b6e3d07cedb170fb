use anyhow::Result;
use fc0012::config::RTL2832_XTAL;
use fc0012::{linux, RX, TX, Tuner};

fn main() -> Result<()> {
    let bus = linux::open("/dev/i2c-1")?;
    let mut tuner = Tuner::new(bus, RTL2832_XTAL);

    tuner.probe()?;
    let radio = tuner.registers();
    println!("Chip ID: {:02X}", radio.CHIP_ID().read()?);
    println!("LNA gain: {:?}", radio.LNA_GAIN().read()?);
    radio.RSSI_CAL().write(0x6E)?;
    println!("RSSI_CAL: {:02X}", radio.RSSI_CAL().read()?);

    print!("{}", tuner.dump()?);
    Ok(())
}
