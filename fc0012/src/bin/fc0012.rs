// Command line control of an FC0012 on a Linux I2C bus
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fc0012::config::{Bandwidth, Config, GainMode, Hz, KHz};
use fc0012::{linux, Tuner};
use std::{fs::read_to_string, path::PathBuf, str::FromStr};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
/// Flags override values from the config file
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// I2C device, e.g. /dev/i2c-1
    #[arg(short, long)]
    device: Option<PathBuf>,
    /// Reference clock in Hz
    #[arg(long)]
    clock: Option<Hz>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the chip id
    Probe,
    /// Load the power on registers, then apply frequency and gain from the config
    Init,
    /// Tune to a frequency in kHz
    Tune {
        freq: Option<KHz>,
        /// Channel bandwidth in MHz
        #[arg(short, long)]
        bandwidth: Option<u32>,
    },
    /// `auto`, `manual` or a gain in dB
    Gain {
        #[arg(allow_hyphen_values = true)]
        value: GainArg,
    },
    /// Print and decode registers 0x00-0x15
    Dump,
}

#[derive(Clone, Copy, Debug)]
enum GainArg {
    Mode(GainMode),
    Db(i32),
}

impl FromStr for GainArg {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "auto" => Ok(GainArg::Mode(GainMode::Automatic)),
            "manual" => Ok(GainArg::Mode(GainMode::Manual)),
            db => db
                .parse()
                .map(GainArg::Db)
                .map_err(|_| format!("expected auto, manual or dB, got {db:?}")),
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let contents =
                read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(clock) = args.clock {
        config.reference_clock = clock;
    }
    Ok(config)
}

fn apply_gain<B: fc0012::Transport>(tuner: &mut Tuner<B>, config: &Config) -> Result<()> {
    tuner.set_gain_mode(config.gain_mode())?;
    if let Some(db) = config.gain {
        let plan = tuner.set_gain(db)?;
        info!("gain {}dB: LNA {:?}, secondary {}", db, plan.lna, plan.secondary);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let bus = linux::open(&config.device)
        .with_context(|| format!("opening {}", config.device.display()))?;

    match args.command {
        Command::Probe => {
            let mut tuner = Tuner::new(bus, config.reference_clock);
            tuner.probe()?;
            println!("FC0012 on {}", config.device.display());
        }
        Command::Init => {
            let mut tuner = Tuner::open(bus, config.reference_clock)?;
            if let Some(freq) = config.frequency {
                let cal = tuner.set_frequency(freq, config.bandwidth())?;
                info!(?cal, "tuned to {}kHz", freq);
            }
            apply_gain(&mut tuner, &config)?;
        }
        Command::Tune { freq, bandwidth } => {
            let Some(freq) = freq.or(config.frequency) else {
                bail!("no frequency given and none in the config");
            };
            let bandwidth = bandwidth.map_or(config.bandwidth(), Bandwidth::from_mhz);
            let mut tuner = Tuner::new(bus, config.reference_clock);
            let cal = tuner.set_frequency(freq, bandwidth)?;
            println!(
                "{}kHz {:?}: VCO {:?} band, voltage 0x{:02X}{}",
                freq,
                bandwidth,
                cal.band,
                cal.voltage,
                if cal.corrected { ", band corrected" } else { "" }
            );
        }
        Command::Gain { value } => {
            let mut tuner = Tuner::new(bus, config.reference_clock);
            match value {
                GainArg::Mode(mode) => tuner.set_gain_mode(mode)?,
                GainArg::Db(db) => {
                    let plan = tuner.set_gain(db)?;
                    println!("LNA {:?}, secondary gain {}", plan.lna, plan.secondary);
                }
            }
        }
        Command::Dump => {
            let mut tuner = Tuner::new(bus, config.reference_clock);
            print!("{}", tuner.dump()?);
        }
    }
    Ok(())
}
