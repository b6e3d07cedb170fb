use anyhow::Result;
use clap::Parser;
use fc0012::config;
use std::fs::read_to_string;

#[derive(Parser)]
///Validates a toml tuner config
struct Args {
    file: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let contents = read_to_string(args.file)?;
    let config: config::Config = toml::from_str(&contents)?;

    println!("{:#?}", config);
    println!("bandwidth: {:?}, gain: {:?}", config.bandwidth(), config.gain_mode());
    Ok(())
}
