//! Audio output device management command.

use clap::{Args, Subcommand};
use malla_io::{default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available output devices
    List,
    /// Show the default output device
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("No audio output devices found.");
                return Ok(());
            }

            println!("Output Devices");
            println!("==============\n");
            for (idx, device) in devices.iter().enumerate() {
                println!("  [{}] {} ({} Hz)", idx, device.name, device.default_sample_rate);
            }
            println!();
            println!("Tip: pass a name or partial name to `malla run --output`.");
        }

        DevicesCommand::Info => {
            println!("Default Output Device");
            println!("======================\n");
            match default_device()? {
                Some(device) => {
                    println!("  Name:        {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                }
                None => println!("  None"),
            }
        }
    }

    Ok(())
}
