//! Display persisted-program metadata.

use clap::Args;
use malla_core::model::{HEIGHT, RADIX, WIDTH};

/// Display a persisted program's statistics.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the program file
    pub file: std::path::PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let model = malla_io::load_program(&args.file)?;

    let occupied_cells = model
        .map
        .iter()
        .flatten()
        .filter(|v| !v.is_none())
        .count();
    let powered_cells = model
        .map
        .iter()
        .flatten()
        .filter(|v| v.powered)
        .count();
    let occupied_registers = model.registers.iter().filter(|v| !v.is_none()).count();

    println!("File:               {}", args.file.display());
    println!("Grid:               {WIDTH}x{HEIGHT}");
    println!("Occupied cells:     {occupied_cells}");
    println!("Powered cells:      {powered_cells}");
    println!("Registers in use:   {occupied_registers}/{RADIX}");
    println!("Frame counter:      {}", model.frame);

    Ok(())
}
