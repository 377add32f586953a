//! A small command-line runner for exercising the Pixardis facade from a
//! shell: compile a `.pix` file, load it into a VM, drive `step` until halt
//! or error, then dump the framebuffer as a PPM and the print buffer to
//! stdout (SPEC_FULL.md §11).

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use pixardis::{VmConfig, VmHandle};

#[derive(Parser, Debug)]
#[command(name = "pixardis-cli", about = "Compile and run a Pixardis program")]
struct Cli {
    /// Path to a `.pix` source file.
    source: PathBuf,

    /// Optional TOML config file (width, height, seed, cycles_per_step).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    cycles_per_step: Option<u32>,

    /// Stop after this many instructions total, even if the program never halts.
    #[arg(long, default_value_t = 1_000_000)]
    max_steps: u64,

    /// Where to write the final framebuffer as a binary PPM.
    #[arg(long, default_value = "out.ppm")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    debug!(?config, "resolved vm config");

    let source = fs::read_to_string(&cli.source)
        .with_context(|| format!("reading {}", cli.source.display()))?;

    let output = pixardis::compile(&source);
    if !output.success {
        for error in &output.errors {
            eprintln!("{error}\n");
        }
        bail!("compilation failed with {} error(s)", output.errors.len());
    }

    let mut vm = VmHandle::from_config(config);
    vm.load_program(&output.assembly).context("assembling generated code")?;

    let mut steps_run = 0u64;
    loop {
        let outcome = vm.step(config.cycles_per_step);
        steps_run += config.cycles_per_step as u64;
        if !outcome.success {
            bail!("runtime error: {}", outcome.error.unwrap_or_default());
        }
        if vm.is_halted() || steps_run >= cli.max_steps {
            break;
        }
    }
    info!(steps_run, halted = vm.is_halted(), "execution finished");

    write_ppm(&cli.out, vm.get_framebuffer(), config.width, config.height)?;
    for line in vm.get_print_output() {
        println!("{line}");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<VmConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            VmConfig::from_toml(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => VmConfig::default(),
    };
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(cycles) = cli.cycles_per_step {
        config.cycles_per_step = cycles;
    }
    Ok(config)
}

fn write_ppm(path: &PathBuf, framebuffer: &[u8], width: u32, height: u32) -> Result<()> {
    let mut file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write!(file, "P6\n{width} {height}\n255\n")?;
    file.write_all(framebuffer)?;
    Ok(())
}
