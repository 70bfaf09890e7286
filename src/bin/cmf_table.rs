//! Print the corrected colour-matching functions as CSV, for plotting with
//! an external tool.
//!
//! ```text
//! cmf_table --standard cie_10_1964 --start 400 --end 700 --step 10 --sensor nuance-ex
//! ```

use std::io;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use hyper2rgb::{cmf_samples, Compensation, ReconstructOptions, SensorProfile, Standard};

#[derive(Debug, Parser)]
#[command(about = "Dump a corrected colour-matching function as CSV")]
struct Args {
    /// Standard observer: cie_2_1931 (default), cie_10_1964, cie_2_2012,
    /// cie_10_2012; overrides --config
    #[arg(long)]
    standard: Option<String>,

    /// First wavelength (nm)
    #[arg(long, default_value_t = 400.0)]
    start: f64,

    /// Last wavelength (nm)
    #[arg(long, default_value_t = 700.0)]
    end: f64,

    /// Wavelength step (nm)
    #[arg(long, default_value_t = 5.0)]
    step: f64,

    /// Built-in sensor compensation (nuance-ex, specim-iq); overrides --config
    #[arg(long)]
    sensor: Option<String>,

    /// Use the sensor's native bands instead of --start/--end/--step
    #[arg(long)]
    native_bands: bool,

    /// JSON options file (standard and compensation are taken from it)
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn wavelength_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !(end >= start) {
        bail!("invalid grid: start {start}, end {end}, step {step}");
    }
    let n = ((end - start) / step).floor() as usize;
    Ok((0..=n).map(|i| start + i as f64 * step).collect())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (mut standard, mut compensation) = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let opts = ReconstructOptions::from_json(&text).context("parsing options")?;
            (opts.standard, opts.compensation)
        }
        None => (Standard::default(), Compensation::None),
    };
    if let Some(name) = &args.standard {
        standard = name.parse().context("--standard")?;
    }
    if let Some(name) = &args.sensor {
        compensation = Compensation::Sensor(SensorProfile::builtin(name).context("--sensor")?);
    }

    let wavelengths = match (&compensation, args.native_bands) {
        (Compensation::Sensor(profile), true) => profile.bands().context("--native-bands")?,
        (Compensation::None, true) => bail!("--native-bands needs a sensor"),
        (_, false) => wavelength_grid(args.start, args.end, args.step)?,
    };
    info!(
        "{}: {} wavelengths, {}",
        standard.full_name(),
        wavelengths.len(),
        match &compensation {
            Compensation::None => "uncompensated".to_string(),
            Compensation::Sensor(p) => format!("compensated for {}", p.name),
        }
    );

    let rows = cmf_samples(standard, &wavelengths, &compensation)
        .context("building corrected colour-matching function")?;

    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for row in &rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}
