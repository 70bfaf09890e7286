//! Wavelength-corrected colour-matching functions.
//!
//! The corrected CMF for a (standard, wavelength vector, compensation) triple
//! is the sum of two terms sampled at the vector's wavelengths:
//!
//! 1. the standard table's PCHIP interpolant, and
//! 2. the additive correction of [`crate::compensation`],
//!
//! each taken as zero wherever it is undefined, then refitted with PCHIP over
//! the wavelength vector.
//!
//! Wavelengths that fall outside the standard table's domain therefore get a
//! corrected value of zero on all three channels (unless the compensation
//! term covers them) and contribute nothing to integration. Such wavelengths
//! are reported by [`CorrectedCmf::uncovered`] and logged at `warn` level.

use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::cache::KeyedCache;
use crate::compensation::{channel_areas, Compensation};
use crate::error::Result;
use crate::interp::{check_strictly_increasing, Pchip};
use crate::observer::{self, CmfSample, Standard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CmfKey {
    standard: Standard,
    compensation: String,
    wavelengths: Vec<u64>,
}

/// Corrected CMFs by (standard, compensation, wavelength vector).
///
/// Entries live for the rest of the process: every distinct wavelength vector
/// adds one. Callers rendering many differently sampled cubes should expect
/// the cache to grow with them.
static CORRECTED: Lazy<KeyedCache<CmfKey, CorrectedCmf>> = Lazy::new(KeyedCache::new);

// ---------------------------------------------------------------------------
// CorrectedCmf
// ---------------------------------------------------------------------------

/// Continuous x̄, ȳ, z̄ over the domain of a wavelength vector.
#[derive(Debug, Clone)]
pub struct CorrectedCmf {
    standard: Standard,
    wavelengths: Vec<f64>,
    channels: [Pchip; 3],
    table_domain: (f64, f64),
    table_areas: [f64; 3],
}

impl CorrectedCmf {
    pub fn standard(&self) -> Standard {
        self.standard
    }

    /// The wavelength vector the functions were built over.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// `[x̄, ȳ, z̄]` at `wavelength`; zero outside the vector's range.
    pub fn eval(&self, wavelength: f64) -> [f64; 3] {
        self.channels.each_ref().map(|p| p.eval_or_zero(wavelength))
    }

    /// `[x̄, ȳ, z̄]` at every wavelength of the vector, in order.
    pub fn samples(&self) -> Vec<[f64; 3]> {
        self.wavelengths.iter().map(|&w| self.eval(w)).collect()
    }

    /// Interpolant of one channel (0 = x̄, 1 = ȳ, 2 = z̄).
    pub fn channel(&self, channel: usize) -> &Pchip {
        &self.channels[channel]
    }

    /// Areas under x̄, ȳ, z̄ over the standard table's whole domain,
    /// independent of the wavelength vector.
    pub fn table_areas(&self) -> [f64; 3] {
        self.table_areas
    }

    /// Wavelengths of the vector outside the standard table's domain; the
    /// base CMF contributes nothing there.
    pub fn uncovered(&self) -> Vec<f64> {
        let (lo, hi) = self.table_domain;
        self.wavelengths
            .iter()
            .copied()
            .filter(|w| *w < lo || *w > hi)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Corrected CMF for a standard given by name, with no sensor compensation.
///
/// Fails with `InvalidArgument` for an unknown standard name or a wavelength
/// vector that is empty, non-finite or not strictly increasing.
pub fn build_corrected_cmf(standard_name: &str, wavelengths: &[f64]) -> Result<Arc<CorrectedCmf>> {
    build_corrected_cmf_with(standard_name.parse()?, wavelengths, &Compensation::None)
}

/// Corrected CMF for `standard` over `wavelengths`, cached per distinct
/// (standard, compensation, wavelength vector).
pub fn build_corrected_cmf_with(
    standard: Standard,
    wavelengths: &[f64],
    compensation: &Compensation,
) -> Result<Arc<CorrectedCmf>> {
    check_strictly_increasing(wavelengths, "wavelength vector")?;
    let key = CmfKey {
        standard,
        compensation: compensation.cache_key(),
        wavelengths: wavelengths.iter().map(|w| w.to_bits()).collect(),
    };
    CORRECTED.get_or_try_init(&key, || construct(standard, wavelengths, compensation))
}

/// Rows `(wavelength, x̄, ȳ, z̄)` of the corrected CMF, for external plotting.
pub fn cmf_samples(
    standard: Standard,
    wavelengths: &[f64],
    compensation: &Compensation,
) -> Result<Vec<CmfSample>> {
    let cmf = build_corrected_cmf_with(standard, wavelengths, compensation)?;
    Ok(cmf
        .wavelengths()
        .iter()
        .zip(cmf.samples())
        .map(|(&wavelength, [x_bar, y_bar, z_bar])| CmfSample {
            wavelength,
            x_bar,
            y_bar,
            z_bar,
        })
        .collect())
}

fn construct(
    standard: Standard,
    wavelengths: &[f64],
    compensation: &Compensation,
) -> Result<CorrectedCmf> {
    debug!(
        "building corrected CMF: {standard}, {} bands [{}, {}] nm, compensation {}",
        wavelengths.len(),
        wavelengths[0],
        wavelengths[wavelengths.len() - 1],
        compensation.cache_key()
    );

    let table = observer::table(standard)?;
    let base = table.interpolants()?;
    let correction = compensation.correction(&table, wavelengths)?;

    let corrected = |c: usize| -> Vec<f64> {
        wavelengths
            .iter()
            .map(|&w| base[c].eval_or_zero(w) + correction[c].eval_or_zero(w))
            .collect()
    };
    let channels = [
        Pchip::new(wavelengths.to_vec(), corrected(0))?,
        Pchip::new(wavelengths.to_vec(), corrected(1))?,
        Pchip::new(wavelengths.to_vec(), corrected(2))?,
    ];

    let (lo, hi) = table.domain();
    let cmf = CorrectedCmf {
        standard,
        wavelengths: wavelengths.to_vec(),
        channels,
        table_domain: (lo, hi),
        table_areas: channel_areas(&base, lo, hi),
    };
    let uncovered = cmf.uncovered();
    if !uncovered.is_empty() {
        warn!(
            "{} of {} wavelengths lie outside the {standard} domain [{lo}, {hi}] nm \
             and carry no colour weight",
            uncovered.len(),
            wavelengths.len()
        );
    }
    Ok(cmf)
}
