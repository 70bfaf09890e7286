//! Additive colour-matching corrections for acquisition devices.
//!
//! A camera that does not sample part of the visible range silently drops
//! the colour-matching weight of those wavelengths, which shifts hue (a
//! sensor starting at 450 nm loses most of z̄'s short-wavelength lobe). The
//! compensation table folds the unsampled CMF area back into the device's
//! outermost bands, so that trapezoid integration over the device grid sees
//! the full area of each channel.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interp::{check_strictly_increasing, Pchip};
use crate::observer::{CmfSample, CmfTable, Standard};

/// Wavelength step (nm) used to integrate the unsampled CMF area.
const AREA_STEP_NM: f64 = 1.0;

// ---------------------------------------------------------------------------
// SensorProfile – the native band layout of a device
// ---------------------------------------------------------------------------

/// Native spectral sampling of a hyperspectral camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorProfile {
    pub name: String,
    /// Centre of the first native band (nm).
    pub first_band_nm: f64,
    /// Centre of the last native band (nm).
    pub last_band_nm: f64,
    /// Nominal spacing between native bands (nm).
    pub band_step_nm: f64,
}

impl SensorProfile {
    /// CRi Nuance EX: 51 bands, 450–950 nm.
    pub fn nuance_ex() -> Self {
        Self {
            name: "nuance_ex".to_string(),
            first_band_nm: 450.0,
            last_band_nm: 950.0,
            band_step_nm: 10.0,
        }
    }

    /// Specim IQ: 204 bands, 397.32–1003.58 nm.
    pub fn specim_iq() -> Self {
        Self {
            name: "specim_iq".to_string(),
            first_band_nm: 397.32,
            last_band_nm: 1003.58,
            band_step_nm: (1003.58 - 397.32) / 203.0,
        }
    }

    /// Look up a built-in profile; `-` and `_` are interchangeable.
    pub fn builtin(name: &str) -> Result<Self> {
        match name.replace('-', "_").as_str() {
            "nuance_ex" => Ok(Self::nuance_ex()),
            "specim_iq" => Ok(Self::specim_iq()),
            _ => Err(Error::InvalidArgument(format!(
                "unknown sensor '{name}'; valid options are: nuance_ex, specim_iq"
            ))),
        }
    }

    /// Centres of the native bands.
    ///
    /// Fails with `InvalidArgument` for a layout that is non-finite, has a
    /// non-positive step or spans fewer than three bands.
    pub fn bands(&self) -> Result<Vec<f64>> {
        self.validate()?;
        let n = ((self.last_band_nm - self.first_band_nm) / self.band_step_nm).round() as usize;
        Ok((0..=n)
            .map(|i| self.first_band_nm + i as f64 * self.band_step_nm)
            .collect())
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.first_band_nm, self.last_band_nm, self.band_step_nm]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.band_step_nm <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "sensor {}: band layout must be finite with a positive step",
                self.name
            )));
        }
        if self.last_band_nm - self.first_band_nm < 2.0 * self.band_step_nm {
            return Err(Error::InvalidArgument(format!(
                "sensor {}: needs at least three bands between {} and {} nm",
                self.name, self.first_band_nm, self.last_band_nm
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Compensation – which correction to apply
// ---------------------------------------------------------------------------

/// Additive CMF correction selector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compensation {
    /// No correction; the corrected CMF is the interpolated standard table.
    #[default]
    None,
    /// Fold the CMF area the sensor cannot see into its edge bands.
    Sensor(SensorProfile),
}

/// Discrete correction samples `(wavelength, Δx̄, Δȳ, Δz̄)` for one standard.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationTable {
    pub standard: Standard,
    pub rows: Vec<CmfSample>,
}

impl Compensation {
    /// Build the discrete correction table for `cmf`'s standard.
    ///
    /// Area below the first band lands in a bump of height `2·A / step` at
    /// the first band, falling to zero one step inside; likewise above the
    /// last band. Trapezoid weights at the device's edge bands are `step / 2`,
    /// which restores exactly `A`.
    pub fn table(&self, cmf: &CmfTable) -> Result<CompensationTable> {
        let standard = cmf.standard;
        let profile = match self {
            Compensation::None => {
                return Ok(CompensationTable {
                    standard,
                    rows: Vec::new(),
                })
            }
            Compensation::Sensor(profile) => profile,
        };
        profile.validate()?;

        let base = cmf.interpolants()?;
        let (lo, hi) = cmf.domain();
        let step = profile.band_step_nm;
        let first = profile.first_band_nm;
        let last = profile.last_band_nm;

        let mut rows = Vec::with_capacity(4);
        if first > lo {
            let area = channel_areas(&base, lo, first.min(hi));
            rows.push(bump(first, area, step));
            rows.push(bump(first + step, [0.0; 3], step));
        }
        if last < hi {
            let area = channel_areas(&base, last.max(lo), hi);
            rows.push(bump(last - step, [0.0; 3], step));
            rows.push(bump(last, area, step));
        }
        // With exactly three bands both inner zero rows sit on the middle band.
        rows.dedup_by(|a, b| a.wavelength == b.wavelength);

        Ok(CompensationTable { standard, rows })
    }

    /// Correction interpolants over `wavelengths` (steps 3–4 of the
    /// corrector): the table is fitted, evaluated at every wavelength with
    /// out-of-domain points contributing zero, and refitted over
    /// `wavelengths`.
    pub fn correction(&self, cmf: &CmfTable, wavelengths: &[f64]) -> Result<[Pchip; 3]> {
        check_strictly_increasing(wavelengths, "wavelength vector")?;
        let table = self.table(cmf)?;

        let fitted: Option<[Pchip; 3]> = if table.rows.is_empty() {
            None
        } else {
            let wl: Vec<f64> = table.rows.iter().map(|r| r.wavelength).collect();
            let channel =
                |c: usize| -> Vec<f64> { table.rows.iter().map(|r| r.values()[c]).collect() };
            Some([
                Pchip::new(wl.clone(), channel(0))?,
                Pchip::new(wl.clone(), channel(1))?,
                Pchip::new(wl, channel(2))?,
            ])
        };

        let values = |c: usize| -> Vec<f64> {
            match &fitted {
                Some(f) => wavelengths.iter().map(|&w| f[c].eval_or_zero(w)).collect(),
                None => vec![0.0; wavelengths.len()],
            }
        };
        Ok([
            Pchip::new(wavelengths.to_vec(), values(0))?,
            Pchip::new(wavelengths.to_vec(), values(1))?,
            Pchip::new(wavelengths.to_vec(), values(2))?,
        ])
    }

    /// Stable textual identity used as part of cache keys.
    pub(crate) fn cache_key(&self) -> String {
        match self {
            Compensation::None => "none".to_string(),
            Compensation::Sensor(p) => format!(
                "sensor:{}:{:x}:{:x}:{:x}",
                p.name,
                p.first_band_nm.to_bits(),
                p.last_band_nm.to_bits(),
                p.band_step_nm.to_bits()
            ),
        }
    }
}

// -- helpers --

fn bump(wavelength: f64, area: [f64; 3], step: f64) -> CmfSample {
    let h = |a: f64| 2.0 * a / step;
    CmfSample {
        wavelength,
        x_bar: h(area[0]),
        y_bar: h(area[1]),
        z_bar: h(area[2]),
    }
}

/// Trapezoid area of each interpolant over `[from, to]`.
pub(crate) fn channel_areas(base: &[Pchip; 3], from: f64, to: f64) -> [f64; 3] {
    base.each_ref().map(|p| p.area(from, to, AREA_STEP_NM))
}
