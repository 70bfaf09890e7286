use std::sync::Arc;

use log::debug;
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::cmf::{build_corrected_cmf_with, CorrectedCmf};
use crate::compensation::Compensation;
use crate::display::{xyz_to_display_with, ChannelOrder};
use crate::error::{Error, Result};
use crate::integrate::{integrate_to_xyz_with, Normalization};
use crate::observer::Standard;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything that selects how a cube is rendered. Missing JSON fields take
/// their defaults: CIE 1931 2°, no compensation, white-balanced, BGR.
///
/// ```json
/// { "standard": "cie_10_1964",
///   "compensation": { "kind": "sensor", "name": "nuance_ex",
///                     "first_band_nm": 450, "last_band_nm": 950, "band_step_nm": 10 },
///   "normalization": "white_balanced",
///   "channel_order": "rgb" }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    pub standard: Standard,
    pub compensation: Compensation,
    pub normalization: Normalization,
    pub channel_order: ChannelOrder,
}

impl ReconstructOptions {
    /// Parse options from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::InvalidArgument(format!("reconstruct options: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Reconstructor
// ---------------------------------------------------------------------------

/// Renders hyperspectral cubes with a fixed set of options.
///
/// Stateless apart from the process-wide CMF caches, so one instance can be
/// shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    options: ReconstructOptions,
}

impl Reconstructor {
    pub fn new(options: ReconstructOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Corrected CMF for `wavelengths` under these options.
    pub fn corrected_cmf(&self, wavelengths: &[f64]) -> Result<Arc<CorrectedCmf>> {
        build_corrected_cmf_with(self.options.standard, wavelengths, &self.options.compensation)
    }

    /// Integrate `cube` to an (H, W, 3) XYZ image.
    pub fn tristimulus(&self, cube: ArrayView3<f64>, wavelengths: &[f64]) -> Result<Array3<f64>> {
        let cmf = self.corrected_cmf(wavelengths)?;
        integrate_to_xyz_with(cube, wavelengths, &cmf, self.options.normalization)
    }

    /// Render `cube` (H, W, C), normalised to `[0, 1]`, to an (H, W, 3)
    /// 8-bit image.
    pub fn reconstruct(&self, cube: ArrayView3<f64>, wavelengths: &[f64]) -> Result<Array3<u8>> {
        let (h, w, c) = cube.dim();
        debug!(
            "reconstructing {h}x{w} image from {c} bands with {}",
            self.options.standard
        );
        let xyz = self.tristimulus(cube, wavelengths)?;
        xyz_to_display_with(xyz.view(), self.options.channel_order)
    }
}

/// Render a normalised (H, W, C) cube to an 8-bit BGR image with the default
/// options.
pub fn reconstruct(cube: ArrayView3<f64>, wavelengths: &[f64]) -> Result<Array3<u8>> {
    Reconstructor::default().reconstruct(cube, wavelengths)
}

/// Render a normalised (H, W, C) cube with explicit options.
pub fn reconstruct_with(
    cube: ArrayView3<f64>,
    wavelengths: &[f64],
    options: &ReconstructOptions,
) -> Result<Array3<u8>> {
    Reconstructor::new(options.clone()).reconstruct(cube, wavelengths)
}
