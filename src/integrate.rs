//! Spectral integration of a hyperspectral cube into CIE XYZ.
//!
//! Each pixel's tristimulus value is a weighted sum over bands,
//! `X = s_x Σ_c r_c · x̄(λ_c) · Δλ_c` (likewise Y, Z), where `Δλ_c` are
//! trapezoid weights so that unevenly spaced bands are integrated correctly.
//! Every channel is divided by `Σ_c ȳ(λ_c) · Δλ_c`; what happens after that
//! depends on the [`Normalization`].

use log::trace;
use ndarray::{Array3, ArrayView3, Axis, Zip};
use palette::chromatic_adaptation::adaptation_matrix;
use palette::convert::{Convert, Matrix3};
use palette::lms::matrix::Bradford;
use palette::white_point::{D65, E};
use palette::Xyz;
use serde::{Deserialize, Serialize};

use crate::cmf::CorrectedCmf;
use crate::error::{Error, Result};
use crate::interp::check_strictly_increasing;

/// How integrated sums are scaled to XYZ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `Σ ȳ Δλ` scaling, then a white balance that maps the observer's
    /// equal-energy white to D65 (Bradford). X and Z are first rescaled by the
    /// full table's `∫ȳ / ∫x̄` and `∫ȳ / ∫z̄`, which are constants of the
    /// standard, so the hue of a pixel never depends on which part of the
    /// spectrum the wavelength vector happens to cover. A flat spectrum over
    /// the whole table renders as a neutral grey.
    #[default]
    WhiteBalanced,
    /// Every channel divided by `Σ ȳ Δλ`, so a flat spectrum of value 1 has
    /// `Y = 1` and renders as the (slightly pink) equal-energy white.
    Luminance,
}

/// Trapezoid integration weight of each band.
///
/// Interior bands get half the distance between their neighbours, the end
/// bands half the distance to their only neighbour. A single band gets 1.
pub fn trapezoid_weights(wavelengths: &[f64]) -> Vec<f64> {
    let n = wavelengths.len();
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n)
            .map(|c| {
                let left = if c == 0 { wavelengths[0] } else { wavelengths[c - 1] };
                let right = if c == n - 1 {
                    wavelengths[n - 1]
                } else {
                    wavelengths[c + 1]
                };
                0.5 * (right - left)
            })
            .collect(),
    }
}

/// Check the cube against the wavelength vector: channel count must match
/// and every value must lie in `[0, 1]`.
pub fn validate_cube(cube: &ArrayView3<f64>, wavelengths: &[f64]) -> Result<()> {
    let channels = cube.len_of(Axis(2));
    if channels != wavelengths.len() {
        return Err(Error::ShapeMismatch {
            channels,
            wavelengths: wavelengths.len(),
        });
    }
    if let Some(((row, col, band), &value)) = cube
        .indexed_iter()
        .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
        return Err(Error::OutOfRange {
            value,
            row,
            col,
            band,
        });
    }
    Ok(())
}

/// Integrate `cube` (H, W, C) against `cmf` with the default normalisation.
pub fn integrate_to_xyz(
    cube: ArrayView3<f64>,
    wavelengths: &[f64],
    cmf: &CorrectedCmf,
) -> Result<Array3<f64>> {
    integrate_to_xyz_with(cube, wavelengths, cmf, Normalization::default())
}

/// Integrate `cube` (H, W, C) against `cmf`, producing an (H, W, 3) XYZ image.
///
/// Fails with `ShapeMismatch` or `OutOfRange` before any work is done, and
/// with `InvalidArgument` when `cmf` was built over a different wavelength
/// vector. A CMF that is zero over the whole vector yields zero channels,
/// never NaN.
pub fn integrate_to_xyz_with(
    cube: ArrayView3<f64>,
    wavelengths: &[f64],
    cmf: &CorrectedCmf,
    normalization: Normalization,
) -> Result<Array3<f64>> {
    check_strictly_increasing(wavelengths, "wavelength vector")?;
    validate_cube(&cube, wavelengths)?;
    if cmf.wavelengths() != wavelengths {
        return Err(Error::InvalidArgument(format!(
            "colour-matching function was built over {} wavelengths [{}, {}] nm, \
             cube has {} [{}, {}] nm",
            cmf.wavelengths().len(),
            cmf.wavelengths()[0],
            cmf.wavelengths()[cmf.wavelengths().len() - 1],
            wavelengths.len(),
            wavelengths[0],
            wavelengths[wavelengths.len() - 1],
        )));
    }
    let (h, w, c) = cube.dim();
    trace!("integrating {h}x{w}x{c} cube against {}", cmf.standard());

    let weights = trapezoid_weights(wavelengths);
    let kernel: Vec<[f64; 3]> = wavelengths
        .iter()
        .zip(&weights)
        .map(|(&wl, &dw)| cmf.eval(wl).map(|v| v * dw))
        .collect();
    let scale = scale_factors(&kernel, cmf.table_areas(), normalization);
    let white_balance = match normalization {
        Normalization::WhiteBalanced => Some(equal_energy_to_d65()),
        Normalization::Luminance => None,
    };

    let mut xyz = Array3::<f64>::zeros((h, w, 3));
    Zip::from(xyz.lanes_mut(Axis(2)))
        .and(cube.lanes(Axis(2)))
        .par_for_each(|mut out, spectrum| {
            let mut acc = [0.0; 3];
            for (r, k) in spectrum.iter().zip(&kernel) {
                for ch in 0..3 {
                    acc[ch] += r * k[ch];
                }
            }
            let scaled =
                Xyz::<E, f64>::new(acc[0] * scale[0], acc[1] * scale[1], acc[2] * scale[2]);
            let adapted = match &white_balance {
                Some(matrix) => {
                    let d65: Xyz<D65, f64> = matrix.convert(scaled);
                    [d65.x, d65.y, d65.z]
                }
                None => [scaled.x, scaled.y, scaled.z],
            };
            for ch in 0..3 {
                out[ch] = adapted[ch];
            }
        });
    Ok(xyz)
}

fn equal_energy_to_d65() -> Matrix3<Xyz<E, f64>, Xyz<D65, f64>> {
    adaptation_matrix::<f64, E, D65, Bradford>(None, None)
}

/// Per-channel factors applied to the raw sums: `1 / Σ ȳ Δλ`, times the
/// table's equal-area correction when white balancing.
fn scale_factors(
    kernel: &[[f64; 3]],
    table_areas: [f64; 3],
    normalization: Normalization,
) -> [f64; 3] {
    let y_sum: f64 = kernel.iter().map(|k| k[1]).sum();
    let inv = |s: f64| if s > 0.0 { 1.0 / s } else { 0.0 };
    let per_y = inv(y_sum);
    match normalization {
        Normalization::WhiteBalanced => {
            let [ax, ay, az] = table_areas;
            [ay * inv(ax) * per_y, per_y, ay * inv(az) * per_y]
        }
        Normalization::Luminance => [per_y; 3],
    }
}
