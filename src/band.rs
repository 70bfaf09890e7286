use ndarray::{Array2, ArrayView3, Axis, Zip};

use crate::error::{Error, Result};
use crate::interp::{check_strictly_increasing, pchip_at};

/// Interpolate the single-band image at `wavelength` from an (H, W, C) cube.
///
/// Each pixel's spectrum is interpolated with PCHIP across the bands. The
/// query must lie within `[min, max]` of `wavelengths`; anything else fails
/// with `OutOfDomain` instead of extrapolating. At a band centre the band's
/// own values are returned unchanged.
///
/// Cube values are not range-checked here, so raw (unnormalised) cubes can
/// be inspected too.
pub fn extract_band(
    cube: ArrayView3<f64>,
    wavelengths: &[f64],
    wavelength: f64,
) -> Result<Array2<f64>> {
    check_strictly_increasing(wavelengths, "wavelength vector")?;
    let (h, w, channels) = cube.dim();
    if channels != wavelengths.len() {
        return Err(Error::ShapeMismatch {
            channels,
            wavelengths: wavelengths.len(),
        });
    }
    let (min, max) = (wavelengths[0], wavelengths[channels - 1]);
    if !(wavelength >= min && wavelength <= max) {
        return Err(Error::OutOfDomain {
            wavelength,
            min,
            max,
        });
    }

    // Exact band hit: copy the slice, no interpolation error at all.
    if let Some(band) = wavelengths.iter().position(|&wl| wl == wavelength) {
        return Ok(cube.index_axis(Axis(2), band).to_owned());
    }

    let mut image = Array2::<f64>::zeros((h, w));
    Zip::from(&mut image)
        .and(cube.lanes(Axis(2)))
        .par_for_each(|px, spectrum| {
            let value = match spectrum.as_slice() {
                Some(values) => pchip_at(wavelengths, values, wavelength),
                None => pchip_at(wavelengths, &spectrum.to_vec(), wavelength),
            };
            *px = value.unwrap_or(0.0);
        });
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn cube() -> (Array3<f64>, Vec<f64>) {
        let wl = vec![450.0, 500.0, 550.0, 600.0, 650.0];
        let cube = Array3::from_shape_fn((3, 4, 5), |(i, j, c)| {
            0.1 * c as f64 + 0.01 * (i * 4 + j) as f64
        });
        (cube, wl)
    }

    #[test]
    fn boundaries_return_boundary_bands() {
        let (cube, wl) = cube();
        let lo = extract_band(cube.view(), &wl, 450.0).unwrap();
        let hi = extract_band(cube.view(), &wl, 650.0).unwrap();
        assert_eq!(lo, cube.index_axis(Axis(2), 0));
        assert_eq!(hi, cube.index_axis(Axis(2), 4));
    }

    #[test]
    fn interpolates_between_bands() {
        let (cube, wl) = cube();
        // Spectra are linear in the band index, so PCHIP is exact.
        let img = extract_band(cube.view(), &wl, 525.0).unwrap();
        assert_eq!(img.dim(), (3, 4));
        for ((i, j), v) in img.indexed_iter() {
            let expected = 0.15 + 0.01 * (i * 4 + j) as f64;
            assert_relative_eq!(*v, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn outside_range_is_out_of_domain() {
        let (cube, wl) = cube();
        for q in [449.9, 650.1, f64::NAN] {
            assert!(matches!(
                extract_band(cube.view(), &wl, q),
                Err(Error::OutOfDomain { .. })
            ));
        }
    }

    #[test]
    fn shape_mismatch() {
        let (cube, _) = cube();
        assert!(matches!(
            extract_band(cube.view(), &[400.0, 500.0], 450.0),
            Err(Error::ShapeMismatch { channels: 5, wavelengths: 2 })
        ));
    }

    #[test]
    fn no_overshoot_on_sharp_peak() {
        let wl = vec![500.0, 510.0, 520.0, 530.0];
        let mut cube = Array3::<f64>::zeros((1, 1, 4));
        cube[[0, 0, 2]] = 1.0;
        for q in (0..=30).map(|i| 500.0 + i as f64) {
            let v = extract_band(cube.view(), &wl, q).unwrap()[[0, 0]];
            assert!((0.0..=1.0).contains(&v), "{v} at {q}");
        }
    }
}
