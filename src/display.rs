use ndarray::{Array3, ArrayView3, Axis, Zip};
use palette::convert::IntoColorUnclamped;
use palette::white_point::D65;
use palette::{LinSrgb, Srgb, Xyz};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Channel order of the 8-bit output
// ---------------------------------------------------------------------------

/// Channel order of the quantised output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    /// Blue, green, red: the convention of OpenCV-style consumers.
    #[default]
    Bgr,
    Rgb,
}

// ---------------------------------------------------------------------------
// XYZ → 8-bit sRGB
// ---------------------------------------------------------------------------

/// Map one XYZ triple (D65, Y = 1 for white) to 8-bit sRGB, in RGB order.
///
/// Steps: linear sRGB matrix, clip negative lobes, sRGB transfer curve, clip
/// to `[0, 1]`, scale to 255 and round. Out-of-gamut input is clipped, never
/// an error.
pub fn xyz_to_srgb8(xyz: [f64; 3]) -> [u8; 3] {
    let linear: LinSrgb<f64> = Xyz::<D65, f64>::new(xyz[0], xyz[1], xyz[2]).into_color_unclamped();
    let linear = LinSrgb::new(
        linear.red.max(0.0),
        linear.green.max(0.0),
        linear.blue.max(0.0),
    );
    let encoded: Srgb<f64> = Srgb::from_linear(linear);
    [encoded.red, encoded.green, encoded.blue].map(quantize)
}

fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert an (H, W, 3) XYZ image into an (H, W, 3) 8-bit BGR image.
pub fn xyz_to_display(xyz: ArrayView3<f64>) -> Result<Array3<u8>> {
    xyz_to_display_with(xyz, ChannelOrder::Bgr)
}

/// Convert an (H, W, 3) XYZ image into an 8-bit image in the given order.
///
/// The mapping is a pure per-pixel function: identical input always yields
/// identical bytes.
pub fn xyz_to_display_with(xyz: ArrayView3<f64>, order: ChannelOrder) -> Result<Array3<u8>> {
    let (h, w, c) = xyz.dim();
    if c != 3 {
        return Err(Error::InvalidArgument(format!(
            "tristimulus image must have 3 channels, got {c}"
        )));
    }

    let mut out = Array3::<u8>::zeros((h, w, 3));
    Zip::from(out.lanes_mut(Axis(2)))
        .and(xyz.lanes(Axis(2)))
        .par_for_each(|mut px, t| {
            let [r, g, b] = xyz_to_srgb8([t[0], t[1], t[2]]);
            let ordered = match order {
                ChannelOrder::Bgr => [b, g, r],
                ChannelOrder::Rgb => [r, g, b],
            };
            for (dst, src) in px.iter_mut().zip(ordered) {
                *dst = src;
            }
        });
    Ok(out)
}

/// Reverse the channel axis: RGB ↔ BGR.
pub fn swap_channels(image: ArrayView3<u8>) -> Array3<u8> {
    let mut swapped = image.to_owned();
    swapped.invert_axis(Axis(2));
    swapped.as_standard_layout().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr3, Array3};
    use palette::white_point::WhitePoint;

    fn d65() -> [f64; 3] {
        let w = <D65 as WhitePoint<f64>>::get_xyz();
        [w.x, w.y, w.z]
    }

    #[test]
    fn white_and_black() {
        assert_eq!(xyz_to_srgb8(d65()), [255, 255, 255]);
        assert_eq!(xyz_to_srgb8([0.0; 3]), [0, 0, 0]);
    }

    #[test]
    fn mid_grey_is_gamma_encoded() {
        let [r, g, b] = xyz_to_srgb8(d65().map(|v| v * 0.5));
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!((187..=188).contains(&r), "{r}");
    }

    #[test]
    fn negative_lobes_are_clipped() {
        // Pure Y lies outside the sRGB gamut: red and blue go negative.
        let [r, g, b] = xyz_to_srgb8([0.0, 0.5, 0.0]);
        assert_eq!(r, 0);
        assert_eq!(b, 0);
        assert!(g > 200);
    }

    #[test]
    fn bright_pixels_saturate() {
        assert_eq!(xyz_to_srgb8([5.0, 5.0, 5.0]), [255, 255, 255]);
    }

    #[test]
    fn output_is_bgr_by_default() {
        // XYZ of the sRGB red primary.
        let xyz = arr3(&[[[0.4124564, 0.2126729, 0.0193339]]]);
        let bgr = xyz_to_display(xyz.view()).unwrap();
        assert_eq!(bgr[[0, 0, 2]], 255);
        assert!(bgr[[0, 0, 0]] <= 1 && bgr[[0, 0, 1]] <= 1);

        let rgb = xyz_to_display_with(xyz.view(), ChannelOrder::Rgb).unwrap();
        assert_eq!(rgb, swap_channels(bgr.view()));
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let xyz = Array3::<f64>::zeros((2, 2, 4));
        assert!(matches!(
            xyz_to_display(xyz.view()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn deterministic() {
        let xyz = Array3::from_shape_fn((8, 8, 3), |(i, j, k)| {
            ((i * 31 + j * 7 + k * 3) % 17) as f64 / 12.0
        });
        let a = xyz_to_display(xyz.view()).unwrap();
        let b = xyz_to_display(xyz.view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn swap_is_an_involution() {
        let img = Array3::from_shape_fn((3, 2, 3), |(i, j, k)| (i * 6 + j * 3 + k) as u8);
        let swapped = swap_channels(img.view());
        assert_eq!(swapped[[1, 1, 0]], img[[1, 1, 2]]);
        assert_eq!(swap_channels(swapped.view()), img);
    }
}
