use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::interp::Pchip;

// ---------------------------------------------------------------------------
// Standard – the recognised CIE observers
// ---------------------------------------------------------------------------

/// A CIE standard observer, named as in the public API (`cie_2_1931`, ...).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Standard {
    #[default]
    #[serde(rename = "cie_2_1931")]
    Cie2_1931,
    #[serde(rename = "cie_10_1964")]
    Cie10_1964,
    #[serde(rename = "cie_2_2012")]
    Cie2_2012,
    #[serde(rename = "cie_10_2012")]
    Cie10_2012,
}

impl Standard {
    pub const ALL: [Standard; 4] = [
        Standard::Cie2_1931,
        Standard::Cie10_1964,
        Standard::Cie2_2012,
        Standard::Cie10_2012,
    ];

    /// Short name accepted by [`Standard::from_str`].
    pub fn name(self) -> &'static str {
        match self {
            Standard::Cie2_1931 => "cie_2_1931",
            Standard::Cie10_1964 => "cie_10_1964",
            Standard::Cie2_2012 => "cie_2_2012",
            Standard::Cie10_2012 => "cie_10_2012",
        }
    }

    /// Descriptive name, e.g. "CIE 1931 2 Degree Standard Observer".
    pub fn full_name(self) -> &'static str {
        match self {
            Standard::Cie2_1931 => "CIE 1931 2 Degree Standard Observer",
            Standard::Cie10_1964 => "CIE 1964 10 Degree Standard Observer",
            Standard::Cie2_2012 => "CIE 2012 2 Degree Standard Observer",
            Standard::Cie10_2012 => "CIE 2012 10 Degree Standard Observer",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Standard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Standard::ALL
            .into_iter()
            .find(|candidate| candidate.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Standard::ALL.iter().map(|s| s.name()).collect();
                Error::InvalidArgument(format!(
                    "unknown standard observer '{s}'; valid options are: {}",
                    valid.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// CmfSample / CmfTable – one standard's discrete colour-matching functions
// ---------------------------------------------------------------------------

/// One row of a colour-matching table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmfSample {
    /// Wavelength in nanometres.
    pub wavelength: f64,
    pub x_bar: f64,
    pub y_bar: f64,
    pub z_bar: f64,
}

impl CmfSample {
    pub fn values(&self) -> [f64; 3] {
        [self.x_bar, self.y_bar, self.z_bar]
    }
}

/// The discrete colour-matching functions of one standard observer.
///
/// Invariants (checked on load): wavelengths strictly increasing, all values
/// finite and non-negative.
#[derive(Debug, Clone)]
pub struct CmfTable {
    pub standard: Standard,
    samples: Vec<CmfSample>,
}

impl CmfTable {
    pub(crate) fn new(standard: Standard, samples: Vec<CmfSample>) -> Self {
        Self { standard, samples }
    }

    pub fn samples(&self) -> &[CmfSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.wavelength).collect()
    }

    /// Values of one channel (0 = x̄, 1 = ȳ, 2 = z̄).
    pub fn channel(&self, channel: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.values()[channel]).collect()
    }

    /// Closed wavelength range covered by the table.
    pub fn domain(&self) -> (f64, f64) {
        (
            self.samples[0].wavelength,
            self.samples[self.samples.len() - 1].wavelength,
        )
    }

    /// Shape-preserving interpolants of x̄, ȳ, z̄ over the table's domain.
    pub fn interpolants(&self) -> Result<[Pchip; 3]> {
        let wl = self.wavelengths();
        Ok([
            Pchip::new(wl.clone(), self.channel(0))?,
            Pchip::new(wl.clone(), self.channel(1))?,
            Pchip::new(wl, self.channel(2))?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for standard in Standard::ALL {
            assert_eq!(standard.name().parse::<Standard>().unwrap(), standard);
            assert_eq!(standard.to_string(), standard.name());
        }
    }

    #[test]
    fn unknown_name_lists_valid_set() {
        let err = "cie1931_2".parse::<Standard>().unwrap_err();
        match err {
            Error::InvalidArgument(msg) => {
                for standard in Standard::ALL {
                    assert!(msg.contains(standard.name()), "{msg}");
                }
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn serde_uses_short_names() {
        let json = serde_json::to_string(&Standard::Cie10_2012).unwrap();
        assert_eq!(json, "\"cie_10_2012\"");
        let back: Standard = serde_json::from_str("\"cie_10_1964\"").unwrap();
        assert_eq!(back, Standard::Cie10_1964);
    }
}
