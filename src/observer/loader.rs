use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;

use super::model::{CmfSample, CmfTable, Standard};
use crate::cache::KeyedCache;
use crate::error::{Error, Result};

/// Process-wide table cache, filled lazily and never evicted.
static TABLES: Lazy<KeyedCache<Standard, CmfTable>> = Lazy::new(KeyedCache::new);

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Fetch the discrete colour-matching table for a standard given by name.
///
/// Accepted names: `cie_2_1931`, `cie_10_1964`, `cie_2_2012`, `cie_10_2012`.
/// Anything else fails with [`Error::InvalidArgument`].
pub fn get_cmf_table(standard_name: &str) -> Result<Arc<CmfTable>> {
    table(standard_name.parse()?)
}

/// Fetch the table for `standard`, parsing it on first use.
pub fn table(standard: Standard) -> Result<Arc<CmfTable>> {
    TABLES.get_or_try_init(&standard, || {
        debug!("loading colour-matching table {}", standard.full_name());
        parse_table(standard, embedded_csv(standard))
    })
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Embedded table layout: header `wavelength,x_bar,y_bar,z_bar`, one row per
/// 5 nm sample.
fn embedded_csv(standard: Standard) -> &'static str {
    match standard {
        Standard::Cie2_1931 => include_str!("data/cie_2_1931.csv"),
        Standard::Cie10_1964 => include_str!("data/cie_10_1964.csv"),
        Standard::Cie2_2012 => include_str!("data/cie_2_2012.csv"),
        Standard::Cie10_2012 => include_str!("data/cie_10_2012.csv"),
    }
}

fn parse_table(standard: Standard, text: &str) -> Result<CmfTable> {
    let fail = |message: String| Error::TableParse {
        standard: standard.name().to_string(),
        message,
    };

    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let samples = reader
        .deserialize::<CmfSample>()
        .enumerate()
        .map(|(row, rec)| rec.map_err(|e| fail(format!("row {row}: {e}"))))
        .collect::<Result<Vec<_>>>()?;

    if samples.len() < 2 {
        return Err(fail(format!("only {} samples", samples.len())));
    }
    for (row, pair) in samples.windows(2).enumerate() {
        if pair[1].wavelength <= pair[0].wavelength {
            return Err(fail(format!(
                "row {}: wavelength {} does not increase",
                row + 1,
                pair[1].wavelength
            )));
        }
    }
    for (row, s) in samples.iter().enumerate() {
        if s.values().iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(fail(format!("row {row}: invalid value in {:?}", s.values())));
        }
    }

    Ok(CmfTable::new(standard, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_tables_are_well_formed() {
        for standard in Standard::ALL {
            let t = table(standard).unwrap();
            assert_eq!(t.standard, standard);
            assert!(t.len() > 80, "{standard}: {} rows", t.len());
            let wl = t.wavelengths();
            assert!(wl.windows(2).all(|w| w[1] > w[0]));
            for s in t.samples() {
                assert!(s.x_bar >= 0.0 && s.y_bar >= 0.0 && s.z_bar >= 0.0);
            }
        }
    }

    #[test]
    fn domains() {
        assert_eq!(table(Standard::Cie2_1931).unwrap().domain(), (380.0, 780.0));
        assert_eq!(table(Standard::Cie10_1964).unwrap().domain(), (380.0, 780.0));
        assert_eq!(table(Standard::Cie2_2012).unwrap().domain(), (390.0, 830.0));
        assert_eq!(table(Standard::Cie10_2012).unwrap().domain(), (390.0, 830.0));
    }

    #[test]
    fn luminosity_peaks_near_555() {
        let t = get_cmf_table("cie_2_1931").unwrap();
        let peak = t
            .samples()
            .iter()
            .max_by(|a, b| a.y_bar.total_cmp(&b.y_bar))
            .unwrap();
        assert_eq!(peak.wavelength, 555.0);
        assert_eq!(peak.y_bar, 1.0);
    }

    #[test]
    fn cached_tables_are_shared() {
        let a = get_cmf_table("cie_10_1964").unwrap();
        let b = table(Standard::Cie10_1964).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_name_is_invalid_argument() {
        assert!(matches!(
            get_cmf_table("cie_2_1932"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_decreasing_rows() {
        let csv = "wavelength,x_bar,y_bar,z_bar\n400,0.1,0.1,0.1\n395,0.1,0.1,0.1\n";
        assert!(matches!(
            parse_table(Standard::Cie2_1931, csv),
            Err(Error::TableParse { .. })
        ));
    }

    #[test]
    fn rejects_negative_values() {
        let csv = "wavelength,x_bar,y_bar,z_bar\n400,0.1,0.1,0.1\n405,-0.1,0.1,0.1\n";
        assert!(matches!(
            parse_table(Standard::Cie2_1931, csv),
            Err(Error::TableParse { .. })
        ));
    }
}
