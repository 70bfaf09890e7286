use thiserror::Error;

/// Failures raised by the conversion pipeline.
///
/// Every variant is reported before any output is produced. Out-of-gamut
/// colours are *not* errors: they are clipped by [`crate::display`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An argument outside its accepted set, e.g. an unknown standard name
    /// or a wavelength vector that is not strictly increasing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The cube's channel axis does not match the wavelength vector.
    #[error("shape mismatch: cube has {channels} channels but {wavelengths} wavelengths were given")]
    ShapeMismatch { channels: usize, wavelengths: usize },

    /// A cube value lies outside `[0, 1]` (NaN included).
    #[error("cube value {value} at (row {row}, col {col}, band {band}) is outside [0, 1]")]
    OutOfRange {
        value: f64,
        row: usize,
        col: usize,
        band: usize,
    },

    /// A single-wavelength query outside the sampled range.
    #[error("wavelength {wavelength} nm is outside the sampled range [{min}, {max}] nm")]
    OutOfDomain { wavelength: f64, min: f64, max: f64 },

    /// The embedded observer table for a standard could not be parsed.
    #[error("observer table {standard}: {message}")]
    TableParse { standard: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
