//! Hyperspectral to RGB conversion.
//!
//! Architecture:
//! ```text
//!  cube (H, W, C) + wavelengths (C)
//!        │                 │
//!        │                 ▼
//!        │        ┌────────────────┐     ┌──────────────┐
//!        │        │      cmf        │ ◄── │   observer    │  CIE tables
//!        │        │ PCHIP + sensor  │     └──────────────┘
//!        │        │  compensation   │
//!        │        └────────────────┘
//!        ▼                 │
//!   ┌──────────────────────────┐
//!   │        integrate          │  trapezoid-weighted sums → XYZ (H, W, 3)
//!   └──────────────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  display  │  XYZ → linear sRGB → gamma → u8, BGR
//!   └──────────┘
//! ```
//!
//! [`reconstruct`] runs the whole chain with default options;
//! [`Reconstructor`] holds explicit [`ReconstructOptions`]. [`extract_band`]
//! is a diagnostic side path that interpolates a single wavelength.

pub mod band;
pub mod cache;
pub mod cmf;
pub mod compensation;
pub mod display;
pub mod error;
pub mod integrate;
pub mod interp;
pub mod observer;
pub mod pipeline;

pub use band::extract_band;
pub use cmf::{build_corrected_cmf, build_corrected_cmf_with, cmf_samples, CorrectedCmf};
pub use compensation::{Compensation, SensorProfile};
pub use display::{swap_channels, xyz_to_display, xyz_to_display_with, ChannelOrder};
pub use error::{Error, Result};
pub use integrate::{integrate_to_xyz, integrate_to_xyz_with, Normalization};
pub use observer::{get_cmf_table, CmfSample, CmfTable, Standard};
pub use pipeline::{reconstruct, reconstruct_with, ReconstructOptions, Reconstructor};
