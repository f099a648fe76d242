//! Brain-surface images of parcellated and dense scalars.
//!
//! Rendering is delegated to Connectome Workbench (`wb_command`): scalars
//! are encoded into the CIFTI files a bundled scene loads, the scene is
//! rendered to PNG, and a colorbar is composited on top.
//!
//! ```no_run
//! use std::path::Path;
//! use wbplot::{pscalar, ParcelOptions, Settings};
//!
//! let values: Vec<f64> = (0..360).map(|i| i as f64 / 359.0).collect();
//! let opts = ParcelOptions { vrange: Some((0.0, 1.0)), ..Default::default() };
//! let figure = pscalar(&Settings::default().with_env(), Path::new("glasser.png"), &values, &opts)?;
//! println!("{:?}", figure.legend.map(|l| l.labels));
//! # Ok::<(), wbplot::PlotError>(())
//! ```

pub mod cifti;
pub mod color;
pub mod config;
pub mod data;
pub mod encode;
pub mod error;
pub mod legend;
pub mod plot;
pub mod scene;
pub mod workbench;

pub use config::Settings;
pub use data::model::{ColorbarPosition, Hemisphere, Orientation, ScalarKind, ValueRange};
pub use error::{CiftiError, PlotError, ValidationError};
pub use legend::{Figure, Legend};
pub use plot::{dscalar, pscalar, DenseOptions, ParcelOptions};
