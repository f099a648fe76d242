use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::data::model::Hemisphere;

pub type Result<T, E = PlotError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Input shape errors
// ---------------------------------------------------------------------------

/// Raised by the input validator before any file is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("scalar array is empty")]
    Empty,

    #[error("scalar array contains a non-finite value ({value}) at index {index}")]
    NonFinite { index: usize, value: f64 },

    #[error(
        "dense scalars have {len} values; expected {left} (left), {right} (right) \
         or {bilateral} (bilateral)"
    )]
    DenseLength {
        len: usize,
        left: usize,
        right: usize,
        bilateral: usize,
    },

    #[error(
        "{parcellation} scalars have {len} values; expected {bilateral} (bilateral) \
         or {unilateral} (one hemisphere)"
    )]
    ParcelLength {
        parcellation: String,
        len: usize,
        bilateral: usize,
        unilateral: usize,
    },

    #[error("{len} values match a single hemisphere, but no hemisphere was given")]
    HemisphereRequired { len: usize },

    #[error("array length implies {inferred}, but hemisphere {declared} was requested")]
    HemisphereMismatch {
        declared: Hemisphere,
        inferred: HemisphereLabel,
    },

    #[error("parcellation {0} does not support unilateral data")]
    UnilateralUnsupported(String),

    #[error("value range is inverted or not finite: ({min}, {max})")]
    InvalidRange { min: f64, max: f64 },
}

/// Display helper so the mismatch error can say "bilateral" for `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HemisphereLabel(pub Option<Hemisphere>);

impl std::fmt::Display for HemisphereLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(h) => write!(f, "{h}"),
            None => write!(f, "bilateral"),
        }
    }
}

// ---------------------------------------------------------------------------
// CIFTI container errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CiftiError {
    #[error("file is {0} bytes, too short for a NIfTI-2 header")]
    Truncated(usize),

    #[error("not a single-file NIfTI-2 image (bad magic)")]
    BadMagic,

    #[error("big-endian NIfTI-2 files are not supported")]
    BigEndian,

    #[error("malformed extension at byte {offset}: esize {esize}")]
    BadExtension { offset: usize, esize: i32 },

    #[error("unsupported datatype code {0}; only FLOAT32 data can be accessed")]
    UnsupportedDataType(i16),

    #[error("no CIFTI XML extension present")]
    MissingXml,

    #[error("CIFTI XML is not valid UTF-8")]
    XmlEncoding,

    #[error("CIFTI XML: {0}")]
    Xml(String),

    #[error("expected {expected} data elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("label key {0} not found in label table")]
    MissingLabel(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid {option}: {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    #[error("{path}: {source}")]
    Cifti {
        path: PathBuf,
        #[source]
        source: CiftiError,
    },

    #[error("settings file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("required asset missing: {0}")]
    MissingAsset(PathBuf),

    #[error("failed to unpack scene archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("could not launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("wb_command {subcommand} failed ({status}): {stderr}")]
    Workbench {
        subcommand: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("wb_command -show-scene exited successfully but wrote no image at {0}")]
    MissingOutput(PathBuf),

    #[error("image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PlotError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PlotError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn cifti(path: impl Into<PathBuf>, source: CiftiError) -> Self {
        PlotError::Cifti {
            path: path.into(),
            source,
        }
    }
}
