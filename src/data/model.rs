use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlotError, ValidationError};

// ---------------------------------------------------------------------------
// Anatomical constants (CIFTI 91k grayordinates on the 32k_fs_LR mesh)
// ---------------------------------------------------------------------------

/// Cortical grayordinates of the left hemisphere (medial wall excluded).
pub const N_VERTICES_LEFT: usize = 29696;
/// Cortical grayordinates of the right hemisphere (medial wall excluded).
pub const N_VERTICES_RIGHT: usize = 29716;
/// Both hemispheres, left first.
pub const N_VERTICES_BILATERAL: usize = N_VERTICES_LEFT + N_VERTICES_RIGHT;

// ---------------------------------------------------------------------------
// Hemisphere
// ---------------------------------------------------------------------------

/// Cortical half a scalar array covers. Bilateral data is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub fn as_str(self) -> &'static str {
        match self {
            Hemisphere::Left => "left",
            Hemisphere::Right => "right",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hemisphere {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Hemisphere::Left),
            "right" | "r" => Ok(Hemisphere::Right),
            other => Err(PlotError::InvalidOption {
                option: "hemisphere",
                message: format!("'{other}' is not one of left, right"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Orientation / colorbar placement / data kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    #[default]
    Landscape,
}

impl FromStr for Orientation {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(PlotError::InvalidOption {
                option: "orientation",
                message: format!("'{other}' is not one of portrait, landscape"),
            }),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// Where the colorbar sits. `Center` only applies to bilateral images,
/// whose two hemispheres leave room between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorbarPosition {
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// One value per atlas region.
    Parcellated,
    /// One value per surface vertex.
    Dense,
}

impl FromStr for ScalarKind {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parcellated" | "pscalar" => Ok(ScalarKind::Parcellated),
            "dense" | "dscalar" => Ok(ScalarKind::Dense),
            other => Err(PlotError::InvalidOption {
                option: "kind",
                message: format!("'{other}' is not one of parcellated, dense"),
            }),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Parcellated => f.write_str("parcellated"),
            ScalarKind::Dense => f.write_str("dense"),
        }
    }
}

// ---------------------------------------------------------------------------
// ValueRange
// ---------------------------------------------------------------------------

/// Data interval mapped onto the colormap's [0, 1] domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ValidationError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ValidationError::InvalidRange { min, max });
        }
        Ok(ValueRange { min, max })
    }

    /// Observed extrema of `values`, ignoring NaN. `None` when nothing is left.
    pub fn observed(values: &[f64]) -> Option<Self> {
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        (min <= max).then_some(ValueRange { min, max })
    }

    /// Position of `value` in the range, clamped to [0, 1].
    /// A degenerate range and NaN both map to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if value.is_nan() || span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// `n` evenly spaced values from `min` to `max` inclusive.
    pub fn linspace(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let step = (self.max - self.min) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i == n - 1 { self.max } else { self.min + step * i as f64 })
                    .collect()
            }
        }
    }
}

impl TryFrom<(f64, f64)> for ValueRange {
    type Error = ValidationError;

    fn try_from((min, max): (f64, f64)) -> Result<Self, Self::Error> {
        ValueRange::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_range_skips_nan() {
        let r = ValueRange::observed(&[f64::NAN, 2.0, -1.0, 5.0]).unwrap();
        assert_eq!(r, ValueRange { min: -1.0, max: 5.0 });
        assert!(ValueRange::observed(&[f64::NAN]).is_none());
    }

    #[test]
    fn normalize_clamps_outside_range() {
        let r = ValueRange::new(0.0, 2.0).unwrap();
        assert_eq!(r.normalize(0.0), 0.0);
        assert_eq!(r.normalize(2.0), 1.0);
        assert_eq!(r.normalize(1.0), 0.5);
        assert_eq!(r.normalize(-10.0), 0.0);
        assert_eq!(r.normalize(10.0), 1.0);
    }

    #[test]
    fn degenerate_range_maps_to_zero() {
        let r = ValueRange::new(3.0, 3.0).unwrap();
        assert_eq!(r.normalize(3.0), 0.0);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(ValueRange::new(1.0, 0.0).is_err());
        assert!(ValueRange::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn tuple_conversion_is_checked() {
        assert_eq!(ValueRange::try_from((0.0, 2.0)), Ok(ValueRange { min: 0.0, max: 2.0 }));
        assert!(matches!(
            ValueRange::try_from((2.0, 0.0)),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(ValueRange::try_from((f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn linspace_hits_both_ends() {
        let r = ValueRange::new(0.0, 1.0).unwrap();
        assert_eq!(r.linspace(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(r.linspace(1), vec![0.0]);
    }

    #[test]
    fn hemisphere_parses_case_insensitively() {
        assert_eq!("LEFT".parse::<Hemisphere>().unwrap(), Hemisphere::Left);
        assert!("both".parse::<Hemisphere>().is_err());
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn scalar_kind_accepts_file_flavours() {
        assert_eq!("dscalar".parse::<ScalarKind>().unwrap(), ScalarKind::Dense);
        assert_eq!("Parcellated".parse::<ScalarKind>().unwrap(), ScalarKind::Parcellated);
        assert!(matches!(
            "volume".parse::<ScalarKind>(),
            Err(PlotError::InvalidOption { option: "kind", .. })
        ));
    }
}
