//! Shape checks run before any file I/O.

use crate::data::model::{Hemisphere, N_VERTICES_BILATERAL, N_VERTICES_LEFT, N_VERTICES_RIGHT};
use crate::data::parcellation::Parcellation;
use crate::error::{HemisphereLabel, ValidationError};

/// Reject empty arrays and infinities. NaN is allowed and renders as the
/// bottom of the colour scale.
pub fn check_values(values: &[f64]) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::Empty);
    }
    match values.iter().position(|v| v.is_infinite()) {
        Some(index) => Err(ValidationError::NonFinite {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Hemisphere implied by a dense array's length.
pub fn infer_dense_hemisphere(len: usize) -> Result<Option<Hemisphere>, ValidationError> {
    match len {
        N_VERTICES_BILATERAL => Ok(None),
        N_VERTICES_LEFT => Ok(Some(Hemisphere::Left)),
        N_VERTICES_RIGHT => Ok(Some(Hemisphere::Right)),
        len => Err(ValidationError::DenseLength {
            len,
            left: N_VERTICES_LEFT,
            right: N_VERTICES_RIGHT,
            bilateral: N_VERTICES_BILATERAL,
        }),
    }
}

/// Validate dense scalars and resolve their hemisphere.
///
/// The length alone decides the hemisphere; a declared one must agree.
pub fn check_dense(
    values: &[f64],
    declared: Option<Hemisphere>,
) -> Result<Option<Hemisphere>, ValidationError> {
    check_values(values)?;
    let inferred = infer_dense_hemisphere(values.len())?;
    match declared {
        Some(d) if inferred != Some(d) => Err(ValidationError::HemisphereMismatch {
            declared: d,
            inferred: HemisphereLabel(inferred),
        }),
        _ => Ok(inferred),
    }
}

/// Validate parcel scalars against an atlas and resolve their hemisphere.
///
/// A full-length array is bilateral. A half-length array needs the caller
/// to say which side it covers, since both sides have the same count.
pub fn check_parcel(
    values: &[f64],
    declared: Option<Hemisphere>,
    parcellation: &Parcellation,
) -> Result<Option<Hemisphere>, ValidationError> {
    check_values(values)?;
    let len = values.len();
    let half = parcellation.n_regions / 2;

    if len == parcellation.n_regions {
        if let Some(d) = declared {
            return Err(ValidationError::HemisphereMismatch {
                declared: d,
                inferred: HemisphereLabel(None),
            });
        }
        return Ok(None);
    }

    if len == half {
        if parcellation.regions_per_hemisphere().is_none() {
            return Err(ValidationError::UnilateralUnsupported(
                parcellation.name.to_string(),
            ));
        }
        return declared
            .map(Some)
            .ok_or(ValidationError::HemisphereRequired { len });
    }

    Err(ValidationError::ParcelLength {
        parcellation: parcellation.name.to_string(),
        len,
        bilateral: parcellation.n_regions,
        unilateral: half,
    })
}
