//! Scalar arrays → CIFTI files the bundled scene can display.

use std::collections::BTreeMap;
use std::path::Path;

use crate::cifti::label_table::{self, LabelColor};
use crate::cifti::CiftiFile;
use crate::color::Colormap;
use crate::data::model::{Hemisphere, ValueRange, N_VERTICES_BILATERAL, N_VERTICES_LEFT};
use crate::error::{PlotError, Result};
use crate::workbench::{PaletteSpec, Workbench};

// ---------------------------------------------------------------------------
// Parcellated scalars → label table
// ---------------------------------------------------------------------------

/// Label colour for each region: region `i` has label key `i + 1`.
pub fn parcel_colors(values: &[f64], cmap: &Colormap, range: &ValueRange) -> BTreeMap<u32, LabelColor> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let c = cmap.map(v, range);
            (i as u32 + 1, [c.red, c.green, c.blue, 1.0])
        })
        .collect()
}

/// Recolour the label table of `template` so each region shows its scalar,
/// and write the result to `fout`.
pub fn write_parcellated_image(
    template: &Path,
    values: &[f64],
    fout: &Path,
    cmap: &Colormap,
    range: &ValueRange,
) -> Result<()> {
    let mut file = CiftiFile::read(template).map_err(|e| read_error(template, e))?;
    let xml = file.cifti_xml().map_err(|e| PlotError::cifti(template, e))?;
    let recolored = label_table::recolor(xml, &parcel_colors(values, cmap, range))
        .map_err(|e| PlotError::cifti(template, e))?;
    file.set_cifti_xml(recolored)
        .map_err(|e| PlotError::cifti(template, e))?;
    file.write(fout).map_err(|e| PlotError::cifti(fout, e))?;

    log::debug!(
        "Wrote {} region colours ({} over [{}, {}]) to {}",
        values.len(),
        cmap.name,
        range.min,
        range.max,
        fout.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Dense scalars → grayordinate data + palette
// ---------------------------------------------------------------------------

/// Lay dense values out over both hemispheres (left first), zero-filling
/// the side that was not supplied.
pub fn pad_dense(values: &[f64], hemisphere: Option<Hemisphere>) -> Vec<f32> {
    let mut out = vec![0f32; N_VERTICES_BILATERAL];
    let offset = match hemisphere {
        Some(Hemisphere::Right) => N_VERTICES_LEFT,
        Some(Hemisphere::Left) | None => 0,
    };
    for (slot, &v) in out[offset..].iter_mut().zip(values) {
        *slot = v as f32;
    }
    out
}

/// Write dense values into a copy of `template` at `fout`, then have
/// Workbench attach `palette` to it.
pub fn write_dense_image(
    wb: &Workbench,
    template: &Path,
    values: &[f64],
    hemisphere: Option<Hemisphere>,
    fout: &Path,
    palette: &PaletteSpec<'_>,
) -> Result<()> {
    let mut file = CiftiFile::read(template).map_err(|e| read_error(template, e))?;
    file.set_scalars(&pad_dense(values, hemisphere))
        .map_err(|e| PlotError::cifti(template, e))?;
    file.write(fout).map_err(|e| PlotError::cifti(fout, e))?;
    log::debug!("Wrote {} dense scalars to {}", values.len(), fout.display());

    wb.cifti_palette(fout, palette)
}

fn read_error(path: &Path, e: crate::error::CiftiError) -> PlotError {
    match e {
        crate::error::CiftiError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            PlotError::MissingAsset(path.to_path_buf())
        }
        e => PlotError::cifti(path, e),
    }
}
