//! Public entry points: one per scalar flavour.
//!
//! ```text
//!  validate ─► encode ─► stage scratch dir ─► wb_command -show-scene ─► legend
//! ```
//! Everything up to the first file operation is a pure check, so bad input
//! never leaves files behind.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{check_workbench_palette, Colormap};
use crate::config::{Settings, DLABEL_FILE, DSCALAR_FILE};
use crate::data::model::{ColorbarPosition, Hemisphere, Orientation, ScalarKind, ValueRange};
use crate::data::parcellation::{self, map_unilateral_to_bilateral};
use crate::data::validate;
use crate::encode;
use crate::error::{PlotError, Result, ValidationError};
use crate::legend::{self, colorbar_layout, Figure, Legend};
use crate::scene::map_params_to_scene;
use crate::workbench::{PaletteParams, PaletteSpec, Scratch, Workbench, DEFAULT_PALETTE_MODE};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options for [`pscalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParcelOptions {
    /// Ignored for bilateral data, which is always landscape.
    pub orientation: Orientation,
    /// Side the scalars cover; `None` for bilateral data.
    pub hemisphere: Option<Hemisphere>,
    /// Colour-scale limits; the data's extrema when absent.
    pub vrange: Option<(f64, f64)>,
    pub cmap: String,
    /// Turn white background pixels transparent.
    pub transparent: bool,
    pub colorbar: bool,
    pub colorbar_position: ColorbarPosition,
    pub colorbar_labels: Option<Vec<String>>,
    pub parcellation: String,
}

impl Default for ParcelOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            hemisphere: None,
            vrange: None,
            cmap: "magma".to_string(),
            transparent: false,
            colorbar: true,
            colorbar_position: ColorbarPosition::Center,
            colorbar_labels: None,
            parcellation: parcellation::GLASSER.name.to_string(),
        }
    }
}

/// Options for [`dscalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseOptions {
    pub orientation: Orientation,
    /// Must agree with the array length when given.
    pub hemisphere: Option<Hemisphere>,
    /// Workbench palette name.
    pub palette: String,
    /// `-cifti-palette` mode, e.g. `MODE_USER_SCALE`.
    pub palette_mode: String,
    pub transparent: bool,
    /// Extra `-cifti-palette` options such as `disp-zero` or `inversion`.
    pub palette_params: PaletteParams,
}

impl Default for DenseOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            hemisphere: None,
            palette: "magma".to_string(),
            palette_mode: DEFAULT_PALETTE_MODE.to_string(),
            transparent: false,
            palette_params: PaletteParams::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Render parcellated scalars to the PNG `file_out` and return the
/// composited figure.
pub fn pscalar(
    settings: &Settings,
    file_out: &Path,
    pscalars: &[f64],
    opts: &ParcelOptions,
) -> Result<Figure> {
    let cmap = Colormap::by_name(&opts.cmap)?;
    let parcellation = parcellation::lookup(&opts.parcellation)?;
    let hemisphere = validate::check_parcel(pscalars, opts.hemisphere, parcellation)?;
    let range = resolve_range(opts.vrange, pscalars)?;
    check_png_path(file_out)?;
    let scene = map_params_to_scene(ScalarKind::Parcellated, opts.orientation, hemisphere);

    let scratch = Scratch::new()?;
    let bilateral = map_unilateral_to_bilateral(pscalars, hemisphere, parcellation);
    encode::write_parcellated_image(
        &settings.parcel_template(parcellation),
        &bilateral,
        &scratch.join(DLABEL_FILE),
        &cmap,
        &range,
    )?;
    // The scene references both files; only the label file matters here.
    scratch.copy_asset(&settings.dscalar_file(), DSCALAR_FILE)?;
    let scene_file = scratch.unpack_scene(&settings.scene_archive())?;

    Workbench::new(&settings.wb_command).show_scene(&scene_file, &scene, file_out)?;

    let legend = opts.colorbar.then(|| {
        Legend::new(
            cmap,
            range,
            opts.colorbar_labels.clone(),
            colorbar_layout(hemisphere, opts.colorbar_position),
        )
    });
    let font = legend.as_ref().and_then(|_| settings.load_font());
    legend::finish(file_out, opts.transparent, legend, font.as_ref())
}

/// Render dense scalars to the PNG `file_out` and return the figure.
///
/// Colouring is done by Workbench's palette, so no colorbar is drawn.
pub fn dscalar(
    settings: &Settings,
    file_out: &Path,
    dscalars: &[f64],
    opts: &DenseOptions,
) -> Result<Figure> {
    let palette = check_workbench_palette(&opts.palette)?;
    let hemisphere = validate::check_dense(dscalars, opts.hemisphere)?;
    check_png_path(file_out)?;
    let scene = map_params_to_scene(ScalarKind::Dense, opts.orientation, hemisphere);

    let wb = Workbench::new(&settings.wb_command);
    let scratch = Scratch::new()?;
    let spec = PaletteSpec {
        name: palette,
        mode: &opts.palette_mode,
        params: &opts.palette_params,
    };
    encode::write_dense_image(
        &wb,
        &settings.dscalar_file(),
        dscalars,
        hemisphere,
        &scratch.join(DSCALAR_FILE),
        &spec,
    )?;
    scratch.copy_asset(&settings.dlabel_file(), DLABEL_FILE)?;
    let scene_file = scratch.unpack_scene(&settings.scene_archive())?;

    wb.show_scene(&scene_file, &scene, file_out)?;
    legend::finish(file_out, opts.transparent, None, None)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_range(vrange: Option<(f64, f64)>, values: &[f64]) -> Result<ValueRange> {
    match vrange {
        Some(bounds) => Ok(ValueRange::try_from(bounds)?),
        None => ValueRange::observed(values).ok_or_else(|| {
            ValidationError::InvalidRange {
                min: f64::NAN,
                max: f64::NAN,
            }
            .into()
        }),
    }
}

fn check_png_path(path: &Path) -> Result<()> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        return Err(PlotError::InvalidOption {
            option: "file_out",
            message: format!("{} must end in .png", path.display()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_settings() -> Settings {
        Settings {
            data_dir: "/nonexistent/wbplot-data".into(),
            wb_command: "/nonexistent/wb_command".into(),
            font: None,
        }
    }

    #[test]
    fn invalid_dense_length_fails_before_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dense.png");
        let err = dscalar(&unreachable_settings(), &out, &[0.5; 1000], &DenseOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PlotError::Validation(ValidationError::DenseLength { len: 1000, .. })
        ));
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn invalid_parcel_length_fails_before_file_io() {
        let err = pscalar(
            &unreachable_settings(),
            Path::new("out.png"),
            &[0.0; 100],
            &ParcelOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::Validation(ValidationError::ParcelLength { .. })));
    }

    #[test]
    fn unknown_cmap_and_palette_are_rejected() {
        let opts = ParcelOptions {
            cmap: "rainbow-ish".into(),
            ..ParcelOptions::default()
        };
        assert!(matches!(
            pscalar(&unreachable_settings(), Path::new("o.png"), &[0.0; 360], &opts),
            Err(PlotError::InvalidOption { option: "cmap", .. })
        ));

        let opts = DenseOptions {
            palette: "rainbow-ish".into(),
            ..DenseOptions::default()
        };
        assert!(matches!(
            dscalar(&unreachable_settings(), Path::new("o.png"), &[0.0; 59412], &opts),
            Err(PlotError::InvalidOption { option: "palette", .. })
        ));
    }

    #[test]
    fn output_must_be_png() {
        assert!(check_png_path(Path::new("/tmp/brain.png")).is_ok());
        assert!(check_png_path(Path::new("/tmp/brain.PNG")).is_ok());
        assert!(check_png_path(Path::new("/tmp/brain.jpg")).is_err());
        assert!(check_png_path(Path::new("/tmp/brain")).is_err());
    }

    #[test]
    fn missing_assets_are_reported() {
        let err = pscalar(
            &unreachable_settings(),
            Path::new("out.png"),
            &[0.5; 360],
            &ParcelOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::MissingAsset(_)));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ParcelOptions =
            serde_json::from_str(r#"{"hemisphere": "left", "vrange": [0, 2], "colorbar_position": "bottom"}"#)
                .unwrap();
        assert_eq!(opts.hemisphere, Some(Hemisphere::Left));
        assert_eq!(opts.vrange, Some((0.0, 2.0)));
        assert_eq!(opts.cmap, "magma");
        assert!(opts.colorbar);

        let opts: DenseOptions =
            serde_json::from_str(r#"{"palette": "ROY-BIG-BL", "palette_params": {"disp-zero": true}}"#)
                .unwrap();
        assert_eq!(opts.palette_mode, DEFAULT_PALETTE_MODE);
        assert_eq!(opts.palette_params.len(), 1);
    }
}
