use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use serde::{Deserialize, Serialize};

use crate::data::parcellation::{Parcellation, GLASSER};
use crate::error::{PlotError, Result};

pub const ENV_DATA_DIR: &str = "WBPLOT_DATA_DIR";
pub const ENV_WB_COMMAND: &str = "WBPLOT_WB_COMMAND";
pub const ENV_FONT: &str = "WBPLOT_FONT";

/// Label file the bundled scene loads; its table is Glasser's.
pub const DLABEL_FILE: &str = "ImageParcellated.dlabel.nii";
/// Dense scalar file the bundled scene loads.
pub const DSCALAR_FILE: &str = "ImageDense.dscalar.nii";
/// Archive holding the scene file and the surfaces it references.
pub const SCENE_ARCHIVE: &str = "scene.zip";

/// Searched in order when no font is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Where the reference assets, the renderer and the legend font live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the template CIFTI files and the scene archive.
    pub data_dir: PathBuf,
    /// `wb_command` executable; a bare name is looked up on `PATH`.
    pub wb_command: PathBuf,
    /// TrueType font for colorbar labels.
    pub font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            wb_command: PathBuf::from("wb_command"),
            font: None,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PlotError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&text).map_err(|source| PlotError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `WBPLOT_*` environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Some(dir) = std::env::var_os(ENV_DATA_DIR) {
            self.data_dir = dir.into();
        }
        if let Some(cmd) = std::env::var_os(ENV_WB_COMMAND) {
            self.wb_command = cmd.into();
        }
        if let Some(font) = std::env::var_os(ENV_FONT) {
            self.font = Some(font.into());
        }
        self
    }

    pub fn dlabel_file(&self) -> PathBuf {
        self.data_dir.join(DLABEL_FILE)
    }

    pub fn dscalar_file(&self) -> PathBuf {
        self.data_dir.join(DSCALAR_FILE)
    }

    pub fn scene_archive(&self) -> PathBuf {
        self.data_dir.join(SCENE_ARCHIVE)
    }

    /// Label file to recolour for `parcellation`.
    pub fn parcel_template(&self, parcellation: &Parcellation) -> PathBuf {
        if parcellation == &GLASSER {
            self.dlabel_file()
        } else {
            parcellation.dlabel_path(&self.data_dir)
        }
    }

    /// Load the configured font, or the first system font that parses.
    pub fn load_font(&self) -> Option<FontVec> {
        let candidates: Vec<&Path> = match &self.font {
            Some(p) => vec![p.as_path()],
            None => FONT_CANDIDATES.iter().map(Path::new).collect(),
        };
        for path in candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            match FontVec::try_from_vec(bytes) {
                Ok(font) => {
                    log::debug!("Using font {}", path.display());
                    return Some(font);
                }
                Err(e) => log::warn!("Ignoring font {}: {e}", path.display()),
            }
        }
        log::warn!("No usable font found; colorbar labels will be omitted");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"data_dir": "/opt/wbplot"}"#).unwrap();
        assert_eq!(s.data_dir, PathBuf::from("/opt/wbplot"));
        assert_eq!(s.wb_command, PathBuf::from("wb_command"));
        assert!(s.font.is_none());
        assert_eq!(s.scene_archive(), PathBuf::from("/opt/wbplot/scene.zip"));
    }

    #[test]
    fn glasser_uses_the_scene_label_file() {
        let s = Settings::default();
        assert_eq!(s.parcel_template(&GLASSER), PathBuf::from("data").join(DLABEL_FILE));
        let schaefer = crate::data::parcellation::lookup("SchaeferLG_200").unwrap();
        assert!(s
            .parcel_template(schaefer)
            .starts_with(PathBuf::from("data").join("HumanCorticalParcellations")));
    }

    #[test]
    fn missing_font_file_yields_none() {
        let s = Settings {
            font: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Settings::default()
        };
        assert!(s.load_font().is_none());
    }

    #[test]
    fn bad_settings_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::from_file(&path).unwrap_err();
        assert!(matches!(err, PlotError::Config { .. }));
    }
}
