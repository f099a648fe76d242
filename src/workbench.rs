//! Connectome Workbench invocation and per-call scratch directories.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::error::{PlotError, Result};
use crate::scene::{SceneDescriptor, SCENE_FILE};

/// Default `-cifti-palette` mode: scale colours to data percentiles.
pub const DEFAULT_PALETTE_MODE: &str = "MODE_AUTO_SCALE_PERCENTAGE";

// ---------------------------------------------------------------------------
// Palette options
// ---------------------------------------------------------------------------

/// One word of a multi-argument option such as
/// `-thresholding THRESHOLD_TYPE_NORMAL THRESHOLD_TEST_SHOW_OUTSIDE -1 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteArg {
    Number(f64),
    Word(String),
}

impl PaletteArg {
    /// Numbers where the token parses as one, words otherwise.
    pub fn parse(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(n) => PaletteArg::Number(n),
            Err(_) => PaletteArg::Word(token.to_string()),
        }
    }
}

impl From<f64> for PaletteArg {
    fn from(n: f64) -> Self {
        PaletteArg::Number(n)
    }
}

impl From<&str> for PaletteArg {
    fn from(s: &str) -> Self {
        PaletteArg::Word(s.to_string())
    }
}

/// Value of one `-cifti-palette` option, e.g. `-disp-zero true` or
/// `-pos-user 0 2.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteValue {
    Bool(bool),
    Number(f64),
    /// Split on whitespace, one argument per word.
    Text(String),
    List(Vec<PaletteArg>),
}

impl PaletteValue {
    fn push_args(&self, out: &mut Vec<String>) {
        match self {
            PaletteValue::Bool(b) => out.push(b.to_string()),
            PaletteValue::Number(n) => out.push(n.to_string()),
            PaletteValue::Text(s) => out.extend(s.split_whitespace().map(str::to_string)),
            PaletteValue::List(items) => out.extend(items.iter().map(|item| match item {
                PaletteArg::Number(n) => n.to_string(),
                PaletteArg::Word(w) => w.clone(),
            })),
        }
    }
}

/// Bare option name: surrounding whitespace and leading dashes removed.
fn option_name(key: &str) -> &str {
    key.trim().trim_start_matches('-')
}

/// Extra `-cifti-palette` options keyed by bare option name, so
/// `disp-zero` and `-disp-zero` are the same entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, PaletteValue>",
    into = "BTreeMap<String, PaletteValue>"
)]
pub struct PaletteParams(BTreeMap<String, PaletteValue>);

impl PaletteParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set option `key` (dash optional), replacing any earlier value.
    pub fn insert(&mut self, key: &str, value: PaletteValue) -> Result<Option<PaletteValue>> {
        let name = option_name(key);
        if name.is_empty() {
            return Err(PlotError::InvalidOption {
                option: "palette_params",
                message: format!("'{key}' is not an option name"),
            });
        }
        Ok(self.0.insert(name.to_string(), value))
    }

    pub fn get(&self, key: &str) -> Option<&PaletteValue> {
        self.0.get(option_name(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PaletteValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl TryFrom<BTreeMap<String, PaletteValue>> for PaletteParams {
    type Error = String;

    /// Rejects keys that name the same option twice (`x` and `-x`).
    fn try_from(raw: BTreeMap<String, PaletteValue>) -> std::result::Result<Self, Self::Error> {
        let mut params = PaletteParams::new();
        for (key, value) in raw {
            if params.get(&key).is_some() {
                return Err(format!("palette option '{}' given twice", option_name(&key)));
            }
            params.insert(&key, value).map_err(|e| e.to_string())?;
        }
        Ok(params)
    }
}

impl From<PaletteParams> for BTreeMap<String, PaletteValue> {
    fn from(params: PaletteParams) -> Self {
        params.0
    }
}

/// Everything `-cifti-palette` needs besides the file itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteSpec<'a> {
    pub name: &'a str,
    pub mode: &'a str,
    pub params: &'a PaletteParams,
}

/// Arguments following `<cifti-in> <mode> <cifti-out>`.
pub fn palette_args(spec: &PaletteSpec<'_>) -> Vec<String> {
    let mut args = vec!["-palette-name".to_string(), spec.name.to_string()];
    for (name, value) in spec.params.iter() {
        args.push(format!("-{name}"));
        value.push_args(&mut args);
    }
    args
}

// ---------------------------------------------------------------------------
// wb_command runner
// ---------------------------------------------------------------------------

/// Handle on the `wb_command` executable.
#[derive(Debug, Clone)]
pub struct Workbench {
    program: PathBuf,
}

impl Workbench {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run one subcommand, failing on launch errors and non-zero exits.
    fn run(&self, subcommand: &str, args: &[OsString]) -> Result<()> {
        log::debug!(
            "{} {subcommand} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .arg(subcommand)
            .args(args)
            .output()
            .map_err(|source| PlotError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(PlotError::Workbench {
                subcommand: subcommand.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::debug!("wb_command {subcommand} stderr: {}", stderr.trim());
        }
        Ok(())
    }

    /// Render `scene` from `scene_file` into `output`.
    pub fn show_scene(&self, scene_file: &Path, scene: &SceneDescriptor, output: &Path) -> Result<()> {
        if output.exists() {
            std::fs::remove_file(output)
                .map_err(|e| PlotError::io(format!("removing stale {}", output.display()), e))?;
        }
        self.run(
            "-show-scene",
            &[
                scene_file.into(),
                scene.scene.to_string().into(),
                output.into(),
                scene.width.to_string().into(),
                scene.height.to_string().into(),
            ],
        )?;
        if !output.is_file() {
            return Err(PlotError::MissingOutput(output.to_path_buf()));
        }
        log::info!("Rendered {scene} to {}", output.display());
        Ok(())
    }

    /// Apply a palette to a dense scalar file in place.
    pub fn cifti_palette(&self, cifti: &Path, spec: &PaletteSpec<'_>) -> Result<()> {
        let mut args: Vec<OsString> = vec![cifti.into(), spec.mode.into(), cifti.into()];
        args.extend(palette_args(spec).into_iter().map(OsString::from));
        self.run("-cifti-palette", &args)
    }
}

// ---------------------------------------------------------------------------
// Scratch directory
// ---------------------------------------------------------------------------

/// Private working directory for one render, deleted on drop.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("wbplot-")
            .tempdir()
            .map_err(|e| PlotError::io("creating scratch directory", e))?;
        log::debug!("Scratch directory {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Copy a reference asset in under `name`.
    pub fn copy_asset(&self, source: &Path, name: &str) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(PlotError::MissingAsset(source.to_path_buf()));
        }
        let target = self.join(name);
        std::fs::copy(source, &target).map_err(|e| {
            PlotError::io(format!("copying {} to {}", source.display(), target.display()), e)
        })?;
        Ok(target)
    }

    /// Unpack the scene archive and return the path of the scene file.
    pub fn unpack_scene(&self, archive: &Path) -> Result<PathBuf> {
        let file = File::open(archive).map_err(|_| PlotError::MissingAsset(archive.to_path_buf()))?;
        let mut zip = zip::ZipArchive::new(file).map_err(|source| PlotError::Archive {
            path: archive.to_path_buf(),
            source,
        })?;
        zip.extract(self.path()).map_err(|source| PlotError::Archive {
            path: archive.to_path_buf(),
            source,
        })?;

        let scene_file = self.join(SCENE_FILE);
        if !scene_file.is_file() {
            return Err(PlotError::MissingAsset(scene_file));
        }
        Ok(scene_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_for(params: &PaletteParams) -> Vec<String> {
        palette_args(&PaletteSpec {
            name: "magma",
            mode: DEFAULT_PALETTE_MODE,
            params,
        })
    }

    #[test]
    fn palette_args_flatten_values() {
        let mut params = PaletteParams::new();
        params.insert("disp-zero", PaletteValue::Bool(true)).unwrap();
        params
            .insert("-inversion", PaletteValue::Text("POSITIVE_WITH_NEGATIVE".into()))
            .unwrap();
        params
            .insert("pos-user", PaletteValue::List(vec![0.0.into(), 2.5.into()]))
            .unwrap();
        assert_eq!(
            args_for(&params),
            [
                "-palette-name", "magma",
                "-disp-zero", "true",
                "-inversion", "POSITIVE_WITH_NEGATIVE",
                "-pos-user", "0", "2.5",
            ]
        );
    }

    #[test]
    fn dashed_and_bare_keys_are_one_option() {
        let mut params = PaletteParams::new();
        params.insert("disp-zero", PaletteValue::Bool(true)).unwrap();
        let previous = params.insert("-disp-zero", PaletteValue::Bool(false)).unwrap();
        assert_eq!(previous, Some(PaletteValue::Bool(true)));
        assert_eq!(params.len(), 1);
        assert_eq!(args_for(&params), ["-palette-name", "magma", "-disp-zero", "false"]);
        assert!(params.insert("--", PaletteValue::Bool(true)).is_err());
    }

    #[test]
    fn thresholding_mixes_words_and_numbers() {
        let expected = [
            "-palette-name", "magma",
            "-thresholding", "THRESHOLD_TYPE_NORMAL", "THRESHOLD_TEST_SHOW_OUTSIDE", "-1", "1",
        ];

        let mut params = PaletteParams::new();
        params
            .insert(
                "thresholding",
                PaletteValue::List(vec![
                    "THRESHOLD_TYPE_NORMAL".into(),
                    "THRESHOLD_TEST_SHOW_OUTSIDE".into(),
                    (-1.0).into(),
                    1.0.into(),
                ]),
            )
            .unwrap();
        assert_eq!(args_for(&params), expected);

        let mut params = PaletteParams::new();
        params
            .insert(
                "thresholding",
                PaletteValue::Text("THRESHOLD_TYPE_NORMAL THRESHOLD_TEST_SHOW_OUTSIDE -1 1".into()),
            )
            .unwrap();
        assert_eq!(args_for(&params), expected);
    }

    #[test]
    fn palette_values_deserialize_untagged() {
        let params: PaletteParams = serde_json::from_str(
            r#"{"disp-zero": true, "-pos-user": [0, 1],
                "thresholding": ["THRESHOLD_TYPE_NORMAL", "THRESHOLD_TEST_SHOW_OUTSIDE", -1, 1]}"#,
        )
        .unwrap();
        assert_eq!(params.get("disp-zero"), Some(&PaletteValue::Bool(true)));
        assert_eq!(
            params.get("pos-user"),
            Some(&PaletteValue::List(vec![0.0.into(), 1.0.into()]))
        );
        assert_eq!(args_for(&params).len(), 2 + 2 + 3 + 5);
    }

    #[test]
    fn duplicate_option_in_json_is_rejected() {
        let parsed = serde_json::from_str::<PaletteParams>(r#"{"disp-zero": true, "-disp-zero": false}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn scratch_directories_are_unique() {
        let a = Scratch::new().unwrap();
        let b = Scratch::new().unwrap();
        assert_ne!(a.path(), b.path());
        let kept = a.path().to_path_buf();
        drop(a);
        assert!(!kept.exists());
    }

    #[test]
    fn archive_without_scene_file_is_rejected() {
        let src = tempfile::tempdir().unwrap();
        let archive = src.path().join("scene.zip");
        let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("Other.scene", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<SceneFile/>").unwrap();
        zip.finish().unwrap();

        let scratch = Scratch::new().unwrap();
        assert!(matches!(
            scratch.unpack_scene(&archive),
            Err(PlotError::MissingAsset(p)) if p.ends_with(SCENE_FILE)
        ));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let wb = Workbench::new("/nonexistent/wb_command");
        let params = PaletteParams::new();
        let spec = PaletteSpec {
            name: "magma",
            mode: DEFAULT_PALETTE_MODE,
            params: &params,
        };
        assert!(matches!(
            wb.cifti_palette(Path::new("x.dscalar.nii"), &spec),
            Err(PlotError::Spawn { .. })
        ));
    }
}
