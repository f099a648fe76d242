use std::fmt;

use crate::data::model::{Hemisphere, Orientation, ScalarKind};

/// Scene file shipped inside the scene archive.
pub const SCENE_FILE: &str = "Human.scene";

/// One pre-authored camera setup in [`SCENE_FILE`] and its output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneDescriptor {
    /// 1-based scene index, as `wb_command -show-scene` accepts it.
    pub scene: u32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {} ({}x{})", self.scene, self.width, self.height)
    }
}

const fn entry(scene: u32, width: u32, height: u32) -> SceneDescriptor {
    SceneDescriptor {
        scene,
        width,
        height,
    }
}

const LANDSCAPE_UNILATERAL: (u32, u32) = (1200, 500);
const PORTRAIT_UNILATERAL: (u32, u32) = (730, 1200);
const BILATERAL: (u32, u32) = (1200, 810);

/// Orientation actually used for a request. Bilateral scenes exist only
/// in landscape, so a portrait request for bilateral data is downgraded.
pub fn effective_orientation(orientation: Orientation, hemisphere: Option<Hemisphere>) -> Orientation {
    match (orientation, hemisphere) {
        (Orientation::Portrait, None) => {
            log::warn!("portrait orientation is not available for bilateral data; using landscape");
            Orientation::Landscape
        }
        (o, _) => o,
    }
}

/// Map plotting parameters to the scene that renders them.
///
/// Every combination resolves; see [`effective_orientation`] for the one
/// that is adjusted.
pub fn map_params_to_scene(
    kind: ScalarKind,
    orientation: Orientation,
    hemisphere: Option<Hemisphere>,
) -> SceneDescriptor {
    use Hemisphere::*;
    use Orientation::*;

    let base = match kind {
        ScalarKind::Parcellated => 0,
        ScalarKind::Dense => 5,
    };
    let (offset, (width, height)) = match (hemisphere, effective_orientation(orientation, hemisphere)) {
        (Some(Left), Landscape) => (1, LANDSCAPE_UNILATERAL),
        (Some(Left), Portrait) => (2, PORTRAIT_UNILATERAL),
        (Some(Right), Landscape) => (3, LANDSCAPE_UNILATERAL),
        (Some(Right), Portrait) => (4, PORTRAIT_UNILATERAL),
        (None, _) => (5, BILATERAL),
    };
    entry(base + offset, width, height)
}
