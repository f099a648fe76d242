use palette::{Mix, Srgb};

use crate::data::model::ValueRange;
use crate::error::PlotError;

// ---------------------------------------------------------------------------
// Colormap stops
// ---------------------------------------------------------------------------

/// Evenly spaced sRGB stops; colours between stops are interpolated.
type Stops = &'static [[u8; 3]];

const MAGMA: Stops = &[
    [0x00, 0x00, 0x04], [0x1c, 0x10, 0x44], [0x4f, 0x12, 0x7b],
    [0x81, 0x25, 0x81], [0xb5, 0x36, 0x7a], [0xe5, 0x59, 0x64],
    [0xfb, 0x87, 0x61], [0xfe, 0xc2, 0x87], [0xfc, 0xfd, 0xbf],
];

const VIRIDIS: Stops = &[
    [0x44, 0x01, 0x54], [0x47, 0x2d, 0x7b], [0x3b, 0x52, 0x8b],
    [0x2c, 0x72, 0x8e], [0x21, 0x91, 0x8c], [0x28, 0xae, 0x80],
    [0x5e, 0xc9, 0x62], [0xad, 0xdc, 0x30], [0xfd, 0xe7, 0x25],
];

const INFERNO: Stops = &[
    [0x00, 0x00, 0x04], [0x1f, 0x0c, 0x48], [0x55, 0x0f, 0x6d],
    [0x88, 0x22, 0x6a], [0xba, 0x36, 0x55], [0xe3, 0x59, 0x33],
    [0xf9, 0x8e, 0x09], [0xf9, 0xcb, 0x35], [0xfc, 0xff, 0xa4],
];

const PLASMA: Stops = &[
    [0x0d, 0x08, 0x87], [0x4c, 0x02, 0xa1], [0x7e, 0x03, 0xa8],
    [0xa9, 0x23, 0x95], [0xcc, 0x47, 0x78], [0xe5, 0x6b, 0x5d],
    [0xf8, 0x94, 0x41], [0xfd, 0xc3, 0x28], [0xf0, 0xf9, 0x21],
];

const CIVIDIS: Stops = &[
    [0x00, 0x20, 0x4d], [0x00, 0x33, 0x6f], [0x39, 0x48, 0x6b],
    [0x57, 0x5c, 0x6d], [0x70, 0x71, 0x73], [0x8a, 0x87, 0x79],
    [0xa6, 0x9d, 0x75], [0xc4, 0xb5, 0x6c], [0xfe, 0xe8, 0x38],
];

const COOLWARM: Stops = &[
    [0x3b, 0x4c, 0xc0], [0x62, 0x82, 0xea], [0x8d, 0xb0, 0xfe],
    [0xb8, 0xd0, 0xf9], [0xdd, 0xdc, 0xdc], [0xf5, 0xc4, 0xad],
    [0xf4, 0x9a, 0x7b], [0xde, 0x60, 0x4d], [0xb4, 0x04, 0x26],
];

const RDBU: Stops = &[
    [0x67, 0x00, 0x1f], [0xb2, 0x18, 0x2b], [0xd6, 0x60, 0x4d],
    [0xf4, 0xa5, 0x82], [0xfd, 0xdb, 0xc7], [0xf7, 0xf7, 0xf7],
    [0xd1, 0xe5, 0xf0], [0x92, 0xc5, 0xde], [0x43, 0x93, 0xc3],
    [0x21, 0x66, 0xac], [0x05, 0x30, 0x61],
];

const GREYS: Stops = &[
    [0xff, 0xff, 0xff], [0xf0, 0xf0, 0xf0], [0xd9, 0xd9, 0xd9],
    [0xbd, 0xbd, 0xbd], [0x96, 0x96, 0x96], [0x73, 0x73, 0x73],
    [0x52, 0x52, 0x52], [0x25, 0x25, 0x25], [0x00, 0x00, 0x00],
];

// ColorBrewer families and matplotlib's piecewise maps.

const REDS: Stops = &[
    [0xff, 0xf5, 0xf0], [0xfe, 0xe0, 0xd2], [0xfc, 0xbb, 0xa1],
    [0xfc, 0x92, 0x72], [0xfb, 0x6a, 0x4a], [0xef, 0x3b, 0x2c],
    [0xcb, 0x18, 0x1d], [0xa5, 0x0f, 0x15], [0x67, 0x00, 0x0d],
];

const BLUES: Stops = &[
    [0xf7, 0xfb, 0xff], [0xde, 0xeb, 0xf7], [0xc6, 0xdb, 0xef],
    [0x9e, 0xca, 0xe1], [0x6b, 0xae, 0xd6], [0x42, 0x92, 0xc6],
    [0x21, 0x71, 0xb5], [0x08, 0x51, 0x9c], [0x08, 0x30, 0x6b],
];

const GREENS: Stops = &[
    [0xf7, 0xfc, 0xf5], [0xe5, 0xf5, 0xe0], [0xc7, 0xe9, 0xc0],
    [0xa1, 0xd9, 0x9b], [0x74, 0xc4, 0x76], [0x41, 0xab, 0x5d],
    [0x23, 0x8b, 0x45], [0x00, 0x6d, 0x2c], [0x00, 0x44, 0x1b],
];

const ORANGES: Stops = &[
    [0xff, 0xf5, 0xeb], [0xfe, 0xe6, 0xce], [0xfd, 0xd0, 0xa2],
    [0xfd, 0xae, 0x6b], [0xfd, 0x8d, 0x3c], [0xf1, 0x69, 0x13],
    [0xd9, 0x48, 0x01], [0xa6, 0x36, 0x03], [0x7f, 0x27, 0x04],
];

const PURPLES: Stops = &[
    [0xfc, 0xfb, 0xfd], [0xef, 0xed, 0xf5], [0xda, 0xda, 0xeb],
    [0xbc, 0xbd, 0xdc], [0x9e, 0x9a, 0xc8], [0x80, 0x7d, 0xba],
    [0x6a, 0x51, 0xa3], [0x54, 0x27, 0x8f], [0x3f, 0x00, 0x7d],
];

const YLORRD: Stops = &[
    [0xff, 0xff, 0xcc], [0xff, 0xed, 0xa0], [0xfe, 0xd9, 0x76],
    [0xfe, 0xb2, 0x4c], [0xfd, 0x8d, 0x3c], [0xfc, 0x4e, 0x2a],
    [0xe3, 0x1a, 0x1c], [0xbd, 0x00, 0x26], [0x80, 0x00, 0x26],
];

const YLGNBU: Stops = &[
    [0xff, 0xff, 0xd9], [0xed, 0xf8, 0xb1], [0xc7, 0xe9, 0xb4],
    [0x7f, 0xcd, 0xbb], [0x41, 0xb6, 0xc4], [0x1d, 0x91, 0xc0],
    [0x22, 0x5e, 0xa8], [0x25, 0x34, 0x94], [0x08, 0x1d, 0x58],
];

const RDYLBU: Stops = &[
    [0xa5, 0x00, 0x26], [0xd7, 0x30, 0x27], [0xf4, 0x6d, 0x43],
    [0xfd, 0xae, 0x61], [0xfe, 0xe0, 0x90], [0xff, 0xff, 0xbf],
    [0xe0, 0xf3, 0xf8], [0xab, 0xd9, 0xe9], [0x74, 0xad, 0xd1],
    [0x45, 0x75, 0xb4], [0x31, 0x36, 0x95],
];

const RDYLGN: Stops = &[
    [0xa5, 0x00, 0x26], [0xd7, 0x30, 0x27], [0xf4, 0x6d, 0x43],
    [0xfd, 0xae, 0x61], [0xfe, 0xe0, 0x8b], [0xff, 0xff, 0xbf],
    [0xd9, 0xef, 0x8b], [0xa6, 0xd9, 0x6a], [0x66, 0xbd, 0x63],
    [0x1a, 0x98, 0x50], [0x00, 0x68, 0x37],
];

const SPECTRAL: Stops = &[
    [0x9e, 0x01, 0x42], [0xd5, 0x3e, 0x4f], [0xf4, 0x6d, 0x43],
    [0xfd, 0xae, 0x61], [0xfe, 0xe0, 0x8b], [0xff, 0xff, 0xbf],
    [0xe6, 0xf5, 0x98], [0xab, 0xdd, 0xa4], [0x66, 0xc2, 0xa5],
    [0x32, 0x88, 0xbd], [0x5e, 0x4f, 0xa2],
];

const PIYG: Stops = &[
    [0x8e, 0x01, 0x52], [0xc5, 0x1b, 0x7d], [0xde, 0x77, 0xae],
    [0xf1, 0xb6, 0xda], [0xfd, 0xe0, 0xef], [0xf7, 0xf7, 0xf7],
    [0xe6, 0xf5, 0xd0], [0xb8, 0xe1, 0x86], [0x7f, 0xbc, 0x41],
    [0x4d, 0x92, 0x21], [0x27, 0x64, 0x19],
];

const BRBG: Stops = &[
    [0x54, 0x30, 0x05], [0x8c, 0x51, 0x0a], [0xbf, 0x81, 0x2d],
    [0xdf, 0xc2, 0x7d], [0xf6, 0xe8, 0xc3], [0xf5, 0xf5, 0xf5],
    [0xc7, 0xea, 0xe5], [0x80, 0xcd, 0xc1], [0x35, 0x97, 0x8f],
    [0x01, 0x66, 0x5e], [0x00, 0x3c, 0x30],
];

const PUOR: Stops = &[
    [0x7f, 0x3b, 0x08], [0xb3, 0x58, 0x06], [0xe0, 0x82, 0x14],
    [0xfd, 0xb8, 0x63], [0xfe, 0xe0, 0xb6], [0xf7, 0xf7, 0xf7],
    [0xd8, 0xda, 0xeb], [0xb2, 0xab, 0xd2], [0x80, 0x73, 0xac],
    [0x54, 0x27, 0x88], [0x2d, 0x00, 0x4b],
];

const BWR: Stops = &[
    [0x00, 0x00, 0xff], [0xff, 0xff, 0xff], [0xff, 0x00, 0x00],
];

const SEISMIC: Stops = &[
    [0x00, 0x00, 0x4d], [0x00, 0x00, 0xff], [0xff, 0xff, 0xff],
    [0xff, 0x00, 0x00], [0x80, 0x00, 0x00],
];

const COOL: Stops = &[
    [0x00, 0xff, 0xff], [0xff, 0x00, 0xff],
];

const HOT: Stops = &[
    [0x0b, 0x00, 0x00], [0x34, 0x00, 0x00], [0x5e, 0x00, 0x00],
    [0x88, 0x00, 0x00], [0xb2, 0x00, 0x00], [0xdc, 0x00, 0x00],
    [0xff, 0x07, 0x00], [0xff, 0x30, 0x00], [0xff, 0x5a, 0x00],
    [0xff, 0x84, 0x00], [0xff, 0xae, 0x00], [0xff, 0xd8, 0x00],
    [0xff, 0xff, 0x04], [0xff, 0xff, 0x43], [0xff, 0xff, 0x81],
    [0xff, 0xff, 0xc0], [0xff, 0xff, 0xff],
];

const JET: Stops = &[
    [0x00, 0x00, 0x80], [0x00, 0x00, 0xc8], [0x00, 0x00, 0xff],
    [0x00, 0x40, 0xff], [0x00, 0x80, 0xff], [0x00, 0xbf, 0xff],
    [0x15, 0xff, 0xe2], [0x48, 0xff, 0xaf], [0x7b, 0xff, 0x7b],
    [0xaf, 0xff, 0x48], [0xe2, 0xff, 0x15], [0xff, 0xd2, 0x00],
    [0xff, 0x97, 0x00], [0xff, 0x5c, 0x00], [0xff, 0x21, 0x00],
    [0xc8, 0x00, 0x00], [0x80, 0x00, 0x00],
];

const GRAY: Stops = &[[0x00, 0x00, 0x00], [0xff, 0xff, 0xff]];

const COLORMAPS: &[(&str, Stops)] = &[
    ("magma", MAGMA),
    ("viridis", VIRIDIS),
    ("inferno", INFERNO),
    ("plasma", PLASMA),
    ("cividis", CIVIDIS),
    ("coolwarm", COOLWARM),
    ("RdBu", RDBU),
    ("Greys", GREYS),
    ("gray", GRAY),
    ("Reds", REDS),
    ("Blues", BLUES),
    ("Greens", GREENS),
    ("Oranges", ORANGES),
    ("Purples", PURPLES),
    ("YlOrRd", YLORRD),
    ("YlGnBu", YLGNBU),
    ("RdYlBu", RDYLBU),
    ("RdYlGn", RDYLGN),
    ("Spectral", SPECTRAL),
    ("PiYG", PIYG),
    ("BrBG", BRBG),
    ("PuOr", PUOR),
    ("bwr", BWR),
    ("seismic", SEISMIC),
    ("cool", COOL),
    ("hot", HOT),
    ("jet", JET),
];

/// Names accepted by [`Colormap::by_name`]; each also has a `_r` reversal.
pub fn colormap_names() -> impl Iterator<Item = &'static str> {
    COLORMAPS.iter().map(|(name, _)| *name)
}

// ---------------------------------------------------------------------------
// Colormap: normalized value → colour
// ---------------------------------------------------------------------------

/// A continuous colormap over [0, 1].
#[derive(Debug, Clone)]
pub struct Colormap {
    pub name: String,
    stops: Vec<Srgb<f32>>,
}

impl Colormap {
    /// Look up a colormap by name. A trailing `_r` reverses it.
    pub fn by_name(name: &str) -> Result<Self, PlotError> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let stops = COLORMAPS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(base))
            .map(|(_, stops)| *stops)
            .ok_or_else(|| PlotError::InvalidOption {
                option: "cmap",
                message: format!(
                    "unknown colormap '{name}'; known: {}",
                    colormap_names().collect::<Vec<_>>().join(", ")
                ),
            })?;

        let mut stops: Vec<Srgb<f32>> = stops
            .iter()
            .map(|&[r, g, b]| Srgb::new(r, g, b).into_format())
            .collect();
        if reversed {
            stops.reverse();
        }
        Ok(Colormap {
            name: name.to_string(),
            stops,
        })
    }

    /// Colour at position `t`, clamped to [0, 1].
    pub fn sample(&self, t: f64) -> Srgb<f32> {
        let last = self.stops.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return self.stops[last];
        }
        let frac = (pos - i as f64) as f32;
        self.stops[i].mix(self.stops[i + 1], frac)
    }

    /// Colour for a data value, normalized over `range` with clamping.
    pub fn map(&self, value: f64, range: &ValueRange) -> Srgb<f32> {
        self.sample(range.normalize(value))
    }

    /// Opaque 8-bit RGBA at position `t`.
    pub fn sample_rgba8(&self, t: f64) -> [u8; 4] {
        let c: Srgb<u8> = self.sample(t).into_format();
        [c.red, c.green, c.blue, 255]
    }
}

// ---------------------------------------------------------------------------
// Workbench palettes
// ---------------------------------------------------------------------------

/// Palette names understood by `wb_command -cifti-palette -palette-name`.
pub const WORKBENCH_PALETTES: &[&str] = &[
    "ROY-BIG-BL", "ROY-BIG", "Orange-Yellow", "Gray_Interp_Positive",
    "Gray_Interp", "PSYCH-FIXED", "RBGYR20", "RBGYR20P", "RYGBR4_positive",
    "RGRBR_mirror90_pos", "Purple-Red-Yellow", "Blue-White-Red",
    "Blue_Red_Blue", "clear_brain", "videen_style", "fidl", "raich4_clrmid",
    "raich6_clrmid", "HSB8_clrmid", "POS_NEG_ZERO", "red-yellow", "blue-lightblue",
    "FSL", "power_surf", "black-red", "black-green", "black-blue",
    "black-red-positive", "black-green-positive", "black-blue-positive",
    "blue-black-green", "blue-black-red", "red-black-green", "fsl_red",
    "fsl_green", "fsl_blue", "fsl_yellow", "RedWhiteBlue", "cool-warm",
    "spectral", "RY-BC-BL", "magma", "JET256", "PSYCH", "PSYCH-NO-NONE",
    "PSYCH-NO-NONE-WIDE", "inferno", "plasma", "viridis", "cividis",
];

/// Accept a Workbench palette name, matching case-insensitively and
/// returning the canonical spelling.
pub fn check_workbench_palette(name: &str) -> Result<&'static str, PlotError> {
    WORKBENCH_PALETTES
        .iter()
        .copied()
        .find(|p| p.eq_ignore_ascii_case(name))
        .ok_or_else(|| PlotError::InvalidOption {
            option: "palette",
            message: format!("'{name}' is not a Connectome Workbench palette"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb8(c: Srgb<f32>) -> [u8; 3] {
        let c: Srgb<u8> = c.into_format();
        [c.red, c.green, c.blue]
    }

    #[test]
    fn range_edges_hit_end_samples() {
        let cmap = Colormap::by_name("magma").unwrap();
        let range = ValueRange::new(-2.0, 3.0).unwrap();
        assert_eq!(rgb8(cmap.map(-2.0, &range)), rgb8(cmap.sample(0.0)));
        assert_eq!(rgb8(cmap.map(3.0, &range)), rgb8(cmap.sample(1.0)));
        assert_eq!(rgb8(cmap.sample(0.0)), MAGMA[0]);
        assert_eq!(rgb8(cmap.sample(1.0)), MAGMA[MAGMA.len() - 1]);
    }

    #[test]
    fn out_of_range_clamps() {
        let cmap = Colormap::by_name("viridis").unwrap();
        let range = ValueRange::new(0.0, 1.0).unwrap();
        assert_eq!(rgb8(cmap.map(-5.0, &range)), rgb8(cmap.sample(0.0)));
        assert_eq!(rgb8(cmap.map(7.0, &range)), rgb8(cmap.sample(1.0)));
    }

    #[test]
    fn midpoint_of_two_stops_is_mixed() {
        let cmap = Colormap::by_name("gray").unwrap();
        let [r, g, b] = rgb8(cmap.sample(0.5));
        assert!((127..=128).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn reversed_map_swaps_ends() {
        let fwd = Colormap::by_name("plasma").unwrap();
        let rev = Colormap::by_name("plasma_r").unwrap();
        assert_eq!(rgb8(fwd.sample(0.0)), rgb8(rev.sample(1.0)));
        assert_eq!(rgb8(fwd.sample(1.0)), rgb8(rev.sample(0.0)));
    }

    #[test]
    fn every_map_starts_and_ends_on_its_stops() {
        for &(name, stops) in COLORMAPS {
            let cmap = Colormap::by_name(name).unwrap();
            assert_eq!(rgb8(cmap.sample(0.0)), stops[0], "{name} at 0.0");
            assert_eq!(rgb8(cmap.sample(1.0)), stops[stops.len() - 1], "{name} at 1.0");
        }
    }

    #[test]
    fn common_matplotlib_names_resolve() {
        for name in ["Reds", "Blues", "bwr", "seismic", "RdYlBu", "Spectral", "hot", "cool", "jet"] {
            assert!(Colormap::by_name(name).is_ok(), "{name}");
        }
        let reds = Colormap::by_name("reds").unwrap();
        assert_eq!(rgb8(reds.sample(1.0)), [0x67, 0x00, 0x0d]);
        let bwr = Colormap::by_name("bwr").unwrap();
        assert_eq!(rgb8(bwr.sample(0.0)), [0, 0, 255]);
        assert_eq!(rgb8(bwr.sample(0.5)), [255, 255, 255]);
        assert_eq!(rgb8(bwr.sample(1.0)), [255, 0, 0]);
        let jet = Colormap::by_name("jet_r").unwrap();
        assert_eq!(rgb8(jet.sample(1.0)), [0, 0, 128]);
    }

    #[test]
    fn unknown_names_fail() {
        assert!(Colormap::by_name("rainbow-ish").is_err());
        assert!(check_workbench_palette("not-a-palette").is_err());
        assert_eq!(check_workbench_palette("roy-big-bl").unwrap(), "ROY-BIG-BL");
    }
}
