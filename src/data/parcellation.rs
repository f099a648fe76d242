use std::path::{Path, PathBuf};

use crate::data::model::Hemisphere;
use crate::error::PlotError;

/// Directory under the data root holding the atlas label files.
pub const PARCELLATIONS_DIR: &str = "HumanCorticalParcellations";

/// A cortical atlas whose label file can be recoloured per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parcellation {
    pub name: &'static str,
    /// Label file relative to [`PARCELLATIONS_DIR`].
    pub dlabel: &'static str,
    pub n_regions: usize,
    /// Hemisphere whose regions carry the lower label keys, or `None` when
    /// the atlas cannot be split into hemispheres.
    pub first_hemisphere: Option<Hemisphere>,
}

impl Parcellation {
    pub fn dlabel_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(PARCELLATIONS_DIR).join(self.dlabel)
    }

    /// Regions per hemisphere, when the atlas supports unilateral data.
    pub fn regions_per_hemisphere(&self) -> Option<usize> {
        self.first_hemisphere.map(|_| self.n_regions / 2)
    }

    /// Offset of `hemisphere`'s first region in the bilateral array.
    pub fn hemisphere_offset(&self, hemisphere: Hemisphere) -> Option<usize> {
        let first = self.first_hemisphere?;
        let half = self.n_regions / 2;
        Some(if hemisphere == first { 0 } else { half })
    }
}

const fn schaefer(name: &'static str, dlabel: &'static str, n_regions: usize) -> Parcellation {
    Parcellation {
        name,
        dlabel,
        n_regions,
        first_hemisphere: Some(Hemisphere::Left),
    }
}

pub const GLASSER: Parcellation = Parcellation {
    name: "Glasser",
    dlabel: "Glasser2016/Q1-Q6_RelatedValidation210.CorticalAreas_dil_Final_Final_Areas_Group_Colors.32k_fs_LR.dlabel.nii",
    n_regions: 360,
    first_hemisphere: Some(Hemisphere::Right),
};

pub const PARCELLATIONS: &[Parcellation] = &[
    GLASSER,
    schaefer("SchaeferLG_100", "Schaefer2018_LocalGlobal/Schaefer2018_100Parcels_17Networks_order.dlabel.nii", 100),
    schaefer("SchaeferLG_200", "Schaefer2018_LocalGlobal/Schaefer2018_200Parcels_17Networks_order.dlabel.nii", 200),
    schaefer("SchaeferLG_300", "Schaefer2018_LocalGlobal/Schaefer2018_300Parcels_17Networks_order.dlabel.nii", 300),
    schaefer("SchaeferLG_400", "Schaefer2018_LocalGlobal/Schaefer2018_400Parcels_17Networks_order.dlabel.nii", 400),
    schaefer("SchaeferLG_500", "Schaefer2018_LocalGlobal/Schaefer2018_500Parcels_17Networks_order.dlabel.nii", 500),
    schaefer("SchaeferLG_600", "Schaefer2018_LocalGlobal/Schaefer2018_600Parcels_17Networks_order.dlabel.nii", 600),
    schaefer("SchaeferLG_700", "Schaefer2018_LocalGlobal/Schaefer2018_700Parcels_17Networks_order.dlabel.nii", 700),
    schaefer("SchaeferLG_800", "Schaefer2018_LocalGlobal/Schaefer2018_800Parcels_17Networks_order.dlabel.nii", 800),
    schaefer("SchaeferLG_900", "Schaefer2018_LocalGlobal/Schaefer2018_900Parcels_17Networks_order.dlabel.nii", 900),
    schaefer("SchaeferLG_1000", "Schaefer2018_LocalGlobal/Schaefer2018_1000Parcels_17Networks_order.dlabel.nii", 1000),
    // Cortex, cerebellum and striatum in one table: no hemisphere split.
    Parcellation {
        name: "Yeo17",
        dlabel: "Yeo2011/rsn_yeo-cortex_buckner-cerebellum_choi-striatum_17networks_islands_MWfix.dlabel.nii",
        n_regions: 224,
        first_hemisphere: None,
    },
];

/// Look up an atlas by name (case-insensitive).
pub fn lookup(name: &str) -> Result<&'static Parcellation, PlotError> {
    PARCELLATIONS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| PlotError::InvalidOption {
            option: "parcellation",
            message: format!(
                "unknown parcellation '{name}'; known: {}",
                PARCELLATIONS.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
            ),
        })
}

/// Embed a unilateral array in a bilateral one, zero-filling the other side.
/// Bilateral input is returned unchanged.
pub fn map_unilateral_to_bilateral(
    values: &[f64],
    hemisphere: Option<Hemisphere>,
    parcellation: &Parcellation,
) -> Vec<f64> {
    let Some(offset) = hemisphere.and_then(|h| parcellation.hemisphere_offset(h)) else {
        return values.to_vec();
    };
    let mut out = vec![0.0; parcellation.n_regions];
    out[offset..offset + values.len()].copy_from_slice(values);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("glasser").unwrap().n_regions, 360);
        assert_eq!(lookup("schaeferlg_400").unwrap().n_regions, 400);
        assert!(lookup("Desikan").is_err());
    }

    #[test]
    fn glasser_left_values_land_in_second_half() {
        let left = vec![1.0; 180];
        let out = map_unilateral_to_bilateral(&left, Some(Hemisphere::Left), &GLASSER);
        assert_eq!(out.len(), 360);
        assert!(out[..180].iter().all(|&v| v == 0.0));
        assert!(out[180..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn schaefer_left_values_land_in_first_half() {
        let p = lookup("SchaeferLG_100").unwrap();
        let out = map_unilateral_to_bilateral(&[2.0; 50], Some(Hemisphere::Left), p);
        assert!(out[..50].iter().all(|&v| v == 2.0));
        assert!(out[50..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn bilateral_input_is_copied_through() {
        let values: Vec<f64> = (0..360).map(f64::from).collect();
        assert_eq!(map_unilateral_to_bilateral(&values, None, &GLASSER), values);
    }

    #[test]
    fn yeo_has_no_hemisphere_split() {
        let yeo = lookup("Yeo17").unwrap();
        assert!(yeo.regions_per_hemisphere().is_none());
    }
}
