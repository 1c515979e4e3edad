//! Raster layers and the naming each endpoint uses for them.
//!
//! The overlay service, the statistics service and the map legend all name the
//! same layer differently. Every translation goes through [`LAYER_NAMES`].

use serde::{Deserialize, Serialize};

use crate::error::{GeosightError, Result};

/// A raster layer offered by the overlay service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    #[serde(rename = "NDVI-L2A")]
    Ndvi,
    #[serde(rename = "NDWI-L2A")]
    Ndwi,
    #[serde(rename = "GEOLOGY")]
    Geology,
    #[serde(rename = "LAI_SAVI")]
    LaiSavi,
    #[serde(rename = "MOISTURE_INDEX")]
    MoistureIndex,
    #[serde(rename = "BAI")]
    Bai,
    #[serde(rename = "EVI")]
    Evi,
    #[serde(rename = "FALSE_COLOR_URBAN")]
    FalseColorUrban,
    #[serde(rename = "FALSE_COLOR")]
    FalseColor,
    #[serde(rename = "SWIR")]
    Swir,
    #[serde(rename = "TRUE_COLOR")]
    TrueColor,
}

/// One row of the naming table
#[derive(Debug, Clone, Copy)]
pub struct LayerNames {
    pub layer: Layer,
    /// Identifier in WMS `LAYERS=` and the comparison endpoint
    pub overlay_id: &'static str,
    /// Index name accepted by the statistics endpoint, if the layer is an index
    pub statistics_index: Option<&'static str>,
    /// Short name shown in overlay metadata and the legend
    pub display_name: &'static str,
    pub description: &'static str,
}

pub const LAYER_NAMES: &[LayerNames] = &[
    LayerNames {
        layer: Layer::Ndvi,
        overlay_id: "NDVI-L2A",
        statistics_index: Some("NDVI"),
        display_name: "NDVI",
        description: "Vegetation index; monitor plant health and growth",
    },
    LayerNames {
        layer: Layer::Ndwi,
        overlay_id: "NDWI-L2A",
        statistics_index: Some("NDWI"),
        display_name: "NDWI",
        description: "Water index; detect water bodies and moisture",
    },
    LayerNames {
        layer: Layer::Geology,
        overlay_id: "GEOLOGY",
        statistics_index: None,
        display_name: "GEOLOGY",
        description: "Rock and soil formations",
    },
    LayerNames {
        layer: Layer::LaiSavi,
        overlay_id: "LAI_SAVI",
        statistics_index: Some("SAVI"),
        display_name: "LAI SAVI",
        description: "Leaf area index; vegetation density",
    },
    LayerNames {
        layer: Layer::MoistureIndex,
        overlay_id: "MOISTURE_INDEX",
        statistics_index: Some("NDMI"),
        display_name: "MOISTURE INDEX",
        description: "Water content in soil and vegetation",
    },
    LayerNames {
        layer: Layer::Bai,
        overlay_id: "BAI",
        statistics_index: Some("BAI"),
        display_name: "BAI",
        description: "Burn area index",
    },
    LayerNames {
        layer: Layer::Evi,
        overlay_id: "EVI",
        statistics_index: Some("EVI"),
        display_name: "EVI",
        description: "Enhanced vegetation index",
    },
    LayerNames {
        layer: Layer::FalseColorUrban,
        overlay_id: "FALSE_COLOR_URBAN",
        statistics_index: None,
        display_name: "FALSE COLOR URBAN",
        description: "False color composite highlighting built-up areas",
    },
    LayerNames {
        layer: Layer::FalseColor,
        overlay_id: "FALSE_COLOR",
        statistics_index: None,
        display_name: "FALSE COLOR",
        description: "False color composite highlighting vegetation",
    },
    LayerNames {
        layer: Layer::Swir,
        overlay_id: "SWIR",
        statistics_index: None,
        display_name: "SWIR",
        description: "Short-wave infrared composite",
    },
    LayerNames {
        layer: Layer::TrueColor,
        overlay_id: "TRUE_COLOR",
        statistics_index: None,
        display_name: "TRUE COLOR",
        description: "Natural color composite",
    },
];

impl Layer {
    pub fn all() -> impl Iterator<Item = Layer> {
        LAYER_NAMES.iter().map(|row| row.layer)
    }

    /// Rows are stored in declaration order, so the discriminant indexes the table
    pub fn names(&self) -> &'static LayerNames {
        &LAYER_NAMES[*self as usize]
    }

    pub fn overlay_id(&self) -> &'static str {
        self.names().overlay_id
    }

    pub fn statistics_index(&self) -> Option<&'static str> {
        self.names().statistics_index
    }

    pub fn display_name(&self) -> &'static str {
        self.names().display_name
    }

    pub fn from_overlay_id(id: &str) -> Option<Layer> {
        LAYER_NAMES.iter().find(|row| row.overlay_id == id).map(|row| row.layer)
    }

    pub fn from_statistics_index(index: &str) -> Option<Layer> {
        LAYER_NAMES
            .iter()
            .find(|row| row.statistics_index == Some(index))
            .map(|row| row.layer)
    }

    pub fn from_display_name(name: &str) -> Option<Layer> {
        LAYER_NAMES.iter().find(|row| row.display_name == name).map(|row| row.layer)
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.overlay_id())
    }
}

/// Accepts any of the three names, overlay id first
impl std::str::FromStr for Layer {
    type Err = GeosightError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();
        Layer::from_overlay_id(&upper)
            .or_else(|| Layer::from_statistics_index(&upper))
            .or_else(|| Layer::from_display_name(&upper))
            .ok_or_else(|| GeosightError::validation(format!("unknown layer '{}'", trimmed)))
    }
}
