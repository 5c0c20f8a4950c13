//! Settings for the in-page 3D viewer.
//!
//! Rendering happens in the browser with 3Dmol.js. The server only decides
//! which script to load, which color schemes to offer and what style object
//! each scheme maps to.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::StructureError;

pub const VIEWER_SCRIPT_URL: &str = "https://3Dmol.org/build/3Dmol-min.js";

/// Message shown in place of the viewer when loading or rendering fails.
pub const VIEWER_ERROR: &str = "Could not render 3D. Try again.";

const STICK_RADIUS: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    Chain,
    Spectrum,
    Secondary,
    Element,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::Chain,
        ColorScheme::Spectrum,
        ColorScheme::Secondary,
        ColorScheme::Element,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Chain => "chain",
            ColorScheme::Spectrum => "spectrum",
            ColorScheme::Secondary => "secondary",
            ColorScheme::Element => "element",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Chain => "Color by chain",
            ColorScheme::Spectrum => "Spectrum (rainbow)",
            ColorScheme::Secondary => "Secondary structure",
            ColorScheme::Element => "Element (sticks)",
        }
    }

    /// 3Dmol `setStyle` argument for this scheme.
    pub fn style(self) -> Value {
        match self {
            ColorScheme::Chain => json!({
                "cartoon": { "colorscheme": "chain" },
                "stick": { "radius": STICK_RADIUS }
            }),
            ColorScheme::Spectrum => json!({
                "cartoon": { "color": "spectrum" },
                "stick": { "radius": STICK_RADIUS }
            }),
            ColorScheme::Secondary => json!({
                "cartoon": { "colorscheme": "ssPyMol" },
                "stick": { "radius": STICK_RADIUS }
            }),
            ColorScheme::Element => json!({
                "cartoon": { "color": "white" },
                "stick": { "radius": STICK_RADIUS, "colorscheme": "element" }
            }),
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorScheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == s.trim())
            .ok_or_else(|| StructureError::UnknownScheme(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub style: Value,
}

/// Everything the page script needs, embedded into the page as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerConfig {
    pub script_url: String,
    /// Template for coordinate URLs; `{id}` is replaced client-side.
    pub coordinates_url: String,
    pub default_scheme: ColorScheme,
    pub schemes: Vec<SchemeOption>,
    pub background: String,
    pub error_message: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            script_url: VIEWER_SCRIPT_URL.to_string(),
            coordinates_url: "/api/structure/{id}".to_string(),
            default_scheme: ColorScheme::default(),
            schemes: ColorScheme::ALL
                .into_iter()
                .map(|s| SchemeOption { value: s.as_str(), label: s.label(), style: s.style() })
                .collect(),
            background: "white".to_string(),
            error_message: VIEWER_ERROR.to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
