use crate::error::PanelError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Live-tunable layout parameters. The host owns these; the panel only reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelParams {
    #[serde(default = "PanelParams::default_panel_width")]
    pub panel_width: f32,
    #[serde(default = "PanelParams::default_panel_height")]
    pub panel_height: f32,
    #[serde(default = "PanelParams::default_panel_scale")]
    pub panel_scale: f32,
    #[serde(default = "PanelParams::default_view_distance")]
    pub view_distance: f32,
    /// `0` lets the container stretch buttons to its width.
    #[serde(default)]
    pub button_width: f32,
    #[serde(default = "PanelParams::default_button_height")]
    pub button_height: f32,
    #[serde(default = "PanelParams::default_button_spacing")]
    pub button_spacing: f32,
}

impl PanelParams {
    const fn default_panel_width() -> f32 {
        300.0
    }

    const fn default_panel_height() -> f32 {
        300.0
    }

    const fn default_panel_scale() -> f32 {
        0.005
    }

    const fn default_view_distance() -> f32 {
        5.0
    }

    const fn default_button_height() -> f32 {
        100.0
    }

    const fn default_button_spacing() -> f32 {
        20.0
    }

    pub fn stretch_buttons(&self) -> bool {
        self.button_width == 0.0
    }

    pub fn validate(&self) -> Result<(), PanelError> {
        let strictly_positive = [
            ("panel_width", self.panel_width),
            ("panel_height", self.panel_height),
            ("panel_scale", self.panel_scale),
            ("view_distance", self.view_distance),
            ("button_height", self.button_height),
        ];
        for (name, value) in strictly_positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PanelError::Configuration(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [("button_width", self.button_width), ("button_spacing", self.button_spacing)];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PanelError::Configuration(format!("{name} must not be negative, got {value}")));
            }
        }
        Ok(())
    }
}

impl Default for PanelParams {
    fn default() -> Self {
        Self {
            panel_width: Self::default_panel_width(),
            panel_height: Self::default_panel_height(),
            panel_scale: Self::default_panel_scale(),
            view_distance: Self::default_view_distance(),
            button_width: 0.0,
            button_height: Self::default_button_height(),
            button_spacing: Self::default_button_spacing(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub layout: PanelParams,
    #[serde(default = "PanelConfig::default_show_on_start")]
    pub show_on_start: bool,
    #[serde(default = "PanelConfig::default_title")]
    pub title: String,
    #[serde(default = "PanelConfig::default_server_url")]
    pub default_server_url: String,
    #[serde(default = "PanelConfig::default_settings_path")]
    pub settings_path: PathBuf,
}

impl PanelConfig {
    const fn default_show_on_start() -> bool {
        true
    }

    pub fn default_title() -> String {
        "VR UI Test Window".to_string()
    }

    fn default_server_url() -> String {
        "https://localhost:5000/poseData".to_string()
    }

    fn default_settings_path() -> PathBuf {
        PathBuf::from("panel_settings.json")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: PanelConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.layout.validate().with_context(|| format!("Invalid layout in {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("[config] Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &PanelConfigOverrides) {
        if let Some(distance) = overrides.view_distance {
            self.layout.view_distance = distance;
        }
        if let Some(scale) = overrides.panel_scale {
            self.layout.panel_scale = scale;
        }
        if let Some(width) = overrides.panel_width {
            self.layout.panel_width = width;
        }
        if let Some(height) = overrides.panel_height {
            self.layout.panel_height = height;
        }
        if let Some(show) = overrides.show_on_start {
            self.show_on_start = show;
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            layout: PanelParams::default(),
            show_on_start: Self::default_show_on_start(),
            title: Self::default_title(),
            default_server_url: Self::default_server_url(),
            settings_path: Self::default_settings_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelConfigOverrides {
    pub view_distance: Option<f32>,
    pub panel_scale: Option<f32>,
    pub panel_width: Option<f32>,
    pub panel_height: Option<f32>,
    pub show_on_start: Option<bool>,
}

impl PanelConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.view_distance.is_some() {
            fields.push("distance");
        }
        if self.panel_scale.is_some() {
            fields.push("scale");
        }
        if self.panel_width.is_some() {
            fields.push("width");
        }
        if self.panel_height.is_some() {
            fields.push("height");
        }
        if self.show_on_start.is_some() {
            fields.push("show");
        }
        fields
    }
}
