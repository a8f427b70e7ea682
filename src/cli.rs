use crate::config::PanelConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

const SUPPORTED_FLAGS: &str = "--distance, --scale, --width, --height, --show, --config, --server-url";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    distance: Option<f32>,
    scale: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    show: Option<bool>,
    config_path: Option<PathBuf>,
    server_url: Option<String>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "distance" => overrides.distance = Some(parse_positive("distance", &value)?),
                "scale" => overrides.scale = Some(parse_positive("scale", &value)?),
                "width" => overrides.width = Some(parse_positive("width", &value)?),
                "height" => overrides.height = Some(parse_positive("height", &value)?),
                "show" => overrides.show = Some(parse_bool_flag("show", &value)?),
                "config" => overrides.config_path = Some(PathBuf::from(value)),
                "server-url" => overrides.server_url = Some(value),
                _ => bail!("Unknown flag '{flag}'. Supported flags: {SUPPORTED_FLAGS}."),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    /// Address to run through the confirmation workflow after startup.
    pub fn server_url(&self) -> Option<&str> {
        self.server_url.as_deref()
    }

    pub fn config_overrides(&self) -> PanelConfigOverrides {
        PanelConfigOverrides {
            view_distance: self.distance,
            panel_scale: self.scale,
            panel_width: self.width,
            panel_height: self.height,
            show_on_start: self.show,
        }
    }
}

fn parse_positive(flag: &str, value: &str) -> Result<f32> {
    let parsed = value.parse::<f32>().with_context(|| format!("Invalid {flag} '{value}'"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        bail!("Invalid {flag} '{value}'. Expected a positive number.");
    }
    Ok(parsed)
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
