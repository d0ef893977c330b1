use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::mashup::MashupSettings;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub settings: MashupSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Where to write the JSON analysis report, if anywhere
    #[serde(default)]
    pub report: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            report: None,
        }
    }
}

fn default_path() -> PathBuf { "mashup.wav".into() }

/// `mashup.toml` in the working directory, then `~/.config/mashup/config.toml`,
/// then the platform config dir.
pub fn find_config() -> Option<PathBuf> {
    let local = PathBuf::from("mashup.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("mashup").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("mashup").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("Invalid config: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.settings.mix.segment_duration, 30.0);
        assert_eq!(cfg.settings.mix.transition_duration, 8.0);
        assert_eq!(cfg.settings.mix.edge_fade, 2.0);
        assert_eq!(cfg.settings.analysis.low_pass_cutoff, 150.0);
        assert_eq!(cfg.settings.render.makeup_gain, 1.8);
        assert_eq!(cfg.output.path, PathBuf::from("mashup.wav"));
        assert!(cfg.output.report.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = parse_config(
            r#"
            [mix]
            segment_duration = 45.0

            [render]
            makeup_gain = 1.0

            [output]
            path = "set.wav"
            report = "set.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.settings.mix.segment_duration, 45.0);
        assert_eq!(cfg.settings.mix.transition_duration, 8.0);
        assert_eq!(cfg.settings.render.makeup_gain, 1.0);
        assert_eq!(cfg.output.path, PathBuf::from("set.wav"));
        assert_eq!(cfg.output.report, Some(PathBuf::from("set.json")));
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(parse_config("[mix]\nsegment_duration = \"long\"").is_none());
    }
}
