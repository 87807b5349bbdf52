use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::overlay::{OverlayStyle, load_font_metrics};

#[derive(Debug, Clone)]
pub struct Settings {
    pub overlay_stroke_width: f32,
    pub overlay_font_size: f32,
    pub overlay_font_family: Option<String>,
    pub overlay_font_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overlay_stroke_width: 4.0,
            overlay_font_size: 14.0,
            overlay_font_family: None,
            overlay_font_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    overlay: Option<OverlaySettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    stroke_width: Option<f32>,
    font_size: Option<f32>,
    font_family: Option<String>,
    font_path: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn overlay_style(&self) -> Result<OverlayStyle> {
        let font_metrics = match self.overlay_font_path.as_deref() {
            Some(path) => Some(load_font_metrics(Path::new(path))?),
            None => None,
        };
        Ok(OverlayStyle {
            stroke_width: self.overlay_stroke_width,
            label_font_size: self.overlay_font_size,
            font_family: self.overlay_font_family.clone(),
            font_metrics,
            ..OverlayStyle::default()
        })
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(overlay) = incoming.overlay {
            if let Some(width) = overlay.stroke_width {
                if width > 0.0 {
                    self.overlay_stroke_width = width;
                }
            }
            if let Some(size) = overlay.font_size {
                if size > 0.0 {
                    self.overlay_font_size = size;
                }
            }
            if let Some(family) = overlay.font_family {
                if !family.trim().is_empty() {
                    self.overlay_font_family = Some(family);
                }
            }
            if let Some(path) = overlay.font_path {
                if !path.trim().is_empty() {
                    self.overlay_font_path = Some(path);
                }
            }
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-annotate"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_builtin_style() {
        let settings = Settings::default();
        assert_eq!(settings.overlay_stroke_width, 4.0);
        assert_eq!(settings.overlay_font_size, 14.0);
        assert_eq!(settings.overlay_font_family, None);
        assert_eq!(settings.overlay_font_path, None);

        let style = settings.overlay_style().expect("style");
        assert_eq!(style.stroke_width, 4.0);
        assert_eq!(style.label_font_size, 14.0);
        assert_eq!(style.label_chip_height, 24.0);
        assert_eq!(style.label_padding, 8.0);
    }

    #[test]
    fn merge_applies_positive_overrides() {
        let mut settings = Settings::default();
        let parsed: SettingsFile = toml::from_str(
            "[overlay]\nstroke_width = 2.5\nfont_size = 18.0\nfont_family = \"DejaVu Sans\"\n",
        )
        .expect("toml");
        settings.merge(parsed);
        assert_eq!(settings.overlay_stroke_width, 2.5);
        assert_eq!(settings.overlay_font_size, 18.0);
        assert_eq!(settings.overlay_font_family.as_deref(), Some("DejaVu Sans"));
    }

    #[test]
    fn merge_ignores_blank_and_nonpositive_values() {
        let mut settings = Settings::default();
        let parsed: SettingsFile = toml::from_str(
            "[overlay]\nstroke_width = 0.0\nfont_size = -3.0\nfont_family = \"  \"\nfont_path = \"\"\n",
        )
        .expect("toml");
        settings.merge(parsed);
        assert_eq!(settings.overlay_stroke_width, 4.0);
        assert_eq!(settings.overlay_font_size, 14.0);
        assert_eq!(settings.overlay_font_family, None);
        assert_eq!(settings.overlay_font_path, None);
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let mut settings = Settings::default();
        settings.merge(toml::from_str("[overlay]\nstroke_width = 2.0\n").expect("toml"));
        settings.merge(
            toml::from_str("[overlay]\nstroke_width = 3.0\nfont_size = 16.0\n").expect("toml"),
        );
        assert_eq!(settings.overlay_stroke_width, 3.0);
        assert_eq!(settings.overlay_font_size, 16.0);
    }

    #[test]
    fn extra_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        let mut file = fs::File::create(&path).expect("create");
        writeln!(file, "[overlay]\nstroke_width = 6.0").expect("write");

        let settings = load_settings(Some(&path)).expect("settings");
        assert_eq!(settings.overlay_stroke_width, 6.0);
        assert_eq!(settings.overlay_font_size, 14.0);
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        assert!(load_settings(Some(Path::new("/nonexistent/settings.toml"))).is_err());
    }

    #[test]
    fn bad_font_path_fails_style_resolution() {
        let settings = Settings {
            overlay_font_path: Some("/nonexistent/font.ttf".to_string()),
            ..Settings::default()
        };
        assert!(settings.overlay_style().is_err());
    }
}
