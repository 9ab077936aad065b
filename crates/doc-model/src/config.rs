use crate::color::Color;
use serde::{Deserialize, Serialize};

/// User-tunable constants for capture and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub default_color: Color,
    pub underline_thickness: f32,
    pub signature_width: f32,
    pub signature_height: f32,
    pub highlight_opacity: f32,
    pub underline_opacity: f32,
    pub comment_font_size: f32,
    pub default_comment_text: String,
    pub output_file_name: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            default_color: Color::DEFAULT_PEN,
            underline_thickness: 2.0,
            signature_width: 200.0,
            signature_height: 100.0,
            highlight_opacity: 0.3,
            underline_opacity: 0.7,
            comment_font_size: 10.0,
            default_comment_text: "Comment".to_owned(),
            output_file_name: "annotated-document.pdf".to_owned(),
        }
    }
}

impl AnnotatorConfig {
    pub fn signature_size(&self) -> (f32, f32) {
        (self.signature_width, self.signature_height)
    }

    /// Replaces values that would make a tool unusable or produce invisible
    /// geometry with their defaults. Returns the names of the fields reset.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut reset = Vec::new();

        for (name, value, fallback) in [
            ("underline_thickness", &mut self.underline_thickness, defaults.underline_thickness),
            ("signature_width", &mut self.signature_width, defaults.signature_width),
            ("signature_height", &mut self.signature_height, defaults.signature_height),
            ("comment_font_size", &mut self.comment_font_size, defaults.comment_font_size),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                *value = fallback;
                reset.push(name);
            }
        }

        for (name, value, fallback) in [
            ("highlight_opacity", &mut self.highlight_opacity, defaults.highlight_opacity),
            ("underline_opacity", &mut self.underline_opacity, defaults.underline_opacity),
        ] {
            if !(0.0..=1.0).contains(&*value) {
                *value = fallback;
                reset.push(name);
            }
        }

        if self.default_comment_text.trim().is_empty() {
            self.default_comment_text = defaults.default_comment_text;
            reset.push("default_comment_text");
        }
        if self.output_file_name.trim().is_empty() {
            self.output_file_name = defaults.output_file_name;
            reset.push("output_file_name");
        }

        for name in &reset {
            log::warn!("config value {name} is out of range; using the default");
        }
        reset
    }

    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AnnotatorConfig = serde_json::from_str(r##"{ "default_color": "#ff0000" }"##)
            .expect("parse should succeed");

        assert_eq!(config.default_color, Color::rgb(255, 0, 0));
        assert_eq!(config.underline_thickness, 2.0);
        assert_eq!(config.signature_size(), (200.0, 100.0));
        assert_eq!(config.output_file_name, "annotated-document.pdf");
    }

    #[test]
    fn sanitize_resets_non_positive_sizes() {
        let mut config = AnnotatorConfig {
            underline_thickness: 0.0,
            signature_width: -5.0,
            signature_height: f32::NAN,
            comment_font_size: 0.0,
            ..AnnotatorConfig::default()
        };

        let reset = config.sanitize();

        assert_eq!(
            reset,
            vec!["underline_thickness", "signature_width", "signature_height", "comment_font_size"]
        );
        assert_eq!(config, AnnotatorConfig::default());
    }

    #[test]
    fn sanitize_resets_opacity_outside_unit_range() {
        let mut config = AnnotatorConfig {
            highlight_opacity: 1.5,
            underline_opacity: -0.1,
            ..AnnotatorConfig::default()
        };

        assert_eq!(config.sanitize(), vec!["highlight_opacity", "underline_opacity"]);
        assert_eq!(config.highlight_opacity, 0.3);
        assert_eq!(config.underline_opacity, 0.7);
    }

    #[test]
    fn sanitize_keeps_valid_values() {
        let mut config = AnnotatorConfig {
            underline_thickness: 4.0,
            highlight_opacity: 1.0,
            underline_opacity: 0.0,
            ..AnnotatorConfig::default()
        };
        let expected = config.clone();

        assert!(config.sanitize().is_empty());
        assert_eq!(config, expected);
    }
}
