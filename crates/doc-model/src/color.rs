use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color `{0}` is not a #rrggbb or #rgb hex string")]
    InvalidHex(String),
}

/// Opaque RGB color, serialized as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const DEFAULT_PEN: Color = Color { r: 0x21, g: 0x96, b: 0xf3 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError::InvalidHex(value.to_owned());
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let widen = |digit: &str| channel(digit).map(|v| v * 17);
                Ok(Self { r: widen(&hex[0..1])?, g: widen(&hex[1..2])?, b: widen(&hex[2..3])? })
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels in the 0.0..=1.0 range used by PDF color operators.
    pub fn to_normalized(self) -> (f32, f32, f32) {
        (self.r as f32 / 255.0, self.g as f32 / 255.0, self.b as f32 / 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_PEN
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::from_hex("#2196f3").expect("long hex should parse"), Color::DEFAULT_PEN);
        let short = Color::from_hex("#f0a").expect("short hex should parse");
        assert_eq!(short, Color::rgb(255, 0, 170));
    }

    #[test]
    fn rejects_malformed_hex() {
        for value in ["2196f3", "#2196f", "#zzzzzz", "", "#ééé"] {
            assert!(Color::from_hex(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn normalizes_channels() {
        let (r, g, b) = Color::rgb(255, 0, 51).to_normalized();
        assert_eq!((r, g, b), (1.0, 0.0, 0.2));
    }

    #[test]
    fn serializes_as_hex_string() {
        let json =
            serde_json::to_string(&Color::rgb(255, 128, 0)).expect("serialize should succeed");
        assert_eq!(json, "\"#ff8000\"");

        let back: Color = serde_json::from_str(&json).expect("deserialize should succeed");
        assert_eq!(back, Color::rgb(255, 128, 0));
    }
}
