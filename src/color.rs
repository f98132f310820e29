use std::fmt;
use std::str::FromStr;

use eframe::egui::Color32;
use palette::Srgb;
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// ChartColor – RGBA shared by the PNG export and the on-screen preview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f64,
}

impl ChartColor {
    pub const WHITE: ChartColor = ChartColor::rgb(255, 255, 255);
    pub const BLACK: ChartColor = ChartColor::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    /// Parse `#rrggbb` / `#rgb` (leading `#` optional).
    pub fn hex(s: &str) -> Result<Self, palette::rgb::FromHexError> {
        let rgb: Srgb<u8> = Srgb::from_str(s)?;
        Ok(Self::rgb(rgb.red, rgb.green, rgb.blue))
    }

    /// SVG `fill`/`stroke` value; opacity goes in a separate attribute.
    pub fn to_svg(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_color32(&self) -> Color32 {
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color32::from_rgba_unmultiplied(self.r, self.g, self.b, a)
    }
}

impl fmt::Display for ChartColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg())
    }
}

impl<'de> Deserialize<'de> for ChartColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChartColor::hex(&s).map_err(|e| serde::de::Error::custom(format!("color '{s}': {e}")))
    }
}

// ---------------------------------------------------------------------------
// Chart theme – dark background, vivid reference rings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartTheme {
    pub background: ChartColor,
    pub foreground: ChartColor,
    pub grid: ChartColor,
    pub nominal: ChartColor,
    pub minimum: ChartColor,
    pub maximum: ChartColor,
    pub measured: ChartColor,
    pub marker: ChartColor,
    pub flagged: ChartColor,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: ChartColor::BLACK,
            foreground: ChartColor::WHITE,
            grid: ChartColor::rgb(128, 128, 128).with_alpha(0.3),
            nominal: ChartColor::rgb(0x00, 0xFF, 0x00),
            minimum: ChartColor::rgb(0xFF, 0x00, 0x00),
            maximum: ChartColor::rgb(0xFF, 0xA5, 0x00),
            measured: ChartColor::rgb(0x00, 0xFF, 0xFF),
            marker: ChartColor::rgb(0xFF, 0x45, 0x00),
            flagged: ChartColor::rgb(0xFF, 0x33, 0x33),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex() {
        assert_eq!(ChartColor::hex("#FFA500").unwrap(), ChartColor::rgb(255, 165, 0));
        assert_eq!(ChartColor::hex("00ff00").unwrap(), ChartColor::rgb(0, 255, 0));
        assert!(ChartColor::hex("#zzzzzz").is_err());
    }

    #[test]
    fn svg_and_egui_forms() {
        let c = ChartColor::rgb(0, 255, 255).with_alpha(0.25);
        assert_eq!(c.to_svg(), "#00ffff");
        assert_eq!(c.to_color32().a(), 64);
    }

    #[test]
    fn theme_from_json() {
        let theme: ChartTheme = serde_json::from_str(r##"{"nominal": "#123456"}"##).unwrap();
        assert_eq!(theme.nominal, ChartColor::rgb(0x12, 0x34, 0x56));
        assert_eq!(theme.minimum, ChartColor::rgb(255, 0, 0));
    }
}
