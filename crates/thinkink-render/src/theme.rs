//! Light/dark theme color resolution.
//!
//! Stored element colors never change with the theme. At draw time, ink
//! that would vanish against the background is swapped for a readable one.

use thinkink_core::element::Rgba;

/// Light theme canvas background.
pub const LIGHT_BACKGROUND: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
/// Dark theme canvas background.
pub const DARK_BACKGROUND: Rgba = Rgba::rgb(0x1e, 0x29, 0x3b);

/// Ink used on light backgrounds in place of near-white colors.
const LIGHT_INK: Rgba = Rgba::rgb(0x1e, 0x1e, 0x1e);

/// Brightness above which a color counts as light.
const LIGHT_THRESHOLD: f64 = 200.0;
/// Brightness below which a color counts as dark.
const DARK_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn background(self) -> Rgba {
        match self {
            Theme::Light => LIGHT_BACKGROUND,
            Theme::Dark => DARK_BACKGROUND,
        }
    }

    /// The color to draw for a stored color. Alpha is kept.
    pub fn resolve(self, color: Rgba) -> Rgba {
        if color.is_transparent() {
            return color;
        }
        let brightness = color.brightness();
        let swapped = match self {
            Theme::Dark if brightness < DARK_THRESHOLD => Rgba::WHITE,
            Theme::Light if brightness > LIGHT_THRESHOLD => LIGHT_INK,
            _ => return color,
        };
        Rgba { a: color.a, ..swapped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_lifts_black() {
        assert_eq!(Theme::Dark.resolve(Rgba::BLACK), Rgba::WHITE);
        assert_eq!(Theme::Dark.resolve(LIGHT_INK), Rgba::WHITE);
        let red = Rgba::rgb(0xe0, 0x31, 0x31);
        assert_eq!(Theme::Dark.resolve(red), red);
    }

    #[test]
    fn test_light_theme_darkens_white() {
        assert_eq!(Theme::Light.resolve(Rgba::WHITE), LIGHT_INK);
        assert_eq!(Theme::Light.resolve(Rgba::BLACK), Rgba::BLACK);
    }

    #[test]
    fn test_transparent_passes_through() {
        assert_eq!(Theme::Dark.resolve(Rgba::TRANSPARENT), Rgba::TRANSPARENT);
        assert_eq!(Theme::Light.resolve(Rgba::TRANSPARENT), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_alpha_is_kept() {
        let faded_white = Rgba::new(255, 255, 255, 128);
        assert_eq!(Theme::Light.resolve(faded_white).a, 128);
    }

    #[test]
    fn test_backgrounds() {
        assert_eq!(Theme::Light.background().to_hex(), "#ffffff");
        assert_eq!(Theme::Dark.background().to_hex(), "#1e293b");
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
    }
}
