//! Fixed color palettes, looked up by theme name.

use serde::Serialize;

pub const DEFAULT_THEME: &str = "pink";

/// Eleven hex colors used by every front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text: &'static str,
    pub text_secondary: &'static str,
    pub success: &'static str,
    pub warning: &'static str,
    pub error: &'static str,
    pub border: &'static str,
}

impl Palette {
    /// `(field, color)` pairs in declaration order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &'static str); 11] {
        [
            ("primary", self.primary),
            ("secondary", self.secondary),
            ("accent", self.accent),
            ("background", self.background),
            ("surface", self.surface),
            ("text", self.text),
            ("text_secondary", self.text_secondary),
            ("success", self.success),
            ("warning", self.warning),
            ("error", self.error),
            ("border", self.border),
        ]
    }
}

static PINK: Palette = Palette {
    primary: "#E91E63",
    secondary: "#F48FB1",
    accent: "#FF4081",
    background: "#FFF0F5",
    surface: "#FFFFFF",
    text: "#4A148C",
    text_secondary: "#880E4F",
    success: "#4CAF50",
    warning: "#FF9800",
    error: "#F44336",
    border: "#F8BBD0",
};

static BLUE: Palette = Palette {
    primary: "#2196F3",
    secondary: "#90CAF9",
    accent: "#448AFF",
    background: "#F0F8FF",
    surface: "#FFFFFF",
    text: "#0D47A1",
    text_secondary: "#1565C0",
    success: "#4CAF50",
    warning: "#FF9800",
    error: "#F44336",
    border: "#BBDEFB",
};

static GREEN: Palette = Palette {
    primary: "#4CAF50",
    secondary: "#A5D6A7",
    accent: "#69F0AE",
    background: "#F1F8E9",
    surface: "#FFFFFF",
    text: "#1B5E20",
    text_secondary: "#2E7D32",
    success: "#43A047",
    warning: "#FF9800",
    error: "#F44336",
    border: "#C8E6C9",
};

static THEMES: [(&str, &Palette); 3] = [("pink", &PINK), ("blue", &BLUE), ("green", &GREEN)];

#[must_use]
pub fn palette(name: &str) -> Option<&'static Palette> {
    THEMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, p)| *p)
}

/// Palette for `name`, or the default theme's palette for unknown names.
#[must_use]
pub fn palette_or_default(name: &str) -> &'static Palette {
    palette(name).unwrap_or(&PINK)
}

#[must_use]
pub fn theme_names() -> Vec<&'static str> {
    THEMES.iter().map(|(n, _)| *n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_themes() {
        assert_eq!(theme_names(), vec!["pink", "blue", "green"]);
        for name in theme_names() {
            assert!(palette(name).is_some());
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(palette("BLUE").unwrap().primary, "#2196F3");
    }

    #[test]
    fn test_unknown_theme() {
        assert!(palette("purple").is_none());
        assert_eq!(palette_or_default("purple"), palette(DEFAULT_THEME).unwrap());
    }

    #[test]
    fn test_entries_are_hex_colors() {
        for name in theme_names() {
            for (field, color) in palette(name).unwrap().entries() {
                assert!(color.starts_with('#') && color.len() == 7, "{name}.{field}");
            }
        }
    }
}
