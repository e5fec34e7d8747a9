use colored::Color;
use once_cell::sync::Lazy;

/// Colors for each kind of CLI message, plus the help-screen accents.
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    /// Progress spinners and help section titles.
    pub highlight: Color,
    /// Verbose notes and secondary glyphs.
    pub muted: Color,
    pub primary: Color,
    pub secondary: Color,
    pub key: Color,
    pub value: Color,
}

pub static THEME: Lazy<ColorTheme> = Lazy::new(|| ColorTheme {
    success: Color::BrightGreen,
    error: Color::BrightRed,
    warning: Color::Yellow,
    info: Color::Cyan,
    highlight: Color::BrightCyan,
    muted: Color::BrightBlack,
    primary: Color::Blue,
    secondary: Color::BrightMagenta,
    key: Color::BrightWhite,
    value: Color::White,
});

/// Leading glyph for each message kind.
pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
    pub loading: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "!",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
    loading: "…",
};
