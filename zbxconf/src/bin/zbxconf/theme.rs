use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Color as ClapColor, RgbColor, Style};
use colored::{Color, Colorize};
use once_cell::sync::Lazy;

/// Colours used for status lines, tables and help output
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub heading: Color,
    pub muted: Color,
    pub accent: Color,
    pub command: Color,
    pub key: Color,
    pub value: Color,
}

pub static THEME: Lazy<ColorTheme> = Lazy::new(|| ColorTheme {
    success: Color::Green,
    error: Color::Red,
    warning: Color::Yellow,
    info: Color::Blue,
    heading: Color::Cyan,
    muted: Color::BrightBlack,
    accent: Color::BrightBlue,
    command: Color::Magenta,
    key: Color::BrightCyan,
    value: Color::White,
});

pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
    pub file: &'static str,
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
    file: "📄",
};

/// `text` in `color`, or plain when colour is off.
pub fn paint(text: &str, color: Color, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, true) => text.color(color).bold().to_string(),
        (true, false) => text.color(color).to_string(),
    }
}

/// Help styles derived from [`THEME`].
pub fn help_styles() -> Styles {
    let fg = |color: Color| Style::new().fg_color(Some(to_clap(color)));
    Styles::styled()
        .usage(fg(THEME.accent).bold())
        .header(fg(THEME.heading).bold())
        .literal(fg(THEME.command))
        .placeholder(fg(THEME.muted))
        .valid(fg(THEME.success))
        .invalid(fg(THEME.warning))
        .error(fg(THEME.error).bold())
}

fn to_clap(color: Color) -> ClapColor {
    let ansi = match color {
        Color::TrueColor { r, g, b } => return ClapColor::Rgb(RgbColor(r, g, b)),
        Color::Black => AnsiColor::Black,
        Color::Red => AnsiColor::Red,
        Color::Green => AnsiColor::Green,
        Color::Yellow => AnsiColor::Yellow,
        Color::Blue => AnsiColor::Blue,
        Color::Magenta => AnsiColor::Magenta,
        Color::Cyan => AnsiColor::Cyan,
        Color::White => AnsiColor::White,
        Color::BrightBlack => AnsiColor::BrightBlack,
        Color::BrightRed => AnsiColor::BrightRed,
        Color::BrightGreen => AnsiColor::BrightGreen,
        Color::BrightYellow => AnsiColor::BrightYellow,
        Color::BrightBlue => AnsiColor::BrightBlue,
        Color::BrightMagenta => AnsiColor::BrightMagenta,
        Color::BrightCyan => AnsiColor::BrightCyan,
        Color::BrightWhite => AnsiColor::BrightWhite,
    };
    ClapColor::Ansi(ansi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_without_color_is_plain() {
        assert_eq!(paint("Examples:", THEME.heading, true, false), "Examples:");
    }

    #[test]
    fn test_true_colors_map_to_rgb() {
        assert!(matches!(
            to_clap(Color::TrueColor { r: 1, g: 2, b: 3 }),
            ClapColor::Rgb(RgbColor(1, 2, 3))
        ));
        assert!(matches!(to_clap(Color::Cyan), ClapColor::Ansi(AnsiColor::Cyan)));
    }
}
