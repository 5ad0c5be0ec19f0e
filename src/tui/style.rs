//! Color scheme and styles.

use ratatui::style::{Color, Modifier, Style};

use super::state::{ColorTarget, Palette};

/// Fixed colors not covered by the user palette.
pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Reset;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const POPUP_BORDER: Color = Color::Cyan;
    pub const KEY: Color = Color::Yellow;
    pub const OK: Color = Color::Green;
    pub const FAILED: Color = Color::Red;
}

/// Terminal color for a palette index.
pub fn palette_color(index: u8) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::White,
    }
}

/// Pre-defined styles.
pub struct Styles;

impl Styles {
    /// Base style of a palette-controlled area.
    pub fn area(palette: &Palette, target: ColorTarget) -> Style {
        Style::default()
            .fg(palette_color(palette.get(target)))
            .bg(Theme::BG)
    }

    /// Column header row of the answer pane.
    pub fn table_header(palette: &Palette) -> Style {
        Self::area(palette, ColorTarget::Answer).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    /// Connection state in the summary pane.
    pub fn link_state(connected: bool) -> Style {
        let color = if connected { Theme::OK } else { Theme::FAILED };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Marker for stale figures.
    pub fn dim() -> Style {
        Style::default().fg(Theme::FG_DIM)
    }

    pub fn popup_border() -> Style {
        Style::default().fg(Theme::POPUP_BORDER)
    }

    /// Help key style (highlighted keys in help text).
    pub fn help_key() -> Style {
        Style::default().fg(Theme::KEY).add_modifier(Modifier::BOLD)
    }

    /// Section header style for popups.
    pub fn section_header() -> Style {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_colors() {
        assert_eq!(palette_color(0), Color::Black);
        assert_eq!(palette_color(4), Color::Blue);
        assert_eq!(palette_color(7), Color::White);
        assert_eq!(palette_color(42), Color::White);
    }

    #[test]
    fn test_area_follows_palette() {
        let mut palette = Palette::default();
        palette.set(ColorTarget::Answer, 2);
        assert_eq!(Styles::area(&palette, ColorTarget::Answer).fg, Some(Color::Green));
        assert_eq!(Styles::area(&palette, ColorTarget::Log).fg, Some(Color::White));
    }
}
