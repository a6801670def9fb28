use darkkokan_core::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Colors for one theme
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub error: Color,
    pub muted: Color,
    pub text: Color,
    pub highlight: Color,
    pub status_bg: Color,
}

const DARK: Palette = Palette {
    primary: Color::Rgb(178, 34, 52),
    secondary: Color::Rgb(96, 160, 96),
    accent: Color::Rgb(200, 160, 72),
    error: Color::Rgb(220, 72, 72),
    muted: Color::Rgb(128, 128, 128),
    text: Color::White,
    highlight: Color::Rgb(56, 32, 40),
    status_bg: Color::Rgb(24, 20, 24),
};

const LIGHT: Palette = Palette {
    primary: Color::Rgb(150, 20, 40),
    secondary: Color::Rgb(40, 120, 60),
    accent: Color::Rgb(160, 100, 0),
    error: Color::Rgb(180, 30, 30),
    muted: Color::Rgb(110, 110, 110),
    text: Color::Black,
    highlight: Color::Rgb(235, 215, 220),
    status_bg: Color::Rgb(225, 225, 230),
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}

// Styles
pub fn title_style(p: &Palette) -> Style {
    Style::default().fg(p.primary).add_modifier(Modifier::BOLD)
}

pub fn selected_style(p: &Palette) -> Style {
    Style::default()
        .fg(p.text)
        .bg(p.highlight)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style(p: &Palette) -> Style {
    Style::default().fg(p.text)
}

pub fn muted_style(p: &Palette) -> Style {
    Style::default().fg(p.muted)
}

pub fn highlight_style(p: &Palette) -> Style {
    Style::default().fg(p.accent)
}

pub fn success_style(p: &Palette) -> Style {
    Style::default().fg(p.secondary)
}

pub fn error_style(p: &Palette) -> Style {
    Style::default().fg(p.error)
}

pub fn tab_style(p: &Palette, selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(p.primary)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        muted_style(p)
    }
}

pub fn border_style(p: &Palette, focused: bool) -> Style {
    if focused {
        Style::default().fg(p.primary)
    } else {
        Style::default().fg(p.muted)
    }
}

pub fn status_bar_style(p: &Palette) -> Style {
    Style::default().bg(p.status_bg).fg(p.text)
}

pub fn help_key_style(p: &Palette) -> Style {
    Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style(p: &Palette) -> Style {
    Style::default().fg(p.text)
}

/// Marker for items behind the unlock gate
pub fn locked_style(p: &Palette) -> Style {
    Style::default().fg(p.accent).add_modifier(Modifier::DIM)
}
