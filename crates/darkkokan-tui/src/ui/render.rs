use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use darkkokan_core::Section;

use crate::app::{App, AppState, CacheStatus};
use crate::utils::{format_countdown, format_remaining};

use super::styles::{self, Palette};
use super::tabs::section;

pub fn render(frame: &mut Frame, app: &App) {
    let p = styles::palette(app.config.theme);

    // Paint the background so the light palette is readable on dark terminals
    frame.render_widget(Block::default().style(styles::status_bar_style(p)), frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(8),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, p, chunks[0]);
    render_tabs(frame, app, p, chunks[1]);
    section::render(frame, app, chunks[2]);
    render_status_bar(frame, app, p, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, p),
        AppState::ShowingPlayer => render_player_overlay(frame, app, p),
        AppState::ConfirmingUnlock => render_unlock_overlay(frame, app, p),
        AppState::WatchingAd => render_ad_overlay(frame, app, p),
        AppState::ConfirmingQuit => render_quit_overlay(frame, p),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, p: &Palette, area: Rect) {
    let title = "  DARK KOKAN";
    let subtitle = "  Horror & mystery stories from the Konkan coast";
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style(p)),
        Span::styled(subtitle, styles::muted_style(p)),
        Span::raw(" ".repeat(
            (area.width as usize)
                .saturating_sub(title.len() + subtitle.len() + help_hint.len() + 2),
        )),
        Span::styled(help_hint, styles::muted_style(p)),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style(p));

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, section) in Section::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style(p)));
        }
        spans.push(Span::styled(
            tab_label(i, section),
            styles::tab_style(p, section == app.current_section),
        ));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style(p));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn tab_label(index: usize, section: Section) -> String {
    let name = match section {
        Section::Spotify => "Audio",
        other => other.title(),
    };
    format!("[{}] {}", index + 1, name)
}

fn render_status_bar(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let shortcuts = "[r]etry | [t]heme | [q]uit";

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => format!(" {} ", cache_summary(app)),
    };

    let center_text = app
        .controller
        .unlock_remaining()
        .map(|remaining| format!("Audio unlocked: {} left", format_remaining(remaining)))
        .unwrap_or_default();

    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let center_start = (width.saturating_sub(center_text.chars().count())) / 2;
    let left_pad = center_start.saturating_sub(left_text.chars().count());
    let right_start = center_start + center_text.chars().count();
    let right_pad = width
        .saturating_sub(right_start)
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style(p)),
        Span::raw(" ".repeat(left_pad)),
        Span::styled(center_text, styles::success_style(p)),
        Span::raw(" ".repeat(right_pad)),
        Span::styled(right_text, styles::muted_style(p)),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style(p));
    frame.render_widget(paragraph, area);
}

fn cache_summary(app: &App) -> String {
    let serving = match (app.cache.serving_version(), app.cache.serving_age()) {
        (Some(version), Some(age)) => format!("Offline cache {} ({})", version, age),
        _ => String::new(),
    };
    match (&app.cache_status, serving.is_empty()) {
        (CacheStatus::Pending, true) => "Preparing offline cache...".to_string(),
        (CacheStatus::Failed(_), true) => "Offline cache unavailable".to_string(),
        (CacheStatus::Failed(_), false) => format!("{} (update failed)", serving),
        (_, _) => serving,
    }
}

fn key_line<'a>(p: &Palette, key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(key, styles::help_key_style(p)),
        Span::styled(desc, styles::help_desc_style(p)),
    ])
}

fn overlay_block(p: &Palette, title: &str) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style(p))
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, true))
        .style(styles::status_bar_style(p))
}

fn render_help_overlay(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!("  Dark Kokan, version {}", version),
            styles::muted_style(p),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style(p))),
        key_line(p, "  1-3       ", "Switch section"),
        key_line(p, "  ←/→       ", "Previous/next section"),
        key_line(p, "  ↑/↓       ", "Move through stories"),
        key_line(p, "  PgUp/PgDn ", "Scroll faster"),
        key_line(p, "  Enter     ", "Play, or unlock a locked story"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style(p))),
        key_line(p, "  r         ", "Retry a section that failed"),
        key_line(p, "  t         ", "Toggle light/dark theme"),
        key_line(p, "  q         ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style(p)),
            Span::styled("?", styles::help_key_style(p)),
            Span::styled(" or ", styles::muted_style(p)),
            Span::styled("Esc", styles::help_key_style(p)),
            Span::styled(" to close", styles::muted_style(p)),
        ]),
    ];

    frame.render_widget(Paragraph::new(help_text).block(overlay_block(p, "Help")), area);
}

fn render_player_overlay(frame: &mut Frame, app: &App, p: &Palette) {
    let Some(ref item) = app.player else {
        return;
    };
    let area = centered_rect_fixed(72, 14, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(item.title.clone(), styles::highlight_style(p))),
        Line::from(Span::styled(
            format!("{} | {}", item.category, item.display_duration()),
            styles::muted_style(p),
        )),
        Line::from(""),
        Line::from(item.description.clone()),
        Line::from(""),
    ];
    if let Some(embed) = item.embed_url() {
        lines.push(Line::from(vec![
            Span::styled("Embed: ", styles::highlight_style(p)),
            Span::raw(embed),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Open:  ", styles::highlight_style(p)),
        Span::raw(item.watch_url()),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Press ", styles::muted_style(p)),
        Span::styled("Esc", styles::help_key_style(p)),
        Span::styled(" to close", styles::muted_style(p)),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(overlay_block(p, "Now Playing"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_unlock_overlay(frame: &mut Frame, app: &App, p: &Palette) {
    let area = centered_rect_fixed(50, 9, frame.area());
    frame.render_widget(Clear, area);

    let title = app
        .pending_unlock
        .as_ref()
        .map(|item| item.title.clone())
        .unwrap_or_default();
    let minutes = darkkokan_core::content::GRANT_DURATION.as_secs() / 60;

    let lines = vec![
        Line::from(Span::styled(format!(" {}", title), styles::highlight_style(p))),
        Line::from(""),
        Line::from(" Watch a short ad to unlock audio stories"),
        Line::from(format!(" for {} minutes?", minutes)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style(p)),
            Span::styled("[Y]", styles::help_key_style(p)),
            Span::styled(" to watch, ", styles::muted_style(p)),
            Span::styled("[N]", styles::help_key_style(p)),
            Span::styled(" to cancel", styles::muted_style(p)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block(p, "Locked")), area);
}

fn render_ad_overlay(frame: &mut Frame, app: &App, p: &Palette) {
    let area = centered_rect_fixed(44, 7, frame.area());
    frame.render_widget(Clear, area);

    let remaining = app.ad_remaining_secs().unwrap_or(0);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   {}", format_countdown(remaining)),
            styles::highlight_style(p),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style(p)),
            Span::styled("Esc", styles::help_key_style(p)),
            Span::styled(" to skip (no unlock)", styles::muted_style(p)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block(p, "Advertisement")), area);
}

fn render_quit_overlay(frame: &mut Frame, p: &Palette) {
    let area = centered_rect_fixed(44, 6, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(p),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style(p)),
            Span::styled("[Y]", styles::help_key_style(p)),
            Span::styled(" to quit, ", styles::muted_style(p)),
            Span::styled("[N]", styles::help_key_style(p)),
            Span::styled(" to cancel", styles::muted_style(p)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(overlay_block(p, "Quit")), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
