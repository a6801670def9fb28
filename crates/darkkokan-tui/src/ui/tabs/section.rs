use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use darkkokan_core::ContentItem;

use crate::app::{App, SectionView};
use crate::ui::styles::{self, Palette};
use crate::utils::truncate_string;

/// Width reserved for the title column in the item list
const TITLE_WIDTH: usize = 36;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let p = styles::palette(app.config.theme);
    match app.current_view() {
        SectionView::Loading => render_message(
            frame,
            app,
            area,
            vec![Line::from(Span::styled(
                "  Loading stories...",
                styles::muted_style(p),
            ))],
        ),
        SectionView::Empty => {
            let empty = app.current_section.empty_state();
            render_message(
                frame,
                app,
                area,
                vec![
                    Line::from(""),
                    Line::from(Span::styled(format!("  {}", empty.title), styles::title_style(p))),
                    Line::from(Span::styled(
                        format!("  {}", empty.description),
                        styles::muted_style(p),
                    )),
                ],
            )
        }
        SectionView::Error { message, .. } => render_message(
            frame,
            app,
            area,
            vec![
                Line::from(""),
                Line::from(Span::styled("  Could not load stories", styles::error_style(p))),
                Line::from(Span::styled(format!("  {}", message), styles::muted_style(p))),
                Line::from(""),
                Line::from(vec![
                    Span::styled("  Press ", styles::muted_style(p)),
                    Span::styled("[r]", styles::help_key_style(p)),
                    Span::styled(" to retry", styles::muted_style(p)),
                ]),
            ],
        ),
        SectionView::Content(items) => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                .split(area);

            render_item_list(frame, app, p, items, chunks[0]);
            render_item_detail(frame, app, p, chunks[1]);
        }
    }
}

fn section_block<'a>(p: &Palette, title: String) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(styles::title_style(p))
        .borders(Borders::ALL)
        .border_style(styles::border_style(p, true))
}

fn render_message(frame: &mut Frame, app: &App, area: Rect, lines: Vec<Line>) {
    let p = styles::palette(app.config.theme);
    let block = section_block(p, format!(" {} ", app.current_section.title()));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_item_list(frame: &mut Frame, app: &App, p: &Palette, items: &[ContentItem], area: Rect) {
    let selection = app.selection();
    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let playable = app.controller.is_playable(item);
            let marker = if playable { "  " } else { "🔒" };
            let style = if i == selection {
                styles::selected_style(p)
            } else if playable {
                styles::list_item_style(p)
            } else {
                styles::locked_style(p)
            };

            let title = truncate_string(&item.title, TITLE_WIDTH);

            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", marker)),
                Span::raw(format!("{:<width$}", title, width = TITLE_WIDTH)),
                Span::styled(format!(" {}", item.display_duration()), styles::muted_style(p)),
            ]))
            .style(style)
        })
        .collect();

    let block = section_block(
        p,
        format!(" {} ({}) ", app.current_section.title(), items.len()),
    );
    let list = List::new(list_items).block(block);

    let mut state = ListState::default();
    state.select(Some(selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_item_detail(frame: &mut Frame, app: &App, p: &Palette, area: Rect) {
    let Some(item) = app.selected_item() else {
        let block = section_block(p, " No Story Selected ".to_string());
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(item.title.clone(), styles::title_style(p))),
        Line::from(""),
        Line::from(item.description.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled("Duration: ", styles::highlight_style(p)),
            Span::raw(item.display_duration().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Category: ", styles::highlight_style(p)),
            Span::raw(item.category.clone()),
        ]),
        Line::from(vec![
            Span::styled("Thumbnail: ", styles::highlight_style(p)),
            Span::styled(item.thumbnail_or_default(), styles::muted_style(p)),
        ]),
        Line::from(""),
    ];

    if app.controller.is_playable(item) {
        lines.push(Line::from(vec![
            Span::styled("[Enter]", styles::help_key_style(p)),
            Span::styled(" Play", styles::muted_style(p)),
        ]));
    } else {
        lines.push(Line::from(Span::styled("Locked", styles::locked_style(p))));
        lines.push(Line::from(vec![
            Span::styled("[Enter]", styles::help_key_style(p)),
            Span::styled(" Watch a short ad to unlock", styles::muted_style(p)),
        ]));
    }

    let block = section_block(p, " Details ".to_string());
    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
