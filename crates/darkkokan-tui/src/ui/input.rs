//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Overlays take all
//! input while they are open.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use darkkokan_core::Section;

use crate::app::{App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ShowingPlayer => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.close_player();
            }
            Ok(false)
        }
        AppState::ConfirmingUnlock => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.start_ad(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_unlock(),
                _ => {}
            }
            Ok(false)
        }
        AppState::WatchingAd => {
            if key.code == KeyCode::Esc {
                app.cancel_unlock();
                app.set_status("Ad skipped, audio stays locked".to_string());
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                Ok(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                Ok(false)
            }
            _ => Ok(false),
        },
        AppState::Quitting => Ok(true),
        AppState::Normal => handle_normal_input(app, key),
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }

        // Section switching
        KeyCode::Char('1') => app.select_section(Section::Horror),
        KeyCode::Char('2') => app.select_section(Section::Mysterious),
        KeyCode::Char('3') => app.select_section(Section::Spotify),
        KeyCode::Left => app.select_section(app.current_section.prev()),
        KeyCode::Right | KeyCode::Tab => app.select_section(app.current_section.next()),

        // List navigation
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        KeyCode::Enter => app.activate_selected(),

        // Actions
        KeyCode::Char('r') => app.retry_current(),
        KeyCode::Char('t') => app.toggle_theme(),

        _ => {}
    }
    Ok(false)
}
