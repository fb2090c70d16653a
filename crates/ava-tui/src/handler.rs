use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick_animation(),
    }
    app.poll_exchange().await;
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.controller.is_open() {
        handle_open(app, key);
    } else {
        handle_closed(app, key);
    }
}

/// Only the launcher button is showing.
fn handle_closed(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter | KeyCode::Char('o') | KeyCode::Char(' ') => app.toggle(),
        _ => {}
    }
}

fn handle_open(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.toggle(),

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let page = app.half_page();
            app.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.half_page();
            app.scroll_down(page);
        }

        // The input is disabled while a reply is outstanding.
        _ if app.controller.is_loading() => {}

        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let draft = app.controller.draft_mut();
                let byte_pos = char_to_byte_index(draft, app.cursor);
                draft.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let draft = app.controller.draft_mut();
            if app.cursor < draft.chars().count() {
                let byte_pos = char_to_byte_index(draft, app.cursor);
                draft.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.controller.draft().chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.controller.draft().chars().count();
        }
        KeyCode::Char(c) => {
            let draft = app.controller.draft_mut();
            let byte_pos = char_to_byte_index(draft, app.cursor);
            draft.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !app.controller.is_open() || !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_LINES),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_LINES),
        _ => {}
    }
}
