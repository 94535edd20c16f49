use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.request_clear();
        return;
    }

    // The confirmation gate owns the keyboard: only yes/no answers (and
    // navigation) until the proposal is answered.
    if app.state.awaiting_confirmation() {
        handle_confirmation_keys(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_confirmation_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm("Yes"),
        KeyCode::Char('n') | KeyCode::Char('N') => app.confirm("No"),
        KeyCode::Char('j') | KeyCode::Down => scroll_focused_down(app),
        KeyCode::Char('k') | KeyCode::Up => scroll_focused_up(app),
        KeyCode::Tab => toggle_focus(app),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.input.chars().count();
        }

        KeyCode::Tab => toggle_focus(app),

        // Scroll whichever pane is focused
        KeyCode::Char('j') | KeyCode::Down => scroll_focused_down(app),
        KeyCode::Char('k') | KeyCode::Up => scroll_focused_up(app),
        KeyCode::Char('g') => match app.focus {
            FocusPane::Chat => app.chat_scroll = 0,
            FocusPane::Artifact => app.artifact_scroll = 0,
        },
        KeyCode::Char('G') => {
            if app.focus == FocusPane::Chat {
                app.scroll_chat_to_bottom();
            }
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            toggle_focus(app);
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn toggle_focus(app: &mut App) {
    app.focus = match app.focus {
        FocusPane::Chat => FocusPane::Artifact,
        FocusPane::Artifact => FocusPane::Chat,
    };
}

fn scroll_focused_down(app: &mut App) {
    match app.focus {
        FocusPane::Chat => app.scroll_chat_down(),
        FocusPane::Artifact => app.scroll_artifact_down(),
    }
}

fn scroll_focused_up(app: &mut App) {
    match app.focus {
        FocusPane::Chat => app.scroll_chat_up(),
        FocusPane::Artifact => app.scroll_artifact_up(),
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_artifact = app.artifact_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down();
                app.scroll_chat_down();
                app.scroll_chat_down();
            } else if in_artifact {
                app.scroll_artifact_down();
                app.scroll_artifact_down();
                app.scroll_artifact_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up();
                app.scroll_chat_up();
                app.scroll_chat_up();
            } else if in_artifact {
                app.scroll_artifact_up();
                app.scroll_artifact_up();
                app.scroll_artifact_up();
            }
        }
        _ => {}
    }
}
