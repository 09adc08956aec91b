use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
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
        AppEvent::Key(key) => handle_key(app, key).await,
        AppEvent::Paste(text) => match app.input_mode {
            InputMode::Editing => insert_text(app, &text),
            InputMode::Normal => app.add_pasted(&text).await,
        },
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await,
        InputMode::Editing => handle_editing_mode(app, key).await,
    }
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Selection
        KeyCode::Char('a') | KeyCode::Char('i') => {
            app.input_mode = InputMode::Editing;
            app.path_input.clear();
            app.path_cursor = 0;
        }
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_file(),
        KeyCode::Char('c') => app.clear_files(),

        // Language
        KeyCode::Char('l') => app.cycle_language(true),
        KeyCode::Char('L') => app.cycle_language(false),

        // Submit / download
        KeyCode::Char('s') | KeyCode::Enter => app.start_submission(),
        KeyCode::Char('w') => app.save_artifact().await,

        // Navigation
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Files => FocusPane::Results,
                FocusPane::Results => FocusPane::Files,
            };
        }
        KeyCode::Char('t') => app.next_results_tab(),
        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Files => app.file_down(),
            FocusPane::Results => app.scroll_results_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Files => app.file_up(),
            FocusPane::Results => app.scroll_results_up(),
        },
        _ => {}
    }
}

async fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            let path = std::mem::take(&mut app.path_input);
            app.path_cursor = 0;
            app.input_mode = InputMode::Normal;
            app.add_path(&path).await;
        }
        KeyCode::Backspace => {
            if app.path_cursor > 0 {
                app.path_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
                app.path_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.path_input.chars().count();
            if app.path_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
                app.path_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.path_cursor = app.path_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.path_input.chars().count();
            app.path_cursor = (app.path_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.path_cursor = 0,
        KeyCode::End => app.path_cursor = app.path_input.chars().count(),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
            app.path_input.insert(byte_pos, c);
            app.path_cursor += 1;
        }
        _ => {}
    }
}

fn insert_text(app: &mut App, text: &str) {
    let text = text.trim_end_matches(['\n', '\r']);
    let byte_pos = char_to_byte_index(&app.path_input, app.path_cursor);
    app.path_input.insert_str(byte_pos, text);
    app.path_cursor += text.chars().count();
}
