use crossterm::event::{self, KeyCode, KeyModifiers};

use thermogrid_core::ChartSlot;

use super::app::{App, Mode};
use super::keymap::Action;

/// Handle text editing operations on a buffer with UTF-8 aware cursor movement.
fn handle_text_input(buffer: &mut String, cursor: &mut usize, key: event::KeyEvent) {
    match key.code {
        KeyCode::Left => {
            if *cursor > 0 {
                let mut new_pos = *cursor - 1;
                while new_pos > 0 && !buffer.is_char_boundary(new_pos) {
                    new_pos -= 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Right => {
            if *cursor < buffer.len() {
                let mut new_pos = *cursor + 1;
                while new_pos < buffer.len() && !buffer.is_char_boundary(new_pos) {
                    new_pos += 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = buffer.len();
        }
        KeyCode::Backspace | KeyCode::Char('h')
            if key.code == KeyCode::Backspace || key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            if *cursor > 0 {
                let mut del_start = *cursor - 1;
                while del_start > 0 && !buffer.is_char_boundary(del_start) {
                    del_start -= 1;
                }
                buffer.drain(del_start..*cursor);
                *cursor = del_start;
            }
        }
        KeyCode::Delete => {
            if *cursor < buffer.len() {
                let mut del_end = *cursor + 1;
                while del_end < buffer.len() && !buffer.is_char_boundary(del_end) {
                    del_end += 1;
                }
                buffer.drain(*cursor..del_end);
            }
        }
        KeyCode::Char(c) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                buffer.insert(*cursor, c);
                *cursor += c.len_utf8();
            }
        }
        _ => {}
    }
}

/// Result of applying an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyResult {
    Continue,
    Quit,
}

fn slot(n: u8) -> ChartSlot {
    if n == 2 {
        ChartSlot::Second
    } else {
        ChartSlot::First
    }
}

/// Apply an action to the application state.
///
/// Returns `ApplyResult::Quit` if the application should exit.
pub fn apply_action(app: &mut App, action: Action) -> ApplyResult {
    if action != Action::Quit {
        app.confirm_quit = false;
    }
    match action {
        Action::Cancel => match app.mode {
            Mode::Edit => {
                app.mode = Mode::Normal;
                app.edit_buffer.clear();
                app.edit_cursor = 0;
            }
            Mode::Command => {
                app.mode = Mode::Normal;
                app.command_buffer.clear();
                app.command_cursor = 0;
            }
            Mode::Normal => {}
        },

        Action::EnterEdit => app.enter_edit_mode(),
        Action::CommitEdit => app.commit_edit(),
        Action::EnterCommand => {
            app.mode = Mode::Command;
            app.command_buffer.clear();
            app.command_cursor = 0;
        }
        Action::ExecuteCommand => {
            if app.execute_command() {
                return ApplyResult::Quit;
            }
        }
        Action::Undo => app.undo(),
        Action::Redo => app.redo(),
        Action::AppendRow => app.append_row(),
        Action::ToggleChart(n) => app.toggle_chart_column(slot(n)),
        Action::OpenChart(n) => app.open_chart_modal(slot(n)),
        Action::OpenHelp => {
            app.help_modal = true;
            app.help_scroll = 0;
        }
        Action::Quit => {
            if app.request_quit() {
                return ApplyResult::Quit;
            }
        }

        Action::Move(dx, dy) => app.move_cursor(dx, dy),
        Action::Page(dir) => {
            let delta = app.visible_rows as i32 * dir;
            app.move_cursor(0, delta);
        }
        Action::HomeCol => {
            app.cursor_col = 0;
            app.update_viewport();
        }
        Action::EndCol => {
            app.cursor_col = app.max_cols().saturating_sub(1);
            app.update_viewport();
        }
        Action::GotoFirst => app.goto_first(),
        Action::GotoLast => app.goto_last(),

        Action::IncColWidth => app.increase_column_width(),
        Action::DecColWidth => app.decrease_column_width(),
    }
    ApplyResult::Continue
}

pub fn handle_edit_text(app: &mut App, key: event::KeyEvent) {
    handle_text_input(&mut app.edit_buffer, &mut app.edit_cursor, key);
}

pub fn handle_command_text(app: &mut App, key: event::KeyEvent) {
    handle_text_input(&mut app.command_buffer, &mut app.command_cursor, key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use thermogrid_core::{Config, Document};

    fn app() -> App {
        App::new(Document::new(Config::default()).unwrap())
    }

    fn type_str(buffer: &mut String, cursor: &mut usize, s: &str) {
        for c in s.chars() {
            handle_text_input(
                buffer,
                cursor,
                KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()),
            );
        }
    }

    #[test]
    fn text_input_is_utf8_aware() {
        let mut buffer = String::new();
        let mut cursor = 0;
        type_str(&mut buffer, &mut cursor, "a°c");
        handle_text_input(
            &mut buffer,
            &mut cursor,
            KeyEvent::new(KeyCode::Left, KeyModifiers::empty()),
        );
        handle_text_input(
            &mut buffer,
            &mut cursor,
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::empty()),
        );
        assert_eq!(buffer, "ac");
        assert_eq!(cursor, 1);
    }

    #[test]
    fn quit_action_confirms_unsaved_changes() {
        let mut app = app();
        apply_action(&mut app, Action::AppendRow);
        assert_eq!(apply_action(&mut app, Action::Quit), ApplyResult::Continue);
        // any other action resets the confirmation
        apply_action(&mut app, Action::Move(0, 0));
        assert_eq!(apply_action(&mut app, Action::Quit), ApplyResult::Continue);
        assert_eq!(apply_action(&mut app, Action::Quit), ApplyResult::Quit);
    }

    #[test]
    fn cancel_leaves_edit_mode() {
        let mut app = app();
        apply_action(&mut app, Action::AppendRow);
        apply_action(&mut app, Action::EnterEdit);
        assert_eq!(app.mode, Mode::Edit);
        apply_action(&mut app, Action::Cancel);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.edit_buffer.is_empty());
    }
}
