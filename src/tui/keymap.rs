//! Keymap translation layer.
//!
//! This keeps key handling separate from app behavior.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::Mode;

/// Actions that can be triggered by key presses.
///
/// The keymap translates key events into actions, which are then applied to
/// the application state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Cancel current operation and return to Normal mode.
    Cancel,
    /// Enter Edit mode for the current cell.
    EnterEdit,
    /// Commit the current edit and return to Normal mode.
    CommitEdit,
    /// Enter Command mode (`:` prompt).
    EnterCommand,
    /// Execute the command in the command buffer.
    ExecuteCommand,
    Undo,
    Redo,
    /// Append a row with default values and move to it.
    AppendRow,
    /// Toggle the column under the cursor in a chart selection.
    ToggleChart(u8),
    /// Open the chart modal for a slot.
    OpenChart(u8),
    OpenHelp,
    Quit,

    /// Move cursor by (dx, dy).
    Move(i32, i32),
    /// Page up (-1) or down (+1).
    Page(i32),
    /// Jump to first column.
    HomeCol,
    /// Jump to last column.
    EndCol,
    GotoFirst,
    GotoLast,

    /// Increase current column width.
    IncColWidth,
    /// Decrease current column width.
    DecColWidth,
}

/// Status bar hint for Normal mode.
pub fn status_hint() -> &'static str {
    "hjkl:move  i:edit  o:row  1/2:chart  !/@:toggle  u:undo  ?:help  :w:export  q:quit"
}

/// Translate a key event to an action for the current mode.
///
/// Returns `None` if the key has no binding in the current context.
pub fn translate(mode: Mode, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match mode {
        Mode::Normal => match key.code {
            KeyCode::Char('u') => Some(Action::Undo),
            KeyCode::Char('r') if ctrl => Some(Action::Redo),

            KeyCode::Up | KeyCode::Char('k') => Some(Action::Move(0, -1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Move(0, 1)),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Move(-1, 0)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Move(1, 0)),

            KeyCode::PageUp => Some(Action::Page(-1)),
            KeyCode::PageDown => Some(Action::Page(1)),
            KeyCode::Home | KeyCode::Char('0') => Some(Action::HomeCol),
            KeyCode::End | KeyCode::Char('$') => Some(Action::EndCol),
            KeyCode::Char('g') => Some(Action::GotoFirst),
            KeyCode::Char('G') => Some(Action::GotoLast),

            KeyCode::Enter | KeyCode::Char('i') => Some(Action::EnterEdit),
            KeyCode::Char('o') => Some(Action::AppendRow),
            KeyCode::Char(':') => Some(Action::EnterCommand),
            KeyCode::Char('1') => Some(Action::OpenChart(1)),
            KeyCode::Char('2') => Some(Action::OpenChart(2)),
            KeyCode::Char('!') => Some(Action::ToggleChart(1)),
            KeyCode::Char('@') => Some(Action::ToggleChart(2)),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('+') | KeyCode::Char('>') => Some(Action::IncColWidth),
            KeyCode::Char('-') | KeyCode::Char('<') => Some(Action::DecColWidth),
            _ => None,
        },

        Mode::Edit => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::CommitEdit),
            _ => None,
        },

        Mode::Command => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::ExecuteCommand),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn normal_mode_bindings() {
        assert_eq!(
            translate(Mode::Normal, key(KeyCode::Char('j'))),
            Some(Action::Move(0, 1))
        );
        assert_eq!(
            translate(Mode::Normal, key(KeyCode::Char('2'))),
            Some(Action::OpenChart(2))
        );
        assert_eq!(
            translate(
                Mode::Normal,
                KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)
            ),
            Some(Action::Redo)
        );
    }

    #[test]
    fn text_modes_leave_characters_unbound() {
        assert_eq!(translate(Mode::Edit, key(KeyCode::Char('j'))), None);
        assert_eq!(translate(Mode::Command, key(KeyCode::Char('q'))), None);
        assert_eq!(
            translate(Mode::Edit, key(KeyCode::Enter)),
            Some(Action::CommitEdit)
        );
    }
}
