use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert(char),
    Backspace,
    ClearLine,
    DeleteWord,
    Submit,
    ScrollUp,
    ScrollDown,
    Quit,
    None,
}

/// Map a key press to a console action.
pub fn map_key(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('u') => Action::ClearLine,
            KeyCode::Char('w') => Action::DeleteWord,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Enter => Action::Submit,
        KeyCode::Backspace => Action::Backspace,
        KeyCode::PageUp | KeyCode::Up => Action::ScrollUp,
        KeyCode::PageDown | KeyCode::Down => Action::ScrollDown,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => Action::Insert(c),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn control_chords() {
        assert_eq!(map_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Action::Quit);
        assert_eq!(
            map_key(key(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            Action::ClearLine
        );
        assert_eq!(
            map_key(key(KeyCode::Char('w'), KeyModifiers::CONTROL)),
            Action::DeleteWord
        );
        assert_eq!(map_key(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), Action::None);
    }

    #[test]
    fn plain_keys() {
        assert_eq!(map_key(key(KeyCode::Char('c'), KeyModifiers::NONE)), Action::Insert('c'));
        assert_eq!(map_key(key(KeyCode::Char('A'), KeyModifiers::SHIFT)), Action::Insert('A'));
        assert_eq!(map_key(key(KeyCode::Esc, KeyModifiers::NONE)), Action::Quit);
        assert_eq!(map_key(key(KeyCode::PageUp, KeyModifiers::NONE)), Action::ScrollUp);
        assert_eq!(map_key(key(KeyCode::Down, KeyModifiers::NONE)), Action::ScrollDown);
        assert_eq!(map_key(key(KeyCode::Enter, KeyModifiers::NONE)), Action::Submit);
    }
}
