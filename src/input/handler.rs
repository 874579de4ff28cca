use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Cursor movement on the grid editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    ToggleTraining,
    Reset,
    ToggleAutoEvolve,
    MoveCursor(CursorMove),
    ToggleCell,
    /// Playback speed level, 1 (slowest) to 4
    SetSpeed(u8),
    Save,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            KeyCode::Up => KeyAction::MoveCursor(CursorMove::Up),
            KeyCode::Down => KeyAction::MoveCursor(CursorMove::Down),
            KeyCode::Left => KeyAction::MoveCursor(CursorMove::Left),
            KeyCode::Right => KeyAction::MoveCursor(CursorMove::Right),

            KeyCode::Enter | KeyCode::Char('t') | KeyCode::Char('T') => KeyAction::ToggleCell,

            KeyCode::Char(' ') => KeyAction::ToggleTraining,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Reset,
            KeyCode::Char('e') | KeyCode::Char('E') => KeyAction::ToggleAutoEvolve,
            KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::Save,

            KeyCode::Char(c @ '1'..='4') => KeyAction::SetSpeed(c as u8 - b'0'),

            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(handler: &InputHandler, code: KeyCode) -> KeyAction {
        handler.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_arrow_keys_move_cursor() {
        let handler = InputHandler::new();

        assert_eq!(
            press(&handler, KeyCode::Up),
            KeyAction::MoveCursor(CursorMove::Up)
        );
        assert_eq!(
            press(&handler, KeyCode::Down),
            KeyAction::MoveCursor(CursorMove::Down)
        );
        assert_eq!(
            press(&handler, KeyCode::Left),
            KeyAction::MoveCursor(CursorMove::Left)
        );
        assert_eq!(
            press(&handler, KeyCode::Right),
            KeyAction::MoveCursor(CursorMove::Right)
        );
    }

    #[test]
    fn test_training_controls() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Char(' ')), KeyAction::ToggleTraining);
        assert_eq!(press(&handler, KeyCode::Char('r')), KeyAction::Reset);
        assert_eq!(press(&handler, KeyCode::Char('e')), KeyAction::ToggleAutoEvolve);
        assert_eq!(press(&handler, KeyCode::Char('s')), KeyAction::Save);
    }

    #[test]
    fn test_uppercase_controls() {
        let handler = InputHandler::new();

        let r_upper = KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(r_upper), KeyAction::Reset);

        let e_upper = KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT);
        assert_eq!(handler.handle_key_event(e_upper), KeyAction::ToggleAutoEvolve);
    }

    #[test]
    fn test_toggle_cell_keys() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Enter), KeyAction::ToggleCell);
        assert_eq!(press(&handler, KeyCode::Char('t')), KeyAction::ToggleCell);
    }

    #[test]
    fn test_speed_keys() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Char('1')), KeyAction::SetSpeed(1));
        assert_eq!(press(&handler, KeyCode::Char('4')), KeyAction::SetSpeed(4));
        assert_eq!(press(&handler, KeyCode::Char('5')), KeyAction::None);
    }

    #[test]
    fn test_quit_keys() {
        let handler = InputHandler::new();

        assert_eq!(press(&handler, KeyCode::Char('q')), KeyAction::Quit);
        assert_eq!(press(&handler, KeyCode::Esc), KeyAction::Quit);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key_event(ctrl_c), KeyAction::Quit);
    }

    #[test]
    fn test_unknown_key() {
        let handler = InputHandler::new();
        assert_eq!(press(&handler, KeyCode::Char('x')), KeyAction::None);
    }
}
