use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::SessionController;
use crate::session::{Phase, LOCAL_PLAYER_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Create,
    Start,
    Reset,
    Type(char),
    Erase,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Map a key press to a race command for the current phase
pub fn command_for(key: &KeyEvent, phase: Phase) -> Command {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => Command::Quit,
        KeyCode::Char('c') if ctrl => Command::Quit,
        KeyCode::Char('r') if ctrl && phase != Phase::NoSession => Command::Reset,
        _ if ctrl => Command::Ignore,
        KeyCode::Char('c') if phase == Phase::NoSession => Command::Create,
        KeyCode::Enter if phase == Phase::Lobby => Command::Start,
        KeyCode::Char(c) if phase == Phase::Racing => Command::Type(c),
        KeyCode::Backspace if phase == Phase::Racing => Command::Erase,
        _ => Command::Ignore,
    }
}

/// Apply `command` as the local player. Keystrokes are turned into a full
/// snapshot of the typed text before they reach the controller.
pub fn dispatch(controller: &mut SessionController, command: Command) -> Flow {
    match command {
        Command::Quit => return Flow::Quit,
        Command::Create => {
            controller.create_session();
        }
        Command::Start => {
            controller.start_session(LOCAL_PLAYER_ID);
        }
        Command::Reset => {
            controller.reset_session();
        }
        Command::Type(c) => {
            let mut typed = controller.current_state().typed.clone();
            typed.push(c);
            controller.submit_keystroke_state(&typed);
        }
        Command::Erase => {
            let mut typed = controller.current_state().typed.clone();
            if typed.pop().is_some() {
                controller.submit_keystroke_state(&typed);
            }
        }
        Command::Ignore => {}
    }
    Flow::Continue
}
