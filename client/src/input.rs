//! Keyboard commands typed into the console

use shared::{ClientMessage, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Send(ClientMessage),
    Quit,
}

pub const HELP: &str = "Move with W A S D, Q to quit";

/// Maps one typed line to a command. Case and surrounding blanks are ignored.
pub fn parse_command(input: &str) -> Option<Command> {
    let direction = match input.trim().to_ascii_uppercase().as_str() {
        "W" => Direction::Up,
        "S" => Direction::Down,
        "A" => Direction::Left,
        "D" => Direction::Right,
        "Q" => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Send(ClientMessage::Move(direction)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_maps_to_moves() {
        assert_eq!(
            parse_command("w"),
            Some(Command::Send(ClientMessage::Move(Direction::Up)))
        );
        assert_eq!(
            parse_command(" A "),
            Some(Command::Send(ClientMessage::Move(Direction::Left)))
        );
        assert_eq!(
            parse_command("s"),
            Some(Command::Send(ClientMessage::Move(Direction::Down)))
        );
        assert_eq!(
            parse_command("D"),
            Some(Command::Send(ClientMessage::Move(Direction::Right)))
        );
    }

    #[test]
    fn test_quit_and_unknown() {
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("jump"), None);
    }
}
