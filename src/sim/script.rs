/// Decision scripts: the headless input layer.
///
/// One character per command, whitespace ignored:
///   `L` `R` `U` `D` = move,  `W` = wait,  `E` = interact,  `/` = end round
/// Lowercase is accepted. `;` starts a comment that runs to end of line.

use crate::domain::grid::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Wait,
    /// Flip the lever under the player.
    Interact,
    EndRound,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown command {ch:?} at line {line}, column {col}")]
    UnknownCommand { ch: char, line: usize, col: usize },
}

impl Command {
    pub fn from_char(ch: char) -> Option<Command> {
        let cmd = match ch.to_ascii_uppercase() {
            'L' => Command::Move(Direction::Left),
            'R' => Command::Move(Direction::Right),
            'U' => Command::Move(Direction::Up),
            'D' => Command::Move(Direction::Down),
            'W' => Command::Wait,
            'E' => Command::Interact,
            '/' => Command::EndRound,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Parse a whole script. Line and column numbers in errors are 1-based.
pub fn parse_script(text: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let code = line.split(';').next().unwrap_or("");
        for (col_idx, ch) in code.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            match Command::from_char(ch) {
                Some(cmd) => commands.push(cmd),
                None => {
                    return Err(ScriptError::UnknownCommand { ch, line: line_idx + 1, col: col_idx + 1 })
                }
            }
        }
    }
    Ok(commands)
}
