/// Level loader.
///
/// ## Sources (priority order):
///   1. A single `.txt` file given on the command line
///   2. `levels/` directory (individual `.txt` files, sorted by file name)
///   3. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Optional: `@ name Level Name`
///   Optional: `@ origin x,y` (world coordinate of the bottom-left tile)
///   Lines: map rows, top row first
///
/// Directive lines start with `@`, which is not a map glyph, so names may
/// contain any character.
///
/// ## Tile legend:
///   '#' = Solid             'H' = Ladder
///   'G' = Goal              'P' = Player spawn
///   'B' = Stone             'C' = Time cube
///   '1'-'9' = Lever         'A'-'I' = Door of lever 1-9, starts closed
///   ' ' / '.' = Empty       'a'-'i' = Door of lever 1-9, starts open

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::GameConfig;
use crate::domain::actor::{ActorKind, BlockKind};
use crate::domain::grid::Position;
use crate::domain::lever::LeverId;
use crate::domain::tile::Tile;
use crate::sim::world::{World, WorldError};

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
    pub origin: Position,
}

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("level has no map rows")]
    Empty,

    #[error("bad directive on line {line}: {text:?}")]
    BadDirective { line: usize, text: String },

    #[error("unknown glyph {ch:?} at row {row}, column {col}")]
    UnknownGlyph { ch: char, row: usize, col: usize },

    #[error("level has no player spawn")]
    MissingPlayer,

    #[error("second player spawn at {at}")]
    MultiplePlayers { at: Position },

    #[error("lever {lever} placed twice (second at {at})")]
    DuplicateLever { lever: u8, at: Position },

    #[error("door {glyph:?} at {at} has no lever")]
    DanglingDoor { glyph: char, at: Position },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    World(#[from] WorldError),
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut origin = Position::new(0, 0);
    let mut rows = vec![];

    for (idx, line) in content.lines().enumerate() {
        let Some(directive) = line.strip_prefix('@') else {
            rows.push(line.trim_end_matches('\r').to_string());
            continue;
        };
        let bad = || LevelError::BadDirective { line: idx + 1, text: line.to_string() };
        let directive = directive.trim();
        if let Some(rest) = directive.strip_prefix("name") {
            name = rest.trim().to_string();
        } else if let Some(rest) = directive.strip_prefix("origin") {
            let (x, y) = rest.trim().split_once(',').ok_or_else(bad)?;
            let x = x.trim().parse::<i32>().map_err(|_| bad())?;
            let y = y.trim().parse::<i32>().map_err(|_| bad())?;
            origin = Position::new(x, y);
        } else {
            return Err(bad());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Unnamed".to_string();
    }

    Ok(LevelDef { name, rows, origin })
}

/// Door glyph -> (lever number, starts closed).
fn door_glyph(ch: char) -> Option<(u8, bool)> {
    match ch {
        'A'..='I' => Some((ch as u8 - b'A' + 1, true)),
        'a'..='i' => Some((ch as u8 - b'a' + 1, false)),
        _ => None,
    }
}

/// Build a fresh world from a level definition. The player gets the
/// first actor id; blocks follow in reading order.
pub fn build_world(def: &LevelDef) -> Result<World, LevelError> {
    let height = def.rows.len();
    let width = def.rows.first().map_or(0, |r| r.chars().count());
    let mut world = World::new(width, height, def.origin);

    let mut player: Option<Position> = None;
    let mut blocks = vec![];
    let mut doors = vec![];

    for (row, line) in def.rows.iter().enumerate() {
        let y = def.origin.y + (height - 1 - row) as i32;
        for (col, ch) in line.chars().enumerate() {
            let p = Position::new(def.origin.x + col as i32, y);
            match ch {
                ' ' | '.' => {}
                '#' => world.set_tile(p, Tile::Solid),
                'H' => world.set_tile(p, Tile::Ladder),
                'G' => world.set_tile(p, Tile::Goal),
                'P' => {
                    if player.is_some() {
                        return Err(LevelError::MultiplePlayers { at: p });
                    }
                    player = Some(p);
                }
                'B' => blocks.push((BlockKind::Stone, p)),
                'C' => blocks.push((BlockKind::TimeCube, p)),
                '1'..='9' => {
                    let lever = ch as u8 - b'0';
                    if world.lever(LeverId(lever)).is_some() {
                        return Err(LevelError::DuplicateLever { lever, at: p });
                    }
                    world.add_lever(LeverId(lever), p);
                }
                _ => match door_glyph(ch) {
                    Some((lever, closed)) => doors.push((ch, lever, closed, p)),
                    None => return Err(LevelError::UnknownGlyph { ch, row: row + 1, col: col + 1 }),
                },
            }
        }
    }

    let player = player.ok_or(LevelError::MissingPlayer)?;
    world.spawn(ActorKind::Player, player);
    for (kind, p) in blocks {
        world.spawn(ActorKind::Block(kind), p);
    }
    for (glyph, lever, closed, at) in doors {
        if world.lever(LeverId(lever)).is_none() {
            return Err(LevelError::DanglingDoor { glyph, at });
        }
        let door = world.add_door(at, closed);
        world.attach_door(LeverId(lever), door)?;
    }

    Ok(world)
}

// ══════════════════════════════════════════════════════════════
// Files and directories
// ══════════════════════════════════════════════════════════════

pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level(&content)
}

/// Every `.txt` level in `dir`, sorted by file name. Files that fail to
/// parse are skipped with a warning.
pub fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            match load_level_file(&path) {
                Ok(def) => {
                    let filename = path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    results.push((filename, def));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping level"),
            }
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results.into_iter().map(|(_, def)| def).collect()
}

/// Levels from the configured directory, or the built-in set if it has none.
pub fn available_levels(config: &GameConfig) -> Vec<LevelDef> {
    let levels = load_from_directory(&config.levels_dir);
    if levels.is_empty() {
        embedded_levels()
    } else {
        levels
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("First Steps", &[
            "          G",
            " P   #   ##",
            "###########",
        ]),
        make_embedded("Up the Ladder", &[
            "  G    H",
            "#######H",
            " P     H",
            "########",
        ]),
        make_embedded("Open Sesame", &[
            "         ",
            " P1  A  G",
            "#########",
        ]),
        make_embedded("Bridge of Time", &[
            " P C   G",
            "#### ###",
            "########",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
        origin: Position::new(0, 0),
    }
}

/// Build a world straight from map rows; directive lines are allowed.
#[cfg(test)]
pub(crate) fn world_from(rows: &[&str]) -> World {
    let def = parse_level(&rows.join("\n")).unwrap();
    build_world(&def).unwrap()
}
