/// Movement resolver: a pure decision function.
///
/// Given a mover, a direction and an occupancy oracle, compute where the
/// move ends (or why it cannot happen) without touching any state. For a
/// push, the full chain of displaced blocks is part of the answer, so the
/// caller can commit pusher and pushed blocks together.
///
/// ## Horizontal (Left / Right)
/// ┌──────────────────────────────────┬──────────────────────────────┐
/// │ Offset tile                       │ Result                       │
/// ├──────────────────────────────────┼──────────────────────────────┤
/// │ free, character, ladder there     │ Walk → offset                │
/// │ free, ground below                │ Walk → offset                │
/// │ free, nothing below               │ Fall → landing (via offset)  │
/// │ block                             │ Push chain, Walk → offset    │
/// │ terrain, character, free above    │ StepUp → offset + up         │
/// │ terrain, otherwise                │ DENY                         │
/// └──────────────────────────────────┴──────────────────────────────┘
///
/// ## Up
/// ┌──────────────────────────────────┬──────────────────────────────┐
/// │ mover is a block                  │ DENY                         │
/// │ not standing on a ladder          │ DENY                         │
/// │ obstacle above (even on a ladder) │ DENY                         │
/// │ otherwise                         │ Climb → above                │
/// └──────────────────────────────────┴──────────────────────────────┘
///
/// ## Down
/// ┌──────────────────────────────────┬──────────────────────────────┐
/// │ obstacle below (even on a ladder) │ DENY                         │
/// │ character, ladder below           │ Climb → below                │
/// │ otherwise                         │ Fall → landing               │
/// └──────────────────────────────────┴──────────────────────────────┘
///
/// ## Landing
/// Step down while the tile under the cursor holds nothing up
/// (`Category::ground_for(kind)`). Characters land on ladder tops, blocks
/// fall through ladders. More than `max_fall_check` steps is fatal.

use super::actor::ActorId;
use super::grid::{Direction, Position};
use super::occupancy::{Category, OccupancyOracle, Occupant};

/// Default fall-check limit.
pub const DEFAULT_MAX_FALL_CHECK: u32 = 50;

/// Movement rule parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementRules {
    /// Tiles a fall may cover before it counts as bottomless.
    pub max_fall_check: u32,
}

impl Default for MovementRules {
    fn default() -> Self {
        MovementRules { max_fall_check: DEFAULT_MAX_FALL_CHECK }
    }
}

/// Which rule set applies to a mover.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoverKind {
    /// Player or ghost: climbs ladders, steps up, stops on ladders.
    Character,
    /// Pushable block: no climbing, falls through ladders.
    Block,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mover {
    pub id: ActorId,
    pub position: Position,
    pub kind: MoverKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionKind {
    Walk,
    StepUp,
    Climb,
    Fall,
    Push,
}

/// One block displaced by a push.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PushStep {
    pub block: ActorId,
    pub from: Position,
    pub to: Position,
    /// Set when the block slides off an edge and drops to `to`.
    pub via: Option<Position>,
}

/// A legal move, fully resolved.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MovePlan {
    pub origin: Position,
    pub destination: Position,
    /// Intermediate waypoint: horizontal displacement first, then the drop.
    pub via: Option<Position>,
    pub motion: MotionKind,
    /// Push chain, nearest block first. Empty unless `motion == Push`.
    pub pushed: Vec<PushStep>,
}

impl MovePlan {
    fn simple(origin: Position, destination: Position, motion: MotionKind) -> Self {
        MovePlan { origin, destination, via: None, motion, pushed: Vec::new() }
    }

    /// Tiles dropped at the end of the move.
    pub fn fall_distance(&self) -> u32 {
        let top = self.via.unwrap_or(self.origin);
        if self.motion == MotionKind::Fall {
            top.y.abs_diff(self.destination.y)
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum MoveError {
    #[error("{at} is blocked")]
    Blocked { at: Position },

    #[error("push chain is blocked at {at}")]
    PushBlocked { at: Position },

    #[error("no ladder at {at}")]
    NoLadder { at: Position },

    #[error("nothing to land on within {limit} tiles below {from}")]
    BottomlessFall { from: Position, limit: u32 },
}

impl MoveError {
    /// A bottomless fall kills the mover; every other rejection is silent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MoveError::BottomlessFall { .. })
    }
}

// ══════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════

/// Resolve one step of `mover` in `direction`.
pub fn resolve_move<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    mover: &Mover,
    direction: Direction,
    rules: &MovementRules,
) -> Result<MovePlan, MoveError> {
    match direction {
        Direction::Left | Direction::Right => resolve_horizontal(oracle, mover, direction, rules),
        Direction::Up => resolve_up(oracle, mover),
        Direction::Down => resolve_down(oracle, mover, rules),
    }
}

/// Final resting tile of a mover dropped at `start`.
pub fn resolve_landing<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    start: Position,
    kind: MoverKind,
    rules: &MovementRules,
) -> Result<Position, MoveError> {
    let ground = Category::ground_for(kind);
    let mut cursor = start;
    let mut steps = 0;
    while !oracle.is_occupied(cursor.down(), ground) {
        if steps >= rules.max_fall_check {
            return Err(MoveError::BottomlessFall { from: start, limit: rules.max_fall_check });
        }
        cursor = cursor.down();
        steps += 1;
    }
    Ok(cursor)
}

/// Is a mover of `kind` at `position` unsupported?
pub fn is_floating<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    position: Position,
    kind: MoverKind,
) -> bool {
    if kind == MoverKind::Character && oracle.is_occupied(position, Category::LADDER) {
        return false;
    }
    !oracle.is_occupied(position.down(), Category::ground_for(kind))
}

// ══════════════════════════════════════════════════════════════
// Horizontal
// ══════════════════════════════════════════════════════════════

fn resolve_horizontal<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    mover: &Mover,
    direction: Direction,
    rules: &MovementRules,
) -> Result<MovePlan, MoveError> {
    let origin = mover.position;
    let offset = origin.offset(direction);

    match oracle.query(offset, Category::OBSTACLE) {
        None => {
            let (destination, via) = settle_into(oracle, offset, mover.kind, rules)?;
            let motion = if via.is_some() { MotionKind::Fall } else { MotionKind::Walk };
            Ok(MovePlan { origin, destination, via, motion, pushed: Vec::new() })
        }
        Some(Occupant::Block(first)) => {
            let pushed = resolve_push_chain(oracle, first, offset, direction, rules)?;
            Ok(MovePlan { origin, destination: offset, via: None, motion: MotionKind::Push, pushed })
        }
        Some(_) if mover.kind == MoverKind::Character => {
            let above = offset.up();
            if oracle.is_occupied(above, Category::OBSTACLE) {
                return Err(MoveError::Blocked { at: offset });
            }
            Ok(MovePlan::simple(origin, above, MotionKind::StepUp))
        }
        Some(_) => Err(MoveError::Blocked { at: offset }),
    }
}

/// Where a mover entering the free tile `target` comes to rest.
/// Returns the landing tile and, when it dropped, the waypoint it fell from.
fn settle_into<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    target: Position,
    kind: MoverKind,
    rules: &MovementRules,
) -> Result<(Position, Option<Position>), MoveError> {
    // Entering a ladder halts fall-through
    if kind == MoverKind::Character && oracle.is_occupied(target, Category::LADDER) {
        return Ok((target, None));
    }
    let landing = resolve_landing(oracle, target, kind, rules)?;
    if landing == target {
        Ok((target, None))
    } else {
        Ok((landing, Some(target)))
    }
}

/// Collect every block in line from `first` and check the tail can land.
///
/// Every block but the last slides into the tile its successor vacates;
/// the last one moves like a block mover would. Either the whole chain
/// moves or nothing does.
fn resolve_push_chain<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    first: ActorId,
    at: Position,
    direction: Direction,
    rules: &MovementRules,
) -> Result<Vec<PushStep>, MoveError> {
    let mut chain = vec![(first, at)];
    let mut cursor = at.offset(direction);
    loop {
        match oracle.query(cursor, Category::OBSTACLE) {
            Some(Occupant::Block(id)) => {
                chain.push((id, cursor));
                cursor = cursor.offset(direction);
            }
            Some(_) => return Err(MoveError::PushBlocked { at: cursor }),
            None => break,
        }
    }

    // A tail that would fall out of the world cannot be pushed
    let (tail_to, tail_via) = settle_into(oracle, cursor, MoverKind::Block, rules)
        .map_err(|_| MoveError::PushBlocked { at: cursor })?;

    let last = chain.len() - 1;
    let steps = chain
        .into_iter()
        .enumerate()
        .map(|(i, (block, from))| {
            if i == last {
                PushStep { block, from, to: tail_to, via: tail_via }
            } else {
                PushStep { block, from, to: from.offset(direction), via: None }
            }
        })
        .collect();
    Ok(steps)
}

// ══════════════════════════════════════════════════════════════
// Vertical
// ══════════════════════════════════════════════════════════════

fn resolve_up<O: OccupancyOracle + ?Sized>(oracle: &O, mover: &Mover) -> Result<MovePlan, MoveError> {
    let origin = mover.position;
    if mover.kind == MoverKind::Block || !oracle.is_occupied(origin, Category::LADDER) {
        return Err(MoveError::NoLadder { at: origin });
    }
    let above = origin.up();
    // A block resting in a ladder shaft plugs it
    if oracle.is_occupied(above, Category::OBSTACLE) {
        return Err(MoveError::Blocked { at: above });
    }
    Ok(MovePlan::simple(origin, above, MotionKind::Climb))
}

/// Anything solid below stops the move, ladder or not. A ladder below is
/// climbed; a free tile below drops the mover.
fn resolve_down<O: OccupancyOracle + ?Sized>(
    oracle: &O,
    mover: &Mover,
    rules: &MovementRules,
) -> Result<MovePlan, MoveError> {
    let origin = mover.position;
    let below = origin.down();
    if oracle.is_occupied(below, Category::OBSTACLE) {
        return Err(MoveError::Blocked { at: below });
    }
    if mover.kind == MoverKind::Character && oracle.is_occupied(below, Category::LADDER) {
        return Ok(MovePlan::simple(origin, below, MotionKind::Climb));
    }
    let destination = resolve_landing(oracle, origin, mover.kind, rules)?;
    Ok(MovePlan::simple(origin, destination, MotionKind::Fall))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fixture oracle built from a diagram.
    /// Legend: '#'=solid  'H'=ladder  'B'=block  '$'=block inside a ladder
    /// ' '/'.'=empty
    /// The bottom row sits at `origin.y`; rows are listed top first.
    struct Grid {
        cells: HashMap<Position, char>,
    }

    impl Grid {
        fn from(rows: &[&str], origin: Position) -> Self {
            let mut cells = HashMap::new();
            let h = rows.len() as i32;
            for (r, row) in rows.iter().enumerate() {
                for (c, ch) in row.chars().enumerate() {
                    let p = Position::new(origin.x + c as i32, origin.y + (h - 1 - r as i32));
                    cells.insert(p, ch);
                }
            }
            Grid { cells }
        }

        fn block_id(p: Position) -> ActorId {
            ActorId((p.x * 100 + p.y).unsigned_abs())
        }
    }

    impl OccupancyOracle for Grid {
        fn query(&self, position: Position, mask: Category) -> Option<Occupant> {
            let ch = *self.cells.get(&position).unwrap_or(&' ');
            if mask.contains(Category::STONE) && (ch == 'B' || ch == '$') {
                return Some(Occupant::Block(Grid::block_id(position)));
            }
            if mask.contains(Category::MOVEMENT) && ch == '#' {
                return Some(Occupant::Terrain);
            }
            if mask.contains(Category::LADDER) && (ch == 'H' || ch == '$') {
                return Some(Occupant::Ladder);
            }
            None
        }
    }

    fn character(x: i32, y: i32) -> Mover {
        Mover { id: ActorId(0), position: Position::new(x, y), kind: MoverKind::Character }
    }

    fn block(x: i32, y: i32) -> Mover {
        Mover { id: Grid::block_id(Position::new(x, y)), position: Position::new(x, y), kind: MoverKind::Block }
    }

    fn rules() -> MovementRules {
        MovementRules::default()
    }

    fn at(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    // ── Horizontal ──

    #[test]
    fn walk_onto_ground() {
        // Player at (0,0), free (1,0), ground at (1,-1)
        let g = Grid::from(&[
            "   ",
            "###",
        ], at(0, -1));
        let plan = resolve_move(&g, &character(0, 0), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 0));
        assert_eq!(plan.motion, MotionKind::Walk);
        assert!(plan.pushed.is_empty());
    }

    #[test]
    fn walk_off_ledge_falls_via_offset() {
        let g = Grid::from(&[
            "   ",
            "#  ",
            "#  ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 3), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.via, Some(at(1, 3)));
        assert_eq!(plan.destination, at(1, 1));
        assert_eq!(plan.motion, MotionKind::Fall);
        assert_eq!(plan.fall_distance(), 2);
    }

    #[test]
    fn walk_into_ladder_does_not_fall() {
        let g = Grid::from(&[
            "  ",
            "#H",
            "#H",
            "##",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 3), Direction::Right, &rules());
        // (1,3) has ladder below it: supported, plain walk
        assert_eq!(plan.unwrap().destination, at(1, 3));

        let g = Grid::from(&[
            " H",
            "# ",
            "# ",
            "##",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 3), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 3));
        assert_eq!(plan.motion, MotionKind::Walk);
    }

    #[test]
    fn step_up_one_tile() {
        let g = Grid::from(&[
            "   ",
            " # ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 2));
        assert_eq!(plan.motion, MotionKind::StepUp);
    }

    #[test]
    fn step_up_denied_under_wall() {
        let g = Grid::from(&[
            " # ",
            " # ",
            "###",
        ], at(0, 0));
        let err = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap_err();
        assert_eq!(err, MoveError::Blocked { at: at(1, 1) });
        assert!(!err.is_fatal());
    }

    #[test]
    fn block_cannot_step_up() {
        let g = Grid::from(&[
            "   ",
            "B# ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &block(0, 1), Direction::Right, &rules()),
            Err(MoveError::Blocked { at: at(1, 1) })
        );
    }

    // ── Pushing ──

    #[test]
    fn push_single_block() {
        // Player (0,0), block (1,0), free (2,0), ground under both
        let g = Grid::from(&[
            " B  ",
            "####",
        ], at(0, -1));
        let plan = resolve_move(&g, &character(0, 0), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.motion, MotionKind::Push);
        assert_eq!(plan.destination, at(1, 0));
        assert_eq!(plan.pushed.len(), 1);
        assert_eq!(plan.pushed[0].from, at(1, 0));
        assert_eq!(plan.pushed[0].to, at(2, 0));
        assert_eq!(plan.pushed[0].via, None);
    }

    #[test]
    fn push_chain_moves_in_direction_order() {
        let g = Grid::from(&[
            " BBB  ",
            "######",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap();
        let moves: Vec<_> = plan.pushed.iter().map(|s| (s.from, s.to)).collect();
        assert_eq!(moves, vec![
            (at(1, 1), at(2, 1)),
            (at(2, 1), at(3, 1)),
            (at(3, 1), at(4, 1)),
        ]);
    }

    #[test]
    fn push_chain_against_wall_is_rejected_whole() {
        let g = Grid::from(&[
            " BB# ",
            "#####",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(0, 1), Direction::Right, &rules()),
            Err(MoveError::PushBlocked { at: at(3, 1) })
        );
    }

    #[test]
    fn push_succeeds_iff_tile_beyond_chain_is_free() {
        for n in 1..5 {
            let mut free = String::from(" ");
            free.push_str(&"B".repeat(n));
            free.push(' ');
            let mut walled = String::from(" ");
            walled.push_str(&"B".repeat(n));
            walled.push('#');
            let floor = "#".repeat(n + 2);

            let g = Grid::from(&[free.as_str(), floor.as_str()], at(0, 0));
            let plan = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap();
            assert_eq!(plan.pushed.len(), n);

            let g = Grid::from(&[walled.as_str(), floor.as_str()], at(0, 0));
            assert!(resolve_move(&g, &character(0, 1), Direction::Right, &rules()).is_err());
        }
    }

    #[test]
    fn pushed_tail_drops_off_edge() {
        let g = Grid::from(&[
            " B  ",
            "##  ",
            "####",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(0, 2), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.pushed[0].to, at(2, 1));
        assert_eq!(plan.pushed[0].via, Some(at(2, 2)));
    }

    #[test]
    fn push_into_bottomless_pit_is_rejected() {
        let g = Grid::from(&[
            " B ",
            "## ",
        ], at(0, 0));
        let err = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap_err();
        assert_eq!(err, MoveError::PushBlocked { at: at(2, 1) });
        assert!(!err.is_fatal());
    }

    #[test]
    fn block_pushes_block() {
        let g = Grid::from(&[
            "BB ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &block(0, 1), Direction::Right, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 1));
        assert_eq!(plan.pushed[0].to, at(2, 1));
    }

    #[test]
    fn push_left() {
        let g = Grid::from(&[
            " B ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(2, 1), Direction::Left, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 1));
        assert_eq!(plan.pushed[0].to, at(0, 1));
    }

    // ── Vertical ──

    #[test]
    fn climb_up_ladder() {
        let g = Grid::from(&[
            " H ",
            " H ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(1, 1), Direction::Up, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 2));
        assert_eq!(plan.motion, MotionKind::Climb);
    }

    #[test]
    fn climb_out_of_ladder_top() {
        let g = Grid::from(&[
            "   ",
            " H ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(1, 1), Direction::Up, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 2));
    }

    #[test]
    fn up_requires_ladder() {
        let g = Grid::from(&[
            "   ",
            "   ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(1, 1), Direction::Up, &rules()),
            Err(MoveError::NoLadder { at: at(1, 1) })
        );
    }

    #[test]
    fn up_blocked_by_ceiling() {
        let g = Grid::from(&[
            " # ",
            " H ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(1, 1), Direction::Up, &rules()),
            Err(MoveError::Blocked { at: at(1, 2) })
        );
    }

    #[test]
    fn blocks_never_climb() {
        let g = Grid::from(&[
            "   ",
            " H ",
            "###",
        ], at(0, 0));
        assert!(resolve_move(&g, &block(1, 1), Direction::Up, &rules()).is_err());
    }

    #[test]
    fn climb_down_onto_ladder() {
        let g = Grid::from(&[
            "   ",
            " H ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(1, 2), Direction::Down, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 1));
        assert_eq!(plan.motion, MotionKind::Climb);
    }

    #[test]
    fn drop_off_ladder_bottom() {
        let g = Grid::from(&[
            " H ",
            "   ",
            "   ",
            "###",
        ], at(0, 0));
        let plan = resolve_move(&g, &character(1, 3), Direction::Down, &rules()).unwrap();
        assert_eq!(plan.destination, at(1, 1));
        assert_eq!(plan.motion, MotionKind::Fall);
    }

    #[test]
    fn down_into_ground_is_rejected() {
        let g = Grid::from(&[
            "   ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(1, 1), Direction::Down, &rules()),
            Err(MoveError::Blocked { at: at(1, 0) })
        );
    }

    #[test]
    fn block_in_ladder_shaft_stops_climbing() {
        // Block resting at the shaft bottom (1,1)
        let g = Grid::from(&[
            " H ",
            " H ",
            " $ ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(1, 2), Direction::Down, &rules()),
            Err(MoveError::Blocked { at: at(1, 1) })
        );

        let g = Grid::from(&[
            " $ ",
            " H ",
            "###",
        ], at(0, 0));
        assert_eq!(
            resolve_move(&g, &character(1, 1), Direction::Up, &rules()),
            Err(MoveError::Blocked { at: at(1, 2) })
        );
    }

    // ── Landing ──

    #[test]
    fn character_stops_on_ladder_block_falls_through() {
        let g = Grid::from(&[
            "   ",
            "   ",
            " H ",
            "   ",
            "###",
        ], at(0, 0));
        let c = resolve_landing(&g, at(1, 4), MoverKind::Character, &rules()).unwrap();
        assert_eq!(c, at(1, 3));
        let b = resolve_landing(&g, at(1, 4), MoverKind::Block, &rules()).unwrap();
        assert_eq!(b, at(1, 1));
    }

    #[test]
    fn block_lands_on_block() {
        let g = Grid::from(&[
            "   ",
            "   ",
            " B ",
            "###",
        ], at(0, 0));
        assert_eq!(resolve_landing(&g, at(1, 3), MoverKind::Block, &rules()), Ok(at(1, 2)));
    }

    #[test]
    fn bottomless_fall_is_fatal() {
        let g = Grid::from(&["   "], at(0, 0));
        let err = resolve_move(&g, &character(1, 0), Direction::Down, &rules()).unwrap_err();
        assert_eq!(err, MoveError::BottomlessFall { from: at(1, 0), limit: 50 });
        assert!(err.is_fatal());
    }

    #[test]
    fn walking_into_void_is_fatal_not_teleport() {
        let g = Grid::from(&[
            "  ",
            "# ",
        ], at(0, 0));
        let err = resolve_move(&g, &character(0, 1), Direction::Right, &rules()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn fall_limit_is_inclusive() {
        let limit = MovementRules { max_fall_check: 3 };
        // ground 3 below the start: lands
        let g = Grid::from(&[" ", " ", " ", " ", "#"], at(0, 0));
        assert_eq!(resolve_landing(&g, at(0, 4), MoverKind::Block, &limit), Ok(at(0, 1)));
        // ground 4 below: one step too many
        let g = Grid::from(&[" ", " ", " ", " ", " ", "#"], at(0, 0));
        assert!(resolve_landing(&g, at(0, 5), MoverKind::Block, &limit).is_err());
    }

    #[test]
    fn resolution_is_deterministic() {
        let g = Grid::from(&[
            " H  B ",
            " H ## ",
            "######",
        ], at(0, 0));
        for dir in Direction::ALL {
            for x in 0..6 {
                let m = character(x, 2);
                assert_eq!(
                    resolve_move(&g, &m, dir, &rules()),
                    resolve_move(&g, &m, dir, &rules())
                );
            }
        }
    }

    #[test]
    fn floating_checks() {
        let g = Grid::from(&[
            "H  ",
            "H  ",
            "###",
        ], at(0, 0));
        assert!(!is_floating(&g, at(0, 2), MoverKind::Character));
        assert!(is_floating(&g, at(1, 2), MoverKind::Character));
        assert!(!is_floating(&g, at(1, 1), MoverKind::Block));
        // Block on a ladder tile still falls
        assert!(is_floating(&g, at(0, 2), MoverKind::Block));
    }
}
