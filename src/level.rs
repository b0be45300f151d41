use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::types::{Direction, Tile, Vec2};

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile character {found:?} at ({x}, {y})")]
    UnknownTile { found: char, x: i32, y: i32 },
    #[error("{name} anchor ({x}, {y}) is out of bounds")]
    AnchorOutOfBounds { name: &'static str, x: i32, y: i32 },
    #[error("{name} anchor ({x}, {y}) is not walkable")]
    AnchorBlocked { name: &'static str, x: i32, y: i32 },
    #[error("door anchor ({x}, {y}) is not a door tile")]
    DoorMismatch { x: i32, y: i32 },
    #[error("home anchor ({x}, {y}) is not a house tile")]
    HomeMismatch { x: i32, y: i32 },
    #[error("exit anchor ({exit_x}, {exit_y}) is not directly above the door ({door_x}, {door_y})")]
    ExitMisaligned {
        exit_x: i32,
        exit_y: i32,
        door_x: i32,
        door_y: i32,
    },
    #[error("tunnel row {row} is out of bounds")]
    TunnelRowOutOfBounds { row: i32 },
    #[error("{count} pellets are unreachable from the player spawn")]
    UnreachablePellets { count: usize },
}

/// Named coordinates supplied alongside the tile matrix. Ghost spawns and
/// scatter corners are indexed by `GhostPersonality::index()`.
#[derive(Clone, Debug)]
pub struct LevelAnchors {
    pub player_spawn: Vec2,
    pub ghost_spawns: [Vec2; 4],
    pub home_anchor: Vec2,
    pub door: Vec2,
    pub exit: Vec2,
    pub scatter_corners: [Vec2; 4],
    pub tunnel_rows: Vec<i32>,
}

/// A loaded level: fixed-shape tile matrix plus anchors. Only pellet
/// presence mutates after load (pellet tiles degrade to `Open`).
#[derive(Clone, Debug)]
pub struct Level {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    pellets_total: i32,
    pub anchors: LevelAnchors,
}

impl Level {
    /// Parses a rectangular matrix of tile characters. Legend: `#` wall,
    /// `.` pellet, `o` power pellet, space open floor, `H` house, `-` door.
    ///
    /// All load-time preconditions are checked here, once; the engine never
    /// re-validates per tick.
    pub fn parse(rows: &[&str], anchors: LevelAnchors) -> Result<Self, LevelError> {
        if rows.is_empty() {
            return Err(LevelError::Empty);
        }
        let width = rows[0].chars().count();
        let height = rows.len();

        let mut tiles = Vec::with_capacity(width * height);
        let mut pellets_total = 0;
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LevelError::NotRectangular {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' => Tile::Pellet,
                    'o' => Tile::PowerPellet,
                    ' ' => Tile::Open,
                    'H' => Tile::House,
                    '-' => Tile::Door,
                    _ => {
                        return Err(LevelError::UnknownTile {
                            found: ch,
                            x: x as i32,
                            y: y as i32,
                        })
                    }
                };
                if matches!(tile, Tile::Pellet | Tile::PowerPellet) {
                    pellets_total += 1;
                }
                tiles.push(tile);
            }
        }

        let level = Self {
            width: width as i32,
            height: height as i32,
            tiles,
            pellets_total,
            anchors,
        };
        level.validate()?;
        Ok(level)
    }

    /// The authentic built-in board: 19x20 tiles, one tunnel row, a
    /// three-cell ghost house below a single door.
    pub fn built_in() -> Self {
        Self::parse(&BUILT_IN_ROWS, built_in_anchors()).expect("built-in level data is valid")
    }

    fn validate(&self) -> Result<(), LevelError> {
        for &row in &self.anchors.tunnel_rows {
            if row < 0 || row >= self.height {
                return Err(LevelError::TunnelRowOutOfBounds { row });
            }
        }

        let named: [(&'static str, Vec2); 4] = [
            ("player spawn", self.anchors.player_spawn),
            ("home", self.anchors.home_anchor),
            ("door", self.anchors.door),
            ("exit", self.anchors.exit),
        ];
        for (name, pos) in named {
            if !self.in_bounds(pos) {
                return Err(LevelError::AnchorOutOfBounds {
                    name,
                    x: pos.x,
                    y: pos.y,
                });
            }
        }
        for pos in self.anchors.ghost_spawns {
            if !self.in_bounds(pos) {
                return Err(LevelError::AnchorOutOfBounds {
                    name: "ghost spawn",
                    x: pos.x,
                    y: pos.y,
                });
            }
            if self.tile(pos) == Tile::Wall {
                return Err(LevelError::AnchorBlocked {
                    name: "ghost spawn",
                    x: pos.x,
                    y: pos.y,
                });
            }
        }
        for pos in self.anchors.scatter_corners {
            if !self.in_bounds(pos) {
                return Err(LevelError::AnchorOutOfBounds {
                    name: "scatter corner",
                    x: pos.x,
                    y: pos.y,
                });
            }
        }

        let spawn = self.anchors.player_spawn;
        if !matches!(self.tile(spawn), Tile::Open | Tile::Pellet | Tile::PowerPellet) {
            return Err(LevelError::AnchorBlocked {
                name: "player spawn",
                x: spawn.x,
                y: spawn.y,
            });
        }
        let door = self.anchors.door;
        if self.tile(door) != Tile::Door {
            return Err(LevelError::DoorMismatch {
                x: door.x,
                y: door.y,
            });
        }
        let home = self.anchors.home_anchor;
        if self.tile(home) != Tile::House {
            return Err(LevelError::HomeMismatch {
                x: home.x,
                y: home.y,
            });
        }
        let exit = self.anchors.exit;
        if exit.x != door.x || exit.y != door.y - 1 {
            return Err(LevelError::ExitMisaligned {
                exit_x: exit.x,
                exit_y: exit.y,
                door_x: door.x,
                door_y: door.y,
            });
        }

        // Every pellet must be reachable from the player spawn, or the
        // level can never be cleared. Unreachable bare floor is tolerated
        // (decorative pockets outside the playable region).
        let reachable = self.reachable_from(spawn);
        let mut unreachable = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Vec2 { x, y };
                if matches!(self.tile(pos), Tile::Pellet | Tile::PowerPellet)
                    && !reachable.contains(&(x, y))
                {
                    unreachable += 1;
                }
            }
        }
        if unreachable > 0 {
            return Err(LevelError::UnreachablePellets { count: unreachable });
        }
        Ok(())
    }

    fn reachable_from(&self, start: Vec2) -> HashSet<(i32, i32)> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        seen.insert((start.x, start.y));
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            for dir in Direction::CARDINALS {
                let Some(next) = self.neighbor(pos, dir) else {
                    continue;
                };
                if self.tile(next) == Tile::Wall {
                    continue;
                }
                if seen.insert((next.x, next.y)) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn pellets_total(&self) -> i32 {
        self.pellets_total
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Tile at `pos`; out-of-bounds coordinates read as walls, so callers
    /// never need a separate bounds check.
    pub fn tile(&self, pos: Vec2) -> Tile {
        if !self.in_bounds(pos) {
            return Tile::Wall;
        }
        self.tiles[(pos.y * self.width + pos.x) as usize]
    }

    pub fn is_tunnel_row(&self, y: i32) -> bool {
        self.anchors.tunnel_rows.contains(&y)
    }

    /// The cell one step from `pos` in `dir`, wrapping horizontally on
    /// tunnel rows. `None` when the step leaves the grid anywhere else.
    pub fn neighbor(&self, pos: Vec2, dir: Direction) -> Option<Vec2> {
        let mut next = match dir {
            Direction::Up => Vec2 {
                x: pos.x,
                y: pos.y - 1,
            },
            Direction::Down => Vec2 {
                x: pos.x,
                y: pos.y + 1,
            },
            Direction::Left => Vec2 {
                x: pos.x - 1,
                y: pos.y,
            },
            Direction::Right => Vec2 {
                x: pos.x + 1,
                y: pos.y,
            },
            Direction::None => return None,
        };
        if (next.x < 0 || next.x >= self.width) && self.is_tunnel_row(next.y) {
            next.x = (next.x + self.width) % self.width;
        }
        self.in_bounds(next).then_some(next)
    }

    /// Removes the pellet at `pos`, if any, degrading the tile to `Open`.
    /// Returns the pellet kind that was consumed.
    pub fn consume_pellet(&mut self, pos: Vec2) -> Option<Tile> {
        let tile = self.tile(pos);
        if !matches!(tile, Tile::Pellet | Tile::PowerPellet) {
            return None;
        }
        self.tiles[(pos.y * self.width + pos.x) as usize] = Tile::Open;
        Some(tile)
    }
}

const BUILT_IN_ROWS: [&str; 20] = [
    "###################",
    "#........#........#",
    "#o##.###.#.###.##o#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "   #.#       #.#   ",
    "####.# ##-## #.####",
    " ....  #HHH#  .... ",
    "####.# ##### #.####",
    "   #.#       #.#   ",
    "####.#.#####.######",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#..... .....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "###################",
];

fn built_in_anchors() -> LevelAnchors {
    LevelAnchors {
        player_spawn: Vec2 { x: 9, y: 16 },
        ghost_spawns: [
            Vec2 { x: 9, y: 8 },
            Vec2 { x: 9, y: 10 },
            Vec2 { x: 8, y: 10 },
            Vec2 { x: 10, y: 10 },
        ],
        home_anchor: Vec2 { x: 9, y: 10 },
        door: Vec2 { x: 9, y: 9 },
        exit: Vec2 { x: 9, y: 8 },
        scatter_corners: [
            Vec2 { x: 17, y: 1 },
            Vec2 { x: 1, y: 1 },
            Vec2 { x: 17, y: 18 },
            Vec2 { x: 1, y: 18 },
        ],
        tunnel_rows: vec![10],
    }
}
