#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the excavation game.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative level, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the level executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, probe immutable
//! state, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest field edge, in columns, a level may be generated with.
pub const MAX_FIELD_SIZE: i32 = 10;

/// Largest number of diggable layers a column may carry.
pub const MAX_CELL_DEPTH: i32 = 10;

/// Tool allowance applied when the configured count is not positive.
pub const DEFAULT_TOOL_COUNT: i32 = 20;

/// Gold bar goal applied when the configured goal is not positive.
pub const DEFAULT_GOLD_BARS_TO_WIN: i32 = 3;

/// Version tag written at the head of every save file.
pub const SAVE_FORMAT_VERSION: i32 = 1;

/// Number of discrete buckets a reward trial probability is resolved into.
pub const TRIAL_RESOLUTION: i32 = 10_000;

/// Layer index of the floor marker that sits beneath every generated column.
pub const FLOOR_LAYER: i32 = -1;

/// Side length of a single square cell expressed in world units.
pub const TILE_LENGTH: f32 = 1.0;

/// Resource count carried by a freshly unearthed gold bar.
pub const GOLD_BAR_COUNT: i32 = 1;

/// Commands that express all permissible level mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Reseeds the reward generator and regenerates the level from its configuration.
    Restart {
        /// Time the host has been running; mixed into the new session seed.
        uptime: Duration,
    },
    /// Attempts to remove one ground layer from the column under the provided point.
    Dig {
        /// World-space point the player clicked.
        at: Vec3,
    },
    /// Takes an item out of the world so that it can follow the pointer.
    GrabItem {
        /// Item being picked up.
        item: ItemId,
    },
    /// Moves a held item so that it follows the pointer.
    DragItem {
        /// Item being dragged.
        item: ItemId,
        /// Pointer position the item should follow.
        to: Vec3,
    },
    /// Puts a held item back into the world at the provided position.
    ReleaseItem {
        /// Item being released.
        item: ItemId,
        /// Final resting position of the item.
        at: Vec3,
    },
    /// Moves an item's resources into the sack and destroys the item.
    DepositItem {
        /// Item being deposited.
        item: ItemId,
    },
}

/// Events broadcast by the level after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the level was regenerated from scratch.
    LevelRestarted {
        /// Field edge, in columns, after validation.
        field_size: i32,
        /// Number of diggable layers per column after validation.
        cell_depth: i32,
    },
    /// Announces that the level state was replaced by a saved game.
    LevelLoaded,
    /// Confirms that a ground layer was removed from a column.
    CellDug {
        /// Column that was dug.
        cell: CellCoord,
        /// Layer index that became empty.
        layer: i32,
    },
    /// Reports that a dig request was rejected without mutating the level.
    DigRejected {
        /// World-space point provided in the request.
        at: Vec3,
        /// Specific reason the dig failed.
        reason: DigError,
    },
    /// Reports the player's remaining tool allowance after it changed.
    ToolCountChanged {
        /// Tools left to dig with.
        remaining: i32,
    },
    /// Confirms that a reward trial placed a new item into the world.
    ItemSpawned {
        /// Identifier allocated to the item.
        item: ItemId,
        /// Position the item was placed at.
        position: Vec3,
    },
    /// Confirms that an item was lifted out of the world.
    ItemGrabbed {
        /// Identifier of the lifted item.
        item: ItemId,
        /// Position the item occupied when it was lifted.
        position: Vec3,
    },
    /// Confirms that a held item followed the pointer.
    ItemMoved {
        /// Identifier of the moved item.
        item: ItemId,
        /// Position the item occupies after moving.
        position: Vec3,
    },
    /// Confirms that a held item was put back into the world.
    ItemReleased {
        /// Identifier of the released item.
        item: ItemId,
        /// Resting position of the item.
        position: Vec3,
    },
    /// Confirms that an item was emptied into the sack and destroyed.
    ItemDeposited {
        /// Identifier of the destroyed item.
        item: ItemId,
        /// Resource count moved into the sack.
        count: i32,
    },
    /// Reports the sack's content after it changed.
    InventoryChanged {
        /// Gold bars held by the sack.
        count: i32,
    },
    /// Announces that the sack reached the gold bar goal.
    LevelWon,
    /// Announces that the player ran out of tools with nothing left to collect.
    LevelLost,
}

/// Reasons a dig request may be rejected by the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigError {
    /// The level is already won, so digging is disabled.
    AlreadyWon,
    /// The player has no tools left.
    NoTools,
    /// The point does not lie above a generated column.
    NoFloor,
    /// The column has no ground layers left.
    Exhausted,
    /// An item resting on the column prevents digging.
    Blocked,
}

/// Unique identifier assigned to an item placed in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single column expressed as signed grid coordinates.
///
/// Generated levels are centred on the world origin, so columns left of or
/// below the origin carry negative coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new column coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Maps a zero-based layout index to the centred column coordinate used
    /// by a field of the provided size.
    #[must_use]
    pub const fn from_layout(column: i32, row: i32, field_size: i32) -> Self {
        Self {
            x: column - field_size / 2,
            y: row - field_size / 2,
        }
    }

    /// Converts a world-space point into the column containing it.
    #[must_use]
    pub fn from_world(point: Vec3) -> Self {
        Self {
            x: (point.x / TILE_LENGTH).floor() as i32,
            y: (point.y / TILE_LENGTH).floor() as i32,
        }
    }

    /// Horizontal coordinate of the column.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the column.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// World-space centre of the column on the z = 0 plane.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.x as f32 + 0.5) * TILE_LENGTH,
            (self.y as f32 + 0.5) * TILE_LENGTH,
            0.0,
        )
    }
}

/// Content of a single diggable layer within a column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellTag {
    /// Nothing left to dig.
    #[default]
    Empty,
    /// Undisturbed soil.
    Ground,
}

impl CellTag {
    /// Byte written to save files for the tag.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Ground => 1,
        }
    }

    /// Decodes a save file byte, returning `None` for unknown values.
    #[must_use]
    pub const fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::Ground),
            _ => None,
        }
    }
}

/// Marker stored beneath every column at [`FLOOR_LAYER`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloorTag {
    /// The column was never generated or has been cleared.
    #[default]
    Absent,
    /// The column was generated and accepts digs and dropped items.
    BedRock,
}

/// Input device family that produced a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerScheme {
    /// Mouse pointer; drags follow continuous cursor motion.
    MouseKeyboard,
    /// Touch screen; drags follow the primary touch.
    Touch,
}

/// Read-only view of a level consulted by systems that turn input into commands.
pub trait WorldProbe {
    /// Reports whether the sack has reached the gold bar goal.
    fn is_won(&self) -> bool;

    /// Tools the player has left.
    fn tool_count(&self) -> i32;

    /// Resting item under a world-space point.
    fn item_at(&self, point: Vec3) -> Option<ItemId>;

    /// Current position of an item.
    fn item_position(&self, item: ItemId) -> Option<Vec3>;

    /// Centre of the generated column under a point.
    fn floor_below(&self, point: Vec3) -> Option<Vec3>;
}

/// Tunable parameters describing a level.
///
/// Values are accepted as provided and only validated when the level is
/// generated, mirroring how designers tweak them between runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelConfig {
    /// Field edge, in columns.
    pub field_size: i32,
    /// Diggable layers per column.
    pub cell_depth: i32,
    /// Tools granted at the start of a run.
    pub tool_count: i32,
    /// Gold bars the sack must hold to win.
    pub gold_bars_to_win: i32,
    /// Chance, in `[0, 1]`, that a successful dig unearths a gold bar.
    pub reward_probability: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            field_size: 10,
            cell_depth: 3,
            tool_count: 10,
            gold_bars_to_win: 3,
            reward_probability: 0.5,
        }
    }
}

impl LevelConfig {
    /// Parses a level configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Returns the configuration with every out-of-range value replaced.
    ///
    /// Field size and cell depth outside `(0, max]` snap to their maxima,
    /// non-positive tool counts and goals fall back to their defaults, and the
    /// reward probability is clamped into `[0, 1]`. Applying it twice yields
    /// the same result as applying it once.
    #[must_use]
    pub fn validated(self) -> Self {
        let field_size = if self.field_size <= 0 || self.field_size > MAX_FIELD_SIZE {
            MAX_FIELD_SIZE
        } else {
            self.field_size
        };
        let cell_depth = if self.cell_depth <= 0 || self.cell_depth > MAX_CELL_DEPTH {
            MAX_CELL_DEPTH
        } else {
            self.cell_depth
        };
        let tool_count = if self.tool_count <= 0 {
            DEFAULT_TOOL_COUNT
        } else {
            self.tool_count
        };
        let gold_bars_to_win = if self.gold_bars_to_win <= 0 {
            DEFAULT_GOLD_BARS_TO_WIN
        } else {
            self.gold_bars_to_win
        };
        let reward_probability = if self.reward_probability.is_nan() {
            0.0
        } else {
            self.reward_probability.clamp(0.0, 1.0)
        };

        Self {
            field_size,
            cell_depth,
            tool_count,
            gold_bars_to_win,
            reward_probability,
        }
    }
}

/// Errors raised while reading a level configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("could not parse level configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, CellTag, DigError, ItemId, LevelConfig, MAX_CELL_DEPTH, MAX_FIELD_SIZE};
    use glam::Vec3;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn level_config_round_trips_through_bincode() {
        assert_round_trip(&LevelConfig::default());
    }

    #[test]
    fn dig_error_round_trips_through_bincode() {
        assert_round_trip(&DigError::Blocked);
        assert_round_trip(&ItemId::new(9));
    }

    #[test]
    fn world_points_map_to_containing_column() {
        assert_eq!(CellCoord::from_world(Vec3::new(0.2, 0.9, 0.0)), CellCoord::new(0, 0));
        assert_eq!(CellCoord::from_world(Vec3::new(-0.1, 2.5, 3.0)), CellCoord::new(-1, 2));
        assert_eq!(CellCoord::new(-5, 4).center(), Vec3::new(-4.5, 4.5, 0.0));
    }

    #[test]
    fn layout_indices_are_centred_on_origin() {
        assert_eq!(CellCoord::from_layout(0, 0, 10), CellCoord::new(-5, -5));
        assert_eq!(CellCoord::from_layout(9, 9, 10), CellCoord::new(4, 4));
        assert_eq!(CellCoord::from_layout(0, 2, 3), CellCoord::new(-1, 1));
    }

    #[test]
    fn cell_tags_round_trip_through_bytes() {
        assert_eq!(CellTag::from_byte(CellTag::Ground.to_byte()), Some(CellTag::Ground));
        assert_eq!(CellTag::from_byte(CellTag::Empty.to_byte()), Some(CellTag::Empty));
        assert_eq!(CellTag::from_byte(7), None);
    }

    #[test]
    fn validation_snaps_invalid_dimensions_to_maxima() {
        let config = LevelConfig {
            field_size: 0,
            cell_depth: MAX_CELL_DEPTH + 1,
            tool_count: -4,
            gold_bars_to_win: 0,
            reward_probability: 1.5,
        }
        .validated();

        assert_eq!(config.field_size, MAX_FIELD_SIZE);
        assert_eq!(config.cell_depth, MAX_CELL_DEPTH);
        assert_eq!(config.tool_count, 20);
        assert_eq!(config.gold_bars_to_win, 3);
        assert!((config.reward_probability - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.validated(), config, "validation must be idempotent");
    }

    #[test]
    fn validation_keeps_values_in_range() {
        let config = LevelConfig::default();
        assert_eq!(config.validated(), config);
    }

    #[test]
    fn toml_fills_missing_keys_with_defaults() {
        let config = LevelConfig::from_toml_str("field_size = 6\nreward_probability = 0.25\n")
            .expect("config parses");
        assert_eq!(config.field_size, 6);
        assert_eq!(config.cell_depth, LevelConfig::default().cell_depth);
        assert!((config.reward_probability - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        assert!(LevelConfig::from_toml_str("shovels = 4\n").is_err());
    }
}
