use std::io::{Read, Write};

use excavation_core::{
    CellTag, Event, LevelConfig, MAX_CELL_DEPTH, MAX_FIELD_SIZE, SAVE_FORMAT_VERSION,
};
use excavation_persistence::{
    CodecError, GameDataReader, GameDataWriter, Persistable, StorageError,
};
use log::info;
use thiserror::Error;

use crate::{ItemRecord, Level, Player, Sack, SessionState};

const MAX_SAVED_ITEMS: i32 = MAX_FIELD_SIZE * MAX_FIELD_SIZE * MAX_CELL_DEPTH;

/// Errors raised while restoring a saved game.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The storage provider could not supply the saved bytes.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The saved bytes could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The save file was written by an incompatible format version.
    #[error("save format version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: i32,
        /// Version this build reads.
        expected: i32,
    },
    /// The stored field dimensions fall outside the supported extent.
    #[error("saved field of {field_size} columns and {cell_depth} layers is out of range")]
    InvalidDimensions {
        /// Stored field edge.
        field_size: i32,
        /// Stored layer count.
        cell_depth: i32,
    },
    /// A cell byte does not name a known tag.
    #[error("unknown cell tag {0}")]
    InvalidCellTag(u8),
    /// The stored item count is negative or exceeds what a field can hold.
    #[error("saved item count {0} is out of range")]
    InvalidItemCount(i32),
    /// An item or the sack carried a negative resource count.
    #[error("saved resource count {0} is negative")]
    NegativeCount(i32),
}

/// Errors raised while persisting a game.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The level could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The storage provider rejected the encoded bytes.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The level was never restarted or loaded, so it has no field to save.
    #[error("level has not been generated yet")]
    NotGenerated,
}

/// Complete persistent state of a level, in save file order.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveRecord {
    /// Level parameters; the dimensions describe the stored cell layout.
    pub config: LevelConfig,
    /// Reward generator state that drives the remaining trials.
    pub session: SessionState,
    /// Cell tags in column, row, layer order.
    pub cells: Vec<CellTag>,
    /// Items in allocation order.
    pub items: Vec<ItemRecord>,
    /// Sack content.
    pub sack: Sack,
    /// Player record.
    pub player: Player,
}

impl SaveRecord {
    /// Captures the persistent state of the level.
    #[must_use]
    pub fn capture(level: &Level) -> Self {
        Self {
            config: LevelConfig {
                field_size: level.grid.field_size(),
                cell_depth: level.grid.cell_depth(),
                ..level.config
            },
            session: level.rng.session_state(),
            cells: level.grid.layout_cells().collect(),
            items: level.items.records(),
            sack: level.sack,
            player: level.player,
        }
    }

    /// Encodes the record, starting with the format version.
    pub fn write<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
        writer.write_i32(SAVE_FORMAT_VERSION)?;
        writer.write_i32(self.config.field_size)?;
        writer.write_i32(self.config.cell_depth)?;
        writer.write_i32(self.config.tool_count)?;
        writer.write_i32(self.config.gold_bars_to_win)?;
        writer.write_f32(self.config.reward_probability)?;
        self.session.save(writer)?;

        for tag in &self.cells {
            writer.write_u8(tag.to_byte())?;
        }

        writer.write_i32(i32::try_from(self.items.len()).unwrap_or(i32::MAX))?;
        for item in &self.items {
            item.save(writer)?;
        }

        self.sack.save(writer)?;
        self.player.save(writer)
    }

    /// Decodes and validates a record written by [`SaveRecord::write`].
    pub fn read<R: Read>(reader: &mut GameDataReader<R>) -> Result<Self, LoadError> {
        let found = reader.read_i32()?;
        if found != SAVE_FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found,
                expected: SAVE_FORMAT_VERSION,
            });
        }

        let field_size = reader.read_i32()?;
        let cell_depth = reader.read_i32()?;
        if !(1..=MAX_FIELD_SIZE).contains(&field_size) || !(1..=MAX_CELL_DEPTH).contains(&cell_depth)
        {
            return Err(LoadError::InvalidDimensions {
                field_size,
                cell_depth,
            });
        }
        let config = LevelConfig {
            field_size,
            cell_depth,
            tool_count: reader.read_i32()?,
            gold_bars_to_win: reader.read_i32()?,
            reward_probability: reader.read_f32()?,
        };

        let mut session = SessionState::default();
        session.load(reader)?;

        let cell_count = field_size * field_size * cell_depth;
        let mut cells = Vec::with_capacity(usize::try_from(cell_count).unwrap_or_default());
        for _ in 0..cell_count {
            let byte = reader.read_u8()?;
            cells.push(CellTag::from_byte(byte).ok_or(LoadError::InvalidCellTag(byte))?);
        }

        let item_count = reader.read_i32()?;
        if !(0..=MAX_SAVED_ITEMS).contains(&item_count) {
            return Err(LoadError::InvalidItemCount(item_count));
        }
        let mut items = Vec::with_capacity(usize::try_from(item_count).unwrap_or_default());
        for _ in 0..item_count {
            let mut item = ItemRecord::default();
            item.load(reader)?;
            if item.count < 0 {
                return Err(LoadError::NegativeCount(item.count));
            }
            items.push(item);
        }

        let mut sack = Sack::new();
        sack.load(reader)?;
        if sack.gold_bars() < 0 {
            return Err(LoadError::NegativeCount(sack.gold_bars()));
        }

        let mut player = Player::default();
        player.load(reader)?;

        Ok(Self {
            config,
            session,
            cells,
            items,
            sack,
            player,
        })
    }

    /// Replaces the level state with the record and re-evaluates the outcome.
    pub fn apply(self, level: &mut Level, out_events: &mut Vec<Event>) {
        level.config = self.config.validated();
        level
            .grid
            .restore(self.config.field_size, self.config.cell_depth, &self.cells);
        level.rng.restore_session(self.session);
        level.items.restore(&self.items);
        level.sack = self.sack;
        level.player = self.player;
        level.won = false;
        level.lost = false;

        info!(
            "level loaded with {} items, {} gold bars and {} tools",
            self.items.len(),
            level.sack.gold_bars(),
            level.player.tools,
        );
        out_events.push(Event::LevelLoaded);
        out_events.push(Event::InventoryChanged {
            count: level.sack.gold_bars(),
        });
        out_events.push(Event::ToolCountChanged {
            remaining: level.player.tools,
        });
        level.check_win(out_events);
        level.check_lose(out_events);
    }
}

/// Writes the complete level state.
pub fn save<W: Write>(level: &Level, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
    SaveRecord::capture(level).write(writer)
}

/// Reads a saved game and applies it to the level.
///
/// The level is only touched once the whole record has been decoded and
/// validated, so a failed load leaves it as it was.
pub fn load<R: Read>(
    level: &mut Level,
    reader: &mut GameDataReader<R>,
    out_events: &mut Vec<Event>,
) -> Result<(), LoadError> {
    SaveRecord::read(reader)?.apply(level, out_events);
    Ok(())
}
