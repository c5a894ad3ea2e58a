//! Boot and quit helpers that connect a [`Level`] to a [`Storage`] provider.

use std::time::Duration;

use excavation_core::{Command, Event, LevelConfig};
use excavation_persistence::{GameDataReader, GameDataWriter, Storage};
use log::{info, warn};

use crate::{apply, Level, LoadError, RewardRng, SaveError, SaveRecord};

/// Builds a level, resuming the saved game when one is present.
///
/// A missing save starts a fresh level. A save that cannot be loaded is
/// logged and also replaced by a fresh level.
pub fn start<S>(
    config: LevelConfig,
    rng: RewardRng,
    storage: &S,
    uptime: Duration,
) -> (Level, Vec<Event>)
where
    S: Storage + ?Sized,
{
    let mut level = Level::new(config, rng);
    let mut events = Vec::new();

    if storage.exists() {
        match load(&mut level, storage, &mut events) {
            Ok(()) => return (level, events),
            Err(error) => warn!("saved game rejected, starting a fresh level: {error}"),
        }
    }

    apply(&mut level, Command::Restart { uptime }, &mut events);
    (level, events)
}

/// Encodes the level and hands the whole save to the storage provider.
///
/// A level that was never generated is refused and the storage is left alone.
pub fn save<S>(level: &Level, storage: &mut S) -> Result<(), SaveError>
where
    S: Storage + ?Sized,
{
    if level.grid.field_size() <= 0 || level.grid.cell_depth() <= 0 {
        return Err(SaveError::NotGenerated);
    }

    let mut writer = GameDataWriter::new(Vec::new());
    SaveRecord::capture(level).write(&mut writer)?;
    let bytes = writer.into_inner();
    storage.write_all(&bytes)?;
    info!("saved game of {} bytes", bytes.len());
    Ok(())
}

/// Reads the saved game from the storage provider and applies it to the level.
pub fn load<S>(level: &mut Level, storage: &S, out_events: &mut Vec<Event>) -> Result<(), LoadError>
where
    S: Storage + ?Sized,
{
    let bytes = storage.read_all()?;
    let mut reader = GameDataReader::new(bytes.as_slice());
    SaveRecord::read(&mut reader)?.apply(level, out_events);
    Ok(())
}
