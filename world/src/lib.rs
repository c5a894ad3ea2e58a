#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for the excavation game.
//!
//! A [`Level`] owns the layered [`WorldGrid`], the reward generator, the
//! sack, the item pool and the player record. Every mutation arrives as a
//! [`Command`] through [`apply`], which reports what happened as [`Event`]
//! values in causal order. Read access goes through [`query`].

mod grid;
mod items;
mod player;
mod random;
mod sack;
mod save;
pub mod session;

use std::time::Duration;

use excavation_core::{
    CellCoord, Command, DigError, Event, ItemId, LevelConfig, WorldProbe, GOLD_BAR_COUNT,
};
use glam::Vec3;
use log::{debug, info};

pub use grid::WorldGrid;
pub use items::{Item, ItemPool, ItemRecord};
pub use player::Player;
pub use random::{RewardRng, SessionState};
pub use sack::Sack;
pub use save::{load, save, LoadError, SaveError, SaveRecord};

/// Represents the authoritative state of one excavation level.
#[derive(Clone, Debug)]
pub struct Level {
    config: LevelConfig,
    grid: WorldGrid,
    rng: RewardRng,
    sack: Sack,
    items: ItemPool,
    player: Player,
    won: bool,
    lost: bool,
}

impl Level {
    /// Creates an empty level. Nothing is generated until a restart or load.
    #[must_use]
    pub fn new(config: LevelConfig, rng: RewardRng) -> Self {
        Self {
            config,
            grid: WorldGrid::new(),
            rng,
            sack: Sack::new(),
            items: ItemPool::new(),
            player: Player::default(),
            won: false,
            lost: false,
        }
    }

    fn restart(&mut self, uptime: Duration, out_events: &mut Vec<Event>) {
        self.config = self.config.validated();
        self.rng.reseed_for_session(uptime);
        self.items.clear();
        self.grid
            .generate(self.config.field_size, self.config.cell_depth);
        self.sack.clear();
        self.player.tools = self.config.tool_count;
        self.won = false;
        self.lost = false;

        info!(
            "level restarted with {size}x{size} columns of {depth} layers and {tools} tools",
            size = self.config.field_size,
            depth = self.config.cell_depth,
            tools = self.player.tools,
        );
        out_events.push(Event::LevelRestarted {
            field_size: self.config.field_size,
            cell_depth: self.config.cell_depth,
        });
        out_events.push(Event::InventoryChanged {
            count: self.sack.gold_bars(),
        });
        out_events.push(Event::ToolCountChanged {
            remaining: self.player.tools,
        });
        self.check_win(out_events);
        self.check_lose(out_events);
    }

    fn dig_target(&self, at: Vec3) -> Result<(CellCoord, i32), DigError> {
        if self.won {
            return Err(DigError::AlreadyWon);
        }
        if self.player.tools <= 0 {
            return Err(DigError::NoTools);
        }

        let cell = CellCoord::from_world(at);
        let layer = self.grid.diggable_layer(cell)?;
        if self.items.occupant(cell).is_some() {
            return Err(DigError::Blocked);
        }
        Ok((cell, layer))
    }

    fn dig(&mut self, at: Vec3, out_events: &mut Vec<Event>) {
        let (cell, layer) = match self.dig_target(at) {
            Ok(target) => target,
            Err(reason) => {
                debug!("dig at {at} rejected: {reason:?}");
                out_events.push(Event::DigRejected { at, reason });
                return;
            }
        };

        let _ = self.grid.clear_layer(cell, layer);
        self.player.tools -= 1;
        out_events.push(Event::CellDug { cell, layer });

        if self.rng.trial(self.config.reward_probability) {
            let position = cell.center();
            let item = self.items.spawn(position, GOLD_BAR_COUNT);
            debug!("dig at {cell:?} unearthed item {}", item.get());
            out_events.push(Event::ItemSpawned { item, position });
        }

        out_events.push(Event::ToolCountChanged {
            remaining: self.player.tools,
        });
        self.check_lose(out_events);
    }

    fn deposit(&mut self, item: ItemId, out_events: &mut Vec<Event>) {
        let Some(removed) = self.items.remove(item) else {
            return;
        };

        let total = self.sack.add(removed.count());
        debug!("item {} deposited, sack holds {total}", item.get());
        out_events.push(Event::ItemDeposited {
            item,
            count: removed.count(),
        });
        out_events.push(Event::InventoryChanged { count: total });
        self.check_win(out_events);
        self.check_lose(out_events);
    }

    fn check_win(&mut self, out_events: &mut Vec<Event>) {
        let won = self.sack.gold_bars() >= self.config.gold_bars_to_win;
        if won && !self.won {
            info!("level won with {} gold bars", self.sack.gold_bars());
            out_events.push(Event::LevelWon);
        }
        self.won = won;
    }

    fn check_lose(&mut self, out_events: &mut Vec<Event>) {
        let lost = self.player.tools <= 0 && self.items.is_empty() && !self.won;
        if lost && !self.lost {
            info!("level lost: no tools and nothing left to collect");
            out_events.push(Event::LevelLost);
        }
        self.lost = lost;
    }
}

impl WorldProbe for Level {
    fn is_won(&self) -> bool {
        query::is_won(self)
    }

    fn tool_count(&self) -> i32 {
        query::tool_count(self)
    }

    fn item_at(&self, point: Vec3) -> Option<ItemId> {
        query::item_at(self, point)
    }

    fn item_position(&self, item: ItemId) -> Option<Vec3> {
        query::item_position(self, item)
    }

    fn floor_below(&self, point: Vec3) -> Option<Vec3> {
        query::floor_below(self, point)
    }
}

/// Applies the provided command to the level, mutating state deterministically.
pub fn apply(level: &mut Level, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Restart { uptime } => level.restart(uptime, out_events),
        Command::Dig { at } => level.dig(at, out_events),
        Command::GrabItem { item } => {
            if let Some(position) = level.items.grab(item) {
                out_events.push(Event::ItemGrabbed { item, position });
            }
        }
        Command::DragItem { item, to } => {
            if let Some(position) = level.items.move_held(item, to) {
                out_events.push(Event::ItemMoved { item, position });
            }
        }
        Command::ReleaseItem { item, at } => {
            if let Some(position) = level.items.release(item, at) {
                out_events.push(Event::ItemReleased { item, position });
            }
        }
        Command::DepositItem { item } => level.deposit(item, out_events),
    }
}

/// Query functions that provide read-only access to the level state.
pub mod query {
    use excavation_core::{ItemId, LevelConfig};
    use glam::Vec3;

    use super::{ItemPool, Level, WorldGrid};

    /// Configuration in effect; validated once the level has been generated.
    #[must_use]
    pub fn config(level: &Level) -> &LevelConfig {
        &level.config
    }

    /// Provides read-only access to the layered cell store.
    #[must_use]
    pub fn grid(level: &Level) -> &WorldGrid {
        &level.grid
    }

    /// Provides read-only access to the items placed in the world.
    #[must_use]
    pub fn items(level: &Level) -> &ItemPool {
        &level.items
    }

    /// Resting item under a world-space point, if any.
    #[must_use]
    pub fn item_at(level: &Level, point: Vec3) -> Option<ItemId> {
        level.items.item_at(point)
    }

    /// Current position of an item.
    #[must_use]
    pub fn item_position(level: &Level, item: ItemId) -> Option<Vec3> {
        level.items.get(item).map(|item| item.position())
    }

    /// Centre of the generated column under a point.
    #[must_use]
    pub fn floor_below(level: &Level, point: Vec3) -> Option<Vec3> {
        level.grid.floor_below(point)
    }

    /// Gold bars held by the sack.
    #[must_use]
    pub fn gold_bars(level: &Level) -> i32 {
        level.sack.gold_bars()
    }

    /// Tools the player has left.
    #[must_use]
    pub fn tool_count(level: &Level) -> i32 {
        level.player.tools
    }

    /// Reports whether the sack has reached the gold bar goal.
    #[must_use]
    pub fn is_won(level: &Level) -> bool {
        level.won
    }

    /// Reports whether the level is in its lost state.
    #[must_use]
    pub fn is_lost(level: &Level) -> bool {
        level.lost
    }

    /// Position of the player avatar.
    #[must_use]
    pub fn player_position(level: &Level) -> Vec3 {
        level.player.position
    }
}
