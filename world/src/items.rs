use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};

use excavation_core::{CellCoord, ItemId};
use excavation_persistence::{CodecError, GameDataReader, GameDataWriter, Persistable};
use glam::Vec3;

/// Pickable item placed somewhere in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    id: ItemId,
    position: Vec3,
    count: i32,
    anchor: Option<Vec3>,
}

impl Item {
    /// Identifier allocated by the pool.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Current world-space position, following the pointer while held.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Resources the item moves into the sack when deposited.
    #[must_use]
    pub const fn count(&self) -> i32 {
        self.count
    }

    /// Reports whether the item is under pointer control.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.anchor.is_some()
    }

    /// Position the item rested at before it was grabbed.
    #[must_use]
    pub const fn anchor(&self) -> Option<Vec3> {
        self.anchor
    }

    fn resting_position(&self) -> Vec3 {
        self.anchor.unwrap_or(self.position)
    }
}

/// Save file record of a single item.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ItemRecord {
    /// Resting position of the item.
    pub position: Vec3,
    /// Resources carried by the item.
    pub count: i32,
}

impl Persistable for ItemRecord {
    fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError> {
        writer.write_vec3(self.position)?;
        writer.write_i32(self.count)
    }

    fn load<R: Read>(&mut self, reader: &mut GameDataReader<R>) -> Result<(), CodecError> {
        self.position = reader.read_vec3()?;
        self.count = reader.read_i32()?;
        Ok(())
    }
}

/// Owns every item placed in the world.
///
/// Items are kept in allocation order so that saves are deterministic, and
/// resting items are indexed by the column they occupy. Held items leave the
/// index until they are released.
#[derive(Clone, Debug, Default)]
pub struct ItemPool {
    next_id: u32,
    items: BTreeMap<ItemId, Item>,
    resting: HashMap<CellCoord, BTreeSet<ItemId>>,
}

impl ItemPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a new resting item and returns its identifier.
    pub fn spawn(&mut self, position: Vec3, count: i32) -> ItemId {
        let id = ItemId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.items.insert(
            id,
            Item {
                id,
                position,
                count,
                anchor: None,
            },
        );
        self.index(id, position);
        id
    }

    /// Looks up an item.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Iterates the items in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    /// Number of items in the world, held or resting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether no item remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recently created resting item in the column.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<ItemId> {
        self.resting
            .get(&cell)
            .and_then(|ids| ids.last().copied())
    }

    /// Resting item under a world-space point.
    #[must_use]
    pub fn item_at(&self, point: Vec3) -> Option<ItemId> {
        self.occupant(CellCoord::from_world(point))
    }

    /// Lifts a resting item, returning the position it is anchored to.
    pub fn grab(&mut self, id: ItemId) -> Option<Vec3> {
        let item = self.items.get_mut(&id)?;
        if item.anchor.is_some() {
            return None;
        }
        item.anchor = Some(item.position);
        let position = item.position;
        self.unindex(id, position);
        Some(position)
    }

    /// Moves a held item in the plane, keeping its own depth.
    pub fn move_held(&mut self, id: ItemId, to: Vec3) -> Option<Vec3> {
        let item = self.items.get_mut(&id).filter(|item| item.is_held())?;
        item.position = Vec3::new(to.x, to.y, item.position.z);
        Some(item.position)
    }

    /// Puts a held item back into the world, keeping its own depth.
    pub fn release(&mut self, id: ItemId, at: Vec3) -> Option<Vec3> {
        let item = self.items.get_mut(&id).filter(|item| item.is_held())?;
        item.position = Vec3::new(at.x, at.y, item.position.z);
        item.anchor = None;
        let position = item.position;
        self.index(id, position);
        Some(position)
    }

    /// Destroys an item.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let item = self.items.remove(&id)?;
        if !item.is_held() {
            self.unindex(id, item.position);
        }
        Some(item)
    }

    /// Destroys every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.resting.clear();
    }

    /// Replaces the pool content with resting items built from save records.
    pub fn restore(&mut self, records: &[ItemRecord]) {
        self.clear();
        for record in records {
            let _ = self.spawn(record.position, record.count);
        }
    }

    /// Save records in allocation order. Held items record their anchor.
    #[must_use]
    pub fn records(&self) -> Vec<ItemRecord> {
        self.items
            .values()
            .map(|item| ItemRecord {
                position: item.resting_position(),
                count: item.count,
            })
            .collect()
    }

    fn index(&mut self, id: ItemId, position: Vec3) {
        let _ = self
            .resting
            .entry(CellCoord::from_world(position))
            .or_default()
            .insert(id);
    }

    fn unindex(&mut self, id: ItemId, position: Vec3) {
        let cell = CellCoord::from_world(position);
        if let Some(ids) = self.resting.get_mut(&cell) {
            let _ = ids.remove(&id);
            if ids.is_empty() {
                let _ = self.resting.remove(&cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_items_are_indexed_by_column() {
        let mut pool = ItemPool::new();
        let first = pool.spawn(Vec3::new(0.5, 0.5, 0.0), 1);
        let second = pool.spawn(Vec3::new(0.5, 0.5, 0.0), 1);

        assert_ne!(first, second);
        assert_eq!(pool.occupant(CellCoord::new(0, 0)), Some(second));
        assert_eq!(pool.item_at(Vec3::new(0.9, 0.1, 4.0)), Some(second));
        assert_eq!(pool.item_at(Vec3::new(1.5, 0.5, 0.0)), None);
    }

    #[test]
    fn held_items_leave_the_index_until_released() {
        let mut pool = ItemPool::new();
        let id = pool.spawn(Vec3::new(0.5, 0.5, -0.25), 1);

        assert_eq!(pool.grab(id), Some(Vec3::new(0.5, 0.5, -0.25)));
        assert_eq!(pool.occupant(CellCoord::new(0, 0)), None);
        assert_eq!(pool.grab(id), None, "an item cannot be grabbed twice");

        assert_eq!(
            pool.move_held(id, Vec3::new(3.2, 1.1, 9.0)),
            Some(Vec3::new(3.2, 1.1, -0.25))
        );
        assert_eq!(
            pool.release(id, Vec3::new(2.5, 1.5, 0.0)),
            Some(Vec3::new(2.5, 1.5, -0.25))
        );
        assert_eq!(pool.occupant(CellCoord::new(2, 1)), Some(id));
        assert_eq!(pool.move_held(id, Vec3::ZERO), None, "released items stay put");
    }

    #[test]
    fn records_store_the_anchor_of_held_items() {
        let mut pool = ItemPool::new();
        let id = pool.spawn(Vec3::new(-1.5, 0.5, 0.0), 2);
        let _ = pool.grab(id);
        let _ = pool.move_held(id, Vec3::new(4.0, 4.0, 0.0));

        assert_eq!(
            pool.records(),
            vec![ItemRecord {
                position: Vec3::new(-1.5, 0.5, 0.0),
                count: 2,
            }]
        );
    }

    #[test]
    fn remove_and_restore_rebuild_the_index() {
        let mut pool = ItemPool::new();
        let id = pool.spawn(Vec3::new(0.5, 0.5, 0.0), 1);
        assert_eq!(pool.remove(id).map(|item| item.count()), Some(1));
        assert!(pool.is_empty());
        assert_eq!(pool.occupant(CellCoord::new(0, 0)), None);

        pool.restore(&[
            ItemRecord {
                position: Vec3::new(0.5, 0.5, 0.0),
                count: 1,
            },
            ItemRecord {
                position: Vec3::new(-2.5, 3.5, 0.0),
                count: 4,
            },
        ]);
        assert_eq!(pool.len(), 2);
        assert!(pool.occupant(CellCoord::new(-3, 3)).is_some());
        assert!(pool.iter().all(|item| !item.is_held()));
    }
}
