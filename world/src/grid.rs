use excavation_core::{CellCoord, CellTag, DigError, FloorTag, MAX_CELL_DEPTH, MAX_FIELD_SIZE};
use glam::Vec3;

const EXTENT_ORIGIN: i32 = -(MAX_FIELD_SIZE / 2);

/// Layered cell store covering every column a level can ever generate.
///
/// Each column owns a floor marker at layer `-1` plus up to
/// [`MAX_CELL_DEPTH`] diggable layers. Storage always spans the maximum
/// extent so that shrinking the configured field never strands cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldGrid {
    field_size: i32,
    cell_depth: i32,
    floors: Vec<FloorTag>,
    layers: Vec<CellTag>,
}

impl Default for WorldGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldGrid {
    /// Creates a grid in which every column is absent.
    #[must_use]
    pub fn new() -> Self {
        let columns = usize::try_from(MAX_FIELD_SIZE * MAX_FIELD_SIZE).unwrap_or(0);
        let depth = usize::try_from(MAX_CELL_DEPTH).unwrap_or(0);
        Self {
            field_size: 0,
            cell_depth: 0,
            floors: vec![FloorTag::Absent; columns],
            layers: vec![CellTag::Empty; columns * depth],
        }
    }

    /// Field edge, in columns, of the last generated or restored layout.
    #[must_use]
    pub const fn field_size(&self) -> i32 {
        self.field_size
    }

    /// Diggable layers per column of the last generated or restored layout.
    #[must_use]
    pub const fn cell_depth(&self) -> i32 {
        self.cell_depth
    }

    /// Clears the grid, then fills every column of the field with bedrock and ground.
    ///
    /// Dimensions are expected to be validated already; values outside the
    /// supported extent are pinned to it.
    pub fn generate(&mut self, field_size: i32, cell_depth: i32) {
        self.clear();
        self.field_size = field_size.clamp(0, MAX_FIELD_SIZE);
        self.cell_depth = cell_depth.clamp(0, MAX_CELL_DEPTH);

        for column in 0..self.field_size {
            for row in 0..self.field_size {
                self.fill_column(CellCoord::from_layout(column, row, self.field_size));
            }
        }
    }

    /// Removes every floor marker and layer across the maximum extent.
    pub fn clear(&mut self) {
        for column in 0..MAX_FIELD_SIZE {
            for row in 0..MAX_FIELD_SIZE {
                self.clear_column(CellCoord::from_layout(column, row, MAX_FIELD_SIZE));
            }
        }
        self.field_size = 0;
        self.cell_depth = 0;
    }

    /// Returns the centre of the column under the point when it carries a floor marker.
    #[must_use]
    pub fn floor_below(&self, point: Vec3) -> Option<Vec3> {
        let cell = CellCoord::from_world(point);
        self.is_generated(cell).then(|| cell.center())
    }

    /// Reports whether the column carries a floor marker.
    #[must_use]
    pub fn is_generated(&self, cell: CellCoord) -> bool {
        self.floor(cell) == FloorTag::BedRock
    }

    /// Floor marker stored beneath the column.
    #[must_use]
    pub fn floor(&self, cell: CellCoord) -> FloorTag {
        column_index(cell)
            .and_then(|index| self.floors.get(index).copied())
            .unwrap_or_default()
    }

    /// Content of a single layer. Layer [`excavation_core::FLOOR_LAYER`] is not a diggable layer and reads as empty.
    #[must_use]
    pub fn cell(&self, cell: CellCoord, layer: i32) -> CellTag {
        layer_index(cell, layer)
            .and_then(|index| self.layers.get(index).copied())
            .unwrap_or_default()
    }

    /// Number of ground layers remaining in the column.
    #[must_use]
    pub fn ground_layers(&self, cell: CellCoord) -> i32 {
        (0..MAX_CELL_DEPTH)
            .filter(|layer| self.cell(cell, *layer) == CellTag::Ground)
            .fold(0, |count, _| count + 1)
    }

    /// Finds the layer the next dig at the column would remove.
    ///
    /// Layers are scanned from the deepest configured layer towards the
    /// surface and the first ground layer found is selected.
    pub fn diggable_layer(&self, cell: CellCoord) -> Result<i32, DigError> {
        if !self.is_generated(cell) {
            return Err(DigError::NoFloor);
        }

        (0..self.cell_depth)
            .rev()
            .find(|layer| self.cell(cell, *layer) == CellTag::Ground)
            .ok_or(DigError::Exhausted)
    }

    /// Empties a single layer, returning whether it held ground.
    pub fn clear_layer(&mut self, cell: CellCoord, layer: i32) -> bool {
        let Some(slot) = layer_index(cell, layer).and_then(|index| self.layers.get_mut(index))
        else {
            return false;
        };
        let was_ground = *slot == CellTag::Ground;
        *slot = CellTag::Empty;
        was_ground
    }

    /// Iterates the layers of the field in save order: column, row, then layer.
    pub fn layout_cells(&self) -> impl Iterator<Item = CellTag> + '_ {
        let field_size = self.field_size;
        let cell_depth = self.cell_depth;
        (0..field_size).flat_map(move |column| {
            (0..field_size).flat_map(move |row| {
                let cell = CellCoord::from_layout(column, row, field_size);
                (0..cell_depth).map(move |layer| self.cell(cell, layer))
            })
        })
    }

    /// Replaces the grid with a layout produced by [`WorldGrid::layout_cells`].
    ///
    /// Every column of the field receives a floor marker. Missing trailing
    /// tags are treated as empty and surplus tags are ignored.
    pub fn restore(&mut self, field_size: i32, cell_depth: i32, tags: &[CellTag]) {
        self.clear();
        self.field_size = field_size.clamp(0, MAX_FIELD_SIZE);
        self.cell_depth = cell_depth.clamp(0, MAX_CELL_DEPTH);

        let mut tags = tags.iter().copied();
        for column in 0..self.field_size {
            for row in 0..self.field_size {
                let cell = CellCoord::from_layout(column, row, self.field_size);
                for layer in 0..self.cell_depth {
                    let tag = tags.next().unwrap_or_default();
                    self.set_cell(cell, layer, tag);
                }
                self.set_floor(cell, FloorTag::BedRock);
            }
        }
    }

    fn fill_column(&mut self, cell: CellCoord) {
        self.set_floor(cell, FloorTag::BedRock);
        for layer in 0..self.cell_depth {
            self.set_cell(cell, layer, CellTag::Ground);
        }
    }

    fn clear_column(&mut self, cell: CellCoord) {
        self.set_floor(cell, FloorTag::Absent);
        for layer in 0..MAX_CELL_DEPTH {
            self.set_cell(cell, layer, CellTag::Empty);
        }
    }

    fn set_floor(&mut self, cell: CellCoord, tag: FloorTag) {
        if let Some(slot) = column_index(cell).and_then(|index| self.floors.get_mut(index)) {
            *slot = tag;
        }
    }

    fn set_cell(&mut self, cell: CellCoord, layer: i32, tag: CellTag) {
        if let Some(slot) = layer_index(cell, layer).and_then(|index| self.layers.get_mut(index)) {
            *slot = tag;
        }
    }
}

fn column_index(cell: CellCoord) -> Option<usize> {
    let column = cell.x().checked_sub(EXTENT_ORIGIN)?;
    let row = cell.y().checked_sub(EXTENT_ORIGIN)?;
    if !(0..MAX_FIELD_SIZE).contains(&column) || !(0..MAX_FIELD_SIZE).contains(&row) {
        return None;
    }
    usize::try_from(row * MAX_FIELD_SIZE + column).ok()
}

fn layer_index(cell: CellCoord, layer: i32) -> Option<usize> {
    if !(0..MAX_CELL_DEPTH).contains(&layer) {
        return None;
    }
    let column = column_index(cell)?;
    let depth = usize::try_from(MAX_CELL_DEPTH).ok()?;
    Some(column * depth + usize::try_from(layer).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_fully_absent() {
        let grid = WorldGrid::new();
        assert_eq!(grid.floor(CellCoord::new(0, 0)), FloorTag::Absent);
        assert_eq!(grid.layout_cells().count(), 0);
    }

    #[test]
    fn generate_fills_every_column_of_the_field() {
        let mut grid = WorldGrid::new();
        grid.generate(4, 3);

        for column in 0..4 {
            for row in 0..4 {
                let cell = CellCoord::from_layout(column, row, 4);
                assert!(grid.is_generated(cell), "column {cell:?} should have bedrock");
                assert_eq!(grid.ground_layers(cell), 3);
            }
        }
        assert!(!grid.is_generated(CellCoord::new(2, 0)));
        assert!(!grid.is_generated(CellCoord::new(-3, 0)));
    }

    #[test]
    fn shrinking_the_field_leaves_no_stale_columns() {
        let mut grid = WorldGrid::new();
        grid.generate(MAX_FIELD_SIZE, MAX_CELL_DEPTH);
        grid.generate(2, 1);

        let corner = CellCoord::from_layout(0, 0, MAX_FIELD_SIZE);
        assert_eq!(grid.floor(corner), FloorTag::Absent);
        assert_eq!(grid.ground_layers(corner), 0);

        let kept = CellCoord::from_layout(0, 0, 2);
        assert_eq!(grid.ground_layers(kept), 1);
        assert_eq!(grid.cell(kept, 1), CellTag::Empty, "old deeper layers must be gone");
    }

    #[test]
    fn diggable_layer_scans_from_deepest_layer() {
        let mut grid = WorldGrid::new();
        grid.generate(2, 3);
        let cell = CellCoord::new(0, 0);

        assert_eq!(grid.diggable_layer(cell), Ok(2));
        assert!(grid.clear_layer(cell, 2));
        assert_eq!(grid.diggable_layer(cell), Ok(1));
        assert!(grid.clear_layer(cell, 1));
        assert!(grid.clear_layer(cell, 0));
        assert_eq!(grid.diggable_layer(cell), Err(DigError::Exhausted));
        assert!(!grid.clear_layer(cell, 0), "empty layer reports no ground");
    }

    #[test]
    fn diggable_layer_requires_floor() {
        let grid = WorldGrid::new();
        assert_eq!(
            grid.diggable_layer(CellCoord::new(0, 0)),
            Err(DigError::NoFloor)
        );
        assert_eq!(
            grid.diggable_layer(CellCoord::new(400, -400)),
            Err(DigError::NoFloor)
        );
    }

    #[test]
    fn floor_below_snaps_to_cell_centre() {
        let mut grid = WorldGrid::new();
        grid.generate(2, 1);

        assert_eq!(
            grid.floor_below(Vec3::new(-0.2, 0.7, 5.0)),
            Some(Vec3::new(-0.5, 0.5, 0.0))
        );
        assert_eq!(grid.floor_below(Vec3::new(3.0, 0.0, 0.0)), None);
    }

    #[test]
    fn layout_round_trips_through_restore() {
        let mut grid = WorldGrid::new();
        grid.generate(3, 2);
        let _ = grid.clear_layer(CellCoord::new(-1, 1), 1);
        let _ = grid.clear_layer(CellCoord::new(1, -1), 0);
        let tags: Vec<CellTag> = grid.layout_cells().collect();
        assert_eq!(tags.len(), 3 * 3 * 2);

        let mut restored = WorldGrid::new();
        restored.generate(MAX_FIELD_SIZE, MAX_CELL_DEPTH);
        restored.restore(3, 2, &tags);

        assert_eq!(restored, grid);
    }
}
