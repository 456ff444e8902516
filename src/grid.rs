//! Maps tracked positions in normalized space onto discrete grid cells.
//!
//! The active grid area is a configurable sub-rectangle of the normalized
//! tracker space; it is divided into N x N equal cell rectangles. Blobs are
//! assigned to every cell rectangle that contains them, which on a shared
//! edge can be more than one (see [`Rectf::contains`]).

use crate::{GridCell, Point, RectMapping, Rectf};

/// Converts tracker positions into grid cell coordinates.
///
/// The cell rectangle table is cached and recomputed lazily the next time it
/// is needed after the grid size changes.
#[derive(Debug, Clone)]
pub struct GridMapper {
    area: Rectf,
    grid_size: usize,
    cells: Vec<Rectf>,
    last_grid_size: usize,
}

impl GridMapper {
    /// Creates a mapper over `area` divided into `grid_size` x `grid_size`
    /// cells.
    pub fn new(area: Rectf, grid_size: usize) -> Self {
        Self {
            area,
            grid_size,
            cells: Vec::new(),
            last_grid_size: 0,
        }
    }

    /// Stores a new grid area and size. The rectangle table is rebuilt on the
    /// next access if the size changed since it was last computed.
    pub fn configure(&mut self, area: Rectf, grid_size: usize) {
        debug_assert!(area.x1 <= area.x2 && area.y1 <= area.y2);
        self.area = area;
        self.grid_size = grid_size;
    }

    /// Number of cells along one side of the grid.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// The active grid area in normalized space.
    pub fn area(&self) -> Rectf {
        self.area
    }

    /// The N x N cell rectangles in row-major order, rebuilding the cache if
    /// the grid size changed.
    pub fn cell_rectangles(&mut self) -> &[Rectf] {
        if self.last_grid_size != self.grid_size {
            self.calc_grid_cells();
        }
        &self.cells
    }

    fn calc_grid_cells(&mut self) {
        let n = self.grid_size;
        let step_x = self.area.width() / n as f64;
        let step_y = self.area.height() / n as f64;
        self.cells.clear();
        self.cells.reserve(n * n);
        for row in 0..n {
            for col in 0..n {
                let x1 = self.area.x1 + col as f64 * step_x;
                let y1 = self.area.y1 + row as f64 * step_y;
                self.cells.push(Rectf::new(x1, y1, x1 + step_x, y1 + step_y));
            }
        }
        self.last_grid_size = n;
    }

    /// Emits one [`GridCell`] for every cell rectangle containing each input
    /// position. Output order follows input order, then row-major rectangle
    /// scan order. A point on a shared edge yields several cells and
    /// duplicate inputs yield duplicate outputs; both are preserved.
    pub fn map_to_cells(&mut self, positions: &[Point]) -> Vec<GridCell> {
        let n = self.grid_size;
        let rects = self.cell_rectangles();
        let mut coords = Vec::new();
        for pos in positions {
            for (i, rect) in rects.iter().enumerate() {
                if rect.contains(pos) {
                    coords.push(GridCell::new(i % n, i / n));
                }
            }
        }
        coords
    }

    /// Center of a cell's rectangle, projected through the caller's screen
    /// mapping. Only used for debug display.
    ///
    /// Panics if `cell` is outside the grid; that is a programming error, not
    /// a runtime condition.
    pub fn cell_center(&mut self, cell: GridCell, mapping: &RectMapping) -> Point {
        let n = self.grid_size;
        // The flat index alone would let an out-of-range column alias into
        // the next row.
        assert!(
            cell.col < n && cell.row < n,
            "cell {} outside the {}x{} grid",
            cell,
            n,
            n
        );
        let rect = self.cell_rectangles()[cell.row * n + cell.col];
        mapping.map(rect.center())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangles_tile_the_area_exactly() {
        let area = Rectf::new(0.1, 0.2, 0.9, 0.8);
        let mut mapper = GridMapper::new(area, 4);
        let rects = mapper.cell_rectangles().to_vec();
        assert_eq!(rects.len(), 16);

        let eps = 1e-9;
        let cell_area: f64 = rects.iter().map(|r| r.width() * r.height()).sum();
        assert!((cell_area - area.width() * area.height()).abs() < eps);

        // Neighbors share edges with no gap.
        for row in 0..4 {
            for col in 0..3 {
                let left = rects[row * 4 + col];
                let right = rects[row * 4 + col + 1];
                assert!((left.x2 - right.x1).abs() < eps);
            }
        }
        assert!((rects[0].x1 - area.x1).abs() < eps);
        assert!((rects[15].x2 - area.x2).abs() < eps);
        assert!((rects[15].y2 - area.y2).abs() < eps);
    }

    #[test]
    fn interior_point_maps_to_exactly_one_cell() {
        let mut mapper = GridMapper::new(Rectf::UNIT, 3);
        let cells = mapper.map_to_cells(&[Point { x: 0.5, y: 0.17 }]);
        assert_eq!(cells, vec![GridCell::new(1, 0)]);
    }

    #[test]
    fn boundary_point_hits_both_cells() {
        // A point on the shared edge between two cells lands in both; this
        // double-trigger is long-standing behavior and must not change.
        let mut mapper = GridMapper::new(Rectf::UNIT, 2);
        let cells = mapper.map_to_cells(&[Point { x: 0.5, y: 0.25 }]);
        assert_eq!(cells, vec![GridCell::new(0, 0), GridCell::new(1, 0)]);
    }

    #[test]
    fn duplicates_and_order_are_preserved() {
        let mut mapper = GridMapper::new(Rectf::UNIT, 2);
        let p = Point { x: 0.9, y: 0.9 };
        let q = Point { x: 0.1, y: 0.1 };
        let cells = mapper.map_to_cells(&[p, q, p]);
        assert_eq!(
            cells,
            vec![
                GridCell::new(1, 1),
                GridCell::new(0, 0),
                GridCell::new(1, 1)
            ]
        );
    }

    #[test]
    fn point_outside_area_maps_to_no_cell() {
        let mut mapper = GridMapper::new(Rectf::new(0.25, 0.25, 0.75, 0.75), 3);
        let cells = mapper.map_to_cells(&[Point { x: 0.1, y: 0.1 }]);
        assert!(cells.is_empty());
    }

    #[test]
    fn cache_rebuilds_when_grid_size_changes() {
        let mut mapper = GridMapper::new(Rectf::UNIT, 2);
        assert_eq!(mapper.cell_rectangles().len(), 4);
        mapper.configure(Rectf::UNIT, 5);
        assert_eq!(mapper.cell_rectangles().len(), 25);
    }

    #[test]
    fn cell_center_projects_through_mapping() {
        let mut mapper = GridMapper::new(Rectf::UNIT, 2);
        let mapping = RectMapping::new(Rectf::UNIT, Rectf::new(0.0, 0.0, 100.0, 100.0));
        let center = mapper.cell_center(GridCell::new(1, 0), &mapping);
        assert_eq!(center, Point { x: 75.0, y: 25.0 });
    }

    #[test]
    #[should_panic]
    fn cell_center_out_of_range_panics() {
        let mut mapper = GridMapper::new(Rectf::UNIT, 2);
        mapper.cell_center(GridCell::new(2, 0), &RectMapping::identity());
    }
}
