//! Grid layout: turns unit placements into pixel boxes and answers
//! "which unit is under this point".
//!
//! Everything here is a pure function of the placements, the layout
//! parameters and the viewport, so re-deriving after a resize always gives
//! the same boxes for the same inputs.

use serde::{Deserialize, Serialize};

use crate::shared::UnitId;

// A 70 px cell carries a 50 px lit square; other cell sizes scale it.
const REFERENCE_CELL_PX: f32 = 70.0;
const LIT_SQUARE_PX: f32 = 50.0;

/// Axis-aligned box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict containment: points on the edge are outside, so two boxes
    /// sharing an edge never both claim a point.
    pub fn contains_strict(&self, px: f32, py: f32) -> bool {
        px > self.x && px < self.right() && py > self.y && py < self.bottom()
    }

    /// True if `other` lies entirely inside this box (edges included).
    pub fn contains_box(&self, other: &BBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A unit's footprint in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
}

impl Placement {
    pub fn new(row: u32, col: u32, row_span: u32, col_span: u32) -> Self {
        Self { row, col, row_span, col_span }
    }

    pub fn row_end(&self) -> u32 {
        self.row + self.row_span
    }

    pub fn col_end(&self) -> u32 {
        self.col + self.col_span
    }

    pub fn fits(&self, rows: u32, cols: u32) -> bool {
        self.row_end() <= rows && self.col_end() <= cols
    }

    pub fn overlaps(&self, other: &Placement) -> bool {
        self.row < other.row_end()
            && other.row < self.row_end()
            && self.col < other.col_end()
            && other.col < self.col_end()
    }

    /// True if every cell of `other` is also a cell of `self`.
    pub fn contains(&self, other: &Placement) -> bool {
        other.row >= self.row
            && other.col >= self.col
            && other.row_end() <= self.row_end()
            && other.col_end() <= self.col_end()
    }

    /// Every `(row, col)` this placement covers.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.row..self.row_end()).flat_map(move |r| (self.col..self.col_end()).map(move |c| (r, c)))
    }
}

/// Cell geometry of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub rows: u32,
    pub cols: u32,
    pub cell_size: f32,
    pub inset: f32,
}

impl LayoutParams {
    pub fn grid_width(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    pub fn grid_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Top-left corner that centers the grid in the viewport.
    pub fn origin(&self, viewport: Viewport) -> (f32, f32) {
        (
            (viewport.width - self.grid_width()) / 2.0,
            (viewport.height - self.grid_height()) / 2.0,
        )
    }

    pub fn grid_region(&self, viewport: Viewport) -> BBox {
        let (ox, oy) = self.origin(viewport);
        BBox::new(ox, oy, self.grid_width(), self.grid_height())
    }

    /// Shrinks cell size and inset together until the grid fits the
    /// viewport. Never grows past the configured size.
    pub fn fit(&self, viewport: Viewport) -> LayoutParams {
        let sx = viewport.width / self.grid_width();
        let sy = viewport.height / self.grid_height();
        let scale = sx.min(sy).min(1.0);
        if !(scale > 0.0) {
            return *self;
        }
        LayoutParams {
            cell_size: self.cell_size * scale,
            inset: self.inset * scale,
            ..*self
        }
    }
}

/// Pixel box of one placement for a given origin.
pub fn derive_box(p: &Placement, params: &LayoutParams, origin: (f32, f32)) -> BBox {
    let cell = params.cell_size;
    BBox::new(
        origin.0 + p.col as f32 * cell + params.inset,
        origin.1 + p.row as f32 * cell + params.inset,
        p.col_span as f32 * cell - 2.0 * params.inset,
        p.row_span as f32 * cell - 2.0 * params.inset,
    )
}

/// The centered lit square inside each cell a placement covers.
pub fn lit_squares(p: &Placement, params: &LayoutParams, origin: (f32, f32)) -> Vec<BBox> {
    let cell = params.cell_size;
    let side = cell * LIT_SQUARE_PX / REFERENCE_CELL_PX;
    let offset = (cell - side) / 2.0;
    p.cells()
        .map(|(r, c)| {
            BBox::new(
                origin.0 + c as f32 * cell + offset,
                origin.1 + r as f32 * cell + offset,
                side,
                side,
            )
        })
        .collect()
}

/// Grid cell -> owning unit. Built alongside the boxes; resolves points that
/// fall in a cell's inset margin, where `locate` finds nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CellTable {
    rows: u32,
    cols: u32,
    owners: Vec<Option<UnitId>>,
}

impl CellTable {
    /// Where footprints nest, the unit earlier in configuration order keeps
    /// the cell, matching `Layout::locate` priority.
    pub fn build(placements: &[Placement], rows: u32, cols: u32) -> Self {
        let mut owners = vec![None; (rows * cols) as usize];
        for (i, p) in placements.iter().enumerate().rev() {
            for (r, c) in p.cells() {
                if r < rows && c < cols {
                    owners[(r * cols + c) as usize] = Some(UnitId(i as u8));
                }
            }
        }
        Self { rows, cols, owners }
    }

    pub fn owner(&self, row: u32, col: u32) -> Option<UnitId> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.owners[(row * self.cols + col) as usize]
    }
}

/// Derived boxes for every unit plus the lookups on top of them.
#[derive(Debug, Clone)]
pub struct Layout {
    params: LayoutParams,
    viewport: Viewport,
    origin: (f32, f32),
    boxes: Vec<BBox>,
    squares: Vec<Vec<BBox>>,
    cells: CellTable,
}

impl Layout {
    pub fn derive(placements: &[Placement], params: LayoutParams, viewport: Viewport) -> Self {
        let origin = params.origin(viewport);
        let boxes = placements
            .iter()
            .map(|p| derive_box(p, &params, origin))
            .collect();
        let squares = placements
            .iter()
            .map(|p| lit_squares(p, &params, origin))
            .collect();
        Self {
            params,
            viewport,
            origin,
            boxes,
            squares,
            cells: CellTable::build(placements, params.rows, params.cols),
        }
    }

    /// First unit in configuration order whose box strictly contains the
    /// point.
    pub fn locate(&self, x: f32, y: f32) -> Option<UnitId> {
        self.boxes
            .iter()
            .position(|b| b.contains_strict(x, y))
            .map(|i| UnitId(i as u8))
    }

    pub fn unit_at_cell(&self, row: u32, col: u32) -> Option<UnitId> {
        self.cells.owner(row, col)
    }

    /// Grid cell under a pixel position, if it is on the grid at all.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        let cell = self.params.cell_size;
        if !(cell > 0.0) {
            return None;
        }
        let cx = (x - self.origin.0) / cell;
        let cy = (y - self.origin.1) / cell;
        if !(cx >= 0.0 && cy >= 0.0) {
            return None;
        }
        let (row, col) = (cy as u32, cx as u32);
        (row < self.params.rows && col < self.params.cols).then_some((row, col))
    }

    /// `locate`, falling back to the cell table for points in an inset
    /// margin. For clicks; gestures stay strict.
    pub fn locate_loose(&self, x: f32, y: f32) -> Option<UnitId> {
        self.locate(x, y)
            .or_else(|| self.cell_at(x, y).and_then(|(r, c)| self.unit_at_cell(r, c)))
    }

    pub fn box_of(&self, unit: UnitId) -> Option<BBox> {
        self.boxes.get(unit.index()).copied()
    }

    pub fn squares_of(&self, unit: UnitId) -> &[BBox] {
        self.squares.get(unit.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn origin(&self) -> (f32, f32) {
        self.origin
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn grid_region(&self) -> BBox {
        self.params.grid_region(self.viewport)
    }
}
