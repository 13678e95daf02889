//! Solid/boundary model.
//!
//! Every cell carries a [`FlowDirection`] mask of the directions in which flow
//! is blocked, plus a `SELF` bit for cells that are solid themselves. Cells on
//! the outer shell of the grid are always treated as fully blocked; that rule
//! is applied by the query and never stored.

use bitflags::bitflags;

use crate::field::Axis;
use crate::grid::Grid3D;

bitflags! {
    /// Blocked directions of a single cell.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FlowDirection: u8 {
        const X_PLUS = 1 << 0;
        const X_MINUS = 1 << 1;
        const Y_PLUS = 1 << 2;
        const Y_MINUS = 1 << 3;
        const Z_PLUS = 1 << 4;
        const Z_MINUS = 1 << 5;
        /// The cell itself is solid.
        const SELF = 1 << 6;
    }
}

impl FlowDirection {
    /// The six face directions, in stencil order.
    pub const FACES: [FlowDirection; 6] = [
        FlowDirection::X_PLUS,
        FlowDirection::X_MINUS,
        FlowDirection::Y_PLUS,
        FlowDirection::Y_MINUS,
        FlowDirection::Z_PLUS,
        FlowDirection::Z_MINUS,
    ];

    /// Face direction along `axis`, positive or negative.
    pub fn toward(axis: Axis, positive: bool) -> FlowDirection {
        match (axis, positive) {
            (Axis::X, true) => FlowDirection::X_PLUS,
            (Axis::X, false) => FlowDirection::X_MINUS,
            (Axis::Y, true) => FlowDirection::Y_PLUS,
            (Axis::Y, false) => FlowDirection::Y_MINUS,
            (Axis::Z, true) => FlowDirection::Z_PLUS,
            (Axis::Z, false) => FlowDirection::Z_MINUS,
        }
    }

    /// Mirror of a single face direction. `SELF` and empty masks map to themselves.
    pub fn opposite(self) -> FlowDirection {
        match self {
            d if d == FlowDirection::X_PLUS => FlowDirection::X_MINUS,
            d if d == FlowDirection::X_MINUS => FlowDirection::X_PLUS,
            d if d == FlowDirection::Y_PLUS => FlowDirection::Y_MINUS,
            d if d == FlowDirection::Y_MINUS => FlowDirection::Y_PLUS,
            d if d == FlowDirection::Z_PLUS => FlowDirection::Z_MINUS,
            d if d == FlowDirection::Z_MINUS => FlowDirection::Z_PLUS,
            other => other,
        }
    }

    /// Unit cell offset of a single face direction.
    pub fn offset(self) -> (isize, isize, isize) {
        match self {
            d if d == FlowDirection::X_PLUS => (1, 0, 0),
            d if d == FlowDirection::X_MINUS => (-1, 0, 0),
            d if d == FlowDirection::Y_PLUS => (0, 1, 0),
            d if d == FlowDirection::Y_MINUS => (0, -1, 0),
            d if d == FlowDirection::Z_PLUS => (0, 0, 1),
            d if d == FlowDirection::Z_MINUS => (0, 0, -1),
            _ => (0, 0, 0),
        }
    }
}

/// Per-cell blocking flags for the whole grid.
#[derive(Clone, Debug)]
pub struct SolidMap {
    flags: Grid3D<FlowDirection>,
}

impl SolidMap {
    /// Create a map with no stored blocking.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            flags: Grid3D::new(width, height, depth, FlowDirection::empty()),
        }
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.flags.dims()
    }

    /// Stored flags of a cell (boundary rule not applied).
    #[inline]
    pub fn flags(&self, x: usize, y: usize, z: usize) -> FlowDirection {
        self.flags.element(x, y, z)
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, flags: FlowDirection) {
        self.flags[(x, y, z)] = flags;
    }

    /// Initialise every cell from a generator.
    pub fn set_from<F>(&mut self, generator: F)
    where
        F: FnMut(usize, usize, usize) -> FlowDirection,
    {
        self.flags.fill_with(generator);
    }

    /// Remove all stored blocking.
    pub fn clear(&mut self) {
        self.flags.fill(FlowDirection::empty());
    }

    /// Mark a cell as solid.
    pub fn block_cell(&mut self, x: usize, y: usize, z: usize) {
        self.flags[(x, y, z)] |= FlowDirection::SELF;
    }

    /// Put a wall on the face between a cell and its neighbour in `dir`.
    ///
    /// Both sides get their bit so the face is closed from either direction.
    pub fn block_face(&mut self, x: usize, y: usize, z: usize, dir: FlowDirection) {
        self.flags[(x, y, z)] |= dir;
        if let Some((nx, ny, nz)) = self.neighbor(x, y, z, dir) {
            self.flags[(nx, ny, nz)] |= dir.opposite();
        }
    }

    /// True if the cell is on the outer shell of the grid.
    #[inline]
    pub fn is_boundary(&self, x: usize, y: usize, z: usize) -> bool {
        let (w, h, d) = self.dims();
        x == 0 || x + 1 >= w || y == 0 || y + 1 >= h || z == 0 || z + 1 >= d
    }

    /// Neighbour of a cell in a face direction, if inside the grid.
    pub fn neighbor(
        &self,
        x: usize,
        y: usize,
        z: usize,
        dir: FlowDirection,
    ) -> Option<(usize, usize, usize)> {
        let (dx, dy, dz) = dir.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        let nz = z.checked_add_signed(dz)?;
        self.flags.in_bounds(nx, ny, nz).then_some((nx, ny, nz))
    }

    /// Whether flow from (x, y, z) in `dir` is blocked.
    ///
    /// Boundary cells are blocked in every direction, `SELF` included.
    /// Otherwise the stored bit decides, and only when the neighbour exists.
    pub fn is_blocked(&self, x: usize, y: usize, z: usize, dir: FlowDirection) -> bool {
        if self.is_boundary(x, y, z) {
            return true;
        }

        let flags = self.flags.element(x, y, z);
        if dir == FlowDirection::SELF {
            return flags.contains(FlowDirection::SELF);
        }

        self.neighbor(x, y, z, dir).is_some() && flags.contains(dir)
    }

    /// Whether the face between a cell and its neighbour in `dir` lets flow through.
    ///
    /// Closed if either side blocks it or either cell is solid, so an exchange
    /// across the face is always seen the same way from both cells.
    pub fn is_face_open(&self, x: usize, y: usize, z: usize, dir: FlowDirection) -> bool {
        if self.is_blocked(x, y, z, FlowDirection::SELF) || self.is_blocked(x, y, z, dir) {
            return false;
        }

        match self.neighbor(x, y, z, dir) {
            Some((nx, ny, nz)) => {
                !self.is_blocked(nx, ny, nz, FlowDirection::SELF)
                    && !self.is_blocked(nx, ny, nz, dir.opposite())
            }
            None => false,
        }
    }
}
