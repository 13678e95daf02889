//! Dense 3D grid with flat storage.
//!
//! Cells are stored in a single `Vec` with linear index
//! `x + width * (y + height * z)`. Dimensions are fixed at construction.

use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub, SubAssign};

/// Flat dense 3D array.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3D<T> {
    /// Number of cells in X direction
    width: usize,
    /// Number of cells in Y direction
    height: usize,
    /// Number of cells in Z direction
    depth: usize,
    /// Cell values, `width * height * depth` long
    data: Vec<T>,
}

impl<T: Copy> Grid3D<T> {
    /// Create a grid with every cell set to `value`.
    pub fn new(width: usize, height: usize, depth: usize, value: T) -> Self {
        assert!(
            width > 0 && height > 0 && depth > 0,
            "grid dimensions must be non-zero, got {}x{}x{}",
            width,
            height,
            depth
        );

        Self {
            width,
            height,
            depth,
            data: vec![value; width * height * depth],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dimensions as `(width, height, depth)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.depth
    }

    /// Linear index of cell (x, y, z).
    ///
    /// Panics when any coordinate is out of range, so an overflowing `x`
    /// can never alias a cell on the next row.
    #[inline]
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        assert!(
            self.in_bounds(x, y, z),
            "cell ({}, {}, {}) out of bounds for {}x{}x{} grid",
            x,
            y,
            z,
            self.width,
            self.height,
            self.depth
        );
        x + self.width * (y + self.height * z)
    }

    #[inline]
    pub fn element(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.linear_index(x, y, z)]
    }

    #[inline]
    pub fn element_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        let idx = self.linear_index(x, y, z);
        &mut self.data[idx]
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Set every cell from a generator called with the cell coordinates.
    ///
    /// Traversal is x outer, y middle, z inner. The generator only sees
    /// coordinates, never values written earlier in the same call.
    pub fn fill_with<F>(&mut self, mut generator: F)
    where
        F: FnMut(usize, usize, usize) -> T,
    {
        for x in 0..self.width {
            for y in 0..self.height {
                for z in 0..self.depth {
                    let idx = x + self.width * (y + self.height * z);
                    self.data[idx] = generator(x, y, z);
                }
            }
        }
    }

    /// Copy every cell from a grid of the same shape without reallocating.
    pub fn copy_from(&mut self, other: &Grid3D<T>) {
        self.assert_same_shape(other);
        self.data.copy_from_slice(&other.data);
    }

    pub fn same_shape(&self, other: &Grid3D<T>) -> bool {
        self.dims() == other.dims()
    }

    fn assert_same_shape(&self, other: &Grid3D<T>) {
        assert!(
            self.same_shape(other),
            "grid shape mismatch: {:?} vs {:?}",
            self.dims(),
            other.dims()
        );
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl Grid3D<f32> {
    /// Sum of all cells, accumulated in f64 for mass bookkeeping.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }
}

impl<T: Copy> Index<(usize, usize, usize)> for Grid3D<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y, z): (usize, usize, usize)) -> &T {
        &self.data[self.linear_index(x, y, z)]
    }
}

impl<T: Copy> IndexMut<(usize, usize, usize)> for Grid3D<T> {
    #[inline]
    fn index_mut(&mut self, (x, y, z): (usize, usize, usize)) -> &mut T {
        let idx = self.linear_index(x, y, z);
        &mut self.data[idx]
    }
}

// Elementwise arithmetic against a scalar or a same-shaped grid.
macro_rules! impl_elementwise_op {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident, $sym:tt) => {
        impl<T: Copy + $Op<Output = T>> $OpAssign<T> for Grid3D<T> {
            fn $op_assign(&mut self, rhs: T) {
                for v in &mut self.data {
                    *v = *v $sym rhs;
                }
            }
        }

        impl<T: Copy + $Op<Output = T>> $OpAssign<&Grid3D<T>> for Grid3D<T> {
            fn $op_assign(&mut self, rhs: &Grid3D<T>) {
                self.assert_same_shape(rhs);
                for (v, &r) in self.data.iter_mut().zip(&rhs.data) {
                    *v = *v $sym r;
                }
            }
        }

        impl<T: Copy + $Op<Output = T>> $Op<T> for Grid3D<T> {
            type Output = Grid3D<T>;

            fn $op(mut self, rhs: T) -> Grid3D<T> {
                <Self as $OpAssign<T>>::$op_assign(&mut self, rhs);
                self
            }
        }

        impl<T: Copy + $Op<Output = T>> $Op<&Grid3D<T>> for Grid3D<T> {
            type Output = Grid3D<T>;

            fn $op(mut self, rhs: &Grid3D<T>) -> Grid3D<T> {
                <Self as $OpAssign<&Grid3D<T>>>::$op_assign(&mut self, rhs);
                self
            }
        }
    };
}

impl_elementwise_op!(Add, add, AddAssign, add_assign, +);
impl_elementwise_op!(Sub, sub, SubAssign, sub_assign, -);
impl_elementwise_op!(Mul, mul, MulAssign, mul_assign, *);
impl_elementwise_op!(Div, div, DivAssign, div_assign, /);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid3D::new(16, 32, 8, 0.0f32);
        assert_eq!(grid.width(), 16);
        assert_eq!(grid.height(), 32);
        assert_eq!(grid.depth(), 8);
        assert_eq!(grid.len(), 16 * 32 * 8);
    }

    #[test]
    fn test_linear_index() {
        let grid = Grid3D::new(4, 5, 6, 0.0f32);
        // Index should be x + w * (y + h * z)
        assert_eq!(grid.linear_index(0, 0, 0), 0);
        assert_eq!(grid.linear_index(1, 0, 0), 1);
        assert_eq!(grid.linear_index(0, 1, 0), 4);
        assert_eq!(grid.linear_index(0, 0, 1), 20);
        assert_eq!(grid.linear_index(3, 4, 5), 3 + 4 * (4 + 5 * 5));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_range_does_not_wrap() {
        let grid = Grid3D::new(4, 4, 4, 0.0f32);
        // (4, 0, 0) would alias (0, 1, 0) without the axis check
        let _ = grid.element(4, 0, 0);
    }

    #[test]
    #[should_panic(expected = "grid dimensions must be non-zero")]
    fn test_zero_size_panics() {
        let _ = Grid3D::new(4, 0, 4, 0.0f32);
    }

    #[test]
    fn test_fill_with_coordinates() {
        let mut grid = Grid3D::new(3, 4, 5, 0usize);
        grid.fill_with(|x, y, z| x * 100 + y * 10 + z);

        assert_eq!(grid.element(2, 3, 4), 234);
        assert_eq!(grid[(1, 0, 2)], 102);
    }

    #[test]
    fn test_fill_with_traversal_order() {
        let mut grid = Grid3D::new(2, 2, 2, 0u32);
        let mut counter = 0;
        grid.fill_with(|_, _, _| {
            counter += 1;
            counter
        });

        // z is the innermost loop
        assert_eq!(grid.element(0, 0, 0), 1);
        assert_eq!(grid.element(0, 0, 1), 2);
        assert_eq!(grid.element(0, 1, 0), 3);
        assert_eq!(grid.element(1, 0, 0), 5);
    }

    #[test]
    fn test_scalar_ops() {
        let mut grid = Grid3D::new(2, 2, 2, 2.0f32);
        grid += 1.0;
        assert_eq!(grid.element(1, 1, 1), 3.0);
        grid *= 4.0;
        assert_eq!(grid.element(0, 0, 0), 12.0);
        grid -= 2.0;
        grid /= 5.0;
        assert_eq!(grid.element(0, 1, 0), 2.0);

        let doubled = grid * 2.0;
        assert_eq!(doubled.element(1, 0, 1), 4.0);
    }

    #[test]
    fn test_grid_ops() {
        let mut a = Grid3D::new(2, 3, 2, 0.0f32);
        a.fill_with(|x, y, z| (x + y + z) as f32);
        let b = Grid3D::new(2, 3, 2, 2.0f32);

        let sum = a.clone() + &b;
        assert_eq!(sum.element(1, 2, 1), 6.0);

        let product = a.clone() * &b;
        assert_eq!(product.element(1, 1, 0), 4.0);

        a -= &b;
        assert_eq!(a.element(0, 0, 0), -2.0);
        a /= &b;
        assert_eq!(a.element(0, 0, 0), -1.0);
    }

    #[test]
    #[should_panic(expected = "grid shape mismatch")]
    fn test_mismatched_shapes_panic() {
        let mut a = Grid3D::new(2, 2, 2, 1.0f32);
        let b = Grid3D::new(2, 2, 3, 1.0f32);
        a += &b;
    }

    #[test]
    fn test_sum() {
        let mut grid = Grid3D::new(3, 3, 3, 0.0f32);
        grid[(1, 1, 1)] = 10.0;
        grid[(2, 0, 1)] = 2.5;
        assert!((grid.sum() - 12.5).abs() < 1e-9);
    }
}
