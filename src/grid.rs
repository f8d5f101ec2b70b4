//! Ghosted 2D grid storage.
//!
//! Residual code for structured meshes addresses points by global indices that
//! may reach one layer past the owned block (ghost points). [`Grid2d`] keeps the
//! owned block plus its ghosts in one row-major buffer and translates global
//! indices, with bounds checks instead of offset pointers.

use std::ops::{Index, IndexMut};

use crate::error::{check_len, Result};

/// Rectangular block of a 2D grid with signed global indices.
///
/// Point `(i, j)` (`i` along x, `j` along y) is stored at
/// `(j - y0) * width + (i - x0)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid2d<T> {
    origin: (isize, isize),
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid2d<T> {
    /// Block of `width x height` points starting at `origin`, filled with `fill`.
    pub fn new(origin: (isize, isize), width: usize, height: usize, fill: T) -> Self {
        Grid2d {
            origin,
            width,
            height,
            data: vec![fill; width * height],
        }
    }
}

impl<T> Grid2d<T> {
    /// Wrap a row-major buffer of `width * height` points.
    pub fn from_vec(origin: (isize, isize), width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        check_len("grid data", width * height, data.len())?;
        Ok(Grid2d {
            origin,
            width,
            height,
            data,
        })
    }

    pub fn origin(&self) -> (isize, isize) {
        self.origin
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat position of global point `(i, j)`, if it lies in the block.
    pub fn local_index(&self, i: isize, j: isize) -> Option<usize> {
        let li = usize::try_from(i.checked_sub(self.origin.0)?).ok()?;
        let lj = usize::try_from(j.checked_sub(self.origin.1)?).ok()?;
        (li < self.width && lj < self.height).then(|| lj * self.width + li)
    }

    pub fn contains(&self, i: isize, j: isize) -> bool {
        self.local_index(i, j).is_some()
    }

    pub fn get(&self, i: isize, j: isize) -> Option<&T> {
        self.local_index(i, j).map(|k| &self.data[k])
    }

    pub fn get_mut(&mut self, i: isize, j: isize) -> Option<&mut T> {
        self.local_index(i, j).map(move |k| &mut self.data[k])
    }

    /// Global indices of every point, in storage order.
    pub fn indices(&self) -> impl Iterator<Item = (isize, isize)> {
        let (x0, y0) = self.origin;
        let (w, h) = (self.width as isize, self.height as isize);
        (y0..y0 + h).flat_map(move |j| (x0..x0 + w).map(move |i| (i, j)))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Same shape, with `f` applied to every point.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid2d<U> {
        Grid2d {
            origin: self.origin,
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    fn out_of_range(&self, i: isize, j: isize) -> ! {
        panic!(
            "grid point ({i}, {j}) outside block at ({}, {}) of {} x {}",
            self.origin.0, self.origin.1, self.width, self.height
        )
    }
}

impl<T> Index<(isize, isize)> for Grid2d<T> {
    type Output = T;

    fn index(&self, (i, j): (isize, isize)) -> &T {
        match self.local_index(i, j) {
            Some(k) => &self.data[k],
            None => self.out_of_range(i, j),
        }
    }
}

impl<T> IndexMut<(isize, isize)> for Grid2d<T> {
    fn index_mut(&mut self, (i, j): (isize, isize)) -> &mut T {
        match self.local_index(i, j) {
            Some(k) => &mut self.data[k],
            None => self.out_of_range(i, j),
        }
    }
}
