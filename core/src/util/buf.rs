//! A rectangular, owned 2D buffer.
//!
//! `Buf2` is the storage type shared by color buffers, depth buffers, and
//! textures. Elements are stored in row-major order in one contiguous
//! allocation; a whole row can be borrowed as an ordinary slice.

use core::fmt::{self, Debug, Formatter};
use core::ops::{Index, IndexMut};

/// An owned, fixed-size 2D buffer with row-major storage.
///
/// Indexing with `buf[y]` yields the row `y` as a slice, so individual
/// elements are addressed as `buf[y][x]`.
#[derive(Clone, PartialEq)]
pub struct Buf2<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T> Buf2<T> {
    /// Creates a `width` × `height` buffer with every element defaulted.
    ///
    /// # Panics
    /// If `width * height` overflows `usize`.
    pub fn new(width: u32, height: u32) -> Self
    where
        T: Default + Clone,
    {
        let len = (width as usize)
            .checked_mul(height as usize)
            .expect("buffer dimensions overflow");
        Self {
            width,
            height,
            data: vec![T::default(); len],
        }
    }

    /// Creates a buffer by invoking `f(x, y)` for every element.
    pub fn new_with<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> T,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Creates a buffer from an existing element vector.
    ///
    /// # Panics
    /// If `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "element count does not match dimensions"
        );
        Self { width, height, data }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the elements as a flat row-major slice.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }
    /// Returns the elements as a flat mutable row-major slice.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns an iterator over the rows of `self`.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.width.max(1) as usize)
    }

    /// Sets every element to `val`.
    pub fn fill(&mut self, val: T)
    where
        T: Clone,
    {
        self.data.fill(val);
    }
}

impl<T> Index<usize> for Buf2<T> {
    type Output = [T];
    /// Returns row `y` as a slice.
    #[inline]
    fn index(&self, y: usize) -> &[T] {
        let w = self.width as usize;
        &self.data[y * w..(y + 1) * w]
    }
}

impl<T> IndexMut<usize> for Buf2<T> {
    #[inline]
    fn index_mut(&mut self, y: usize) -> &mut [T] {
        let w = self.width as usize;
        &mut self.data[y * w..(y + 1) * w]
    }
}

impl<T: Debug> Debug for Buf2<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Buf2 {}x{}", self.width, self.height)
    }
}
