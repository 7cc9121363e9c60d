//! Reusable working buffers, each as long as the longest chromosome.
//!
//! Operators check a buffer out, use it for one `apply` call, and the guard
//! puts it back when it drops. A buffer's contents are whatever the previous
//! user left there; callers initialize the part they read.
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

#[derive(Debug)]
pub struct ScratchPool {
    len: usize,
    floats: RefCell<Vec<Vec<f64>>>,
    ints: RefCell<Vec<Vec<i64>>>,
}

impl ScratchPool {
    pub fn new(len: usize) -> Self {
        ScratchPool {
            len,
            floats: RefCell::new(Vec::new()),
            ints: RefCell::new(Vec::new()),
        }
    }

    /// Length of every buffer handed out.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check out a float buffer.
    pub fn floats(&self) -> Scratch<'_, f64> {
        Scratch::checkout(&self.floats, self.len)
    }

    /// Check out an integer buffer.
    pub fn ints(&self) -> Scratch<'_, i64> {
        Scratch::checkout(&self.ints, self.len)
    }

    /// Number of buffers currently waiting in the pool.
    pub fn available(&self) -> usize {
        self.floats.borrow().len() + self.ints.borrow().len()
    }
}

pub struct Scratch<'a, T> {
    home: &'a RefCell<Vec<Vec<T>>>,
    buf: Vec<T>,
}

impl<'a, T: Default + Clone> Scratch<'a, T> {
    fn checkout(home: &'a RefCell<Vec<Vec<T>>>, len: usize) -> Self {
        let buf = home
            .borrow_mut()
            .pop()
            .unwrap_or_else(|| vec![T::default(); len]);
        Scratch { home, buf }
    }
}

impl<T> Deref for Scratch<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.buf
    }
}

impl<T> DerefMut for Scratch<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.buf
    }
}

impl<T> Drop for Scratch<'_, T> {
    fn drop(&mut self) {
        self.home.borrow_mut().push(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_buffers_return_on_drop() {
        let pool = ScratchPool::new(16);
        {
            let mut a = pool.floats();
            let b = pool.ints();
            assert_eq!(a.len(), 16);
            assert_eq!(b.len(), 16);
            a[3] = 2.5;
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 2);

        // the same buffer comes back out
        let a = pool.floats();
        assert_eq!(a[3], 2.5);
        assert_eq!(pool.available(), 1);
    }

    #[rstest]
    fn test_nested_checkouts_are_distinct() {
        let pool = ScratchPool::new(4);
        let mut a = pool.floats();
        let mut b = pool.floats();
        a[0] = 1.0;
        b[0] = 2.0;
        assert_eq!((a[0], b[0]), (1.0, 2.0));
    }
}
