//! Statistical stopping rule shared by all minimizers.
//!
//! Instead of stopping once the change between two iterations drops below a fixed
//! epsilon, which is meaningless as soon as sampling noise dominates the true change,
//! the last `N` accepted values are kept. The minimization has stabilized when the
//! window is full and every value in it is indistinguishable from the newest one.

use std::iter::Chain;
use std::ops::Index;
use std::slice;

use crate::noisy::NoisyValue;

/// A fixed-capacity ring buffer. Once full, every push overwrites the oldest element.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    i0: usize,
    capacity: usize,
    vec: Vec<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> RingBuffer<T> {
        RingBuffer {
            i0: 0,
            capacity,
            vec: Vec::with_capacity(capacity),
        }
    }

    /// Iterates from the oldest to the newest element.
    pub fn iter(&self) -> Chain<slice::Iter<T>, slice::Iter<T>> {
        self.vec[self.i0..].iter().chain(self.vec[..self.i0].iter())
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.vec.len() == self.capacity
    }

    pub fn newest(&self) -> Option<&T> {
        if self.vec.is_empty() {
            None
        } else {
            Some(&self[self.vec.len() - 1])
        }
    }

    pub fn push(&mut self, el: T) {
        if self.capacity == 0 {
            return;
        }
        if self.vec.len() < self.capacity {
            self.vec.push(el);
        } else {
            self.vec[self.i0] = el;
            self.i0 = (self.i0 + 1) % self.capacity;
        }
    }

    pub fn clear(&mut self) {
        self.vec.clear();
        self.i0 = 0;
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.vec[(index + self.i0) % self.vec.len()]
    }
}

/// Sliding window over the most recently accepted values of a minimization run.
#[derive(Debug, Clone)]
pub struct ConvergenceWindow {
    values: RingBuffer<NoisyValue>,
}

impl ConvergenceWindow {
    /// A window of `capacity` values. A capacity of 0 never reports convergence.
    pub fn new(capacity: usize) -> Self {
        ConvergenceWindow {
            values: RingBuffer::new(capacity),
        }
    }

    /// Appends `value` and reports whether the window has stabilized.
    pub fn push(&mut self, value: NoisyValue) -> bool {
        self.values.push(value);
        self.is_converged()
    }

    pub fn is_converged(&self) -> bool {
        if !self.values.is_full() {
            return false;
        }
        match self.values.newest() {
            Some(newest) => self.values.iter().all(|v| v == newest),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
