/// Space implementations used to describe driving actions and observations.

pub mod space;
pub mod interop;

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use space::Space;

/// A discrete space of integers in [0, n).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    n: u32,
}

impl Discrete {
    pub fn new(n: u32) -> Self {
        assert!(n > 0, "Discrete space requires n > 0");
        Self { n }
    }

    pub fn n(&self) -> u32 { self.n }
}

impl Space for Discrete {
    type Element = u32;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        if self.n == 1 { return 0; }
        let dist = Uniform::from(0..self.n);
        dist.sample(rng)
    }

    fn contains(&self, elem: &Self::Element) -> bool { *elem < self.n }
}

/// A bounded box of values with a runtime shape.
///
/// Bounds are stored flat in row-major order; `low.len() == high.len()` equals
/// the product of `shape`. Bounds are inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace<T: Copy + PartialOrd> {
    low: Vec<T>,
    high: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Copy + PartialOrd> BoxSpace<T> {
    /// A one-dimensional box with per-element bounds.
    pub fn new<L: Into<Vec<T>>, H: Into<Vec<T>>>(low: L, high: H) -> Self {
        let low = low.into();
        let high = high.into();
        assert_eq!(low.len(), high.len(), "low and high must have the same length");
        let shape = vec![low.len()];
        Self::with_shape(low, high, shape)
    }

    /// A box of the given shape where every element shares the same bounds.
    pub fn uniform(low: T, high: T, shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self::with_shape(vec![low; len], vec![high; len], shape.to_vec())
    }

    /// A one-dimensional box built by repeating a bound pattern `reps` times.
    pub fn tiled(low: &[T], high: &[T], reps: usize) -> Self {
        assert_eq!(low.len(), high.len(), "low and high patterns must have the same length");
        let low: Vec<T> = low.iter().copied().cycle().take(low.len() * reps).collect();
        let high: Vec<T> = high.iter().copied().cycle().take(high.len() * reps).collect();
        Self::new(low, high)
    }

    fn with_shape(low: Vec<T>, high: Vec<T>, shape: Vec<usize>) -> Self {
        assert!(!low.is_empty(), "BoxSpace requires at least one element");
        assert_eq!(low.len(), shape.iter().product::<usize>(), "bounds do not match shape");
        for i in 0..low.len() {
            assert!(low[i] <= high[i], "low[{i}] > high[{i}]");
        }
        Self { low, high, shape }
    }

    pub fn low(&self) -> &[T] { &self.low }
    pub fn high(&self) -> &[T] { &self.high }
    pub fn shape(&self) -> &[usize] { &self.shape }

    /// Total number of scalar elements.
    pub fn len(&self) -> usize { self.low.len() }

    pub fn is_empty(&self) -> bool { self.low.is_empty() }

    /// Whether a single scalar fits the bounds of a one-element box.
    pub fn contains_scalar(&self, value: T) -> bool {
        self.len() == 1 && self.low[0] <= value && value <= self.high[0]
    }
}

impl<T> Space for BoxSpace<T>
where
    T: Copy + PartialOrd + SampleUniform,
{
    type Element = Vec<T>;

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Element {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(&lo, &hi)| Uniform::new_inclusive(lo, hi).sample(rng))
            .collect()
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        elem.len() == self.low.len()
            && elem
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}
