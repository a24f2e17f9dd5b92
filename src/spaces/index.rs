use super::{FiniteSpace, Space};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An index space; integers `0 .. size`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    pub size: usize,
}

impl IndexSpace {
    pub const fn new(size: usize) -> Self {
        Self { size }
    }
}

impl fmt::Display for IndexSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IndexSpace({})", self.size)
    }
}

impl Space for IndexSpace {
    type Element = usize;

    #[inline]
    fn contains(&self, value: &Self::Element) -> bool {
        value < &self.size
    }
}

impl FiniteSpace for IndexSpace {
    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn to_index(&self, element: &Self::Element) -> usize {
        *element
    }

    #[inline]
    fn from_index(&self, index: usize) -> Option<Self::Element> {
        if index < self.size {
            Some(index)
        } else {
            None
        }
    }
}

impl Distribution<<Self as Space>::Element> for IndexSpace {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> <Self as Space>::Element {
        rng.gen_range(0..self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{testing, FeatureSpace};
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn contains_samples(#[values(1, 5)] size: usize) {
        testing::check_contains_samples(&IndexSpace::new(size), 50);
    }

    #[rstest]
    fn from_to_index_iter_size(#[values(1, 5)] size: usize) {
        testing::check_from_to_index_iter_size(&IndexSpace::new(size));
    }

    #[test]
    fn from_index_invalid() {
        testing::check_from_index_invalid(&IndexSpace::new(3));
    }

    #[test]
    fn contains_upper_bound() {
        let space = IndexSpace::new(3);
        assert!(space.contains(&2));
        assert!(!space.contains(&3));
    }

    #[test]
    fn one_hot_features() {
        let space = IndexSpace::new(4);
        let mut out = [0.0; 4];
        space.features_out(&2, &mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 0.0]);
    }
}
