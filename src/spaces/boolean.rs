//! Space of condition bits
use super::{FiniteSpace, Space};
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two truth values. `false` has index 0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BooleanSpace;

impl BooleanSpace {
    pub const fn new() -> Self {
        Self
    }
}

impl fmt::Display for BooleanSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{false, true}")
    }
}

impl Space for BooleanSpace {
    type Element = bool;

    #[inline]
    fn contains(&self, _: &bool) -> bool {
        true
    }
}

impl FiniteSpace for BooleanSpace {
    #[inline]
    fn size(&self) -> usize {
        2
    }

    #[inline]
    fn to_index(&self, element: &bool) -> usize {
        usize::from(*element)
    }

    #[inline]
    fn from_index(&self, index: usize) -> Option<bool> {
        (index < 2).then(|| index == 1)
    }
}

impl Distribution<bool> for BooleanSpace {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        Standard.sample(rng)
    }
}
