//! Spaces: sets with some structure
mod boolean;
mod index;
#[cfg(test)]
pub mod testing;

pub use boolean::BooleanSpace;
pub use index::IndexSpace;

use rand::distributions::Distribution;

/// A space: a set of values with some added structure.
///
/// A space is effectively a type with extra constraints on its values.
pub trait Space {
    /// Type of elements contained by this space.
    type Element;

    /// Check whether a particular value is contained in the space.
    fn contains(&self, value: &Self::Element) -> bool;
}

/// A space from which samples can be drawn.
///
/// No particular distribution is specified but the distribution:
/// * must have support equal to the entire space, and
/// * should be some form of reasonable "standard" distribution for the space.
pub trait SampleSpace: Space + Distribution<<Self as Space>::Element> {}

impl<S: Space + Distribution<<Self as Space>::Element>> SampleSpace for S {}

/// A space containing finitely many elements.
pub trait FiniteSpace: Space {
    /// The number of elements in the space.
    fn size(&self) -> usize;

    /// Get the index of an element.
    fn to_index(&self, element: &Self::Element) -> usize;

    /// Try to convert an index to an element.
    ///
    /// If `None` is returned then the index was invalid.
    fn from_index(&self, index: usize) -> Option<Self::Element>;
}

/// A space whose elements can be encoded as real-valued feature vectors.
pub trait FeatureSpace: Space {
    /// Length of the feature vectors.
    fn num_features(&self) -> usize;

    /// Write the features of an element into a zero-initialized slice.
    ///
    /// # Panics
    /// If `out.len() != self.num_features()`.
    fn features_out(&self, element: &Self::Element, out: &mut [f32]);
}

/// Finite spaces encode their elements as one-hot vectors.
impl<S: FiniteSpace> FeatureSpace for S {
    #[inline]
    fn num_features(&self) -> usize {
        self.size()
    }

    #[inline]
    fn features_out(&self, element: &Self::Element, out: &mut [f32]) {
        assert_eq!(out.len(), self.size(), "output slice has the wrong size");
        out[self.to_index(element)] = 1.0;
    }
}
