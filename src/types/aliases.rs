use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};

/// A type alias for a hash map with a fast, non-cryptographic hash function.
///
/// Order-preserving: iteration follows insertion order, which keeps
/// propagation and enumeration deterministic for testing.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A type alias for a hash set with a fast, non-cryptographic hash function.
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// A finite, ordered, non-empty set of symbolic values a variable may take.
///
/// The position of a value within the domain is its dense index into a
/// factor's table along that variable's axis.
pub type Domain = FxIndexSet<String>;
