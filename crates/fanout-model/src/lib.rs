//! Key capability and hash-based containers consumed by the parallel transformers.
//!
//! Every container hashes through a `BuildHasher` it owns; transformers clone it into
//! their output, so the output always compares elements the way the input did.

mod collectable;
pub use collectable::Collectable;

mod fnv;
pub use fnv::{FnvBuildHasher, FnvHasher};

mod set;
pub use set::Set;

mod map;
pub use map::Map;

mod ordered;
pub use ordered::OrderedMap;
