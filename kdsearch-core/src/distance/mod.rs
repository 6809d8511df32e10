//! Distance primitives for the nearest-neighbour search.
//!
//! The query engine ranks points by the Euclidean norm over their full feature
//! vectors. Inputs are validated so malformed vectors surface as errors rather
//! than as silently corrupt rankings.

mod euclidean;
mod helpers;
mod types;

pub use self::euclidean::euclidean_distance;
pub use self::types::{Distance, DistanceError, VectorKind};

pub(crate) use self::helpers::plane_distance;
