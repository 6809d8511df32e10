//! Error types for the kdsearch core library.
//!
//! Defines error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::fmt;

use thiserror::Error;

use crate::distance::DistanceError;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Collective phase a worker was executing when a message arrived.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CollectivePhase {
    /// Candidate-count exchange.
    CountExchange,
    /// Variable-length candidate gather.
    CandidateGather,
}

impl fmt::Display for CollectivePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountExchange => f.write_str("count exchange"),
            Self::CandidateGather => f.write_str("candidate gather"),
        }
    }
}

/// An error produced by a [`crate::Communicator`] collective operation.
///
/// Every variant is fatal to the distributed query that observed it.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CollectiveError {
    /// A participant disconnected before contributing to the collective.
    #[error("rank {rank} did not take part in the collective")]
    MissingParticipant {
        /// Rank that never delivered its contribution.
        rank: usize,
    },
    /// A participant delivered a different number of candidates than it announced.
    #[error("rank {rank} announced {announced} candidates but sent {received}")]
    CountMismatch {
        /// Rank that sent the inconsistent payload.
        rank: usize,
        /// Count reported during the exchange phase.
        announced: usize,
        /// Number of candidates actually received.
        received: usize,
    },
    /// A rank outside the communicator was addressed.
    #[error("rank {rank} is outside a communicator of size {size}")]
    InvalidRank {
        /// Offending rank.
        rank: usize,
        /// Number of participants in the communicator.
        size: usize,
    },
    /// A message arrived that the current phase cannot accept.
    #[error("unexpected message from rank {rank} during the {phase}")]
    UnexpectedMessage {
        /// Rank that sent the message.
        rank: usize,
        /// Phase the receiver was executing.
        phase: CollectivePhase,
    },
    /// The coordinator entered the gather without a layout from the count exchange.
    #[error("candidate gather on the coordinator requires a gather layout")]
    MissingLayout,
}

define_error_codes! {
    /// Stable codes describing [`CollectiveError`] variants.
    enum CollectiveErrorCode for CollectiveError {
        /// A participant disconnected before contributing.
        MissingParticipant => MissingParticipant { .. } => "COLLECTIVE_MISSING_PARTICIPANT",
        /// A participant sent a payload that disagrees with its announced count.
        CountMismatch => CountMismatch { .. } => "COLLECTIVE_COUNT_MISMATCH",
        /// A rank outside the communicator was addressed.
        InvalidRank => InvalidRank { .. } => "COLLECTIVE_INVALID_RANK",
        /// A message arrived out of phase.
        UnexpectedMessage => UnexpectedMessage { .. } => "COLLECTIVE_UNEXPECTED_MESSAGE",
        /// The coordinator gathered without a layout.
        MissingLayout => MissingLayout => "COLLECTIVE_MISSING_LAYOUT",
    }
}

/// Error type produced when configuring or running kdsearch operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum KdError {
    /// A point or target vector disagrees with the tree dimensionality.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Dimensionality carried by the tree or configuration.
        expected: usize,
        /// Feature count of the offending vector.
        actual: usize,
    },
    /// The requested neighbour count was zero.
    #[error("neighbour count must be at least 1 (got {got})")]
    InvalidNeighbourCount {
        /// The invalid neighbour count supplied by the caller.
        got: usize,
    },
    /// The requested or resolved dimensionality was zero.
    #[error("dimensionality must be at least 1 (got {got})")]
    InvalidDimensions {
        /// The invalid dimensionality.
        got: usize,
    },
    /// A coordinate was NaN or infinite.
    #[error("coordinate {index} is not finite: {value}")]
    NonFiniteCoordinate {
        /// Axis holding the offending value.
        index: usize,
        /// The non-finite value.
        value: f64,
    },
    /// A collective operation of the distributed protocol failed.
    #[error("collective operation failed: {source}")]
    Collective {
        /// Underlying collective failure.
        #[from]
        source: CollectiveError,
    },
    /// A synchronisation primitive became poisoned after a panic.
    #[error("lock for {resource} is poisoned")]
    LockPoisoned {
        /// Name of the locked resource that was poisoned.
        resource: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`KdError`] variants.
    enum KdErrorCode for KdError {
        /// A point or target vector disagrees with the tree dimensionality.
        DimensionMismatch => DimensionMismatch { .. } => "KD_DIMENSION_MISMATCH",
        /// The requested neighbour count was zero.
        InvalidNeighbourCount => InvalidNeighbourCount { .. } => "KD_INVALID_NEIGHBOUR_COUNT",
        /// The requested dimensionality was zero.
        InvalidDimensions => InvalidDimensions { .. } => "KD_INVALID_DIMENSIONS",
        /// A coordinate was NaN or infinite.
        NonFiniteCoordinate => NonFiniteCoordinate { .. } => "KD_NON_FINITE_COORDINATE",
        /// A collective operation failed.
        CollectiveFailure => Collective { .. } => "KD_COLLECTIVE_FAILURE",
        /// A synchronisation primitive was poisoned.
        LockPoisoned => LockPoisoned { .. } => "KD_LOCK_POISONED",
    }
}

impl KdError {
    /// Retrieve the inner [`CollectiveErrorCode`] when the error originated in a collective.
    #[must_use]
    pub const fn collective_code(&self) -> Option<CollectiveErrorCode> {
        match self {
            Self::Collective { source } => Some(source.code()),
            _ => None,
        }
    }

    /// Returns `true` for configuration errors that abort before any work starts.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidNeighbourCount { .. } | Self::InvalidDimensions { .. }
        )
    }
}

impl From<DistanceError> for KdError {
    fn from(error: DistanceError) -> Self {
        match error {
            DistanceError::ZeroLength => Self::InvalidDimensions { got: 0 },
            DistanceError::DimensionMismatch { left, right } => Self::DimensionMismatch {
                expected: left,
                actual: right,
            },
            DistanceError::NonFinite { index, value, .. } => {
                Self::NonFiniteCoordinate { index, value }
            }
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, KdError>;
