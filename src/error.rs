//! Error kinds for the simulator core.
//!
//! Every variant here is terminal: nothing in this crate retries or
//! recovers from one of these.

use thiserror::Error;

/// Errors raised by the simulator core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// An option value was out of its valid domain.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending option.
        name: &'static str,
        /// Human-readable reason it was rejected.
        reason: String,
    },

    /// A particle input line could not be parsed.
    #[error("invalid input at line {line}")]
    InvalidInput {
        /// 1-based line number in the input stream.
        line: usize,
    },

    /// The partitioner exceeded its recursion-depth bound with particles
    /// still indistinguishable to machine precision.
    #[error("degenerate tree: recursion depth exceeded with coincident particles")]
    DegenerateTree,

    /// A snapshot referenced a simulation tag not compiled into the binary.
    #[error("unknown simulation type `{tag}`")]
    SimulationTypeUnknown {
        /// The unrecognized tag, e.g. `O2QOPC21`.
        tag: String,
    },
}
