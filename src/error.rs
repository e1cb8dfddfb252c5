//! Error taxonomy for the mining core
//!
//! "No results" is never an error: an empty itemset table or rule list is
//! returned as `Ok`. Everything here means the run produced nothing usable.

use thiserror::Error;

/// Errors raised by the encoder, miner, rule generator and advisor
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BasketError {
    /// A parameter was out of range; raised before any computation starts
    #[error("invalid configuration: {parameter} {reason}")]
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },

    /// Nothing to mine: no transactions, or an empty item universe
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// The caller tripped the cancel token or the deadline passed
    #[error("mining cancelled before completion")]
    Cancelled,

    /// A miner or rule generator bug; never recoverable
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

impl BasketError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        BasketError::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type of the mining core
pub type Result<T> = std::result::Result<T, BasketError>;
