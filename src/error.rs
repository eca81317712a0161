//! Solver errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The rule-based algorithm handles positive subsumptions only.
    #[error("the rule-based algorithm cannot handle dissubsumptions")]
    NegativeConstraints,

    /// The search was cancelled from another thread.
    #[error("unification was interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;
