//! The rule-based unification search.
//!
//! Implements the goal-oriented calculus of Baader and Morawska,
//! "Unification in the description logic EL" (LMCS 6(3), 2010): the
//! goal is normalized into flat subsumptions, eager rules are applied
//! exhaustively, and the remaining records are solved by
//! nondeterministic rules explored with chronological backtracking.

mod assignment;
mod changeset;
mod normalized;
mod rules;
mod session;

pub use session::{SessionStats, UnificationSession};
