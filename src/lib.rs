//! Rule-based unification for the description logic EL.
//!
//! Decides whether two EL concepts can be made equivalent by
//! substituting concept variables, and enumerates the substitutions
//! one at a time. The calculus is the goal-oriented algorithm of
//! Baader and Morawska, "Unification in the description logic EL"
//! (Logical Methods in Computer Science 6(3), 2010); termination of
//! the enumeration is guaranteed for cycle-restricted inputs.
//!
//! ```
//! use elunify::{AtomManager, Goal, UnificationSession};
//!
//! // X ⊑ A and X ⊑ ∃r.X
//! let mut manager = AtomManager::new();
//! let x = manager.variable("X");
//! let a = manager.constant("A");
//! let rx = manager.existential("r", x);
//! let mut goal = Goal::new(manager);
//! goal.add_subsumption(vec![x], a);
//! goal.add_subsumption(vec![x], rx);
//!
//! let mut session = UnificationSession::new(goal)?;
//! assert!(session.advance()?);
//! let unifier = session.unifier();
//! assert!(unifier.definition(x).is_some());
//! # Ok::<(), elunify::Error>(())
//! ```

pub mod el;
pub mod error;
pub mod goal;
pub mod search;
pub mod unifier;

pub use el::{Atom, AtomId, AtomManager, NameId, RoleId};
pub use error::{Error, Result};
pub use goal::{Goal, Subsumption};
pub use search::{SessionStats, UnificationSession};
pub use unifier::{Definition, Unifier};
