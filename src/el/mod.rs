//! Flat EL syntax: atoms and their interning.

mod atom;
mod manager;

pub use atom::{Atom, AtomId, NameId, RoleId};
pub use manager::AtomManager;
