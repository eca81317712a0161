//! Flat EL atoms.
//!
//! An atom is either a concept name (constant or variable) or an
//! existential restriction ∃r.A whose filler A is itself a concept
//! name. Arbitrary EL concepts are flattened into this form before
//! unification; the solver never sees nested restrictions.

use serde::{Deserialize, Serialize};

/// Identifier for an interned concept name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameId(pub(crate) u32);

/// Identifier for an interned role name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(pub(crate) u32);

/// Identifier for an interned atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub(crate) u32);

impl NameId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl RoleId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl AtomId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A flat EL atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Atom {
    /// A concept constant. Its interpretation is fixed.
    Constant(NameId),
    /// A concept variable, subject to substitution.
    Variable(NameId),
    /// An existential restriction ∃r.A over a concept-name atom A.
    Existential(RoleId, AtomId),
}

impl Atom {
    pub fn is_constant(&self) -> bool {
        matches!(self, Atom::Constant(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Atom::Variable(_))
    }

    pub fn is_existential(&self) -> bool {
        matches!(self, Atom::Existential(_, _))
    }

    /// The role of an existential restriction, if any.
    pub fn role(&self) -> Option<RoleId> {
        match self {
            Atom::Existential(role, _) => Some(*role),
            _ => None,
        }
    }

    /// The filler of an existential restriction, if any.
    pub fn filler(&self) -> Option<AtomId> {
        match self {
            Atom::Existential(_, filler) => Some(*filler),
            _ => None,
        }
    }
}
