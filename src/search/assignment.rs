//! Variable assignments built up during the search.

use indexmap::{IndexMap, IndexSet};

use crate::el::AtomId;

/// Maps variables to their sets of non-variable subsumers.
///
/// The candidate unifier sends each variable to the conjunction of its
/// subsumers; a variable without entries is mapped to ⊤. Both the map
/// and the subsumer sets preserve insertion order, so enumeration is
/// deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    subsumers: IndexMap<AtomId, IndexSet<AtomId>>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `atom` to the subsumers of `variable`. Returns whether the
    /// entry was new.
    pub fn add(&mut self, variable: AtomId, atom: AtomId) -> bool {
        self.subsumers.entry(variable).or_default().insert(atom)
    }

    pub fn contains(&self, variable: AtomId, atom: AtomId) -> bool {
        self.subsumers
            .get(&variable)
            .is_some_and(|set| set.contains(&atom))
    }

    pub fn subsumers(&self, variable: AtomId) -> impl Iterator<Item = AtomId> + '_ {
        self.subsumers
            .get(&variable)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Variables with at least one subsumer, in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.subsumers
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(&var, _)| var)
    }

    pub fn entries(&self) -> impl Iterator<Item = (AtomId, &IndexSet<AtomId>)> + '_ {
        self.subsumers.iter().map(|(&var, set)| (var, set))
    }

    pub fn is_empty(&self) -> bool {
        self.subsumers.values().all(|set| set.is_empty())
    }

    /// Whether every entry of `other` also occurs here.
    pub fn contains_all(&self, other: &Assignment) -> bool {
        other
            .entries()
            .all(|(var, atoms)| atoms.iter().all(|&atom| self.contains(var, atom)))
    }

    /// Merges all entries of `other` into this assignment.
    pub fn extend_from(&mut self, other: &Assignment) {
        for (var, set) in other.entries() {
            self.subsumers.entry(var).or_default().extend(set.iter().copied());
        }
    }

    /// Removes every entry that also occurs in `other`, keeping only
    /// the difference. Emptied variables are dropped entirely.
    pub fn subtract(&mut self, other: &Assignment) {
        for (var, removed) in other.entries() {
            if let Some(set) = self.subsumers.get_mut(&var) {
                for atom in removed {
                    set.shift_remove(atom);
                }
            }
        }
        self.subsumers.retain(|_, set| !set.is_empty());
    }
}
