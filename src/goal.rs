//! Unification goals: the input boundary of the solver.

use serde::{Deserialize, Serialize};

use crate::el::{AtomId, AtomManager};

/// A flat subsumption `A1 ⊓ ... ⊓ An ⊑ B` between atoms.
///
/// The body is kept sorted by atom id with duplicates removed, so two
/// subsumptions over the same atom set compare equal regardless of how
/// they were stated. An empty body denotes ⊤.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subsumption {
    body: Vec<AtomId>,
    head: AtomId,
}

impl Subsumption {
    pub fn new(mut body: Vec<AtomId>, head: AtomId) -> Self {
        body.sort_unstable();
        body.dedup();
        Self { body, head }
    }

    pub fn body(&self) -> &[AtomId] {
        &self.body
    }

    pub fn head(&self) -> AtomId {
        self.head
    }

    /// Whether the head occurs as a top-level body atom.
    pub fn is_trivial(&self) -> bool {
        self.body.binary_search(&self.head).is_ok()
    }
}

/// A unification problem over the atoms of one [`AtomManager`].
///
/// Positive subsumptions are the constraints to satisfy. Negative
/// constraints (dissubsumptions) can be recorded but the rule-based
/// solver rejects goals that carry any.
#[derive(Debug, Clone)]
pub struct Goal {
    manager: AtomManager,
    subsumptions: Vec<Subsumption>,
    dissubsumptions: Vec<Subsumption>,
}

impl Goal {
    pub fn new(manager: AtomManager) -> Self {
        Self {
            manager,
            subsumptions: Vec::new(),
            dissubsumptions: Vec::new(),
        }
    }

    pub fn manager(&self) -> &AtomManager {
        &self.manager
    }

    /// Adds the constraint `body ⊑ head`.
    pub fn add_subsumption(&mut self, body: Vec<AtomId>, head: AtomId) {
        self.subsumptions.push(Subsumption::new(body, head));
    }

    /// Adds the constraint `body ⋢ head`.
    pub fn add_dissubsumption(&mut self, body: Vec<AtomId>, head: AtomId) {
        self.dissubsumptions.push(Subsumption::new(body, head));
    }

    pub fn subsumptions(&self) -> &[Subsumption] {
        &self.subsumptions
    }

    pub fn has_negative_part(&self) -> bool {
        !self.dissubsumptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_canonicalized() {
        let mut manager = AtomManager::new();
        let a = manager.constant("A");
        let b = manager.constant("B");
        let s1 = Subsumption::new(vec![b, a, a], a);
        let s2 = Subsumption::new(vec![a, b], a);
        assert_eq!(s1, s2);
        assert!(s1.is_trivial());
    }

    #[test]
    fn test_negative_part_detection() {
        let mut manager = AtomManager::new();
        let a = manager.constant("A");
        let b = manager.constant("B");
        let mut goal = Goal::new(manager);
        goal.add_subsumption(vec![a], b);
        assert!(!goal.has_negative_part());
        goal.add_dissubsumption(vec![b], a);
        assert!(goal.has_negative_part());
    }
}
