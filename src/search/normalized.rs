//! The working copy of the goal during the search.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::el::{AtomId, AtomManager};
use crate::goal::{Goal, Subsumption};

/// Index of a record in the [`NormalizedGoal`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SubsumptionId(pub(crate) usize);

/// A goal subsumption together with its solved flag.
#[derive(Debug, Clone)]
pub(crate) struct FlatSubsumption {
    subsumption: Subsumption,
    solved: bool,
}

impl FlatSubsumption {
    pub fn subsumption(&self) -> &Subsumption {
        &self.subsumption
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }
}

/// The mutable record store of one search session.
///
/// Records live in an arena and are never reallocated; the active set
/// tracks which of them currently belong to the goal, in insertion
/// order. Removal by backtracking only deactivates a record, so ids
/// held by changesets on the stack stay valid.
///
/// Two variable indices drive the propagation machinery: records with
/// a variable in the body are revisited when that variable gains
/// subsumers, and records with a variable as head are expanded into
/// one copy per subsumer of that variable.
#[derive(Debug, Default)]
pub(crate) struct NormalizedGoal {
    records: Vec<FlatSubsumption>,
    active: IndexSet<SubsumptionId>,
    index: HashMap<Subsumption, SubsumptionId>,
    by_body_variable: HashMap<AtomId, IndexSet<SubsumptionId>>,
    by_head_variable: HashMap<AtomId, IndexSet<SubsumptionId>>,
    max_size: usize,
}

impl NormalizedGoal {
    pub fn new(goal: &Goal) -> Self {
        let mut normalized = Self::default();
        for subsumption in goal.subsumptions() {
            normalized.insert(subsumption.clone(), goal.manager());
        }
        normalized
    }

    /// Inserts a record unless an equal one is already active.
    ///
    /// A record whose head is a variable is solved on insertion: it is
    /// satisfied by expanding it for every subsumer the head variable
    /// acquires. Returns the new id and whether it was auto-solved.
    pub fn insert(
        &mut self,
        subsumption: Subsumption,
        manager: &AtomManager,
    ) -> Option<(SubsumptionId, bool)> {
        if self.index.contains_key(&subsumption) {
            return None;
        }
        let id = SubsumptionId(self.records.len());
        let auto_solved = manager.is_variable(subsumption.head());
        for &atom in subsumption.body() {
            if manager.is_variable(atom) {
                self.by_body_variable.entry(atom).or_default().insert(id);
            }
        }
        if auto_solved {
            self.by_head_variable
                .entry(subsumption.head())
                .or_default()
                .insert(id);
        }
        self.index.insert(subsumption.clone(), id);
        self.records.push(FlatSubsumption {
            subsumption,
            solved: auto_solved,
        });
        self.active.insert(id);
        self.max_size = self.max_size.max(self.active.len());
        Some((id, auto_solved))
    }

    /// Deactivates a record inserted earlier.
    pub fn remove(&mut self, id: SubsumptionId) {
        if !self.active.shift_remove(&id) {
            return;
        }
        let record = &self.records[id.0];
        self.index.remove(&record.subsumption);
        for set in self.by_body_variable.values_mut() {
            set.shift_remove(&id);
        }
        if let Some(set) = self.by_head_variable.get_mut(&record.subsumption.head()) {
            set.shift_remove(&id);
        }
    }

    pub fn record(&self, id: SubsumptionId) -> &FlatSubsumption {
        &self.records[id.0]
    }

    pub fn set_solved(&mut self, id: SubsumptionId, solved: bool) {
        self.records[id.0].solved = solved;
    }

    /// The earliest-inserted active record that is still unsolved.
    pub fn first_unsolved(&self) -> Option<SubsumptionId> {
        self.active
            .iter()
            .copied()
            .find(|&id| !self.records[id.0].solved)
    }

    pub fn active_ids(&self) -> Vec<SubsumptionId> {
        self.active.iter().copied().collect()
    }

    /// Active records with `variable` as a top-level body atom.
    pub fn with_body_variable(&self, variable: AtomId) -> Vec<SubsumptionId> {
        self.by_body_variable
            .get(&variable)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Active records with `variable` as head. These are always
    /// solved.
    pub fn with_head_variable(&self, variable: AtomId) -> Vec<SubsumptionId> {
        self.by_head_variable
            .get(&variable)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn size(&self) -> usize {
        self.active.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
