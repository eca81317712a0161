//! Changesets: the undo log of the search.

use indexmap::IndexSet;

use crate::goal::Subsumption;
use crate::search::assignment::Assignment;
use crate::search::normalized::SubsumptionId;
use crate::search::rules::Application;

/// Everything one rule application (plus the closure it triggered) did
/// to the session state.
///
/// A changeset is produced by a rule, enriched while it is committed,
/// and pushed on the search stack. Backtracking replays it in reverse.
/// The `trigger`/`application` pair is the resumption cursor: after a
/// rollback the search continues with the next alternative of the same
/// rule on the same record.
#[derive(Debug, Clone, Default)]
pub(crate) struct Changeset {
    /// The record the rule was applied to, solved on commit.
    pub trigger: Option<SubsumptionId>,
    /// Which rule alternative produced this changeset.
    pub application: Option<Application>,
    successful: bool,
    /// Subsumptions the rule asks to create; drained on commit.
    pub created: Vec<Subsumption>,
    /// Records inserted by the commit that still need solving.
    pub new_unsolved: IndexSet<SubsumptionId>,
    /// Records inserted by the commit that were solved on insertion.
    pub new_solved: IndexSet<SubsumptionId>,
    /// Pre-existing records marked solved by eager rules.
    pub solved: IndexSet<SubsumptionId>,
    /// Subsumers added to the assignment, reduced to the true delta on
    /// commit.
    pub new_subsumers: Assignment,
}

impl Changeset {
    pub fn success(trigger: SubsumptionId, application: Application) -> Self {
        Self {
            trigger: Some(trigger),
            application: Some(application),
            successful: true,
            ..Self::default()
        }
    }

    pub fn failure(trigger: SubsumptionId, application: Application) -> Self {
        Self {
            trigger: Some(trigger),
            application: Some(application),
            successful: false,
            ..Self::default()
        }
    }

    /// An empty successful changeset with no resumption cursor, used
    /// to accumulate the effects of eager passes.
    pub fn accumulator() -> Self {
        Self {
            successful: true,
            ..Self::default()
        }
    }

    pub fn was_successful(&self) -> bool {
        self.successful
    }

    /// Folds the effects of a later changeset into this one, so a
    /// single rollback undoes both.
    pub fn amend(&mut self, other: Changeset) {
        self.new_unsolved.extend(other.new_unsolved);
        self.new_solved.extend(other.new_solved);
        self.solved.extend(other.solved);
        self.new_subsumers.extend_from(&other.new_subsumers);
    }
}
