//! The backtracking search session.
//!
//! A session solves one goal and enumerates its unifiers one at a
//! time. The search alternates two phases:
//!
//! 1. Closure: eager rules are applied until a fixpoint. Static rules
//!    look at a record alone; dynamic rules also consult the current
//!    assignment and are re-run for every record whose body mentions a
//!    variable that gained subsumers.
//! 2. Choice: the earliest-inserted unsolved record is picked and the
//!    nondeterministic rules are tried on it, decomposition before
//!    extension, alternatives in body order. A successful application
//!    is committed together with its closure and pushed on the search
//!    stack.
//!
//! A failure rolls the current changeset back and resumes with the
//! next alternative; when a record has none left, the stack is popped
//! until some earlier choice still has one. The stack of changesets is
//! the only undo log: committed effects outside it (the initial
//! closure) are permanent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::el::AtomId;
use crate::error::{Error, Result};
use crate::goal::{Goal, Subsumption};
use crate::search::assignment::Assignment;
use crate::search::changeset::Changeset;
use crate::search::normalized::{NormalizedGoal, SubsumptionId};
use crate::search::rules::{Application, Rule, DYNAMIC_EAGER, NONDETERMINISTIC, STATIC_EAGER};
use crate::unifier::{Definition, Unifier};

/// Search statistics of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Number of records after normalization.
    pub initial_size: usize,
    /// Peak number of active records seen so far.
    pub max_size: usize,
    /// Nodes of the search tree visited so far, the root included.
    pub tree_size: usize,
    /// Branches abandoned after a failure so far.
    pub dead_ends: usize,
    /// Registered variables of the problem.
    pub variable_count: usize,
}

/// An in-progress enumeration of the unifiers of one goal.
///
/// Each call to [`advance`](Self::advance) either lands on the next
/// solution, in which case [`unifier`](Self::unifier) reads it off the
/// current assignment, or exhausts the search and returns `false`.
pub struct UnificationSession {
    goal: Goal,
    normalized: NormalizedGoal,
    assignment: Assignment,
    search_stack: Vec<Changeset>,
    started: bool,
    poisoned: bool,
    initial_size: usize,
    tree_size: usize,
    dead_ends: usize,
    cancel: Arc<AtomicBool>,
}

impl UnificationSession {
    /// Starts a session for `goal`.
    ///
    /// Fails with [`Error::NegativeConstraints`] if the goal carries
    /// dissubsumptions; the rule set only handles positive problems.
    pub fn new(goal: Goal) -> Result<Self> {
        if goal.has_negative_part() {
            return Err(Error::NegativeConstraints);
        }
        let normalized = NormalizedGoal::new(&goal);
        let initial_size = normalized.size();
        Ok(Self {
            goal,
            normalized,
            assignment: Assignment::new(),
            search_stack: Vec::new(),
            started: false,
            poisoned: false,
            initial_size,
            tree_size: 1,
            dead_ends: 0,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A flag that cancels the session when set from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Moves to the next unifier. Returns `false` once the search
    /// space is exhausted; further calls keep returning `false`.
    ///
    /// After an [`Error::Interrupted`] the session is unusable and
    /// every later call returns the same error.
    pub fn advance(&mut self) -> Result<bool> {
        if self.poisoned {
            return Err(Error::Interrupted);
        }
        if !self.started {
            self.started = true;
            if !self.initial_closure() {
                return Ok(false);
            }
        } else if !self.backtrack() {
            return Ok(false);
        }
        self.solve()
    }

    /// The substitution at the current search node.
    ///
    /// Meaningful after [`advance`](Self::advance) returned `true`.
    pub fn unifier(&self) -> Unifier {
        let definitions = self
            .goal
            .manager()
            .variables()
            .map(|variable| Definition {
                variable,
                subsumers: self.assignment.subsumers(variable).collect(),
            })
            .collect();
        Unifier::new(definitions)
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            initial_size: self.initial_size,
            max_size: self.normalized.max_size(),
            tree_size: self.tree_size,
            dead_ends: self.dead_ends,
            variable_count: self.goal.manager().variable_count(),
        }
    }

    /// Human-readable diagnostics as label/value pairs.
    pub fn info(&self) -> Vec<(String, String)> {
        let stats = self.stats();
        vec![
            ("Name".to_string(), "Rule-based algorithm".to_string()),
            (
                "Initial number of subsumptions".to_string(),
                stats.initial_size.to_string(),
            ),
            (
                "Max. number of subsumptions (so far)".to_string(),
                stats.max_size.to_string(),
            ),
            (
                "Size of the search tree (so far)".to_string(),
                stats.tree_size.to_string(),
            ),
            (
                "Number of encountered dead ends (so far)".to_string(),
                stats.dead_ends.to_string(),
            ),
            (
                "Number of variables".to_string(),
                stats.variable_count.to_string(),
            ),
        ]
    }

    /// One pass of `rules` over `ids`, first applicable rule per
    /// record. With an overlay assignment the pass sees its own
    /// subsumer additions; without one it reads the committed
    /// assignment. Returns the failing changeset as soon as a rule
    /// fails, discarding the rest of the pass.
    fn apply_eager_pass(
        &self,
        ids: &[SubsumptionId],
        rules: &[Rule],
        mut overlay: Option<&mut Assignment>,
    ) -> Changeset {
        let manager = self.goal.manager();
        let mut acc = Changeset::accumulator();
        for &id in ids {
            if self.normalized.record(id).is_solved() {
                continue;
            }
            for &rule in rules {
                let view: &Assignment = match overlay.as_deref() {
                    Some(a) => a,
                    None => &self.assignment,
                };
                let sub = self.normalized.record(id).subsumption();
                let Some(app) = rule.first_application(sub, view, manager) else {
                    continue;
                };
                let result = rule.apply(id, sub, app, manager);
                if !result.was_successful() {
                    return result;
                }
                if let Some(a) = overlay.as_deref_mut() {
                    a.extend_from(&result.new_subsumers);
                }
                acc.new_subsumers.extend_from(&result.new_subsumers);
                acc.solved.insert(id);
                break;
            }
        }
        acc
    }

    /// Realizes a changeset: marks records solved, inserts created
    /// records, updates the assignment and expands the goal.
    ///
    /// Newly inserted records that were solved on insertion are copied
    /// once per committed subsumer of their head variable; conversely,
    /// every subsumer a variable gains copies all solved records with
    /// that head. New unsolved records immediately face the static
    /// rules; a failure there fails the whole commit, leaving the
    /// enriched changeset for the caller to roll back.
    fn commit(&mut self, res: &mut Changeset, replacement: Option<Assignment>) -> bool {
        if let Some(trigger) = res.trigger {
            self.normalized.set_solved(trigger, true);
        }

        for sub in std::mem::take(&mut res.created) {
            if let Some((id, auto_solved)) = self.normalized.insert(sub, self.goal.manager()) {
                if auto_solved {
                    res.new_solved.insert(id);
                } else {
                    res.new_unsolved.insert(id);
                }
            }
        }

        // expand records solved on insertion against the committed
        // assignment; the delta is handled below
        let mut pending: Vec<SubsumptionId> = res.new_solved.iter().copied().collect();
        let mut next = 0;
        while next < pending.len() {
            let id = pending[next];
            next += 1;
            let head = self.normalized.record(id).subsumption().head();
            let subsumers: Vec<AtomId> = self.assignment.subsumers(head).collect();
            let body = self.normalized.record(id).subsumption().body().to_vec();
            for atom in subsumers {
                let copy = Subsumption::new(body.clone(), atom);
                if let Some((new_id, auto_solved)) =
                    self.normalized.insert(copy, self.goal.manager())
                {
                    if auto_solved {
                        if res.new_solved.insert(new_id) {
                            pending.push(new_id);
                        }
                    } else {
                        res.new_unsolved.insert(new_id);
                    }
                }
            }
        }

        for &id in &res.solved {
            self.normalized.set_solved(id, true);
        }

        // keep only the true delta, then apply it
        res.new_subsumers.subtract(&self.assignment);
        match replacement {
            Some(assignment) => self.assignment = assignment,
            None => self.assignment.extend_from(&res.new_subsumers),
        }

        let delta = res.new_subsumers.clone();
        for (variable, atoms) in delta.entries() {
            for id in self.normalized.with_head_variable(variable) {
                let body = self.normalized.record(id).subsumption().body().to_vec();
                for &atom in atoms {
                    let copy = Subsumption::new(body.clone(), atom);
                    if let Some((new_id, auto_solved)) =
                        self.normalized.insert(copy, self.goal.manager())
                    {
                        if auto_solved {
                            res.new_solved.insert(new_id);
                        } else {
                            res.new_unsolved.insert(new_id);
                        }
                    }
                }
            }
        }

        let fresh: Vec<SubsumptionId> = res.new_unsolved.iter().copied().collect();
        let pass = self.apply_eager_pass(&fresh, &STATIC_EAGER, None);
        if !pass.was_successful() {
            return false;
        }
        for &id in &pass.solved {
            self.normalized.set_solved(id, true);
        }
        res.amend(pass);
        true
    }

    /// Undoes a committed changeset, restoring the state it was
    /// committed against.
    fn rollback(&mut self, res: &Changeset) {
        self.assignment.subtract(&res.new_subsumers);
        for &id in &res.new_solved {
            self.normalized.remove(id);
        }
        for &id in &res.new_unsolved {
            self.normalized.remove(id);
        }
        for &id in &res.solved {
            self.normalized.set_solved(id, false);
        }
        if let Some(trigger) = res.trigger {
            self.normalized.set_solved(trigger, false);
        }
    }

    /// Runs the dynamic rules to a fixpoint after a commit, folding
    /// every round into `parent` so one rollback undoes it all.
    ///
    /// Each round works on an overlay copy of the committed assignment
    /// and commits its own changeset; the round's additions seed the
    /// next round. A failed round leaves `parent` holding whatever was
    /// already committed.
    fn run_closure(&mut self, parent: &mut Changeset) -> bool {
        let mut unsolved: Vec<SubsumptionId> = parent.new_unsolved.iter().copied().collect();
        let mut gained = parent.new_subsumers.clone();
        loop {
            let mut overlay = self.assignment.clone();
            let mut round = Changeset::accumulator();

            let pass = self.apply_eager_pass(&unsolved, &DYNAMIC_EAGER, Some(&mut overlay));
            if !pass.was_successful() {
                return false;
            }
            round.amend(pass);

            let variables: Vec<AtomId> = gained.variables().collect();
            for variable in variables {
                let ids = self.normalized.with_body_variable(variable);
                let pass = self.apply_eager_pass(&ids, &DYNAMIC_EAGER, Some(&mut overlay));
                if !pass.was_successful() {
                    return false;
                }
                round.amend(pass);
            }

            let committed = self.commit(&mut round, Some(overlay));
            unsolved = round.new_unsolved.iter().copied().collect();
            gained = round.new_subsumers.clone();
            parent.amend(round);
            if !committed {
                return false;
            }
            if unsolved.is_empty() && gained.is_empty() {
                return true;
            }
        }
    }

    /// Saturates the freshly normalized goal before the first descent.
    /// Solved flags set here are permanent: the initial changeset is
    /// never pushed on the stack.
    fn initial_closure(&mut self) -> bool {
        let ids = self.normalized.active_ids();
        let pass = self.apply_eager_pass(&ids, &STATIC_EAGER, None);
        if !pass.was_successful() {
            return false;
        }
        for &id in &pass.solved {
            self.normalized.set_solved(id, true);
        }

        let mut overlay = Assignment::new();
        let ids = self.normalized.active_ids();
        let mut res = self.apply_eager_pass(&ids, &DYNAMIC_EAGER, Some(&mut overlay));
        if !res.was_successful() {
            return false;
        }
        if !self.commit(&mut res, Some(overlay)) {
            return false;
        }
        self.run_closure(&mut res)
    }

    /// Tries the nondeterministic rules on `trigger`, starting after
    /// the `resume` cursor if one is given. Pushes the first
    /// alternative that commits and closes successfully.
    fn apply_next_choice(&mut self, trigger: SubsumptionId, resume: Option<Application>) -> bool {
        let start = resume
            .and_then(|app| NONDETERMINISTIC.iter().position(|&rule| rule == app.rule()))
            .unwrap_or(0);
        let mut previous = resume;
        for &rule in &NONDETERMINISTIC[start..] {
            loop {
                let sub = self.normalized.record(trigger).subsumption().clone();
                let app = match previous {
                    Some(prev) if prev.rule() == rule => {
                        rule.next_application(&sub, self.goal.manager(), prev)
                    }
                    _ => rule.first_application(&sub, &self.assignment, self.goal.manager()),
                };
                let Some(app) = app else { break };
                previous = Some(app);
                let mut changeset = rule.apply(trigger, &sub, app, self.goal.manager());
                if !changeset.was_successful() {
                    continue;
                }
                if !self.commit(&mut changeset, None) {
                    self.dead_ends += 1;
                    self.rollback(&changeset);
                    continue;
                }
                if !self.run_closure(&mut changeset) {
                    self.dead_ends += 1;
                    self.rollback(&changeset);
                    continue;
                }
                self.search_stack.push(changeset);
                self.tree_size += 1;
                return true;
            }
        }
        false
    }

    /// Pops the stack until some earlier choice has an untried
    /// alternative and commits it. `false` means the root was popped.
    fn backtrack(&mut self) -> bool {
        while let Some(changeset) = self.search_stack.pop() {
            self.rollback(&changeset);
            if let (Some(trigger), Some(application)) = (changeset.trigger, changeset.application)
            {
                if self.apply_next_choice(trigger, Some(application)) {
                    return true;
                }
            }
        }
        false
    }

    /// Descends until every record is solved or the search space is
    /// exhausted.
    fn solve(&mut self) -> Result<bool> {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                self.poisoned = true;
                return Err(Error::Interrupted);
            }
            let Some(id) = self.normalized.first_unsolved() else {
                return Ok(true);
            };
            if self.apply_next_choice(id, None) {
                continue;
            }
            self.dead_ends += 1;
            if !self.backtrack() {
                return Ok(false);
            }
        }
    }

    #[cfg(test)]
    fn snapshot(&self) -> (Vec<(Subsumption, bool)>, Assignment) {
        let records = self
            .normalized
            .active_ids()
            .into_iter()
            .map(|id| {
                let record = self.normalized.record(id);
                (record.subsumption().clone(), record.is_solved())
            })
            .collect();
        (records, self.assignment.clone())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::el::AtomManager;
    use crate::search::proptest_tests::{goal_shape, make_goal};

    #[test]
    fn test_rollback_restores_search_state() {
        // {∃r.B, X} ⊑ ∃r.A: decomposition dead-ends on {B} ⊑ A, then
        // extension commits ∃r.A into S(X)
        let mut manager = AtomManager::new();
        let x = manager.variable("X");
        let a = manager.constant("A");
        let b = manager.constant("B");
        let ra = manager.existential("r", a);
        let rb = manager.existential("r", b);
        let mut goal = Goal::new(manager);
        goal.add_subsumption(vec![rb, x], ra);

        let mut session = UnificationSession::new(goal).unwrap();
        session.started = true;
        assert!(session.initial_closure());
        let before = session.snapshot();

        let trigger = session.normalized.first_unsolved().unwrap();
        assert!(session.apply_next_choice(trigger, None));
        let after = session.snapshot();
        assert_ne!(before, after);
        assert!(session.assignment.contains(x, ra));

        let changeset = session.search_stack.pop().unwrap();
        session.rollback(&changeset);
        assert_eq!(session.snapshot(), before);

        // replaying the same choice lands in the same state
        assert!(session.apply_next_choice(trigger, None));
        assert_eq!(session.snapshot(), after);
    }

    #[test]
    fn test_closure_reaches_fixpoint_without_choices() {
        // the eager extension on {X} ⊑ ∃r.B lets the dynamic closure
        // solve {A, X} ⊑ ∃r.B without touching the search stack
        let mut manager = AtomManager::new();
        let x = manager.variable("X");
        let a = manager.constant("A");
        let b = manager.constant("B");
        let rb = manager.existential("r", b);
        let mut goal = Goal::new(manager);
        goal.add_subsumption(vec![a, x], rb);
        goal.add_subsumption(vec![x], rb);

        let mut session = UnificationSession::new(goal).unwrap();
        assert_eq!(session.advance(), Ok(true));
        let stats = session.stats();
        assert_eq!(stats.tree_size, 1);
        assert_eq!(stats.dead_ends, 0);
        assert!(session.assignment.contains(x, rb));
    }

    #[test]
    fn test_expansion_copies_solved_records() {
        // {∃s.B} ⊑ X is solved on insertion; once X gains ∃r.A the
        // expanded copy {∃s.B} ⊑ ∃r.A hits the conflict rule
        let mut manager = AtomManager::new();
        let x = manager.variable("X");
        let a = manager.constant("A");
        let b = manager.constant("B");
        let c = manager.constant("C");
        let ra = manager.existential("r", a);
        let sb = manager.existential("s", b);
        let mut goal = Goal::new(manager);
        goal.add_subsumption(vec![sb], x);
        goal.add_subsumption(vec![c, x], ra);

        let mut session = UnificationSession::new(goal).unwrap();
        assert_eq!(session.advance(), Ok(false));
        assert!(session.stats().dead_ends > 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// While descending, subsumer sets only grow and records are
        /// only added or solved; a rollback only removes what its own
        /// changeset added.
        #[test]
        fn prop_forward_steps_grow_and_rollbacks_shrink(shape in goal_shape()) {
            let mut session = UnificationSession::new(make_goal(&shape)).unwrap();
            session.started = true;
            if !session.initial_closure() {
                return Ok(());
            }
            for _ in 0..200 {
                let Some(trigger) = session.normalized.first_unsolved() else {
                    break;
                };
                let before = session.snapshot();
                if session.apply_next_choice(trigger, None) {
                    let after = session.snapshot();
                    prop_assert!(after.1.contains_all(&before.1));
                    for (sub, solved) in &before.0 {
                        let kept = after.0.iter().find(|(other, _)| other == sub);
                        prop_assert!(kept.is_some());
                        prop_assert!(!*solved || kept.is_some_and(|(_, s)| *s));
                    }
                } else {
                    let Some(changeset) = session.search_stack.pop() else {
                        break;
                    };
                    session.rollback(&changeset);
                    let after = session.snapshot();
                    prop_assert!(before.1.contains_all(&after.1));
                    for (sub, _) in &after.0 {
                        prop_assert!(before.0.iter().any(|(other, _)| other == sub));
                    }
                    // resume with the next alternative like backtrack would
                    if let (Some(t), Some(app)) = (changeset.trigger, changeset.application) {
                        session.apply_next_choice(t, Some(app));
                    }
                }
            }
        }
    }
}
