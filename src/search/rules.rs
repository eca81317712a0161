//! The rule set of the unification calculus.
//!
//! Every rule takes an unsolved record and either solves it, fails it,
//! or transforms the state. Eager rules are forced: whenever one
//! applies it is the only option. Nondeterministic rules offer
//! alternatives that the search explores via backtracking.
//!
//! Rules never mutate the session. They inspect a record against the
//! current assignment and return a [`Changeset`] describing what a
//! commit should do; all mutation happens in the session when the
//! changeset is committed.

use crate::el::{AtomManager, RoleId};
use crate::goal::Subsumption;
use crate::search::assignment::Assignment;
use crate::search::changeset::Changeset;
use crate::search::normalized::SubsumptionId;

/// The closed set of rule kinds, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
    /// The record is ground: solved if the head occurs in the body,
    /// otherwise unsatisfiable.
    GroundSolving,
    /// The head occurs syntactically in the body.
    Solving1,
    /// The head is ∃r.B but the body has neither a variable nor an
    /// existential over r, so no extension can ever satisfy it.
    Conflict,
    /// Some body variable already has the head among its subsumers.
    Solving2,
    /// The body is a single variable; the head must become one of its
    /// subsumers.
    EagerExtension,
    /// The head is ∃r.B; pick a body atom ∃r.A and require A ⊑ B.
    Decomposition,
    /// Pick a body variable and add the head to its subsumers.
    Extension,
}

/// Static eager rules: depend only on the record itself.
pub(crate) const STATIC_EAGER: [Rule; 3] = [Rule::GroundSolving, Rule::Solving1, Rule::Conflict];

/// Dynamic eager rules: also consult the assignment.
pub(crate) const DYNAMIC_EAGER: [Rule; 2] = [Rule::Solving2, Rule::EagerExtension];

/// Nondeterministic rules, tried in this order.
pub(crate) const NONDETERMINISTIC: [Rule; 2] = [Rule::Decomposition, Rule::Extension];

/// Resumption cursor: one concrete way of applying a rule to a record.
///
/// For nondeterministic rules the cursor carries the body position of
/// the chosen atom, so backtracking can resume with the next
/// alternative of the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Application {
    Eager(Rule),
    Decomposition { body_index: usize },
    Extension { body_index: usize },
}

impl Application {
    pub fn rule(&self) -> Rule {
        match self {
            Application::Eager(rule) => *rule,
            Application::Decomposition { .. } => Rule::Decomposition,
            Application::Extension { .. } => Rule::Extension,
        }
    }
}

impl Rule {
    /// The first way this rule applies to `sub`, if any.
    pub fn first_application(
        self,
        sub: &Subsumption,
        assignment: &Assignment,
        manager: &AtomManager,
    ) -> Option<Application> {
        match self {
            Rule::GroundSolving => {
                let ground = manager.is_ground(sub.head())
                    && sub.body().iter().all(|&atom| manager.is_ground(atom));
                ground.then_some(Application::Eager(self))
            }
            Rule::Solving1 => sub.is_trivial().then_some(Application::Eager(self)),
            Rule::Conflict => {
                let role = manager.atom(sub.head()).role()?;
                let blocked = sub.body().iter().any(|&atom| {
                    manager.is_variable(atom) || manager.atom(atom).role() == Some(role)
                });
                (!blocked).then_some(Application::Eager(self))
            }
            Rule::Solving2 => {
                let satisfied = sub
                    .body()
                    .iter()
                    .any(|&atom| manager.is_variable(atom) && assignment.contains(atom, sub.head()));
                satisfied.then_some(Application::Eager(self))
            }
            Rule::EagerExtension => match sub.body() {
                [single] if manager.is_variable(*single) => Some(Application::Eager(self)),
                _ => None,
            },
            Rule::Decomposition => {
                let role = manager.atom(sub.head()).role()?;
                self.next_decomposition(sub, manager, role, 0)
            }
            Rule::Extension => self.next_extension(sub, manager, 0),
        }
    }

    /// The next alternative after `previous`, if any. Eager rules have
    /// a single alternative.
    pub fn next_application(
        self,
        sub: &Subsumption,
        manager: &AtomManager,
        previous: Application,
    ) -> Option<Application> {
        match (self, previous) {
            (Rule::Decomposition, Application::Decomposition { body_index }) => {
                let role = manager.atom(sub.head()).role()?;
                self.next_decomposition(sub, manager, role, body_index + 1)
            }
            (Rule::Extension, Application::Extension { body_index }) => {
                self.next_extension(sub, manager, body_index + 1)
            }
            _ => None,
        }
    }

    fn next_decomposition(
        self,
        sub: &Subsumption,
        manager: &AtomManager,
        role: RoleId,
        from: usize,
    ) -> Option<Application> {
        sub.body()[from..]
            .iter()
            .position(|&atom| manager.atom(atom).role() == Some(role))
            .map(|offset| Application::Decomposition {
                body_index: from + offset,
            })
    }

    fn next_extension(
        self,
        sub: &Subsumption,
        manager: &AtomManager,
        from: usize,
    ) -> Option<Application> {
        sub.body()[from..]
            .iter()
            .position(|&atom| manager.is_variable(atom))
            .map(|offset| Application::Extension {
                body_index: from + offset,
            })
    }

    /// Applies one concrete alternative, producing the changeset a
    /// commit should realize.
    pub fn apply(
        self,
        trigger: SubsumptionId,
        sub: &Subsumption,
        application: Application,
        manager: &AtomManager,
    ) -> Changeset {
        match self {
            Rule::GroundSolving => {
                if sub.is_trivial() {
                    Changeset::success(trigger, application)
                } else {
                    Changeset::failure(trigger, application)
                }
            }
            Rule::Solving1 | Rule::Solving2 => Changeset::success(trigger, application),
            Rule::Conflict => Changeset::failure(trigger, application),
            Rule::EagerExtension => {
                let mut changeset = Changeset::success(trigger, application);
                changeset.new_subsumers.add(sub.body()[0], sub.head());
                changeset
            }
            Rule::Decomposition => {
                let Application::Decomposition { body_index } = application else {
                    return Changeset::failure(trigger, application);
                };
                let mut changeset = Changeset::success(trigger, application);
                let atom = manager.atom(sub.body()[body_index]);
                let head = manager.atom(sub.head());
                match (atom.filler(), head.filler()) {
                    (Some(body_filler), Some(head_filler)) => {
                        changeset
                            .created
                            .push(Subsumption::new(vec![body_filler], head_filler));
                        changeset
                    }
                    _ => Changeset::failure(trigger, application),
                }
            }
            Rule::Extension => {
                let Application::Extension { body_index } = application else {
                    return Changeset::failure(trigger, application);
                };
                let mut changeset = Changeset::success(trigger, application);
                changeset
                    .new_subsumers
                    .add(sub.body()[body_index], sub.head());
                changeset
            }
        }
    }
}
