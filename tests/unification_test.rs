//! End-to-end tests of the unification session.

use elunify::{AtomManager, Error, Goal, UnificationSession};

/// X ⊑ A ⊓ ∃r.X is unifiable even though X occurs under the
/// existential: the eager extension rule simply collects both
/// subsumers.
#[test]
fn test_self_referential_goal_has_unifier() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let rx = manager.existential("r", x);
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);
    goal.add_subsumption(vec![x], rx);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    let unifier = session.unifier();
    let def = unifier.definition(x).unwrap();
    assert!(def.subsumers.contains(&a));
    assert!(def.subsumers.contains(&rx));

    // no nondeterministic choice was made, so there is one unifier
    assert_eq!(session.advance(), Ok(false));
    assert_eq!(session.stats().dead_ends, 0);
}

/// Extending X with ∃r.A expands the solved record {∃s.B} ⊑ X into
/// {∃s.B} ⊑ ∃r.A, which the conflict rule fails: the only branch is a
/// dead end and the goal has no unifier.
#[test]
fn test_role_conflict_after_extension() {
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
    assert_eq!(session.advance(), Ok(false));
}

/// A goal without constraints has exactly one unifier, mapping every
/// variable to ⊤.
#[test]
fn test_goal_without_constraints() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let y = manager.variable("Y");
    let goal = Goal::new(manager);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    let unifier = session.unifier();
    assert_eq!(unifier.definitions().len(), 2);
    assert!(unifier.definition(x).unwrap().is_top());
    assert!(unifier.definition(y).unwrap().is_top());
    assert_eq!(session.advance(), Ok(false));
    assert_eq!(session.advance(), Ok(false));
}

/// {∃r.B, X} ⊑ ∃r.A: decomposition is tried first and dead-ends on
/// {B} ⊑ A; backtracking then extends X with ∃r.A.
#[test]
fn test_decomposition_dead_end_then_extension() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let b = manager.constant("B");
    let ra = manager.existential("r", a);
    let rb = manager.existential("r", b);
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![rb, x], ra);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    let unifier = session.unifier();
    assert!(unifier.definition(x).unwrap().subsumers.contains(&ra));
    let stats = session.stats();
    assert!(stats.dead_ends >= 1);
    assert_eq!(stats.tree_size, 2);
    assert_eq!(session.advance(), Ok(false));
}

/// {∃r.A, ∃r.B} ⊑ ∃r.X offers two decomposition alternatives. Both
/// lead to X = ⊤, but each combination of choices is visited exactly
/// once.
#[test]
fn test_enumeration_visits_each_choice_once() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let b = manager.constant("B");
    let ra = manager.existential("r", a);
    let rb = manager.existential("r", b);
    let rx = manager.existential("r", x);
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![ra, rb], rx);

    let mut session = UnificationSession::new(goal).unwrap();
    let mut count = 0;
    while session.advance() == Ok(true) {
        assert!(session.unifier().definition(x).unwrap().is_top());
        count += 1;
    }
    assert_eq!(count, 2);
    assert_eq!(session.stats().tree_size, 3);
    assert_eq!(session.advance(), Ok(false));
}

#[test]
fn test_ground_goals() {
    let mut manager = AtomManager::new();
    let a = manager.constant("A");
    let b = manager.constant("B");
    let mut goal = Goal::new(manager.clone());
    goal.add_subsumption(vec![a, b], a);
    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    assert_eq!(session.advance(), Ok(false));

    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![b], a);
    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(false));
    assert_eq!(session.stats().dead_ends, 0);
}

#[test]
fn test_negative_constraints_are_rejected() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);
    goal.add_dissubsumption(vec![a], x);

    assert_eq!(
        UnificationSession::new(goal).err(),
        Some(Error::NegativeConstraints)
    );
}

#[test]
fn test_cancellation_poisons_the_session() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);

    let mut session = UnificationSession::new(goal).unwrap();
    session
        .cancel_flag()
        .store(true, std::sync::atomic::Ordering::Relaxed);
    assert_eq!(session.advance(), Err(Error::Interrupted));
    // the session stays poisoned even if the flag is cleared
    session
        .cancel_flag()
        .store(false, std::sync::atomic::Ordering::Relaxed);
    assert_eq!(session.advance(), Err(Error::Interrupted));
}

#[test]
fn test_diagnostics_labels() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    let info = session.info();
    let get = |label: &str| {
        info.iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.clone())
            .unwrap()
    };
    assert_eq!(get("Name"), "Rule-based algorithm");
    assert_eq!(get("Initial number of subsumptions"), "1");
    assert_eq!(get("Size of the search tree (so far)"), "1");
    assert_eq!(get("Number of encountered dead ends (so far)"), "0");
    assert_eq!(get("Number of variables"), "1");
}

#[test]
fn test_unifier_and_stats_serialize() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));

    let unifier = session.unifier();
    let json = serde_json::to_string(&unifier).unwrap();
    let back: elunify::Unifier = serde_json::from_str(&json).unwrap();
    assert_eq!(unifier, back);

    let stats = serde_json::to_value(session.stats()).unwrap();
    assert_eq!(stats["initial_size"], 1);
    assert_eq!(stats["variable_count"], 1);
}

#[test]
fn test_rendering() {
    let mut manager = AtomManager::new();
    let x = manager.variable("X");
    let a = manager.constant("A");
    let rx = manager.existential("r", x);
    let mut goal = Goal::new(manager);
    goal.add_subsumption(vec![x], a);
    goal.add_subsumption(vec![x], rx);

    let mut session = UnificationSession::new(goal).unwrap();
    assert_eq!(session.advance(), Ok(true));
    let rendered = session.unifier().render(session.goal().manager());
    assert_eq!(rendered, "X = A ⊓ ∃r.X\n");
}
