//! Atom interning and identity management.
//!
//! All atoms of a unification problem live in a single [`AtomManager`].
//! Interning gives every atom a stable [`AtomId`], so the solver can
//! compare atoms, key maps, and order record bodies by id instead of
//! hashing structural data. Equal atoms always receive the same id.

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexSet;

use super::atom::{Atom, AtomId, NameId, RoleId};

/// Arena for interned strings with id-based lookup.
#[derive(Debug, Default, Clone)]
struct StringArena {
    strings: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl StringArena {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), id);
        id
    }

    fn get(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }
}

/// Interner for the atoms of one unification problem.
///
/// Distinguishes constants from variables at interning time: which
/// concept names are variables is part of the problem statement, not
/// of the syntax. Existential restrictions may only be built over
/// concept-name atoms; this keeps the atom universe flat.
#[derive(Debug, Default, Clone)]
pub struct AtomManager {
    concept_names: StringArena,
    role_names: StringArena,
    atoms: Vec<Atom>,
    lookup: HashMap<Atom, AtomId>,
    variables: IndexSet<AtomId>,
}

impl AtomManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, atom: Atom) -> AtomId {
        if let Some(&id) = self.lookup.get(&atom) {
            return id;
        }
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(atom);
        self.lookup.insert(atom, id);
        id
    }

    /// Interns a concept constant.
    pub fn constant(&mut self, name: &str) -> AtomId {
        let name = NameId(self.concept_names.intern(name));
        self.intern(Atom::Constant(name))
    }

    /// Interns a concept variable and registers it for substitution.
    pub fn variable(&mut self, name: &str) -> AtomId {
        let name = NameId(self.concept_names.intern(name));
        let id = self.intern(Atom::Variable(name));
        self.variables.insert(id);
        id
    }

    /// Interns an existential restriction ∃role.filler.
    ///
    /// The filler must be a concept-name atom.
    pub fn existential(&mut self, role: &str, filler: AtomId) -> AtomId {
        debug_assert!(
            !self.atom(filler).is_existential(),
            "existential filler must be a concept name"
        );
        let role = RoleId(self.role_names.intern(role));
        self.intern(Atom::Existential(role, filler))
    }

    pub fn atom(&self, id: AtomId) -> &Atom {
        &self.atoms[id.0 as usize]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_variable(&self, id: AtomId) -> bool {
        self.atom(id).is_variable()
    }

    /// Whether the atom contains no variable, looking through fillers.
    pub fn is_ground(&self, id: AtomId) -> bool {
        match self.atom(id) {
            Atom::Constant(_) => true,
            Atom::Variable(_) => false,
            Atom::Existential(_, filler) => self.is_ground(*filler),
        }
    }

    /// The registered variables, in registration order.
    pub fn variables(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.variables.iter().copied()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn concept_name(&self, id: NameId) -> &str {
        self.concept_names.get(id.0)
    }

    pub fn role_name(&self, id: RoleId) -> &str {
        self.role_names.get(id.0)
    }

    /// Renders an atom for diagnostics and unifier output.
    pub fn render_atom(&self, id: AtomId) -> String {
        let mut out = String::new();
        self.write_atom(&mut out, id);
        out
    }

    fn write_atom(&self, out: &mut String, id: AtomId) {
        match self.atom(id) {
            Atom::Constant(name) | Atom::Variable(name) => {
                out.push_str(self.concept_name(*name));
            }
            Atom::Existential(role, filler) => {
                let _ = write!(out, "∃{}.", self.role_name(*role));
                self.write_atom(out, *filler);
            }
        }
    }
}
