//! Unifiers extracted from a successful search.

use serde::{Deserialize, Serialize};

use crate::el::{AtomId, AtomManager};

/// The definition of one variable: `variable = ⊓ subsumers`.
///
/// An empty subsumer list means the variable is mapped to ⊤.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub variable: AtomId,
    pub subsumers: Vec<AtomId>,
}

impl Definition {
    pub fn is_top(&self) -> bool {
        self.subsumers.is_empty()
    }
}

/// A substitution mapping every registered variable to a conjunction
/// of non-variable atoms, in variable registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unifier {
    definitions: Vec<Definition>,
}

impl Unifier {
    pub(crate) fn new(definitions: Vec<Definition>) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    pub fn definition(&self, variable: AtomId) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.variable == variable)
    }

    /// Renders the substitution, one definition per line.
    pub fn render(&self, manager: &AtomManager) -> String {
        let mut out = String::new();
        for def in &self.definitions {
            out.push_str(&manager.render_atom(def.variable));
            out.push_str(" = ");
            if def.is_top() {
                out.push('⊤');
            } else {
                let rendered: Vec<_> = def
                    .subsumers
                    .iter()
                    .map(|&id| manager.render_atom(id))
                    .collect();
                out.push_str(&rendered.join(" ⊓ "));
            }
            out.push('\n');
        }
        out
    }
}
