//! Dependency graph arena and topological resolution.
//!
//! Nodes are dense indices into parallel tables; edges point from an
//! observable to the models that depend on it. Traversal never chases
//! live object pointers, so cycle detection stays a plain color sweep.

use tracing::error;

use crate::error::{StateError, StateResult};
use crate::observe::StateId;

/// What a node in the arena is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// A typed container.
    State,
    /// A derived model; the only legal dependency target.
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    kinds: Vec<NodeKind>,
    names: Vec<String>,
    dependents: Vec<Vec<StateId>>,
}

impl DependencyGraph {
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn add_node(&mut self, kind: NodeKind, name: &str) -> StateId {
        let id = StateId(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.names.push(name.to_owned());
        self.dependents.push(Vec::new());
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.kinds.len()
    }

    pub(crate) fn kind(&self, id: StateId) -> NodeKind {
        self.kinds[id.index()]
    }

    pub(crate) fn name(&self, id: StateId) -> &str {
        &self.names[id.index()]
    }

    pub(crate) fn add_dependency(&mut self, source: StateId, dependent: StateId) {
        let edges = &mut self.dependents[source.index()];
        if !edges.contains(&dependent) {
            edges.push(dependent);
        }
    }

    pub(crate) fn remove_dependency(&mut self, source: StateId, dependent: StateId) -> bool {
        let edges = &mut self.dependents[source.index()];
        match edges.iter().position(|&d| d == dependent) {
            Some(pos) => {
                edges.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_dependents(&self, id: StateId) -> bool {
        !self.dependents[id.index()].is_empty()
    }

    /// Dependency-ordered update list rooted at `roots`.
    ///
    /// Includes the roots themselves. Every node appears before
    /// anything that depends on it when the list is consumed front to
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DependencyCycle`] when the traversal
    /// re-enters a node on the current path; no partial order is ever
    /// produced.
    pub(crate) fn models_to_update(&self, roots: &[StateId]) -> StateResult<Vec<StateId>> {
        let mut colors = vec![Color::White; self.kinds.len()];
        let mut out = Vec::new();
        for &root in roots {
            self.visit(root, &mut colors, &mut out)?;
        }
        out.reverse();
        Ok(out)
    }

    fn visit(
        &self,
        id: StateId,
        colors: &mut [Color],
        out: &mut Vec<StateId>,
    ) -> StateResult<()> {
        match colors[id.index()] {
            Color::Grey => {
                let node = self.names[id.index()].clone();
                error!(%node, "dependency cycle detected");
                Err(StateError::DependencyCycle { node })
            }
            Color::Black => Ok(()),
            Color::White => {
                colors[id.index()] = Color::Grey;
                for &dependent in &self.dependents[id.index()] {
                    self.visit(dependent, colors, out)?;
                }
                colors[id.index()] = Color::Black;
                out.push(id);
                Ok(())
            }
        }
    }

    /// Full-arena acyclicity sweep.
    pub(crate) fn check_acyclic(&self) -> StateResult<()> {
        #[allow(clippy::cast_possible_truncation)]
        let all: Vec<StateId> = (0..self.kinds.len() as u32).map(StateId).collect();
        self.models_to_update(&all).map(|_| ())
    }
}
