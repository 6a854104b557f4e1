//! Central observable registry and notification engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::change::{Cause, Change, ChangeReporter, ChangeStack};
use crate::error::{StateError, StateResult};
use crate::observe::graph::{DependencyGraph, NodeKind};
use crate::observe::{Model, Observer, StateId, Trigger};

/// Source of an observable's current text, stored type-erased in the
/// arena.
pub(crate) trait TextSource: 'static {
    fn text(&self) -> String;
}

struct ModelText<M: Model>(Rc<RefCell<M>>);

impl<M: Model> TextSource for ModelText<M> {
    fn text(&self) -> String {
        self.0.borrow().text()
    }
}

/// Handle for removing a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverHandle(u64);

/// Handle for removing a registered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerHandle(u64);

struct Node {
    source: Box<dyn TextSource>,
    observers: Vec<(ObserverHandle, Box<dyn Observer>)>,
    triggers: Vec<(TriggerHandle, Box<dyn Trigger>)>,
}

/// The observable arena, dependency graph, and change stack of one
/// session.
///
/// Containers register here at construction; models and external
/// sinks register explicitly. Closing, undoing, or redoing a
/// transaction delivers at most one text update per distinct touched
/// observable, in dependency order for derived models.
pub struct StateManager {
    graph: DependencyGraph,
    nodes: Vec<Node>,
    stack: ChangeStack,
    next_handle: u64,
}

impl StateManager {
    pub(crate) fn new() -> Self {
        Self {
            graph: DependencyGraph::default(),
            nodes: Vec::new(),
            stack: ChangeStack::new(),
            next_handle: 0,
        }
    }

    /// Number of registered observables.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    /// Read access to the change stack.
    #[must_use]
    pub fn stack(&self) -> &ChangeStack {
        &self.stack
    }

    /// Attach the external change reporter.
    pub fn set_reporter(&mut self, reporter: Box<dyn ChangeReporter>) {
        self.stack.set_reporter(reporter);
    }

    pub(crate) fn register_source(
        &mut self,
        kind: NodeKind,
        name: &str,
        source: Box<dyn TextSource>,
    ) -> StateId {
        let id = self.graph.add_node(kind, name);
        self.nodes.push(Node {
            source,
            observers: Vec::new(),
            triggers: Vec::new(),
        });
        trace!(id = id.raw(), name, "registered observable");
        id
    }

    /// Register a derived model under a diagnostic name.
    ///
    /// The manager shares ownership of the model; dependencies are
    /// declared separately with [`Self::add_dependency`].
    pub fn register_model<M: Model>(&mut self, name: &str, model: &Rc<RefCell<M>>) -> StateId {
        self.register_source(NodeKind::Model, name, Box::new(ModelText(Rc::clone(model))))
    }

    fn check_id(&self, id: StateId) -> StateResult<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(StateError::UnknownState(id.raw()))
        }
    }

    /// Diagnostic name of an observable.
    pub fn name_of(&self, id: StateId) -> StateResult<&str> {
        self.check_id(id)?;
        Ok(self.graph.name(id))
    }

    /// Current rendered text of an observable.
    pub fn text_of(&self, id: StateId) -> StateResult<String> {
        self.check_id(id)?;
        Ok(self.nodes[id.index()].source.text())
    }

    /// Register an observer on `id`.
    pub fn add_observer<O: Observer>(
        &mut self,
        id: StateId,
        observer: O,
    ) -> StateResult<ObserverHandle> {
        self.check_id(id)?;
        let handle = ObserverHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes[id.index()].observers.push((handle, Box::new(observer)));
        Ok(handle)
    }

    /// Remove a previously registered observer. Returns whether it was
    /// still registered.
    pub fn remove_observer(&mut self, id: StateId, handle: ObserverHandle) -> StateResult<bool> {
        self.check_id(id)?;
        let observers = &mut self.nodes[id.index()].observers;
        match observers.iter().position(|(h, _)| *h == handle) {
            Some(pos) => {
                observers.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Register a trigger on `id`.
    pub fn add_trigger<T: Trigger>(
        &mut self,
        id: StateId,
        trigger: T,
    ) -> StateResult<TriggerHandle> {
        self.check_id(id)?;
        let handle = TriggerHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes[id.index()].triggers.push((handle, Box::new(trigger)));
        Ok(handle)
    }

    /// Remove a previously registered trigger. Returns whether it was
    /// still registered.
    pub fn remove_trigger(&mut self, id: StateId, handle: TriggerHandle) -> StateResult<bool> {
        self.check_id(id)?;
        let triggers = &mut self.nodes[id.index()].triggers;
        match triggers.iter().position(|(h, _)| *h == handle) {
            Some(pos) => {
                triggers.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Declare that `dependent` (a model) depends on `source`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DependentNotAModel`] when `dependent` is
    /// a plain container rather than a model.
    pub fn add_dependency(&mut self, source: StateId, dependent: StateId) -> StateResult<()> {
        self.check_id(source)?;
        self.check_id(dependent)?;
        if self.graph.kind(dependent) != NodeKind::Model {
            return Err(StateError::DependentNotAModel(
                self.graph.name(dependent).to_owned(),
            ));
        }
        self.graph.add_dependency(source, dependent);
        Ok(())
    }

    /// Remove a dependency edge. Returns whether it existed.
    pub fn remove_dependency(&mut self, source: StateId, dependent: StateId) -> StateResult<bool> {
        self.check_id(source)?;
        self.check_id(dependent)?;
        Ok(self.graph.remove_dependency(source, dependent))
    }

    /// Dependency-ordered update list rooted at `roots` (inclusive):
    /// every observable appears before anything that depends on it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DependencyCycle`] when the traversal
    /// reaches a cycle; no partial order is produced.
    pub fn models_to_update(&self, roots: &[StateId]) -> StateResult<Vec<StateId>> {
        for &root in roots {
            self.check_id(root)?;
        }
        self.graph.models_to_update(roots)
    }

    /// Full-graph acyclicity sweep.
    pub fn verify_acyclic(&self) -> StateResult<()> {
        self.graph.check_acyclic()
    }

    /// Deliver `change` to triggers on `state`, then to triggers on
    /// its dependent models in dependency order.
    pub fn inform_triggers(&mut self, state: StateId, change: &dyn Change) -> StateResult<()> {
        self.check_id(state)?;
        {
            let node = &mut self.nodes[state.index()];
            for (_, trigger) in &mut node.triggers {
                trigger.triggered(change);
            }
        }
        if self.graph.has_dependents(state) {
            let order = self.graph.models_to_update(&[state])?;
            for id in order {
                if id == state {
                    continue;
                }
                for (_, trigger) in &mut self.nodes[id.index()].triggers {
                    trigger.triggered(change);
                }
            }
        }
        Ok(())
    }

    /// Deliver current text to the observers of each changed state,
    /// then to the observers of dependent models in dependency order.
    /// At most one delivery per distinct observable.
    pub fn update_observers(&mut self, changed: &[StateId]) -> StateResult<()> {
        let mut direct: Vec<StateId> = Vec::new();
        for &id in changed {
            self.check_id(id)?;
            if !direct.contains(&id) {
                direct.push(id);
            }
        }
        for &id in &direct {
            self.deliver(id);
        }
        let order = self.graph.models_to_update(&direct)?;
        for id in order {
            if direct.contains(&id) {
                continue;
            }
            self.deliver(id);
        }
        Ok(())
    }

    fn deliver(&mut self, id: StateId) {
        let node = &mut self.nodes[id.index()];
        if node.observers.is_empty() {
            return;
        }
        let text = node.source.text();
        for (_, observer) in &mut node.observers {
            observer.update(&text);
        }
    }

    /// Record an already-applied change into the open buffer and fire
    /// triggers.
    pub(crate) fn record(&mut self, change: Box<dyn Change>) -> StateResult<()> {
        self.inform_triggers(change.target(), change.as_ref())?;
        self.stack.push(change);
        Ok(())
    }

    /// Close the open transaction under `cause` and notify observers
    /// of every touched state.
    ///
    /// Returns `false` when the buffer was empty (no-op).
    pub fn close(&mut self, cause: impl Cause) -> StateResult<bool> {
        match self.stack.close(Box::new(cause)) {
            Some(touched) => {
                self.update_observers(&touched)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Undo the newest committed change set and notify observers.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NothingToUndo`] when only the initial
    /// placeholder set remains.
    pub fn undo(&mut self) -> StateResult<()> {
        let touched = self.stack.undo_step()?;
        self.stack.finish_undo_redo();
        self.update_observers(&touched)
    }

    /// Redo the newest undone change set and notify observers.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NothingToRedo`] when the redo stack is
    /// empty.
    pub fn redo(&mut self) -> StateResult<()> {
        let touched = self.stack.redo_step()?;
        self.stack.finish_undo_redo();
        self.update_observers(&touched)
    }

    /// Undo until the committed index equals `target`, with one
    /// consolidated notification pass at the end.
    pub fn undo_to(&mut self, target: usize) -> StateResult<()> {
        self.stack.check_undo_target(target)?;
        let mut touched = Vec::new();
        while self.stack.current_index() > target {
            touched.extend(self.stack.undo_step()?);
        }
        self.stack.finish_undo_redo();
        self.update_observers(&touched)
    }

    /// Redo until the committed index equals `target`, with one
    /// consolidated notification pass at the end.
    pub fn redo_to(&mut self, target: usize) -> StateResult<()> {
        self.stack.check_redo_target(target)?;
        let mut touched = Vec::new();
        while self.stack.current_index() < target {
            touched.extend(self.stack.redo_step()?);
        }
        self.stack.finish_undo_redo();
        self.update_observers(&touched)
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("states", &self.nodes.len())
            .field("stack", &self.stack)
            .finish()
    }
}
