use bevy_ecs::prelude::Entity;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Enter,
    Exit,
    Press,
    Release,
}

impl fmt::Display for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointerEvent::Enter => "enter",
            PointerEvent::Exit => "exit",
            PointerEvent::Press => "press",
            PointerEvent::Release => "release",
        };
        f.write_str(name)
    }
}

/// Node ids are only unique within one widget tree, so listeners are keyed by the
/// scope that registered them as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ListenerKey {
    owner: u64,
    node: Entity,
}

#[derive(Default)]
struct DispatchState {
    queue: VecDeque<(ListenerKey, PointerEvent)>,
    listeners: HashMap<ListenerKey, u64>,
    next_id: u64,
    next_owner: u64,
}

/// Shared input dispatch context. Each consumer opens its own `InputScope`; events are
/// delivered only to the scope they were sent through, and only for nodes with a live
/// `ListenerRegistration`.
#[derive(Clone, Default)]
pub struct InputDispatch(Rc<RefCell<DispatchState>>);

impl InputDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new scope with a context-unique owner id.
    pub fn scope(&self) -> InputScope {
        let mut state = self.0.borrow_mut();
        state.next_owner += 1;
        InputScope { dispatch: self.clone(), owner: state.next_owner }
    }

    /// Live registrations across every scope.
    pub fn listener_count(&self) -> usize {
        self.0.borrow().listeners.len()
    }

    /// Events queued across every scope.
    pub fn pending(&self) -> usize {
        self.0.borrow().queue.len()
    }

    /// Identity check used to make sure an environment never holds two contexts.
    pub fn same_context(&self, other: &InputDispatch) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// One consumer's view of the shared dispatch context.
#[derive(Clone)]
pub struct InputScope {
    dispatch: InputDispatch,
    owner: u64,
}

impl InputScope {
    pub fn owner(&self) -> u64 {
        self.owner
    }

    pub fn context(&self) -> &InputDispatch {
        &self.dispatch
    }

    /// Starts listening for events on `node`. Dropping the returned guard stops it.
    pub fn register(&self, node: Entity) -> ListenerRegistration {
        let key = ListenerKey { owner: self.owner, node };
        let mut state = self.dispatch.0.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        if state.listeners.insert(key, id).is_some() {
            log::warn!(
                "[dispatch] node {} registered twice in scope {}; previous listener replaced",
                node.index(),
                self.owner
            );
        }
        ListenerRegistration { key, id, state: Rc::downgrade(&self.dispatch.0) }
    }

    pub fn is_registered(&self, node: Entity) -> bool {
        let key = ListenerKey { owner: self.owner, node };
        self.dispatch.0.borrow().listeners.contains_key(&key)
    }

    pub fn send(&self, node: Entity, event: PointerEvent) {
        let key = ListenerKey { owner: self.owner, node };
        self.dispatch.0.borrow_mut().queue.push_back((key, event));
    }

    /// Takes this scope's queued events. Events for nodes nobody listens to are dropped
    /// on the way; other scopes' events stay queued.
    pub fn drain(&self) -> Vec<(Entity, PointerEvent)> {
        let owner = self.owner;
        let mut state = self.dispatch.0.borrow_mut();
        let DispatchState { queue, listeners, .. } = &mut *state;
        let mut delivered = Vec::new();
        queue.retain(|(key, event)| {
            if !listeners.contains_key(key) {
                log::debug!(
                    "[dispatch] dropped {event} for unregistered node {} (scope {})",
                    key.node.index(),
                    key.owner
                );
                return false;
            }
            if key.owner != owner {
                return true;
            }
            delivered.push((key.node, *event));
            false
        });
        delivered
    }
}

impl fmt::Debug for InputScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputScope").field("owner", &self.owner).finish()
    }
}

/// Scoped listener registration; deregisters on drop.
pub struct ListenerRegistration {
    key: ListenerKey,
    id: u64,
    state: Weak<RefCell<DispatchState>>,
}

impl ListenerRegistration {
    pub fn node(&self) -> Entity {
        self.key.node
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        if state.listeners.get(&self.key) == Some(&self.id) {
            state.listeners.remove(&self.key);
        }
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("owner", &self.key.owner)
            .field("node", &self.key.node.index())
            .field("id", &self.id)
            .finish()
    }
}
