use crate::controls::ControlState;
use bevy_ecs::prelude::Entity;
use std::fmt;

/// Observable things that happened on the panel, drained by the host once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Shown { title: String },
    Hidden,
    ButtonActivated { node: Entity, label: String },
    ControlStateChanged { node: Entity, label: String, state: ControlState },
    ServerUrlCommitted { url: String },
    ServerUrlRejected { reason: String },
}

impl fmt::Display for PanelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelEvent::Shown { title } => write!(f, "Shown title={title:?}"),
            PanelEvent::Hidden => f.write_str("Hidden"),
            PanelEvent::ButtonActivated { node, label } => {
                write!(f, "ButtonActivated node={} label={}", node.index(), label)
            }
            PanelEvent::ControlStateChanged { node, label, state } => {
                write!(f, "ControlStateChanged node={} label={} state={:?}", node.index(), label, state)
            }
            PanelEvent::ServerUrlCommitted { url } => write!(f, "ServerUrlCommitted url={url}"),
            PanelEvent::ServerUrlRejected { reason } => write!(f, "ServerUrlRejected reason={reason}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<PanelEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: PanelEvent) {
        log::debug!("[panel] event {event}");
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<PanelEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
