use crate::placement::PanelPose;
use crate::widget::{Bounds, Label, SizeSpec, WidgetKind};
use bevy_ecs::prelude::{Entity, Resource};
use glam::Vec4;
use std::fmt;

/// Geometry and style instructions handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Spawn { node: Entity, kind: WidgetKind, parent: Option<Entity> },
    SetBounds { node: Entity, bounds: Bounds },
    SetSize { node: Entity, size: SizeSpec },
    SetStackSpacing { node: Entity, spacing: f32 },
    SetScale { node: Entity, scale: f32 },
    SetPose { node: Entity, pose: PanelPose },
    SetFill { node: Entity, color: Vec4 },
    SetLabel { node: Entity, label: Label },
    SetVisible { node: Entity, visible: bool },
}

impl SurfaceCommand {
    pub fn node(&self) -> Entity {
        match self {
            SurfaceCommand::Spawn { node, .. }
            | SurfaceCommand::SetBounds { node, .. }
            | SurfaceCommand::SetSize { node, .. }
            | SurfaceCommand::SetStackSpacing { node, .. }
            | SurfaceCommand::SetScale { node, .. }
            | SurfaceCommand::SetPose { node, .. }
            | SurfaceCommand::SetFill { node, .. }
            | SurfaceCommand::SetLabel { node, .. }
            | SurfaceCommand::SetVisible { node, .. } => *node,
        }
    }

    /// Layout-affecting commands, as opposed to purely visual ones.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            SurfaceCommand::SetBounds { .. }
                | SurfaceCommand::SetSize { .. }
                | SurfaceCommand::SetStackSpacing { .. }
                | SurfaceCommand::SetScale { .. }
                | SurfaceCommand::SetPose { .. }
        )
    }
}

impl fmt::Display for SurfaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceCommand::Spawn { node, kind, parent } => match parent {
                Some(parent) => {
                    write!(f, "Spawn node={} kind={} parent={}", node.index(), kind.label(), parent.index())
                }
                None => write!(f, "Spawn node={} kind={}", node.index(), kind.label()),
            },
            SurfaceCommand::SetBounds { node, bounds } => write!(
                f,
                "SetBounds node={} anchors=({:.2},{:.2})-({:.2},{:.2}) offsets=({:.1},{:.1})-({:.1},{:.1})",
                node.index(),
                bounds.anchor_min.x,
                bounds.anchor_min.y,
                bounds.anchor_max.x,
                bounds.anchor_max.y,
                bounds.offset_min.x,
                bounds.offset_min.y,
                bounds.offset_max.x,
                bounds.offset_max.y
            ),
            SurfaceCommand::SetSize { node, size } => {
                write!(f, "SetSize node={} size={:.1}x{:.1}", node.index(), size.width, size.height)
            }
            SurfaceCommand::SetStackSpacing { node, spacing } => {
                write!(f, "SetStackSpacing node={} spacing={spacing:.1}", node.index())
            }
            SurfaceCommand::SetScale { node, scale } => {
                write!(f, "SetScale node={} scale={scale}", node.index())
            }
            SurfaceCommand::SetPose { node, pose } => {
                let p = pose.position;
                write!(f, "SetPose node={} position=({:.3}, {:.3}, {:.3})", node.index(), p.x, p.y, p.z)
            }
            SurfaceCommand::SetFill { node, color } => write!(
                f,
                "SetFill node={} rgba=({:.2}, {:.2}, {:.2}, {:.2})",
                node.index(),
                color.x,
                color.y,
                color.z,
                color.w
            ),
            SurfaceCommand::SetLabel { node, label } => {
                write!(f, "SetLabel node={} text={:?} size={}", node.index(), label.text, label.font_size)
            }
            SurfaceCommand::SetVisible { node, visible } => {
                write!(f, "SetVisible node={} visible={visible}", node.index())
            }
        }
    }
}

/// Opaque renderer the panel emits its instructions to.
pub trait RenderSurface {
    fn submit(&mut self, command: SurfaceCommand);
}

/// Commands produced by tree mutations, waiting for the next flush.
///
/// Only the latest pending update of each kind is kept per node, so a host that flushes
/// rarely still receives a bounded batch. Spawns are never merged.
#[derive(Default, Resource)]
pub struct SurfaceQueue {
    commands: Vec<SurfaceCommand>,
    total: u64,
}

impl SurfaceQueue {
    pub fn push(&mut self, command: SurfaceCommand) {
        self.total += 1;
        if !matches!(command, SurfaceCommand::Spawn { .. }) {
            let kind = std::mem::discriminant(&command);
            let node = command.node();
            let pending = self
                .commands
                .iter_mut()
                .find(|queued| queued.node() == node && std::mem::discriminant(*queued) == kind);
            if let Some(queued) = pending {
                *queued = command;
                return;
            }
        }
        self.commands.push(command);
    }

    pub fn drain(&mut self) -> Vec<SurfaceCommand> {
        self.commands.drain(..).collect()
    }

    pub fn pending(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    /// Number of commands ever queued; used as the tree's mutation counter.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Keeps every command it receives. Useful for tests and headless tooling.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands_for(&self, node: Entity) -> impl Iterator<Item = &SurfaceCommand> {
        self.commands.iter().filter(move |command| command.node() == node)
    }
}

impl RenderSurface for RecordingSurface {
    fn submit(&mut self, command: SurfaceCommand) {
        self.commands.push(command);
    }
}

/// Writes each command to the debug log.
#[derive(Debug, Default)]
pub struct LogSurface {
    submitted: usize,
}

impl LogSurface {
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl RenderSurface for LogSurface {
    fn submit(&mut self, command: SurfaceCommand) {
        self.submitted += 1;
        log::debug!("[surface] {command}");
    }
}
