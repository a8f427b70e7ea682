mod types;

pub use types::*;

use crate::config::PanelParams;
use crate::placement::PanelPose;
use crate::surface::{SurfaceCommand, SurfaceQueue};
use bevy_ecs::prelude::{Entity, World};
use glam::{Vec2, Vec4};

pub const PANEL_BACKGROUND: Vec4 = Vec4::new(0.15, 0.15, 0.15, 1.0);
pub const TITLE_BACKGROUND: Vec4 = Vec4::new(0.1, 0.1, 0.1, 1.0);
pub const TITLE_HEIGHT: f32 = 100.0;
pub const TITLE_FONT_SIZE: f32 = 48.0;
pub const CONTAINER_MARGIN: f32 = 40.0;
/// Top inset of the container, leaving room for the title band.
pub const CONTAINER_TOP_INSET: f32 = 120.0;

/// Widget hierarchy of one panel.
///
/// Nodes live in a private `World`; parents own the ordered `Children` list and children
/// keep a `Parent` back-reference. Every mutation queues a `SurfaceCommand`; the queue's
/// running total doubles as the mutation counter.
pub struct WidgetTree {
    world: World,
    root: Entity,
    title: Entity,
    container: Entity,
    buttons: Vec<Entity>,
}

impl WidgetTree {
    /// Builds panel root, title bar and the (empty) button container.
    pub fn build(params: &PanelParams, title: &str) -> Self {
        let mut world = World::new();
        world.insert_resource(SurfaceQueue::default());
        let root = Self::spawn_in(&mut world, WidgetKind::Panel, "Panel", None);
        let mut tree = Self { world, root, title: root, container: root, buttons: Vec::new() };

        tree.insert_size(root, SizeSpec::new(params.panel_width, params.panel_height));
        tree.insert_transform(root, PanelTransform { scale: params.panel_scale, pose: None });
        tree.insert_fill(root, PANEL_BACKGROUND);
        tree.world.entity_mut(root).insert(Visible(true));

        let title_bar = tree.spawn(WidgetKind::TitleBar, "Title", root);
        tree.insert_bounds(
            title_bar,
            Bounds::new(Vec2::new(0.0, 1.0), Vec2::ONE, Vec2::new(0.0, -TITLE_HEIGHT), Vec2::ZERO),
        );
        tree.insert_fill(title_bar, TITLE_BACKGROUND);
        tree.insert_label(title_bar, Label::new(title, TITLE_FONT_SIZE).bold());
        tree.title = title_bar;

        let container = tree.spawn(WidgetKind::ButtonContainer, "ButtonsContainer", root);
        tree.insert_bounds(
            container,
            Bounds::inset(
                Vec2::splat(CONTAINER_MARGIN),
                Vec2::new(-CONTAINER_MARGIN, -CONTAINER_TOP_INSET),
            ),
        );
        tree.world.entity_mut(container).insert(StackLayout { spacing: params.button_spacing });
        tree.queue(SurfaceCommand::SetStackSpacing { node: container, spacing: params.button_spacing });
        tree.container = container;

        log::debug!("[widget] built panel skeleton root={} container={}", root.index(), container.index());
        tree
    }

    fn spawn_in(world: &mut World, kind: WidgetKind, name: &str, parent: Option<Entity>) -> Entity {
        let node = world.spawn((WidgetNode { kind, name: name.to_string() }, Children::default())).id();
        if let Some(parent) = parent {
            world.entity_mut(node).insert(Parent(parent));
            if let Some(mut children) = world.get_mut::<Children>(parent) {
                children.0.push(node);
            }
        }
        world.resource_mut::<SurfaceQueue>().push(SurfaceCommand::Spawn { node, kind, parent });
        node
    }

    /// Appends a new node as the last child of `parent`.
    pub fn spawn(&mut self, kind: WidgetKind, name: &str, parent: Entity) -> Entity {
        Self::spawn_in(&mut self.world, kind, name, Some(parent))
    }

    /// Spawns a button inside the container and tracks it for geometry updates.
    pub fn spawn_button(&mut self, name: &str, size: SizeSpec) -> Entity {
        let button = self.spawn(WidgetKind::Button, name, self.container);
        self.insert_size(button, size);
        self.buttons.push(button);
        button
    }

    fn queue(&mut self, command: SurfaceCommand) {
        self.world.resource_mut::<SurfaceQueue>().push(command);
    }

    pub fn insert_bounds(&mut self, node: Entity, bounds: Bounds) {
        self.world.entity_mut(node).insert(bounds);
        self.queue(SurfaceCommand::SetBounds { node, bounds });
    }

    pub fn insert_size(&mut self, node: Entity, size: SizeSpec) {
        self.world.entity_mut(node).insert(size);
        self.queue(SurfaceCommand::SetSize { node, size });
    }

    pub fn insert_fill(&mut self, node: Entity, color: Vec4) {
        self.world.entity_mut(node).insert(Style { fill: Some(color) });
        self.queue(SurfaceCommand::SetFill { node, color });
    }

    pub fn insert_label(&mut self, node: Entity, label: Label) {
        self.world.entity_mut(node).insert(label.clone());
        self.queue(SurfaceCommand::SetLabel { node, label });
    }

    pub fn insert_placeholder(&mut self, node: Entity, text: &str) {
        self.world.entity_mut(node).insert(Placeholder(text.to_string()));
    }

    fn insert_transform(&mut self, node: Entity, transform: PanelTransform) {
        self.world.entity_mut(node).insert(transform);
        self.queue(SurfaceCommand::SetScale { node, scale: transform.scale });
    }

    /// Updates an explicit size. Returns false (and queues nothing) when unchanged.
    pub fn set_size(&mut self, node: Entity, size: SizeSpec) -> bool {
        let Some(mut current) = self.world.get_mut::<SizeSpec>(node) else {
            return false;
        };
        if *current == size {
            return false;
        }
        *current = size;
        self.queue(SurfaceCommand::SetSize { node, size });
        true
    }

    pub fn set_spacing(&mut self, node: Entity, spacing: f32) -> bool {
        let Some(mut stack) = self.world.get_mut::<StackLayout>(node) else {
            return false;
        };
        if stack.spacing == spacing {
            return false;
        }
        stack.spacing = spacing;
        self.queue(SurfaceCommand::SetStackSpacing { node, spacing });
        true
    }

    pub fn set_scale(&mut self, scale: f32) -> bool {
        let root = self.root;
        let Some(mut transform) = self.world.get_mut::<PanelTransform>(root) else {
            return false;
        };
        if transform.scale == scale {
            return false;
        }
        transform.scale = scale;
        self.queue(SurfaceCommand::SetScale { node: root, scale });
        true
    }

    pub fn set_pose(&mut self, pose: PanelPose) -> bool {
        let root = self.root;
        let Some(mut transform) = self.world.get_mut::<PanelTransform>(root) else {
            return false;
        };
        if transform.pose == Some(pose) {
            return false;
        }
        transform.pose = Some(pose);
        self.queue(SurfaceCommand::SetPose { node: root, pose });
        true
    }

    pub fn set_fill(&mut self, node: Entity, color: Vec4) -> bool {
        let Some(mut style) = self.world.get_mut::<Style>(node) else {
            return false;
        };
        if style.fill == Some(color) {
            return false;
        }
        style.fill = Some(color);
        self.queue(SurfaceCommand::SetFill { node, color });
        true
    }

    pub fn set_label_text(&mut self, node: Entity, text: &str) -> bool {
        self.update_label(node, |label| {
            if label.text == text {
                return false;
            }
            label.text = text.to_string();
            true
        })
    }

    pub fn set_label_color(&mut self, node: Entity, color: Vec4) -> bool {
        self.update_label(node, |label| {
            if label.color == color {
                return false;
            }
            label.color = color;
            true
        })
    }

    fn update_label(&mut self, node: Entity, apply: impl FnOnce(&mut Label) -> bool) -> bool {
        let updated = {
            let Some(mut label) = self.world.get_mut::<Label>(node) else {
                return false;
            };
            if !apply(&mut *label) {
                return false;
            }
            label.clone()
        };
        self.queue(SurfaceCommand::SetLabel { node, label: updated });
        true
    }

    pub fn set_visible(&mut self, visible: bool) -> bool {
        let root = self.root;
        let Some(mut flag) = self.world.get_mut::<Visible>(root) else {
            return false;
        };
        if flag.0 == visible {
            return false;
        }
        flag.0 = visible;
        self.queue(SurfaceCommand::SetVisible { node: root, visible });
        true
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn title(&self) -> Entity {
        self.title
    }

    pub fn container(&self) -> Entity {
        self.container
    }

    pub fn buttons(&self) -> &[Entity] {
        &self.buttons
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.world.get::<WidgetNode>(node).is_some()
    }

    pub fn kind(&self, node: Entity) -> Option<WidgetKind> {
        self.world.get::<WidgetNode>(node).map(|widget| widget.kind)
    }

    pub fn name(&self, node: Entity) -> Option<&str> {
        self.world.get::<WidgetNode>(node).map(|widget| widget.name.as_str())
    }

    pub fn parent(&self, node: Entity) -> Option<Entity> {
        self.world.get::<Parent>(node).map(|parent| parent.0)
    }

    pub fn children(&self, node: Entity) -> &[Entity] {
        self.world.get::<Children>(node).map(|children| children.0.as_slice()).unwrap_or(&[])
    }

    pub fn bounds(&self, node: Entity) -> Option<Bounds> {
        self.world.get::<Bounds>(node).copied()
    }

    pub fn size(&self, node: Entity) -> Option<SizeSpec> {
        self.world.get::<SizeSpec>(node).copied()
    }

    pub fn stack(&self, node: Entity) -> Option<StackLayout> {
        self.world.get::<StackLayout>(node).copied()
    }

    pub fn fill(&self, node: Entity) -> Option<Vec4> {
        self.world.get::<Style>(node).and_then(|style| style.fill)
    }

    pub fn label(&self, node: Entity) -> Option<&Label> {
        self.world.get::<Label>(node)
    }

    pub fn placeholder(&self, node: Entity) -> Option<&str> {
        self.world.get::<Placeholder>(node).map(|placeholder| placeholder.0.as_str())
    }

    pub fn transform(&self) -> PanelTransform {
        self.world
            .get::<PanelTransform>(self.root)
            .copied()
            .unwrap_or(PanelTransform { scale: 1.0, pose: None })
    }

    pub fn is_visible(&self) -> bool {
        self.world.get::<Visible>(self.root).map(|visible| visible.0).unwrap_or(false)
    }

    pub fn node_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    /// Pre-order walk from the root, children in stacking order.
    pub fn walk(&self) -> Vec<Entity> {
        let mut order = Vec::with_capacity(self.node_count());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    pub fn mutation_count(&self) -> u64 {
        self.world.resource::<SurfaceQueue>().total()
    }

    pub fn pending_commands(&self) -> &[SurfaceCommand] {
        self.world.resource::<SurfaceQueue>().pending()
    }

    pub fn drain_commands(&mut self) -> Vec<SurfaceCommand> {
        self.world.resource_mut::<SurfaceQueue>().drain()
    }
}
