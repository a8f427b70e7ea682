use crate::widget::{WidgetKind, WidgetTree};
use bevy_ecs::prelude::Entity;
use glam::Vec2;
use std::collections::HashMap;

/// Axis-aligned rectangle in panel units, origin at the panel center, Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Resolved rectangles for every node of a tree.
#[derive(Debug, Default, Clone)]
pub struct LayoutSnapshot {
    rects: HashMap<Entity, Rect>,
    order: Vec<Entity>,
}

impl LayoutSnapshot {
    pub fn rect(&self, node: Entity) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Deepest interactive node under `point`, later siblings winning ties.
    pub fn hit_test(&self, tree: &WidgetTree, point: Vec2) -> Option<Entity> {
        self.order
            .iter()
            .rev()
            .copied()
            .filter(|node| tree.kind(*node).is_some_and(WidgetKind::is_interactive))
            .find(|node| self.rects.get(node).is_some_and(|rect| rect.contains(point)))
    }
}

/// Resolves anchors and stack rules top-down.
pub fn resolve(tree: &WidgetTree) -> LayoutSnapshot {
    let mut snapshot = LayoutSnapshot::default();
    let root = tree.root();
    let root_size = tree.size(root).map(|size| size.as_vec2()).unwrap_or(Vec2::ZERO);
    let mut stack = vec![(root, Rect::from_center_size(Vec2::ZERO, root_size))];
    while let Some((node, rect)) = stack.pop() {
        snapshot.rects.insert(node, rect);
        snapshot.order.push(node);
        let children = tree.children(node);
        let child_rects: Vec<Rect> = match tree.stack(node) {
            Some(stack_rule) => stack_children(tree, children, rect, stack_rule.spacing),
            None => children.iter().map(|child| anchored(tree, *child, rect)).collect(),
        };
        for (child, child_rect) in children.iter().zip(child_rects).rev() {
            stack.push((*child, child_rect));
        }
    }
    snapshot
}

fn anchored(tree: &WidgetTree, node: Entity, parent: Rect) -> Rect {
    match tree.bounds(node) {
        Some(bounds) => {
            let size = parent.size();
            Rect {
                min: parent.min + bounds.anchor_min * size + bounds.offset_min,
                max: parent.min + bounds.anchor_max * size + bounds.offset_max,
            }
        }
        None => parent,
    }
}

/// Middle-center vertical stack: children keep their heights, stretch-sentinel children
/// take the container width, fixed-width children are centered.
fn stack_children(tree: &WidgetTree, children: &[Entity], container: Rect, spacing: f32) -> Vec<Rect> {
    let sizes: Vec<Vec2> = children
        .iter()
        .map(|child| {
            let spec = tree.size(*child);
            let height = spec.map(|spec| spec.height).unwrap_or(0.0);
            let width = match spec {
                Some(spec) if !spec.is_stretch() => spec.width,
                _ => container.width(),
            };
            Vec2::new(width, height)
        })
        .collect();
    let gaps = children.len().saturating_sub(1) as f32;
    let total: f32 = sizes.iter().map(|size| size.y).sum::<f32>() + spacing * gaps;
    let center = container.center();
    let mut top = center.y + total * 0.5;
    sizes
        .into_iter()
        .map(|size| {
            let rect = Rect {
                min: Vec2::new(center.x - size.x * 0.5, top - size.y),
                max: Vec2::new(center.x + size.x * 0.5, top),
            };
            top -= size.y + spacing;
            rect
        })
        .collect()
}
