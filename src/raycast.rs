use crate::widget::PanelTransform;
use glam::{Vec2, Vec3};

/// Capability name under which hosts with tracked controllers publish their raycaster.
pub const TRACKED_DEVICE_RAYCASTER: &str = "xr.tracked_device_raycaster";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Converts a world-space pointer ray into a point on the panel, in panel units.
pub trait PanelRaycaster {
    fn name(&self) -> &'static str;

    fn project(&self, ray: &Ray, panel: &PanelTransform) -> Option<Vec2>;
}

/// Plain ray/plane intersection with no range limit. Used when the host offers nothing better.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaneRaycaster;

impl PanelRaycaster for PlaneRaycaster {
    fn name(&self) -> &'static str {
        "plane"
    }

    fn project(&self, ray: &Ray, panel: &PanelTransform) -> Option<Vec2> {
        intersect(ray, panel, f32::INFINITY)
    }
}

/// Raycaster for tracked controllers: hits beyond `max_distance` are ignored.
#[derive(Debug, Clone, Copy)]
pub struct TrackedDeviceRaycaster {
    pub max_distance: f32,
}

impl Default for TrackedDeviceRaycaster {
    fn default() -> Self {
        Self { max_distance: 30.0 }
    }
}

impl PanelRaycaster for TrackedDeviceRaycaster {
    fn name(&self) -> &'static str {
        "tracked_device"
    }

    fn project(&self, ray: &Ray, panel: &PanelTransform) -> Option<Vec2> {
        intersect(ray, panel, self.max_distance)
    }
}

fn intersect(ray: &Ray, panel: &PanelTransform, max_distance: f32) -> Option<Vec2> {
    let pose = panel.pose?;
    if panel.scale <= 0.0 {
        return None;
    }
    let direction = ray.direction.try_normalize()?;
    let normal = pose.rotation * Vec3::Z;
    let denom = direction.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (pose.position - ray.origin).dot(normal) / denom;
    if t < 0.0 || t > max_distance {
        return None;
    }
    let hit = ray.origin + direction * t;
    let local = pose.rotation.inverse() * (hit - pose.position) / panel.scale;
    Some(Vec2::new(local.x, local.y))
}
