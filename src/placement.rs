use glam::{Mat3, Quat, Vec3};

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Reference viewpoint the panel floats in front of (usually the main camera).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Viewpoint {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Builds a viewpoint from a look-at pair, like `Camera3D` does.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self { position, forward: target - position }
    }
}

/// World pose of the panel root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl PanelPose {
    /// Normal of the panel face the viewer sees.
    pub fn facing(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Places the panel `distance` units along the viewpoint's forward vector and turns it so
/// its forward axis (+Z, the visible face) points back at the viewpoint.
pub fn compute_pose(viewpoint_position: Vec3, viewpoint_forward: Vec3, distance: f32) -> PanelPose {
    let forward = viewpoint_forward.try_normalize().unwrap_or(Vec3::NEG_Z);
    let position = viewpoint_position + forward * distance;
    let toward_viewer = (viewpoint_position - position).try_normalize().unwrap_or(-forward);
    let look = look_rotation(toward_viewer);
    // Look-at leaves -Z on the viewer; the yaw flip turns the front face (+Z) toward it.
    let rotation = (look * Quat::from_rotation_y(std::f32::consts::PI)).normalize();
    PanelPose { position, rotation }
}

pub fn pose_for(viewpoint: &Viewpoint, distance: f32) -> PanelPose {
    compute_pose(viewpoint.position, viewpoint.forward, distance)
}

/// Right-handed look rotation: local -Z onto `forward`, local +Y as close to up as possible.
fn look_rotation(forward: Vec3) -> Quat {
    let back = -forward;
    let up = if back.cross(DEFAULT_UP).length_squared() < 1e-6 { Vec3::Z } else { DEFAULT_UP };
    let right = up.cross(back).normalize();
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}
