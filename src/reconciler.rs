use crate::config::PanelParams;
use crate::controls::button_size;
use crate::placement::{pose_for, Viewpoint};
use crate::widget::{SizeSpec, WidgetTree};
use bitflags::bitflags;

bitflags! {
    /// Independent parameter groups; each maps to one scoped tree update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChangeGroups: u8 {
        const PANEL_SIZE = 1 << 0;
        const PANEL_SCALE = 1 << 1;
        const VIEW_DISTANCE = 1 << 2;
        const BUTTON_GEOMETRY = 1 << 3;
    }
}

/// Last applied parameter values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterCache {
    applied: Option<PanelParams>,
}

impl ParameterCache {
    pub fn seeded(params: PanelParams) -> Self {
        Self { applied: Some(params) }
    }

    pub fn applied(&self) -> Option<&PanelParams> {
        self.applied.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        self.applied.is_some()
    }

    /// Groups whose fields differ from the cached values. Unseeded caches report nothing.
    pub fn diff(&self, params: &PanelParams) -> ChangeGroups {
        let Some(cached) = self.applied.as_ref() else {
            return ChangeGroups::empty();
        };
        let mut groups = ChangeGroups::empty();
        if cached.panel_width != params.panel_width || cached.panel_height != params.panel_height {
            groups |= ChangeGroups::PANEL_SIZE;
        }
        if cached.panel_scale != params.panel_scale {
            groups |= ChangeGroups::PANEL_SCALE;
        }
        if cached.view_distance != params.view_distance {
            groups |= ChangeGroups::VIEW_DISTANCE;
        }
        if cached.button_width != params.button_width
            || cached.button_height != params.button_height
            || cached.button_spacing != params.button_spacing
        {
            groups |= ChangeGroups::BUTTON_GEOMETRY;
        }
        groups
    }

    /// Copies only the fields belonging to `groups` into the cache.
    pub fn refresh(&mut self, params: &PanelParams, groups: ChangeGroups) {
        let cached = self.applied.get_or_insert(*params);
        if groups.contains(ChangeGroups::PANEL_SIZE) {
            cached.panel_width = params.panel_width;
            cached.panel_height = params.panel_height;
        }
        if groups.contains(ChangeGroups::PANEL_SCALE) {
            cached.panel_scale = params.panel_scale;
        }
        if groups.contains(ChangeGroups::VIEW_DISTANCE) {
            cached.view_distance = params.view_distance;
        }
        if groups.contains(ChangeGroups::BUTTON_GEOMETRY) {
            cached.button_width = params.button_width;
            cached.button_height = params.button_height;
            cached.button_spacing = params.button_spacing;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub changed: ChangeGroups,
    pub mutations: u64,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.mutations == 0
    }
}

/// Keeps a live tree in step with drifting parameters without rebuilding it.
#[derive(Debug, Default)]
pub struct Reconciler {
    cache: ParameterCache,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache with the parameters the tree was built from.
    pub fn seed(&mut self, params: PanelParams) {
        self.cache = ParameterCache::seeded(params);
    }

    pub fn cache(&self) -> &ParameterCache {
        &self.cache
    }

    pub fn reconcile(
        &mut self,
        params: &PanelParams,
        tree: &mut WidgetTree,
        viewpoint: Option<&Viewpoint>,
    ) -> ReconcileReport {
        if !self.cache.is_seeded() {
            self.seed(*params);
            log::debug!("[reconcile] cache seeded");
            return ReconcileReport::default();
        }

        let changed = self.cache.diff(params);
        if changed.is_empty() {
            return ReconcileReport::default();
        }

        let before = tree.mutation_count();
        if changed.contains(ChangeGroups::PANEL_SIZE) {
            let root = tree.root();
            tree.set_size(root, SizeSpec::new(params.panel_width, params.panel_height));
        }
        if changed.contains(ChangeGroups::PANEL_SCALE) {
            tree.set_scale(params.panel_scale);
        }
        if changed.contains(ChangeGroups::VIEW_DISTANCE) {
            match viewpoint {
                Some(viewpoint) => {
                    tree.set_pose(pose_for(viewpoint, params.view_distance));
                }
                None => log::warn!(
                    "[reconcile] view distance changed to {} but no viewpoint is available; panel not moved",
                    params.view_distance
                ),
            }
        }
        if changed.contains(ChangeGroups::BUTTON_GEOMETRY) {
            let container = tree.container();
            tree.set_spacing(container, params.button_spacing);
            let size = button_size(params);
            for button in tree.buttons().to_vec() {
                tree.set_size(button, size);
            }
        }
        self.cache.refresh(params, changed);

        let report = ReconcileReport { changed, mutations: tree.mutation_count() - before };
        log::debug!("[reconcile] groups={:?} mutations={}", report.changed, report.mutations);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn setup(params: PanelParams) -> (WidgetTree, Reconciler) {
        let mut tree = WidgetTree::build(&params, "Reconcile");
        tree.spawn_button("Button_A", button_size(&params));
        tree.spawn_button("Button_B", button_size(&params));
        let mut reconciler = Reconciler::new();
        reconciler.seed(params);
        (tree, reconciler)
    }

    #[test]
    fn first_pass_on_unseeded_cache_only_seeds() {
        let params = PanelParams::default();
        let mut tree = WidgetTree::build(&params, "Seed");
        let mut reconciler = Reconciler::new();
        let report = reconciler.reconcile(&params, &mut tree, None);
        assert!(report.is_noop());
        assert_eq!(reconciler.cache().applied(), Some(&params));
    }

    #[test]
    fn diff_groups_fields() {
        let base = PanelParams::default();
        let cache = ParameterCache::seeded(base);
        assert!(cache.diff(&base).is_empty());
        let wider = PanelParams { panel_width: 400.0, ..base };
        assert_eq!(cache.diff(&wider), ChangeGroups::PANEL_SIZE);
        let mixed = PanelParams { button_height: 80.0, panel_scale: 0.01, ..base };
        assert_eq!(cache.diff(&mixed), ChangeGroups::BUTTON_GEOMETRY | ChangeGroups::PANEL_SCALE);
    }

    #[test]
    fn refresh_touches_only_named_groups() {
        let base = PanelParams::default();
        let mut cache = ParameterCache::seeded(base);
        let next = PanelParams { panel_width: 500.0, button_spacing: 5.0, ..base };
        cache.refresh(&next, ChangeGroups::BUTTON_GEOMETRY);
        let cached = cache.applied().copied().expect("seeded");
        assert_eq!(cached.button_spacing, 5.0);
        assert_eq!(cached.panel_width, 300.0);
    }

    #[test]
    fn spacing_change_does_not_touch_root() {
        let (mut tree, mut reconciler) = setup(PanelParams::default());
        tree.drain_commands();
        let params = PanelParams { button_spacing: 8.0, ..PanelParams::default() };
        let report = reconciler.reconcile(&params, &mut tree, None);
        assert_eq!(report.changed, ChangeGroups::BUTTON_GEOMETRY);
        assert_eq!(report.mutations, 1, "button sizes already match");
        assert!(tree.pending_commands().iter().all(|command| command.node() == tree.container()));
    }

    #[test]
    fn distance_change_without_viewpoint_still_updates_cache() {
        let (mut tree, mut reconciler) = setup(PanelParams::default());
        let params = PanelParams { view_distance: 2.0, ..PanelParams::default() };
        let report = reconciler.reconcile(&params, &mut tree, None);
        assert_eq!(report.changed, ChangeGroups::VIEW_DISTANCE);
        assert_eq!(report.mutations, 0);
        assert_eq!(reconciler.cache().applied().map(|p| p.view_distance), Some(2.0));
        assert!(reconciler.reconcile(&params, &mut tree, None).changed.is_empty());
    }

    #[test]
    fn distance_change_moves_panel() {
        let (mut tree, mut reconciler) = setup(PanelParams::default());
        let viewpoint = Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z);
        let params = PanelParams { view_distance: 2.0, ..PanelParams::default() };
        let report = reconciler.reconcile(&params, &mut tree, Some(&viewpoint));
        assert_eq!(report.mutations, 1);
        let pose = tree.transform().pose.expect("placed");
        assert!((pose.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn fixed_width_resizes_every_button() {
        let (mut tree, mut reconciler) = setup(PanelParams::default());
        let params = PanelParams { button_width: 120.0, ..PanelParams::default() };
        let report = reconciler.reconcile(&params, &mut tree, None);
        assert_eq!(report.mutations, 2);
        for &button in tree.buttons() {
            assert_eq!(tree.size(button), Some(SizeSpec::new(120.0, 100.0)));
        }
    }
}
