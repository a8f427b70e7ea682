use glam::Vec3;
use kestrel_panel::config::PanelParams;
use kestrel_panel::host::HostEnvironment;
use kestrel_panel::placement::Viewpoint;
use kestrel_panel::reconciler::ChangeGroups;
use kestrel_panel::surface::{RecordingSurface, SurfaceCommand};
use kestrel_panel::widget::SizeSpec;
use kestrel_panel::PanelController;

fn started_panel() -> (PanelController, HostEnvironment) {
    let mut host = HostEnvironment::new().with_viewpoint(Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z));
    let mut panel = PanelController::default();
    panel.startup(&mut host);
    let mut surface = RecordingSurface::new();
    panel.flush(&mut surface);
    (panel, host)
}

#[test]
fn applied_params_land_on_root_and_reapply_is_a_noop() {
    let (mut panel, _host) = started_panel();
    let params =
        PanelParams { panel_width: 420.0, panel_height: 360.0, panel_scale: 0.01, ..PanelParams::default() };

    let report = panel.apply_params(params).expect("valid params");
    assert_eq!(report.changed, ChangeGroups::PANEL_SIZE | ChangeGroups::PANEL_SCALE);
    assert_eq!(report.mutations, 2);

    let tree = panel.tree().expect("built");
    assert_eq!(tree.size(tree.root()), Some(SizeSpec::new(420.0, 360.0)));
    assert_eq!(tree.transform().scale, 0.01);
    assert_eq!(panel.params(), &params);

    let again = panel.apply_params(params).expect("valid params");
    assert!(again.is_noop());
    assert!(again.changed.is_empty());
}

#[test]
fn spacing_change_never_touches_panel_size() {
    let (mut panel, _host) = started_panel();
    let params = PanelParams { button_spacing: 4.0, ..PanelParams::default() };
    panel.apply_params(params).expect("valid params");

    let mut surface = RecordingSurface::new();
    panel.flush(&mut surface);
    let tree = panel.tree().expect("built");
    assert_eq!(surface.commands_for(tree.root()).count(), 0);
    assert_eq!(
        surface.commands,
        vec![SurfaceCommand::SetStackSpacing { node: tree.container(), spacing: 4.0 }]
    );
}

#[test]
fn button_width_switches_between_stretched_and_fixed() {
    let (mut panel, _host) = started_panel();
    {
        let tree = panel.tree().expect("built");
        for &button in tree.buttons() {
            assert_eq!(tree.size(button), Some(SizeSpec::stretched(100.0)));
        }
    }

    panel.apply_params(PanelParams { button_width: 120.0, ..PanelParams::default() }).expect("valid");
    let tree = panel.tree().expect("built");
    for &button in tree.buttons() {
        assert_eq!(tree.size(button), Some(SizeSpec::new(120.0, 100.0)));
    }

    panel.apply_params(PanelParams::default()).expect("valid");
    let tree = panel.tree().expect("built");
    assert!(tree.buttons().iter().all(|&button| tree.size(button).is_some_and(|size| size.is_stretch())));
}

#[test]
fn buttons_added_later_follow_current_geometry() {
    let (mut panel, _host) = started_panel();
    let params = PanelParams { button_width: 90.0, button_height: 40.0, ..PanelParams::default() };
    panel.apply_params(params).expect("valid");
    let handle = panel.add_button("Later", || {}, None).expect("button");
    let tree = panel.tree().expect("built");
    assert_eq!(tree.size(handle.node()), Some(SizeSpec::new(90.0, 40.0)));
}

#[test]
fn invalid_params_are_rejected_without_mutation() {
    let (mut panel, _host) = started_panel();
    let before = panel.tree().map(|tree| tree.mutation_count());
    let params = PanelParams { panel_scale: f32::NAN, ..PanelParams::default() };
    let err = panel.apply_params(params).unwrap_err();
    assert!(err.to_string().contains("panel_scale"));
    assert_eq!(panel.tree().map(|tree| tree.mutation_count()), before);
    assert_eq!(panel.params(), &PanelParams::default());
}

#[test]
fn distance_and_viewpoint_changes_move_the_panel() {
    let (mut panel, _host) = started_panel();
    panel.apply_params(PanelParams { view_distance: 2.0, ..PanelParams::default() }).expect("valid");
    let pose = panel.tree().and_then(|tree| tree.transform().pose).expect("placed");
    assert!((pose.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);

    assert!(!panel.set_viewpoint(Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z)), "same viewpoint");
    assert!(panel.set_viewpoint(Viewpoint::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X)));
    let pose = panel.tree().and_then(|tree| tree.transform().pose).expect("placed");
    assert!((pose.position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-5);
}
