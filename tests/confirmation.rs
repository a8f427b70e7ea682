use glam::Vec3;
use kestrel_panel::confirmation::{
    StatusKind, TrackingConfig, TrackingConfigHandle, ERROR_COLOR, STATUS_UPDATED,
};
use kestrel_panel::dispatch::PointerEvent;
use kestrel_panel::events::PanelEvent;
use kestrel_panel::host::HostEnvironment;
use kestrel_panel::placement::Viewpoint;
use kestrel_panel::settings::{MemorySettings, SettingsStore, SERVER_URL_KEY};
use kestrel_panel::{PanelController, PanelError, UrlValidationError};
use std::cell::RefCell;
use std::rc::Rc;

fn tracking(url: &str) -> TrackingConfigHandle {
    Rc::new(RefCell::new(TrackingConfig { server_url: url.to_string() }))
}

fn started(tracking: &TrackingConfigHandle) -> (PanelController, HostEnvironment) {
    let mut host = HostEnvironment::new()
        .with_viewpoint(Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z))
        .with_tracking(tracking.clone());
    let mut panel = PanelController::default();
    panel.startup(&mut host);
    (panel, host)
}

#[test]
fn bare_host_path_is_committed_literally() {
    let config = tracking("");
    let (mut panel, mut host) = started(&config);
    panel.set_input_text("example.com/api").expect("input row");

    let committed = panel.confirm_input(&mut host).expect("valid address");
    assert_eq!(committed, "example.com/api");
    assert_eq!(config.borrow().server_url, "example.com/api");
    assert_eq!(host.settings().get(SERVER_URL_KEY).as_deref(), Some("example.com/api"));
    let status = panel.status().expect("status shown");
    assert_eq!(status.kind, StatusKind::Success);
    assert_eq!(status.message, STATUS_UPDATED);
    let committed_event = PanelEvent::ServerUrlCommitted { url: "example.com/api".into() };
    assert_eq!(panel.drain_events(), vec![committed_event]);
}

#[test]
fn whitespace_only_input_is_an_empty_error() {
    let config = tracking("https://keep.example");
    let (mut panel, mut host) = started(&config);
    panel.set_input_text("   ").expect("input row");

    let err = panel.confirm_input(&mut host).unwrap_err();
    assert!(matches!(err, PanelError::Validation(UrlValidationError::Empty)));
    assert_eq!(config.borrow().server_url, "https://keep.example");
    assert!(host.settings().get(SERVER_URL_KEY).is_none());
    let status = panel.status().expect("status shown");
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, "URL cannot be empty");
}

#[test]
fn foreign_scheme_is_an_invalid_format_error() {
    let config = tracking("https://keep.example");
    let (mut panel, mut host) = started(&config);
    panel.set_input_text("ftp://example.com").expect("input row");

    let err = panel.confirm_input(&mut host).unwrap_err();
    assert!(matches!(err, PanelError::Validation(UrlValidationError::InvalidFormat)));
    assert_eq!(config.borrow().server_url, "https://keep.example");
    let (_, _, status_label) = panel.input_row().expect("input row");
    let label = panel.tree().and_then(|tree| tree.label(status_label)).expect("status label");
    assert_eq!(label.text, "Invalid URL format");
    assert_eq!(label.color, ERROR_COLOR);
}

#[test]
fn clicking_the_confirm_control_commits() {
    let config = tracking("");
    let (mut panel, mut host) = started(&config);
    panel.set_input_text(" http://10.0.0.5:5000/poseData ").expect("input row");
    let (_, confirm, _) = panel.input_row().expect("input row");
    let input = panel.input_scope().cloned().expect("input scope");

    for event in [PointerEvent::Enter, PointerEvent::Press, PointerEvent::Release] {
        input.send(confirm, event);
    }
    panel.process_input(&mut host);
    assert_eq!(config.borrow().server_url, "http://10.0.0.5:5000/poseData");
}

#[test]
fn field_is_seeded_from_live_config_first() {
    let config = tracking("https://live.example/pose");
    let (panel, _host) = started(&config);
    assert_eq!(panel.input_text(), Some("https://live.example/pose"));
}

#[test]
fn field_falls_back_to_persisted_value() {
    let mut host = HostEnvironment::new()
        .with_viewpoint(Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z))
        .with_settings(MemorySettings::new().with_value(SERVER_URL_KEY, "https://saved.example"));
    let mut panel = PanelController::default();
    panel.startup(&mut host);
    assert_eq!(panel.input_text(), Some("https://saved.example"));
}

#[test]
fn missing_tracking_config_still_persists() {
    let mut host = HostEnvironment::new().with_viewpoint(Viewpoint::new(Vec3::ZERO, Vec3::NEG_Z));
    let mut panel = PanelController::default();
    panel.startup(&mut host);
    panel.set_input_text("example.org").expect("input row");
    assert_eq!(panel.confirm_input(&mut host).expect("valid"), "example.org");
    assert_eq!(host.settings().get(SERVER_URL_KEY).as_deref(), Some("example.org"));
}
