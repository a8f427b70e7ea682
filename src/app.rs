use crate::cli::CliOverrides;
use crate::config::{PanelConfig, PanelConfigOverrides};
use crate::confirmation::{TrackingConfig, TrackingConfigHandle};
use crate::host::HostEnvironment;
use crate::layout::LayoutSnapshot;
use crate::panel::PanelController;
use crate::placement::Viewpoint;
use crate::settings::JsonFileSettings;
use crate::surface::LogSurface;
use crate::widget::WidgetTree;
use anyhow::Result;
use glam::Vec3;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

const DEFAULT_CONFIG_PATH: &str = "config/panel.json";
/// Standing eye height of the default headless viewpoint.
const EYE_HEIGHT: f32 = 1.6;

pub fn run() -> Result<()> {
    run_with_overrides(CliOverrides::default())
}

/// Builds a panel against a log surface, optionally confirms a server address, and prints
/// the resolved layout.
pub fn run_with_overrides(cli: CliOverrides) -> Result<()> {
    let config_path = cli.config_path().cloned().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = PanelConfig::load_or_default(&config_path);
    let overrides: PanelConfigOverrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::info!("[config] CLI overrides: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    config.layout.validate()?;

    let tracking: TrackingConfigHandle = Rc::new(RefCell::new(TrackingConfig::default()));
    let settings = JsonFileSettings::open_or_empty(&config.settings_path);
    let mut host = HostEnvironment::new()
        .with_viewpoint(Viewpoint::new(Vec3::new(0.0, EYE_HEIGHT, 0.0), Vec3::NEG_Z))
        .with_tracking(tracking.clone())
        .with_settings(settings);

    let mut panel = PanelController::new(config);
    panel.startup(&mut host);

    if let Some(url) = cli.server_url() {
        panel.set_input_text(url)?;
        match panel.confirm_input(&mut host) {
            Ok(committed) => println!("server address: {committed}"),
            Err(err) => println!("server address rejected: {err}"),
        }
    }

    let mut surface = LogSurface::default();
    let submitted = panel.flush(&mut surface);
    log::info!("[panel] flushed {submitted} surface commands");

    if let (Some(tree), Some(layout)) = (panel.tree(), panel.layout()) {
        print_layout(tree, &layout);
    }
    for event in panel.drain_events() {
        println!("event: {event}");
    }
    println!("tracking server_url = {:?}", tracking.borrow().server_url);
    Ok(())
}

fn print_layout(tree: &WidgetTree, layout: &LayoutSnapshot) {
    for node in tree.walk() {
        let depth = std::iter::successors(tree.parent(node), |parent| tree.parent(*parent)).count();
        let (Some(kind), Some(rect)) = (tree.kind(node), layout.rect(node)) else {
            continue;
        };
        println!(
            "{:indent$}{} '{}' ({:.1}, {:.1}) - ({:.1}, {:.1})",
            "",
            kind.label(),
            tree.name(node).unwrap_or_default(),
            rect.min.x,
            rect.min.y,
            rect.max.x,
            rect.max.y,
            indent = depth * 2
        );
    }
}
