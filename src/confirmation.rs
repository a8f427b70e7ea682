use crate::controls::{ControlAction, ControlRegistry, BUTTON_FONT_SIZE, DEFAULT_ACCENT};
use crate::dispatch::InputScope;
use crate::error::UrlValidationError;
use crate::settings::{SettingsStore, SERVER_URL_KEY};
use crate::widget::{Bounds, Label, SizeSpec, TextAlign, WidgetKind, WidgetTree};
use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec4};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

pub const INPUT_ROW_HEIGHT: f32 = 120.0;
pub const INPUT_FIELD_FILL: Vec4 = Vec4::new(0.2, 0.2, 0.2, 1.0);
pub const STATUS_FONT_SIZE: f32 = 20.0;
pub const SUCCESS_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
pub const ERROR_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
pub const STATUS_UPDATED: &str = "Server address updated";
const FIELD_SPLIT: f32 = 0.7;
const ROW_PADDING: f32 = 10.0;
const PLACEHOLDER: &str = "Enter server address...";

/// External data-tracking configuration whose server address the panel edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingConfig {
    pub server_url: String,
}

pub type TrackingConfigHandle = Rc<RefCell<TrackingConfig>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    pub fn color(self) -> Vec4 {
        match self {
            StatusKind::Success => SUCCESS_COLOR,
            StatusKind::Error => ERROR_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

/// True when `text` starts with `scheme://`.
fn has_explicit_scheme(text: &str) -> bool {
    let Some(end) = text.find("://") else {
        return false;
    };
    let scheme = &text[..end];
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Validates a server address and returns the trimmed text exactly as typed.
///
/// Text without a scheme is checked as if it started with `https://`; the assumed prefix
/// is never part of the returned value.
pub fn validate_server_url(text: &str) -> Result<&str, UrlValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    let candidate =
        if has_explicit_scheme(trimmed) { trimmed.to_string() } else { format!("https://{trimmed}") };
    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed),
        _ => Err(UrlValidationError::InvalidFormat),
    }
}

/// Initial field text: live tracking config, then the persisted value, then the default.
pub fn seed_text(
    tracking: Option<&TrackingConfigHandle>,
    store: &dyn SettingsStore,
    fallback: &str,
) -> String {
    if let Some(current) = tracking.map(|config| config.borrow().server_url.clone()) {
        if !current.trim().is_empty() {
            return current;
        }
    }
    store.get(SERVER_URL_KEY).filter(|value| !value.trim().is_empty()).unwrap_or_else(|| fallback.to_string())
}

/// The server address input row: field, confirm control and status label.
#[derive(Debug)]
pub struct ConfirmationWorkflow {
    row: Entity,
    field: Entity,
    confirm: Entity,
    status_label: Entity,
    text: String,
    status: Option<Status>,
}

impl ConfirmationWorkflow {
    /// Adds the input row as the next child of the button container.
    pub fn build(
        tree: &mut WidgetTree,
        registry: &mut ControlRegistry,
        input: &InputScope,
        initial_text: String,
    ) -> Self {
        let row = tree.spawn(WidgetKind::InputRow, "ServerUrlInputContainer", tree.container());
        tree.insert_size(row, SizeSpec::stretched(INPUT_ROW_HEIGHT));

        let field = tree.spawn(WidgetKind::InputField, "ServerUrlInputField", row);
        tree.insert_bounds(
            field,
            Bounds::new(
                Vec2::ZERO,
                Vec2::new(FIELD_SPLIT, 1.0),
                Vec2::new(0.0, ROW_PADDING),
                Vec2::new(-ROW_PADDING, -ROW_PADDING),
            ),
        );
        let field_label = Label::new(initial_text.clone(), BUTTON_FONT_SIZE).aligned(TextAlign::MiddleLeft);
        tree.insert_label(field, field_label);
        tree.insert_placeholder(field, PLACEHOLDER);
        registry.attach(tree, input, field, "ServerUrlInputField", INPUT_FIELD_FILL, ControlAction::None);

        let confirm = tree.spawn(WidgetKind::Button, "ConfirmButton", row);
        tree.insert_bounds(
            confirm,
            Bounds::new(
                Vec2::new(FIELD_SPLIT, 0.0),
                Vec2::ONE,
                Vec2::new(ROW_PADDING, ROW_PADDING),
                Vec2::new(0.0, -ROW_PADDING),
            ),
        );
        tree.insert_label(confirm, Label::new("Confirm", BUTTON_FONT_SIZE));
        registry.attach(tree, input, confirm, "Confirm", DEFAULT_ACCENT, ControlAction::ConfirmServerUrl);

        let status_label = tree.spawn(WidgetKind::StatusLabel, "StatusText", row);
        tree.insert_bounds(
            status_label,
            Bounds::new(Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, -30.0), Vec2::new(0.0, -ROW_PADDING)),
        );
        tree.insert_label(status_label, Label::new("", STATUS_FONT_SIZE).colored(SUCCESS_COLOR));

        Self { row, field, confirm, status_label, text: initial_text, status: None }
    }

    pub fn row(&self) -> Entity {
        self.row
    }

    pub fn field(&self) -> Entity {
        self.field
    }

    pub fn confirm_control(&self) -> Entity {
        self.confirm
    }

    pub fn status_label(&self) -> Entity {
        self.status_label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn set_text(&mut self, tree: &mut WidgetTree, text: &str) {
        self.text = text.to_string();
        tree.set_label_text(self.field, text);
    }

    /// Runs the confirm protocol against the field's current text.
    pub fn confirm(
        &mut self,
        tree: &mut WidgetTree,
        tracking: Option<&TrackingConfigHandle>,
        store: &mut dyn SettingsStore,
    ) -> Result<String, UrlValidationError> {
        let committed = match validate_server_url(&self.text) {
            Ok(url) => url.to_string(),
            Err(err) => {
                log::warn!("[confirm] rejected server address {:?}: {err}", self.text);
                self.show_status(tree, StatusKind::Error, &err.to_string());
                return Err(err);
            }
        };

        match tracking {
            Some(config) => config.borrow_mut().server_url = committed.clone(),
            None => log::warn!("[confirm] no tracking config attached; only persisting the address"),
        }
        store.set(SERVER_URL_KEY, &committed);
        if let Err(err) = store.save() {
            log::warn!("[confirm] failed to persist server address: {err:?}");
        }
        self.show_status(tree, StatusKind::Success, STATUS_UPDATED);
        log::info!("[confirm] server address updated to {committed}");
        Ok(committed)
    }

    fn show_status(&mut self, tree: &mut WidgetTree, kind: StatusKind, message: &str) {
        tree.set_label_text(self.status_label, message);
        tree.set_label_color(self.status_label, kind.color());
        self.status = Some(Status { kind, message: message.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelParams;
    use crate::dispatch::InputDispatch;
    use crate::settings::MemorySettings;

    #[test]
    fn bare_host_is_valid_and_kept_literal() {
        assert_eq!(validate_server_url("  example.com/api "), Ok("example.com/api"));
        assert_eq!(validate_server_url("localhost:5000/poseData"), Ok("localhost:5000/poseData"));
        assert_eq!(validate_server_url("http://10.0.0.2:8080"), Ok("http://10.0.0.2:8080"));
    }

    #[test]
    fn empty_and_foreign_schemes_are_rejected() {
        assert_eq!(validate_server_url("   "), Err(UrlValidationError::Empty));
        assert_eq!(validate_server_url("ftp://example.com"), Err(UrlValidationError::InvalidFormat));
        assert_eq!(validate_server_url("https://"), Err(UrlValidationError::InvalidFormat));
        assert_eq!(validate_server_url("exa mple.com"), Err(UrlValidationError::InvalidFormat));
    }

    #[test]
    fn scheme_detection_needs_a_real_scheme() {
        assert!(has_explicit_scheme("https://a"));
        assert!(has_explicit_scheme("svn+ssh://a"));
        assert!(!has_explicit_scheme("example.com"));
        assert!(!has_explicit_scheme("://a"));
        assert!(!has_explicit_scheme("1http://a"));
    }

    #[test]
    fn seed_prefers_tracking_then_persisted_then_default() {
        let tracking = Rc::new(RefCell::new(TrackingConfig { server_url: "https://live".into() }));
        let store = MemorySettings::new().with_value(SERVER_URL_KEY, "https://saved");
        assert_eq!(seed_text(Some(&tracking), &store, "https://default"), "https://live");
        tracking.borrow_mut().server_url.clear();
        assert_eq!(seed_text(Some(&tracking), &store, "https://default"), "https://saved");
        assert_eq!(seed_text(None, &MemorySettings::new(), "https://default"), "https://default");
    }

    #[test]
    fn failed_confirmation_leaves_config_alone() {
        let mut tree = WidgetTree::build(&PanelParams::default(), "Confirm");
        let mut registry = ControlRegistry::new();
        let input = InputDispatch::new().scope();
        let mut workflow = ConfirmationWorkflow::build(&mut tree, &mut registry, &input, "x".into());
        let tracking = Rc::new(RefCell::new(TrackingConfig { server_url: "https://keep".into() }));
        let mut store = MemorySettings::new();

        workflow.set_text(&mut tree, "ftp://example.com");
        let err = workflow.confirm(&mut tree, Some(&tracking), &mut store).unwrap_err();
        assert_eq!(err, UrlValidationError::InvalidFormat);
        assert_eq!(tracking.borrow().server_url, "https://keep");
        assert!(store.get(SERVER_URL_KEY).is_none());
        let label = tree.label(workflow.status_label()).expect("status label");
        assert_eq!(label.text, "Invalid URL format");
        assert_eq!(label.color, ERROR_COLOR);
    }
}
