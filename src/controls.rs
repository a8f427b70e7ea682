use crate::config::PanelParams;
use crate::dispatch::{InputScope, ListenerRegistration, PointerEvent};
use crate::error::PanelError;
use crate::widget::{Label, SizeSpec, WidgetTree};
use bevy_ecs::prelude::Entity;
use glam::{Vec3, Vec4};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_ACCENT: Vec4 = Vec4::new(0.2, 0.6, 1.0, 1.0);
pub const BUTTON_FONT_SIZE: f32 = 36.0;
const HOVER_WHITE_BLEND: f32 = 0.4;
const PRESSED_DARKEN: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Hovered,
    Pressed,
}

/// Fill colors for each visual state, derived from one base color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPalette {
    pub idle: Vec4,
    pub hovered: Vec4,
    pub pressed: Vec4,
}

impl ControlPalette {
    pub fn from_base(base: Vec4) -> Self {
        let hovered = base.truncate().lerp(Vec3::ONE, HOVER_WHITE_BLEND).extend(base.w);
        let pressed = (base.truncate() * PRESSED_DARKEN).extend(base.w);
        Self { idle: base, hovered, pressed }
    }

    pub fn color(&self, state: ControlState) -> Vec4 {
        match state {
            ControlState::Idle => self.idle,
            ControlState::Hovered => self.hovered,
            ControlState::Pressed => self.pressed,
        }
    }
}

/// Hover/press tracking for one control. Purely visual; never touches layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlMachine {
    hovered: bool,
    pressed: bool,
}

impl ControlMachine {
    pub fn state(&self) -> ControlState {
        if self.pressed {
            ControlState::Pressed
        } else if self.hovered {
            ControlState::Hovered
        } else {
            ControlState::Idle
        }
    }

    /// Applies one pointer event and reports whether it completed a click.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Enter => {
                self.hovered = true;
                false
            }
            PointerEvent::Exit => {
                self.hovered = false;
                false
            }
            PointerEvent::Press => {
                self.pressed = true;
                false
            }
            PointerEvent::Release => std::mem::replace(&mut self.pressed, false),
        }
    }
}

/// What a completed click on a control does.
pub enum ControlAction {
    Callback(Box<dyn FnMut()>),
    ConfirmServerUrl,
    None,
}

impl fmt::Debug for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Callback(_) => f.write_str("Callback"),
            ControlAction::ConfirmServerUrl => f.write_str("ConfirmServerUrl"),
            ControlAction::None => f.write_str("None"),
        }
    }
}

/// Caller-facing handle to a created control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlHandle {
    node: Entity,
    label: String,
}

impl ControlHandle {
    pub fn node(&self) -> Entity {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

struct Control {
    label: String,
    machine: ControlMachine,
    palette: ControlPalette,
    action: ControlAction,
    _registration: ListenerRegistration,
}

/// What a completed click asks the panel to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The control's callback already ran.
    Clicked,
    ConfirmRequested,
}

/// Outcome of routing one event to a control. A release that completes a click both
/// changes the visual state and activates, so the two are reported side by side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlOutcome {
    pub label: String,
    pub state: Option<ControlState>,
    pub activation: Option<Activation>,
}

impl ControlOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.state.is_none() && self.activation.is_none()
    }
}

/// Owns every interactive control of a panel: state machines, actions and dispatch
/// registrations. Clearing it deregisters everything.
#[derive(Default)]
pub struct ControlRegistry {
    controls: HashMap<Entity, Control>,
}

impl ControlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.controls.contains_key(&node)
    }

    pub fn state(&self, node: Entity) -> Option<ControlState> {
        self.controls.get(&node).map(|control| control.machine.state())
    }

    pub fn palette(&self, node: Entity) -> Option<ControlPalette> {
        self.controls.get(&node).map(|control| control.palette)
    }

    /// Wires an existing node up as an interactive control.
    pub fn attach(
        &mut self,
        tree: &mut WidgetTree,
        input: &InputScope,
        node: Entity,
        label: &str,
        base: Vec4,
        action: ControlAction,
    ) {
        let palette = ControlPalette::from_base(base);
        tree.insert_fill(node, palette.idle);
        let registration = input.register(node);
        self.controls.insert(
            node,
            Control {
                label: label.to_string(),
                machine: ControlMachine::default(),
                palette,
                action,
                _registration: registration,
            },
        );
    }

    /// Feeds one pointer event to a control, repainting it and running click actions.
    pub fn handle(&mut self, tree: &mut WidgetTree, node: Entity, event: PointerEvent) -> ControlOutcome {
        let Some(control) = self.controls.get_mut(&node) else {
            return ControlOutcome::default();
        };
        let before = control.machine.state();
        let clicked = control.machine.handle(event);
        let after = control.machine.state();
        let mut outcome = ControlOutcome { label: control.label.clone(), ..ControlOutcome::default() };
        if before != after {
            tree.set_fill(node, control.palette.color(after));
            outcome.state = Some(after);
        }
        if clicked {
            log::debug!("[controls] click on '{}'", control.label);
            outcome.activation = match &mut control.action {
                ControlAction::Callback(callback) => {
                    callback();
                    Some(Activation::Clicked)
                }
                ControlAction::ConfirmServerUrl => Some(Activation::ConfirmRequested),
                ControlAction::None => None,
            };
        }
        outcome
    }

    /// Returns every control to `Idle` without firing any action.
    pub fn reset(&mut self, tree: &mut WidgetTree) {
        for (node, control) in self.controls.iter_mut() {
            if control.machine.state() != ControlState::Idle {
                control.machine = ControlMachine::default();
                tree.set_fill(*node, control.palette.idle);
            }
        }
    }

    /// Drops every control, releasing its dispatch registration and action.
    pub fn clear(&mut self) -> usize {
        let released = self.controls.len();
        self.controls.clear();
        released
    }
}

/// Creates a button in the container, sized by the current button geometry.
pub fn create_button(
    tree: Option<&mut WidgetTree>,
    registry: &mut ControlRegistry,
    input: &InputScope,
    params: &PanelParams,
    label: &str,
    on_activate: Box<dyn FnMut()>,
    color: Option<Vec4>,
) -> Result<ControlHandle, PanelError> {
    let Some(tree) = tree else {
        return Err(PanelError::NotReady("button container has not been built"));
    };
    if label.trim().is_empty() {
        return Err(PanelError::EmptyLabel);
    }
    let node = tree.spawn_button(&format!("Button_{label}"), button_size(params));
    tree.insert_label(node, Label::new(label, BUTTON_FONT_SIZE).bold());
    let base = color.unwrap_or(DEFAULT_ACCENT);
    registry.attach(tree, input, node, label, base, ControlAction::Callback(on_activate));
    log::debug!("[controls] created button '{label}' node={}", node.index());
    Ok(ControlHandle { node, label: label.to_string() })
}

/// Size of a stacked button: height only when the width is delegated to the container.
pub fn button_size(params: &PanelParams) -> SizeSpec {
    if params.stretch_buttons() {
        SizeSpec::stretched(params.button_height)
    } else {
        SizeSpec::new(params.button_width, params.button_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InputDispatch;
    use std::cell::Cell;
    use std::rc::Rc;

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn palette_blends_toward_white_and_darkens() {
        let palette = ControlPalette::from_base(Vec4::new(0.2, 0.6, 1.0, 1.0));
        assert!(approx(palette.hovered, Vec4::new(0.52, 0.76, 1.0, 1.0)));
        assert!(approx(palette.pressed, Vec4::new(0.14, 0.42, 0.7, 1.0)));
    }

    #[test]
    fn enter_then_exit_returns_to_idle() {
        let mut machine = ControlMachine::default();
        machine.handle(PointerEvent::Enter);
        assert_eq!(machine.state(), ControlState::Hovered);
        machine.handle(PointerEvent::Exit);
        assert_eq!(machine.state(), ControlState::Idle);
    }

    #[test]
    fn release_while_hovered_returns_to_hovered() {
        let mut machine = ControlMachine::default();
        machine.handle(PointerEvent::Enter);
        machine.handle(PointerEvent::Press);
        assert_eq!(machine.state(), ControlState::Pressed);
        assert!(machine.handle(PointerEvent::Release));
        assert_eq!(machine.state(), ControlState::Hovered);
    }

    #[test]
    fn release_after_exit_returns_to_idle() {
        let mut machine = ControlMachine::default();
        machine.handle(PointerEvent::Enter);
        machine.handle(PointerEvent::Press);
        machine.handle(PointerEvent::Exit);
        assert_eq!(machine.state(), ControlState::Pressed, "held controls stay pressed");
        assert!(machine.handle(PointerEvent::Release));
        assert_eq!(machine.state(), ControlState::Idle);
    }

    #[test]
    fn release_without_press_is_not_a_click() {
        let mut machine = ControlMachine::default();
        assert!(!machine.handle(PointerEvent::Release));
    }

    #[test]
    fn create_button_requires_a_built_tree() {
        let mut registry = ControlRegistry::new();
        let input = InputDispatch::new().scope();
        let params = PanelParams::default();
        let err =
            create_button(None, &mut registry, &input, &params, "OK", Box::new(|| {}), None).unwrap_err();
        assert!(err.is_not_ready());
        assert!(registry.is_empty());
    }

    #[test]
    fn click_runs_callback_and_repaints() {
        let params = PanelParams { button_width: 120.0, ..PanelParams::default() };
        let mut tree = WidgetTree::build(&params, "Controls");
        let mut registry = ControlRegistry::new();
        let input = InputDispatch::new().scope();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let handle = create_button(
            Some(&mut tree),
            &mut registry,
            &input,
            &params,
            "GO",
            Box::new(move || counter.set(counter.get() + 1)),
            None,
        )
        .expect("button created");
        let node = handle.node();
        assert_eq!(tree.size(node), Some(SizeSpec::new(120.0, 100.0)));
        assert!(input.is_registered(node));

        let palette = registry.palette(node).expect("palette");
        registry.handle(&mut tree, node, PointerEvent::Enter);
        assert_eq!(tree.fill(node), Some(palette.hovered));
        let pressed = registry.handle(&mut tree, node, PointerEvent::Press);
        assert_eq!(pressed.state, Some(ControlState::Pressed));
        assert_eq!(pressed.activation, None);
        assert_eq!(tree.fill(node), Some(palette.pressed));
        let outcome = registry.handle(&mut tree, node, PointerEvent::Release);
        let expected = ControlOutcome {
            label: "GO".to_string(),
            state: Some(ControlState::Hovered),
            activation: Some(Activation::Clicked),
        };
        assert_eq!(outcome, expected);
        assert_eq!(clicks.get(), 1);
        assert_eq!(tree.fill(node), Some(palette.hovered));

        assert_eq!(registry.clear(), 1);
        assert!(!input.is_registered(node));
    }

    #[test]
    fn blank_labels_are_rejected() {
        let mut tree = WidgetTree::build(&PanelParams::default(), "Controls");
        let mut registry = ControlRegistry::new();
        let input = InputDispatch::new().scope();
        let err = create_button(
            Some(&mut tree),
            &mut registry,
            &input,
            &PanelParams::default(),
            "  ",
            Box::new(|| {}),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::EmptyLabel));
        assert!(tree.buttons().is_empty());
    }

    #[test]
    fn release_on_actionless_control_still_reports_state() {
        let mut tree = WidgetTree::build(&PanelParams::default(), "Controls");
        let mut registry = ControlRegistry::new();
        let input = InputDispatch::new().scope();
        let node = tree.spawn(crate::widget::WidgetKind::InputField, "Field", tree.container());
        registry.attach(&mut tree, &input, node, "Field", DEFAULT_ACCENT, ControlAction::None);

        registry.handle(&mut tree, node, PointerEvent::Press);
        let outcome = registry.handle(&mut tree, node, PointerEvent::Release);
        assert_eq!(outcome.state, Some(ControlState::Idle));
        assert_eq!(outcome.activation, None);
        assert!(registry.handle(&mut tree, node, PointerEvent::Release).is_unchanged());
        assert!(registry.handle(&mut tree, Entity::PLACEHOLDER, PointerEvent::Enter).is_unchanged());
    }
}
