use crate::config::{PanelConfig, PanelParams};
use crate::confirmation::{seed_text, ConfirmationWorkflow, Status};
use crate::controls::{
    create_button, Activation, ControlHandle, ControlRegistry, ControlState, DEFAULT_ACCENT,
};
use crate::dispatch::{InputScope, PointerEvent};
use crate::error::PanelError;
use crate::events::{EventBus, PanelEvent};
use crate::host::{HostEnvironment, RaycasterProvider};
use crate::layout::{self, LayoutSnapshot};
use crate::placement::{pose_for, Viewpoint};
use crate::raycast::{PanelRaycaster, PlaneRaycaster, Ray, TRACKED_DEVICE_RAYCASTER};
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::surface::RenderSurface;
use crate::widget::WidgetTree;
use bevy_ecs::prelude::Entity;
use glam::Vec4;

/// Buttons every panel starts with, in stacking order.
pub const DEFAULT_BUTTONS: [(&str, Vec4); 3] = [
    ("CONFIRM", DEFAULT_ACCENT),
    ("CANCEL", Vec4::new(0.7, 0.7, 0.7, 1.0)),
    ("APPLY", Vec4::new(0.3, 0.7, 0.3, 1.0)),
];

/// Owns one floating panel from startup to teardown.
///
/// The controller is driven by the host: `startup` once, then `apply_params`,
/// `set_viewpoint`, `pointer_ray`/`process_input` and `flush` as the frame loop sees fit.
/// Dropping it tears the panel down.
pub struct PanelController {
    config: PanelConfig,
    params: PanelParams,
    tree: Option<WidgetTree>,
    registry: ControlRegistry,
    input: Option<InputScope>,
    raycaster: Option<Box<dyn PanelRaycaster>>,
    reconciler: Reconciler,
    workflow: Option<ConfirmationWorkflow>,
    viewpoint: Option<Viewpoint>,
    events: EventBus,
    hovered: Option<Entity>,
    pressed: Option<Entity>,
    pointer_down: bool,
    started: bool,
}

impl Default for PanelController {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}

impl PanelController {
    pub fn new(config: PanelConfig) -> Self {
        let params = config.layout;
        Self {
            config,
            params,
            tree: None,
            registry: ControlRegistry::new(),
            input: None,
            raycaster: None,
            reconciler: Reconciler::new(),
            workflow: None,
            viewpoint: None,
            events: EventBus::default(),
            hovered: None,
            pressed: None,
            pointer_down: false,
            started: false,
        }
    }

    /// Builds the panel against the host environment. A second call does nothing.
    pub fn startup(&mut self, host: &mut HostEnvironment) {
        if self.started {
            log::warn!("[panel] startup called more than once; ignoring");
            return;
        }
        self.started = true;

        let input = host.ensure_input_dispatch().scope();
        let raycaster = resolve_raycaster(host);
        log::info!("[panel] using '{}' raycaster", raycaster.name());
        self.raycaster = Some(raycaster);

        let mut tree = WidgetTree::build(&self.params, &self.config.title);
        if self.viewpoint.is_none() {
            self.viewpoint = host.viewpoint();
        }
        match self.viewpoint {
            Some(viewpoint) => {
                tree.set_pose(pose_for(&viewpoint, self.params.view_distance));
            }
            None => {
                let err = PanelError::Configuration("no viewpoint available; panel left unplaced".into());
                log::error!("[panel] {err}");
            }
        }

        let seed = seed_text(host.tracking(), host.settings(), &self.config.default_server_url);
        self.workflow = Some(ConfirmationWorkflow::build(&mut tree, &mut self.registry, &input, seed));
        self.tree = Some(tree);
        self.input = Some(input);

        for (label, color) in DEFAULT_BUTTONS {
            let added = self.add_button(label, move || log::info!("[panel] {label} pressed"), Some(color));
            if let Err(err) = added {
                log::error!("[panel] failed to create default button '{label}': {err}");
            }
        }
        self.reconciler.seed(self.params);

        if !self.config.show_on_start {
            if let Some(tree) = self.tree.as_mut() {
                tree.set_visible(false);
            }
        }
        log::info!(
            "[panel] started with {} controls (visible={})",
            self.registry.len(),
            self.is_visible()
        );
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_visible(&self) -> bool {
        self.tree.as_ref().is_some_and(WidgetTree::is_visible)
    }

    pub fn tree(&self) -> Option<&WidgetTree> {
        self.tree.as_ref()
    }

    pub fn params(&self) -> &PanelParams {
        &self.params
    }

    pub fn control_state(&self, node: Entity) -> Option<ControlState> {
        self.registry.state(node)
    }

    /// Field, confirm control and status label of the input row.
    pub fn input_row(&self) -> Option<(Entity, Entity, Entity)> {
        self.workflow
            .as_ref()
            .map(|workflow| (workflow.field(), workflow.confirm_control(), workflow.status_label()))
    }

    /// This panel's scope in the host's dispatch context. Pointer events for the panel's
    /// nodes are sent through it.
    pub fn input_scope(&self) -> Option<&InputScope> {
        self.input.as_ref()
    }

    pub fn raycaster_name(&self) -> Option<&'static str> {
        self.raycaster.as_ref().map(|raycaster| raycaster.name())
    }

    /// Shows the panel under `title`, or under the configured title when none is given.
    pub fn show_panel(&mut self, title: Option<&str>) -> Result<(), PanelError> {
        let tree = self.tree.as_mut().ok_or(PanelError::NotReady("panel has not been built"))?;
        let title_bar = tree.title();
        let retitled = tree.set_label_text(title_bar, title.unwrap_or(&self.config.title));
        let shown = tree.set_visible(true);
        if shown || retitled || title.is_some() {
            let title = tree.label(tree.title()).map(|label| label.text.clone()).unwrap_or_default();
            log::info!("[panel] shown: {title}");
            self.events.push(PanelEvent::Shown { title });
        }
        Ok(())
    }

    /// Hides the panel. Nodes survive; pointer input is ignored until it is shown again.
    pub fn hide_panel(&mut self) {
        let Some(tree) = self.tree.as_mut() else {
            log::debug!("[panel] hide requested before startup");
            return;
        };
        if !tree.set_visible(false) {
            return;
        }
        self.registry.reset(tree);
        self.hovered = None;
        self.pressed = None;
        self.pointer_down = false;
        log::info!("[panel] hidden");
        self.events.push(PanelEvent::Hidden);
    }

    pub fn add_button(
        &mut self,
        label: &str,
        on_activate: impl FnMut() + 'static,
        color: Option<Vec4>,
    ) -> Result<ControlHandle, PanelError> {
        let input = self.input.as_ref().ok_or(PanelError::NotReady("panel has not been started"))?;
        create_button(
            self.tree.as_mut(),
            &mut self.registry,
            input,
            &self.params,
            label,
            Box::new(on_activate),
            color,
        )
    }

    /// Applies a new parameter set, touching only the groups that drifted.
    ///
    /// Before startup the values are simply taken as the build parameters.
    pub fn apply_params(&mut self, params: PanelParams) -> Result<ReconcileReport, PanelError> {
        params.validate()?;
        self.params = params;
        let Some(tree) = self.tree.as_mut() else {
            return Ok(ReconcileReport::default());
        };
        Ok(self.reconciler.reconcile(&params, tree, self.viewpoint.as_ref()))
    }

    /// Records the host's viewpoint, re-placing the panel when it moved.
    pub fn set_viewpoint(&mut self, viewpoint: Viewpoint) -> bool {
        if self.viewpoint == Some(viewpoint) {
            return false;
        }
        self.viewpoint = Some(viewpoint);
        match self.tree.as_mut() {
            Some(tree) => tree.set_pose(pose_for(&viewpoint, self.params.view_distance)),
            None => false,
        }
    }

    /// Routes queued pointer events to their controls. Returns how many were handled.
    pub fn process_input(&mut self, host: &mut HostEnvironment) -> usize {
        let Some(queued) = self.input.as_ref().map(InputScope::drain) else {
            return 0;
        };
        if !self.is_visible() {
            if !queued.is_empty() {
                log::debug!("[panel] dropped {} pointer events while hidden", queued.len());
            }
            return 0;
        }
        let handled = queued.len();
        for (node, event) in queued {
            self.route(host, node, event);
        }
        handled
    }

    fn route(&mut self, host: &mut HostEnvironment, node: Entity, event: PointerEvent) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        let outcome = self.registry.handle(tree, node, event);
        if let Some(state) = outcome.state {
            let label = outcome.label.clone();
            self.events.push(PanelEvent::ControlStateChanged { node, label, state });
        }
        match outcome.activation {
            Some(Activation::Clicked) => {
                log::info!("[panel] button '{}' activated", outcome.label);
                self.events.push(PanelEvent::ButtonActivated { node, label: outcome.label });
            }
            Some(Activation::ConfirmRequested) => {
                // The result is reported through events and the status label.
                let _ = self.confirm_input(host);
            }
            None => {}
        }
    }

    /// Feeds a world-space pointer ray and button state, translating it into per-node
    /// enter/exit/press/release events.
    pub fn pointer_ray(&mut self, host: &mut HostEnvironment, ray: &Ray, button_down: bool) -> usize {
        let (Some(tree), Some(raycaster), Some(input)) =
            (self.tree.as_ref(), self.raycaster.as_ref(), self.input.as_ref())
        else {
            return 0;
        };
        if !tree.is_visible() {
            return 0;
        }

        let target = raycaster
            .project(ray, &tree.transform())
            .and_then(|point| layout::resolve(tree).hit_test(tree, point));
        if target != self.hovered {
            if let Some(previous) = self.hovered {
                input.send(previous, PointerEvent::Exit);
            }
            if let Some(next) = target {
                input.send(next, PointerEvent::Enter);
            }
            self.hovered = target;
        }
        if button_down && !self.pointer_down {
            if let Some(node) = target {
                input.send(node, PointerEvent::Press);
                self.pressed = Some(node);
            }
        } else if !button_down && self.pointer_down {
            if let Some(node) = self.pressed.take() {
                input.send(node, PointerEvent::Release);
            }
        }
        self.pointer_down = button_down;
        self.process_input(host)
    }

    pub fn set_input_text(&mut self, text: &str) -> Result<(), PanelError> {
        match (self.workflow.as_mut(), self.tree.as_mut()) {
            (Some(workflow), Some(tree)) => {
                workflow.set_text(tree, text);
                Ok(())
            }
            _ => Err(PanelError::NotReady("input field has not been built")),
        }
    }

    pub fn input_text(&self) -> Option<&str> {
        self.workflow.as_ref().map(ConfirmationWorkflow::text)
    }

    pub fn status(&self) -> Option<&Status> {
        self.workflow.as_ref().and_then(ConfirmationWorkflow::status)
    }

    /// Runs the confirm protocol on the current field text, as a click on the confirm
    /// control does.
    pub fn confirm_input(&mut self, host: &mut HostEnvironment) -> Result<String, PanelError> {
        let (Some(workflow), Some(tree)) = (self.workflow.as_mut(), self.tree.as_mut()) else {
            return Err(PanelError::NotReady("input field has not been built"));
        };
        let (tracking, store) = host.confirmation_targets();
        match workflow.confirm(tree, tracking, store) {
            Ok(url) => {
                self.events.push(PanelEvent::ServerUrlCommitted { url: url.clone() });
                Ok(url)
            }
            Err(err) => {
                self.events.push(PanelEvent::ServerUrlRejected { reason: err.to_string() });
                Err(PanelError::from(err))
            }
        }
    }

    /// Hands every pending tree mutation to the renderer. Returns the number submitted.
    pub fn flush(&mut self, surface: &mut dyn RenderSurface) -> usize {
        let Some(tree) = self.tree.as_mut() else {
            return 0;
        };
        let commands = tree.drain_commands();
        let count = commands.len();
        for command in commands {
            surface.submit(command);
        }
        count
    }

    pub fn drain_events(&mut self) -> Vec<PanelEvent> {
        self.events.drain()
    }

    /// Resolved rectangles of the current tree.
    pub fn layout(&self) -> Option<LayoutSnapshot> {
        self.tree.as_ref().map(layout::resolve)
    }

    /// Releases every listener registration and drops the tree.
    pub fn teardown(&mut self) {
        if self.tree.is_none() {
            return;
        }
        let released = self.registry.clear();
        self.workflow = None;
        self.tree = None;
        self.hovered = None;
        self.pressed = None;
        self.pointer_down = false;
        log::info!("[panel] torn down; released {released} listener registrations");
    }
}

impl Drop for PanelController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn resolve_raycaster(host: &HostEnvironment) -> Box<dyn PanelRaycaster> {
    match host.capabilities.get::<RaycasterProvider>(TRACKED_DEVICE_RAYCASTER) {
        Some(provider) => provider(),
        None => {
            log::debug!("[panel] no {TRACKED_DEVICE_RAYCASTER} capability; falling back to plane raycaster");
            Box::new(PlaneRaycaster)
        }
    }
}
