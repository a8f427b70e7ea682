use crate::confirmation::TrackingConfigHandle;
use crate::dispatch::InputDispatch;
use crate::placement::Viewpoint;
use crate::raycast::PanelRaycaster;
use crate::settings::{MemorySettings, SettingsStore};
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Optional host features looked up by name at construction time.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: BTreeMap<String, Box<dyn Any>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Any>(&mut self, name: impl Into<String>, capability: T) {
        self.entries.insert(name.into(), Box::new(capability));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Typed lookup; a capability registered under `name` with another type is treated as absent.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(|entry| entry.downcast_ref::<T>())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Raycaster factory published through the capability registry.
pub type RaycasterProvider = Rc<dyn Fn() -> Box<dyn PanelRaycaster>>;

/// Everything the panel needs from the surrounding application.
pub struct HostEnvironment {
    viewpoint: Option<Viewpoint>,
    dispatch: Option<InputDispatch>,
    tracking: Option<TrackingConfigHandle>,
    settings: Box<dyn SettingsStore>,
    pub capabilities: CapabilityRegistry,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnvironment {
    pub fn new() -> Self {
        Self {
            viewpoint: None,
            dispatch: None,
            tracking: None,
            settings: Box::new(MemorySettings::new()),
            capabilities: CapabilityRegistry::new(),
        }
    }

    pub fn with_viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.viewpoint = Some(viewpoint);
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingConfigHandle) -> Self {
        self.tracking = Some(tracking);
        self
    }

    pub fn with_settings(mut self, settings: impl SettingsStore + 'static) -> Self {
        self.settings = Box::new(settings);
        self
    }

    /// Installs a dispatch context the host already owns.
    pub fn with_input_dispatch(mut self, dispatch: InputDispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn viewpoint(&self) -> Option<Viewpoint> {
        self.viewpoint
    }

    pub fn set_viewpoint(&mut self, viewpoint: Viewpoint) {
        self.viewpoint = Some(viewpoint);
    }

    pub fn input_dispatch(&self) -> Option<&InputDispatch> {
        self.dispatch.as_ref()
    }

    /// Returns the environment's dispatch context, creating it if there is none yet.
    pub fn ensure_input_dispatch(&mut self) -> InputDispatch {
        if let Some(existing) = self.input_dispatch() {
            log::debug!("[host] input dispatch context already present");
            return existing.clone();
        }
        log::info!("[host] creating input dispatch context");
        self.dispatch.get_or_insert_with(InputDispatch::new).clone()
    }

    pub fn tracking(&self) -> Option<&TrackingConfigHandle> {
        self.tracking.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn settings_mut(&mut self) -> &mut dyn SettingsStore {
        self.settings.as_mut()
    }

    /// Splits out the pieces the confirm path writes to.
    pub fn confirmation_targets(&mut self) -> (Option<&TrackingConfigHandle>, &mut dyn SettingsStore) {
        (self.tracking.as_ref(), self.settings.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::{TrackedDeviceRaycaster, TRACKED_DEVICE_RAYCASTER};

    #[test]
    fn ensure_input_dispatch_never_creates_a_second_context() {
        let mut host = HostEnvironment::new();
        assert!(host.input_dispatch().is_none());
        let first = host.ensure_input_dispatch();
        let second = host.ensure_input_dispatch();
        assert!(first.same_context(&second));
    }

    #[test]
    fn existing_context_is_reused() {
        let dispatch = InputDispatch::new();
        let mut host = HostEnvironment::new().with_input_dispatch(dispatch.clone());
        assert!(host.ensure_input_dispatch().same_context(&dispatch));
    }

    #[test]
    fn capabilities_are_typed() {
        let mut host = HostEnvironment::new();
        let provider: RaycasterProvider =
            Rc::new(|| -> Box<dyn PanelRaycaster> { Box::new(TrackedDeviceRaycaster::default()) });
        host.capabilities.register(TRACKED_DEVICE_RAYCASTER, provider);
        assert!(host.capabilities.contains(TRACKED_DEVICE_RAYCASTER));
        assert!(host.capabilities.get::<RaycasterProvider>(TRACKED_DEVICE_RAYCASTER).is_some());
        assert!(host.capabilities.get::<u32>(TRACKED_DEVICE_RAYCASTER).is_none());
        assert_eq!(host.capabilities.names().collect::<Vec<_>>(), vec![TRACKED_DEVICE_RAYCASTER]);
    }
}
