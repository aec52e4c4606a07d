use crate::registry::Registry;
use crate::settings::SessionSettings;

/// A derivation session.
///
/// Owns the [`Registry`] of every entity created during the derivation, together with the
/// settings that determine how labels are composed. All constructors of forms, scalars, time
/// sequences and arrays are methods on `Session`, and all ids handed out by a session are only
/// meaningful to that session. Independent sessions never share labels.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) registry: Registry,
    pub(crate) settings: SessionSettings,
}

impl Session {
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            registry: Registry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
