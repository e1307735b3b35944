use super::{Component, ComponentState, WatchcamApp};
use std::collections::HashMap;
use tracing::{debug, warn};

impl WatchcamApp {
    pub(super) async fn set_component_state(&self, component: Component, state: ComponentState) {
        let mut states = self.component_states.lock().await;
        let previous = states.insert(component, state.clone());
        if state == ComponentState::Failed {
            warn!("Component '{}' failed", component.as_str());
        } else {
            debug!(
                "Component '{}' state: {:?} -> {:?}",
                component.as_str(),
                previous,
                state
            );
        }
    }

    pub async fn component_state(&self, component: Component) -> Option<ComponentState> {
        self.component_states.lock().await.get(&component).cloned()
    }

    /// States of every tracked component
    pub async fn component_states(&self) -> HashMap<Component, ComponentState> {
        self.component_states.lock().await.clone()
    }

    /// Whether any tracked component ended in `Failed`
    pub async fn has_failed_component(&self) -> bool {
        self.component_states
            .lock()
            .await
            .values()
            .any(|state| *state == ComponentState::Failed)
    }
}
