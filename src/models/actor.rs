use serde::{Deserialize, Serialize};

use crate::models::runtime_env::RuntimeEnv;

/// Lifecycle states an actor moves through on the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    DependenciesUnready,
    Alive,
    Restarting,
    Dead,
}

impl ActorState {
    /// Terminal states are excluded from reference reconstruction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActorState::Dead)
    }
}

/// Snapshot record of an actor known to the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
    pub actor_id: String,
    pub state: ActorState,
    pub runtime_env: RuntimeEnv,
}

impl ActorRecord {
    pub fn new(actor_id: impl Into<String>, state: ActorState, runtime_env: RuntimeEnv) -> Self {
        Self {
            actor_id: actor_id.into(),
            state,
            runtime_env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_dead_is_terminal() {
        assert!(ActorState::Dead.is_terminal());
        assert!(!ActorState::Alive.is_terminal());
        assert!(!ActorState::Restarting.is_terminal());
        assert!(!ActorState::DependenciesUnready.is_terminal());
    }
}
