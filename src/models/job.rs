use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::runtime_env::RuntimeEnv;

/// Snapshot record of a driver job known to the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    /// Set once the job's terminal state has been durably recorded.
    pub is_dead: bool,
    pub runtime_env: RuntimeEnv,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(job_id: impl Into<String>, runtime_env: RuntimeEnv) -> Self {
        Self {
            job_id: job_id.into(),
            is_dead: false,
            runtime_env,
            submitted_at: Some(Utc::now()),
        }
    }

    pub fn finished(mut self) -> Self {
        self.is_dead = true;
        self
    }
}
