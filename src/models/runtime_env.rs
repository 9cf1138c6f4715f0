//! # Runtime Environment Descriptor
//!
//! Describes the execution environment a job or actor was admitted with. The
//! only field this crate cares about is the working-directory URI: it names
//! the shared code bundle the owner references for its lifetime.

use serde::{Deserialize, Serialize};

/// Runtime environment attached to a job or actor at admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEnv {
    /// Content/location URI of the working directory bundle, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl RuntimeEnv {
    pub fn new(working_dir: impl Into<String>) -> Self {
        Self {
            working_dir: Some(working_dir.into()),
        }
    }

    /// The package identity this environment references.
    ///
    /// An unset or empty working directory means the owner has no package
    /// dependency at all.
    pub fn package_identity(&self) -> Option<&str> {
        match self.working_dir.as_deref() {
            Some("") | None => None,
            some => some,
        }
    }
}
