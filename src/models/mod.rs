//! # Data Model Layer
//!
//! Record types for the job/actor/package metadata this control-plane
//! fragment consumes. These mirror the wire shape of the external snapshot
//! table service; the crate never persists them itself.

pub mod actor;
pub mod job;
pub mod runtime_env;

pub use actor::{ActorRecord, ActorState};
pub use job::JobRecord;
pub use runtime_env::RuntimeEnv;
