//! Errors raised by component storage and the entity graph

use thiserror::Error;

use super::ComponentType;

/// Component and entity errors
#[derive(Error, Debug)]
pub enum EcsError {
    /// The component registry has been shut down
    #[error("Component registry has been shut down")]
    RegistryShutdown,

    /// Growing a component block failed
    #[error("Failure allocating data for {component} block ({requested} slots)")]
    AllocationFailed {
        /// Block that failed to grow
        component: ComponentType,
        /// Slot count that was requested
        requested: usize,
    },

    /// A handle no longer refers to a live component
    #[error("Stale or invalid {0} component handle")]
    InvalidHandle(ComponentType),

    /// An entity key no longer refers to a live entity
    #[error("Entity does not exist")]
    InvalidEntity,

    /// Entities may only carry one Transform
    #[error("Entity already has a Transform component")]
    DuplicateTransform,

    /// Parenting would create a cycle
    #[error("Entity cannot become a child of itself or of its descendants")]
    HierarchyCycle,

    /// Entity list index out of range
    #[error("Entity index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// Component data could not be serialized or deserialized
    #[error("Component data error: {0}")]
    Data(#[from] serde_json::Error),

    /// An external resource could not be released
    #[error("Failed to release {resource}: {reason}")]
    ResourceRelease {
        /// Resource description
        resource: String,
        /// Failure reason
        reason: String,
    },
}
