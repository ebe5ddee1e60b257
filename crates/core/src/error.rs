use crate::{JointAngleName, PoseType};

/// Result alias that carries the custom [`NatyaError`] type.
pub type Result<T> = std::result::Result<T, NatyaError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum NatyaError {
    /// The frame carries no usable skeleton for the joint topology.
    #[error("pose landmarks are unavailable for this frame")]
    LandmarksUnavailable,
    /// A reference profile is missing one of the seven joint targets.
    #[error("reference for {pose} has no target angle for `{joint}`")]
    MissingReferenceAngle {
        pose: PoseType,
        joint: JointAngleName,
    },
    /// A pose label that is not part of the stance catalog.
    #[error("unknown pose type `{0}`")]
    UnknownPose(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Free-form message, mostly used for lock poisoning.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl NatyaError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
