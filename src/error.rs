#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("particle count must be at least 1")]
    NoParticles,

    #[error("point cloud must hold at least 1 point")]
    NoPoints,

    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("invalid range for {name}: [{min}, {max})")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
}

/// Reasons an engine could not be mounted. All of them are non-fatal: the
/// affected background is simply left out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MountError {
    #[error("element not found: #{0}")]
    ElementMissing(String),

    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("3d rendering unavailable: {0}")]
    RendererUnavailable(String),

    #[error("event subscription failed: {0}")]
    Subscription(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
