use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the geometry editing core.
#[derive(Debug, Error)]
pub enum GeoeditError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Interaction(#[from] InteractionError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometry construction and vertex data.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("{kind} needs at least {min} vertices, got {got}")]
    TooFewVertices {
        kind: &'static str,
        min: usize,
        got: usize,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to triangulation of polygon rings.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("invalid tessellation input: {0}")]
    InvalidInput(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// Errors related to layer and geometry lookup.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("layer not found")]
    LayerNotFound,

    #[error("geometry not found in layer")]
    GeometryNotFound,

    #[error("layer `{name}` is a {kind}, expected a geometry layer")]
    NotAGeometryLayer { name: String, kind: &'static str },
}

/// Errors raised when an interaction is constructed with missing parameters.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("draw interaction must have a shape kind")]
    MissingShapeKind,

    #[error("max vertex count must be at least 1")]
    InvalidVertexCap,

    #[error("interaction not found")]
    NotFound,
}

/// Transient failures while turning a pointer position into a world position.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("camera view-projection matrix is not invertible")]
    SingularProjection,

    #[error("camera produced a non-finite pick ray")]
    InvalidRay,

    #[error("pick ray is parallel to the horizontal plane at z = {0}")]
    ParallelToPlane(f64),

    #[error("no active camera")]
    NoCamera,

    #[error("scene query failed: {0}")]
    Scene(String),
}

/// Errors related to loading the editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for results using [`GeoeditError`].
pub type Result<T> = std::result::Result<T, GeoeditError>;
