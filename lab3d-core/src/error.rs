use thiserror::Error;

pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors raised while building or loading a scene.
///
/// The transform math itself cannot fail; everything here comes from scene
/// descriptions and configuration.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("line {line}: syntax error near `{near}`")]
    Syntax { line: usize, near: String },

    #[error("line {line}: unknown statement `{keyword}`")]
    UnknownStatement { line: usize, keyword: String },

    #[error("line {line}: unknown attribute `{attribute}` for `{keyword}`")]
    UnknownAttribute {
        line: usize,
        keyword: String,
        attribute: String,
    },

    #[error("line {line}: `{attribute}` expects {expected}")]
    BadValue {
        line: usize,
        attribute: String,
        expected: &'static str,
    },

    #[error("line {line}: `{keyword}` needs {missing}")]
    Missing {
        line: usize,
        keyword: String,
        missing: &'static str,
    },

    #[error("line {line}: {kind} `{name}` is already defined")]
    Duplicate {
        line: usize,
        kind: &'static str,
        name: String,
    },

    #[error("line {line}: no mesh named `{name}`")]
    UnknownMesh { line: usize, name: String },

    #[error("line {line}: no model named `{name}`")]
    UnknownModel { line: usize, name: String },

    #[error("mesh index {0} is out of range")]
    MeshOutOfRange(usize),

    #[error("model index {0} is out of range")]
    ModelOutOfRange(usize),

    #[error("invalid projection: {0}")]
    InvalidProjection(&'static str),

    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
}
