pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no variety with id '{0}'")]
    VarietyNotFound(String),
    #[error("no {kind} with id '{id}' on this variety")]
    ChildNotFound { kind: &'static str, id: String },
    #[error("a note needs some content")]
    EmptyNote,
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("unknown {kind} '{value}'")]
    UnknownChoice { kind: &'static str, value: String },
    #[error("the file is not valid JSON: {0}")]
    ImportParse(#[source] serde_json::Error),
    #[error("invalid file format: expected a list of varieties")]
    ImportNotAnArray,
    #[error("storage write failed: {0}")]
    Storage(String),
    #[error("there was an i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid image file: {0}")]
    InvalidImage(#[from] image::ImageError),
    #[error("image processing task failed")]
    ImageTask,
}
