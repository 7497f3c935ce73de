/// Failure categories shared by the training pipeline, the forecast query and
/// the serving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source set contained no usable records.
    NoData,
    /// A timestamp, date, time, number or request body could not be parsed.
    MalformedInput,
    /// A zone has no fitted model, or a required artifact is missing.
    NotFound,
    /// Statistical estimation failed for a series.
    ModelFit,
    /// A caller-supplied parameter is out of range.
    InvalidParameter,
    /// Filesystem or network failure.
    Io,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::NoData => "no-data",
            ErrorKind::MalformedInput => "malformed-input",
            ErrorKind::NotFound => "not-found",
            ErrorKind::ModelFit => "model-fit",
            ErrorKind::InvalidParameter => "invalid-parameter",
            ErrorKind::Io => "io",
        }
    }

    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidParameter | ErrorKind::MalformedInput => 2,
            ErrorKind::NoData => 3,
            ErrorKind::ModelFit => 4,
            ErrorKind::NotFound => 5,
            ErrorKind::Io => 6,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
