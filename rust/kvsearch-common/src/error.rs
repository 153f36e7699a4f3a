use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` when the error was caused by the request itself and
    /// the caller can correct it; every other kind is an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedQuery { .. }
                | ErrorKind::QueryTooLong { .. }
                | ErrorKind::TooManyTerms { .. }
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn truncated(element: impl Into<String>, offset: usize, needed: usize, len: usize) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: format!("need {needed} bytes at offset {offset}, buffer holds {len}"),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn malformed_query(query: impl Into<String>) -> Error {
        Error(
            ErrorKind::MalformedQuery {
                query: query.into(),
            }
            .into(),
        )
    }

    pub fn query_too_long(len: usize, max: usize) -> Error {
        Error(ErrorKind::QueryTooLong { len, max }.into())
    }

    pub fn too_many_terms(count: usize, max: usize) -> Error {
        Error(ErrorKind::TooManyTerms { count, max }.into())
    }

    pub fn format_specifier(specifier: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::FormatSpecifier {
                specifier: specifier.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn engine_failure(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::EngineFailure {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn lookup_inconsistency(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::LookupInconsistency {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn store<E>(key: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Store {
                key: key.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid binary format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("Malformed query")]
    MalformedQuery { query: String },

    #[error("Query too long")]
    QueryTooLong { len: usize, max: usize },

    #[error("Too many terms")]
    TooManyTerms { count: usize, max: usize },

    #[error("format specifier \"{specifier}\": {message}")]
    FormatSpecifier { specifier: String, message: String },

    #[error("query engine failure: {message}")]
    EngineFailure { message: String },

    #[error("lookup inconsistency: {message}")]
    LookupInconsistency { message: String },

    #[error("store error for key '{key}': {source}")]
    Store { key: String, source: StdErrorBoxed },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json { source: serde_json::Error },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        ErrorKind::Json { source }.into()
    }
}
