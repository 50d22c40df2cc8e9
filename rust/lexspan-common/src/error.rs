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

    /// Returns `true` for errors raised while assembling a query tree,
    /// as opposed to failures that happen during iteration.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidArgument { .. }
                | ErrorKind::FieldMismatch { .. }
                | ErrorKind::InvalidRange { .. }
                | ErrorKind::UnknownCondition { .. }
                | ErrorKind::InvalidClassNumber { .. }
                | ErrorKind::InvalidPattern { .. }
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

    pub fn field_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
        Error(
            ErrorKind::FieldMismatch {
                expected: expected.into(),
                actual: actual.into(),
            }
            .into(),
        )
    }

    pub fn invalid_range(name: impl Into<String>, min: i64, max: i64) -> Error {
        Error(
            ErrorKind::InvalidRange {
                name: name.into(),
                min,
                max,
            }
            .into(),
        )
    }

    pub fn unknown_condition(kind: &'static str, name: impl Into<String>) -> Error {
        Error(
            ErrorKind::UnknownCondition {
                kind,
                name: name.into(),
            }
            .into(),
        )
    }

    pub fn invalid_class_number(value: i64, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidClassNumber {
                value,
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_pattern(pattern: impl Into<String>, source: StdErrorBoxed) -> Error {
        Error(
            ErrorKind::InvalidPattern {
                pattern: pattern.into(),
                source,
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
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

    pub fn source<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Source {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("field mismatch: expected '{expected}', found '{actual}'")]
    FieldMismatch { expected: String, actual: String },

    #[error("invalid range for {name}: min {min} > max {max}")]
    InvalidRange { name: String, min: i64, max: i64 },

    #[error("unknown {kind} '{name}'")]
    UnknownCondition { kind: &'static str, name: String },

    #[error("invalid class number {value}: {message}")]
    InvalidClassNumber { value: i64, message: String },

    #[error("invalid term pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        source: StdErrorBoxed,
    },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("position source error: {context}")]
    Source {
        context: String,
        source: StdErrorBoxed,
    },
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_errors_are_classified() {
        assert!(Error::field_mismatch("tokens", "base").is_construction_error());
        assert!(Error::invalid_range("distance", 3, 1).is_construction_error());
        assert!(Error::unknown_condition("relation", "around").is_construction_error());
        assert!(!Error::invalid_operation("next").is_construction_error());
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        assert!(!Error::from(io).is_construction_error());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::invalid_range("repetition", 4, 2);
        assert_eq!(err.to_string(), "invalid range for repetition: min 4 > max 2");
        let err = Error::field_mismatch("tokens", "lemma");
        assert_eq!(
            err.to_string(),
            "field mismatch: expected 'tokens', found 'lemma'"
        );
    }
}
