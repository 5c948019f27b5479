use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// The byte stream is desynchronized from what the reader expects.
    pub fn protocol(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Protocol {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_cast(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidCast {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn overflow(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Overflow {
                message: message.into(),
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

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn not_supported(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::NotSupported {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self.kind(), ErrorKind::Protocol { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("protocol error: {message}")]
    Protocol { message: String },

    #[error("invalid cast: {message}")]
    InvalidCast { message: String },

    #[error("overflow: {message}")]
    Overflow { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("not supported: {message}")]
    NotSupported { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Error::invalid_cast(format!("string is not valid UTF-8: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_roundtrip() {
        let e = Error::overflow("value must be within [0, 65535]");
        assert!(matches!(e.kind(), ErrorKind::Overflow { .. }));
        assert!(e.to_string().contains("[0, 65535]"));
        match e.into_kind() {
            ErrorKind::Overflow { message } => assert!(message.starts_with("value")),
            _ => panic!("unexpected kind"),
        }
    }

    #[test]
    fn test_protocol_predicate() {
        assert!(Error::protocol("bad mode").is_protocol());
        assert!(!Error::invalid_operation("end_read").is_protocol());
    }

    #[test]
    fn test_conversions() {
        let bytes = vec![0xC3u8, 0x28];
        let e: Error = std::str::from_utf8(&bytes).unwrap_err().into();
        assert!(matches!(e.kind(), ErrorKind::InvalidCast { .. }));
        let e: Error = ErrorKind::NotSupported {
            message: "LowCardinality".into(),
        }
        .into();
        assert_eq!(e.to_string(), "not supported: LowCardinality");
    }
}
