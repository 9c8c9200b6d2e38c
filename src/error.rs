use std::fmt;

/// The category of a [`PhcError`]. Callers can match on this to tell structural problems
/// apart from parameter or base64 problems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The string is not shaped like a PHC string (missing leading `$`, empty segment,
    /// too many segments), or a hash is encoded without a salt
    InvalidStructure,

    /// A function name contains characters outside `[a-z0-9-]` or has an invalid length
    InvalidFunctionName,

    /// A parameter name contains characters outside `[a-z0-9-]` or has an invalid length
    InvalidParameterName,

    /// A parameter value contains characters outside `[a-zA-Z0-9/+.-]` or has an invalid
    /// length
    InvalidParameterValue,

    /// A parameter token has no `=`
    MissingParameterValue,

    /// A parameter that the schema requires is absent
    NonOptionalParameterMissing,

    /// A parameter value was rejected by its validator
    ParameterValueValidation,

    /// The function name is not one the schema accepts
    MismatchedFunctionName,

    /// A parameter does not line up with any remaining schema parameter
    UnmatchedParameterName,

    /// The salt or hash is not valid base64
    Base64Decode,

    /// The output sink refused a write while encoding
    Write,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidStructure => "invalid phc syntax",
            ErrorKind::InvalidFunctionName => "invalid function name",
            ErrorKind::InvalidParameterName => "invalid parameter name",
            ErrorKind::InvalidParameterValue => "invalid parameter value",
            ErrorKind::MissingParameterValue => "no value for parameter given",
            ErrorKind::NonOptionalParameterMissing => "non optional parameter is missing",
            ErrorKind::ParameterValueValidation => "validation of parameter failed",
            ErrorKind::MismatchedFunctionName => "mismatched function name",
            ErrorKind::UnmatchedParameterName => "unmatched parameter parsed",
            ErrorKind::Base64Decode => "error decoding base64",
            ErrorKind::Write => "error writing phc string",
        };

        f.write_str(s)
    }
}

/// The underlying failure a [`PhcError`] was raised for, if any
#[derive(Debug, PartialEq, Eq)]
pub enum Cause {
    /// Failure of the decimal parser
    Decimal(DecimalError),

    /// Failure of the base64 codec
    Base64(Base64Error),

    /// Failure of a parameter validator
    Validation(ValidationError),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Decimal(e) => e.fmt(f),
            Cause::Base64(e) => e.fmt(f),
            Cause::Validation(e) => e.fmt(f),
        }
    }
}

/// Errors that may occur while decoding or encoding a PHC string
#[derive(Debug, PartialEq, Eq)]
pub struct PhcError {
    kind: ErrorKind,
    message: String,
    cause: Option<Box<Cause>>,
}

impl PhcError {
    pub(crate) fn new<M: Into<String>>(kind: ErrorKind, message: M) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub(crate) fn with_cause<M: Into<String>>(kind: ErrorKind, message: M, cause: Cause) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The category of the error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// A description naming the offending segment or parameter
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The wrapped failure, if one caused this error
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_deref()
    }
}

impl std::error::Error for PhcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.cause.as_deref() {
            Some(Cause::Decimal(e)) => Some(e),
            Some(Cause::Base64(e)) => Some(e),
            Some(Cause::Validation(e)) => Some(e),
            None => None,
        }
    }
}

impl fmt::Display for PhcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid phc format: {}: {}", self.kind, self.message)?;

        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }

        Ok(())
    }
}

/// Errors from parsing a PHC decimal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecimalError {
    /// The input was empty
    Empty,

    /// The input has leading zeros, a `+` sign or `-0`
    NonMinimal(String),

    /// The input is not a decimal number at all
    Malformed(String),

    /// The number does not fit the target integer type
    OutOfRange(String),
}

impl std::error::Error for DecimalError {}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::Empty => write!(f, "DecimalError: Empty input"),
            DecimalError::NonMinimal(s) => {
                write!(f, "DecimalError: \"{}\" is not the minimal decimal encoding", s)
            }
            DecimalError::Malformed(s) => write!(f, "DecimalError: \"{}\" isn't a valid decimal", s),
            DecimalError::OutOfRange(s) => {
                write!(f, "DecimalError: \"{}\" is out of range for the target type", s)
            }
        }
    }
}

/// Errors from decoding PHC base64
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Base64Error {
    /// The input length is 1 mod 4, which no byte sequence encodes to
    InvalidLength(usize),

    /// A character outside `[A-Za-z0-9+/]` was found
    InvalidByte {
        /// Position of the character in the input
        offset: usize,
        /// The offending character
        byte: u8,
    },

    /// Strict decoding found non-zero bits past the last full byte
    NonZeroTrailingBits {
        /// Position of the last symbol in the input
        offset: usize,
    },

    /// Any other decoder failure
    Malformed,
}

impl std::error::Error for Base64Error {}

impl fmt::Display for Base64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base64Error::InvalidLength(len) => {
                write!(f, "Base64Error: Got a string of length {} (mod 4 == 1)", len)
            }
            Base64Error::InvalidByte { offset, byte } => write!(
                f,
                "Base64Error: Invalid character {:?} at offset {}",
                *byte as char, offset
            ),
            Base64Error::NonZeroTrailingBits { offset } => write!(
                f,
                "Base64Error: Unprocessed bits of symbol at offset {} are not zero",
                offset
            ),
            Base64Error::Malformed => write!(f, "Base64Error: Malformed input"),
        }
    }
}

/// A parameter value or an algorithm parameter set was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Create a new error with the given description
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self(message.into())
    }
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidationError: {}", self.0)
    }
}

impl From<DecimalError> for Cause {
    fn from(e: DecimalError) -> Self {
        Cause::Decimal(e)
    }
}

impl From<Base64Error> for Cause {
    fn from(e: Base64Error) -> Self {
        Cause::Base64(e)
    }
}

impl From<ValidationError> for Cause {
    fn from(e: ValidationError) -> Self {
        Cause::Validation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_with_and_without_cause() {
        let err = PhcError::new(ErrorKind::InvalidStructure, "phc string must begin with \"$\"");
        assert_eq!(
            err.to_string(),
            "invalid phc format: invalid phc syntax: phc string must begin with \"$\""
        );
        assert!(err.source().is_none());

        let err = PhcError::with_cause(
            ErrorKind::Base64Decode,
            "salt",
            Base64Error::InvalidLength(5).into(),
        );
        assert_eq!(
            err.to_string(),
            "invalid phc format: error decoding base64: salt: Base64Error: Got a string of length 5 (mod 4 == 1)"
        );
        assert!(err.source().is_some());
        assert_eq!(err.cause(), Some(&Cause::Base64(Base64Error::InvalidLength(5))));
    }
}
