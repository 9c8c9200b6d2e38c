use crate::base64::Base64Codec;
use crate::error::{ErrorKind, PhcError, ValidationError};

/// Longest function or parameter name the PHC grammar allows
pub const MAX_NAME_LENGTH: usize = 32;

pub(crate) fn is_name_char(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'
}

pub(crate) fn is_value_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'/' || b == b'+' || b == b'.' || b == b'-'
}

/// Returns the first character of `s` not accepted by `f`, if there is one.
pub(crate) fn find_invalid_char(s: &str, f: fn(u8) -> bool) -> Option<char> {
    s.chars().find(|c| !c.is_ascii() || !f(*c as u8))
}

/// How the value of a parameter is checked during decoding.
#[derive(Clone, Copy, Debug, Default)]
pub enum Validator {
    /// The value must be non-empty and consist of `[A-Za-z0-9/+.-]`
    #[default]
    Characters,

    /// Every value is accepted. Used for fields that the algorithm adapters parse and
    /// check themselves, such as decimals.
    Any,

    /// A caller-supplied check
    Custom(fn(&str) -> Result<(), ValidationError>),
}

impl Validator {
    /// Checks `value` against this validator.
    pub fn validate(&self, value: &str) -> Result<(), ValidationError> {
        match self {
            Validator::Characters => {
                if value.is_empty() {
                    return Err(ValidationError::new("parameter value is empty"));
                }

                match find_invalid_char(value, is_value_char) {
                    Some(c) => Err(ValidationError::new(format!(
                        "parameter value contains invalid character \"{}\"",
                        c
                    ))),
                    None => Ok(()),
                }
            }
            Validator::Any => Ok(()),
            Validator::Custom(f) => f(value),
        }
    }
}

/// One named slot of a [`Schema`].
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    name: String,
    default: String,
    optional: bool,
    validator: Validator,
}

impl ParameterDescriptor {
    /// A parameter that must be present in every string.
    pub fn required<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            default: String::new(),
            optional: false,
            validator: Validator::default(),
        }
    }

    /// A parameter that may be left out, in which case `default` is used.
    pub fn optional<N: Into<String>, D: Into<String>>(name: N, default: D) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            optional: true,
            validator: Validator::default(),
        }
    }

    /// Replaces the default character validator.
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// The parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value used when an optional parameter is absent. Never consulted for required
    /// parameters.
    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Whether the parameter may be absent
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The validator applied to values taken from the input
    pub fn value_validator(&self) -> Validator {
        self.validator
    }
}

/// Describes the PHC strings of one hash function: the accepted function names, the
/// parameters in the order they must appear, and how the salt and hash are decoded.
///
/// A `Schema` can't be changed once built, so a single instance (see
/// [`crate::argon2::ARGON2_SCHEMA`] and [`crate::scrypt::SCRYPT_SCHEMA`]) may be shared by any
/// number of threads.
#[derive(Clone, Debug)]
pub struct Schema {
    pub(crate) function_names: Vec<String>,
    pub(crate) descriptors: Vec<ParameterDescriptor>,
    pub(crate) codec: Base64Codec,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The function names this schema accepts
    pub fn function_names(&self) -> &[String] {
        &self.function_names
    }

    /// The parameter descriptors in declaration order
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    /// The codec used for the salt and hash
    pub fn codec(&self) -> Base64Codec {
        self.codec
    }

    /// Whether `name` is one of the accepted function names. The comparison is exact.
    pub fn accepts(&self, name: &str) -> bool {
        self.function_names.iter().any(|n| n == name)
    }
}

/// A builder for a [`Schema`].
#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    function_names: Vec<String>,
    descriptors: Vec<ParameterDescriptor>,
    codec: Base64Codec,
}

impl SchemaBuilder {
    /// Adds an accepted function name.
    pub fn function_name<N: Into<String>>(mut self, name: N) -> Self {
        self.function_names.push(name.into());
        self
    }

    /// Appends a parameter. Parameters must appear in strings in the order they are added
    /// here.
    pub fn parameter(mut self, descriptor: ParameterDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Sets the codec for the salt and hash. Defaults to [`Base64Codec::Strict`].
    pub fn codec(mut self, codec: Base64Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Checks the names against the PHC grammar and builds the schema.
    pub fn build(self) -> Result<Schema, PhcError> {
        if self.function_names.is_empty() {
            return Err(PhcError::new(
                ErrorKind::InvalidFunctionName,
                "schema must accept at least one function name",
            ));
        }

        for name in &self.function_names {
            validate_name(name, ErrorKind::InvalidFunctionName, "function")?;
        }

        for (i, descriptor) in self.descriptors.iter().enumerate() {
            validate_name(&descriptor.name, ErrorKind::InvalidParameterName, "parameter")?;

            if self.descriptors[..i].iter().any(|d| d.name == descriptor.name) {
                return Err(PhcError::new(
                    ErrorKind::InvalidParameterName,
                    format!("parameter \"{}\" is declared twice", descriptor.name),
                ));
            }
        }

        Ok(Schema {
            function_names: self.function_names,
            descriptors: self.descriptors,
            codec: self.codec,
        })
    }
}

fn validate_name(name: &str, kind: ErrorKind, what: &str) -> Result<(), PhcError> {
    if let Some(c) = find_invalid_char(name, is_name_char) {
        return Err(PhcError::new(
            kind,
            format!(
                "{} name \"{}\" contains character \"{}\", only characters in [a-z0-9-] are allowed",
                what, name, c
            ),
        ));
    }

    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return Err(PhcError::new(
            kind,
            format!(
                "{} name \"{}\" has length {}, must be in [1, {}]",
                what,
                name,
                name.len(),
                MAX_NAME_LENGTH
            ),
        ));
    }

    Ok(())
}
