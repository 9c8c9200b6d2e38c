use crate::base64::{self, Base64Codec};
use crate::decimal::parse_integer;
use crate::decode::decode_field;
use crate::error::{ErrorKind, PhcError};

use std::fmt::{self, Write};
use std::num::ParseIntError;
use std::str::FromStr;

/// A parameter as it was realised by decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterValuePair {
    /// The parameter name
    pub name: String,

    /// The value from the input, or the schema default
    pub value: String,

    /// `true` if the value was taken from the input, `false` if it was filled in from the
    /// schema default
    pub is_set: bool,
}

impl ParameterValuePair {
    /// A pair whose value came from the input.
    pub fn set<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_set: true,
        }
    }

    /// A pair filled in from a default.
    pub fn defaulted<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_set: false,
        }
    }
}

/// A decoded PHC string.
///
/// The salt and hash are kept both as the base64 text found in the input and as the decoded
/// bytes. Either may be empty, since both are optional in the PHC format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhcInstance {
    function: String,
    parameters: Vec<ParameterValuePair>,
    salt: Vec<u8>,
    salt_b64: String,
    hash: Vec<u8>,
    hash_b64: String,
}

impl PhcInstance {
    pub(crate) fn from_decoded(
        function: String,
        parameters: Vec<ParameterValuePair>,
        salt: (Vec<u8>, String),
        hash: (Vec<u8>, String),
    ) -> Self {
        Self {
            function,
            parameters,
            salt: salt.0,
            salt_b64: salt.1,
            hash: hash.0,
            hash_b64: hash.1,
        }
    }

    /// Builds an instance from base64 text, decoding the salt and hash with `codec` so the
    /// text and bytes agree.
    pub(crate) fn assemble(
        function: String,
        parameters: Vec<ParameterValuePair>,
        salt_b64: String,
        hash_b64: String,
        codec: Base64Codec,
    ) -> Result<Self, PhcError> {
        let salt = decode_field(codec, "salt", &salt_b64)?;
        let hash = decode_field(codec, "hash", &hash_b64)?;

        Ok(Self::from_decoded(
            function,
            parameters,
            (salt, salt_b64),
            (hash, hash_b64),
        ))
    }

    /// The function name, e.g. `argon2id`
    pub fn function(&self) -> &str {
        &self.function
    }

    /// All parameters in schema order, including defaulted ones
    pub fn parameters(&self) -> &[ParameterValuePair] {
        &self.parameters
    }

    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterValuePair> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Looks up the value of a parameter by name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.parameter(name).map(|p| p.value.as_str())
    }

    /// Parses the value of a parameter as a minimally encoded decimal of type `T`.
    pub fn decimal_value<T>(&self, name: &str) -> Result<T, PhcError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let value = self.value(name).ok_or_else(|| {
            PhcError::new(
                ErrorKind::NonOptionalParameterMissing,
                format!("parameter \"{}\"", name),
            )
        })?;

        parse_integer(value, true).map_err(|e| {
            PhcError::with_cause(
                ErrorKind::ParameterValueValidation,
                format!("validation of parameter \"{}\" failed", name),
                e.into(),
            )
        })
    }

    /// The decoded salt
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The salt as it appears in the string
    pub fn salt_b64(&self) -> &str {
        &self.salt_b64
    }

    /// The decoded hash
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// The hash as it appears in the string
    pub fn hash_b64(&self) -> &str {
        &self.hash_b64
    }

    /// Returns a copy of this instance with the salt and hash replaced by the given bytes.
    pub fn with_salt_and_hash(&self, salt: &[u8], hash: &[u8]) -> Self {
        Self {
            function: self.function.clone(),
            parameters: self.parameters.clone(),
            salt: salt.to_vec(),
            salt_b64: base64::encode(salt),
            hash: hash.to_vec(),
            hash_b64: base64::encode(hash),
        }
    }

    /// Writes the PHC string to `w` and returns the number of bytes written.
    ///
    /// Only parameters with `is_set` are written, so a decoded string that left out
    /// optional parameters encodes back to the same text. The parameter list is omitted
    /// entirely when no parameter is set, and the hash is omitted when it is empty. A hash
    /// without a salt can't be represented and is rejected.
    ///
    /// If `w` fails, a [`ErrorKind::Write`] error is returned and the number of bytes
    /// already written is not reported. `w` may hold a partial string at that point.
    pub fn encode_to<W: Write>(&self, w: &mut W) -> Result<usize, PhcError> {
        if self.salt_b64.is_empty() && !self.hash_b64.is_empty() {
            return Err(PhcError::new(
                ErrorKind::InvalidStructure,
                "got empty salt but non-empty hash, this is not allowed",
            ));
        }

        let mut written = 0;

        write_part(w, &mut written, "$")?;
        write_part(w, &mut written, &self.function)?;

        let mut first = true;
        for param in self.parameters.iter().filter(|p| p.is_set) {
            write_part(w, &mut written, if first { "$" } else { "," })?;
            write_part(w, &mut written, &param.name)?;
            write_part(w, &mut written, "=")?;
            write_part(w, &mut written, &param.value)?;
            first = false;
        }

        if !self.salt_b64.is_empty() {
            write_part(w, &mut written, "$")?;
            write_part(w, &mut written, &self.salt_b64)?;

            if !self.hash_b64.is_empty() {
                write_part(w, &mut written, "$")?;
                write_part(w, &mut written, &self.hash_b64)?;
            }
        }

        Ok(written)
    }

    /// Encodes the PHC string. See [`PhcInstance::encode_to`].
    pub fn encode(&self) -> Result<String, PhcError> {
        let mut s = String::new();
        self.encode_to(&mut s)?;
        Ok(s)
    }
}

fn write_part<W: Write>(w: &mut W, written: &mut usize, part: &str) -> Result<(), PhcError> {
    w.write_str(part)
        .map_err(|fmt::Error| PhcError::new(ErrorKind::Write, "output sink failed"))?;
    *written += part.len();
    Ok(())
}
