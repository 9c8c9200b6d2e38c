//! PHC strings for the Argon2 family (`argon2d`, `argon2i`, `argon2id`).
//!
//! [`ARGON2_SCHEMA`] describes the string layout and [`Argon2Phc`] gives typed access to the
//! parameters along with the Argon2 range checks.
//!
//! ```rust
//! use phc_codec::argon2::{Argon2Phc, ARGON2_SCHEMA};
//!
//! let input = "$argon2i$m=120,t=5000,p=2$/LtFjH5rVL8";
//! assert!(ARGON2_SCHEMA.decode(input).is_ok());
//! assert_eq!(Argon2Phc::decode(input).unwrap().encode().unwrap(), input);
//! ```

use crate::base64::{self, Base64Codec};
use crate::error::{Base64Error, Cause, ErrorKind, PhcError, ValidationError};
use crate::instance::{ParameterValuePair, PhcInstance};
use crate::schema::{ParameterDescriptor, Schema, Validator};

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// Argon2 version 1.0
pub const ARGON2_VERSION_10: u32 = 0x10;

/// Argon2 version 1.3
pub const ARGON2_VERSION_13: u32 = 0x13;

/// The versions a PHC string may declare
pub const ARGON2_VERSIONS: [u32; 2] = [ARGON2_VERSION_10, ARGON2_VERSION_13];

/// The version assumed when a string has no `v` parameter
pub const DEFAULT_VERSION: u32 = ARGON2_VERSION_10;

const MIN_SALT_LEN: usize = 8;
const MAX_SALT_LEN: usize = 48;
const MIN_HASH_LEN: usize = 12;
const MAX_HASH_LEN: usize = 64;
const MAX_KEYID_LEN: usize = 8;
const MAX_DATA_LEN: usize = 32;
const MAX_PARALLELISM: u32 = 255;

/// The schema shared by all three Argon2 variants:
/// `$argon2<variant>[$v=<version>,]m=<memory>,t=<iterations>,p=<parallelism>[,keyid=<b64>][,data=<b64>][$<salt>[$<hash>]]`
pub static ARGON2_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder()
        .function_name(Argon2Variant::Argon2id.as_str())
        .function_name(Argon2Variant::Argon2i.as_str())
        .function_name(Argon2Variant::Argon2d.as_str())
        .parameter(
            ParameterDescriptor::optional("v", DEFAULT_VERSION.to_string())
                .validator(Validator::Any),
        )
        .parameter(ParameterDescriptor::required("m").validator(Validator::Any))
        .parameter(ParameterDescriptor::required("t").validator(Validator::Any))
        .parameter(ParameterDescriptor::required("p").validator(Validator::Any))
        .parameter(ParameterDescriptor::optional("keyid", ""))
        .parameter(ParameterDescriptor::optional("data", ""))
        .codec(Base64Codec::Strict)
        .build()
        .expect("Argon2 schema is invalid")
});

/// The three Argon2 algorithms, each with its own PHC function name. argon2d resists GPU
/// cracking, argon2i resists side-channel attacks and argon2id is a hybrid of the two.
/// See <https://en.wikipedia.org/wiki/Argon2> for more information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argon2Variant {
    /// GPU-cracking attack resistant/memory-hard
    Argon2d,

    /// Side-channel attack resistant
    Argon2i,

    /// GPU-cracking attack resistant/memory-hard and side-channel attack resistant
    Argon2id,
}

impl Argon2Variant {
    /// The function name used in PHC strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Argon2Variant::Argon2d => "argon2d",
            Argon2Variant::Argon2i => "argon2i",
            Argon2Variant::Argon2id => "argon2id",
        }
    }
}

impl fmt::Display for Argon2Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Argon2Variant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "argon2d" => Ok(Argon2Variant::Argon2d),
            "argon2i" => Ok(Argon2Variant::Argon2i),
            "argon2id" => Ok(Argon2Variant::Argon2id),
            _ => Err(ValidationError::new(format!(
                "argon2 validation error: variant must be in [argon2id, argon2i, argon2d], got \"{}\"",
                s
            ))),
        }
    }
}

/// The parameters, salt and hash of an Argon2 PHC string.
///
/// `key_id`, `data`, `salt` and `hash` hold base64 text, not raw bytes. An empty string
/// means the field is absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argon2Phc {
    /// Which Argon2 algorithm
    pub variant: Argon2Variant,

    /// Algorithm version, `0x10` or `0x13`
    pub version: u32,

    /// Memory cost in kibibytes (`m`)
    pub memory: u32,

    /// Number of passes (`t`)
    pub iterations: u32,

    /// Degree of parallelism (`p`)
    pub parallelism: u32,

    /// Key identifier, base64
    pub key_id: String,

    /// Associated data, base64
    pub data: String,

    /// Salt, base64
    pub salt: String,

    /// Hash, base64
    pub hash: String,
}

impl Argon2Phc {
    /// Parameters for a new hash using version 1.3, with no salt or hash yet.
    pub fn new(variant: Argon2Variant, memory: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            variant,
            version: ARGON2_VERSION_13,
            memory,
            iterations,
            parallelism,
            key_id: String::new(),
            data: String::new(),
            salt: String::new(),
            hash: String::new(),
        }
    }

    /// Decodes an Argon2 PHC string.
    ///
    /// Decimals must be minimally encoded and fit in 32 bits, and the salt and hash must be
    /// strict base64. The Argon2-specific ranges are *not* checked; call
    /// [`Argon2Phc::validate_parameters`] for that.
    pub fn decode(input: &str) -> Result<Self, PhcError> {
        let instance = ARGON2_SCHEMA.decode(input)?;
        Self::from_instance(&instance)
    }

    /// Converts a decoded instance of [`ARGON2_SCHEMA`].
    pub fn from_instance(instance: &PhcInstance) -> Result<Self, PhcError> {
        let variant = instance.function().parse().map_err(|e| {
            PhcError::with_cause(
                ErrorKind::MismatchedFunctionName,
                format!("function \"{}\"", instance.function()),
                Cause::Validation(e),
            )
        })?;

        Ok(Self {
            variant,
            version: instance.decimal_value("v")?,
            memory: instance.decimal_value("m")?,
            iterations: instance.decimal_value("t")?,
            parallelism: instance.decimal_value("p")?,
            key_id: instance.value("keyid").unwrap_or_default().to_owned(),
            data: instance.value("data").unwrap_or_default().to_owned(),
            salt: instance.salt_b64().to_owned(),
            hash: instance.hash_b64().to_owned(),
        })
    }

    /// Builds the generic instance for these parameters. `v` is only marked as set when it
    /// differs from the default, and `keyid`/`data` only when non-empty.
    pub fn to_instance(&self) -> Result<PhcInstance, PhcError> {
        let mut parameters = Vec::with_capacity(6);

        if self.version == DEFAULT_VERSION {
            parameters.push(ParameterValuePair::defaulted("v", self.version.to_string()));
        } else {
            parameters.push(ParameterValuePair::set("v", self.version.to_string()));
        }

        parameters.push(ParameterValuePair::set("m", self.memory.to_string()));
        parameters.push(ParameterValuePair::set("t", self.iterations.to_string()));
        parameters.push(ParameterValuePair::set("p", self.parallelism.to_string()));

        for (name, value) in [("keyid", &self.key_id), ("data", &self.data)] {
            if value.is_empty() {
                parameters.push(ParameterValuePair::defaulted(name, ""));
            } else {
                parameters.push(ParameterValuePair::set(name, value.as_str()));
            }
        }

        PhcInstance::assemble(
            self.variant.as_str().to_owned(),
            parameters,
            self.salt.clone(),
            self.hash.clone(),
            ARGON2_SCHEMA.codec(),
        )
    }

    /// Generates the PHC string
    /// `$<variant>[$v=<version>,]m=<memory>,t=<iterations>,p=<parallelism>[,keyid=..][,data=..][$<salt>[$<hash>]]`.
    ///
    /// The parameter values are not checked; use [`Argon2Phc::validate_parameters`] for that.
    pub fn encode(&self) -> Result<String, PhcError> {
        self.to_instance()?.encode()
    }

    /// Returns a copy with the salt and hash set to the base64 encoding of the given bytes.
    pub fn with_salt_and_hash(&self, salt: &[u8], hash: &[u8]) -> Self {
        Self {
            salt: base64::encode(salt),
            hash: base64::encode(hash),
            ..self.clone()
        }
    }

    /// Decodes the salt.
    pub fn salt_bytes(&self) -> Result<Vec<u8>, Base64Error> {
        base64::decode(&self.salt)
    }

    /// Decodes the hash.
    pub fn hash_bytes(&self) -> Result<Vec<u8>, Base64Error> {
        base64::decode(&self.hash)
    }

    /// Verifies that the parameters are valid for Argon2.
    pub fn validate_parameters(&self) -> Result<(), ValidationError> {
        if !ARGON2_VERSIONS.contains(&self.version) {
            return Err(ValidationError::new(format!(
                "argon2 validation error: invalid version {}, must be one of [16 (0x10), 19 (0x13)]",
                self.version
            )));
        }

        if self.memory < 1 {
            return Err(ValidationError::new(format!(
                "argon2 validation error: memory must be in range 1 <= memory <= {}",
                u32::MAX
            )));
        }

        if self.iterations < 1 {
            return Err(ValidationError::new(format!(
                "argon2 validation error: iterations must be in range 1 <= iterations <= {}",
                u32::MAX
            )));
        }

        if self.parallelism < 1 || self.parallelism > MAX_PARALLELISM {
            return Err(ValidationError::new(format!(
                "argon2 validation error: parallelism must be in range 1 <= parallelism <= {}",
                MAX_PARALLELISM
            )));
        }

        // The memory cost in KiB must be at least 8 times the parallelism
        if u64::from(self.memory) < 8 * u64::from(self.parallelism) {
            return Err(ValidationError::new(format!(
                "argon2 validation error: memory must be at least 8 * parallelism, got m={}, p={}",
                self.memory, self.parallelism
            )));
        }

        check_b64_len("keyid", &self.key_id, 0, MAX_KEYID_LEN)?;
        check_b64_len("data", &self.data, 0, MAX_DATA_LEN)?;

        if !self.salt.is_empty() {
            check_b64_len("salt", &self.salt, MIN_SALT_LEN, MAX_SALT_LEN)?;
        }

        if !self.hash.is_empty() {
            check_b64_len("hash", &self.hash, MIN_HASH_LEN, MAX_HASH_LEN)?;
        }

        Ok(())
    }
}

impl FromStr for Argon2Phc {
    type Err = PhcError;

    /// Same as [`Argon2Phc::decode`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn check_b64_len(field: &str, text: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = base64::decode(text)
        .map_err(|e| {
            ValidationError::new(format!("argon2 validation error: invalid {}: {}", field, e))
        })?
        .len();

    if len < min || len > max {
        return Err(ValidationError::new(format!(
            "argon2 validation error: {} must be {} to {} bytes long, got {}",
            field, min, max, len
        )));
    }

    Ok(())
}
