#![deny(missing_docs)]

//! An encoder and decoder for the
//! [PHC string format](https://github.com/P-H-C/phc-string-format/blob/master/phc-sf-spec.md),
//! the `$`-delimited text used to store password hashes together with the name of the hash
//! function, its parameters and the salt. The format was defined for the
//! [Password Hashing Competition](https://www.password-hashing.net) and is used by Argon2,
//! scrypt and many others.
//!
//! This crate does not hash passwords. It turns PHC strings into structured values and back,
//! and it is strict about it: decimals must be minimally encoded, parameters must appear in
//! the declared order and base64 fields must not carry stray bits.
//!
//! # Usage
//!
//! To use phc-codec, add the following to your Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! phc-codec = "0.1.0"
//! ```
//!
//! Rejected inputs are reported through [`tracing`](https://docs.rs/tracing) at the `debug`
//! level. The input string itself is never logged.
//!
//! # Examples
//!
//! Decode an Argon2 string and check its parameters:
//!
//! ```rust
//! use phc_codec::{Argon2Phc, Argon2Variant};
//!
//! let phc = Argon2Phc::decode(
//!     "$argon2id$v=19,m=4096,t=3,p=1$PcEZHj1maR/+ZQynyJHWZg$2jEN4xcww7CYp1jakZB1rxbYsZ55XH2HgjYRtdZtubI",
//! )
//! .unwrap();
//!
//! assert_eq!(phc.variant, Argon2Variant::Argon2id);
//! assert_eq!(phc.memory, 4096);
//! assert!(phc.validate_parameters().is_ok());
//! ```
//!
//! Build a new scrypt string from a freshly generated salt:
//!
//! ```rust
//! use phc_codec::{generate_salt, ScryptPhc};
//!
//! let salt = generate_salt(16);
//! let hash = [0u8; 32]; // the output of your scrypt implementation
//!
//! let phc = ScryptPhc::new(15, 8, 1).with_salt_and_hash(&salt, &hash);
//! assert!(phc.validate_parameters().is_ok());
//!
//! let phc_string = phc.encode().unwrap();
//! assert!(phc_string.starts_with("$scrypt$ln=15,r=8,p=1$"));
//! ```
//!
//! Describe your own hash function with a schema:
//!
//! ```rust
//! use phc_codec::{ParameterDescriptor, Schema, Validator};
//!
//! let schema = Schema::builder()
//!     .function_name("pbkdf2-sha256")
//!     .parameter(ParameterDescriptor::required("i").validator(Validator::Any))
//!     .parameter(ParameterDescriptor::optional("l", "32"))
//!     .build()
//!     .unwrap();
//!
//! let instance = schema.decode("$pbkdf2-sha256$i=100000$c29tZXNhbHQ").unwrap();
//!
//! assert_eq!(instance.decimal_value::<u32>("i").unwrap(), 100000);
//! assert_eq!(instance.value("l"), Some("32"));
//! assert!(!instance.parameter("l").unwrap().is_set);
//! assert_eq!(instance.salt(), b"somesalt");
//!
//! // Defaulted parameters are not written back
//! assert_eq!(instance.encode().unwrap(), "$pbkdf2-sha256$i=100000$c29tZXNhbHQ");
//! ```
//!
//! Parse a string without knowing the hash function in advance:
//!
//! ```rust
//! use phc_codec::{Base64Codec, Parser};
//!
//! let instance = Parser::new()
//!     .codec(Base64Codec::Lenient)
//!     .parse("$scrypt$ln=20,r=16,p=2$abcdef$ghijkl")
//!     .unwrap();
//!
//! assert_eq!(instance.function(), "scrypt");
//! assert_eq!(instance.value("r"), Some("16"));
//! ```
//!
//! Match on what went wrong:
//!
//! ```rust
//! use phc_codec::{Argon2Phc, ErrorKind};
//!
//! let err = Argon2Phc::decode("$argon2i$m=0120,t=5000,p=2").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ParameterValueValidation);
//!
//! let err = Argon2Phc::decode("$argon2i$t=5000,p=2").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NonOptionalParameterMissing);
//! ```

pub mod argon2;
pub mod base64;
pub mod decimal;
pub mod salt;
pub mod scrypt;

mod decode;
mod error;
mod instance;
mod parser;
mod schema;

pub use argon2::{Argon2Phc, Argon2Variant};
pub use base64::Base64Codec;
pub use error::{Base64Error, Cause, DecimalError, ErrorKind, PhcError, ValidationError};
pub use instance::{ParameterValuePair, PhcInstance};
pub use parser::Parser;
pub use salt::generate_salt;
pub use schema::{ParameterDescriptor, Schema, SchemaBuilder, Validator, MAX_NAME_LENGTH};
pub use scrypt::ScryptPhc;
