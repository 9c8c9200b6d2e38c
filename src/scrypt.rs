//! PHC strings for scrypt: `$scrypt$ln=<cost>,r=<block size>,p=<parallelism>`.

use crate::base64::{self, Base64Codec};
use crate::error::{Base64Error, PhcError, ValidationError};
use crate::instance::{ParameterValuePair, PhcInstance};
use crate::schema::{ParameterDescriptor, Schema, Validator};

use once_cell::sync::Lazy;
use std::str::FromStr;

/// The scrypt schema: `$scrypt$ln=<cost>,r=<block size>,p=<parallelism>[$<salt>[$<hash>]]`.
///
/// The salt and hash are decoded with the lenient codec since strings in the wild often
/// carry non-zero trailing bits.
pub static SCRYPT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder()
        .function_name("scrypt")
        .parameter(ParameterDescriptor::required("ln").validator(Validator::Any))
        .parameter(ParameterDescriptor::required("r").validator(Validator::Any))
        .parameter(ParameterDescriptor::required("p").validator(Validator::Any))
        .codec(Base64Codec::Lenient)
        .build()
        .expect("scrypt schema is invalid")
});

/// The parameters, salt and hash of an scrypt PHC string.
///
/// `salt` and `hash` hold base64 text, not raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScryptPhc {
    /// log2 of the CPU/memory cost `N` (`ln`)
    pub cost: u32,

    /// Block size (`r`)
    pub block_size: u32,

    /// Parallelism (`p`)
    pub parallelism: u32,

    /// Salt, base64
    pub salt: String,

    /// Hash, base64
    pub hash: String,
}

impl ScryptPhc {
    /// Parameters for a new hash with no salt or hash yet.
    pub fn new(cost: u32, block_size: u32, parallelism: u32) -> Self {
        Self {
            cost,
            block_size,
            parallelism,
            salt: String::new(),
            hash: String::new(),
        }
    }

    /// Decodes an scrypt PHC string. The scrypt-specific ranges are not checked; call
    /// [`ScryptPhc::validate_parameters`] for that.
    pub fn decode(input: &str) -> Result<Self, PhcError> {
        let instance = SCRYPT_SCHEMA.decode(input)?;
        Self::from_instance(&instance)
    }

    /// Converts a decoded instance of [`SCRYPT_SCHEMA`].
    pub fn from_instance(instance: &PhcInstance) -> Result<Self, PhcError> {
        Ok(Self {
            cost: instance.decimal_value("ln")?,
            block_size: instance.decimal_value("r")?,
            parallelism: instance.decimal_value("p")?,
            salt: instance.salt_b64().to_owned(),
            hash: instance.hash_b64().to_owned(),
        })
    }

    /// Builds the generic instance for these parameters.
    pub fn to_instance(&self) -> Result<PhcInstance, PhcError> {
        let parameters = vec![
            ParameterValuePair::set("ln", self.cost.to_string()),
            ParameterValuePair::set("r", self.block_size.to_string()),
            ParameterValuePair::set("p", self.parallelism.to_string()),
        ];

        PhcInstance::assemble(
            String::from("scrypt"),
            parameters,
            self.salt.clone(),
            self.hash.clone(),
            SCRYPT_SCHEMA.codec(),
        )
    }

    /// Generates the PHC string `$scrypt$ln=<cost>,r=<block size>,p=<parallelism>[$<salt>[$<hash>]]`.
    ///
    /// The parameter values are not checked; use [`ScryptPhc::validate_parameters`] for that.
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
        SCRYPT_SCHEMA.codec().decode(&self.salt)
    }

    /// Decodes the hash.
    pub fn hash_bytes(&self) -> Result<Vec<u8>, Base64Error> {
        SCRYPT_SCHEMA.codec().decode(&self.hash)
    }

    /// The cost parameter `N = 2^ln`, or `None` if it doesn't fit in 64 bits.
    pub fn cost_n(&self) -> Option<u64> {
        1u64.checked_shl(self.cost)
    }

    /// Verifies that the parameters are valid for scrypt on this platform. The salt and hash
    /// are not checked.
    pub fn validate_parameters(&self) -> Result<(), ValidationError> {
        if self.cost < 1 || self.cost >= usize::BITS {
            return Err(ValidationError::new(format!(
                "scrypt validation error: cost must be in range 1 <= ln < {}, got {}",
                usize::BITS,
                self.cost
            )));
        }

        if self.block_size < 1 {
            return Err(ValidationError::new(format!(
                "scrypt validation error: blocksize must be in range 1 <= blocksize <= {}, got {}",
                u32::MAX,
                self.block_size
            )));
        }

        if self.parallelism < 1 {
            return Err(ValidationError::new(format!(
                "scrypt validation error: parallelism must be in range 1 <= parallelism <= {}, got {}",
                u32::MAX,
                self.parallelism
            )));
        }

        let n = 1usize << self.cost;
        let r = self.block_size as usize;
        let p = self.parallelism as usize;

        if u64::from(self.block_size) * u64::from(self.parallelism) >= 1 << 30
            || r > usize::MAX / 128 / p
            || r > usize::MAX / 256
            || n > usize::MAX / 128 / r
        {
            return Err(ValidationError::new(
                "scrypt validation error: parameters too large",
            ));
        }

        Ok(())
    }
}

impl FromStr for ScryptPhc {
    type Err = PhcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_encode() {
        let phc = ScryptPhc {
            cost: 15,
            block_size: 8,
            parallelism: 1,
            salt: String::from("D/EEcdfcBkj4DQB3zlfsFQ"),
            hash: String::from("v9Xsag5AySIY78DFKslBzeRXCUfsLKCZ0Xm4Xwoh+J0"),
        };

        assert_eq!(
            phc.encode().unwrap(),
            "$scrypt$ln=15,r=8,p=1$D/EEcdfcBkj4DQB3zlfsFQ$v9Xsag5AySIY78DFKslBzeRXCUfsLKCZ0Xm4Xwoh+J0"
        );

        let phc = ScryptPhc {
            cost: 20,
            block_size: 16,
            parallelism: 2,
            salt: String::from("abcdef"),
            hash: String::from("ghijkl"),
        };

        assert_eq!(phc.encode().unwrap(), "$scrypt$ln=20,r=16,p=2$abcdef$ghijkl");

        assert_eq!(
            ScryptPhc::new(17, 8, 1).encode().unwrap(),
            "$scrypt$ln=17,r=8,p=1"
        );
    }

    #[test]
    fn test_decode() {
        let phc = ScryptPhc::decode(
            "$scrypt$ln=15,r=8,p=1$D/EEcdfcBkj4DQB3zlfsFQ$v9Xsag5AySIY78DFKslBzeRXCUfsLKCZ0Xm4Xwoh+J0",
        )
        .unwrap();

        assert_eq!(
            phc,
            ScryptPhc {
                cost: 15,
                block_size: 8,
                parallelism: 1,
                salt: String::from("D/EEcdfcBkj4DQB3zlfsFQ"),
                hash: String::from("v9Xsag5AySIY78DFKslBzeRXCUfsLKCZ0Xm4Xwoh+J0"),
            }
        );
        assert_eq!(phc.salt_bytes().unwrap().len(), 16);
        assert_eq!(phc.hash_bytes().unwrap().len(), 32);
        assert_eq!(phc.cost_n(), Some(32768));
        assert!(phc.validate_parameters().is_ok());

        let phc: ScryptPhc = "$scrypt$ln=20,r=16,p=2$abcdef$ghijkl".parse().unwrap();
        assert_eq!(phc.cost, 20);
        assert_eq!(phc.block_size, 16);
        assert_eq!(phc.parallelism, 2);
        assert_eq!(phc.salt, "abcdef");
        assert_eq!(phc.hash, "ghijkl");
        assert!(phc.validate_parameters().is_ok());

        let phc = ScryptPhc::decode("$scrypt$ln=1,r=1,p=1").unwrap();
        assert!(phc.salt.is_empty());
        assert!(phc.hash.is_empty());
    }

    #[test]
    fn test_decode_errors() {
        let err = ScryptPhc::decode("$scrypt$ln=15,r=8").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonOptionalParameterMissing);

        let err = ScryptPhc::decode("$scrypt$r=8,ln=15,p=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonOptionalParameterMissing);

        let err = ScryptPhc::decode("$scrypt$ln=15,r=8,p=1,q=2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnmatchedParameterName);

        let err = ScryptPhc::decode("$scrypt$ln=015,r=8,p=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterValueValidation);

        let err = ScryptPhc::decode("$scrypt$ln=-1,r=8,p=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterValueValidation);

        let err = ScryptPhc::decode("$scrypt$ln=15,r=8,p=4294967296").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterValueValidation);

        let err = ScryptPhc::decode("$scrypt2$ln=15,r=8,p=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MismatchedFunctionName);

        let err = ScryptPhc::decode("$scrypt$ln=15,r=8,p=1$abcde").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Base64Decode);

        let err = ScryptPhc::decode("$scrypt$ln=15,r=8,p=1$abcdef$ghijkl$").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStructure);
    }

    #[test]
    fn test_validate_parameters() {
        assert!(ScryptPhc::new(15, 8, 1).validate_parameters().is_ok());
        assert!(ScryptPhc::new(0, 8, 1).validate_parameters().is_err());
        assert!(ScryptPhc::new(usize::BITS, 8, 1).validate_parameters().is_err());
        assert!(ScryptPhc::new(15, 0, 1).validate_parameters().is_err());
        assert!(ScryptPhc::new(15, 8, 0).validate_parameters().is_err());

        // r * p must stay below 2^30
        assert!(ScryptPhc::new(15, 1 << 15, 1 << 14).validate_parameters().is_ok());
        assert!(ScryptPhc::new(15, 1 << 15, 1 << 15).validate_parameters().is_err());

        // N * 128 * r must fit in memory addressable by usize
        let ln = usize::BITS - 8;
        assert!(ScryptPhc::new(ln, 1, 1).validate_parameters().is_ok());
        assert!(ScryptPhc::new(ln, 2, 1).validate_parameters().is_err());
    }

    #[test]
    fn test_cost_n() {
        assert_eq!(ScryptPhc::new(1, 8, 1).cost_n(), Some(2));
        assert_eq!(ScryptPhc::new(63, 8, 1).cost_n(), Some(1 << 63));
        assert_eq!(ScryptPhc::new(64, 8, 1).cost_n(), None);
    }

    #[test]
    fn test_with_salt_and_hash() {
        let phc = ScryptPhc::new(15, 8, 1).with_salt_and_hash(b"somesalt", &[1, 2, 3]);
        assert_eq!(phc.encode().unwrap(), "$scrypt$ln=15,r=8,p=1$c29tZXNhbHQ$AQID");
        assert_eq!(phc.salt_bytes().unwrap(), b"somesalt");
    }
}
