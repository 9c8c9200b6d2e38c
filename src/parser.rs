use crate::base64::Base64Codec;
use crate::decode::{decode_field, split_parameter, split_segments, too_many_segments};
use crate::error::{ErrorKind, PhcError};
use crate::instance::{ParameterValuePair, PhcInstance};
use crate::schema::{find_invalid_char, is_name_char, is_value_char, MAX_NAME_LENGTH};

/// A parser for arbitrary PHC strings that doesn't need to know the hash function in
/// advance.
///
/// Unlike [`crate::Schema::decode`], this accepts any syntactically valid function name and
/// any parameters, keeping them in the order they appear. The length limits on names and
/// values are configurable.
#[derive(Clone, Debug)]
pub struct Parser {
    min_function_name_len: usize,
    max_function_name_len: Option<usize>,
    min_param_name_len: usize,
    max_param_name_len: Option<usize>,
    min_param_value_len: usize,
    max_param_value_len: Option<usize>,
    codec: Base64Codec,
}

impl Default for Parser {
    /// Create a new `Parser` with the limits of the PHC string format.
    ///
    /// The defaults are as follows:
    ///
    /// * Function name length: 1 to 32
    /// * Parameter name length: 1 to 32
    /// * Parameter value length: unbounded
    /// * Base64 codec: strict
    fn default() -> Self {
        Self {
            min_function_name_len: 1,
            max_function_name_len: Some(MAX_NAME_LENGTH),
            min_param_name_len: 1,
            max_param_name_len: Some(MAX_NAME_LENGTH),
            min_param_value_len: 0,
            max_param_value_len: None,
            codec: Base64Codec::Strict,
        }
    }
}

impl Parser {
    /// Create a new `Parser` with default limits. See [`Parser::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimum length of the function name.
    pub fn min_function_name_length(mut self, len: usize) -> Self {
        self.min_function_name_len = len;
        self
    }

    /// The maximum length of the function name. `None` removes the limit.
    pub fn max_function_name_length(mut self, len: Option<usize>) -> Self {
        self.max_function_name_len = len;
        self
    }

    /// The minimum length of a parameter name.
    pub fn min_parameter_name_length(mut self, len: usize) -> Self {
        self.min_param_name_len = len;
        self
    }

    /// The maximum length of a parameter name. `None` removes the limit.
    pub fn max_parameter_name_length(mut self, len: Option<usize>) -> Self {
        self.max_param_name_len = len;
        self
    }

    /// The minimum length of a parameter value.
    pub fn min_parameter_value_length(mut self, len: usize) -> Self {
        self.min_param_value_len = len;
        self
    }

    /// The maximum length of a parameter value. `None` removes the limit.
    pub fn max_parameter_value_length(mut self, len: Option<usize>) -> Self {
        self.max_param_value_len = len;
        self
    }

    /// The codec used for the salt and hash.
    pub fn codec(mut self, codec: Base64Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Parses a PHC string. All parameters in the result have `is_set == true`.
    ///
    /// Each parameter is checked completely, name then value, before the next one is looked
    /// at, so the error returned is the one for the leftmost bad parameter.
    pub fn parse(&self, input: &str) -> Result<PhcInstance, PhcError> {
        self.parse_str(input).map_err(|e| {
            tracing::debug!(kind = ?e.kind(), "rejected phc string: {}", e.message());
            e
        })
    }

    fn parse_str(&self, input: &str) -> Result<PhcInstance, PhcError> {
        let segments = split_segments(input)?;

        check_token(
            segments.function,
            "function name",
            is_name_char,
            "[a-z0-9-]",
            (self.min_function_name_len, self.max_function_name_len),
            ErrorKind::InvalidFunctionName,
        )?;

        let parameters = match segments.parameters {
            Some(s) => s
                .split(',')
                .map(|token| self.parse_parameter(token))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let salt_b64 = segments.salt.unwrap_or_default();
        let salt = decode_field(self.codec, "salt", salt_b64)?;

        let hash_b64 = segments.hash.unwrap_or_default();
        let hash = decode_field(self.codec, "hash", hash_b64)?;

        if segments.has_trailing {
            return Err(too_many_segments());
        }

        Ok(PhcInstance::from_decoded(
            segments.function.to_owned(),
            parameters,
            (salt, salt_b64.to_owned()),
            (hash, hash_b64.to_owned()),
        ))
    }

    fn parse_parameter(&self, token: &str) -> Result<ParameterValuePair, PhcError> {
        let (name, value) = split_parameter(token)?;

        check_token(
            name,
            "parameter name",
            is_name_char,
            "[a-z0-9-]",
            (self.min_param_name_len, self.max_param_name_len),
            ErrorKind::InvalidParameterName,
        )?;

        check_token(
            value,
            "parameter value",
            is_value_char,
            "[a-zA-Z0-9/+.-]",
            (self.min_param_value_len, self.max_param_value_len),
            ErrorKind::InvalidParameterValue,
        )?;

        Ok(ParameterValuePair::set(name, value))
    }
}

fn check_token(
    token: &str,
    what: &str,
    allowed: fn(u8) -> bool,
    allowed_desc: &str,
    (min, max): (usize, Option<usize>),
    kind: ErrorKind,
) -> Result<(), PhcError> {
    if let Some(c) = find_invalid_char(token, allowed) {
        return Err(PhcError::new(
            kind,
            format!(
                "{} \"{}\" contains character \"{}\", only characters in {} are allowed",
                what, token, c, allowed_desc
            ),
        ));
    }

    // only ascii is left at this point, so the byte length is the character count
    if token.len() < min || max.is_some_and(|max| token.len() > max) {
        let upper = match max {
            Some(max) => max.to_string(),
            None => String::from("∞"),
        };

        return Err(PhcError::new(
            kind,
            format!(
                "{} \"{}\" has length {}, must be in [{}, {}]",
                what,
                token,
                token.len(),
                min,
                upper
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Level, Metadata, Subscriber};

    #[test]
    fn test_parse_keeps_input_order() {
        let err = Parser::new()
            .parse("$argon2id$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStructure);

        let inst = Parser::new()
            .parse("$pbkdf2-sha256$i=1000,l=32$c29tZXNhbHQ$AQID")
            .unwrap();

        assert_eq!(inst.function(), "pbkdf2-sha256");
        assert_eq!(
            inst.parameters(),
            &[
                ParameterValuePair::set("i", "1000"),
                ParameterValuePair::set("l", "32"),
            ]
        );
        assert_eq!(inst.salt(), b"somesalt");
        assert_eq!(inst.hash(), &[1, 2, 3]);

        let inst = Parser::new().parse("$p$t=2,m=1").unwrap();
        assert_eq!(inst.parameters()[0].name, "t");
        assert_eq!(inst.parameters()[1].name, "m");
    }

    #[test]
    fn test_parse_function_name_only() {
        let inst = Parser::new().parse("$md5").unwrap();
        assert_eq!(inst.function(), "md5");
        assert!(inst.parameters().is_empty());
        assert_eq!(inst.encode().unwrap(), "$md5");
    }

    #[test]
    fn test_invalid_names() {
        let err = Parser::new().parse("$SHA256$i=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFunctionName);

        let err = Parser::new().parse(&format!("${}", "a".repeat(33))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFunctionName);

        let err = Parser::new().parse("$sha$Rounds=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterName);

        let err = Parser::new().parse("$sha$=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterName);

        let err = Parser::new().parse("$sha$rounds=1_000").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterValue);

        // without '=' the segment is taken to be the salt
        let err = Parser::new().parse("$sha$rounds").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Base64Decode);

        let err = Parser::new().parse("$sha$a=1,rounds").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameterValue);
    }

    #[test]
    fn test_leftmost_bad_parameter_is_reported() {
        let err = Parser::new().parse("$sha$A=1,b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterName);

        let err = Parser::new().parse("$sha$a=1_0,b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterValue);

        let err = Parser::new().parse("$sha$b,A=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameterValue);
        assert_eq!(err.message(), "parameter \"b\"");
    }

    struct DebugEventCounter(Arc<AtomicUsize>);

    impl Subscriber for DebugEventCounter {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }

        fn record(&self, _: &Id, _: &Record<'_>) {}

        fn record_follows_from(&self, _: &Id, _: &Id) {}

        fn event(&self, event: &Event<'_>) {
            let metadata = event.metadata();
            if *metadata.level() == Level::DEBUG && metadata.target() == "phc_codec::parser"
            {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn enter(&self, _: &Id) {}

        fn exit(&self, _: &Id) {}
    }

    #[test]
    fn test_rejection_is_logged() {
        let count = Arc::new(AtomicUsize::new(0));

        tracing::subscriber::with_default(DebugEventCounter(Arc::clone(&count)), || {
            assert!(Parser::new().parse("$sha$A=1").is_err());
            assert!(Parser::new().parse("sha").is_err());
            assert!(Parser::new().parse("$sha$a=1").is_ok());
        });

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_configured_limits() {
        let parser = Parser::new()
            .max_function_name_length(Some(4))
            .min_parameter_value_length(2)
            .max_parameter_value_length(Some(4));

        assert!(parser.parse("$sha1$r=10").is_ok());
        assert_eq!(
            parser.parse("$sha256$r=10").unwrap_err().kind(),
            ErrorKind::InvalidFunctionName
        );
        assert_eq!(
            parser.parse("$sha1$r=1").unwrap_err().kind(),
            ErrorKind::InvalidParameterValue
        );
        assert_eq!(
            parser.parse("$sha1$r=12345").unwrap_err().kind(),
            ErrorKind::InvalidParameterValue
        );

        let parser = Parser::new().max_function_name_length(None);
        assert!(parser.parse(&format!("${}", "a".repeat(64))).is_ok());
    }

    #[test]
    fn test_codec() {
        assert_eq!(
            Parser::new().parse("$scrypt$abcdef$ghijkl").unwrap_err().kind(),
            ErrorKind::Base64Decode
        );
        assert!(Parser::new()
            .codec(Base64Codec::Lenient)
            .parse("$scrypt$abcdef$ghijkl")
            .is_ok());
    }
}
