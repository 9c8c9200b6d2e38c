use crate::base64::Base64Codec;
use crate::error::{ErrorKind, PhcError};
use crate::instance::{ParameterValuePair, PhcInstance};
use crate::schema::Schema;

/// The `$`-separated pieces of a PHC string, before any of them is interpreted.
pub(crate) struct Segments<'a> {
    pub function: &'a str,
    pub parameters: Option<&'a str>,
    pub salt: Option<&'a str>,
    pub hash: Option<&'a str>,
    pub has_trailing: bool,
}

pub(crate) fn split_segments(input: &str) -> Result<Segments<'_>, PhcError> {
    let rest = match input.strip_prefix('$') {
        Some(rest) => rest,
        None => {
            return Err(PhcError::new(
                ErrorKind::InvalidStructure,
                "phc string must begin with \"$\"",
            ))
        }
    };

    if rest.split('$').any(str::is_empty) {
        return Err(PhcError::new(
            ErrorKind::InvalidStructure,
            "found two consecutive '$' in string",
        ));
    }

    let mut parts = rest.split('$').peekable();

    // split() always yields at least one item
    let function = parts.next().unwrap_or_default();

    // '=' can only ever appear in the parameter list
    let parameters = parts.next_if(|s| s.contains('='));
    let salt = parts.next();
    let hash = parts.next();

    Ok(Segments {
        function,
        parameters,
        salt,
        hash,
        has_trailing: parts.next().is_some(),
    })
}

/// Splits one `name=value` token at the first `=`.
pub(crate) fn split_parameter(token: &str) -> Result<(&str, &str), PhcError> {
    token.split_once('=').ok_or_else(|| {
        PhcError::new(
            ErrorKind::MissingParameterValue,
            format!("parameter \"{}\"", token),
        )
    })
}

/// Splits `name=value,name=value` into pairs. Names and values are not validated.
pub(crate) fn parse_parameters(segment: &str) -> Result<Vec<ParameterValuePair>, PhcError> {
    segment
        .split(',')
        .map(|token| {
            split_parameter(token).map(|(name, value)| ParameterValuePair::set(name, value))
        })
        .collect()
}

pub(crate) fn decode_field(
    codec: Base64Codec,
    field: &str,
    text: &str,
) -> Result<Vec<u8>, PhcError> {
    codec.decode(text).map_err(|e| {
        PhcError::with_cause(
            ErrorKind::Base64Decode,
            format!("error decoding {} from base64 string", field),
            e.into(),
        )
    })
}

pub(crate) fn too_many_segments() -> PhcError {
    PhcError::new(ErrorKind::InvalidStructure, "too many '$' in input string")
}

impl Schema {
    /// Decodes a PHC string according to this schema.
    ///
    /// Parameters must appear in the order the schema declares them. Optional parameters
    /// may be left out and are then filled in with their default and `is_set == false`.
    /// Either the whole string decodes or the first problem found is returned.
    pub fn decode(&self, input: &str) -> Result<PhcInstance, PhcError> {
        self.decode_str(input).map_err(|e| {
            tracing::debug!(
                kind = ?e.kind(),
                accepted = ?self.function_names,
                "rejected phc string: {}",
                e.message()
            );
            e
        })
    }

    fn decode_str(&self, input: &str) -> Result<PhcInstance, PhcError> {
        let segments = split_segments(input)?;

        if !self.accepts(segments.function) {
            return Err(self.mismatched_function_name(segments.function));
        }

        let parsed = match segments.parameters {
            Some(s) => parse_parameters(s)?,
            None => Vec::new(),
        };

        let parameters = self.match_parameters(parsed)?;

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

    fn mismatched_function_name(&self, got: &str) -> PhcError {
        let message = match self.function_names.as_slice() {
            [expected] => format!("got name \"{}\", expected name \"{}\"", got, expected),
            names => format!(
                "got name \"{}\", expected name in [{}]",
                got,
                names.join(", ")
            ),
        };

        PhcError::new(ErrorKind::MismatchedFunctionName, message)
    }

    /// Aligns the parsed parameters with the descriptors in a single left-to-right pass.
    ///
    /// A parsed parameter is only ever compared to the descriptor at the current position.
    /// On a name mismatch that descriptor is skipped if it is optional; the parsed parameter
    /// then has to match a later descriptor or it is left over and rejected.
    fn match_parameters(
        &self,
        parsed: Vec<ParameterValuePair>,
    ) -> Result<Vec<ParameterValuePair>, PhcError> {
        let mut result = Vec::with_capacity(self.descriptors.len());
        let mut parsed = parsed.into_iter().peekable();

        for descriptor in &self.descriptors {
            match parsed.next_if(|p| p.name == descriptor.name()) {
                Some(pair) => {
                    descriptor
                        .value_validator()
                        .validate(&pair.value)
                        .map_err(|e| {
                            PhcError::with_cause(
                                ErrorKind::ParameterValueValidation,
                                format!("validation of parameter \"{}\" failed", pair.name),
                                e.into(),
                            )
                        })?;

                    result.push(pair);
                }
                None if descriptor.is_optional() => {
                    tracing::trace!(parameter = descriptor.name(), "using default value");
                    result.push(ParameterValuePair::defaulted(
                        descriptor.name(),
                        descriptor.default_value(),
                    ));
                }
                None => {
                    return Err(PhcError::new(
                        ErrorKind::NonOptionalParameterMissing,
                        format!("parameter \"{}\"", descriptor.name()),
                    ))
                }
            }
        }

        if let Some(extra) = parsed.next() {
            return Err(PhcError::new(
                ErrorKind::UnmatchedParameterName,
                format!("parameter \"{}\"", extra.name),
            ));
        }

        Ok(result)
    }
}
