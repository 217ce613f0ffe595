//! Parse submission validation and entry decoding.
//!
//! The ingestion collaborator delivers raw parse output as a base64-encoded
//! blob plus a client-side correlation id. Validation rejects malformed
//! submissions before anything touches the corpus assembler or the store.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::RawEntry;

/// Ingestion failures. Surfaced to the caller as a rejected request;
/// nothing is persisted.
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("missing or empty {field:?} field in parse submission")]
    #[diagnostic(
        code(parseboard::ingest::invalid_input),
        help("A submission carries base64 \"parse_data\" and a client \"uuid\".")
    )]
    InvalidInput { field: &'static str },

    #[error("parse data is not valid base64")]
    #[diagnostic(code(parseboard::ingest::base64))]
    Base64(#[from] base64::DecodeError),

    #[error("parse entries are not valid JSON: {source}")]
    #[diagnostic(code(parseboard::ingest::decode))]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

/// An inbound parse submission, exactly as received.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParseSubmission {
    #[serde(default)]
    pub parse_data: Option<String>,
    /// Client-side correlation id; carried through logging only, the store
    /// assigns its own opaque record ids.
    #[serde(rename = "uuid", default)]
    pub id: Option<String>,
}

/// Validate a submission and decode its payload bytes.
///
/// # Errors
///
/// [`IngestError::InvalidInput`] when either field is missing or empty,
/// [`IngestError::Base64`] when the payload does not decode.
pub fn validate_submission(submission: &ParseSubmission) -> Result<(Vec<u8>, &str), IngestError> {
    let parse_data = submission
        .parse_data
        .as_deref()
        .filter(|data| !data.is_empty())
        .ok_or(IngestError::InvalidInput {
            field: "parse_data",
        })?;
    let id = submission
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(IngestError::InvalidInput { field: "uuid" })?;

    let bytes = BASE64.decode(parse_data)?;
    Ok((bytes, id))
}

/// Decode the payload bytes into raw corpus entries.
pub fn decode_entries(bytes: &[u8]) -> Result<Vec<RawEntry>, IngestError> {
    serde_json::from_slice(bytes).map_err(|source| IngestError::Decode { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(parse_data: Option<&str>, id: Option<&str>) -> ParseSubmission {
        ParseSubmission {
            parse_data: parse_data.map(str::to_string),
            id: id.map(str::to_string),
        }
    }

    #[test]
    fn valid_submission_decodes() {
        let encoded = BASE64.encode(br#"[{"name": "tokens", "instances": [["a"]]}]"#);
        let binding = submission(Some(&encoded), Some("req-1"));
        let (bytes, id) = validate_submission(&binding).unwrap();
        assert_eq!(id, "req-1");
        let entries = decode_entries(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.as_deref(), Some("tokens"));
        assert_eq!(entries[0].entry_type, "data");
    }

    #[test]
    fn missing_fields_are_invalid_input() {
        assert!(matches!(
            validate_submission(&submission(None, Some("x"))),
            Err(IngestError::InvalidInput {
                field: "parse_data"
            })
        ));
        assert!(matches!(
            validate_submission(&submission(Some("YQ=="), None)),
            Err(IngestError::InvalidInput { field: "uuid" })
        ));
        assert!(matches!(
            validate_submission(&submission(Some(""), Some("x"))),
            Err(IngestError::InvalidInput {
                field: "parse_data"
            })
        ));
    }

    #[test]
    fn undecodable_base64_is_rejected() {
        assert!(matches!(
            validate_submission(&submission(Some("!!not-base64!!"), Some("x"))),
            Err(IngestError::Base64(_))
        ));
    }

    #[test]
    fn entries_must_be_json() {
        assert!(matches!(
            decode_entries(b"pickled-bytes"),
            Err(IngestError::Decode { .. })
        ));
    }
}
