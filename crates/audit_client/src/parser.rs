use shared::protocol::AuditProgressEvent;

use crate::error::AuditError;

pub const DATA_PREFIX: &str = "data: ";

/// Decodes one framed line.
///
/// Lines without the data prefix and data lines with nothing after it carry no
/// event. A payload that does not decode is a hard failure.
pub fn parse_line(line: &str) -> Result<Option<AuditProgressEvent>, AuditError> {
    let Some(payload) = line.trim().strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    if payload.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(payload)
        .map(Some)
        .map_err(|source| AuditError::MalformedRecord {
            payload: payload.to_string(),
            source,
        })
}
