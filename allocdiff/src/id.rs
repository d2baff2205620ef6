use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::types::RequestKey;

/// Snapshot ids are truncated to this many characters.
const SNAPSHOT_ID_LENGTH: usize = 16;

/// Derive the snapshot id for a request key.
///
/// The id is a stable base64 encoding of the joined key fields with
/// non-alphanumeric characters stripped, truncated to a fixed short length.
/// Keys sharing a long common prefix can collide; the id is informational
/// only and never used for lookup, which always compares full [`RequestKey`]
/// equality.
pub fn snapshot_id(request: &RequestKey) -> String {
    let seed = format!(
        "{}_{}_{}_{}",
        request.project_code, request.alloc_start_date, request.alloc_end_date, request.username
    );
    STANDARD
        .encode(seed.as_bytes())
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(SNAPSHOT_ID_LENGTH)
        .collect()
}
