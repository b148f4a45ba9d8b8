use chrono::NaiveDateTime;
use serde::Serialize;

/// "Seen by" annotation of a transcript entry.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reader {
    pub username: String,
    pub read_at: NaiveDateTime,
}
