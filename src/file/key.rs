//! Object key derivation.

use chrono::NaiveDate;

/// Storage key for a new upload: `uploads/{owner}/{YYYY-MM-DD}/{id}-{display_name}`.
///
/// The owner prefix keeps users apart and the id keeps same-day, same-name
/// uploads apart.
pub fn object_key(owner_id: &str, date: NaiveDate, id: &str, display_name: &str) -> String {
    format!(
        "uploads/{owner_id}/{}/{id}-{display_name}",
        date.format("%Y-%m-%d")
    )
}
