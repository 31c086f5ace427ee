//! Partition-key derivation from document ids.
//!
//! Catalog documents are routed to one of ten logical partitions based on
//! the numeric suffix of their id, so a point read never needs a
//! cross-partition scan.

use crate::{Error, Result};

/// Recognized two-letter entity-type prefixes: titles and people.
const ENTITY_PREFIXES: [&str; 2] = ["tt", "nm"];

/// Number of logical partitions documents are spread across.
const PARTITION_COUNT: u64 = 10;

/// Derives the partition key for a document id.
///
/// The id must be longer than five characters, begin with a recognized
/// two-letter entity prefix (case-insensitive), and carry a purely numeric
/// suffix. Returns the decimal string of `suffix mod 10`.
///
/// Every malformed id fails with the same validation error; the message
/// carries the offending id.
///
/// # Examples
///
/// ```
/// # use filmdex_dal::derive_partition_key;
/// assert_eq!(derive_partition_key("tt1234567").unwrap(), "7");
/// assert_eq!(derive_partition_key("nm0000050").unwrap(), "0");
/// assert!(derive_partition_key("xx123456").is_err());
/// ```
pub fn derive_partition_key(id: &str) -> Result<String> {
    let invalid = || Error::validation(format!("document id '{id}' has no valid partition key"));

    if id.len() <= 5 {
        return Err(invalid());
    }

    let Some((prefix, suffix)) = id.split_at_checked(2) else {
        return Err(invalid());
    };
    if !ENTITY_PREFIXES
        .iter()
        .any(|p| prefix.eq_ignore_ascii_case(p))
    {
        return Err(invalid());
    }

    // Byte scan, not an integer parse: suffix length is unbounded and a
    // signed suffix is invalid. A decimal suffix mod 10 is its last digit.
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let last = u64::from(suffix.as_bytes()[suffix.len() - 1] - b'0');

    Ok((last % PARTITION_COUNT).to_string())
}
