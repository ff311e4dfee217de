//! # Snapshot Slot Extraction
//!
//! Recovers the slot a snapshot archive represents from its file name.
//!
//! Archive names follow `snapshot-<slot>-<hash>.tar.bz2`, where `<slot>` is a
//! decimal `u64` and `<hash>` is any non-empty string. Parsing is pure: the
//! only I/O in slot extraction is the directory listing done by the stage.

use std::path::Path;

use super::errors::SlotParseError;
use super::value_objects::Slot;

/// Prefix of every snapshot archive name.
pub const SNAPSHOT_PREFIX: &str = "snapshot-";

/// Extension of every snapshot archive name.
pub const SNAPSHOT_EXTENSION: &str = ".tar.bz2";

/// Whether `file_name` looks like a snapshot archive.
///
/// Shape only: a candidate may still fail [`parse_snapshot_slot`].
pub fn is_snapshot_candidate(file_name: &str) -> bool {
    file_name.len() > SNAPSHOT_PREFIX.len() + SNAPSHOT_EXTENSION.len()
        && file_name.starts_with(SNAPSHOT_PREFIX)
        && file_name.ends_with(SNAPSHOT_EXTENSION)
}

/// Parse the slot out of a snapshot archive name.
///
/// Accepts a bare file name or a path; only the base name is inspected.
///
/// # Errors
///
/// Returns [`SlotParseError::Malformed`] when the name does not match
/// `snapshot-<digits>-<hash>.tar.bz2` or the digits overflow `u64`.
pub fn parse_snapshot_slot(file_name: &str) -> Result<Slot, SlotParseError> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    let malformed = |reason| SlotParseError::Malformed {
        file_name: base.to_string(),
        reason,
    };

    let body = base
        .strip_prefix(SNAPSHOT_PREFIX)
        .ok_or_else(|| malformed("missing `snapshot-` prefix"))?;
    let body = body
        .strip_suffix(SNAPSHOT_EXTENSION)
        .ok_or_else(|| malformed("missing `.tar.bz2` extension"))?;
    let (digits, hash) = body
        .split_once('-')
        .ok_or_else(|| malformed("missing `-<hash>` segment"))?;

    if digits.is_empty() {
        return Err(malformed("slot is empty"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("slot is not numeric"));
    }
    if hash.is_empty() {
        return Err(malformed("hash is empty"));
    }

    digits
        .parse::<Slot>()
        .map_err(|_| malformed("slot does not fit in 64 bits"))
}

/// Pick the single snapshot archive among `names` listed from `dir`.
///
/// # Errors
///
/// - [`SlotParseError::NoCandidates`] when no name looks like a snapshot
/// - [`SlotParseError::Ambiguous`] when more than one does
pub fn select_snapshot<I, S>(dir: &Path, names: I) -> Result<String, SlotParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut candidates: Vec<String> = names
        .into_iter()
        .filter(|n| is_snapshot_candidate(n.as_ref()))
        .map(|n| n.as_ref().to_string())
        .collect();

    match candidates.len() {
        0 => Err(SlotParseError::NoCandidates {
            dir: dir.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => {
            candidates.sort();
            Err(SlotParseError::Ambiguous {
                dir: dir.to_path_buf(),
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(result: Result<Slot, SlotParseError>) -> &'static str {
        match result {
            Err(SlotParseError::Malformed { reason, .. }) => reason,
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_name() {
        assert_eq!(parse_snapshot_slot("snapshot-12345-abcd.tar.bz2"), Ok(12345));
    }

    #[test]
    fn test_parse_hash_with_dashes() {
        let name = "snapshot-99-7ZfQ-Gr3x-Lp.tar.bz2";
        assert_eq!(parse_snapshot_slot(name), Ok(99));
    }

    #[test]
    fn test_parse_uses_basename() {
        let path = "/cfg/latest-snapshot/snapshot-42-deadbeef.tar.bz2";
        assert_eq!(parse_snapshot_slot(path), Ok(42));
    }

    #[test]
    fn test_parse_leading_zeros() {
        assert_eq!(parse_snapshot_slot("snapshot-000700-h.tar.bz2"), Ok(700));
    }

    #[test]
    fn test_parse_max_slot() {
        let name = format!("snapshot-{}-h.tar.bz2", u64::MAX);
        assert_eq!(parse_snapshot_slot(&name), Ok(u64::MAX));
    }

    #[test]
    fn test_non_numeric_slot_is_rejected_not_zero() {
        let result = parse_snapshot_slot("snapshot-abc-xyz.tar.bz2");
        assert_eq!(reason_of(result), "slot is not numeric");
    }

    #[test]
    fn test_overflowing_slot_is_rejected() {
        let result = parse_snapshot_slot("snapshot-18446744073709551616-h.tar.bz2");
        assert_eq!(reason_of(result), "slot does not fit in 64 bits");
    }

    #[test]
    fn test_wrong_extension() {
        let result = parse_snapshot_slot("snapshot-100-abcd.tar.zst");
        assert_eq!(reason_of(result), "missing `.tar.bz2` extension");
    }

    #[test]
    fn test_missing_hash_segment() {
        let result = parse_snapshot_slot("snapshot-100.tar.bz2");
        assert_eq!(reason_of(result), "missing `-<hash>` segment");
    }

    #[test]
    fn test_empty_hash() {
        let result = parse_snapshot_slot("snapshot-100-.tar.bz2");
        assert_eq!(reason_of(result), "hash is empty");
    }

    #[test]
    fn test_empty_slot() {
        let result = parse_snapshot_slot("snapshot--abcd.tar.bz2");
        assert_eq!(reason_of(result), "slot is empty");
    }

    #[test]
    fn test_signed_slot_rejected() {
        let result = parse_snapshot_slot("snapshot-+5-abcd.tar.bz2");
        assert_eq!(reason_of(result), "slot is not numeric");
    }

    #[test]
    fn test_genesis_is_not_a_candidate() {
        assert!(!is_snapshot_candidate("genesis.tar.bz2"));
        assert!(!is_snapshot_candidate("snapshot-.tar.bz2"));
        assert!(is_snapshot_candidate("snapshot-1-a.tar.bz2"));
    }

    #[test]
    fn test_select_single_candidate() {
        let names = ["genesis.tar.bz2", "snapshot-12345-abcd.tar.bz2"];
        let selected = select_snapshot(Path::new("/stage"), names).unwrap();
        assert_eq!(selected, "snapshot-12345-abcd.tar.bz2");
    }

    #[test]
    fn test_select_no_candidates() {
        let result = select_snapshot(Path::new("/stage"), ["genesis.tar.bz2"]);
        assert!(matches!(result, Err(SlotParseError::NoCandidates { .. })));
    }

    #[test]
    fn test_select_ambiguous_is_error() {
        let names = [
            "snapshot-2-b.tar.bz2",
            "genesis.tar.bz2",
            "snapshot-1-a.tar.bz2",
        ];
        match select_snapshot(Path::new("/stage"), names) {
            Err(SlotParseError::Ambiguous { candidates, .. }) => {
                assert_eq!(
                    candidates,
                    vec!["snapshot-1-a.tar.bz2", "snapshot-2-b.tar.bz2"]
                );
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }
}
