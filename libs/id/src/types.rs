//! Typed ID definitions.

use crate::define_id;

// =============================================================================
// Library
// =============================================================================

define_id!(BookId, "book");
define_id!(NoteId, "note");

// =============================================================================
// Requests
// =============================================================================

define_id!(RequestId, "req");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdError;
    use proptest::prelude::*;

    #[test]
    fn test_note_id_roundtrip() {
        let id = NoteId::new();
        let s = id.to_string();
        assert!(s.starts_with("note_"));
        let parsed: NoteId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_book_id_rejects_note_prefix() {
        let note = NoteId::new().to_string();
        let err = note.parse::<BookId>().unwrap_err();
        assert!(err.is_prefix_error());
        assert_eq!(
            err,
            IdError::InvalidPrefix {
                expected: "book",
                actual: "note".to_string()
            }
        );
    }

    #[test]
    fn test_empty_id() {
        assert_eq!("".parse::<NoteId>().unwrap_err(), IdError::Empty);
    }

    #[test]
    fn test_missing_separator() {
        assert_eq!(
            "note01HV4Z2WQXKJNM8GPQY6VBKC3D".parse::<NoteId>().unwrap_err(),
            IdError::MissingSeparator
        );
    }

    #[test]
    fn test_invalid_ulid() {
        assert!(matches!(
            "note_invalid".parse::<NoteId>().unwrap_err(),
            IdError::InvalidUlid(_)
        ));
    }

    #[test]
    fn test_json_uses_prefixed_string() {
        let id = BookId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: BookId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ids_sort_by_creation() {
        let first = NoteId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = NoteId::new();
        assert!(first < second);
    }

    #[test]
    fn test_prefixes_unique() {
        let prefixes = [BookId::PREFIX, NoteId::PREFIX, RequestId::PREFIX];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(prefixes.len(), unique.len());
    }

    proptest! {
        #[test]
        fn parse_never_panics(s in "\\PC*") {
            let _ = s.parse::<NoteId>();
        }
    }
}
