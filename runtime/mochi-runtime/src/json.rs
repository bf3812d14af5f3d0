//! `json` namespace.

use mochi_obj_model::Handle;

use crate::error::HostError;
use crate::value::{HostArena, HostValue};

/// Parses JSON bytes into a generic value tree held by one arena entry.
pub fn parse(arena: &HostArena, bytes: &[u8]) -> Result<Handle, HostError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(arena.add(HostValue::from_json(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env;
    use mochi_obj_model::FaultKind;

    #[test]
    fn parsed_tree_is_walkable() {
        let arena = HostArena::new();
        let root = parse(&arena, br#"{"results":[{"id":"a","score":9.5}],"total":1}"#).unwrap();
        let results = env::object_get(&arena, root, "results").unwrap();
        assert_eq!(env::array_len(&arena, results).unwrap(), 1);
        let first = env::array_get(&arena, results, 0).unwrap();
        let score = env::object_get(&arena, first, "score").unwrap();
        assert_eq!(env::read_float(&arena, score).unwrap(), 9.5);
        let total = env::object_get(&arena, root, "total").unwrap();
        assert_eq!(env::read_int(&arena, total).unwrap(), 1);
    }

    #[test]
    fn object_keys_follow_the_document() {
        let arena = HostArena::new();
        let root = parse(&arena, br#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        let keys = env::object_keys(&arena, root).unwrap();
        let keys = arena.get(keys).unwrap();
        let names: Vec<&str> = keys
            .expect_array()
            .unwrap()
            .iter()
            .map(|key| key.expect_str().unwrap())
            .collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn malformed_json_is_a_document_error() {
        let arena = HostArena::new();
        assert_eq!(parse(&arena, b"{\"a\":").unwrap_err().kind(), FaultKind::DocumentError);
    }
}
