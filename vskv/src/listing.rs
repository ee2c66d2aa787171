//! The listing engine: sorted enumeration over the key map with S3-style
//! prefix, delimiter, marker, and max-keys semantics.
//!
//! Grounded on `original_source/.../server.go`'s `List` handler. The marker
//! semantics are preserved exactly as observed there: a **suffix** match
//! (`hasSuffix`), not equality or lexicographic `>` -- an intentional,
//! spec-preserved quirk, not a bug (see design notes).

use crate::model::KeyMap;

#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub prefix: String,
    pub delimiter: String,
    pub marker: String,
    pub max_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingResult {
    pub items: Vec<String>,
    pub prefixes: Vec<String>,
    pub truncated: bool,
}

pub struct ListingEngine;

impl ListingEngine {
    pub fn list(map: &KeyMap, req: &ListingRequest) -> ListingResult {
        let mut items = Vec::new();
        let mut prefixes = Vec::new();
        let mut truncated = false;

        // `BTreeMap` iteration is already lexicographic by key, so no
        // separate sort step is needed.
        let mut candidates = map.keys().filter(|key| key.starts_with(&req.prefix));

        let mut past_marker = req.marker.is_empty();

        while let Some(key) = candidates.next() {
            if !past_marker {
                if key.ends_with(&req.marker) {
                    past_marker = true;
                }
                continue;
            }

            if req.max_keys > 0 && items.len() >= req.max_keys {
                truncated = true;
                break;
            }

            if !req.delimiter.is_empty() {
                let tail = &key[req.prefix.len()..];
                if let Some(pos) = tail.find(req.delimiter.as_str()) {
                    if pos > 0 {
                        let common = &key[..req.prefix.len() + pos + req.delimiter.len()];
                        if !prefixes.iter().any(|p: &String| p == common) {
                            prefixes.push(common.to_string());
                        }
                        continue;
                    }
                }
            }

            items.push(key.clone());
        }

        ListingResult { items, prefixes, truncated }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::ValueDescriptor;

    fn map_with_keys(keys: &[&str]) -> KeyMap {
        let mut map = KeyMap::default();
        for key in keys {
            map.insert(key.to_string(), ValueDescriptor::default());
        }
        map
    }

    #[test]
    fn empty_map_lists_nothing() {
        let map = KeyMap::default();
        let result = ListingEngine::list(&map, &ListingRequest::default());
        assert_eq!(result, ListingResult::default());
    }

    #[test]
    fn items_come_back_sorted() {
        let map = map_with_keys(&["b", "a", "c"]);
        let result = ListingEngine::list(&map, &ListingRequest::default());
        assert_eq!(result.items, vec!["a", "b", "c"]);
    }

    #[test]
    fn prefix_filters() {
        let map = map_with_keys(&["dir_1/a", "dir_2/a"]);
        let req = ListingRequest { prefix: "dir_1".to_string(), ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.items, vec!["dir_1/a"]);
    }

    #[test]
    fn delimiter_collects_common_prefixes_in_first_seen_order() {
        let map = map_with_keys(&["dir_2/a", "dir_1/a", "dir_1/b"]);
        let req = ListingRequest { delimiter: "/".to_string(), ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.prefixes, vec!["dir_1/", "dir_2/"]);
        assert_eq!(result.items.len(), 3);
    }

    #[test]
    fn prefix_and_delimiter_together() {
        let map = map_with_keys(&["dir_1/a/0", "dir_1/b/1", "dir_2/a/50"]);
        let req = ListingRequest {
            prefix: "dir_1/".to_string(),
            delimiter: "/".to_string(),
            ..Default::default()
        };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.prefixes, vec!["dir_1/a/", "dir_1/b/"]);
    }

    #[test]
    fn max_keys_truncates() {
        let map = map_with_keys(&["a", "b", "c"]);
        let req = ListingRequest { max_keys: 2, ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.items, vec!["a", "b"]);
        assert!(result.truncated);
    }

    #[test]
    fn max_keys_zero_never_truncates() {
        let map = map_with_keys(&["a", "b", "c"]);
        let req = ListingRequest { max_keys: 0, ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.items.len(), 3);
        assert!(!result.truncated);
    }

    #[test]
    fn marker_is_a_suffix_match_not_equality() {
        let map = map_with_keys(&["x/alpha", "x/beta", "x/gamma"]);
        let req = ListingRequest { marker: "alpha".to_string(), ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert_eq!(result.items, vec!["x/beta", "x/gamma"]);
    }

    #[test]
    fn truncation_when_exactly_exhausted_is_not_reported() {
        let map = map_with_keys(&["a", "b"]);
        let req = ListingRequest { max_keys: 2, ..Default::default() };
        let result = ListingEngine::list(&map, &req);
        assert!(!result.truncated);
    }
}
