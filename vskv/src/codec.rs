//! Root-block codec: serializes and deserializes the `KeyMap` that is the
//! payload of the root mutable block.
//!
//! Grounded on `codec::bytes_codec::BytesCodec`'s choice of JSON as the wire
//! format, simplified to a single value (a root block holds exactly one
//! `KeyMap`, not a stream of length-prefixed records). JSON gives forward
//! compatibility for free: an unknown field in a newer writer's payload is
//! silently ignored by an older reader's `Deserialize` impl.

use crate::error::CResult;
use crate::model::KeyMap;

pub fn encode(map: &KeyMap) -> CResult<Vec<u8>> {
    Ok(serde_json::to_vec(map)?)
}

/// Decoding an empty payload -- either an explicit empty slice or a root
/// block that has never been written -- yields an empty `KeyMap`.
pub fn decode(bytes: &[u8]) -> CResult<KeyMap> {
    if bytes.is_empty() {
        return Ok(KeyMap::default());
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Address, ValueDescriptor, ValueStore};

    #[test]
    fn decode_empty_is_empty_map() {
        assert_eq!(decode(&[]).unwrap(), KeyMap::default());
    }

    #[test]
    fn round_trips_a_populated_map() {
        let mut map = KeyMap::default();
        map.insert(
            "some/key".to_string(),
            ValueDescriptor {
                current: Some(ValueStore { address: Address(vec![1, 2, 3]) }),
                edits: vec![],
            },
        );

        let encoded = encode(&map).unwrap();
        let decoded = decode(&encoded).unwrap();

        assert_eq!(map.len(), decoded.len());
        assert_eq!(
            map.get("some/key").unwrap().current,
            decoded.get("some/key").unwrap().current
        );
    }

    #[test]
    fn unknown_field_is_tolerated() {
        let json = br#"{"some/key":{"current":{"address":[1,2,3]},"edits":[],"future_field":42}}"#;
        let decoded = decode(json).unwrap();
        assert_eq!(decoded.len(), 1);
    }
}
