//! Binary record format for the key-value backends.
//!
//! The id is the key (big-endian, so byte order matches numeric order) and
//! the remaining fields are stored as an rkyv archive.

use dbperf_core::Entity;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Error;

/// Stored form of an [`Entity`] without its id.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
struct StoredEntity {
    text: String,
    float64: f64,
    int32: i32,
    int64: i64,
}

/// Serialize an entity's fields.
pub fn encode(entity: &Entity) -> Result<Vec<u8>, Error> {
    let stored = StoredEntity {
        text: entity.text.clone(),
        float64: entity.float64,
        int32: entity.int32,
        int64: entity.int64,
    };
    rkyv::to_bytes::<rkyv::rancor::Error>(&stored)
        .map(|v| v.to_vec())
        .map_err(|e| Error::Codec(e.to_string()))
}

/// Rebuild an entity from its key and stored bytes.
pub fn decode(id: u64, bytes: &[u8]) -> Result<Entity, Error> {
    // Values handed out by the stores carry no alignment guarantee.
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);

    let stored = rkyv::from_bytes::<StoredEntity, rkyv::rancor::Error>(&aligned)
        .map_err(|e| Error::Codec(e.to_string()))?;

    Ok(Entity {
        id,
        text: stored.text,
        float64: stored.float64,
        int32: stored.int32,
        int64: stored.int64,
    })
}

/// Key bytes for an id.
pub fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Id encoded in key bytes.
pub fn id_from_key(key: &[u8]) -> Result<u64, Error> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| Error::InvalidKey(key.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let mut entity = Entity::numbered(7);
        entity.id = 99;

        let bytes = encode(&entity).unwrap();
        let decoded = decode(99, &bytes).unwrap();
        assert_eq!(decoded, entity);
    }

    #[test]
    fn test_decode_unaligned_input() {
        let entity = Entity::numbered(3);
        let bytes = encode(&entity).unwrap();

        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        let decoded = decode(0, &shifted[1..]).unwrap();
        assert_eq!(decoded.text, "Entity no. 3");
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(1, &[1, 2, 3]), Err(Error::Codec(_))));
    }

    #[test]
    fn test_key_order_matches_id_order() {
        assert!(id_key(255) < id_key(256));
        assert_eq!(id_from_key(&id_key(1234)).unwrap(), 1234);
        assert!(matches!(id_from_key(&[0, 1]), Err(Error::InvalidKey(2))));
    }
}
