use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{Action, GameState};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_state(state: &GameState) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(state)?)
}

pub fn deserialize_state(bytes: &[u8]) -> Result<GameState, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_action(action: &Action) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(action)?)
}

pub fn deserialize_action(bytes: &[u8]) -> Result<Action, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_state_json(state: &GameState) -> Result<String, WireError> {
    Ok(serde_json::to_string(state)?)
}

pub fn deserialize_state_json(json: &str) -> Result<GameState, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_action_json(action: &Action) -> Result<String, WireError> {
    Ok(serde_json::to_string(action)?)
}

pub fn deserialize_action_json(json: &str) -> Result<Action, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic state hash for sync checks between broadcasts.
///
/// Hashes the MessagePack-serialized state using FNV-1a 64-bit. `GameState`
/// keeps its maps in `BTreeMap`s so the serialization, and therefore this
/// hash, is stable for equal states.
pub fn state_hash(state: &GameState) -> Result<u64, WireError> {
    let bytes = serialize_state(state)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RegionId;

    #[test]
    fn action_roundtrip() {
        let action = Action::InitiateFortress {
            target: RegionId::Ladoga,
        };
        let bytes = serialize_action(&action).unwrap();
        let back = deserialize_action(&bytes).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn fnv_is_stable() {
        assert_eq!(hash_bytes_fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(hash_bytes_fnv1a64(b"a"), hash_bytes_fnv1a64(b"a"));
        assert_ne!(hash_bytes_fnv1a64(b"a"), hash_bytes_fnv1a64(b"b"));
    }
}
