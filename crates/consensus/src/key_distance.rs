//! Key distance between a candidate minter and the ideal minter for a height.
//!
//! The parent block determines an "ideal" key for the next height. Every
//! candidate minter key is perturbed with the new height and scored by how
//! close it lands to that ideal, with the gap divided by the minter's level.
//! Higher-level minters therefore tend to score higher, but any minter can
//! win a given height.

use mintcore_types::{PublicKey, H256};
use num_bigint::BigUint;

use crate::types::{max_distance, WeightError, WeightResult};

/// Ideal minter key for the block following `parent_height`.
///
/// `SHA-256(be_i64(parent_height) ++ parent_reference)`
pub fn ideal_minter_key(parent_height: u32, parent_reference: &[u8]) -> H256 {
    let height_bytes = i64::from(parent_height).to_be_bytes();
    H256::digest_concat(&[&height_bytes[..], parent_reference])
}

/// Candidate key perturbed with the height it is minting for.
///
/// `SHA-256(be_i64(height) ++ public_key)`
pub fn perturbed_minter_key(height: u32, public_key: &PublicKey) -> H256 {
    let height_bytes = i64::from(height).to_be_bytes();
    H256::digest_concat(&[&height_bytes[..], public_key.as_bytes()])
}

/// Scores `candidate_key` as the minter of the block after `parent_height`.
///
/// Returns `MAX_DISTANCE - |ideal - perturbed| / level`. Larger is better.
/// A level of 0 means the level was never resolved and is rejected.
pub fn key_distance(
    parent_height: u32,
    parent_reference: &[u8],
    candidate_key: &PublicKey,
    candidate_level: u8,
) -> WeightResult<BigUint> {
    if candidate_level == 0 {
        return Err(WeightError::UnresolvedMinterLevel {
            height: parent_height.saturating_add(1),
        });
    }

    let ideal = BigUint::from_bytes_be(ideal_minter_key(parent_height, parent_reference).as_bytes());
    let perturbed = BigUint::from_bytes_be(
        perturbed_minter_key(parent_height.saturating_add(1), candidate_key).as_bytes(),
    );

    let raw = if ideal >= perturbed {
        ideal - perturbed
    } else {
        perturbed - ideal
    };

    // raw / level <= raw < 2^256, so this never underflows
    Ok(max_distance() - raw / BigUint::from(candidate_level))
}
