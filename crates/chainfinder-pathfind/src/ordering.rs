//! Deterministic ordering and fingerprinting of solution chains.

use crate::types::Chain;

/// Sort chains by canonical key, then by length, and drop duplicates.
///
/// Keys can collide when names contain the delimiters, so hop fields break
/// the remaining ties and only identical chains are collapsed. Identical
/// chains arise when two routes connect the same pair of systems.
pub fn order(chains: Vec<Chain>) -> Vec<Chain> {
    let mut keyed: Vec<(String, Chain)> = chains.into_iter().map(|c| (c.key(), c)).collect();
    keyed.sort_by(|(ka, a), (kb, b)| {
        ka.cmp(kb)
            .then_with(|| a.len().cmp(&b.len()))
            .then_with(|| a.hops().cmp(b.hops()))
    });
    keyed.dedup_by(|(_, a), (_, b)| a == b);
    keyed.into_iter().map(|(_, c)| c).collect()
}

/// BLAKE3 hex digest over the ordered chains.
///
/// Every hop field is length-prefixed, so chains with colliding keys still
/// hash differently.
pub fn digest(chains: &[Chain]) -> String {
    let mut hasher = blake3::Hasher::new();
    for chain in chains {
        hasher.update(&(chain.len() as u64).to_le_bytes());
        for hop in chain {
            for field in [
                hop.from.as_str(),
                hop.via.as_str(),
                hop.exploit.as_str(),
                hop.to.as_str(),
            ] {
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}
