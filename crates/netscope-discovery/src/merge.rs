//! Merging neighbor lists from several protocols
//!
//! The same physical link is often reported by both LLDP and CDP with
//! different metadata. Links are identified by their endpoint triple only, so
//! the first report of a link is kept along with its metadata.

use netscope_core::NeighborRecord;
use std::collections::HashSet;

/// Concatenate LLDP then CDP records and drop repeated links
pub fn merge_neighbors(lldp: Vec<NeighborRecord>, cdp: Vec<NeighborRecord>) -> Vec<NeighborRecord> {
    let mut combined = lldp;
    combined.extend(cdp);
    dedup_neighbors(combined)
}

/// Keep the first record of each link, preserving first-seen order
pub fn dedup_neighbors(records: Vec<NeighborRecord>) -> Vec<NeighborRecord> {
    let first_seen: Vec<bool> = {
        let mut seen = HashSet::with_capacity(records.len());
        records.iter().map(|r| seen.insert(r.link_key())).collect()
    };

    records
        .into_iter()
        .zip(first_seen)
        .filter_map(|(record, first)| first.then_some(record))
        .collect()
}
