//! Cross-partition deduplication
//!
//! The card API is queried once per sync-state partition and the partitions
//! can overlap. Merging keeps one record per key, preferring the copy that
//! knows which partition it belongs to.

use std::collections::HashMap;

use spendledger_domain::{ExternalRecord, SyncState};

/// Items that can be merged across fetch partitions.
pub trait PartitionTagged {
    fn merge_key(&self) -> &str;
    fn partition_tag(&self) -> Option<SyncState>;
}

impl PartitionTagged for ExternalRecord {
    fn merge_key(&self) -> &str {
        &self.source_id
    }

    fn partition_tag(&self) -> Option<SyncState> {
        self.sync_state
    }
}

/// Merge partitions into one list with unique keys.
///
/// Order follows first appearance. A later duplicate replaces the kept entry
/// only when the kept entry has no partition tag and the newcomer does; two
/// tagged copies keep the first.
pub fn merge_preferring_non_null<T, I>(partitions: I) -> Vec<T>
where
    T: PartitionTagged,
    I: IntoIterator<Item = Vec<T>>,
{
    let mut merged: Vec<T> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for partition in partitions {
        for item in partition {
            match positions.get(item.merge_key()) {
                Some(&index) => {
                    if merged[index].partition_tag().is_none() && item.partition_tag().is_some() {
                        merged[index] = item;
                    }
                }
                None => {
                    positions.insert(item.merge_key().to_string(), merged.len());
                    merged.push(item);
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendledger_domain::SourceKind;

    fn record(id: &str, tag: Option<SyncState>) -> ExternalRecord {
        let mut record = ExternalRecord::new(SourceKind::CreditCard, id, "2025-10-01", 1200, "Vendor");
        record.sync_state = tag;
        record
    }

    #[test]
    fn tagged_copy_replaces_untagged_one() {
        let merged = merge_preferring_non_null(vec![
            vec![record("t1", None), record("t2", None)],
            vec![record("t1", Some(SyncState::Synced))],
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source_id, "t1");
        assert_eq!(merged[0].sync_state, Some(SyncState::Synced));
    }

    #[test]
    fn first_tagged_copy_wins() {
        let merged = merge_preferring_non_null(vec![
            vec![record("t1", Some(SyncState::NotSynced))],
            vec![record("t1", Some(SyncState::Error))],
        ]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].sync_state, Some(SyncState::NotSynced));
    }

    #[test]
    fn keeps_first_seen_order() {
        let merged = merge_preferring_non_null(vec![
            vec![record("b", None)],
            vec![record("a", None), record("b", Some(SyncState::Synced)), record("c", None)],
        ]);

        let ids: Vec<&str> = merged.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
