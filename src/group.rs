//! Grouping of profile records into one profile per timestamp.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::profile::{ProfileGroup, ProfileRecord};

/// Groups records by timestamp, keeping groups in first-seen order.
pub fn group_by_timestamp<I>(records: I) -> Vec<ProfileGroup>
where
    I: IntoIterator<Item = ProfileRecord>,
{
    let mut groups: Vec<ProfileGroup> = Vec::new();
    let mut index: HashMap<DateTime<Utc>, usize> = HashMap::new();

    for record in records {
        let slot = *index.entry(record.timestamp).or_insert_with(|| {
            groups.push(ProfileGroup::new(record.timestamp));
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    groups
}
