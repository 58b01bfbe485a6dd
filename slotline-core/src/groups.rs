//! Read-only views of scheduled groups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::report::SchedulingTimes;
use crate::store::CandidateStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub group_number: u32,
    pub members: Vec<String>,
    /// Taken from the lowest-id member; `None` when its schedule is incomplete.
    pub times: Option<SchedulingTimes>,
}

pub fn group_view<S: CandidateStore + ?Sized>(
    store: &S,
    group: u32,
) -> Result<Option<GroupView>, StoreError> {
    let members = store.find_by_group_number(group)?;
    let Some(first) = members.first() else {
        return Ok(None);
    };
    Ok(Some(GroupView {
        group_number: group,
        times: SchedulingTimes::from_candidate(first),
        members: members.iter().map(|c| c.email.clone()).collect(),
    }))
}

/// Every group in ascending order.
pub fn list_groups<S: CandidateStore + ?Sized>(store: &S) -> Result<Vec<GroupView>, StoreError> {
    let mut by_group: BTreeMap<u32, Vec<_>> = BTreeMap::new();
    for c in store.find_all()? {
        if let Some(g) = c.group_number {
            by_group.entry(g).or_default().push(c);
        }
    }
    Ok(by_group
        .into_iter()
        .map(|(group_number, mut members)| {
            members.sort_by(|a, b| a.id.cmp(&b.id));
            GroupView {
                group_number,
                times: members.first().and_then(SchedulingTimes::from_candidate),
                members: members.into_iter().map(|c| c.email).collect(),
            }
        })
        .collect())
}
