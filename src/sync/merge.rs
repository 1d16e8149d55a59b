use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::model::Submission;

/// Policy seam for whole-collection overwrites. Remote pulls and replica
/// notifications both funnel their incoming snapshot through one of these
/// before it replaces the local collection.
pub trait MergeStrategy: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Combines the current local collection with an incoming snapshot,
    /// producing the collection to keep
    fn merge(&self, current: &[Submission], incoming: Vec<Submission>) -> Vec<Submission>;
}

/// Takes the incoming snapshot verbatim, dropping local records it does
/// not carry. A local write racing a concurrent overwrite can be lost;
/// the collection is still always whole and internally consistent.
pub struct WholeReplace;

impl MergeStrategy for WholeReplace {
    fn name(&self) -> &'static str {
        "whole_replace"
    }

    fn merge(&self, _current: &[Submission], incoming: Vec<Submission>) -> Vec<Submission> {
        incoming
    }
}

/// Per-record reconciliation: for each id the newer `updated_at` wins,
/// records only one side knows survive, and the result is re-sorted
/// newest first.
pub struct PerRecordLastWriteWins;

impl MergeStrategy for PerRecordLastWriteWins {
    fn name(&self) -> &'static str {
        "per_record_last_write_wins"
    }

    fn merge(&self, current: &[Submission], incoming: Vec<Submission>) -> Vec<Submission> {
        let mut incoming_by_id: HashMap<String, Submission> =
            incoming.into_iter().map(|s| (s.id.clone(), s)).collect();

        let mut merged: Vec<Submission> = Vec::with_capacity(current.len() + incoming_by_id.len());

        for local in current {
            match incoming_by_id.remove(local.id.as_str()) {
                // Ties go to the incoming side: it already round-tripped
                // through another replica or the remote
                Some(remote) if remote.updated_at >= local.updated_at => merged.push(remote),
                Some(_) | None => merged.push(local.clone()),
            }
        }

        merged.extend(incoming_by_id.into_values());
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged
    }
}

/// Named merge policies for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    #[default]
    WholeReplace,
    PerRecordLastWriteWins,
}

impl MergePolicy {
    /// Builds the strategy this policy names
    pub fn strategy(self) -> Arc<dyn MergeStrategy> {
        match self {
            MergePolicy::WholeReplace => Arc::new(WholeReplace),
            MergePolicy::PerRecordLastWriteWins => Arc::new(PerRecordLastWriteWins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_submission_at;
    use chrono::{Duration, Utc};

    #[test]
    fn whole_replace_takes_the_incoming_snapshot_verbatim() {
        let now = Utc::now();
        let current = vec![create_test_submission_at("sub-local", "stu-1", now)];
        let incoming = vec![
            create_test_submission_at("sub-a", "stu-2", now),
            create_test_submission_at("sub-b", "stu-3", now - Duration::hours(1)),
        ];

        let merged = WholeReplace.merge(&current, incoming.clone());
        assert_eq!(merged, incoming);
    }

    #[test]
    fn last_write_wins_keeps_the_newer_local_record() {
        let now = Utc::now();
        let mut local = create_test_submission_at("sub-1", "stu-1", now - Duration::days(1));
        local.updated_at = now;
        local.ai_score = Some(95);

        let mut stale = create_test_submission_at("sub-1", "stu-1", now - Duration::days(1));
        stale.updated_at = now - Duration::hours(2);
        stale.ai_score = Some(40);

        let merged = PerRecordLastWriteWins.merge(&[local.clone()], vec![stale]);
        assert_eq!(merged, vec![local]);
    }

    #[test]
    fn last_write_wins_prefers_the_incoming_side_on_ties() {
        let now = Utc::now();
        let local = create_test_submission_at("sub-1", "stu-1", now);
        let mut incoming = local.clone();
        incoming.subject = "Physics".to_string();

        let merged = PerRecordLastWriteWins.merge(&[local], vec![incoming.clone()]);
        assert_eq!(merged, vec![incoming]);
    }

    #[test]
    fn last_write_wins_keeps_records_only_one_side_has() {
        let now = Utc::now();
        let local_only = create_test_submission_at("sub-local", "stu-1", now - Duration::hours(1));
        let incoming_only = create_test_submission_at("sub-remote", "stu-2", now);

        let merged =
            PerRecordLastWriteWins.merge(&[local_only.clone()], vec![incoming_only.clone()]);

        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&local_only));
        assert!(merged.contains(&incoming_only));
    }

    #[test]
    fn last_write_wins_sorts_newest_first() {
        let now = Utc::now();
        let older = create_test_submission_at("sub-old", "stu-1", now - Duration::days(2));
        let newer = create_test_submission_at("sub-new", "stu-2", now);
        let middle = create_test_submission_at("sub-mid", "stu-3", now - Duration::days(1));

        let merged = PerRecordLastWriteWins.merge(&[older, newer], vec![middle]);

        let ids: Vec<&str> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["sub-new", "sub-mid", "sub-old"]);
    }

    #[test]
    fn policies_parse_from_their_config_names() {
        let policy: MergePolicy = serde_json::from_str("\"whole_replace\"").unwrap();
        assert_eq!(policy, MergePolicy::WholeReplace);

        let policy: MergePolicy = serde_json::from_str("\"per_record_last_write_wins\"").unwrap();
        assert_eq!(policy, MergePolicy::PerRecordLastWriteWins);

        assert_eq!(MergePolicy::default(), MergePolicy::WholeReplace);
        assert!(serde_json::from_str::<MergePolicy>("\"newest_collection\"").is_err());
    }

    #[test]
    fn strategies_report_their_policy_names() {
        assert_eq!(MergePolicy::WholeReplace.strategy().name(), "whole_replace");
        assert_eq!(
            MergePolicy::PerRecordLastWriteWins.strategy().name(),
            "per_record_last_write_wins"
        );
    }
}
