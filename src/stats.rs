use serde::Serialize;

use crate::model::Submission;

/// Read-side summary of a submission collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassroomStats {
    pub total: usize,
    pub approved: usize,
    pub average_score: i32,
    pub weak_topics_percentage: i32,
}

/// Computes summary metrics over a snapshot.
///
/// The average covers only records with a score; records still awaiting
/// analysis do not drag it down. An empty collection yields all zeros.
pub fn classroom_stats(records: &[Submission]) -> ClassroomStats {
    let total = records.len();
    let approved = records.iter().filter(|s| s.teacher_approved).count();

    let scores: Vec<i32> = records.iter().filter_map(|s| s.ai_score).collect();
    let average_score = if scores.is_empty() {
        0
    } else {
        (scores.iter().map(|&v| f64::from(v)).sum::<f64>() / scores.len() as f64).round() as i32
    };

    let with_weak_topics = records.iter().filter(|s| !s.weak_topics.is_empty()).count();
    let weak_topics_percentage =
        ((with_weak_topics as f64 / total.max(1) as f64) * 100.0).round() as i32;

    ClassroomStats {
        total,
        approved,
        average_score,
        weak_topics_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_submission;

    #[test]
    fn averages_only_scored_records_and_rounds() {
        let mut records = vec![
            create_test_submission("sub-1", "stu-1"),
            create_test_submission("sub-2", "stu-2"),
            create_test_submission("sub-3", "stu-3"),
            create_test_submission("sub-4", "stu-4"),
        ];
        records[0].ai_score = Some(80);
        records[1].ai_score = Some(90);
        records[2].ai_score = Some(70);
        records[3].ai_score = None;
        records[0].weak_topics = vec!["Fractions".to_string()];
        records[1].weak_topics = vec!["Grammar".to_string()];

        let stats = classroom_stats(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.average_score, 80);
        assert_eq!(stats.weak_topics_percentage, 50);
        assert_eq!(stats.approved, 0);
    }

    #[test]
    fn empty_collection_yields_zeros() {
        let stats = classroom_stats(&[]);
        assert_eq!(
            stats,
            ClassroomStats {
                total: 0,
                approved: 0,
                average_score: 0,
                weak_topics_percentage: 0,
            }
        );
    }

    #[test]
    fn unscored_collection_has_zero_average() {
        let mut records = vec![
            create_test_submission("sub-1", "stu-1"),
            create_test_submission("sub-2", "stu-2"),
        ];
        records[0].ai_score = None;
        records[1].ai_score = None;
        records[0].teacher_approved = true;

        let stats = classroom_stats(&records);
        assert_eq!(stats.average_score, 0);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn weak_topic_percentage_rounds_to_nearest() {
        let mut records = vec![
            create_test_submission("sub-1", "stu-1"),
            create_test_submission("sub-2", "stu-2"),
            create_test_submission("sub-3", "stu-3"),
        ];
        records[0].weak_topics = vec!["Algebra".to_string()];

        // 1 of 3 is 33.33%, rounds to 33
        assert_eq!(classroom_stats(&records).weak_topics_percentage, 33);
    }
}
