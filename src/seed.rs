use chrono::{Duration, Utc};

use crate::model::{Resource, ResourceKind, Submission, SubmissionStatus};

/// Built-in dataset used when no durable cache exists yet (first run on a
/// device) or when the cached payload cannot be read.
///
/// Ordered newest first, the same order the record store maintains.
pub fn seed_submissions() -> Vec<Submission> {
    let now = Utc::now();
    vec![
        Submission {
            id: "sub-demo-1".to_string(),
            student_id: "stu-101".to_string(),
            student_name: "Amina Okafor".to_string(),
            file_name: "algebra-worksheet.pdf".to_string(),
            file_url: "#".to_string(),
            subject: "Mathematics".to_string(),
            status: SubmissionStatus::Analyzed,
            ai_score: Some(88),
            teacher_approved: false,
            weak_topics: vec!["Quadratic Equations".to_string()],
            recommended_resources: vec![Resource {
                title: "Solving Quadratics Step by Step".to_string(),
                url: "https://example.com/quadratics".to_string(),
                kind: ResourceKind::Video,
            }],
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        },
        Submission {
            id: "sub-demo-2".to_string(),
            student_id: "stu-102".to_string(),
            student_name: "David Kim".to_string(),
            file_name: "persuasive-essay.docx".to_string(),
            file_url: "#".to_string(),
            subject: "English".to_string(),
            status: SubmissionStatus::Approved,
            ai_score: Some(92),
            teacher_approved: true,
            weak_topics: Vec::new(),
            recommended_resources: Vec::new(),
            created_at: now - Duration::days(2),
            updated_at: now - Duration::days(1),
        },
        Submission {
            id: "sub-demo-3".to_string(),
            student_id: "stu-103".to_string(),
            student_name: "Grace Mwangi".to_string(),
            file_name: "cell-biology-quiz.pdf".to_string(),
            file_url: "#".to_string(),
            subject: "Biology".to_string(),
            status: SubmissionStatus::Rejected,
            ai_score: Some(41),
            teacher_approved: false,
            weak_topics: vec![
                "Photosynthesis".to_string(),
                "Cell Structure".to_string(),
            ],
            recommended_resources: vec![
                Resource {
                    title: "Photosynthesis Explained".to_string(),
                    url: "https://example.com/photosynthesis".to_string(),
                    kind: ResourceKind::Article,
                },
                Resource {
                    title: "Cell Structure Drills".to_string(),
                    url: "https://example.com/cell-drills".to_string(),
                    kind: ResourceKind::Exercise,
                },
            ],
            created_at: now - Duration::days(4),
            updated_at: now - Duration::days(3),
        },
        Submission {
            id: "sub-demo-4".to_string(),
            student_id: "stu-104".to_string(),
            student_name: "Priya Sharma".to_string(),
            file_name: "titration-lab-report.pdf".to_string(),
            file_url: "#".to_string(),
            subject: "Chemistry".to_string(),
            status: SubmissionStatus::Pending,
            ai_score: None,
            teacher_approved: false,
            weak_topics: Vec::new(),
            recommended_resources: Vec::new(),
            created_at: now - Duration::days(6),
            updated_at: now - Duration::days(6),
        },
    ]
}
