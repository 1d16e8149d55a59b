use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Review state of a submission as it moves through the grading flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Analyzed,
    Approved,
    Rejected,
    Reviewed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Analyzed => "analyzed",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown submission status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "analyzed" => Ok(SubmissionStatus::Analyzed),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "reviewed" => Ok(SubmissionStatus::Reviewed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Kind of study material recommended alongside an analyzed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Article,
    Exercise,
    Tutorial,
}

/// A recommended study resource attached to an analyzed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

/// A student submission record, the unit of agreement between replicas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub file_name: String,
    pub file_url: String,
    pub subject: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub ai_score: Option<i32>,
    #[serde(default)]
    pub teacher_approved: bool,
    #[serde(default)]
    pub weak_topics: Vec<String>,
    #[serde(default)]
    pub recommended_resources: Vec<Resource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Refreshes `updated_at`. Never moves it backward, so a stepped
    /// clock cannot make a record look older than its last change.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Generates a collection-unique submission id
pub fn new_submission_id() -> String {
    format!("sub-{}", Uuid::new_v4())
}

/// Input for creating a submission before any analysis has run
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    pub student_id: String,
    pub student_name: String,
    pub file_name: String,
    pub subject: String,
    /// Where the submitted file can be fetched; "#" when not yet uploaded
    pub file_url: Option<String>,
}

/// Field-by-field overlay applied by `update`; absent fields stay untouched.
/// The id and `created_at` are not addressable through a patch.
#[derive(Debug, Clone, Default)]
pub struct SubmissionPatch {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub subject: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub ai_score: Option<i32>,
    pub teacher_approved: Option<bool>,
    pub weak_topics: Option<Vec<String>>,
    pub recommended_resources: Option<Vec<Resource>>,
}

impl SubmissionPatch {
    /// Produces the patched copy of `base` with `updated_at` refreshed
    pub fn apply(&self, base: &Submission) -> Submission {
        let mut next = base.clone();
        if let Some(v) = &self.student_id {
            next.student_id = v.clone();
        }
        if let Some(v) = &self.student_name {
            next.student_name = v.clone();
        }
        if let Some(v) = &self.file_name {
            next.file_name = v.clone();
        }
        if let Some(v) = &self.file_url {
            next.file_url = v.clone();
        }
        if let Some(v) = &self.subject {
            next.subject = v.clone();
        }
        if let Some(v) = self.status {
            next.status = v;
        }
        if let Some(v) = self.ai_score {
            next.ai_score = Some(v);
        }
        if let Some(v) = self.teacher_approved {
            next.teacher_approved = v;
        }
        if let Some(v) = &self.weak_topics {
            next.weak_topics = v.clone();
        }
        if let Some(v) = &self.recommended_resources {
            next.recommended_resources = v.clone();
        }
        next.touch();
        next
    }
}
