use serde_json::Value;

use crate::model::{Resource, ResourceKind};

/// Verdict produced by the external analysis collaborator for one
/// submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub ai_score: i32,
    pub weak_topics: Vec<String>,
    pub resources: Vec<Resource>,
}

impl AnalysisResult {
    /// Parses a raw model reply. The reply contract is a JSON object with
    /// camelCase keys: `aiScore` (number), `weakTopics` (array) and
    /// `resources` (array of `{title, url, type}` objects).
    ///
    /// Tolerant of sloppy replies: the score is rounded and clamped to
    /// 0..=100, topics are capped at 5 with empty entries dropped,
    /// resources are capped at 4 with placeholder titles and urls filled
    /// in, and an unknown resource type reads as an article. A reply
    /// missing any of the three keys, or not valid JSON at all, yields
    /// `None`.
    pub fn from_response(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;

        let score = value.get("aiScore")?.as_f64()?;
        let topics = value.get("weakTopics")?.as_array()?;
        let resources = value.get("resources")?.as_array()?;

        let ai_score = score.round().clamp(0.0, 100.0) as i32;

        let weak_topics = topics
            .iter()
            .take(5)
            .map(|t| match t.as_str() {
                Some(s) => s.to_string(),
                None => t.to_string(),
            })
            .filter(|t| !t.is_empty())
            .collect();

        let resources = resources
            .iter()
            .take(4)
            .map(|r| Resource {
                title: non_empty_str(r.get("title"))
                    .unwrap_or("Resource")
                    .to_string(),
                url: non_empty_str(r.get("url"))
                    .unwrap_or("https://example.com")
                    .to_string(),
                kind: match r.get("type").and_then(Value::as_str) {
                    Some("video") => ResourceKind::Video,
                    Some("exercise") => ResourceKind::Exercise,
                    Some("tutorial") => ResourceKind::Tutorial,
                    _ => ResourceKind::Article,
                },
            })
            .collect();

        Some(AnalysisResult {
            ai_score,
            weak_topics,
            resources,
        })
    }

    /// Fixed low-confidence verdict used whenever a reply cannot be parsed
    pub fn fallback() -> Self {
        AnalysisResult {
            ai_score: 75,
            weak_topics: vec!["Concept Clarity".to_string(), "Practice".to_string()],
            resources: vec![
                Resource {
                    title: "Study Guide".to_string(),
                    url: "https://example.com/guide".to_string(),
                    kind: ResourceKind::Article,
                },
                Resource {
                    title: "Practice Set".to_string(),
                    url: "https://example.com/practice".to_string(),
                    kind: ResourceKind::Exercise,
                },
            ],
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}
