use crate::analysis::{AnalysisResult, Analyzer, FakeAnalyzer};
use crate::model::ResourceKind;

#[test]
fn well_formed_reply_parses() {
    let raw = r#"{
        "aiScore": 84,
        "weakTopics": ["Fractions", "Long Division"],
        "resources": [
            {"title": "Fraction Basics", "url": "https://example.com/fractions", "type": "video"},
            {"title": "Division Drills", "url": "https://example.com/division", "type": "exercise"}
        ]
    }"#;

    let result = AnalysisResult::from_response(raw).unwrap();
    assert_eq!(result.ai_score, 84);
    assert_eq!(result.weak_topics, ["Fractions", "Long Division"]);
    assert_eq!(result.resources.len(), 2);
    assert_eq!(result.resources[0].kind, ResourceKind::Video);
    assert_eq!(result.resources[1].kind, ResourceKind::Exercise);
}

#[test]
fn score_is_rounded_and_clamped() {
    let reply = |score: &str| {
        format!(r#"{{"aiScore": {score}, "weakTopics": [], "resources": []}}"#)
    };

    let parsed = |score: &str| AnalysisResult::from_response(&reply(score)).unwrap().ai_score;

    assert_eq!(parsed("87.5"), 88);
    assert_eq!(parsed("87.4"), 87);
    assert_eq!(parsed("150.7"), 100);
    assert_eq!(parsed("-3"), 0);
    assert_eq!(parsed("0"), 0);
    assert_eq!(parsed("100"), 100);
}

#[test]
fn topics_are_capped_at_five_with_empties_dropped() {
    let raw = r#"{
        "aiScore": 60,
        "weakTopics": ["A", "", "B", 3, "C", "D", "E"],
        "resources": []
    }"#;

    let result = AnalysisResult::from_response(raw).unwrap();
    // Capped to the first five entries before the empty one is dropped
    assert_eq!(result.weak_topics, ["A", "B", "3", "C"]);
}

#[test]
fn resources_are_capped_at_four_with_placeholders_filled_in() {
    let raw = r#"{
        "aiScore": 70,
        "weakTopics": [],
        "resources": [
            {"url": "https://example.com/a", "type": "tutorial"},
            {"title": "No Url", "type": "podcast"},
            {"title": "", "url": "", "type": "video"},
            {"title": "Fourth", "url": "https://example.com/d", "type": "article"},
            {"title": "Fifth", "url": "https://example.com/e", "type": "article"}
        ]
    }"#;

    let result = AnalysisResult::from_response(raw).unwrap();
    assert_eq!(result.resources.len(), 4);

    assert_eq!(result.resources[0].title, "Resource");
    assert_eq!(result.resources[0].kind, ResourceKind::Tutorial);

    assert_eq!(result.resources[1].url, "https://example.com");
    assert_eq!(result.resources[1].kind, ResourceKind::Article);

    assert_eq!(result.resources[2].title, "Resource");
    assert_eq!(result.resources[2].url, "https://example.com");
    assert_eq!(result.resources[2].kind, ResourceKind::Video);

    assert_eq!(result.resources[3].title, "Fourth");
}

#[test]
fn structurally_wrong_replies_yield_none() {
    for raw in [
        "not json at all",
        r#"{"aiScore": "ninety", "weakTopics": [], "resources": []}"#,
        r#"{"weakTopics": [], "resources": []}"#,
        r#"{"aiScore": 80, "weakTopics": "Fractions", "resources": []}"#,
        r#"{"aiScore": 80, "weakTopics": []}"#,
        "[]",
    ] {
        assert!(AnalysisResult::from_response(raw).is_none(), "raw: {raw}");
    }
}

#[test]
fn fallback_is_the_fixed_low_confidence_verdict() {
    let fallback = AnalysisResult::fallback();
    assert_eq!(fallback.ai_score, 75);
    assert_eq!(fallback.weak_topics, ["Concept Clarity", "Practice"]);
    assert_eq!(fallback.resources.len(), 2);
    assert_eq!(fallback.resources[0].kind, ResourceKind::Article);
    assert_eq!(fallback.resources[1].kind, ResourceKind::Exercise);
}

#[tokio::test]
async fn fake_analyzer_replays_scripted_replies_then_falls_back() {
    let analyzer = FakeAnalyzer::new();
    analyzer.fake_push_response(
        r#"{"aiScore": 91, "weakTopics": ["Grammar"], "resources": []}"#,
    );

    let first = analyzer.analyze("essay text", "English", Some("My Essay")).await;
    assert_eq!(first.ai_score, 91);
    assert_eq!(first.weak_topics, ["Grammar"]);

    // Script exhausted
    let second = analyzer.analyze("essay text", "English", None).await;
    assert_eq!(second, AnalysisResult::fallback());
}

#[tokio::test]
async fn fake_analyzer_falls_back_on_garbage_replies() {
    let analyzer = FakeAnalyzer::new();
    analyzer.fake_push_response("** model refused to answer **");

    let result = analyzer.analyze("content", "Biology", None).await;
    assert_eq!(result, AnalysisResult::fallback());
}
