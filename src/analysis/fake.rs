use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::result::AnalysisResult;

/// `FakeAnalyzer` is an in-memory implementation of the Analyzer trait for
/// testing purposes. It replays scripted raw replies through the tolerant
/// parser and falls back exactly like a real analyzer would once the
/// script runs out or a reply cannot be parsed.
#[derive(Clone)]
pub struct FakeAnalyzer {
    responses: Arc<Mutex<VecDeque<String>>>,
}

impl FakeAnalyzer {
    /// Create a new FakeAnalyzer with no scripted replies
    pub fn new() -> Self {
        FakeAnalyzer {
            responses: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue a raw reply for the next analyze call
    pub fn fake_push_response(&self, raw: &str) {
        self.responses.lock().unwrap().push_back(raw.to_string());
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _content: &str,
        _subject: &str,
        _title: Option<&str>,
    ) -> AnalysisResult {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(raw) => {
                AnalysisResult::from_response(&raw).unwrap_or_else(AnalysisResult::fallback)
            }
            None => AnalysisResult::fallback(),
        }
    }
}

impl Default for FakeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
