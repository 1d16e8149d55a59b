pub mod analyzer;
pub mod fake;
pub mod result;
#[cfg(test)]
mod tests;

pub use analyzer::Analyzer;
pub use fake::FakeAnalyzer;
pub use result::AnalysisResult;
