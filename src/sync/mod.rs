pub mod effects;
pub mod merge;
pub mod orchestrator;

pub use effects::EffectRunner;
pub use merge::{MergePolicy, MergeStrategy, PerRecordLastWriteWins, WholeReplace};
pub use orchestrator::{SubmissionSync, SyncOptions};
