pub mod record_store;
#[cfg(test)]
mod tests;

pub use record_store::{Applied, RecordStore};
