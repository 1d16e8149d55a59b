pub mod error;
pub mod fake;
pub mod mirror;
pub mod postgres;

pub use error::RemoteError;
pub use fake::FakeMirror;
pub use mirror::RemoteMirror;
pub use postgres::PostgresMirror;
