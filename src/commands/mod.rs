//! CLI commands implementation
//!
//! Every store command opens exactly one session and closes it on every
//! path, including failures part way through.

pub mod create;
pub mod import;
pub mod query;

pub use create::*;
pub use import::*;
pub use query::*;

use crate::error::Result;
use crate::store::{CollectionStore, Session};

/// Close the session, then hand back the command outcome
///
/// A command failure wins over a close failure.
pub(crate) async fn finish<S: CollectionStore, T>(
    session: Session<S>,
    outcome: Result<T>,
) -> Result<T> {
    let closed = session.close().await;
    let value = outcome?;
    closed?;
    Ok(value)
}
