//! The Executor - single entry point to the datastore.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! matching Reader or Writer call and converts results to outputs.

use std::sync::Arc;

use datastore_engine::{Reader, Writer};
use tracing::debug;

use crate::handlers::{read, write};
use crate::{Command, Output, Result};

/// The command executor - single entry point to the datastore.
///
/// The Executor is **stateless**: it holds shared references to a reader and
/// a writer but maintains no state of its own. All state lives in the
/// datastore.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use datastore_core::{Collection, ReserveIdsRequest};
/// use datastore_engine::MemoryDatastore;
/// use datastore_executor::{Command, Executor, Output};
///
/// let store = Arc::new(MemoryDatastore::new());
/// let executor = Executor::new(store.clone(), store);
///
/// let output = executor
///     .execute(Command::ReserveIds(ReserveIdsRequest::new(
///         Collection::new("topic").unwrap(),
///         2,
///     )))
///     .unwrap();
/// assert_eq!(output, Output::Ids(vec![1, 2]));
/// ```
#[derive(Clone)]
pub struct Executor {
    reader: Arc<dyn Reader>,
    writer: Arc<dyn Writer>,
}

impl Executor {
    /// Create a new executor over a reader and a writer.
    pub fn new(reader: Arc<dyn Reader>, writer: Arc<dyn Writer>) -> Self {
        Self { reader, writer }
    }

    /// Execute a single command.
    ///
    /// Exactly one Reader or Writer call is made; its failure is returned
    /// unchanged apart from the error type conversion.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        debug!(target: "datastore::executor", command = cmd.name(), "Executing command");
        let reader = self.reader.as_ref();
        let writer = self.writer.as_ref();
        match cmd {
            // Read commands
            Command::Get(request) => read::get(reader, &request),
            Command::GetMany(request) => read::get_many(reader, &request),
            Command::GetManyByFqids(request) => read::get_many_by_fqids(reader, &request),
            Command::GetAll(request) => read::get_all(reader, &request),
            Command::Filter(request) => read::filter(reader, &request),
            Command::Exists(request) => read::exists(reader, &request),
            Command::Count(request) => read::count(reader, &request),
            Command::Min(request) => read::min(reader, &request),
            Command::Max(request) => read::max(reader, &request),

            // Write commands
            Command::Write(request) => write::write(writer, &request),
            Command::ReserveIds(request) => write::reserve_ids(writer, &request),
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}
