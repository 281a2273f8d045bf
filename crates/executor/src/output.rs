//! Output enum for command execution results.
//!
//! Every command produces exactly one output type. This mapping is deterministic:
//! the same command always produces the same output variant (though the values
//! may differ based on datastore state).

use datastore_core::{Aggregate, Count, EntityId, Found, ModelMap, PartialModel};
use serde::{Deserialize, Serialize};

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output` variant.
/// Read outputs keep the position metadata the datastore reported.
///
/// # Example
///
/// ```text
/// use datastore_executor::{Command, Output, Executor};
///
/// match executor.execute(Command::Exists(request))? {
///     Output::Found(found) => println!("exists: {} @ {}", found.exists, found.position),
///     _ => unreachable!("Exists always returns Found"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// No return value (write)
    Unit,

    /// One entity snapshot (get)
    Model(PartialModel),

    /// List of entity snapshots (get_all, filter)
    Models(Vec<PartialModel>),

    /// Snapshots grouped by collection and id (get_many)
    ModelMap(ModelMap),

    /// Existence check (exists)
    Found(Found),

    /// Match count (count)
    Count(Count),

    /// Aggregated value (min, max)
    Aggregate(Aggregate),

    /// Reserved ids, ascending (reserve_ids)
    Ids(Vec<EntityId>),
}
