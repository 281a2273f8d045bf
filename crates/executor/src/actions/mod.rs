//! Action layer on top of the [`Datastore`](crate::Datastore).
//!
//! An action reads what it needs during preparation, then returns the write
//! request elements describing its changes. The [`ActionHandler`] merges the
//! elements of a whole request into one write, so a request is applied
//! completely or not at all.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `generics` | `CreateAction`, `UpdateAction`, `DeleteAction` over one collection |
//! | `registry` | Name → action table |
//! | `handler` | Request processing with conflict retry |

mod generics;
mod handler;
mod registry;

pub use generics::{CreateAction, DeleteAction, UpdateAction};
pub use handler::{ActionHandler, ActionRequest, ActionResult, RetryConfig};
pub use registry::ActionRegistry;

use datastore_core::WriteRequestElement;
use serde_json::Value;

use crate::{Datastore, Result};

/// A named, stateless unit of business logic.
///
/// `perform` may be called several times for the same payload when a
/// conflict forces the request to be prepared again, so it must not keep
/// state between calls.
pub trait Action: Send + Sync {
    /// Registry name, e.g. `topic.create`
    fn name(&self) -> &str;

    /// Prepare the changes for every payload instance
    fn perform(
        &self,
        datastore: &dyn Datastore,
        payload: &[Value],
        user_id: u64,
    ) -> Result<Vec<WriteRequestElement>>;
}
