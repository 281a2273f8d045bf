//! Write request elements and the optimistic-locking contract
//!
//! A [`WriteRequestElement`] is one atomic mutation package:
//! - an ordered list of [`Event`]s (create / update / delete)
//! - human-readable audit information per FQID
//! - the acting user's id
//! - `locked_fields`: FQField → position assertions
//!
//! The datastore applies all events iff every locked field has not changed
//! after its asserted position. Otherwise the whole element is rejected with
//! a single conflict. Partial application never happens.
//!
//! Elements are assembled with [`WriteRequestBuilder`] and are immutable once
//! built. Several elements of the same user can be combined into one with
//! [`merge_write_request_elements`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{FqField, Fqid, Position};

/// Kind of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Model comes into existence
    Create,
    /// Fields of a live model change
    Update,
    /// Model is marked deleted
    Delete,
}

/// One field-level change inside a write request element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Create a model with the given fields
    Create {
        /// Target model
        fqid: Fqid,
        /// Initial field values
        fields: BTreeMap<String, Value>,
    },
    /// Set fields of a live model (`null` clears a field)
    Update {
        /// Target model
        fqid: Fqid,
        /// New field values
        fields: BTreeMap<String, Value>,
    },
    /// Delete a model
    Delete {
        /// Target model
        fqid: Fqid,
    },
}

impl Event {
    /// The kind of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Create { .. } => EventType::Create,
            Event::Update { .. } => EventType::Update,
            Event::Delete { .. } => EventType::Delete,
        }
    }

    /// The model this event targets
    pub fn fqid(&self) -> &Fqid {
        match self {
            Event::Create { fqid, .. } | Event::Update { fqid, .. } | Event::Delete { fqid } => {
                fqid
            }
        }
    }

    /// The event's changes keyed by fully qualified field
    ///
    /// Delete events touch no field values and yield an empty map.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if a field name is invalid.
    pub fn fqfields(&self) -> Result<BTreeMap<FqField, Value>> {
        match self {
            Event::Create { fqid, fields } | Event::Update { fqid, fields } => fields
                .iter()
                .map(|(name, value)| Ok((fqid.field(name.clone())?, value.clone())))
                .collect(),
            Event::Delete { .. } => Ok(BTreeMap::new()),
        }
    }

    /// Wire form of this event
    pub fn to_value(&self) -> Value {
        match self {
            Event::Create { fqid, fields } => {
                json!({"type": "create", "fqid": fqid.to_string(), "fields": fields})
            }
            Event::Update { fqid, fields } => {
                json!({"type": "update", "fqid": fqid.to_string(), "fields": fields})
            }
            Event::Delete { fqid } => json!({"type": "delete", "fqid": fqid.to_string()}),
        }
    }
}

/// One atomic unit of mutation plus its audit trail and preconditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequestElement {
    events: Vec<Event>,
    information: BTreeMap<Fqid, Vec<String>>,
    user_id: u64,
    locked_fields: BTreeMap<FqField, Position>,
}

impl WriteRequestElement {
    /// Create an element from its parts
    pub fn new(
        events: Vec<Event>,
        information: BTreeMap<Fqid, Vec<String>>,
        user_id: u64,
        locked_fields: BTreeMap<FqField, Position>,
    ) -> Self {
        WriteRequestElement {
            events,
            information,
            user_id,
            locked_fields,
        }
    }

    /// Events, in application order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Audit information per model
    pub fn information(&self) -> &BTreeMap<Fqid, Vec<String>> {
        &self.information
    }

    /// Acting user
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Concurrency preconditions
    pub fn locked_fields(&self) -> &BTreeMap<FqField, Position> {
        &self.locked_fields
    }

    /// Wire form of this element
    pub fn to_value(&self) -> Value {
        let events: Vec<Value> = self.events.iter().map(Event::to_value).collect();
        let information: Map<String, Value> = self
            .information
            .iter()
            .map(|(fqid, lines)| (fqid.to_string(), json!(lines)))
            .collect();
        let locked_fields: Map<String, Value> = self
            .locked_fields
            .iter()
            .map(|(fqfield, position)| (fqfield.to_string(), json!(position.as_u64())))
            .collect();
        json!({
            "events": events,
            "information": information,
            "user_id": self.user_id,
            "locked_fields": locked_fields,
        })
    }
}

/// Assembles a [`WriteRequestElement`]
///
/// ```
/// use datastore_core::{Collection, Position, WriteRequestBuilder};
/// use serde_json::json;
///
/// let topic = Collection::new("topic").unwrap().fqid(42);
/// let element = WriteRequestBuilder::new(1)
///     .update(topic.clone(), [("title".to_string(), json!("New"))])
///     .information(topic.clone(), "Topic updated")
///     .lock_deleted(&topic, Position::new(7))
///     .build();
///
/// assert_eq!(element.locked_fields()[&topic.deleted_field()], Position::new(7));
/// ```
#[derive(Debug, Clone)]
pub struct WriteRequestBuilder {
    events: Vec<Event>,
    information: BTreeMap<Fqid, Vec<String>>,
    user_id: u64,
    locked_fields: BTreeMap<FqField, Position>,
}

impl WriteRequestBuilder {
    /// Start an element for the given user
    pub fn new(user_id: u64) -> Self {
        WriteRequestBuilder {
            events: Vec::new(),
            information: BTreeMap::new(),
            user_id,
            locked_fields: BTreeMap::new(),
        }
    }

    /// Append a create event
    pub fn create(mut self, fqid: Fqid, fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.events.push(Event::Create {
            fqid,
            fields: fields.into_iter().collect(),
        });
        self
    }

    /// Append an update event
    pub fn update(mut self, fqid: Fqid, fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.events.push(Event::Update {
            fqid,
            fields: fields.into_iter().collect(),
        });
        self
    }

    /// Append update events from fully qualified fields
    ///
    /// Fields are grouped by their owning model; one update event is emitted
    /// per model, in FQID order.
    pub fn update_fqfields(mut self, fqfields: impl IntoIterator<Item = (FqField, Value)>) -> Self {
        let mut grouped: BTreeMap<Fqid, BTreeMap<String, Value>> = BTreeMap::new();
        for (fqfield, value) in fqfields {
            grouped
                .entry(fqfield.fqid())
                .or_default()
                .insert(fqfield.field, value);
        }
        for (fqid, fields) in grouped {
            self.events.push(Event::Update { fqid, fields });
        }
        self
    }

    /// Append a delete event
    pub fn delete(mut self, fqid: Fqid) -> Self {
        self.events.push(Event::Delete { fqid });
        self
    }

    /// Add an audit line for a model
    pub fn information(mut self, fqid: Fqid, text: impl Into<String>) -> Self {
        self.information.entry(fqid).or_default().push(text.into());
        self
    }

    /// Assert that `fqfield` has not changed after `position`
    ///
    /// Locking the same field twice keeps the lower position.
    pub fn lock(mut self, fqfield: FqField, position: Position) -> Self {
        lock_min(&mut self.locked_fields, fqfield, position);
        self
    }

    /// Assert that the model has not been created or deleted after `position`
    pub fn lock_deleted(self, fqid: &Fqid, position: Position) -> Self {
        self.lock(fqid.deleted_field(), position)
    }

    /// Finish the element
    pub fn build(self) -> WriteRequestElement {
        WriteRequestElement {
            events: self.events,
            information: self.information,
            user_id: self.user_id,
            locked_fields: self.locked_fields,
        }
    }
}

fn lock_min(locked: &mut BTreeMap<FqField, Position>, fqfield: FqField, position: Position) {
    locked
        .entry(fqfield)
        .and_modify(|p| *p = (*p).min(position))
        .or_insert(position);
}

/// Merge write request elements into one
///
/// - events are concatenated in order
/// - information lines are appended per FQID
/// - a field locked by several elements keeps the lowest position
///
/// # Errors
///
/// Returns `Error::InvalidWriteRequest` if no element is given or the
/// elements belong to different users.
pub fn merge_write_request_elements(
    elements: impl IntoIterator<Item = WriteRequestElement>,
) -> Result<WriteRequestElement> {
    let mut merged: Option<WriteRequestElement> = None;
    for element in elements {
        let target = match merged.as_mut() {
            None => {
                merged = Some(element);
                continue;
            }
            Some(target) => target,
        };
        if target.user_id != element.user_id {
            return Err(Error::InvalidWriteRequest(
                "You can not merge two write request elements of different users.".to_string(),
            ));
        }
        target.events.extend(element.events);
        for (fqid, lines) in element.information {
            target.information.entry(fqid).or_default().extend(lines);
        }
        for (fqfield, position) in element.locked_fields {
            lock_min(&mut target.locked_fields, fqfield, position);
        }
    }
    merged.ok_or_else(|| {
        Error::InvalidWriteRequest("no write request elements to merge".to_string())
    })
}

/// Tracks the lowest position observed while preparing a write
///
/// Every read made during preparation reports a position; locking at the
/// minimum of them asserts that nothing read has changed since the earliest
/// read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionTracker {
    position: Option<Position>,
}

impl PositionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position reported by a read
    pub fn observe(&mut self, position: Position) {
        self.position = Some(match self.position {
            Some(current) => current.min(position),
            None => position,
        });
    }

    /// The lowest position observed so far
    pub fn position(&self) -> Option<Position> {
        self.position
    }
}
