//! Caller-built field lookups layered over records.
//!
//! Model outputs often arrive keyed by an external identifier rather than
//! embedded in the record. A [`FieldLookup`] is built once by the caller and
//! passed in; [`Overlaid`] views consult it before the record's own fields.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::data::{FieldSource, FieldValue};
use crate::types::{FieldName, RecordId};

/// Prebuilt `record id -> fields` map.
#[derive(Clone, Debug, Default)]
pub struct FieldLookup {
    entries: HashMap<RecordId, IndexMap<FieldName, FieldValue>>,
}

impl FieldLookup {
    /// Build a lookup from `(id, fields)` pairs. Later entries for the same id
    /// merge into earlier ones, replacing duplicate field names.
    pub fn from_entries<I, K, M>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, M)>,
        K: Into<RecordId>,
        M: IntoIterator<Item = (FieldName, FieldValue)>,
    {
        let mut lookup = Self::default();
        for (id, fields) in entries {
            lookup.entries.entry(id.into()).or_default().extend(fields);
        }
        lookup
    }

    /// Number of ids with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no ids have entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&IndexMap<FieldName, FieldValue>> {
        self.entries.get(id)
    }

    /// View `record` with this lookup layered on top.
    pub fn overlay<'a, R: FieldSource + ?Sized>(&'a self, record: &'a R) -> Overlaid<'a, R> {
        Overlaid {
            record,
            fields: self.entries.get(record.record_id()),
        }
    }

    /// Overlay every record of a population, preserving order.
    pub fn overlay_all<'a, R: FieldSource>(&'a self, population: &'a [R]) -> Vec<Overlaid<'a, R>> {
        population.iter().map(|record| self.overlay(record)).collect()
    }
}

/// A record seen through a [`FieldLookup`]. Lookup fields that are present
/// and non-null win; everything else reads through to the record.
#[derive(Debug)]
pub struct Overlaid<'a, R: ?Sized> {
    record: &'a R,
    fields: Option<&'a IndexMap<FieldName, FieldValue>>,
}

impl<R: ?Sized> Clone for Overlaid<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized> Copy for Overlaid<'_, R> {}

impl<'a, R: ?Sized> Overlaid<'a, R> {
    /// Underlying record.
    pub fn record(&self) -> &'a R {
        self.record
    }

    /// Whether the lookup had an entry for this record.
    pub fn has_overlay(&self) -> bool {
        self.fields.is_some()
    }
}

impl<R: FieldSource + ?Sized> FieldSource for Overlaid<'_, R> {
    fn record_id(&self) -> &str {
        self.record.record_id()
    }

    fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .and_then(|fields| fields.get(name))
            .filter(|value| !matches!(value, FieldValue::Null))
            .or_else(|| self.record.field(name))
    }
}
