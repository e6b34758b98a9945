//! V3 record: one string value per catalog field
//!
//! Values are stored by catalog position, so a record always carries exactly
//! the catalog's key set. `""` means "not filled".

use serde::de::{Deserializer, Error as DeError};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::catalog::{field_index, FIELD_CATALOG, FIELD_COUNT};
use crate::{Error, Result};

/// A flat V3 form keyed by the field catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V3Record {
    values: Vec<String>,
}

/// Result of merging backend output into a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Catalog keys whose value was written
    pub applied: usize,
    /// Incoming keys that are not catalog fields (dropped)
    pub ignored: Vec<String>,
}

impl V3Record {
    /// Record with every catalog field unfilled
    pub fn empty() -> Self {
        Self {
            values: vec![String::new(); FIELD_COUNT],
        }
    }

    /// Build a record from key/value pairs.
    ///
    /// Catalog keys missing from `fields` stay `""`. Any key outside the
    /// catalog is rejected.
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::empty();
        let mut unknown = Vec::new();
        for (key, value) in fields {
            match field_index(key.as_ref()) {
                Some(idx) => record.values[idx] = value.into(),
                None => unknown.push(key.as_ref().to_string()),
            }
        }

        if unknown.is_empty() {
            Ok(record)
        } else {
            unknown.sort();
            Err(Error::InvalidInput(format!(
                "Unknown V3 field(s): {}",
                unknown.join(", ")
            )))
        }
    }

    /// Value of a catalog field
    pub fn get(&self, key: &str) -> Option<&str> {
        field_index(key).map(|idx| self.values[idx].as_str())
    }

    /// Set a catalog field
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let idx = field_index(key)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown V3 field: {}", key)))?;
        self.values[idx] = value.into();
        Ok(())
    }

    /// Iterate `(key, value)` pairs in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        FIELD_CATALOG
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Number of fields with a non-empty value
    pub fn filled_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_empty()).count()
    }

    /// Shallow right-biased merge.
    ///
    /// Incoming catalog keys overwrite the current value (an incoming `""`
    /// clears the field); keys absent from `incoming` keep their value.
    pub fn merge_from(&mut self, incoming: &HashMap<String, String>) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for (key, value) in incoming {
            match field_index(key) {
                Some(idx) => {
                    self.values[idx] = value.clone();
                    summary.applied += 1;
                }
                None => summary.ignored.push(key.clone()),
            }
        }
        summary.ignored.sort();
        summary
    }

    /// Key/value map view (used for the backend's `current_data`)
    pub fn to_map(&self) -> HashMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

impl Default for V3Record {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for V3Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for V3Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = HashMap::<String, String>::deserialize(deserializer)?;
        V3Record::from_fields(fields).map_err(D::Error::custom)
    }
}
