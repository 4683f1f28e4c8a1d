//! Itinerary container.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::waypoint::Waypoint;

/// Ordered collection of waypoints keyed by index.
///
/// Serializes as a plain array of waypoint records, which is the persisted
/// table layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Itinerary {
    rows: Vec<Waypoint>,
}

impl Itinerary {
    /// Create an empty itinerary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an itinerary from rows in their final order, assigning dense
    /// 0-based indices.
    pub fn from_ordered(rows: impl IntoIterator<Item = Waypoint>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                row.index = index;
                row
            })
            .collect();
        Self { rows }
    }

    /// Wrap rows as-is, keeping whatever indices they carry.
    pub fn from_rows_unchecked(rows: Vec<Waypoint>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by its index key.
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.position(index).map(|pos| &self.rows[pos])
    }

    /// Look up a row by its index key for in-place mutation.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Waypoint> {
        self.position(index).map(move |pos| &mut self.rows[pos])
    }

    pub fn contains(&self, index: usize) -> bool {
        self.position(index).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Waypoint> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Waypoint> {
        self.rows.iter_mut()
    }

    pub fn rows(&self) -> &[Waypoint] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Waypoint> {
        self.rows
    }

    /// All index keys in row order.
    pub fn indices(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.index).collect()
    }

    /// Check that indices are exactly `0..len` in row order.
    pub fn is_dense(&self) -> bool {
        self.rows.iter().enumerate().all(|(pos, row)| row.index == pos)
    }

    fn position(&self, index: usize) -> Option<usize> {
        // Finalized itineraries are dense, so try the direct slot first.
        match self.rows.get(index) {
            Some(row) if row.index == index => Some(index),
            _ => self.rows.iter().position(|row| row.index == index),
        }
    }
}

impl<'a> IntoIterator for &'a Itinerary {
    type Item = &'a Waypoint;
    type IntoIter = std::slice::Iter<'a, Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for Itinerary {
    type Item = Waypoint;
    type IntoIter = std::vec::IntoIter<Waypoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
