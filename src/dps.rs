// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw data-point ("DPS") types.
//!
//! Tuya devices expose their entire state as a flat map of numbered data
//! points. Each data point holds one of three primitive kinds: a boolean, a
//! string (often an enumeration token), or a number. On the wire the map is a
//! JSON object keyed by the *stringified* id, e.g. `{"1": true, "2": "white"}`;
//! the types here serialize to exactly that shape so link implementations and
//! tests can round-trip real device payloads.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU8;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValueError;

/// Identifier of a single data point (1-255).
///
/// Tuya assigns ids in the range 1-255; 0 never occurs. Ids serialize as the
/// string form of the number to match the device's JSON framing.
///
/// # Examples
///
/// ```
/// use loctuya_lib::dps::DpsId;
///
/// let id = DpsId::new(7).unwrap();
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
///
/// assert!(DpsId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DpsId(NonZeroU8);

impl DpsId {
    /// Creates a data-point id.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidDpsId`] for 0.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        NonZeroU8::new(value)
            .map(Self)
            .ok_or(ValueError::InvalidDpsId)
    }

    /// Creates a data-point id from an already validated non-zero value.
    #[must_use]
    pub const fn from_nonzero(value: NonZeroU8) -> Self {
        Self(value)
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0.get()
    }
}

impl fmt::Display for DpsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for DpsId {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonZeroU8> for DpsId {
    fn from(value: NonZeroU8) -> Self {
        Self(value)
    }
}

impl Serialize for DpsId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DpsId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = DpsId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a data-point id between 1 and 255")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let raw: u8 = v.parse().map_err(E::custom)?;
                DpsId::new(raw).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let raw = u8::try_from(v).map_err(E::custom)?;
                DpsId::new(raw).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Value of a single data point.
///
/// The protocol only ever carries these three primitive kinds. Numbers keep
/// their JSON representation (`serde_json::Number`), so integer values stay
/// integers on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DpsValue {
    /// A boolean data point (switches, on/off flags).
    Bool(bool),
    /// A string data point (mode tokens, enumerations, packed colour values).
    Str(String),
    /// A numeric data point (brightness, positions, readings).
    Num(serde_json::Number),
}

impl DpsValue {
    /// Returns the boolean value, if this is a boolean data point.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string data point.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value as a float, if this is a numeric data point.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the numeric value as a signed integer, truncating any
    /// fractional part, if this is a numeric data point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Num(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Returns a short name of the stored primitive kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::Num(_) => "number",
        }
    }
}

impl From<bool> for DpsValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for DpsValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for DpsValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<u8> for DpsValue {
    fn from(value: u8) -> Self {
        Self::Num(value.into())
    }
}

impl From<u16> for DpsValue {
    fn from(value: u16) -> Self {
        Self::Num(value.into())
    }
}

impl From<u32> for DpsValue {
    fn from(value: u32) -> Self {
        Self::Num(value.into())
    }
}

impl From<i64> for DpsValue {
    fn from(value: i64) -> Self {
        Self::Num(value.into())
    }
}

impl fmt::Display for DpsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

/// The raw state map of one device: data-point id to value.
///
/// Keys are device-defined and not validated beyond present or absent.
/// Insertion order is irrelevant; last write wins per key.
///
/// # Examples
///
/// ```
/// use loctuya_lib::dps::{DpsId, DpsMap};
///
/// let mut map = DpsMap::new();
/// map.insert(DpsId::new(1).unwrap(), true);
/// map.insert(DpsId::new(3).unwrap(), 200u8);
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(DpsId::new(1).unwrap()).and_then(|v| v.as_bool()), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DpsMap(HashMap<DpsId, DpsValue>);

impl DpsMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Returns the value of a data point, or `None` if never observed.
    #[must_use]
    pub fn get(&self, id: DpsId) -> Option<&DpsValue> {
        self.0.get(&id)
    }

    /// Returns true if the data point is present.
    #[must_use]
    pub fn contains(&self, id: DpsId) -> bool {
        self.0.contains_key(&id)
    }

    /// Inserts a value, returning the previous one if the id was present.
    pub fn insert(&mut self, id: DpsId, value: impl Into<DpsValue>) -> Option<DpsValue> {
        self.0.insert(id, value.into())
    }

    /// Number of known data points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no data point is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all data points.
    pub fn iter(&self) -> impl Iterator<Item = (DpsId, &DpsValue)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }
}

impl FromIterator<(DpsId, DpsValue)> for DpsMap {
    fn from_iter<T: IntoIterator<Item = (DpsId, DpsValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for DpsMap {
    type Item = (DpsId, DpsValue);
    type IntoIter = std::collections::hash_map::IntoIter<DpsId, DpsValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> DpsId {
        DpsId::new(n).unwrap()
    }

    #[test]
    fn id_rejects_zero() {
        assert_eq!(DpsId::new(0), Err(ValueError::InvalidDpsId));
        assert!(DpsId::new(1).is_ok());
        assert!(DpsId::new(255).is_ok());
    }

    #[test]
    fn id_serializes_as_string() {
        let json = serde_json::to_string(&id(42)).unwrap();
        assert_eq!(json, "\"42\"");
    }

    #[test]
    fn id_deserializes_from_string_and_number() {
        let from_str: DpsId = serde_json::from_str("\"7\"").unwrap();
        let from_num: DpsId = serde_json::from_str("7").unwrap();
        assert_eq!(from_str, id(7));
        assert_eq!(from_num, id(7));
        assert!(serde_json::from_str::<DpsId>("\"0\"").is_err());
        assert!(serde_json::from_str::<DpsId>("\"256\"").is_err());
    }

    #[test]
    fn value_accessors() {
        assert_eq!(DpsValue::from(true).as_bool(), Some(true));
        assert_eq!(DpsValue::from("stop").as_str(), Some("stop"));
        assert_eq!(DpsValue::from(200u8).as_i64(), Some(200));
        assert_eq!(DpsValue::from(200u8).as_f64(), Some(200.0));
        assert_eq!(DpsValue::from(true).as_str(), None);
        assert_eq!(DpsValue::from("x").as_i64(), None);
    }

    #[test]
    fn value_integer_stays_integer_on_wire() {
        let json = serde_json::to_string(&DpsValue::from(200u8)).unwrap();
        assert_eq!(json, "200");
    }

    #[test]
    fn value_untagged_round_trip() {
        for raw in ["true", "\"colour\"", "42", "4.2"] {
            let value: DpsValue = serde_json::from_str(raw).unwrap();
            assert_eq!(serde_json::to_string(&value).unwrap(), raw);
        }
    }

    #[test]
    fn map_wire_format() {
        let mut map = DpsMap::new();
        map.insert(id(1), true);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "{\"1\":true}");
    }

    #[test]
    fn map_round_trip() {
        let raw = "{\"1\":true,\"2\":\"white\",\"3\":200,\"4\":100}";
        let map: DpsMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(id(2)).and_then(DpsValue::as_str), Some("white"));
        assert_eq!(map.get(id(3)).and_then(DpsValue::as_i64), Some(200));

        let back: DpsMap = serde_json::from_str(&serde_json::to_string(&map).unwrap()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn map_last_write_wins() {
        let mut map = DpsMap::new();
        map.insert(id(5), "ff0000");
        let previous = map.insert(id(5), "00ff00");
        assert_eq!(previous, Some(DpsValue::from("ff0000")));
        assert_eq!(map.get(id(5)).and_then(DpsValue::as_str), Some("00ff00"));
    }
}
