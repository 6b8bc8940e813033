// Owned object model for extractor metadata
//
// Raw JSON from the extractor is converted once into `DocValue`, a tagged
// tree that keeps the container kind of every value. Field access goes
// through typed accessors instead of dynamic attribute lookup.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// A leaf value
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Scalar {
    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::UInt(_) => 2,
            Scalar::Float(_) => 3,
            Scalar::Str(_) => 4,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Floats use the IEEE total order so scalars can live in a set.
impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => Ordering::Equal,
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::UInt(a), Scalar::UInt(b)) => a.cmp(b),
            (Scalar::Int(a), Scalar::UInt(b)) => i128::from(*a).cmp(&i128::from(*b)),
            (Scalar::UInt(a), Scalar::Int(b)) => i128::from(*a).cmp(&i128::from(*b)),
            (Scalar::Float(a), Scalar::Float(b)) => a.total_cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// A wrapped metadata value.
///
/// Mappings become [`DocValue::Record`], ordered sequences stay
/// [`DocValue::List`], sets stay [`DocValue::Set`], and scalars pass through.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocValue {
    Scalar(Scalar),
    List(Vec<DocValue>),
    Set(BTreeSet<DocValue>),
    Record(BTreeMap<String, DocValue>),
}

impl Default for DocValue {
    fn default() -> Self {
        DocValue::Scalar(Scalar::Null)
    }
}

impl DocValue {
    /// The null scalar
    pub fn null() -> Self {
        DocValue::Scalar(Scalar::Null)
    }

    /// A string scalar
    pub fn string(s: impl Into<String>) -> Self {
        DocValue::Scalar(Scalar::Str(s.into()))
    }

    /// An ordered sequence
    pub fn list(items: impl IntoIterator<Item = DocValue>) -> Self {
        DocValue::List(items.into_iter().collect())
    }

    /// A set; duplicates collapse
    pub fn set(items: impl IntoIterator<Item = DocValue>) -> Self {
        DocValue::Set(items.into_iter().collect())
    }

    /// A record from key/value pairs
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, DocValue)>) -> Self {
        DocValue::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap a raw JSON tree
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => DocValue::null(),
            Value::Bool(b) => DocValue::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => DocValue::Scalar(Scalar::Int(i)),
                (None, Some(u)) => DocValue::Scalar(Scalar::UInt(u)),
                (None, None) => DocValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => DocValue::string(s.as_str()),
            Value::Array(items) => DocValue::List(items.iter().map(DocValue::from_json).collect()),
            Value::Object(map) => DocValue::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), DocValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON. Sets become arrays in their sorted order.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            DocValue::Scalar(Scalar::Null) => Value::Null,
            DocValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            DocValue::Scalar(Scalar::Int(i)) => Value::from(*i),
            DocValue::Scalar(Scalar::UInt(u)) => Value::from(*u),
            DocValue::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            DocValue::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
            DocValue::List(items) => Value::Array(items.iter().map(DocValue::to_json).collect()),
            DocValue::Set(items) => Value::Array(items.iter().map(DocValue::to_json).collect()),
            DocValue::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Field access on a record. Non-records have no fields.
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        match self {
            DocValue::Record(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Follow a chain of record keys
    pub fn get_path<'a, I>(&self, path: I) -> Option<&DocValue>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter().try_fold(self, |value, key| value.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DocValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DocValue::Scalar(Scalar::Int(i)) => u64::try_from(*i).ok(),
            DocValue::Scalar(Scalar::UInt(u)) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Scalar(Scalar::Int(i)) => Some(*i as f64),
            DocValue::Scalar(Scalar::UInt(u)) => Some(*u as f64),
            DocValue::Scalar(Scalar::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DocValue]> {
        match self {
            DocValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<DocValue>> {
        match self {
            DocValue::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, DocValue>> {
        match self {
            DocValue::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Scalar(Scalar::Null))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, DocValue::Record(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, DocValue::List(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, DocValue::Set(_))
    }
}

impl From<serde_json::Value> for DocValue {
    fn from(value: serde_json::Value) -> Self {
        DocValue::from_json(&value)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::string(s)
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for DocValue {
    fn from(i: i64) -> Self {
        DocValue::Scalar(Scalar::Int(i))
    }
}

impl Serialize for DocValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocValue::Scalar(Scalar::Null) => serializer.serialize_unit(),
            DocValue::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            DocValue::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            DocValue::Scalar(Scalar::UInt(u)) => serializer.serialize_u64(*u),
            DocValue::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            DocValue::Scalar(Scalar::Str(s)) => serializer.serialize_str(s),
            DocValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DocValue::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DocValue::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
