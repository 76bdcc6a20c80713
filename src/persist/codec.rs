//! JSON codec for state trees that contain maps and sets.
//!
//! DESIGN
//! ======
//! JSON has no map or set type, so both are written as a tagged envelope:
//!
//! ```text
//! {"dataType": "Map", "value": [[key, value], ...]}
//! {"dataType": "Set", "value": [item, ...]}
//! ```
//!
//! Two entry points share that wire shape:
//! - [`StateValue`] with [`encode`]/[`decode`] for arbitrary nested trees.
//! - [`map_envelope`], a serde `with` module for the concrete registry maps.
//!
//! An object is read as an envelope only when its keys are exactly
//! `dataType` and `value` and `dataType` names a known collection. Anything
//! else passes through as a plain object. The tag is not escaped, so a plain
//! object that happens to have exactly that shape reads back as a map.

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;

use std::collections::BTreeMap;

use serde_json::{Map as JsonMap, Number, Value};

const DATA_TYPE_KEY: &str = "dataType";
const VALUE_KEY: &str = "value";
const MAP_TAG: &str = "Map";
const SET_TAG: &str = "Set";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed {tag} envelope: {reason}")]
    MalformedEnvelope { tag: &'static str, reason: &'static str },
}

// =============================================================================
// STATE VALUE
// =============================================================================

/// A JSON value extended with ordered maps (any key type) and sets.
#[derive(Clone, Debug, PartialEq)]
pub enum StateValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<StateValue>),
    Object(BTreeMap<String, StateValue>),
    /// Insertion-ordered entries; keys may be any value.
    Map(Vec<(StateValue, StateValue)>),
    Set(Vec<StateValue>),
}

impl StateValue {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Build an object from `(key, value)` pairs.
    #[must_use]
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, StateValue)>,
        K: Into<String>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a map entry by key.
    #[must_use]
    pub fn map_get(&self, key: &StateValue) -> Option<&StateValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for StateValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

// =============================================================================
// ENCODE / DECODE
// =============================================================================

/// Lower a state tree to plain JSON, wrapping maps and sets in envelopes.
#[must_use]
pub fn encode(value: &StateValue) -> Value {
    match value {
        StateValue::Null => Value::Null,
        StateValue::Bool(b) => Value::Bool(*b),
        StateValue::Number(n) => Value::Number(n.clone()),
        StateValue::String(s) => Value::String(s.clone()),
        StateValue::Array(items) => Value::Array(items.iter().map(encode).collect()),
        StateValue::Object(fields) => Value::Object(fields.iter().map(|(k, v)| (k.clone(), encode(v))).collect()),
        StateValue::Map(entries) => {
            let pairs = entries
                .iter()
                .map(|(k, v)| Value::Array(vec![encode(k), encode(v)]))
                .collect();
            envelope(MAP_TAG, pairs)
        }
        StateValue::Set(items) => envelope(SET_TAG, items.iter().map(encode).collect()),
    }
}

fn envelope(tag: &str, items: Vec<Value>) -> Value {
    let mut obj = JsonMap::new();
    obj.insert(DATA_TYPE_KEY.to_owned(), Value::String(tag.to_owned()));
    obj.insert(VALUE_KEY.to_owned(), Value::Array(items));
    Value::Object(obj)
}

/// Rebuild a state tree from JSON, recognising envelopes at any depth.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEnvelope`] when an envelope's payload has
/// the wrong shape (e.g. a map entry that is not a two-element array).
pub fn decode(value: Value) -> Result<StateValue, CodecError> {
    Ok(match value {
        Value::Null => StateValue::Null,
        Value::Bool(b) => StateValue::Bool(b),
        Value::Number(n) => StateValue::Number(n),
        Value::String(s) => StateValue::String(s),
        Value::Array(items) => StateValue::Array(items.into_iter().map(decode).collect::<Result<_, _>>()?),
        Value::Object(fields) => match envelope_tag(&fields) {
            Some(tag) => decode_envelope(tag, fields)?,
            None => StateValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| -> Result<_, CodecError> { Ok((k, decode(v)?)) })
                    .collect::<Result<_, CodecError>>()?,
            ),
        },
    })
}

fn envelope_tag(fields: &JsonMap<String, Value>) -> Option<&'static str> {
    if fields.len() != 2 || !fields.contains_key(VALUE_KEY) {
        return None;
    }
    match fields.get(DATA_TYPE_KEY)?.as_str()? {
        MAP_TAG => Some(MAP_TAG),
        SET_TAG => Some(SET_TAG),
        _ => None,
    }
}

fn decode_envelope(tag: &'static str, mut fields: JsonMap<String, Value>) -> Result<StateValue, CodecError> {
    let Some(Value::Array(items)) = fields.remove(VALUE_KEY) else {
        return Err(CodecError::MalformedEnvelope { tag, reason: "value is not an array" });
    };

    if tag == SET_TAG {
        return Ok(StateValue::Set(items.into_iter().map(decode).collect::<Result<_, _>>()?));
    }

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Value::Array(pair) = item else {
            return Err(CodecError::MalformedEnvelope { tag, reason: "entry is not an array" });
        };
        let [k, v]: [Value; 2] = pair
            .try_into()
            .map_err(|_| CodecError::MalformedEnvelope { tag, reason: "entry is not a [key, value] pair" })?;
        entries.push((decode(k)?, decode(v)?));
    }
    Ok(StateValue::Map(entries))
}

/// Encode a state tree to a JSON string.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn serialize(value: &StateValue) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&encode(value))?)
}

/// Parse a JSON string produced by [`serialize`].
///
/// # Errors
///
/// Returns a [`CodecError`] for invalid JSON or malformed envelopes.
pub fn deserialize(raw: &str) -> Result<StateValue, CodecError> {
    decode(serde_json::from_str(raw)?)
}

// =============================================================================
// SERDE ADAPTER
// =============================================================================

/// `#[serde(with = "map_envelope")]` for `HashMap` fields.
///
/// Entries are written sorted by key so the persisted text is stable.
pub mod map_envelope {
    use std::collections::HashMap;
    use std::hash::Hash;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::MAP_TAG;

    #[derive(Serialize)]
    struct EnvelopeRef<'a, K, V> {
        #[serde(rename = "dataType")]
        data_type: &'static str,
        value: Vec<(&'a K, &'a V)>,
    }

    #[derive(Deserialize)]
    struct Envelope<K, V> {
        #[serde(rename = "dataType")]
        data_type: String,
        value: Vec<(K, V)>,
    }

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S, K, V, H>(map: &HashMap<K, V, H>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize + Ord,
        V: Serialize,
    {
        let mut value: Vec<(&K, &V)> = map.iter().collect();
        value.sort_by(|a, b| a.0.cmp(b.0));
        EnvelopeRef { data_type: MAP_TAG, value }.serialize(serializer)
    }

    /// # Errors
    ///
    /// Fails when the input is not a `Map` envelope.
    pub fn deserialize<'de, D, K, V, H>(deserializer: D) -> Result<HashMap<K, V, H>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Eq + Hash,
        V: Deserialize<'de>,
        H: std::hash::BuildHasher + Default,
    {
        let envelope = Envelope::<K, V>::deserialize(deserializer)?;
        if envelope.data_type != MAP_TAG {
            return Err(D::Error::custom(format!("expected {MAP_TAG} envelope, got {}", envelope.data_type)));
        }
        Ok(envelope.value.into_iter().collect())
    }
}
