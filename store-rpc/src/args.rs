use serde::{Deserialize, Serialize};
use serde_json::Value;
use store_types::Store;

/// One store paired with the body sent to it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub store: Store,
    #[serde(default)]
    pub body: Value,
}

impl Payload {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            body: Value::Null,
        }
    }

    /// Replace the body from a variadic list: nothing clears it, a single
    /// value is stored as-is, several values are stored as an array.
    pub fn with_body<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.body = collapse_body(values);
        self
    }

    /// Store `value` directly as the body.
    pub fn set_body(mut self, value: impl Into<Value>) -> Self {
        self.body = value.into();
        self
    }

    pub fn store_id(&self) -> &str {
        &self.store.id
    }

    pub fn has_empty_body(&self) -> bool {
        is_empty_body(&self.body)
    }

    /// Same store and an equivalent body.
    fn duplicates(&self, other: &Payload) -> bool {
        self.store.id == other.store.id && same_body(&self.body, &other.body)
    }
}

pub fn collapse_body<I>(values: I) -> Value
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
    match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    }
}

/// `null`, `""`, `[]` and `{}` all count as "no body".
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn same_body(a: &Value, b: &Value) -> bool {
    (is_empty_body(a) && is_empty_body(b)) || a == b
}

/// Ordered, de-duplicated list of [`Payload`]s sent in one call.
///
/// Every mutator consumes the set and hands back the result, so a clone kept
/// by the caller is never affected by later changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<Payload>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `payload` unless an entry for the same store already carries an
    /// equivalent body.
    pub fn add(mut self, payload: Payload) -> Self {
        if !self.0.iter().any(|existing| existing.duplicates(&payload)) {
            self.0.push(payload);
        }
        self
    }

    /// Drop every entry for `store_id`.
    pub fn delete(mut self, store_id: &str) -> Self {
        self.0.retain(|payload| payload.store.id != store_id);
        self
    }

    /// Give every entry its own copy of `body`.
    pub fn set_body(mut self, body: impl Into<Value>) -> Self {
        let body = body.into();
        for payload in &mut self.0 {
            payload.body = body.clone();
        }
        self
    }

    /// Set `body` on the entries for `store_id` only.
    pub fn set_body_for(mut self, store_id: &str, body: impl Into<Value>) -> Self {
        if store_id.is_empty() {
            return self;
        }
        let body = body.into();
        for payload in self.0.iter_mut().filter(|p| p.store.id == store_id) {
            payload.body = body.clone();
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Payload> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Payload> {
        self.0.iter_mut()
    }

    pub fn stores(&self) -> impl Iterator<Item = &Store> {
        self.0.iter().map(|payload| &payload.store)
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Payload;
    type IntoIter = std::slice::Iter<'a, Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Payload> for Args {
    fn from_iter<I: IntoIterator<Item = Payload>>(iter: I) -> Self {
        iter.into_iter().fold(Args::new(), Args::add)
    }
}
