//! Structural shapes of opaque payloads and typed destinations.
//!
//! A destination's shape is discovered by driving its `Deserialize` impl
//! against [`Probe`], which records the first `deserialize_*` hint requested
//! and aborts. Nothing is ever constructed.

use std::fmt;

use serde::de::{self, DeserializeOwned, Visitor};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
    Record,
    Enum,
    Unit,
    /// Self-describing destinations such as `serde_json::Value`.
    Any,
}

impl Shape {
    pub fn of_value(value: &Value) -> Shape {
        match value {
            Value::Null => Shape::Null,
            Value::Bool(_) => Shape::Bool,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(_) => Shape::Sequence,
            Value::Object(_) => Shape::Mapping,
        }
    }

    pub fn of_type<T: DeserializeOwned>() -> Shape {
        match T::deserialize(Probe) {
            Err(ProbeStop::Found(shape)) => shape,
            Err(ProbeStop::Custom) | Ok(_) => Shape::Any,
        }
    }

    /// Whether data of shape `self` may be decoded into `destination`.
    pub fn fits(self, destination: Shape) -> bool {
        match (self, destination) {
            (_, Shape::Any) => true,
            (Shape::Mapping, Shape::Mapping | Shape::Record | Shape::Enum) => true,
            (Shape::String, Shape::Enum) => true,
            (data, destination) => data == destination,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Sequence => "sequence",
            Shape::Mapping => "mapping",
            Shape::Record => "record",
            Shape::Enum => "enum",
            Shape::Unit => "unit",
            Shape::Any => "any",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum ProbeStop {
    Found(Shape),
    Custom,
}

impl fmt::Display for ProbeStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStop::Found(shape) => write!(f, "found {shape}"),
            ProbeStop::Custom => f.write_str("probe aborted"),
        }
    }
}

impl std::error::Error for ProbeStop {}

impl de::Error for ProbeStop {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        ProbeStop::Custom
    }
}

struct Probe;

macro_rules! probe_as {
    ($shape:expr => $($method:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, ProbeStop> {
                Err(ProbeStop::Found($shape))
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Probe {
    type Error = ProbeStop;

    probe_as!(Shape::Any => deserialize_any, deserialize_ignored_any, deserialize_bytes, deserialize_byte_buf);
    probe_as!(Shape::Bool => deserialize_bool);
    probe_as!(Shape::Number =>
        deserialize_i8, deserialize_i16, deserialize_i32, deserialize_i64, deserialize_i128,
        deserialize_u8, deserialize_u16, deserialize_u32, deserialize_u64, deserialize_u128,
        deserialize_f32, deserialize_f64,
    );
    probe_as!(Shape::String => deserialize_char, deserialize_str, deserialize_string, deserialize_identifier);
    probe_as!(Shape::Sequence => deserialize_seq);
    probe_as!(Shape::Mapping => deserialize_map);
    probe_as!(Shape::Unit => deserialize_unit);

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ProbeStop> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop::Found(Shape::Unit))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop::Found(Shape::Sequence))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop::Found(Shape::Sequence))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop::Found(Shape::Record))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, ProbeStop> {
        Err(ProbeStop::Found(Shape::Enum))
    }
}
