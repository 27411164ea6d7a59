//! Serde serializer that turns any `Serialize` type into a [`Value`] tree.
//!
//! This is how typed permission structs reach the subset matcher: structs keep
//! their fixed-field shape (so zero-valued fields can be skipped), while maps
//! stay maps.

use std::cell::Cell;
use std::fmt::Display;

use anyhow::anyhow;
use anyhow::Error as AnyhowError;
use indexmap::IndexMap;
use serde::{ser, Serialize};

use super::key_ser::KeySerializer;
use super::{Field, Record, Value};

/// Error for the value serializer
#[derive(Debug)]
pub struct Error {
    inner: AnyhowError,
}

impl Error {
    pub(super) fn new<M: Display>(msg: M) -> Self {
        Error {
            inner: anyhow!(msg.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::new(msg)
    }
}

impl std::error::Error for Error {}

/// Convert a serializable value into a [`Value`]. Every struct field is
/// comparable unless serde skipped it.
pub fn to_value<T>(value: &T) -> Result<Value, Error>
where
    T: ?Sized + Serialize,
{
    to_value_with_hidden(value, &[])
}

/// Like [`to_value`], but struct fields whose name appears in `hidden` are
/// recorded as non-comparable.
pub fn to_value_with_hidden<T>(value: &T, hidden: &[&str]) -> Result<Value, Error>
where
    T: ?Sized + Serialize,
{
    value.serialize(Serializer {
        hidden,
        some: None,
    })
}

/// Serializer building [`Value`]s. Holds only the set of hidden field names and
/// a flag for the struct field currently being written, so it is freely copied
/// into nested calls.
#[derive(Clone, Copy)]
pub struct Serializer<'h> {
    hidden: &'h [&'h str],
    // set when the field value turns out to be `Some(..)`
    some: Option<&'h Cell<bool>>,
}

impl<'h> Serializer<'h> {
    /// A serializer for a struct field's value that records `Some` in `some`.
    fn for_field<'f>(&self, some: &'f Cell<bool>) -> Serializer<'f>
    where
        'h: 'f,
    {
        Serializer {
            hidden: self.hidden,
            some: Some(some),
        }
    }

    /// A serializer for values nested below the current one.
    fn nested(self) -> Self {
        Serializer { some: None, ..self }
    }

    fn field(&self, name: &str, value: Value) -> Field {
        if self.hidden.iter().any(|h| *h == name) {
            Field::hidden(name, value)
        } else {
            Field::new(name, value)
        }
    }
}

/// Wrap `value` as `{ variant: value }`, the externally tagged enum form.
fn tagged(variant: &'static str, value: Value) -> Value {
    Value::map([(variant, value)])
}

impl<'h> ser::Serializer for Serializer<'h> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSequence<'h>;
    type SerializeTuple = SerializeSequence<'h>;
    type SerializeTupleStruct = SerializeSequence<'h>;
    type SerializeTupleVariant = SerializeSequence<'h>;
    type SerializeMap = SerializeMap<'h>;
    type SerializeStruct = SerializeStruct<'h>;
    type SerializeStructVariant = SerializeStruct<'h>;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(v.into())
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(v.into())
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        Ok(v.into())
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(v.into())
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(v.to_string().into())
    }

    fn serialize_str(self, v: &str) -> Result<Value, Error> {
        Ok(v.into())
    }

    // Bytes become a sequence of numbers, same as serde_json.
    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Error> {
        Ok(Value::sequence(v.iter().map(|b| Value::from(u64::from(*b)))))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, Error>
    where
        T: ?Sized + Serialize,
    {
        if let Some(some) = self.some {
            some.set(true);
        }
        value.serialize(self.nested())
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::null())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value, Error>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, value.serialize(self.nested())?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, Error> {
        Ok(SerializeSequence {
            ser: self.nested(),
            variant: None,
            items: Vec::with_capacity(len.unwrap_or_default()),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, Error> {
        Ok(SerializeSequence {
            ser: self.nested(),
            variant: Some(variant),
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, Error> {
        Ok(SerializeMap {
            ser: self.nested(),
            entries: IndexMap::with_capacity(len.unwrap_or_default()),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, Error> {
        Ok(SerializeStruct {
            ser: self.nested(),
            variant: None,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, Error> {
        Ok(SerializeStruct {
            ser: self.nested(),
            variant: Some(variant),
            fields: Vec::with_capacity(len),
        })
    }
}

/// Collects sequences, tuples and tuple variants.
pub struct SerializeSequence<'h> {
    ser: Serializer<'h>,
    variant: Option<&'static str>,
    items: Vec<Value>,
}

impl<'h> SerializeSequence<'h> {
    fn push<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let seq = Value::Sequence(self.items);
        match self.variant {
            Some(variant) => tagged(variant, seq),
            None => seq,
        }
    }
}

impl<'h> ser::SerializeSeq for SerializeSequence<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl<'h> ser::SerializeTuple for SerializeSequence<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl<'h> ser::SerializeTupleStruct for SerializeSequence<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl<'h> ser::SerializeTupleVariant for SerializeSequence<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

/// Collects map entries. Keys go through [`KeySerializer`] so they always end
/// up as strings.
pub struct SerializeMap<'h> {
    ser: Serializer<'h>,
    entries: IndexMap<String, Value>,
    next_key: Option<String>,
}

impl<'h> ser::SerializeMap for SerializeMap<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .next_key
            .take()
            .ok_or_else(|| Error::new("map value serialized before its key"))?;
        self.entries.insert(key, value.serialize(self.ser)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Record(Record::Map(self.entries)))
    }
}

/// Collects struct and struct variant fields in declaration order.
pub struct SerializeStruct<'h> {
    ser: Serializer<'h>,
    variant: Option<&'static str>,
    fields: Vec<Field>,
}

impl<'h> SerializeStruct<'h> {
    fn push<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        let some = Cell::new(false);
        let value = value.serialize(self.ser.for_field(&some))?;
        let mut field = self.ser.field(key, value);
        field.explicit = some.get();
        self.fields.push(field);
        Ok(())
    }

    fn finish(self) -> Value {
        let record = Value::Record(Record::Struct(self.fields));
        match self.variant {
            Some(variant) => tagged(variant, record),
            None => record,
        }
    }
}

impl<'h> ser::SerializeStruct for SerializeStruct<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    // `skip_serializing_if` fields are still part of the shape; keep them as
    // hidden nulls so both sides of a comparison line up.
    fn skip_field(&mut self, key: &'static str) -> Result<(), Error> {
        self.fields.push(Field::hidden(key, Value::null()));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl<'h> ser::SerializeStructVariant for SerializeStruct<'h> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), Error> {
        self.fields.push(Field::hidden(key, Value::null()));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}
