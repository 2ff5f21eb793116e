//! Conversion of Rust values into [`Element`]s.
//!
//! [`ElementSerializer`] is a `serde` serializer whose output is an
//! [`Element`] tree instead of text:
//!
//! - Numbers, booleans, characters and strings become scalars (numbers and
//!   booleans through their `Display` form)
//! - `None`, `()` and unit structs become [`Element::Empty`]
//! - Sequences, tuples and byte slices become lists
//! - Maps and structs become dictionaries in field order
//! - Unit variants become their name; other variants become a dictionary
//!   with the variant name as its only key
//!
//! ```rust
//! use bearml::{to_element, Element};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Limits { cpu: u8, tags: Vec<&'static str> }
//!
//! let element = to_element(&Limits { cpu: 2, tags: vec!["a"] }).unwrap();
//! let map = element.as_dictionary().unwrap();
//! assert_eq!(map.get("cpu"), Some(&Element::from("2")));
//! assert_eq!(map.get("tags"), Some(&Element::List(vec![Element::from("a")])));
//! ```

use crate::{Element, ElementMap, Error, Result};
use serde::{ser, Serialize};

/// Serializer producing an [`Element`].
pub struct ElementSerializer;

pub struct SerializeVec {
    vec: Vec<Element>,
}

pub struct SerializeMap {
    map: ElementMap,
    current_key: Option<String>,
}

/// Collects the payload of a tuple or struct variant.
pub struct SerializeVariant {
    name: &'static str,
    fields: SerializeMap,
    items: Vec<Element>,
}

fn display<T: ToString>(value: T) -> Result<Element> {
    Ok(Element::Scalar(value.to_string()))
}

impl ser::Serializer for ElementSerializer {
    type Ok = Element;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeVariant;

    fn serialize_bool(self, v: bool) -> Result<Element> {
        display(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Element> {
        display(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Element> {
        display(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Element> {
        display(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Element> {
        display(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Element> {
        display(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Element> {
        display(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Element> {
        display(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Element> {
        display(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Element> {
        display(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Element> {
        display(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Element> {
        display(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Element> {
        display(v)
    }

    fn serialize_char(self, v: char) -> Result<Element> {
        display(v)
    }

    fn serialize_str(self, v: &str) -> Result<Element> {
        display(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Element> {
        Ok(Element::List(
            v.iter().map(|b| Element::Scalar(b.to_string())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Element> {
        Ok(Element::Empty)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Element>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Element> {
        Ok(Element::Empty)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Element> {
        Ok(Element::Empty)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Element> {
        display(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Element>
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
    ) -> Result<Element>
    where
        T: ?Sized + Serialize,
    {
        let mut map = ElementMap::with_capacity(1);
        map.insert(variant.to_string(), to_element(value)?);
        Ok(Element::Dictionary(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVariant> {
        Ok(SerializeVariant::new(variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVariant> {
        Ok(SerializeVariant::new(variant))
    }
}

impl SerializeVec {
    fn new(capacity: usize) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_element(value)?);
        Ok(())
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: ElementMap::new(),
            current_key: None,
        }
    }

    fn field<T: ?Sized + Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.map.insert(key.to_string(), to_element(value)?);
        Ok(())
    }
}

impl SerializeVariant {
    fn new(name: &'static str) -> Self {
        SerializeVariant {
            name,
            fields: SerializeMap::new(),
            items: Vec::new(),
        }
    }

    fn wrap(self, payload: Element) -> Element {
        let mut map = ElementMap::with_capacity(1);
        map.insert(self.name.to_string(), payload);
        Element::Dictionary(map)
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Element;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        Ok(Element::List(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Element;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        Ok(Element::List(self.vec))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Element> {
        Ok(Element::List(self.vec))
    }
}

impl ser::SerializeTupleVariant for SerializeVariant {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(to_element(value)?);
        Ok(())
    }

    fn end(mut self) -> Result<Element> {
        let items = std::mem::take(&mut self.items);
        Ok(self.wrap(Element::List(items)))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Element;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_element(key)? {
            Element::Scalar(s) => {
                self.current_key = Some(s);
                Ok(())
            }
            other => Err(Error::unsupported_type(&format!(
                "{} as dictionary key",
                other.kind()
            ))),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.field(&key, value)
    }

    fn end(self) -> Result<Element> {
        Ok(Element::Dictionary(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Element> {
        Ok(Element::Dictionary(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeVariant {
    type Ok = Element;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.field(key, value)
    }

    fn end(mut self) -> Result<Element> {
        let fields = std::mem::take(&mut self.fields.map);
        Ok(self.wrap(Element::Dictionary(fields)))
    }
}

/// Converts any `Serialize` value into an [`Element`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] when a map key is not a scalar.
pub fn to_element<T: ?Sized + Serialize>(value: &T) -> Result<Element> {
    value.serialize(ElementSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Point,
        Circle(u32),
        Rect(u32, u32),
        Named { label: String },
    }

    fn scalar(s: &str) -> Element {
        Element::from(s)
    }

    fn single(key: &str, value: Element) -> Element {
        let mut map = ElementMap::new();
        map.insert(key.to_string(), value);
        Element::Dictionary(map)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(to_element(&42u8).unwrap(), scalar("42"));
        assert_eq!(to_element(&-7i64).unwrap(), scalar("-7"));
        assert_eq!(to_element(&1.5f64).unwrap(), scalar("1.5"));
        assert_eq!(to_element(&true).unwrap(), scalar("true"));
        assert_eq!(to_element(&'x').unwrap(), scalar("x"));
        assert_eq!(to_element(&None::<u8>).unwrap(), Element::Empty);
        assert_eq!(to_element(&()).unwrap(), Element::Empty);
    }

    #[test]
    fn test_variants() {
        assert_eq!(to_element(&Shape::Point).unwrap(), scalar("Point"));
        assert_eq!(
            to_element(&Shape::Circle(3)).unwrap(),
            single("Circle", scalar("3"))
        );
        assert_eq!(
            to_element(&Shape::Rect(1, 2)).unwrap(),
            single("Rect", Element::List(vec![scalar("1"), scalar("2")]))
        );
        assert_eq!(
            to_element(&Shape::Named {
                label: "l".to_string()
            })
            .unwrap(),
            single("Named", single("label", scalar("l")))
        );
    }

    #[test]
    fn test_maps_need_scalar_keys() {
        let mut ok = BTreeMap::new();
        ok.insert(1, "one");
        assert_eq!(to_element(&ok).unwrap(), single("1", scalar("one")));

        let mut bad = BTreeMap::new();
        bad.insert(vec![1], "one");
        assert!(matches!(to_element(&bad), Err(Error::UnsupportedType(_))));
    }

    #[test]
    fn test_tuples_and_bytes() {
        assert_eq!(
            to_element(&(1, "a")).unwrap(),
            Element::List(vec![scalar("1"), scalar("a")])
        );
        assert_eq!(
            to_element(&Bytes(&[7, 8])).unwrap(),
            Element::List(vec![scalar("7"), scalar("8")])
        );
    }

    struct Bytes<'a>(&'a [u8]);

    impl Serialize for Bytes<'_> {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: ser::Serializer,
        {
            serializer.serialize_bytes(self.0)
        }
    }
}
