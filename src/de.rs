//! Conversion of [`Element`]s into Rust values.
//!
//! [`ElementDeserializer`] reads a borrowed [`Element`] tree. Scalars carry
//! no type of their own, so the requested type decides how a scalar is read:
//! numbers are parsed, booleans compare case-insensitively, and strings
//! borrow the scalar text.
//!
//! Structs are strict: every field needs a dictionary key and the
//! dictionary may not carry keys the struct does not declare. Fields marked
//! `#[serde(skip)]` take no part in either check.
//!
//! ```rust
//! use bearml::{element, from_element, Error};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Server { host: String, port: u16, tls: bool }
//!
//! let element = element!({"host": "localhost", "port": "8080", "tls": "True"});
//! let server: Server = from_element(&element).unwrap();
//! assert_eq!(server, Server { host: "localhost".into(), port: 8080, tls: true });
//!
//! let short = element!({"host": "localhost", "port": "8080"});
//! assert!(matches!(from_element::<Server>(&short), Err(Error::FieldNotFound(_))));
//! ```

use crate::{Element, Error, Result};
use serde::de::{self, Deserialize, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Deserializer reading a borrowed [`Element`].
pub struct ElementDeserializer<'de> {
    element: &'de Element,
}

impl<'de> ElementDeserializer<'de> {
    #[must_use]
    pub fn new(element: &'de Element) -> Self {
        ElementDeserializer { element }
    }

    fn scalar(&self, expected: &str) -> Result<&'de str> {
        match self.element {
            Element::Scalar(text) => Ok(text),
            other => Err(Error::type_mismatch(expected, other.kind())),
        }
    }
}

fn parse_bool(text: &str) -> Result<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::type_mismatch("bool", text))
    }
}

fn parse_char(text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(Error::type_mismatch("char", text)),
    }
}

/// Scalar-reading methods shared by the element and key deserializers.
macro_rules! deserialize_scalars {
    ($($method:ident => $visit:ident($ty:ty),)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                let text = self.scalar(stringify!($ty))?;
                let parsed = text
                    .trim()
                    .parse::<$ty>()
                    .map_err(|_| Error::type_mismatch(stringify!($ty), text))?;
                visitor.$visit(parsed)
            }
        )*

        fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            visitor.visit_bool(parse_bool(self.scalar("bool")?)?)
        }

        fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            visitor.visit_char(parse_char(self.scalar("char")?)?)
        }

        fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            visitor.visit_borrowed_str(self.scalar("string")?)
        }

        fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            self.deserialize_str(visitor)
        }

        fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            self.deserialize_str(visitor)
        }
    };
}

impl<'de> de::Deserializer<'de> for ElementDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::Empty => visitor.visit_unit(),
            Element::Scalar(text) => visitor.visit_borrowed_str(text),
            Element::List(items) => visitor.visit_seq(SeqAccess::new(items)),
            Element::Dictionary(_) => self.deserialize_map(visitor),
        }
    }

    deserialize_scalars! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::Empty => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::Empty => visitor.visit_unit(),
            other => Err(Error::type_mismatch("empty", other.kind())),
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::List(items) => visitor.visit_seq(SeqAccess::new(items)),
            other => Err(Error::type_mismatch("list", other.kind())),
        }
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::List(items) if items.len() == len => visitor.visit_seq(SeqAccess::new(items)),
            Element::List(items) => Err(Error::type_mismatch(
                &format!("list of {len} items"),
                &format!("list of {} items", items.len()),
            )),
            other => Err(Error::type_mismatch("list", other.kind())),
        }
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::Dictionary(map) => visitor.visit_map(MapAccess {
                iter: map.iter(),
                value: None,
            }),
            other => Err(Error::type_mismatch("dictionary", other.kind())),
        }
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let Element::Dictionary(map) = self.element else {
            return Err(Error::type_mismatch("dictionary", self.element.kind()));
        };
        if let Some(missing) = fields.iter().find(|field| !map.contains_key(field)) {
            return Err(Error::FieldNotFound((*missing).to_string()));
        }
        if map.len() != fields.len() {
            return Err(Error::FieldCountMismatch {
                expected: fields.len(),
                found: map.len(),
            });
        }
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.element {
            Element::Scalar(variant) => visitor.visit_enum(EnumAccess {
                variant,
                value: None,
            }),
            Element::Dictionary(map) if map.len() == 1 => match map.iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumAccess {
                    variant,
                    value: Some(value),
                }),
                None => Err(Error::type_mismatch("enum", "empty dictionary")),
            },
            other => Err(Error::type_mismatch("enum", other.kind())),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Deserializer for dictionary keys, which are always text.
struct KeyDeserializer<'de> {
    key: &'de str,
}

impl<'de> KeyDeserializer<'de> {
    fn scalar(&self, _expected: &str) -> Result<&'de str> {
        Ok(self.key)
    }
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_scalars! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.key.into_deserializer())
    }

    forward_to_deserialize_any! {
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct ignored_any
    }
}

struct SeqAccess<'de> {
    iter: std::slice::Iter<'de, Element>,
}

impl<'de> SeqAccess<'de> {
    fn new(items: &'de [Element]) -> Self {
        SeqAccess { iter: items.iter() }
    }
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(element) => seed.deserialize(ElementDeserializer::new(element)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess<'de> {
    iter: indexmap::map::Iter<'de, String, Element>,
    value: Option<&'de Element>,
}

impl<'de> de::MapAccess<'de> for MapAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(KeyDeserializer { key }).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ElementDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumAccess<'de> {
    variant: &'de str,
    value: Option<&'de Element>,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = Error;
    type Variant = VariantAccess<'de>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(KeyDeserializer { key: self.variant })?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'de> {
    value: Option<&'de Element>,
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None | Some(Element::Empty) => Ok(()),
            Some(other) => Err(Error::type_mismatch("unit variant", other.kind())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ElementDeserializer::new(value)),
            None => Err(Error::type_mismatch("newtype variant", "unit variant")),
        }
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_tuple(
                ElementDeserializer::new(value),
                len,
                visitor,
            ),
            None => Err(Error::type_mismatch("tuple variant", "unit variant")),
        }
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_struct(
                ElementDeserializer::new(value),
                "",
                fields,
                visitor,
            ),
            None => Err(Error::type_mismatch("struct variant", "unit variant")),
        }
    }
}

/// Converts an [`Element`] into any `Deserialize` type.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] when the element kind or a scalar literal
/// does not fit, and [`Error::FieldNotFound`] or
/// [`Error::FieldCountMismatch`] when a dictionary does not match a struct.
pub fn from_element<'de, T: Deserialize<'de>>(element: &'de Element) -> Result<T> {
    T::deserialize(ElementDeserializer::new(element))
}
