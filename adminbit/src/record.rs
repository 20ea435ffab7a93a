use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use utoipa::openapi::schema::{ObjectBuilder, SchemaType, Type};
use utoipa::openapi::{RefOr, Schema};
use utoipa::{PartialSchema, ToSchema};

/// Scalar value of one record field. Serializes untagged so records round-trip
/// as plain JSON objects.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    /// String form used for display and substring search.
    pub fn as_display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            // Whole numbers keep their integer JSON shape, e.g. stock 100 instead of 100.0.
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Number(v as f64))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(FieldValue::Number(v as f64))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Number(v))
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

/// One row of data: a synthetic integer `id` plus an ordered field name -> value mapping.
/// The id is assigned once on creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: u64,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(id: u64) -> Self {
        Self { id, fields: Vec::new() }
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Replaces the value of an existing field or appends a new one, keeping field order.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// A record matches if the lower-cased string form of any field value,
    /// the id included, contains the already lower-cased term as a substring.
    pub fn matches(&self, lowercased_term: &str) -> bool {
        if lowercased_term.is_empty() {
            return true;
        }
        self.id.to_string().contains(lowercased_term)
            || self.fields.iter().any(|(_, v)| v.as_display().to_lowercase().contains(lowercased_term))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a flat object of scalar fields with an optional integer id")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record::new(0);
        while let Some(key) = access.next_key::<String>()? {
            if key == "id" {
                record.id = access.next_value::<u64>()?;
            } else {
                let value = access.next_value::<FieldValue>()?;
                record.set(&key, value);
            }
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

impl PartialSchema for Record {
    fn schema() -> RefOr<Schema> {
        Schema::Object(
            ObjectBuilder::new()
                .schema_type(SchemaType::Type(Type::Object))
                .description(Some("Flat record object: an integer id plus scalar fields"))
                .build(),
        )
        .into()
    }
}

impl ToSchema for Record {
    fn name() -> Cow<'static, str> {
        Cow::Borrowed("Record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_serialize_as_a_flat_json_object() {
        let record = Record::new(2).with("name", "Jane Smith").with("stock", 100i64).with("price", 49.99);
        let json = serde_json::to_string(&record).expect("record json");
        assert_eq!(json, r#"{"id":2,"name":"Jane Smith","stock":100,"price":49.99}"#);
    }

    #[test]
    fn it_should_deserialize_from_a_flat_json_object() {
        let json = r#"{"id":3,"name":"Bob Johnson","email":"bob@example.com"}"#;
        let record: Record = serde_json::from_str(json).expect("record json");
        assert_eq!(record.id, 3);
        assert_eq!(record.get("name"), Some(&FieldValue::Text("Bob Johnson".to_string())));
        assert_eq!(record.get("email"), Some(&FieldValue::Text("bob@example.com".to_string())));
    }

    #[test]
    fn it_should_default_a_missing_id_to_zero() {
        let record: Record = serde_json::from_str(r#"{"name":"X"}"#).expect("record json");
        assert_eq!(record.id, 0);
    }

    #[test]
    fn it_should_match_terms_against_any_field_including_the_id() {
        let record = Record::new(12).with("name", "Product A").with("price", 29.99);
        assert!(record.matches("product"));
        assert!(record.matches("29.99"));
        assert!(record.matches("12"));
        assert!(record.matches(""));
        assert!(!record.matches("zzz"));
    }

    #[test]
    fn it_should_replace_an_existing_field_in_place() {
        let mut record = Record::new(1).with("name", "A").with("status", "pending");
        record.set("name", FieldValue::Text("B".to_string()));
        let names: Vec<&str> = record.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "status"]);
        assert_eq!(record.get("name"), Some(&FieldValue::Text("B".to_string())));
    }
}
