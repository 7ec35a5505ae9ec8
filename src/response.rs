/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use serde_json::{Map, Value};

/// A read-only tree of named fields built from one API response.
///
/// The Flickr API has no published schema, so responses are kept dynamically
/// shaped: [`Response::get`] classifies whatever the server sent and
/// [`Response::text`] reads absent fields as `""` instead of failing. Once
/// constructed a `Response` is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    kind: Option<String>,
    fields: Map<String, Value>,
}

/// One field of a [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A scalar value (string, number, bool, null) or a mixed array.
    Value(Value),
    /// A nested object, typed after the field name.
    Node(Response),
    /// An array of objects, each typed after the field name.
    List(Vec<Response>),
    /// No such field.
    Absent,
}

impl Response {
    pub(crate) fn new(fields: Map<String, Value>, kind: Option<String>) -> Self {
        Self { kind, fields }
    }

    /// The type tag of this node, e.g. `photo` for a `flickr.photos.getInfo`
    /// response. `None` when the payload had no single named envelope.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Names of the fields present on this node.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Looks up a field and classifies its shape.
    pub fn get(&self, name: &str) -> Field {
        match self.fields.get(name) {
            None => Field::Absent,
            Some(Value::Object(map)) => {
                Field::Node(Response::new(map.clone(), Some(name.to_owned())))
            }
            Some(Value::Array(items)) if items.iter().all(Value::is_object) => {
                Field::List(
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(|map| Response::new(map.clone(), Some(name.to_owned())))
                        .collect(),
                )
            }
            Some(value) => Field::Value(value.clone()),
        }
    }

    /// Reads a field as text. Absent fields, nulls and structured fields read
    /// as `""`; scalars are flattened to their string form.
    pub fn text(&self, name: &str) -> String {
        match self.fields.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn sample() -> Response {
        let Value::Object(fields) = json!({
            "id": "52387",
            "views": 7,
            "visible": true,
            "owner": {"nsid": "12@N00", "username": "frank"},
            "tags": [{"_content": "sunset"}, {"_content": "beach"}],
            "sizes": ["s", "m"],
        }) else {
            unreachable!()
        };
        Response::new(fields, Some("photo".to_owned()))
    }

    #[test]
    fn scalar_fields() {
        let resp = sample();
        assert_eq!(resp.kind(), Some("photo"));
        assert_eq!(resp.get("id"), Field::Value(json!("52387")));
        assert_eq!(resp.text("id"), "52387");
        assert_eq!(resp.text("views"), "7");
        assert_eq!(resp.text("visible"), "true");
    }

    #[test]
    fn nested_node_is_typed_after_its_field() {
        let Field::Node(owner) = sample().get("owner") else {
            panic!("owner should be a node");
        };
        assert_eq!(owner.kind(), Some("owner"));
        assert_eq!(owner.text("username"), "frank");
    }

    #[test]
    fn array_of_objects_becomes_a_list() {
        let Field::List(tags) = sample().get("tags") else {
            panic!("tags should be a list");
        };
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].kind(), Some("tags"));
        assert_eq!(tags[1].text("_content"), "beach");
    }

    #[test]
    fn mixed_array_stays_a_literal() {
        assert_eq!(sample().get("sizes"), Field::Value(json!(["s", "m"])));
    }

    #[test]
    fn absent_field_reads_as_empty() {
        let resp = sample();
        assert_eq!(resp.get("nope"), Field::Absent);
        assert_eq!(resp.text("nope"), "");
        assert_eq!(resp.text("owner"), "");
    }
}
