/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use crate::response::Response;
use serde_json::{Map, Value};

/// Classifies and parses one raw response body into a [`Response`].
///
/// Bodies come in two shapes: JSON for regular REST calls, and a legacy XML
/// fragment that the upload/replace endpoints return no matter which format
/// was requested. This is the single place that turns a remote `stat=fail`
/// into [`FlickrError::FailedResponse`]; callers never branch on shape.
///
/// `request` names the call being parsed and is carried into every error for
/// attribution.
pub fn parse_response(request: &str, body: &str) -> Result<Response, FlickrError> {
    if body.starts_with("<?xml") {
        parse_upload_markup(request, body)
    } else {
        parse_json(request, body)
    }
}

fn parse_json(request: &str, body: &str) -> Result<Response, FlickrError> {
    let body = if body.is_empty() { "{}" } else { body };
    let value: Value = serde_json::from_str(body).map_err(|err| FlickrError::Parse {
        request: request.to_owned(),
        detail: err.to_string(),
    })?;
    let Value::Object(mut fields) = value else {
        return Err(FlickrError::Parse {
            request: request.to_owned(),
            detail: "top-level JSON value is not an object".to_owned(),
        });
    };

    if fields.remove("stat").is_some_and(|stat| stat == "fail") {
        let message = fields.get("message").map(scalar_text).unwrap_or_default();
        let code = fields.get("code").map(scalar_text);
        log::warn!("'{request}' failed: {message} (code: {code:?})");
        return Err(FlickrError::FailedResponse {
            message,
            code,
            request: request.to_owned(),
        });
    }

    // Single-object responses arrive wrapped in a named envelope; the name
    // becomes the node type. Only an exactly-one-key object whose value is
    // itself an object is unwrapped.
    let envelope = if fields.len() == 1 {
        fields
            .iter()
            .next()
            .and_then(|(key, value)| value.as_object().map(|_| key.clone()))
    } else {
        None
    };
    if let Some(kind) = envelope {
        if let Some(Value::Object(inner)) = fields.remove(&kind) {
            return Ok(Response::new(inner, Some(kind)));
        }
    }
    Ok(Response::new(fields, None))
}

// Upload/replace answers are a single shallow element, so a handful of
// string scans beats a real XML parser here.
fn parse_upload_markup(request: &str, body: &str) -> Result<Response, FlickrError> {
    if attr(body, "stat").is_some_and(|stat| stat == "fail") {
        let message = attr(body, "msg").unwrap_or_default().to_owned();
        let code = attr(body, "code").map(str::to_owned);
        log::warn!("'{request}' failed: {message} (code: {code:?})");
        return Err(FlickrError::FailedResponse {
            message,
            code,
            request: request.to_owned(),
        });
    }

    let kind = element_name(body).ok_or_else(|| FlickrError::Parse {
        request: request.to_owned(),
        detail: "no element found in upload response".to_owned(),
    })?;

    let mut fields = Map::new();
    for name in ["secret", "originalsecret"] {
        if let Some(value) = attr(body, name) {
            fields.insert(name.to_owned(), Value::String(value.to_owned()));
        }
    }
    if let Some(content) = inline_text(body) {
        fields.insert("_content".to_owned(), Value::String(content.to_owned()));
    }
    Ok(Response::new(fields, Some(kind.to_owned())))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Value of `name="..."`. The leading space keeps `secret` from matching the
// tail of `originalsecret`.
fn attr<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {name}=\"");
    let start = body.find(&needle)? + needle.len();
    let rest = &body[start..];
    Some(&rest[..rest.find('"')?])
}

// Tag name of the first element after the declaration.
fn element_name(body: &str) -> Option<&str> {
    let mut rest = body;
    while let Some(pos) = rest.find('<') {
        rest = &rest[pos + 1..];
        if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let end = rest
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            return Some(&rest[..end]);
        }
    }
    None
}

// First `>text</` run, i.e. the inline content of the element.
fn inline_text(body: &str) -> Option<&str> {
    let mut rest = body;
    while let Some(gt) = rest.find('>') {
        let after = &rest[gt + 1..];
        let lt = after.find('<')?;
        if lt > 0 && after[lt..].starts_with("</") {
            return Some(&after[..lt]);
        }
        rest = &after[lt..];
    }
    None
}
