/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use std::io;
use thiserror::Error;

/// Error conditions that can be returned
#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("API key or shared secret is not configured")]
    AppNotConfigured,

    /// The remote side answered the call but flagged it as failed
    /// (`stat=fail` in JSON, `stat="fail"` in the upload markup).
    #[error("API call '{request}' failed: {message} (code: {code:?})")]
    FailedResponse {
        message: String,
        code: Option<String>,
        request: String,
    },

    #[error("No such API method: {0}")]
    MethodNotFound(String),

    #[error("Unparsable response to '{request}': {detail}")]
    Parse { request: String, detail: String },

    #[error("Token exchange response is missing '{0}'")]
    MalformedTokenResponse(&'static str),

    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("Request network error")]
    Request(#[from] reqwest::Error),

    #[error("Deserialization error")]
    Deserialization(#[from] serde_json::Error),

    #[error("URL Parse error")]
    UrlParsing(#[from] url::ParseError),
}
