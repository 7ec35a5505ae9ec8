/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use hmac::{Hmac, Mac};
use rand::RngExt as _;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::collections::HashMap;

type HmacSha1 = Hmac<Sha1>;

/// Raw HTTP answer handed back to the call engine for parsing.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Temporary token pair from the request-token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestToken {
    pub token: String,
    pub secret: String,
}

/// Long-lived credential pair from the access-token exchange, plus the
/// identity fields Flickr sends along with it. Serializable so callers can
/// persist a session and restore it with `set_access_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub secret: String,
    pub user_nsid: Option<String>,
    pub username: Option<String>,
    pub fullname: Option<String>,
}

/// Signs and transmits OAuth 1.0a requests.
///
/// Holds the consumer (API key) credential pair and the configured HTTP
/// client; token credentials are passed per call by the engine so the same
/// transport serves the whole handshake.
#[derive(Clone)]
pub struct OAuthClient {
    consumer_key: String,
    consumer_secret: String,
    https_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(consumer_key: &str, consumer_secret: &str, https_client: reqwest::Client) -> Self {
        Self {
            consumer_key: consumer_key.to_owned(),
            consumer_secret: consumer_secret.to_owned(),
            https_client,
        }
    }

    /// Signs the oauth *and* body parameters and POSTs everything
    /// form-encoded. Used by every REST call and both token exchanges.
    pub async fn post_form(
        &self,
        url: &str,
        token_secret: Option<&str>,
        oauth_params: &[(String, String)],
        body_params: &[(String, String)],
    ) -> Result<RawResponse, FlickrError> {
        let mut params = self.protocol_params();
        params.extend(oauth_params.iter().cloned());
        params.extend(body_params.iter().cloned());
        let signature = self.signature("POST", url, &params, token_secret);
        params.push(("oauth_signature".to_owned(), signature));

        let resp = self.https_client.post(url).form(&params).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        log::debug!("POST {url} -> {status}");
        Ok(RawResponse { status, body })
    }

    /// Signs only the oauth parameters (the binary body cannot be signed),
    /// carries them in the `Authorization` header, and POSTs the body as
    /// multipart with the photo bytes attached under `photo`.
    pub async fn post_multipart(
        &self,
        url: &str,
        token_secret: Option<&str>,
        oauth_params: &[(String, String)],
        body_params: &[(String, String)],
        photo: Bytes,
        file_name: String,
    ) -> Result<RawResponse, FlickrError> {
        let mut oauth = self.protocol_params();
        oauth.extend(oauth_params.iter().cloned());
        let signature = self.signature("POST", url, &oauth, token_secret);
        oauth.push(("oauth_signature".to_owned(), signature));

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in body_params {
            form = form.text(name.clone(), value.clone());
        }
        form = form.part(
            "photo",
            reqwest::multipart::Part::stream(photo).file_name(file_name),
        );

        let resp = self
            .https_client
            .post(url)
            .header("Authorization", authorization_header(&oauth))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        log::debug!("POST multipart {url} -> {status}");
        Ok(RawResponse { status, body })
    }

    /// First leg of the handshake. `extra` usually carries `oauth_callback`.
    pub async fn request_token(
        &self,
        url: &str,
        extra: &[(&str, &str)],
    ) -> Result<RequestToken, FlickrError> {
        let oauth = owned_params(extra);
        let raw = self.post_form(url, None, &oauth, &[]).await?;
        let fields = parse_form_encoded(&raw.body);
        Ok(RequestToken {
            token: required(&fields, "oauth_token")?,
            secret: required(&fields, "oauth_token_secret")?,
        })
    }

    /// Pure URL composition, no network traffic.
    pub fn authorize_url(
        &self,
        url: &str,
        token: &str,
        extra: &[(&str, &str)],
    ) -> Result<String, FlickrError> {
        let mut params = owned_params(extra);
        params.push(("oauth_token".to_owned(), token.to_owned()));
        let url = url::Url::parse_with_params(url, &params)?;
        Ok(url.into())
    }

    /// Final leg of the handshake, signed with the request-token secret.
    pub async fn access_token(
        &self,
        url: &str,
        request_secret: &str,
        token: &str,
        verifier: &str,
    ) -> Result<AccessToken, FlickrError> {
        let oauth = vec![
            ("oauth_token".to_owned(), token.to_owned()),
            ("oauth_verifier".to_owned(), verifier.to_owned()),
        ];
        let raw = self.post_form(url, Some(request_secret), &oauth, &[]).await?;
        let fields = parse_form_encoded(&raw.body);
        Ok(AccessToken {
            token: required(&fields, "oauth_token")?,
            secret: required(&fields, "oauth_token_secret")?,
            user_nsid: fields.get("user_nsid").cloned(),
            username: fields.get("username").cloned(),
            fullname: fields.get("fullname").cloned(),
        })
    }

    // Fresh per-request protocol parameters.
    fn protocol_params(&self) -> Vec<(String, String)> {
        let nonce: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        vec![
            ("oauth_consumer_key".to_owned(), self.consumer_key.clone()),
            ("oauth_nonce".to_owned(), nonce),
            (
                "oauth_signature_method".to_owned(),
                "HMAC-SHA1".to_owned(),
            ),
            (
                "oauth_timestamp".to_owned(),
                chrono::Utc::now().timestamp().to_string(),
            ),
            ("oauth_version".to_owned(), "1.0".to_owned()),
        ]
    }

    fn signature(
        &self,
        http_method: &str,
        url: &str,
        params: &[(String, String)],
        token_secret: Option<&str>,
    ) -> String {
        let base = signature_base_string(http_method, url, params);
        let key = format!(
            "{}&{}",
            urlencoding::encode(&self.consumer_secret),
            urlencoding::encode(token_secret.unwrap_or(""))
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("invalid key length");
        mac.update(base.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("consumer_key", &"xxx")
            .field("consumer_secret", &"xxx")
            .finish()
    }
}

// Percent-encoded, sorted `k=v` pairs under the signed method and URL,
// per RFC 5849 §3.4.1.
fn signature_base_string(http_method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        http_method,
        urlencoding::encode(url),
        urlencoding::encode(&normalized)
    )
}

fn authorization_header(oauth_params: &[(String, String)]) -> String {
    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {fields}")
}

fn parse_form_encoded(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((
                urlencoding::decode(key).ok()?.into_owned(),
                urlencoding::decode(value).ok()?.into_owned(),
            ))
        })
        .collect()
}

fn required(fields: &HashMap<String, String>, name: &'static str) -> Result<String, FlickrError> {
    fields
        .get(name)
        .cloned()
        .ok_or(FlickrError::MalformedTokenResponse(name))
}

fn owned_params(params: &[(&str, &str)]) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_string_sorts_and_encodes_params() {
        let params = vec![
            ("oauth_nonce".to_owned(), "abc".to_owned()),
            ("method".to_owned(), "flickr.test.echo".to_owned()),
            ("oauth_consumer_key".to_owned(), "key".to_owned()),
        ];
        let base = signature_base_string(
            "POST",
            "https://api.flickr.com/services/rest/",
            &params,
        );
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.flickr.com%2Fservices%2Frest%2F&\
             method%3Dflickr.test.echo%26oauth_consumer_key%3Dkey%26oauth_nonce%3Dabc"
        );
    }

    #[test]
    fn base_string_double_encodes_param_values() {
        let params = vec![("oauth_callback".to_owned(), "http://example.com/cb".to_owned())];
        let base = signature_base_string("POST", "http://example.com/", &params);
        // The value is encoded once into the pair and again into the base string.
        assert!(base.ends_with("oauth_callback%3Dhttp%253A%252F%252Fexample.com%252Fcb"));
    }

    #[test]
    fn signature_is_deterministic_for_fixed_params() {
        let client = OAuthClient::new("key", "secret", reqwest::Client::new());
        let params = vec![("oauth_nonce".to_owned(), "n".to_owned())];
        let a = client.signature("POST", "http://example.com/", &params, Some("ts"));
        let b = client.signature("POST", "http://example.com/", &params, Some("ts"));
        assert_eq!(a, b);
        // HMAC-SHA1 is 20 bytes, so the base64 form is always 28 chars.
        assert_eq!(a.len(), 28);
        assert_ne!(
            a,
            client.signature("POST", "http://example.com/", &params, None)
        );
    }

    #[test]
    fn authorization_header_quotes_and_encodes() {
        let params = vec![
            ("oauth_token".to_owned(), "tok".to_owned()),
            ("oauth_signature".to_owned(), "a+b=".to_owned()),
        ];
        assert_eq!(
            authorization_header(&params),
            "OAuth oauth_token=\"tok\", oauth_signature=\"a%2Bb%3D\""
        );
    }

    #[test]
    fn form_encoded_token_bodies_are_decoded() {
        let fields = parse_form_encoded(
            "oauth_token=72157-abc&oauth_token_secret=s3cr3t&fullname=Jane%20Doe",
        );
        assert_eq!(fields["oauth_token"], "72157-abc");
        assert_eq!(fields["fullname"], "Jane Doe");
        assert!(required(&fields, "oauth_token").is_ok());
        assert!(matches!(
            required(&fields, "oauth_verifier"),
            Err(FlickrError::MalformedTokenResponse("oauth_verifier"))
        ));
    }

    #[test]
    fn authorize_url_appends_token_and_extras() {
        let client = OAuthClient::new("key", "secret", reqwest::Client::new());
        let url = client
            .authorize_url(
                "https://www.flickr.com/services/oauth/authorize",
                "tok",
                &[("perms", "read")],
            )
            .unwrap();
        assert_eq!(
            url,
            "https://www.flickr.com/services/oauth/authorize?perms=read&oauth_token=tok"
        );
    }
}
