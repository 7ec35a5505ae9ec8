/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use crate::oauth::{AccessToken, OAuthClient, RequestToken};
use crate::parse::parse_response;
use crate::registry::Namespace;
use crate::response::{Field, Response};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use strum_macros::{EnumString, IntoStaticStr};

pub const USER_AGENT: &str = concat!("flickr-rs/", env!("CARGO_PKG_VERSION"));

const REST_PATH: &str = "http://api.flickr.com/services/rest/";
const REST_PATH_SECURE: &str = "https://api.flickr.com/services/rest/";
const UPLOAD_PATH: &str = "http://up.flickr.com/services/upload/";
const UPLOAD_PATH_SECURE: &str = "https://up.flickr.com/services/upload/";
const REPLACE_PATH: &str = "http://up.flickr.com/services/replace/";
const REPLACE_PATH_SECURE: &str = "https://up.flickr.com/services/replace/";
const OAUTH_REQUEST_TOKEN: &str = "http://www.flickr.com/services/oauth/request_token";
const OAUTH_REQUEST_TOKEN_SECURE: &str = "https://www.flickr.com/services/oauth/request_token";
const OAUTH_AUTHORIZE: &str = "http://www.flickr.com/services/oauth/authorize";
const OAUTH_AUTHORIZE_SECURE: &str = "https://www.flickr.com/services/oauth/authorize";
const OAUTH_ACCESS_TOKEN: &str = "http://www.flickr.com/services/oauth/access_token";
const OAUTH_ACCESS_TOKEN_SECURE: &str = "https://www.flickr.com/services/oauth/access_token";

const REFLECTION_METHOD: &str = "flickr.reflection.getMethods";

/// This can be filter types as well as other parameters the specific API expects
pub type ApiParams<'a> = [(&'a str, &'a str)];

/// A plain/TLS endpoint pair; [`FlickrConfig::secure`] picks one at call time.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub plain: String,
    pub secure: String,
}

impl Endpoint {
    fn new(plain: &str, secure: &str) -> Self {
        Self {
            plain: plain.to_owned(),
            secure: secure.to_owned(),
        }
    }

    fn pick(&self, secure: bool) -> &str {
        if secure { &self.secure } else { &self.plain }
    }
}

/// The service endpoints a client talks to. Defaults to the live Flickr
/// endpoints; overridable so tests can point a client at a local server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub rest: Endpoint,
    pub upload: Endpoint,
    pub replace: Endpoint,
    pub request_token: Endpoint,
    pub authorize: Endpoint,
    pub access_token: Endpoint,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            rest: Endpoint::new(REST_PATH, REST_PATH_SECURE),
            upload: Endpoint::new(UPLOAD_PATH, UPLOAD_PATH_SECURE),
            replace: Endpoint::new(REPLACE_PATH, REPLACE_PATH_SECURE),
            request_token: Endpoint::new(OAUTH_REQUEST_TOKEN, OAUTH_REQUEST_TOKEN_SECURE),
            authorize: Endpoint::new(OAUTH_AUTHORIZE, OAUTH_AUTHORIZE_SECURE),
            access_token: Endpoint::new(OAUTH_ACCESS_TOKEN, OAUTH_ACCESS_TOKEN_SECURE),
        }
    }
}

/// Process-wide configuration for one client family.
#[derive(Debug, Clone)]
pub struct FlickrConfig {
    pub api_key: String,
    pub shared_secret: String,
    /// Selects the TLS variant of every endpoint, consulted per call.
    pub secure: bool,
    pub proxy: Option<String>,
    /// Set to `false` to skip TLS certificate verification.
    pub check_certificate: bool,
    /// Extra root certificate bundle (PEM).
    pub ca_file: Option<PathBuf>,
    pub user_agent: String,
    pub endpoints: Endpoints,
}

impl FlickrConfig {
    pub fn new(api_key: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            shared_secret: shared_secret.into(),
            secure: true,
            proxy: None,
            check_certificate: true,
            ca_file: None,
            user_agent: USER_AGENT.to_owned(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Permission level requested on the authorize URL.
#[derive(Debug, Clone, Copy, EnumString, IntoStaticStr)]
pub enum Perms {
    #[strum(serialize = "read")]
    Read,
    #[strum(serialize = "write")]
    Write,
    #[strum(serialize = "delete")]
    Delete,
}

/// Where the bytes of an upload come from.
pub enum PhotoSource {
    /// A file on disk, opened and closed inside the upload call.
    Path(PathBuf),
    /// In-memory bytes, used as-is.
    Bytes(Bytes),
    /// An already-open reader, drained but never opened or closed here.
    Reader(Box<dyn Read + Send>),
}

impl PhotoSource {
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    fn file_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photo".to_owned()),
            _ => "photo".to_owned(),
        }
    }

    // The file handle for the Path case lives only inside this call, so it
    // is closed on success and error alike.
    fn into_bytes(self) -> Result<Bytes, FlickrError> {
        match self {
            Self::Path(path) => Ok(std::fs::read(&path)?.into()),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf.into())
            }
        }
    }
}

impl From<&Path> for PhotoSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<PathBuf> for PhotoSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Bytes> for PhotoSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for PhotoSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

// Discovered method namespaces, shared by every client built for the same
// API key. Populated by the first discovery; later discoveries are no-ops.
static METHOD_CACHE: OnceLock<Mutex<HashMap<String, Arc<Namespace>>>> = OnceLock::new();

/// The Flickr client: owns the configuration and auth session, signs and
/// transmits calls, and routes every response through the payload parser.
#[derive(Debug)]
pub struct Flickr {
    config: FlickrConfig,
    oauth: OAuthClient,
    access_token: Option<String>,
    access_secret: Option<String>,
}

impl Flickr {
    /// Builds a client. Fails with [`FlickrError::AppNotConfigured`] right
    /// away when the API key or shared secret is missing; no call can
    /// succeed without them.
    pub fn new(config: FlickrConfig) -> Result<Self, FlickrError> {
        if config.api_key.is_empty() || config.shared_secret.is_empty() {
            return Err(FlickrError::AppNotConfigured);
        }
        let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        if !config.check_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ca_file) = &config.ca_file {
            let pem = std::fs::read(ca_file)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        let https_client = builder.build()?;
        let oauth = OAuthClient::new(&config.api_key, &config.shared_secret, https_client);
        Ok(Self {
            config,
            oauth,
            access_token: None,
            access_secret: None,
        })
    }

    pub fn config(&self) -> &FlickrConfig {
        &self.config
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Restores a persisted session so signed calls work without redoing the
    /// handshake.
    pub fn set_access_token(&mut self, token: impl Into<String>, secret: impl Into<String>) {
        self.access_token = Some(token.into());
        self.access_secret = Some(secret.into());
    }

    /// Performs one signed REST call and parses the answer.
    ///
    /// No auth precondition is checked locally: calls that need authorization
    /// go out anyway and surface whatever failure the remote side signals.
    pub async fn call(
        &self,
        method: &str,
        params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        self.call_with_oauth(method, params, None).await
    }

    /// Like [`Flickr::call`] with extra `oauth_*` protocol parameters.
    pub async fn call_with_oauth(
        &self,
        method: &str,
        params: Option<&ApiParams<'_>>,
        oauth_params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let url = self.config.endpoints.rest.pick(self.config.secure);
        let body = build_envelope(Some(method), params);
        let oauth = self.oauth_envelope(oauth_params);
        log::debug!("calling {method}");
        let raw = self
            .oauth
            .post_form(url, self.access_secret.as_deref(), &oauth, &body)
            .await?;
        parse_response(method, &raw.body)
    }

    /// The discovered method namespace for this client's API key.
    ///
    /// The first use per key calls `flickr.reflection.getMethods` through the
    /// normal engine (unauthenticated, the key alone suffices) and caches the
    /// resulting namespace process-wide. A racing second discovery keeps the
    /// first insert.
    pub async fn methods(&self) -> Result<Arc<Namespace>, FlickrError> {
        let cache = METHOD_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        {
            let guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(namespace) = guard.get(&self.config.api_key) {
                return Ok(namespace.clone());
            }
        }

        let resp = self.call(REFLECTION_METHOD, None).await?;
        let names: Vec<String> = match resp.get("method") {
            Field::List(nodes) => nodes.iter().map(|node| node.text("_content")).collect(),
            _ => Vec::new(),
        };
        if names.is_empty() {
            log::warn!("method discovery returned no methods");
        }
        let mut namespace = Namespace::new();
        namespace.register(&names);

        let mut guard = cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard
            .entry(self.config.api_key.clone())
            .or_insert_with(|| Arc::new(namespace))
            .clone())
    }

    /// Resolves a dotted path against the discovered namespace and calls the
    /// method it names.
    pub async fn invoke(
        &self,
        path: &str,
        params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let methods = self.methods().await?;
        let method = methods.resolve_method(path)?;
        self.call(method.name(), params).await
    }

    /// First leg of the handshake; `params` usually carries `oauth_callback`
    /// (use `oob` for out-of-band pin entry).
    pub async fn get_request_token(
        &self,
        params: Option<&ApiParams<'_>>,
    ) -> Result<RequestToken, FlickrError> {
        let url = self.config.endpoints.request_token.pick(self.config.secure);
        self.oauth.request_token(url, params.unwrap_or(&[])).await
    }

    /// The URL to send the user to. Pure composition, no network call.
    pub fn authorize_url(
        &self,
        token: &str,
        params: Option<&ApiParams<'_>>,
    ) -> Result<String, FlickrError> {
        let url = self.config.endpoints.authorize.pick(self.config.secure);
        self.oauth.authorize_url(url, token, params.unwrap_or(&[]))
    }

    /// [`Flickr::authorize_url`] with the usual `perms` parameter.
    pub fn authorize_url_with_perms(
        &self,
        token: &str,
        perms: Perms,
    ) -> Result<String, FlickrError> {
        let perms: &'static str = perms.into();
        self.authorize_url(token, Some(&[("perms", perms)]))
    }

    /// Final leg of the handshake. On success the returned token pair is also
    /// stored on this client, which is the only place the session is written.
    pub async fn get_access_token(
        &mut self,
        token: &str,
        secret: &str,
        verifier: &str,
    ) -> Result<AccessToken, FlickrError> {
        let url = self
            .config
            .endpoints
            .access_token
            .pick(self.config.secure)
            .to_owned();
        let access = self.oauth.access_token(&url, secret, token, verifier).await?;
        self.access_token = Some(access.token.clone());
        self.access_secret = Some(access.secret.clone());
        Ok(access)
    }

    /// Uploads a new photo. `params` takes the upload arguments (`title`,
    /// `description`, `tags`, ...) documented by the service.
    pub async fn upload_photo(
        &self,
        photo: impl Into<PhotoSource>,
        params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let url = self.config.endpoints.upload.pick(self.config.secure);
        self.upload_flickr(url, photo.into(), params, None).await
    }

    /// Replaces an existing photo; `photo_id` names the one to replace.
    pub async fn replace_photo(
        &self,
        photo: impl Into<PhotoSource>,
        params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let url = self.config.endpoints.replace.pick(self.config.secure);
        self.upload_flickr(url, photo.into(), params, None).await
    }

    /// [`Flickr::upload_photo`] with extra `oauth_*` protocol parameters.
    pub async fn upload_photo_with_oauth(
        &self,
        photo: impl Into<PhotoSource>,
        params: Option<&ApiParams<'_>>,
        oauth_params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let url = self.config.endpoints.upload.pick(self.config.secure);
        self.upload_flickr(url, photo.into(), params, oauth_params)
            .await
    }

    // Shared multipart path. Upload and replace answer in the legacy markup
    // shape, which the parser detects on its own.
    async fn upload_flickr(
        &self,
        url: &str,
        photo: PhotoSource,
        params: Option<&ApiParams<'_>>,
        oauth_params: Option<&ApiParams<'_>>,
    ) -> Result<Response, FlickrError> {
        let file_name = photo.file_name();
        let bytes = photo.into_bytes()?;
        let body = build_envelope(None, params);
        let oauth = self.oauth_envelope(oauth_params);
        log::debug!("uploading {} bytes to {url}", bytes.len());
        let raw = self
            .oauth
            .post_multipart(
                url,
                self.access_secret.as_deref(),
                &oauth,
                &body,
                bytes,
                file_name,
            )
            .await?;
        parse_response(url, &raw.body)
    }

    fn oauth_envelope(&self, extra: Option<&ApiParams<'_>>) -> Vec<(String, String)> {
        let mut oauth = Vec::new();
        if let Some(token) = &self.access_token {
            oauth.push(("oauth_token".to_owned(), token.clone()));
        }
        if let Some(extra) = extra {
            oauth.extend(extra.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
        }
        oauth
    }
}

// Fixed envelope sent with every call: the method name (absent on uploads),
// JSON format and no JSONP wrapper.
fn build_envelope(method: Option<&str>, params: Option<&ApiParams<'_>>) -> Vec<(String, String)> {
    let mut args = Vec::new();
    if let Some(method) = method {
        args.push(("method".to_owned(), method.to_owned()));
    }
    if let Some(params) = params {
        args.extend(params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())));
    }
    args.push(("format".to_owned(), "json".to_owned()));
    args.push(("nojsoncallback".to_owned(), "1".to_owned()));
    args
}
