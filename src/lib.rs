/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # Flickr
//!
//! Client library for the Flickr REST API.
//!
//! For further details on the Rest API refer to the [Flickr API Docs](https://www.flickr.com/services/api/)
//!
//! ## Features
//!
//! - OAuth 1.0a handshake (request token, authorize URL, access token) and
//!   request signing
//! - Dynamic method discovery via `flickr.reflection.getMethods`: every
//!   method the service exposes is callable through one calling convention
//! - Dynamically shaped [`Response`] trees with permissive field access
//! - Photo upload and replace over the multipart endpoints, including the
//!   legacy XML answers those endpoints still return
//!
//! *Responses are not cached and calls are never retried; every call yields
//! exactly one parsed [`Response`] or one [`FlickrError`].*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! flickr = "0.1.0"
//! ```
//!
//! ## Usage
//!
//! **You will need to acquire an API key/secret from Flickr prior to using the API**
//!
//! ```rust
//! use flickr::{Flickr, FlickrConfig, Perms};
//!
//! async fn first_photo_title(
//!     api_key: &str,
//!     shared_secret: &str,
//!     verifier_from_user: &str,
//! ) -> anyhow::Result<String> {
//!     // The API key/secret is obtained from your Flickr account
//!     let mut flickr = Flickr::new(FlickrConfig::new(api_key, shared_secret))?;
//!
//!     // OAuth handshake: have the user authorize the request token, then
//!     // trade it for an access token. The access token is persisted on the
//!     // client, so calls from here on are signed with it.
//!     let request = flickr
//!         .get_request_token(Some(&[("oauth_callback", "oob")]))
//!         .await?;
//!     let url = flickr.authorize_url_with_perms(&request.token, Perms::Read)?;
//!     println!("Authorize this app at {url}");
//!     flickr
//!         .get_access_token(&request.token, &request.secret, verifier_from_user)
//!         .await?;
//!
//!     // Any discovered method is callable; arguments are plain name/value
//!     // pairs and the result is a dynamically shaped tree.
//!     let photos = flickr
//!         .invoke("flickr.people.getPhotos", Some(&[("user_id", "me"), ("per_page", "1")]))
//!         .await?;
//!     let title = match photos.get("photo") {
//!         flickr::Field::List(photos) => photos
//!             .first()
//!             .map(|photo| photo.text("title"))
//!             .unwrap_or_default(),
//!         _ => String::new(),
//!     };
//!     Ok(title)
//! }
//! ```

pub mod client;
pub mod errors;
pub mod oauth;
pub mod parse;
pub mod registry;
pub mod response;

pub use client::*;
pub use errors::*;
pub use oauth::*;
pub use parse::*;
pub use registry::*;
pub use response::*;
