/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use flickr::{AccessToken, Flickr, FlickrConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

fn get_cached_token(path: PathBuf) -> anyhow::Result<AccessToken> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[allow(dead_code)]
pub(crate) fn client_from_env() -> anyhow::Result<Flickr> {
    let api_key = std::env::var("FLICKR_API_KEY")?;
    let shared_secret = std::env::var("FLICKR_API_SECRET")?;
    Ok(Flickr::new(FlickrConfig::new(api_key, shared_secret))?)
}

#[allow(dead_code)]
pub(crate) fn authorized_client_from_env() -> anyhow::Result<Flickr> {
    let mut flickr = client_from_env()?;
    let token_cache = std::env::var("FLICKR_AUTH_CACHE")?;
    let token = get_cached_token(token_cache.into())?;
    flickr.set_access_token(token.token, token.secret);
    Ok(flickr)
}
