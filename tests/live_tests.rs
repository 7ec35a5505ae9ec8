/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
mod helpers;

// Tests against the real service; they need FLICKR_API_KEY/FLICKR_API_SECRET
// (and for the authenticated ones an access token pair) in the environment,
// so they stay out of ci/cd builds.
#[cfg(test)]
mod test {
    use crate::helpers;
    use dotenvy::dotenv;
    use flickr::Field;

    #[ignore]
    #[tokio::test]
    async fn echo() {
        dotenv().ok();
        let _ = env_logger::try_init();
        let flickr = helpers::client_from_env().unwrap();
        let resp = flickr
            .call("flickr.test.echo", Some(&[("greeting", "hello")]))
            .await
            .unwrap();
        assert_eq!(resp.text("greeting"), "hello");
    }

    #[ignore]
    #[tokio::test]
    async fn discovery_resolves_known_methods() {
        dotenv().ok();
        let flickr = helpers::client_from_env().unwrap();
        let methods = flickr.methods().await.unwrap();
        for name in ["flickr.photos.getInfo", "flickr.people.getPhotos"] {
            assert_eq!(methods.resolve_method(name).unwrap().name(), name);
        }
    }

    // The 20 most recent interesting photos, no authorization needed.
    #[ignore]
    #[tokio::test]
    async fn interestingness_list() {
        dotenv().ok();
        let flickr = helpers::client_from_env().unwrap();
        let resp = flickr
            .invoke("flickr.interestingness.getList", Some(&[("per_page", "20")]))
            .await
            .unwrap();
        let Field::List(photos) = resp.get("photo") else {
            panic!("photo should be a list");
        };
        assert_eq!(photos.len(), 20);
        for photo in &photos {
            println!("'{}' id={} secret={}", photo.text("title"), photo.text("id"), photo.text("secret"));
        }
    }

    #[ignore]
    #[tokio::test]
    async fn authenticated_login_check() {
        dotenv().ok();
        let flickr = helpers::authorized_client_from_env().unwrap();
        let resp = flickr.call("flickr.test.login", None).await.unwrap();
        assert_eq!(resp.kind(), Some("user"));
        assert!(!resp.text("id").is_empty());
    }
}
