/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::errors::FlickrError;
use std::collections::HashMap;

/// One remote API method bound to its full dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: String,
}

impl Method {
    /// The full remote name, e.g. `flickr.photos.getInfo`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One entry in a [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Namespace(Namespace),
    Method(Method),
}

/// Nested namespace of API methods keyed by the segments of their dotted
/// names, built once from the flat list the reflection call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    entries: HashMap<String, Entry>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the namespace tree from flat dotted names. Discovery runs at
    /// most once, so registering into an already populated namespace is a
    /// no-op.
    pub fn register<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.entries.is_empty() {
            return;
        }
        for name in names {
            self.insert(name.as_ref());
        }
    }

    fn insert(&mut self, full_name: &str) {
        let (path, leaf) = match full_name.rsplit_once('.') {
            Some((path, leaf)) => (path, leaf),
            None => ("", full_name),
        };
        let mut node = self;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let entry = node
                .entries
                .entry(segment.to_owned())
                .or_insert_with(|| Entry::Namespace(Namespace::new()));
            node = match entry {
                Entry::Namespace(ns) => ns,
                // A method already claimed this segment; skip the clashing name.
                Entry::Method(_) => return,
            };
        }
        node.entries.entry(leaf.to_owned()).or_insert_with(|| {
            Entry::Method(Method {
                name: full_name.to_owned(),
            })
        });
    }

    /// Walks a dotted path to the namespace or method it names.
    pub fn resolve(&self, path: &str) -> Result<&Entry, FlickrError> {
        let mut node = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let entry = node
                .entries
                .get(segment)
                .ok_or_else(|| FlickrError::MethodNotFound(path.to_owned()))?;
            if segments.peek().is_none() {
                return Ok(entry);
            }
            node = match entry {
                Entry::Namespace(ns) => ns,
                Entry::Method(_) => return Err(FlickrError::MethodNotFound(path.to_owned())),
            };
        }
        Err(FlickrError::MethodNotFound(path.to_owned()))
    }

    /// Like [`Namespace::resolve`] but only accepts a method at the leaf.
    pub fn resolve_method(&self, path: &str) -> Result<&Method, FlickrError> {
        match self.resolve(path)? {
            Entry::Method(method) => Ok(method),
            Entry::Namespace(_) => Err(FlickrError::MethodNotFound(path.to_owned())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const NAMES: &[&str] = &[
        "flickr.photos.getInfo",
        "flickr.photos.getSizes",
        "flickr.photos.comments.getList",
        "flickr.people.getInfo",
        "flickr.test.echo",
    ];

    fn registry() -> Namespace {
        let mut ns = Namespace::new();
        ns.register(NAMES);
        ns
    }

    #[test]
    fn every_full_path_resolves_to_its_method() {
        let ns = registry();
        for name in NAMES {
            let method = ns.resolve_method(name).unwrap();
            assert_eq!(method.name(), *name);
        }
    }

    #[test]
    fn intermediate_segments_resolve_to_namespaces() {
        let ns = registry();
        for path in ["flickr", "flickr.photos", "flickr.photos.comments"] {
            assert!(
                matches!(ns.resolve(path), Ok(Entry::Namespace(_))),
                "{path} should be a namespace"
            );
            assert!(matches!(
                ns.resolve_method(path),
                Err(FlickrError::MethodNotFound(_))
            ));
        }
    }

    #[test]
    fn unknown_paths_fail_with_method_not_found() {
        let ns = registry();
        for path in [
            "flickr.photos.delete",
            "flickr.nothing.here",
            "flickr.test.echo.deeper",
            "",
        ] {
            assert!(matches!(
                ns.resolve(path),
                Err(FlickrError::MethodNotFound(_))
            ));
        }
    }

    #[test]
    fn registration_is_idempotent() {
        let mut ns = registry();
        let before = ns.clone();
        ns.register(NAMES);
        ns.register(["flickr.other.method"]);
        assert_eq!(ns, before);
        assert!(matches!(
            ns.resolve("flickr.other.method"),
            Err(FlickrError::MethodNotFound(_))
        ));
    }

    #[test]
    fn register_on_empty_namespace_populates_it() {
        let mut ns = Namespace::new();
        assert!(ns.is_empty());
        ns.register(["a.b.c"]);
        assert!(!ns.is_empty());
        assert_eq!(ns.resolve_method("a.b.c").unwrap().name(), "a.b.c");
    }
}
