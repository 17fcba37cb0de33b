//! Route table: pattern → method → handler.
//!
//! # Responsibilities
//! - Register handlers per (pattern, method), rejecting duplicates eagerly
//! - Look up the handler for a request path and method
//!
//! # Design Decisions
//! - Patterns are scanned in registration order (deterministic)
//! - First candidate with a handler for the method wins
//! - A candidate without the method is skipped and the scan continues;
//!   if nothing else matches the lookup is a plain not-found
//! - Registration is atomic: a failed call leaves the table unchanged

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::http::Method;
use crate::routing::error::RouteError;
use crate::routing::matcher::{Params, PathPattern};
use crate::routing::route::Route;

struct Entry {
    pattern: PathPattern,
    handlers: HashMap<Method, Arc<dyn Route>>,
}

/// A successful lookup.
pub struct RouteMatch<'a> {
    /// The pattern that matched, as registered.
    pub pattern: &'a str,
    pub route: &'a Arc<dyn Route>,
    pub params: Params,
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registered routes, in registration order.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
    /// Pattern string → index into `entries`.
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` for `(pattern, method)`.
    ///
    /// Fails with [`RouteError::DuplicateRoute`] if the pair exists, or
    /// [`RouteError::InvalidPattern`] if the pattern does not parse.
    pub fn register(
        &mut self,
        pattern: &str,
        method: Method,
        route: Arc<dyn Route>,
    ) -> Result<(), RouteError> {
        let parsed = PathPattern::parse(pattern)?;
        self.insert(parsed, method, route)
    }

    /// Register `route` for a path matched segment by segment, with no
    /// parameter binding.
    pub fn register_literal(
        &mut self,
        path: &str,
        method: Method,
        route: Arc<dyn Route>,
    ) -> Result<(), RouteError> {
        let parsed = PathPattern::literal(path)?;
        self.insert(parsed, method, route)
    }

    fn insert(&mut self, pattern: PathPattern, method: Method, route: Arc<dyn Route>) -> Result<(), RouteError> {
        let raw = pattern.as_str().to_string();
        match self.index.get(&raw) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if entry.pattern != pattern {
                    return Err(RouteError::invalid(
                        &raw,
                        "registered both as a literal path and as a parameter pattern",
                    ));
                }
                if entry.handlers.contains_key(&method) {
                    return Err(RouteError::DuplicateRoute { pattern: raw, method });
                }
                entry.handlers.insert(method, route);
            }
            None => {
                let mut handlers = HashMap::new();
                handlers.insert(method, route);
                self.index.insert(raw.clone(), self.entries.len());
                self.entries.push(Entry { pattern, handlers });
            }
        }

        tracing::debug!(pattern = %raw, method = %method, "Route registered");
        Ok(())
    }

    /// Find the handler for `path` and `method`.
    pub fn lookup(&self, path: &str, method: Method) -> Option<RouteMatch<'_>> {
        for entry in &self.entries {
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };
            match entry.handlers.get(&method) {
                Some(route) => {
                    return Some(RouteMatch {
                        pattern: entry.pattern.as_str(),
                        route,
                        params,
                    });
                }
                None => {
                    tracing::trace!(
                        pattern = %entry.pattern,
                        method = %method,
                        path = %path,
                        "Pattern matched without a handler for method, continuing"
                    );
                }
            }
        }
        None
    }

    /// Add every entry of `other`. Fails without changes if any pair clashes.
    pub fn merge(&mut self, other: &RouteTable) -> Result<(), RouteError> {
        for theirs in &other.entries {
            let Some(&i) = self.index.get(theirs.pattern.as_str()) else {
                continue;
            };
            let ours = &self.entries[i];
            if ours.pattern != theirs.pattern {
                return Err(RouteError::invalid(
                    theirs.pattern.as_str(),
                    "registered both as a literal path and as a parameter pattern",
                ));
            }
            if let Some(&method) = theirs.handlers.keys().find(|m| ours.handlers.contains_key(m)) {
                return Err(RouteError::DuplicateRoute {
                    pattern: theirs.pattern.as_str().to_string(),
                    method,
                });
            }
        }
        for theirs in &other.entries {
            for (method, route) in &theirs.handlers {
                self.insert(theirs.pattern.clone(), *method, Arc::clone(route))?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, pattern: &str, method: Method) -> bool {
        self.index
            .get(pattern)
            .is_some_and(|&i| self.entries[i].handlers.contains_key(&method))
    }

    /// Methods registered for `pattern`, sorted.
    pub fn methods(&self, pattern: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .index
            .get(pattern)
            .map(|&i| self.entries[i].handlers.keys().copied().collect())
            .unwrap_or_default();
        methods.sort();
        methods
    }

    /// Registered patterns, in scan order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.pattern.as_str())
    }

    /// Every `(pattern, method, handler)` triple.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Method, &Arc<dyn Route>)> {
        self.entries.iter().flat_map(|e| {
            e.handlers
                .iter()
                .map(move |(method, route)| (e.pattern.as_str(), *method, route))
        })
    }

    /// Number of (pattern, method) pairs.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.handlers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.entries {
            let mut methods: Vec<_> = entry.handlers.keys().collect();
            methods.sort();
            map.entry(&entry.pattern.as_str(), &methods);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Response};
    use crate::routing::route::{FnRoute, RouteResult};
    use crate::views;

    fn route(body: &'static str) -> Arc<dyn Route> {
        Arc::new(FnRoute(move |_: &Request, _: &mut Response| -> RouteResult {
            Ok(views::text(body))
        }))
    }

    fn body_of(m: &RouteMatch<'_>) -> Vec<u8> {
        let req = Request::new(Method::Get, "/", Default::default());
        let mut res = Response::for_request(&req);
        m.route.handle(&req, &mut res).unwrap().render(&mut res).unwrap();
        res.body().to_vec()
    }

    #[test]
    fn duplicate_registration_fails_and_leaves_table_unchanged() {
        let mut table = RouteTable::new();
        table.register("/hello", Method::Get, route("first")).unwrap();
        table.register("/hello", Method::Post, route("post")).unwrap();

        let err = table.register("/hello", Method::Get, route("second")).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateRoute { method: Method::Get, .. }));

        assert_eq!(table.len(), 2);
        assert_eq!(table.methods("/hello"), vec![Method::Get, Method::Post]);
        let found = table.lookup("/hello", Method::Get).unwrap();
        assert_eq!(body_of(&found), b"first");
    }

    #[test]
    fn invalid_pattern_is_not_inserted() {
        let mut table = RouteTable::new();
        assert!(table.register("no-slash", Method::Get, route("x")).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn lookup_binds_params() {
        let mut table = RouteTable::new();
        table.register("/player/:id", Method::Get, route("player")).unwrap();
        let found = table.lookup("/player/54", Method::Get).unwrap();
        assert_eq!(found.pattern, "/player/:id");
        assert_eq!(found.params["id"], "54");
    }

    #[test]
    fn method_mismatch_is_not_found() {
        let mut table = RouteTable::new();
        table.register("/item", Method::Post, route("post")).unwrap();
        assert!(table.lookup("/item", Method::Get).is_none());
        assert!(table.lookup("/item", Method::Post).is_some());
    }

    #[test]
    fn method_mismatch_continues_to_later_candidates() {
        let mut table = RouteTable::new();
        table.register("/item/:id", Method::Post, route("update")).unwrap();
        table.register("/item/:name", Method::Get, route("by-name")).unwrap();

        let found = table.lookup("/item/7", Method::Get).unwrap();
        assert_eq!(found.pattern, "/item/:name");
        assert_eq!(found.params["name"], "7");
        assert_eq!(body_of(&found), b"by-name");
    }

    #[test]
    fn first_registered_candidate_wins() {
        let mut table = RouteTable::new();
        table.register("/player/:id", Method::Get, route("param")).unwrap();
        table.register("/player/me", Method::Get, route("literal")).unwrap();

        let found = table.lookup("/player/me", Method::Get).unwrap();
        assert_eq!(body_of(&found), b"param");
        assert_eq!(table.patterns().collect::<Vec<_>>(), vec!["/player/:id", "/player/me"]);
    }

    #[test]
    fn merge_is_atomic() {
        let mut base = RouteTable::new();
        base.register("/a", Method::Get, route("a")).unwrap();

        let mut other = RouteTable::new();
        other.register("/b", Method::Get, route("b")).unwrap();
        other.register("/a", Method::Get, route("a2")).unwrap();

        assert!(base.merge(&other).is_err());
        assert_eq!(base.len(), 1);
        assert!(!base.contains("/b", Method::Get));

        let mut clean = RouteTable::new();
        clean.register("/c", Method::Put, route("c")).unwrap();
        base.merge(&clean).unwrap();
        assert!(base.contains("/c", Method::Put));
    }

    #[test]
    fn literal_registration_keeps_colon_segments_literal() {
        let mut table = RouteTable::new();
        table.register_literal("/:id", Method::Get, route("file")).unwrap();
        assert!(table.lookup("/anything", Method::Get).is_none());
        assert_eq!(body_of(&table.lookup("/:id", Method::Get).unwrap()), b"file");

        let err = table.register("/:id", Method::Post, route("param")).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));

        let mut merged = RouteTable::new();
        merged.merge(&table).unwrap();
        assert!(merged.lookup("/anything", Method::Get).is_none());
        assert!(merged.lookup("/:id", Method::Get).is_some());
    }
}
