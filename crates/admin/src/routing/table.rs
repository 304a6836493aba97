//! Route registry with compiled path patterns.

use std::collections::HashMap;

use axum::http::Method;
use regex::Regex;
use thiserror::Error;

use super::Handler;
use crate::middleware::Guard;

/// Errors registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("route registered twice: {method} {pattern}")]
    Duplicate { method: Method, pattern: String },
}

/// A registered route.
pub struct Route {
    method: Method,
    pattern: String,
    matcher: Regex,
    param_names: Vec<String>,
    guards: &'static [Guard],
    handler: Handler,
}

impl Route {
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn guards(&self) -> &'static [Guard] {
        self.guards
    }

    #[must_use]
    pub const fn handler(&self) -> Handler {
        self.handler
    }

    /// Match a path, binding captures to parameter names in order.
    fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.matcher.captures(path)?;
        Some(
            self.param_names
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, cap)| cap.map(|m| (name.clone(), m.as_str().to_string())))
                .collect(),
        )
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

/// A matched route and its bound path parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: HashMap<String, String>,
}

/// Ordered list of routes. Built once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` if the pattern does not compile or the same
    /// method and pattern are already registered.
    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        guards: &'static [Guard],
        handler: Handler,
    ) -> Result<&mut Self, RouteError> {
        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == pattern)
        {
            return Err(RouteError::Duplicate {
                method,
                pattern: pattern.to_string(),
            });
        }

        let (matcher, param_names) = compile_pattern(pattern)?;
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            matcher,
            param_names,
            guards,
            handler,
        });
        Ok(self)
    }

    /// Find the first route matching the method and path.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|route| route.captures(path).map(|params| RouteMatch { route, params }))
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

/// Compile `/api/update/{id}` into `^/api/update/([^/]+)$` plus `["id"]`.
fn compile_pattern(pattern: &str) -> Result<(Regex, Vec<String>), RouteError> {
    let invalid = |source| RouteError::Pattern {
        pattern: pattern.to_string(),
        source,
    };
    let placeholder = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(invalid)?;

    let mut source = String::from("^");
    let mut names = Vec::new();
    let mut last = 0;
    for caps in placeholder.captures_iter(pattern) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        source.push_str(&regex::escape(&pattern[last..whole.start()]));
        source.push_str("([^/]+)");
        names.push(name.as_str().to_string());
        last = whole.end();
    }
    source.push_str(&regex::escape(&pattern[last..]));
    source.push('$');

    let matcher = Regex::new(&source).map_err(invalid)?;
    Ok((matcher, names))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::routing::AdminRequest;
    use crate::state::AppState;
    use axum::response::Response;

    async fn noop(_: AppState, _: AdminRequest) -> Result<Response, AppError> {
        Err(AppError::NotFound("noop".to_string()))
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table
            .add(Method::GET, "/api/products", &[], crate::handler!(noop))
            .unwrap()
            .add(Method::GET, "/api/products/{id}", &[Guard::Authorize], crate::handler!(noop))
            .unwrap()
            .add(Method::PUT, "/api/update/{id}", &[], crate::handler!(noop))
            .unwrap();
        table
    }

    #[test]
    fn test_compile_pattern_escapes_literals() {
        let (matcher, names) = compile_pattern("/files/{name}.json").unwrap();
        assert_eq!(matcher.as_str(), r"^/files/([^/]+)\.json$");
        assert_eq!(names, vec!["name".to_string()]);
        assert!(!matcher.is_match("/files/aXjson"));
    }

    #[test]
    fn test_find_binds_params() {
        let table = table();
        let matched = table.find(&Method::GET, "/api/products/42").unwrap();
        assert_eq!(matched.route.pattern(), "/api/products/{id}");
        assert_eq!(matched.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(matched.route.guards(), &[Guard::Authorize]);
    }

    #[test]
    fn test_find_is_anchored_and_method_aware() {
        let table = table();
        assert!(table.find(&Method::GET, "/api/products/42/extra").is_none());
        assert!(table.find(&Method::GET, "/prefix/api/products").is_none());
        assert!(table.find(&Method::POST, "/api/products").is_none());
        assert!(table.find(&Method::GET, "/api/update/1").is_none());
        assert!(table.find(&Method::PUT, "/api/update/1").is_some());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut table = table();
        let result = table.add(Method::GET, "/api/products", &[], crate::handler!(noop));
        assert!(matches!(result, Err(RouteError::Duplicate { .. })));
    }
}
