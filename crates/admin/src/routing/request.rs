//! Buffered request handed to guards and handlers.

use std::collections::HashMap;

use axum::{
    Form,
    body::{Body, Bytes},
    extract::{FromRequest, Multipart, Request},
    http::{Extensions, HeaderMap, Method, Uri, header, request::Parts},
};
use cookie::Cookie;
use serde::de::DeserializeOwned;

use storekeep_core::AdminId;

use crate::error::AppError;
use crate::models::{AUTH_COOKIE_NAME, AuthCookie};

/// A request whose body has already been read into memory.
///
/// Guards may read the body (e.g. to validate a login form) and the handler
/// can still read it afterwards.
#[derive(Debug, Clone)]
pub struct AdminRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
    params: HashMap<String, String>,
    admin_id: Option<AdminId>,
    secure: bool,
}

impl AdminRequest {
    /// Wrap request parts and a buffered body.
    #[must_use]
    pub fn new(parts: Parts, body: Bytes, secure: bool) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            extensions: parts.extensions,
            body,
            params: HashMap::new(),
            admin_id: None,
            secure,
        }
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the client reached us over HTTPS.
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        self.secure
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// A bound path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The admin attached by the authorize guard.
    #[must_use]
    pub const fn admin_id(&self) -> Option<AdminId> {
        self.admin_id
    }

    pub(crate) const fn set_admin_id(&mut self, admin_id: AdminId) {
        self.admin_id = Some(admin_id);
    }

    /// The authenticated admin, or `AppError::Unauthorized`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if no guard attached an admin.
    pub fn require_admin(&self) -> Result<AdminId, AppError> {
        match self.admin_id {
            Some(id) => Ok(id),
            None => Err(AppError::Unauthorized),
        }
    }

    /// Value of a named cookie.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    /// The parsed auth cookie, if present and well-formed.
    #[must_use]
    pub fn auth_cookie(&self) -> Option<AuthCookie> {
        self.cookie(AUTH_COOKIE_NAME)
            .as_deref()
            .and_then(AuthCookie::parse)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for malformed JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
    }

    /// Deserialize the body as a URL-encoded form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the body is not a valid form.
    pub async fn form<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let Form(value) = Form::<T>::from_request(self.to_request(), &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(value)
    }

    /// Open the body as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the request is not multipart.
    pub async fn multipart(&self) -> Result<Multipart, AppError> {
        Multipart::from_request(self.to_request(), &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))
    }

    /// Rebuild an axum request over the buffered body so stock extractors
    /// can run against it.
    fn to_request(&self) -> Request {
        let mut request = Request::new(Body::from(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        *request.extensions_mut() = self.extensions.clone();
        request
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    fn request(method: Method, headers: &[(&str, &str)], body: &str) -> AdminRequest {
        let mut builder = axum::http::Request::builder().method(method).uri("/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        AdminRequest::new(parts, Bytes::from(body.to_string()), false)
    }

    #[derive(Deserialize)]
    struct Login {
        username: String,
    }

    #[test]
    fn test_cookie_lookup() {
        let req = request(
            Method::GET,
            &[("cookie", "theme=dark; sk_admin_auth=session_payload:abc")],
            "",
        );
        assert_eq!(req.cookie("theme").as_deref(), Some("dark"));
        assert_eq!(
            req.auth_cookie(),
            Some(AuthCookie::SessionPayload("abc".to_string()))
        );
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_malformed_auth_cookie_ignored() {
        let mut req = request(Method::GET, &[], "");
        req.headers
            .insert(header::COOKIE, HeaderValue::from_static("sk_admin_auth=junk"));
        assert_eq!(req.auth_cookie(), None);
    }

    #[tokio::test]
    async fn test_form_can_be_read_twice() {
        let req = request(
            Method::POST,
            &[("content-type", "application/x-www-form-urlencoded")],
            "username=root&password=x",
        );
        let first: Login = req.form().await.unwrap();
        let second: Login = req.form().await.unwrap();
        assert_eq!(first.username, "root");
        assert_eq!(second.username, "root");
    }

    #[test]
    fn test_json_errors_are_validation() {
        let req = request(Method::POST, &[], "{not json");
        let result: Result<serde_json::Value, _> = req.json();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_require_admin() {
        let mut req = request(Method::GET, &[], "");
        assert!(matches!(req.require_admin(), Err(AppError::Unauthorized)));
        req.set_admin_id(AdminId::new(3));
        assert_eq!(req.require_admin().unwrap(), AdminId::new(3));
    }
}
