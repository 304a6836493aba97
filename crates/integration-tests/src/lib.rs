//! Integration tests for Storekeep.
//!
//! The tests drive the real admin router in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory repositories and a
//! temporary upload directory. No database or running server is needed.
//!
//! ```bash
//! cargo test -p storekeep-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, header},
};
use image::{ImageFormat, RgbImage};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use storekeep_admin::config::AdminConfig;
use storekeep_admin::db::Stores;
use storekeep_admin::routes;
use storekeep_admin::state::AppState;
use storekeep_core::AdminId;

/// Base64 AES-256 key used by every test app.
pub const TEST_ENCRYPTION_KEY: &str = "q83vEjRWeJq8/ePyNXRhFh0dHDsyKpX1vQnQy8E9Mxk=";
/// Credentials of the admin created by [`TestApp::login_cookie`].
pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "Secret1!";

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "storekeep-test-boundary";

/// An admin app over in-memory stores.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    uploads: TempDir,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let state = AppState::new(test_config(uploads.path()), Stores::memory()).unwrap();
        let router = routes::app(state.clone());
        Self {
            state,
            router,
            uploads,
        }
    }

    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    /// Register an admin directly through the auth service.
    pub async fn register_admin(&self, username: &str, password: &str) -> AdminId {
        self.state
            .auth()
            .register_admin(username, password)
            .await
            .unwrap()
            .id
    }

    /// Register the default admin and return a `Cookie` header value for it.
    pub async fn login_cookie(&self) -> String {
        let admin_id = self.register_admin(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        let payload = self.state.auth().create_session_payload(admin_id).unwrap();
        format!("sk_admin_auth=session_payload:{payload}")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request(Method::GET, path, cookie, None, Body::empty()))
            .await
    }

    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        body: &Value,
    ) -> Response<Body> {
        self.send(request(
            method,
            path,
            cookie,
            Some("application/json"),
            Body::from(body.to_string()),
        ))
        .await
    }

    pub async fn send_form(
        &self,
        path: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(request(
            Method::POST,
            path,
            cookie,
            Some("application/x-www-form-urlencoded"),
            Body::from(body),
        ))
        .await
    }

    pub async fn send_multipart(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        body: Vec<u8>,
    ) -> Response<Body> {
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        self.send(request(
            method,
            path,
            cookie,
            Some(&content_type),
            Body::from(body),
        ))
        .await
    }
}

/// Admin configuration for tests.
#[must_use]
pub fn test_config(upload_dir: &Path) -> AdminConfig {
    AdminConfig {
        database_url: SecretString::from("postgres://localhost/storekeep_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        encryption_key: SecretString::from(TEST_ENCRYPTION_KEY),
        upload_dir: upload_dir.to_path_buf(),
        session_ttl: Duration::from_secs(3600),
        max_body_bytes: 1024 * 1024,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
        tls: None,
    }
}

fn request(
    method: Method,
    path: &str,
    cookie: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(b).to_string()
            }
            b' ' => "+".to_string(),
            other => format!("%{other:02X}"),
        })
        .collect()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// The value of the `sk_admin_auth` cookie set by a response, if any.
#[must_use]
pub fn auth_cookie_from(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("sk_admin_auth="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

/// A part of a multipart body: `(name, optional (file name, content type), data)`.
pub type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, Vec<u8>);

/// Encode parts as a `multipart/form-data` body using [`BOUNDARY`].
#[must_use]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file {
            Some((file_name, content_type)) => format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            ),
            None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Text field part.
#[must_use]
pub fn field<'a>(name: &'a str, value: &str) -> Part<'a> {
    (name, None, value.as_bytes().to_vec())
}

/// A PNG of the given size.
#[must_use]
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbImage::new(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
