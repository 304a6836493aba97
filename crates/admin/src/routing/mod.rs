//! Request routing for the admin panel.
//!
//! All admin pages and API endpoints go through one [`RouteTable`], installed
//! as the axum fallback via [`dispatch`]. Each route carries a method, a path
//! pattern with `{name}` placeholders, an ordered guard list and a handler.

pub mod dispatch;
pub mod request;
pub mod table;

use axum::response::Response;
use futures::future::BoxFuture;

use crate::error::AppError;
use crate::state::AppState;

pub use dispatch::dispatch;
pub use request::AdminRequest;
pub use table::{Route, RouteError, RouteMatch, RouteTable};

/// Future returned by a route handler.
pub type HandlerFuture = BoxFuture<'static, Result<Response, AppError>>;

/// A route handler. Plain function pointers keep the table `Copy`-cheap and
/// free of captured state.
pub type Handler = fn(AppState, AdminRequest) -> HandlerFuture;

/// Wrap an `async fn(AppState, AdminRequest) -> Result<Response, AppError>`
/// as a [`Handler`].
#[macro_export]
macro_rules! handler {
    ($f:path) => {{
        fn boxed(
            state: $crate::state::AppState,
            request: $crate::routing::AdminRequest,
        ) -> $crate::routing::HandlerFuture {
            Box::pin($f(state, request))
        }
        boxed as $crate::routing::Handler
    }};
}
