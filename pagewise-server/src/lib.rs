//! HTTP JSON API over a [`pagewise::StateService`].
//!
//! Routes:
//! - `GET /api/items?page&limit&search`: one page of the filtered, ordered collection
//! - `POST /api/items/order`: replace the saved order
//! - `POST /api/items/selected`: replace the saved selection
//! - `GET /api/items/state`: saved order and selection with their versions
//! - `GET /health`
//!
//! Every response body is a [`pagewise::wire::Envelope`].

mod config;
mod error;
mod routes;


pub use config::ServerArgs;
pub use error::ApiError;
pub use routes::{AppState, HEALTH_PATH, app};
