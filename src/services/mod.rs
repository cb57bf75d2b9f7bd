//! Business logic services.
//!
//! - `review_toggle`: single-flight review completion toggling
//! - `review_events`: events broadcast while toggling
//! - `api`: REST routes over stores and the toggle controller
//! - `server`: HTTP server lifecycle
//!
//! Everything except `api` and `server` is independent of HTTP.

pub mod api;
pub mod review_events;
pub mod review_toggle;
pub mod server;

pub use api::ApiState;
pub use review_events::{ReviewEvent, ReviewEventKind};
pub use review_toggle::{ReviewToggle, ToggleCommand, ToggleState};
pub use server::{start_server, ServerHandle};
