//! Driving-license actions invoked by the dialogue engine.
//!
//! Each action turns one conversational turn (a [`Tracker`]) into chat
//! messages plus slot updates, talking to the license backend on the way.
//!
//! # Layout
//!
//! - `auth` / `endpoints` / `backend` - bearer headers, route table, and the
//!   HTTP client that accepts only `200` with `success: true`
//! - `handlers` - one async function per action
//! - `registry` - [`ActionName`] to handler map, each entry wrapped in a span
//! - `llm` / `assistant` - optional chat-completion fallback for free text
//!
//! # Failure principle
//!
//! Handlers always answer. Backend failures are logged and replaced by a
//! fixed apology; backend error text never reaches the user.
//!
//! [`Tracker`]: dlassist_core::Tracker

pub mod assistant;
pub mod auth;
pub mod backend;
pub mod endpoints;
pub mod handlers;
pub mod llm;
pub mod registry;
pub mod runtime;

pub use assistant::FallbackResponder;
pub use backend::{BackendCall, BackendClient, BackendError};
pub use registry::{default_registry, ActionName, ActionRegistry, UnknownAction};
pub use runtime::ActionContext;
