//! Client library for the Smart Librarian question-answering backend.
//!
//! The backend exposes two endpoints: `POST /api/chat` answers a question and
//! `GET /api/health` reports whether it can currently serve answers. This crate
//! owns the wire types, the typed error taxonomy and the HTTP client, plus the
//! [`Settings`](settings::Settings) used to locate the backend.

pub mod api;
pub mod client;
pub mod error;
pub mod settings;
pub mod tls;

pub use api::{ChatRequest, ChatResponse, HealthResponse};
pub use client::{ApiClient, Backend};
pub use error::ApiError;
pub use settings::Settings;
