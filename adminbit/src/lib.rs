//! adminbit is the backend engine of a schema-driven admin console: a static
//! schema registry describes a handful of named record collections, and a
//! collection controller drives load, search, create, update and delete
//! against a pluggable data store, currently an in-memory mock with
//! artificial latency. An axum REST surface with OpenAPI docs exposes the
//! engine behind a token-gated session.

pub mod controller;
pub mod error;
pub mod form;
pub mod logger;
pub mod notify;
pub mod record;
pub mod rest;
pub mod schema;
pub mod session;
pub mod settings;
pub mod store;

pub use controller::{search, CollectionController};
pub use error::{AppError, StoreError};
pub use form::{EditingSession, FormState};
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier, RecordingNotifier};
pub use record::{FieldValue, Record};
pub use rest::{build_router, serve, AppJson, CollectionView, ErrorResponse, RequestState, TokenResponse};
pub use schema::{CollectionSchema, FieldDescriptor, FieldType, SchemaRegistry};
pub use session::{Credentials, SessionManager};
pub use settings::{AppConfig, HttpSettings, StoreSettings};
pub use store::{DataStore, MemoryStore};
