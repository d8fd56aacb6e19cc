//! Request extractors: JSON-or-multipart forms and the admin session.

mod form;
mod session;
pub use form::FormPayload;
pub use session::Session;
