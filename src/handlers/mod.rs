//! HTTP handlers for plain resources, tab families, and admin auth.

pub mod auth;
pub mod resource;
pub mod tree;
