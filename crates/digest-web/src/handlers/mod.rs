//! HTTP handlers for all web routes.

pub mod home;
pub mod post;
pub mod archive;
pub mod digest;
pub mod system;
