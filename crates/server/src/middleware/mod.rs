//! Request middleware.

pub mod app_proxy;

pub use app_proxy::verify_app_proxy;
