//! HTTP inference surface for a built career model.

pub mod rest;

pub use rest::{routes, RestApi};
