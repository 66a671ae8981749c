//! Thin HTTP surface over the sandbox engine: the REST endpoints and the
//! tool-invocation endpoint, plus static file serving and a small viewer.
pub mod present;
pub mod routes;
pub mod viewer;
