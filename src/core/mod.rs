pub mod allocator;
pub mod collector;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod links;
pub mod sanitizer;
pub mod shim;
pub mod traits;
