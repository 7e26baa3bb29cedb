// cmd and reports belong to the binary; loading and errors are shared with the
// integration tests.
pub mod error;
pub mod loader;
