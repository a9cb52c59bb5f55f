//! Host persistence for the webview shims.
//!
//! The store is a flat map persisted as a single JSON document, the desktop
//! counterpart of the webview's local storage.

pub mod json_map_store;
