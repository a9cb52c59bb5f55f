//! Host-side shims for the ace webview: a persistent key-value store, an
//! origin-rewriting fetch wrapper and per-project simvar presets.
//! - `data_storage` is the accessor; `stored_data` holds free-function delegators.
//! - `fetch` resolves app-relative paths against the platform's local origin.
//! - `simvars` loads and saves the active project's `.ace/simvars.json`.
//! - `runtime` wires everything from configuration.

pub mod data_storage;
pub mod errors;
pub mod fetch;
pub mod runtime;
pub mod simvars;
pub mod storage;
pub mod stored_data;
