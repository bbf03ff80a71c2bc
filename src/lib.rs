// Library root
// -----------
// The binary (`main.rs`) parses arguments and hands off to `ui`; all the
// work lives in the modules below so it can be tested without a terminal.
//
// Module responsibilities:
// - `config`: environment settings, device id and the per-process context.
// - `limits`: file and directory size thresholds.
// - `walker`: flattens a directory into the files of one upload.
// - `api`: blocking HTTP calls to the IPFS gateway.
// - `upload`: the upload pipeline, including history persistence.
// - `history`: the local JSON log of past uploads.
// - `removal`: parsing removal targets and unpinning content.
// - `cli` / `ui`: argument definitions and terminal flows.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod limits;
pub mod removal;
pub mod ui;
pub mod upload;
pub mod walker;

pub use error::{Error, Result};
