//! Draw a signature with the pointer, keep it as a PNG, then browse, share
//! or delete the saved signatures.

#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod library;
pub mod raster;
pub mod record;
pub mod share;
pub mod state;
pub mod store;
pub mod utils;

pub use app::App;
