//! Helper functions shared by the loaders, templates and server

mod date;
mod url;

pub use date::*;
pub use url::*;
