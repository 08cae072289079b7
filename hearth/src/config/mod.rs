mod error;
mod hearth_toml;

pub use error::*;
pub use hearth_toml::*;
