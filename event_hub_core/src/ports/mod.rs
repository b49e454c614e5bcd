// trait definitions for ports

mod broker;
mod config_reader;

pub use broker::*;
pub use config_reader::*;
