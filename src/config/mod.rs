//! Configuration system
//!
//! TOML file at `data/config.toml` (or a path given on the command line),
//! every field defaulted through `config_struct!`.

mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::{
    get_config_clone, load_config, load_config_from_path, logger_config_from,
    read_config_file, with_config, CONFIG, CONFIG_FILE_PATH,
};
