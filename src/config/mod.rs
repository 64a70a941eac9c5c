//! Configuration management

mod defaults;
mod settings;

pub use defaults::build_default_widgets;
pub use settings::{default_config_dir, ConfigService, CONFIG_FILE_NAME};
