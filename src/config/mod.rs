//! Node configuration.
//!
//! Sources, lowest precedence first: built-in defaults, `config/default.*`
//! (optional), then `CLIPQUEUE_*` environment variables with `__` between
//! section and key, e.g. `CLIPQUEUE_QUEUE__TIMEOUT_MINUTES=5`. List values in
//! the environment are comma separated.

mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    DiscoverySettings, DisplaySettings, NodeSettings, QueueSettings, Settings, TransportSettings,
};

pub const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Loads the configuration from the default file and environment variables
/// and merges it over the defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(DEFAULT_CONFIG_FILE)
}

pub fn load_config_from(file: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("CLIPQUEUE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("node.seeds")
                .with_list_parse_key("display.slots"),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_over(Settings::default()))
}
