/// `load_config` module: optional YAML defaults for the CLI flags.
///
/// The file carries the same keys as the command line (`dags_directory`,
/// `dags_bucket`, `data_directory`, `fail_on_error`), all optional. Values
/// given on the command line override the file.
///
/// # Errors
/// Read and parse failures are `anyhow::Error`s surfaced at the CLI boundary.
use anyhow::Result;
use composer_sync_core::config::RunConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Loads a YAML run configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: RunConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    Ok(config)
}

/// Overlays command-line values on top of file values.
pub fn merge(file: RunConfig, flags: RunConfig) -> RunConfig {
    RunConfig {
        dags_directory: flags.dags_directory.or(file.dags_directory),
        dags_bucket: flags.dags_bucket.or(file.dags_bucket),
        data_directory: flags.data_directory.or(file.data_directory),
        fail_on_error: flags.fail_on_error || file.fail_on_error,
    }
}
