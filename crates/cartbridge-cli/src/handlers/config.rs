//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::{Config, FileFormat};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use tracing::info;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: &Config,
    config_file: Option<&std::path::Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output).await,
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output).await,
        ConfigAction::Path => handle_config_path(config_file, output).await,
    }
}

/// Handle config init subcommand
async fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = args.path.unwrap_or_else(Config::default_init_path);

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml" | "json" | "yaml" | "yml") => {}
        _ => {
            return Err(Error::invalid_args(format!(
                "unsupported config file extension for {} (use .toml, .json or .yaml)",
                path.display()
            )))
        }
    }

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    info!(path = %path.display(), "Wrote default configuration");
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to customize settings for your environment.")?;
    Ok(())
}

/// Handle config show subcommand
async fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let format = match args.format {
        ConfigFormat::Toml => FileFormat::Toml,
        ConfigFormat::Json => FileFormat::Json,
        ConfigFormat::Yaml => FileFormat::Yaml,
    };
    let content = config.render(format)?;
    output.writeln(content.trim_end())
}

/// Handle config path subcommand
async fn handle_config_path(
    config_file: Option<&std::path::Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    match Config::resolve_path(config_file) {
        Some(path) => output.writeln(&path.display().to_string()),
        None => {
            output.info("No configuration file found; built-in defaults are in use.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn writer() -> OutputWriter {
        OutputWriter::new(OutputFormat::Human, false, true)
    }

    #[tokio::test]
    async fn test_init_writes_defaults_and_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cartbridge.yaml");

        let args = ConfigInitArgs {
            path: Some(path.clone()),
            force: false,
        };
        handle_config_init(args, &mut writer()).await.unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "mapping:\n  graphql_namespace: custom\n").unwrap();
        let args = ConfigInitArgs {
            path: Some(path.clone()),
            force: false,
        };
        handle_config_init(args, &mut writer()).await.unwrap();
        assert_eq!(
            Config::from_file(&path).unwrap().mapping.graphql_namespace,
            "custom"
        );

        let args = ConfigInitArgs {
            path: Some(path.clone()),
            force: true,
        };
        handle_config_init(args, &mut writer()).await.unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[tokio::test]
    async fn test_init_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let args = ConfigInitArgs {
            path: Some(dir.path().join("cartbridge.ini")),
            force: false,
        };
        let err = handle_config_init(args, &mut writer()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
        assert_eq!(err.exit_code(), 8);
    }
}
