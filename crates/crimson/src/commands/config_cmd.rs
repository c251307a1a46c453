//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::ExposeSecret;

use crimson_core::config::DEFAULT_ADVISOR_MODEL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if cfg.advisor.api_key.is_some() {
        cfg.advisor.api_key = Some(REDACTED.into());
    }
    cfg
}

/// Where the advisor key would come from right now, masked.
fn key_status(cfg: &Config) -> String {
    if !cfg.advisor.enabled {
        return "advisor disabled".into();
    }
    match crimson_config::resolve_api_key(&cfg.advisor) {
        Ok(key) => {
            let key = key.expose_secret();
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("resolved ({REDACTED}{tail})")
        }
        Err(_) => "not found, advisor will run offline".into(),
    }
}

/// Ask for an API key without echoing it.
fn prompt_api_key(prompt: &str) -> Result<String, CliError> {
    let key = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    Ok(key.trim().to_owned())
}

/// Offer to store the key in the system keyring or return it for plaintext config.
///
/// Returns `Some(key)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_key_storage(key: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the API key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_api_key(key)?;
        eprintln!("   ✓ API key stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(key.to_owned()))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let safe = redacted(&cfg);
            let out = match global.output {
                OutputFormat::Json => output::render_json(&safe, false)?,
                OutputFormat::JsonCompact => output::render_json(&safe, true)?,
                OutputFormat::Yaml => output::render_yaml(&safe)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    let body = toml::to_string_pretty(&safe)
                        .map_err(|e| CliError::Render(e.to_string()))?;
                    format!(
                        "# {}\n# api key: {}\n\n{}",
                        path.display(),
                        key_status(&cfg),
                        body.trim_end()
                    )
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init => {
            eprintln!("✨ CrimsonGuard -- configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            if path.exists()
                && !Confirm::new()
                    .with_prompt("A config file already exists. Overwrite it?")
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?
            {
                return Ok(());
            }

            let mut cfg = Config::default();

            cfg.advisor.enabled = Confirm::new()
                .with_prompt("Enable the security advisor (needs a Generative Language API key)?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;

            if cfg.advisor.enabled {
                cfg.advisor.model = Input::new()
                    .with_prompt("Model")
                    .default(DEFAULT_ADVISOR_MODEL.to_owned())
                    .interact_text()
                    .map_err(prompt_err)?;

                let env_name = cfg.advisor.api_key_env.clone().unwrap_or_default();
                let key = prompt_api_key(&format!("API key (blank to read ${env_name}): "))?;
                if !key.is_empty() {
                    cfg.advisor.api_key = prompt_key_storage(&key)?;
                }
            }

            config::save_config_to(&cfg, &path)?;
            eprintln!("\n   ✓ Config written to {}", path.display());
            Ok(())
        }

        ConfigCommand::SetApiKey { plaintext } => {
            let key = prompt_api_key("API key: ")?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "API key cannot be empty".into(),
                });
            }

            if plaintext {
                let mut cfg = config::load(global)?;
                cfg.advisor.api_key = Some(key);
                config::save_config_to(&cfg, &path)?;
                if !global.quiet {
                    eprintln!("API key saved to {}", path.display());
                }
            } else {
                config::store_api_key(&key)?;
                if !global.quiet {
                    eprintln!("API key stored in system keyring");
                }
            }
            Ok(())
        }
    }
}
