use clap::Subcommand;
use fitpulse_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting (e.g. "timer.tick_ms", "steps.utc_offset_minutes")
    Get { key: String },
    /// Change one setting and save; prints the stored value
    Set {
        key: String,
        /// New value ("none" clears an optional number)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Print all settings, or one section (timer, steps, display)
    List { section: Option<String> },
    /// Restore the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or_default();
            tracing::debug!(%key, %stored, "config updated");
            println!("{key} = {stored}");
        }
        ConfigAction::List { section } => {
            let config = serde_json::to_value(Config::load()?)?;
            let shown = match section {
                Some(name) => config
                    .get(&name)
                    .cloned()
                    .ok_or(ConfigError::UnknownKey(name))?,
                None => config,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            println!(
                "config reset: presets {:?} s, tick {} ms, lookback {} days",
                defaults.timer.presets, defaults.timer.tick_ms, defaults.steps.sync_lookback_days
            );
        }
    }
    Ok(())
}
