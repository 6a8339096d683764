use crate::config;

/// Load and validate settings. A broken config falls back to defaults rather
/// than keeping the player from starting.
pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("legato: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            eprintln!("legato: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
