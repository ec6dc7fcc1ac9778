use std::env;

use crate::constants::envvars;

/// Load the local `.env` and the file named by `REGCACHE_DOTENV`, if any.
///
/// Returns the files loaded; logging is usually not set up yet at this point.
pub fn load_dotenv() -> Vec<String> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenv::dotenv() {
        loaded.push(path.display().to_string());
    }
    if let Ok(extra) = env::var(envvars::DOTENV_PATH) {
        if dotenv::from_path(&extra).is_ok() {
            loaded.push(extra);
        }
    }
    loaded
}
