use log::info;
use secrecy::SecretString;
use std::env;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const TIMEZONE: &str = "TIMEZONE";
pub const GOOGLE_TOKEN_PATH: &str = "GOOGLE_TOKEN_PATH";
pub const GOOGLE_CREDENTIALS_JSON: &str = "GOOGLE_CREDENTIALS_JSON";

/// Load variables from a `.env` file if one is present
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => info!("No .env file loaded: {}", e),
    }
}

/// Read a variable, treating blank values as unset
pub fn get_env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn openai_api_key() -> Option<SecretString> {
    get_env_var(OPENAI_API_KEY).map(SecretString::from)
}
