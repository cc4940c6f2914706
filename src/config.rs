use std::env;
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub app_env: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://param_cleaner.db?mode=rwc".to_string());
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Self {
            database_url,
            server_addr,
            app_env,
        }
    }
}
