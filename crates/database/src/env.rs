use std::env;

use murmur_common::EnvVars;

pub struct DatabaseEnv {
    pub database_url: String,
}

impl EnvVars for DatabaseEnv {
    fn load() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL is not set"),
        }
    }

    fn get_env_var(&self, key: &str) -> String {
        match key {
            "DATABASE_URL" => self.database_url.clone(),
            _ => panic!("Invalid environment variable: {}", key),
        }
    }
}
