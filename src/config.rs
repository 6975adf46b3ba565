use std::env;
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: String,
    pub static_dir: String,
    pub uploads_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            data_file: env::var("DATA_FILE").unwrap_or_else(|_| "memories.json".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
        }
    }

    pub fn upload_dir(&self, subdir: &str) -> PathBuf {
        Path::new(&self.uploads_dir).join(subdir)
    }
}
