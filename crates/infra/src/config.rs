use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub jwt_secret: String,
    pub invite_token_ttl_days: i64,
    pub join_code_max_attempts: u32,
    pub upload_dir: String,
    pub max_upload_bytes: u64,
    pub room_channel_capacity: usize,
    pub auth_dev_bypass_enabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("invite_token_ttl_days", 7)?
            .set_default("join_code_max_attempts", 20)?
            .set_default("upload_dir", "./uploads")?
            .set_default("max_upload_bytes", 52_428_800)?
            .set_default("room_channel_capacity", 256)?
            .set_default("auth_dev_bypass_enabled", false)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn is_test(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("test")
    }
}
