use std::env;

use anyhow::Context;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Elevated credential for the analytics table. Falls back to the
    /// primary credential when unset.
    pub service_database_url: Option<String>,
    /// Base of the public dashboard, used to build shareable invite
    /// URLs. Stored without a trailing slash.
    pub public_base_url: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("invalid PORT value")?,
            Err(_) => 8080,
        };
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let service_database_url = env::var("SERVICE_DATABASE_URL").ok();
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .context("PUBLIC_BASE_URL is required")?
            .trim_end_matches('/')
            .to_string();
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is required")?;

        Ok(Self {
            port,
            database_url,
            service_database_url,
            public_base_url,
            jwt_secret,
        })
    }

    pub fn share_url(&self, code: &str) -> String {
        format!("{}/join/{}", self.public_base_url, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_embeds_the_code() {
        let config = Config {
            port: 0,
            database_url: String::new(),
            service_database_url: None,
            public_base_url: "https://app.example.com".to_string(),
            jwt_secret: String::new(),
        };
        assert_eq!(
            config.share_url("abc123defg"),
            "https://app.example.com/join/abc123defg"
        );
    }
}
