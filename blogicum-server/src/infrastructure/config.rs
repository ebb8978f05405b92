use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Size of every feed page.
    pub posts_per_page: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    fn from_source(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = var("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url =
            var("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            var("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let jwt_ttl_minutes = var("JWT_TTL_MINUTES")
            .unwrap_or_else(|| "60".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid JWT_TTL_MINUTES: {}", e))?;
        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let posts_per_page = var("POSTS_PER_PAGE")
            .unwrap_or_else(|| "10".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid POSTS_PER_PAGE: {}", e))?;
        if posts_per_page == 0 {
            anyhow::bail!("POSTS_PER_PAGE must be positive");
        }

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            jwt_ttl_minutes,
            cors_origins,
            posts_per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = load(&[("DATABASE_URL", "postgres://db"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.posts_per_page, 10);
        assert_eq!(config.jwt_ttl_minutes, 60);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
    }

    #[test]
    fn required_values_are_enforced() {
        assert!(load(&[("JWT_SECRET", "s")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgres://db")]).is_err());
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,,"),
        ])
        .unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn page_size_must_be_positive() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "s"),
            ("POSTS_PER_PAGE", "0"),
        ]);
        assert!(err.is_err());
    }
}
