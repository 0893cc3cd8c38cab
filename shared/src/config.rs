use std::env;

pub const DEFAULT_TABLE_NAME: &str = "studio";
pub const DEFAULT_BUCKET_NAME: &str = "studio-media";
pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

/// Settings read once per cold start
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub table_name: String,
    pub bucket_name: String,
    pub region: String,
    /// CDN or custom domain in front of the bucket, without trailing slash
    pub public_asset_base_url: Option<String>,
    /// Admin login is refused while unset
    pub admin_password: Option<String>,
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_ttl_hours = match non_empty("SESSION_TTL_HOURS") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    tracing::warn!(
                        "Ignoring SESSION_TTL_HOURS={}, using {}",
                        raw,
                        DEFAULT_SESSION_TTL_HOURS
                    );
                    DEFAULT_SESSION_TTL_HOURS
                }
            },
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        Self {
            table_name: non_empty("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            bucket_name: non_empty("S3_BUCKET_NAME")
                .unwrap_or_else(|| DEFAULT_BUCKET_NAME.to_string()),
            region: non_empty("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            public_asset_base_url: non_empty("PUBLIC_ASSET_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            admin_password: non_empty("ADMIN_PASSWORD"),
            session_secret: non_empty("SESSION_SECRET"),
            session_ttl_hours,
            cors_origin: non_empty("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.table_name, "studio");
        assert_eq!(config.bucket_name, "studio-media");
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.session_ttl_hours, 12);
        assert_eq!(config.cors_origin, "*");
        assert!(config.admin_password.is_none());
        assert!(config.public_asset_base_url.is_none());
    }

    #[test]
    fn overrides_and_cleanup() {
        let config = config_from(&[
            ("TABLE_NAME", "agency"),
            ("PUBLIC_ASSET_BASE_URL", "https://cdn.example.com/"),
            ("SESSION_TTL_HOURS", "48"),
            ("ADMIN_PASSWORD", "   "),
        ]);
        assert_eq!(config.table_name, "agency");
        assert_eq!(config.public_asset_base_url.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(config.session_ttl_hours, 48);
        assert!(config.admin_password.is_none());
    }

    #[test]
    fn bad_ttl_falls_back() {
        assert_eq!(config_from(&[("SESSION_TTL_HOURS", "soon")]).session_ttl_hours, 12);
        assert_eq!(config_from(&[("SESSION_TTL_HOURS", "-3")]).session_ttl_hours, 12);
    }
}
