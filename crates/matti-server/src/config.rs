use std::path::PathBuf;

use anyhow::{Context, bail};
use tracing::warn;

use matti_game::GameConfig;
use matti_types::ChatId;

/// Fallback secret. Accepted, but logged as a warning.
const DEFAULT_SECRET: &str = "fantamattopwd";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub moderator_id: ChatId,
    pub registration_secret: String,
    /// `name,points` file loaded into the category table at startup.
    pub seed_file: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = var("MATTI_DB_PATH").unwrap_or_else(|| "matti.db".into()).into();

        let raw_moderator = var("MATTI_MODERATOR_ID").context("MATTI_MODERATOR_ID is not set")?;
        let moderator_id: ChatId = raw_moderator
            .trim()
            .parse()
            .with_context(|| format!("MATTI_MODERATOR_ID is not a chat id: {raw_moderator}"))?;
        if moderator_id == 0 {
            bail!("MATTI_MODERATOR_ID must be non-zero");
        }

        let registration_secret = match var("MATTI_REGISTRATION_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret.trim().to_string(),
            _ => {
                warn!("MATTI_REGISTRATION_SECRET unset, using the default secret");
                DEFAULT_SECRET.to_string()
            }
        };

        let seed_file = var("MATTI_SEED_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            db_path,
            moderator_id,
            registration_secret,
            seed_file,
        })
    }

    pub fn game(&self) -> GameConfig {
        GameConfig {
            moderator_id: self.moderator_id,
            registration_secret: self.registration_secret.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("MATTI_MODERATOR_ID", "42")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("matti.db"));
        assert_eq!(config.moderator_id, 42);
        assert_eq!(config.registration_secret, DEFAULT_SECRET);
        assert!(config.seed_file.is_none());
    }

    #[test]
    fn explicit_values_win() {
        let config = load(&[
            ("MATTI_MODERATOR_ID", " -100 "),
            ("MATTI_DB_PATH", "/tmp/game.db"),
            ("MATTI_REGISTRATION_SECRET", "hunter2"),
            ("MATTI_SEED_FILE", "matti.txt"),
        ])
        .unwrap();
        assert_eq!(config.moderator_id, -100);
        assert_eq!(config.db_path, PathBuf::from("/tmp/game.db"));
        assert_eq!(config.game().registration_secret, "hunter2");
        assert_eq!(config.seed_file, Some(PathBuf::from("matti.txt")));
    }

    #[test]
    fn moderator_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("MATTI_MODERATOR_ID", "0")]).is_err());
        assert!(load(&[("MATTI_MODERATOR_ID", "admin")]).is_err());
    }
}
