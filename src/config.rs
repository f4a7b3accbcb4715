//! Configuration management for the interview simulator

use std::path::PathBuf;

use crate::{Error, JobRole, Result};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Active job role
    pub role: JobRole,

    /// Path to data directory (transcript exports)
    pub data_dir: PathBuf,

    /// Generation backend configuration
    pub generation: GenerationConfig,

    /// Voice configuration
    pub voice: VoiceConfig,
}

/// Generation backend configuration
///
/// Sampling parameters are fixed for the lifetime of an interview; the
/// session manager hands them to the provider once at session creation.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,

    /// API key (absence means the generation capability is unavailable)
    pub api_key: Option<String>,

    /// Chat model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Top-k sampling cutoff
    pub top_k: u32,
}

/// Voice processing configuration
#[derive(Debug, Clone, Default)]
pub struct VoiceConfig {
    /// Enable voice input/output (disabled for text-only sessions)
    pub enabled: bool,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Recognition language tag (e.g. "en-US")
    pub language: String,
}

/// Return the cache directory for role profiles, creating it if needed
pub fn role_cache_dir() -> PathBuf {
    let cache_dir = directories::ProjectDirs::from("dev", "candor", "candor").map_or_else(
        || PathBuf::from(".cache/candor/roles"),
        |d| d.cache_dir().join("roles"),
    );

    if let Err(e) = std::fs::create_dir_all(&cache_dir) {
        tracing::warn!(
            path = %cache_dir.display(),
            error = %e,
            "failed to create role cache directory"
        );
    }

    cache_dir
}

impl Config {
    /// Load configuration for a role
    ///
    /// # Errors
    ///
    /// Returns error if the role profile cannot be loaded
    pub fn load(role_id: &str) -> Result<Self> {
        Self::load_with_options(role_id, false)
    }

    /// Load configuration with explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if the role profile cannot be loaded
    pub fn load_with_options(role_id: &str, disable_voice: bool) -> Result<Self> {
        let role = Self::load_role_with_priority(role_id)?;

        let generation = GenerationConfig {
            base_url: std::env::var("CANDOR_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: std::env::var("CANDOR_LLM_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: 0.3,
            top_k: 3,
        };

        let voice = VoiceConfig {
            enabled: !disable_voice,
            stt_model: std::env::var("CANDOR_STT_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            tts_model: std::env::var("CANDOR_TTS_MODEL")
                .unwrap_or_else(|_| "tts-1".to_string()),
            tts_voice: role.voice.tts_voice.clone(),
            tts_speed: role.voice.tts_speed,
            language: role.recognition_language(),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        // Data directory (~/.local/share/candor on Linux)
        let data_dir = directories::ProjectDirs::from("dev", "candor", "candor")
            .map_or_else(|| PathBuf::from("."), |d| d.data_dir().to_path_buf());
        std::fs::create_dir_all(&data_dir).ok();

        Ok(Self {
            role,
            data_dir,
            generation,
            voice,
        })
    }

    /// Load a role with priority: env override, cache, embedded
    fn load_role_with_priority(role_id: &str) -> Result<JobRole> {
        // 1. CANDOR_ROLES_DIR env var (dev override)
        if let Ok(dir) = std::env::var("CANDOR_ROLES_DIR") {
            let path = PathBuf::from(&dir);
            if path.exists() {
                match Self::load_role(&path, role_id) {
                    Ok(role) => {
                        tracing::info!(
                            role_id,
                            path = %path.display(),
                            "loaded role from CANDOR_ROLES_DIR"
                        );
                        return Ok(role);
                    }
                    Err(e) => {
                        tracing::warn!(
                            role_id,
                            error = %e,
                            "CANDOR_ROLES_DIR set but role not found, continuing"
                        );
                    }
                }
            } else {
                tracing::warn!(path = %dir, "CANDOR_ROLES_DIR set but directory does not exist");
            }
        }

        // 2. Local cache
        match Self::load_role(&role_cache_dir(), role_id) {
            Ok(role) => {
                tracing::info!(role_id, "loaded role from cache");
                return Ok(role);
            }
            Err(e) => {
                tracing::debug!(role_id, error = %e, "no cached role, trying embedded");
            }
        }

        // 3. Embedded fallback
        Self::load_embedded_role(role_id)
    }

    /// Load a role from file (JSON preferred, TOML fallback)
    fn load_role(roles_dir: &std::path::Path, role_id: &str) -> Result<JobRole> {
        let json_path = roles_dir.join(format!("{role_id}.json"));
        if json_path.exists() {
            let content = std::fs::read_to_string(&json_path)?;
            let role: JobRole = serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {role_id}.json: {e}")))?;
            tracing::debug!(path = %json_path.display(), "loaded role from JSON");
            return Ok(role);
        }

        let toml_path = roles_dir.join(format!("{role_id}.toml"));
        if toml_path.exists() {
            let content = std::fs::read_to_string(&toml_path)?;
            let role: JobRole = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {role_id}.toml: {e}")))?;
            return Ok(role);
        }

        Err(Error::RoleNotFound(role_id.to_string()))
    }

    /// Embedded default role data for when no local files are available
    const EMBEDDED_ROLES: &[(&str, &str)] =
        &[("ai-scientist", include_str!("../roles/ai-scientist.json"))];

    /// Load an embedded role compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if the role ID is not found in embedded data
    pub fn load_embedded_role(role_id: &str) -> Result<JobRole> {
        Self::EMBEDDED_ROLES
            .iter()
            .find(|(id, _)| *id == role_id)
            .and_then(|(_, json)| {
                let role: JobRole = serde_json::from_str(json).ok()?;
                tracing::info!(role_id, "loaded role from embedded data");
                Some(role)
            })
            .ok_or_else(|| Error::RoleNotFound(role_id.to_string()))
    }

    /// Return the embedded role array for enumeration
    #[must_use]
    pub const fn embedded_roles() -> &'static [(&'static str, &'static str)] {
        Self::EMBEDDED_ROLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_role_parses() {
        let role = Config::load_embedded_role("ai-scientist").unwrap();
        assert_eq!(role.title(), "AI Scientist");
        assert!(role.description().contains("multimodal AI"));
    }

    #[test]
    fn unknown_role_is_not_found() {
        let err = Config::load_embedded_role("basket-weaver").unwrap_err();
        assert!(matches!(err, Error::RoleNotFound(_)));
    }

    #[test]
    fn load_role_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("qa.json"),
            r#"{"id": "qa", "title": "QA Engineer", "description": "Break software."}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("qa.toml"),
            "id = \"qa\"\ntitle = \"Wrong\"\ndescription = \"toml\"\n",
        )
        .unwrap();

        let role = Config::load_role(dir.path(), "qa").unwrap();
        assert_eq!(role.title(), "QA Engineer");
    }

    #[test]
    fn load_role_falls_back_to_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("qa.toml"),
            "id = \"qa\"\ntitle = \"QA Engineer\"\ndescription = \"Break software.\"\n",
        )
        .unwrap();

        let role = Config::load_role(dir.path(), "qa").unwrap();
        assert_eq!(role.title(), "QA Engineer");
    }
}
