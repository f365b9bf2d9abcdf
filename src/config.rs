//! Loading prompt configuration from TOML.
//!
//! See `AgentConfig` and `Prompts` for the expected schema. Defaults ask the
//! model for the canonical question schema in strict JSON; a TOML file at
//! AGENT_CONFIG_PATH can override them to tune tone or structure.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used for question generation. `{count}` and `{sections}` are
/// filled in per request.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  pub generation_system: String,
  pub generation_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      generation_system: "You are a probability-theory tutor generating practice questions. \
        Respond ONLY with one strict JSON object. No prose, no markdown fences."
        .into(),
      generation_user_template: "Generate {count} practice questions covering these topic sections:\n\
        {sections}\n\n\
        Return JSON of the form:\n\
        {\"questions\": [{\"id\": \"q1\", \"section_id\": \"...\", \"title\": \"...\", \
        \"content_md\": \"question body, markdown allowed\", \"type\": \"mcq\" or \"numeric\", \
        \"options\": [\"...\", \"...\", \"...\"], \"answer\": \"letter of the correct option\", \
        \"explanation_md\": \"...\"}]}\n\
        Rules: mcq questions need 3-5 options and exactly one correct answer; numeric questions \
        omit options and give the numeric answer. Mix difficulties. Keep content self-contained."
        .into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "probaquiz_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "probaquiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "probaquiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
