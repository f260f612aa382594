//! Prompt templates for Swell.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// A named place and the buoy that reports conditions there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub buoy_id: String,
}

impl Location {
    fn new(name: &str, buoy_id: &str) -> Self {
        Self {
            name: name.to_string(),
            buoy_id: buoy_id.to_string(),
        }
    }
}

/// System instruction and location table for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System instruction. `{{locations}}` expands to the location table.
    pub system: String,
    /// Places the model can map to buoy ids.
    pub locations: Vec<Location>,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant tasked with finding marine weather conditions. \
Here are guidelines on responding to marine forecast information prompts. \
<AnsweringGuidelines>{{locations}}</AnsweringGuidelines>"
                .to_string(),
            locations: vec![
                Location::new("San Clemente California", "46086"),
                Location::new("Point Conception California", "46054"),
                Location::new("Mission Bay California", "46258"),
                Location::new("Point Loma California", "46232"),
                Location::new("Santa Monica Bay California", "46221"),
                Location::new("Half Moon Bay California", "46214"),
                Location::new("Mavericks in California", "46214"),
            ],
        }
    }
}

impl AgentPrompts {
    /// Render the location table as guideline entries.
    pub fn render_locations(&self) -> String {
        self.locations
            .iter()
            .map(|l| {
                format!(
                    "<Location>For marine forecasts of {}, check buoyId {}.</Location>",
                    l.name, l.buoy_id
                )
            })
            .collect()
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// The fully rendered system instruction sent ahead of every conversation.
    pub fn system_instruction(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("locations".to_string(), self.agent.render_locations());
        self.render_with_custom(&self.agent.system, &vars)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single left-to-right pass: inserted values are never
    /// rescanned, and unknown placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
