use serde::{Deserialize, Serialize};

/// Knobs for interpreting a log. All fields default to what the game server
/// writes out of the box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Placeholder name the server gives clients that never set one. It never
    /// identifies a player and is left out of exported aliases.
    pub unnamed_sentinel: String,
    /// Self-kill causes that are deliberate (suicide binds, kamikaze) and
    /// therefore do not count as deaths.
    pub intentional_death_causes: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            unnamed_sentinel: "UnnamedPlayer".to_owned(),
            intentional_death_causes: vec!["MOD_SUICIDE".to_owned(), "MOD_KAMIKAZE".to_owned()],
        }
    }
}

impl ParserConfig {
    pub fn is_intentional_death(&self, cause: &str) -> bool {
        self.intentional_death_causes.iter().any(|c| c == cause)
    }

    /// Generate a commented default TOML config string.
    pub fn generate_default_toml() -> String {
        r#"# WFA log statistics configuration
# Pass with --config <path>.

# Name the server assigns to clients without a name. Never used to match
# a reconnecting player and never exported as an alias.
unnamed_sentinel = "UnnamedPlayer"

# Self-kill causes that are deliberate and are not counted as deaths.
intentional_death_causes = ["MOD_SUICIDE", "MOD_KAMIKAZE"]
"#
        .to_string()
    }
}
