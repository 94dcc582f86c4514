//! Exercise records.
//!
//! These are the hydrated records the engine grades against. They are read
//! in the camelCase shape used by exercise files (JSON or YAML) and are never
//! mutated by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::check::CheckNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
    /// Command patterns with their candidate responses, in declaration order.
    #[serde(default, with = "ordered_commands")]
    pub terminal_commands: Vec<(String, Vec<TerminalResponseEntry>)>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub success_message: String,
}

impl Exercise {
    pub fn command_patterns(&self) -> impl Iterator<Item = &str> {
        self.terminal_commands.iter().map(|(pattern, _)| pattern.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    #[serde(rename = "type", alias = "kind")]
    pub kind: RuleKind,
    pub check: CheckNode,
    /// Rule-level label, used in internal diagnostics.
    pub error_message: String,
    /// Shown to the learner whenever the check fails.
    pub fail_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[serde(alias = "Syntax")]
    Syntax,
    #[serde(alias = "Semantic")]
    Semantic,
    #[serde(alias = "Intention")]
    Intention,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleKind::Syntax => "syntax",
            RuleKind::Semantic => "semantic",
            RuleKind::Intention => "intention",
        })
    }
}

/// One candidate response to a terminal command. An entry without `when`
/// always applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResponseEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<CheckNode>,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub exit_code: i32,
}

/// `terminalCommands` is an object on disk, but its key order decides
/// matching, so it is held as a list of pairs.
mod ordered_commands {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    use super::TerminalResponseEntry;

    type Commands = Vec<(String, Vec<TerminalResponseEntry>)>;

    pub fn serialize<S: Serializer>(commands: &Commands, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(commands.len()))?;
        for (pattern, responses) in commands {
            map.serialize_entry(pattern, responses)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Commands, D::Error> {
        deserializer.deserialize_map(CommandsVisitor)
    }

    struct CommandsVisitor;

    impl<'de> Visitor<'de> for CommandsVisitor {
        type Value = Commands;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of command patterns to response lists")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Commands, A::Error> {
            let mut commands: Commands = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((pattern, responses)) = access.next_entry::<String, Vec<TerminalResponseEntry>>()? {
                // A repeated key replaces the earlier entry in place.
                match commands.iter_mut().find(|(existing, _)| *existing == pattern) {
                    Some(slot) => slot.1 = responses,
                    None => commands.push((pattern, responses)),
                }
            }
            Ok(commands)
        }
    }
}
