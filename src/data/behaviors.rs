use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::actions::ActionCatalog;
use crate::rules::condition::Condition;

/// One AI-selectable entry. The name doubles as the action (or sequence)
/// the stepper enters when the entry wins selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorDef {
    pub name: String,
    /// Non-negative weight. Zero entries are never randomly chosen; they
    /// exist as condition-gated placeholders reachable by other means.
    pub frequency: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Priority band. Kept as data; the live selector draws across the
    /// whole table without partitioning by it.
    #[serde(default)]
    pub group_index: u32,
    /// Continuations reachable after this behavior. Parsed and validated
    /// but not consumed by the stepper; extension point only.
    #[serde(default)]
    pub next_behaviors: Vec<NextBehavior>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextBehavior {
    pub name: String,
    pub frequency: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehaviorCatalog {
    pub schema_version: u32,
    pub behaviors: Vec<BehaviorDef>,
}

#[derive(Debug)]
pub enum BehaviorDataError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Validation(String),
}

impl std::fmt::Display for BehaviorDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorDataError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            BehaviorDataError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            BehaviorDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for BehaviorDataError {}

pub fn load_behavior_catalog(
    path: impl AsRef<Path>,
) -> Result<BehaviorCatalog, BehaviorDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| BehaviorDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: BehaviorCatalog =
        serde_json::from_str(&raw).map_err(|source| BehaviorDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl BehaviorCatalog {
    pub fn get(&self, name: &str) -> Option<&BehaviorDef> {
        self.behaviors.iter().find(|behavior| behavior.name == name)
    }

    pub fn validate(&self) -> Result<(), BehaviorDataError> {
        if self.behaviors.is_empty() {
            return Err(BehaviorDataError::Validation(
                "behavior table cannot be empty".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for behavior in &self.behaviors {
            if behavior.name.trim().is_empty() {
                return Err(BehaviorDataError::Validation(
                    "behavior name cannot be empty".to_string(),
                ));
            }
            if !names.insert(behavior.name.clone()) {
                return Err(BehaviorDataError::Validation(format!(
                    "duplicate behavior name {}",
                    behavior.name
                )));
            }
        }
        for behavior in &self.behaviors {
            for next in &behavior.next_behaviors {
                if !names.contains(&next.name) {
                    return Err(BehaviorDataError::Validation(format!(
                        "behavior {} continues into unknown behavior {}",
                        behavior.name, next.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every behavior name must resolve against the action catalog.
    pub fn validate_actions(&self, actions: &ActionCatalog) -> Result<(), BehaviorDataError> {
        for behavior in &self.behaviors {
            if actions.get(&behavior.name).is_none() {
                return Err(BehaviorDataError::Validation(format!(
                    "behavior {} has no matching action",
                    behavior.name
                )));
            }
        }
        Ok(())
    }
}

fn entry(
    name: &str,
    frequency: u32,
    conditions: Vec<Condition>,
    group_index: u32,
) -> BehaviorDef {
    BehaviorDef {
        name: name.to_string(),
        frequency,
        conditions,
        group_index,
        next_behaviors: Vec::new(),
    }
}

fn grounded() -> Condition {
    Condition::Any(vec![Condition::OnFloor, Condition::OnElementTop])
}

/// The built-in behavior table.
pub fn builtin_behavior_catalog() -> BehaviorCatalog {
    let mut behaviors = vec![
        entry("Stand", 30, vec![grounded()], 0),
        entry("Sit", 20, vec![grounded()], 0),
        entry("Sprawl", 10, vec![Condition::OnFloor], 0),
        entry("SitAndLookUp", 5, vec![Condition::OnFloor], 0),
        entry(
            "SitAndLookAtMouse",
            5,
            vec![Condition::OnFloor, Condition::CursorNear(400.0)],
            0,
        ),
        entry("Walk", 25, vec![grounded()], 1),
        entry("Run", 10, vec![Condition::OnFloor], 1),
        entry("Creep", 5, vec![Condition::OnFloor], 1),
        entry("WalkAndSit", 15, vec![Condition::OnFloor], 1),
        entry("WalkAndSettle", 10, vec![Condition::OnFloor], 1),
        entry(
            "ChaseMouse",
            10,
            vec![Condition::OnFloor, Condition::CursorNear(500.0)],
            1,
        ),
        entry("Fall", 0, vec![Condition::Airborne], 2),
    ];

    // Continuation data is carried but not consumed by the stepper.
    behaviors[5].next_behaviors = vec![
        NextBehavior {
            name: "Stand".to_string(),
            frequency: 50,
            conditions: Vec::new(),
        },
        NextBehavior {
            name: "Sit".to_string(),
            frequency: 50,
            conditions: Vec::new(),
        },
    ];

    BehaviorCatalog {
        schema_version: 1,
        behaviors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::actions::builtin_action_catalog;

    #[test]
    fn builtin_table_validates() {
        let catalog = builtin_behavior_catalog();
        catalog.validate().expect("builtin table must validate");
        catalog
            .validate_actions(&builtin_action_catalog())
            .expect("builtin behavior names must resolve to actions");
    }

    #[test]
    fn duplicate_behavior_rejected() {
        let mut catalog = builtin_behavior_catalog();
        catalog
            .behaviors
            .push(entry("Stand", 1, Vec::new(), 0));
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn unknown_continuation_rejected() {
        let mut catalog = builtin_behavior_catalog();
        catalog.behaviors[0].next_behaviors.push(NextBehavior {
            name: "NoSuchBehavior".to_string(),
            frequency: 1,
            conditions: Vec::new(),
        });
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let catalog = builtin_behavior_catalog();
        let raw = serde_json::to_string(&catalog).unwrap();
        let parsed: BehaviorCatalog = serde_json::from_str(&raw).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.behaviors.len(), catalog.behaviors.len());
    }
}
