use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::AchievementError;

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Display, EnumString, Default)]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Display metadata for one badge. Compiled into the catalog at startup
/// and never mutated; hosts ship it to their frontends as-is.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BadgeDefinition {
    pub key: String,
    pub title: String,
    pub description: String,
    pub rarity: Rarity,

    // frontend accent tokens
    pub color: String,
    pub glow: String,
    pub icon: String,
}

impl BadgeDefinition {
    pub fn new(
        key: &str,
        title: &str,
        description: &str,
        rarity: Rarity,
        color: &str,
        glow: &str,
        icon: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            rarity,
            color: color.to_string(),
            glow: glow.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// What has to be true for a badge to be awarded. The dependency between
/// a badge and other badges is data here, not a special case in the
/// evaluator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum MilestoneCondition {
    /// The named activity counter reached `threshold` (inclusive).
    Counter { signal: String, threshold: i64 },
    /// Every listed badge key is already earned by the user.
    AllOf { keys: Vec<String> },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MilestoneRule {
    pub badge_key: String,
    pub condition: MilestoneCondition,
}

impl MilestoneRule {
    pub fn counter(badge_key: &str, signal: &str, threshold: i64) -> Self {
        Self {
            badge_key: badge_key.to_string(),
            condition: MilestoneCondition::Counter {
                signal: signal.to_string(),
                threshold,
            },
        }
    }

    pub fn all_of(badge_key: &str, keys: Vec<String>) -> Self {
        Self {
            badge_key: badge_key.to_string(),
            condition: MilestoneCondition::AllOf { keys },
        }
    }
}

/// Immutable badge table: key -> definition, plus the ordered rule list.
/// Built once at process start and injected into the engine, so tests can
/// substitute their own.
///
/// Counter rules and dependency rules are split at construction; the
/// evaluator runs all counter rules first, dependency rules after.
pub struct BadgeCatalog {
    definitions: HashMap<String, BadgeDefinition>,
    counter_rules: Vec<MilestoneRule>,
    dependency_rules: Vec<MilestoneRule>,
}

impl BadgeCatalog {
    pub fn new(definitions: Vec<BadgeDefinition>, rules: Vec<MilestoneRule>) -> Result<Self> {
        let mut map = HashMap::new();
        for definition in definitions {
            let key = definition.key.clone();
            if map.insert(key.clone(), definition).is_some() {
                return Err(anyhow!("[BadgeCatalog::new] duplicate badge key {:?}", key));
            }
        }

        let mut counter_rules = Vec::new();
        let mut dependency_rules = Vec::new();
        for rule in rules {
            if !map.contains_key(&rule.badge_key) {
                return Err(anyhow!(
                    "[BadgeCatalog::new] rule references undefined badge {:?}",
                    rule.badge_key
                ));
            }
            match &rule.condition {
                MilestoneCondition::Counter { .. } => counter_rules.push(rule),
                MilestoneCondition::AllOf { keys } => {
                    for key in keys {
                        if key == &rule.badge_key {
                            return Err(anyhow!(
                                "[BadgeCatalog::new] badge {:?} depends on itself",
                                rule.badge_key
                            ));
                        }
                        if !map.contains_key(key) {
                            return Err(anyhow!(
                                "[BadgeCatalog::new] badge {:?} depends on undefined badge {:?}",
                                rule.badge_key,
                                key
                            ));
                        }
                    }
                    dependency_rules.push(rule);
                }
            }
        }

        Ok(Self {
            definitions: map,
            counter_rules,
            dependency_rules,
        })
    }

    /// The badge set shipped with the product: eight counter badges plus
    /// `mind_flayer`, earned by holding all of the others.
    pub fn standard() -> Self {
        let definitions = vec![
            BadgeDefinition::new(
                "first_whisper",
                "First Whisper",
                "You posted your first murmur into the void.",
                Rarity::Common,
                "#9ca3af",
                "soft",
                "\u{1f5e8}",
            ),
            BadgeDefinition::new(
                "firestarter",
                "Firestarter",
                "Ten murmurs posted. The town is starting to listen.",
                Rarity::Rare,
                "#f97316",
                "pulse",
                "\u{1f525}",
            ),
            BadgeDefinition::new(
                "town_crier",
                "Town Crier",
                "Fifty murmurs posted. Nothing happens here without you.",
                Rarity::Epic,
                "#a855f7",
                "aura",
                "\u{1f4e3}",
            ),
            BadgeDefinition::new(
                "first_echo",
                "First Echo",
                "You left your first comment on someone else's murmur.",
                Rarity::Common,
                "#9ca3af",
                "soft",
                "\u{1f4ac}",
            ),
            BadgeDefinition::new(
                "loudest_voice",
                "Loudest Voice",
                "Fifty comments. Every thread carries your echo.",
                Rarity::Rare,
                "#38bdf8",
                "pulse",
                "\u{1f4e2}",
            ),
            BadgeDefinition::new(
                "social_butterfly",
                "Social Butterfly",
                "Ten murmurers follow your every word.",
                Rarity::Rare,
                "#4ade80",
                "pulse",
                "\u{1f98b}",
            ),
            BadgeDefinition::new(
                "heartbreaker",
                "Heartbreaker",
                "Five crushes confessed on you.",
                Rarity::Epic,
                "#f43f5e",
                "aura",
                "\u{1f498}",
            ),
            BadgeDefinition::new(
                "crowd_favorite",
                "Crowd Favorite",
                "A hundred likes across your murmurs.",
                Rarity::Epic,
                "#facc15",
                "aura",
                "\u{2b50}",
            ),
            BadgeDefinition::new(
                "mind_flayer",
                "Mind Flayer",
                "Every other badge earned. The whole town whispers your name.",
                Rarity::Legendary,
                "#8b5cf6",
                "radiant",
                "\u{1f9e0}",
            ),
        ];

        let non_meta_keys: Vec<String> = definitions
            .iter()
            .map(|definition| definition.key.clone())
            .filter(|key| key != "mind_flayer")
            .collect();

        let rules = vec![
            MilestoneRule::counter("first_whisper", "posts", 1),
            MilestoneRule::counter("firestarter", "posts", 10),
            MilestoneRule::counter("town_crier", "posts", 50),
            MilestoneRule::counter("first_echo", "comments", 1),
            MilestoneRule::counter("loudest_voice", "comments", 50),
            MilestoneRule::counter("social_butterfly", "follows", 10),
            MilestoneRule::counter("heartbreaker", "crushes", 5),
            MilestoneRule::counter("crowd_favorite", "likes", 100),
            MilestoneRule::all_of("mind_flayer", non_meta_keys),
        ];

        Self::new(definitions, rules).expect("standard catalog is well-formed")
    }

    pub fn definition(&self, key: &str) -> Result<&BadgeDefinition, AchievementError> {
        self.definitions
            .get(key)
            .ok_or_else(|| AchievementError::UnknownBadgeKey(key.to_string()))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &BadgeDefinition> {
        self.definitions.values()
    }

    /// Counter rules in evaluation order. Dependency rules are excluded;
    /// they run in a second pass.
    pub fn counter_rules(&self) -> &[MilestoneRule] {
        &self.counter_rules
    }

    pub fn dependency_rules(&self) -> &[MilestoneRule] {
        &self.dependency_rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_shape() {
        let catalog = BadgeCatalog::standard();
        assert_eq!(catalog.counter_rules().len(), 8);
        assert_eq!(catalog.dependency_rules().len(), 1);

        let meta = &catalog.dependency_rules()[0];
        assert_eq!(meta.badge_key, "mind_flayer");
        match &meta.condition {
            MilestoneCondition::AllOf { keys } => {
                assert_eq!(keys.len(), 8);
                assert!(!keys.contains(&"mind_flayer".to_string()));
                for rule in catalog.counter_rules() {
                    assert!(keys.contains(&rule.badge_key));
                }
            }
            other => panic!("meta rule should be AllOf, got {:?}", other),
        }
    }

    #[test]
    fn lookup_miss_is_unknown_badge_key() {
        let catalog = BadgeCatalog::standard();
        assert!(catalog.definition("first_whisper").is_ok());

        let err = catalog.definition("no_such_badge").unwrap_err();
        assert!(matches!(err, AchievementError::UnknownBadgeKey(key) if key == "no_such_badge"));
    }

    #[test]
    fn rejects_rule_for_undefined_badge() {
        let definitions = vec![BadgeDefinition::new(
            "a",
            "A",
            "a",
            Rarity::Common,
            "#fff",
            "soft",
            "x",
        )];
        let rules = vec![MilestoneRule::counter("b", "posts", 1)];
        assert!(BadgeCatalog::new(definitions, rules).is_err());
    }

    #[test]
    fn rejects_self_dependency() {
        let definitions = vec![BadgeDefinition::new(
            "a",
            "A",
            "a",
            Rarity::Common,
            "#fff",
            "soft",
            "x",
        )];
        let rules = vec![MilestoneRule::all_of("a", vec!["a".to_string()])];
        assert!(BadgeCatalog::new(definitions, rules).is_err());
    }

    #[test]
    fn rejects_duplicate_definitions() {
        let definitions = vec![
            BadgeDefinition::new("a", "A", "a", Rarity::Common, "#fff", "soft", "x"),
            BadgeDefinition::new("a", "A again", "a", Rarity::Rare, "#fff", "soft", "x"),
        ];
        assert!(BadgeCatalog::new(definitions, vec![]).is_err());
    }
}
