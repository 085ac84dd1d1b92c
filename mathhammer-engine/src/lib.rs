//! Mathhammer Engine
//!
//! Exact damage distributions for tabletop wargame attack sequences.
//! Every stage (shots, hit, wound, save, feel-no-pain, damage) is carried as a
//! probability mass function, so results are exact rather than sampled.

pub mod attack;
pub mod collection;
pub mod config;
pub mod dice;
pub mod error;
pub mod inputs;
pub mod modifiers;
pub mod numbers;
pub mod pmf;
pub mod presets;
pub mod summary;
pub mod units;

// Re-export commonly used types
pub use attack::{AttackResults, AttackSequence, StageDistributions, wound_threshold};
pub use collection::{PassRule, PmfCollection};
pub use config::EngineConfig;
pub use dice::parse_dice;
pub use error::{ConfigError, ParseError};
pub use inputs::{
    AttackInputs, InputValue, PreparedAttack, Profile, ProfileResults, ProfileSet, TargetInputs,
    TokenPolicy, WeaponInputs, WeaponResults, split_csv,
};
pub use modifiers::{
    BonusEvent, DroneProtocol, Modifier, ModifierCollection, ModifierSpec, RollBasis, Stage,
    parse_modifier, parse_modifiers, parse_modifiers_strict,
};
pub use pmf::Pmf;
pub use presets::{TargetCatalog, TargetPreset};
pub use summary::Summary;
pub use units::{Unit, Weapon};

/// A profile's results together with the summary of its combined damage.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProfileReport {
    pub results: ProfileResults,
    pub summary: Summary,
}

/// Entry point that owns a validated configuration and the target catalog.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    targets: TargetCatalog,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            targets: TargetCatalog::default_catalog().clone(),
        }
    }
}

impl Engine {
    /// Create an engine with the bundled target catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Replace the target catalog.
    #[must_use]
    pub fn with_targets(mut self, targets: TargetCatalog) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn targets(&self) -> &TargetCatalog {
        &self.targets
    }

    /// Look up a target by id in this engine's catalog.
    #[must_use]
    pub fn target(&self, id: &str) -> Option<Unit> {
        self.targets.get(id).map(|preset| preset.unit)
    }

    /// Summarise a damage distribution with this engine's settings.
    #[must_use]
    pub fn summarize(&self, pmf: &Pmf) -> Summary {
        Summary::from_pmf(pmf, &self.config)
    }

    /// Run a single attack from loose inputs.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed values, or unknown tokens under the strict policy.
    pub fn compute(
        &self,
        inputs: &AttackInputs,
        policy: TokenPolicy,
    ) -> Result<AttackResults, ParseError> {
        Ok(inputs.prepare_in(policy, &self.targets)?.run())
    }

    /// Run every enabled profile in a set.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any profile.
    pub fn compute_profiles(
        &self,
        set: &ProfileSet,
        policy: TokenPolicy,
    ) -> Result<Vec<ProfileReport>, ParseError> {
        set.enabled()
            .map(|profile| {
                let results = profile.compute_in(policy, &self.targets)?;
                let summary = self.summarize(&results.damage);
                Ok(ProfileReport { results, summary })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_config() {
        let config = EngineConfig {
            tail_threshold: 1.5,
        };
        assert!(Engine::new(config).is_err());
        assert!(Engine::new(EngineConfig::default()).is_ok());
    }

    #[test]
    fn custom_catalog_replaces_bundled_targets() {
        let catalog = TargetCatalog::from_json(
            r#"[{ "id": "wall", "name": "Wall", "unit": { "toughness": 10 } }]"#,
        )
        .unwrap();
        let engine = Engine::default().with_targets(catalog);
        assert_eq!(engine.target("wall").map(|unit| unit.toughness), Some(10));
        assert!(engine.target("MEQ").is_none());

        let inputs = AttackInputs {
            target: TargetInputs {
                preset: Some("wall".to_string()),
                ..TargetInputs::default()
            },
            ..AttackInputs::default()
        };
        let results = engine.compute(&inputs, TokenPolicy::Strict).unwrap();
        // S1 against T10 wounds on a 6; the default attacker hits on 1+.
        assert!((results.stages.wounds.mean() - 1.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn profiles_are_summarised() {
        let set = ProfileSet::from_json(
            r#"{ "profiles": [
                { "name": "on", "weapons": [{ "ws": 2, "shots": 6 }] },
                { "name": "off", "enabled": false, "weapons": [{ "shots": 6 }] }
            ] }"#,
        )
        .unwrap();
        let reports = Engine::default()
            .compute_profiles(&set, TokenPolicy::Lenient)
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].results.name, "on");
        // 6 shots, 2+ to hit, S1 vs T1 wounds on 4+.
        assert!((reports[0].summary.mean - 2.5).abs() < 1e-9);
        assert!((reports[0].summary.cumulative[0] - 1.0).abs() < 1e-9);
    }
}
