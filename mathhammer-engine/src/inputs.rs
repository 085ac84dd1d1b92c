//! Named, loosely typed attack inputs and their mapping onto engine types.
//!
//! Field names follow the form vocabulary (`toughness`, `shots`, `hitmods`, ...)
//! and also accept the short URL forms (`t`, `sh`, `hm`, ...). Numbers may
//! arrive as JSON numbers or strings; blank strings count as absent.

use serde::{Deserialize, Deserializer, Serialize};

use crate::attack::{AttackResults, AttackSequence};
use crate::collection::PmfCollection;
use crate::dice::parse_dice;
use crate::error::ParseError;
use crate::modifiers::{ModifierCollection, Stage, parse_modifiers, parse_modifiers_strict};
use crate::numbers::{within_limit, within_signed_limit};
use crate::pmf::Pmf;
use crate::presets::TargetCatalog;
use crate::units::{Unit, Weapon};

/// A form value: a number or the raw text typed into the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(i64),
    Text(String),
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// How to treat modifier tokens outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPolicy {
    /// Drop and report them.
    #[default]
    Lenient,
    /// Fail the whole input.
    Strict,
}

/// Split a comma separated list, trimming entries and dropping blanks.
#[must_use]
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn token_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(tokens)) => tokens,
        Some(Raw::Joined(joined)) => split_csv(&joined),
        None => Vec::new(),
    })
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(value) => value,
        Raw::Text(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "enabled" | "true" | "1" | "yes" | "on"
        ),
    })
}

const fn enabled_by_default() -> bool {
    true
}

fn int_field(field: &'static str, value: Option<&InputValue>, default: i32) -> Result<i32, ParseError> {
    let invalid = |raw: String| ParseError::InvalidNumber { field, value: raw };
    let number = match value {
        None => return Ok(default),
        Some(InputValue::Number(n)) => *n,
        Some(InputValue::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(default);
            }
            text.parse::<i64>().map_err(|_| invalid(text.to_string()))?
        }
    };
    if !within_signed_limit(number) {
        return Err(invalid(number.to_string()));
    }
    i32::try_from(number).map_err(|_| invalid(number.to_string()))
}

fn dice_field(value: Option<&InputValue>) -> Result<PmfCollection, ParseError> {
    let single = || PmfCollection::new(vec![Pmf::constant(1)]);
    match value {
        None => Ok(single()),
        Some(InputValue::Number(n)) => usize::try_from(*n)
            .ok()
            .filter(|&fixed| within_limit(fixed))
            .map(|fixed| PmfCollection::new(vec![Pmf::constant(fixed)]))
            .ok_or_else(|| ParseError::InvalidDiceNotation {
                input: n.to_string(),
            }),
        Some(InputValue::Text(text)) if text.trim().is_empty() => Ok(single()),
        Some(InputValue::Text(text)) => parse_dice(text),
    }
}

/// Defensive profile of the target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetInputs {
    /// Bundled target profile used as the base for the fields below.
    pub preset: Option<String>,
    #[serde(alias = "t")]
    pub toughness: Option<InputValue>,
    #[serde(alias = "sv")]
    pub save: Option<InputValue>,
    #[serde(alias = "inv")]
    pub invuln: Option<InputValue>,
    #[serde(alias = "fn")]
    pub fnp: Option<InputValue>,
    #[serde(alias = "w")]
    pub wounds: Option<InputValue>,
}

impl TargetInputs {
    /// Resolve against the bundled target catalog.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for an unknown preset or a non-numeric field.
    pub fn to_unit(&self) -> Result<Unit, ParseError> {
        self.resolve(TargetCatalog::default_catalog())
    }

    /// # Errors
    ///
    /// Returns `ParseError` for a preset missing from `catalog` or a non-numeric field.
    pub fn resolve(&self, catalog: &TargetCatalog) -> Result<Unit, ParseError> {
        let base = match &self.preset {
            Some(name) => catalog.get(name).map(|preset| preset.unit).ok_or_else(|| {
                ParseError::UnknownPreset { name: name.clone() }
            })?,
            None => Unit::default(),
        };
        Ok(Unit {
            toughness: int_field("toughness", self.toughness.as_ref(), base.toughness)?,
            save: int_field("save", self.save.as_ref(), base.save)?,
            invuln: int_field("invuln", self.invuln.as_ref(), base.invuln)?,
            fnp: int_field("fnp", self.fnp.as_ref(), base.fnp)?,
            wounds: int_field("wounds", self.wounds.as_ref(), base.wounds)?,
            ..base
        })
    }
}

/// One weapon: attacker skill, weapon characteristics and per-stage modifier tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponInputs {
    #[serde(default, alias = "weaponname")]
    pub name: Option<String>,
    #[serde(
        default = "enabled_by_default",
        alias = "weaponenabled",
        alias = "we",
        deserialize_with = "flag"
    )]
    pub enabled: bool,
    #[serde(default)]
    pub ws: Option<InputValue>,
    #[serde(default, alias = "s")]
    pub strength: Option<InputValue>,
    #[serde(default)]
    pub ap: Option<InputValue>,
    #[serde(default, alias = "sh")]
    pub shots: Option<InputValue>,
    #[serde(default, alias = "dm")]
    pub damage: Option<InputValue>,
    #[serde(default, alias = "shm", deserialize_with = "token_list")]
    pub shotmods: Vec<String>,
    #[serde(default, alias = "hm", deserialize_with = "token_list")]
    pub hitmods: Vec<String>,
    #[serde(default, alias = "wm", deserialize_with = "token_list")]
    pub woundmods: Vec<String>,
    #[serde(default, alias = "svm", deserialize_with = "token_list")]
    pub savemods: Vec<String>,
    #[serde(default, alias = "fnpm", deserialize_with = "token_list")]
    pub fnpmods: Vec<String>,
    #[serde(default, alias = "dmm", deserialize_with = "token_list")]
    pub damagemods: Vec<String>,
}

impl Default for WeaponInputs {
    fn default() -> Self {
        Self {
            name: None,
            enabled: true,
            ws: None,
            strength: None,
            ap: None,
            shots: None,
            damage: None,
            shotmods: Vec::new(),
            hitmods: Vec::new(),
            woundmods: Vec::new(),
            savemods: Vec::new(),
            fnpmods: Vec::new(),
            damagemods: Vec::new(),
        }
    }
}

impl WeaponInputs {
    /// # Errors
    ///
    /// Returns `ParseError::InvalidNumber` for a non-numeric skill.
    pub fn attacker(&self) -> Result<Unit, ParseError> {
        Ok(Unit::attacker(int_field("ws", self.ws.as_ref(), 1)?))
    }

    /// # Errors
    ///
    /// Returns `ParseError` for malformed dice notation or characteristics.
    pub fn weapon(&self) -> Result<Weapon, ParseError> {
        Ok(Weapon::new(
            dice_field(self.shots.as_ref())?,
            int_field("strength", self.strength.as_ref(), 1)?,
            int_field("ap", self.ap.as_ref(), 0)?,
            dice_field(self.damage.as_ref())?,
        ))
    }

    /// Modifier tokens grouped by the stage they attach to.
    #[must_use]
    pub fn stage_tokens(&self) -> [(Stage, &[String]); 6] {
        [
            (Stage::Shots, &self.shotmods),
            (Stage::Hit, &self.hitmods),
            (Stage::Wound, &self.woundmods),
            (Stage::Pen, &self.savemods),
            (Stage::Fnp, &self.fnpmods),
            (Stage::Damage, &self.damagemods),
        ]
    }

    /// Build the modifier collection, returning it with every rejected token.
    ///
    /// # Errors
    ///
    /// Under [`TokenPolicy::Strict`], returns the first unrecognised token.
    pub fn modifiers(
        &self,
        policy: TokenPolicy,
    ) -> Result<(ModifierCollection, Vec<String>), ParseError> {
        let mut mods = ModifierCollection::new();
        let mut rejected = Vec::new();
        for (stage, tokens) in self.stage_tokens() {
            match policy {
                TokenPolicy::Strict => {
                    let specs = parse_modifiers_strict(tokens)?;
                    mods.add_mods(stage, specs.into_iter().map(|spec| spec.build()));
                }
                TokenPolicy::Lenient => {
                    let parsed = parse_modifiers(tokens);
                    mods.add_mods(stage, parsed.build());
                    rejected.extend(parsed.rejected);
                }
            }
        }
        Ok((mods, rejected))
    }
}

/// All section inputs for one weapon against one target, flattened the way the form sends them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttackInputs {
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(flatten)]
    pub weapon: WeaponInputs,
}

impl AttackInputs {
    /// # Errors
    ///
    /// Returns `ParseError` for malformed values, or unknown tokens under the strict policy.
    pub fn prepare(&self, policy: TokenPolicy) -> Result<PreparedAttack, ParseError> {
        self.prepare_in(policy, TargetCatalog::default_catalog())
    }

    /// Like [`AttackInputs::prepare`], resolving presets in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for malformed values, or unknown tokens under the strict policy.
    pub fn prepare_in(
        &self,
        policy: TokenPolicy,
        catalog: &TargetCatalog,
    ) -> Result<PreparedAttack, ParseError> {
        let (mods, rejected) = self.weapon.modifiers(policy)?;
        Ok(PreparedAttack {
            weapon: self.weapon.weapon()?,
            target: self.target.resolve(catalog)?,
            attacker: self.weapon.attacker()?,
            mods,
            rejected,
        })
    }

    /// Lenient one-shot computation.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for malformed numbers or dice notation.
    pub fn compute(&self) -> Result<AttackResults, ParseError> {
        Ok(self.prepare(TokenPolicy::Lenient)?.run())
    }
}

/// Parsed engine inputs, ready to run.
#[derive(Debug)]
pub struct PreparedAttack {
    pub weapon: Weapon,
    pub target: Unit,
    pub attacker: Unit,
    pub mods: ModifierCollection,
    /// Modifier tokens dropped under the lenient policy.
    pub rejected: Vec<String>,
}

impl PreparedAttack {
    #[must_use]
    pub const fn sequence(&self) -> AttackSequence<'_> {
        AttackSequence::new(&self.weapon, &self.target, &self.attacker, &self.mods)
    }

    #[must_use]
    pub fn run(&self) -> AttackResults {
        self.sequence().run()
    }
}

/// A named target with the weapons shooting at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, alias = "tabname", alias = "tn")]
    pub name: String,
    #[serde(
        default = "enabled_by_default",
        alias = "e",
        deserialize_with = "flag"
    )]
    pub enabled: bool,
    #[serde(flatten)]
    pub target: TargetInputs,
    #[serde(default)]
    pub weapons: Vec<WeaponInputs>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            target: TargetInputs::default(),
            weapons: Vec::new(),
        }
    }
}

/// Results for one profile: every enabled weapon plus their combination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileResults {
    pub name: String,
    pub weapons: Vec<WeaponResults>,
    /// Total damage of all weapons, mortal wounds included.
    pub damage: Pmf,
    pub drone_wound: Pmf,
    pub self_wound: Pmf,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeaponResults {
    pub name: String,
    pub results: AttackResults,
}

impl Profile {
    /// Flattened inputs for each enabled weapon.
    pub fn attacks(&self) -> impl Iterator<Item = (String, AttackInputs)> + '_ {
        self.weapons
            .iter()
            .enumerate()
            .filter(|(_, weapon)| weapon.enabled)
            .map(|(index, weapon)| {
                let name = weapon
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("weapon {}", index + 1));
                let inputs = AttackInputs {
                    target: self.target.clone(),
                    weapon: weapon.clone(),
                };
                (name, inputs)
            })
    }

    /// Run every enabled weapon and combine them.
    ///
    /// Independent weapons combine by convolution.
    ///
    /// # Errors
    ///
    /// Returns the first `ParseError` raised by any weapon.
    pub fn compute(&self, policy: TokenPolicy) -> Result<ProfileResults, ParseError> {
        self.compute_in(policy, TargetCatalog::default_catalog())
    }

    /// # Errors
    ///
    /// Returns the first `ParseError` raised by any weapon.
    pub fn compute_in(
        &self,
        policy: TokenPolicy,
        catalog: &TargetCatalog,
    ) -> Result<ProfileResults, ParseError> {
        let mut weapons = Vec::new();
        let mut rejected = Vec::new();
        for (name, inputs) in self.attacks() {
            let prepared = inputs.prepare_in(policy, catalog)?;
            rejected.extend(prepared.rejected.iter().cloned());
            weapons.push(WeaponResults {
                name,
                results: prepared.run(),
            });
        }
        let totals: Vec<Pmf> = weapons
            .iter()
            .map(|weapon| weapon.results.damage_with_mortals())
            .collect();
        let damage = Pmf::convolve_many(&totals);
        let drone_wound = Pmf::convolve_many(weapons.iter().map(|w| &w.results.drone_wound));
        let self_wound = Pmf::convolve_many(weapons.iter().map(|w| &w.results.self_wound));
        Ok(ProfileResults {
            name: self.name.clone(),
            weapons,
            damage,
            drone_wound,
            self_wound,
            rejected,
        })
    }
}

/// A set of profiles as loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileSet {
    #[serde(default)]
    pub config: crate::config::EngineConfig,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl ProfileSet {
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the payload is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Profiles that are switched on.
    pub fn enabled(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().filter(|profile| profile.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_follow_form_fallbacks() {
        let inputs = AttackInputs::default();
        let prepared = inputs.prepare(TokenPolicy::Lenient).unwrap();
        assert_eq!(prepared.attacker.ws, 1);
        assert_eq!(prepared.target.toughness, 1);
        assert_eq!(prepared.target.save, 7);
        assert_eq!(prepared.target.wounds, 1);
        assert_eq!(prepared.weapon.strength, 1);
        assert_eq!(prepared.weapon.ap, 0);
        assert_eq!(prepared.weapon.shots.convolve(), Pmf::constant(1));
    }

    #[test]
    fn short_names_and_joined_tokens() {
        let inputs: AttackInputs = serde_json::from_value(json!({
            "t": "4", "sv": 3, "w": "2",
            "ws": 3, "s": 4, "ap": "1", "sh": "2d6", "dm": "1",
            "hm": "reroll_ones, add_1",
            "svm": ["ignoreap_1"]
        }))
        .unwrap();
        assert_eq!(inputs.target.toughness, Some(InputValue::from("4")));
        assert_eq!(inputs.weapon.hitmods, vec!["reroll_ones", "add_1"]);
        let prepared = inputs.prepare(TokenPolicy::Strict).unwrap();
        assert_eq!(prepared.target.save, 3);
        assert_eq!(prepared.weapon.shots.len(), 2);
        assert_eq!(prepared.mods.mods(Stage::Hit).len(), 2);
        assert_eq!(prepared.mods.mods(Stage::Pen).len(), 1);
    }

    #[test]
    fn malformed_values_are_typed_errors() {
        let bad_shots = AttackInputs {
            weapon: WeaponInputs {
                shots: Some(InputValue::from("lots")),
                ..WeaponInputs::default()
            },
            ..AttackInputs::default()
        };
        assert!(matches!(
            bad_shots.compute(),
            Err(ParseError::InvalidDiceNotation { .. })
        ));

        let bad_save = AttackInputs {
            target: TargetInputs {
                save: Some(InputValue::from("3+")),
                ..TargetInputs::default()
            },
            ..AttackInputs::default()
        };
        assert_eq!(
            bad_save.compute(),
            Err(ParseError::InvalidNumber {
                field: "save",
                value: "3+".to_string()
            })
        );
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let huge_strength = AttackInputs {
            weapon: WeaponInputs {
                strength: Some(InputValue::Number(2_000_000_000)),
                ..WeaponInputs::default()
            },
            ..AttackInputs::default()
        };
        assert_eq!(
            huge_strength.compute(),
            Err(ParseError::InvalidNumber {
                field: "strength",
                value: "2000000000".to_string()
            })
        );

        let huge_wounds = TargetInputs {
            wounds: Some(InputValue::from("99999999999")),
            ..TargetInputs::default()
        };
        assert!(matches!(
            huge_wounds.to_unit(),
            Err(ParseError::InvalidNumber { field: "wounds", .. })
        ));

        let huge_shots = AttackInputs {
            weapon: WeaponInputs {
                shots: Some(InputValue::Number(1_001)),
                ..WeaponInputs::default()
            },
            ..AttackInputs::default()
        };
        assert!(matches!(
            huge_shots.compute(),
            Err(ParseError::InvalidDiceNotation { .. })
        ));

        let strong = AttackInputs {
            target: TargetInputs {
                toughness: Some(InputValue::Number(4)),
                ..TargetInputs::default()
            },
            weapon: WeaponInputs {
                strength: Some(InputValue::Number(1_000)),
                ..WeaponInputs::default()
            },
        };
        let results = strong.compute().unwrap();
        // Wounds on a 2+.
        assert!((results.stages.wounds.mean() - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_tokens_follow_policy() {
        let inputs = AttackInputs {
            weapon: WeaponInputs {
                hitmods: vec!["reroll_ones".to_string(), "lucky".to_string()],
                ..WeaponInputs::default()
            },
            ..AttackInputs::default()
        };
        let prepared = inputs.prepare(TokenPolicy::Lenient).unwrap();
        assert_eq!(prepared.rejected, vec!["lucky".to_string()]);
        assert!(inputs.prepare(TokenPolicy::Strict).is_err());
    }

    #[test]
    fn preset_fills_target_and_fields_override() {
        let target = TargetInputs {
            preset: Some("MEQ".to_string()),
            wounds: Some(InputValue::Number(3)),
            ..TargetInputs::default()
        };
        let unit = target.to_unit().unwrap();
        assert_eq!((unit.toughness, unit.save, unit.wounds), (4, 3, 3));

        let missing = TargetInputs {
            preset: Some("nope".to_string()),
            ..TargetInputs::default()
        };
        assert!(matches!(
            missing.to_unit(),
            Err(ParseError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn profile_combines_enabled_weapons() {
        let set = ProfileSet::from_json(
            r#"{
                "profiles": [{
                    "name": "Marines",
                    "toughness": 4, "save": 7, "wounds": 10,
                    "weapons": [
                        { "name": "bolter", "ws": 4, "strength": 4, "shots": 2 },
                        { "name": "bolter", "ws": 4, "strength": 4, "shots": 2 },
                        { "name": "off", "enabled": "disabled", "shots": 50 }
                    ]
                }]
            }"#,
        )
        .unwrap();
        let profile = set.enabled().next().unwrap();
        let results = profile.compute(TokenPolicy::Lenient).unwrap();
        assert_eq!(results.weapons.len(), 2);
        assert!((results.damage.mean() - 1.0).abs() < 1e-9);
        assert!((results.damage.total() - 1.0).abs() < 1e-9);
        assert_eq!(set.config, crate::config::EngineConfig::default());
    }
}
