//! Weapon and unit profiles fed into an attack sequence.

use serde::{Deserialize, Serialize};

use crate::collection::PmfCollection;

/// One weapon's attack profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub shots: PmfCollection,
    pub strength: i32,
    pub ap: i32,
    pub damage: PmfCollection,
}

impl Weapon {
    #[must_use]
    pub const fn new(shots: PmfCollection, strength: i32, ap: i32, damage: PmfCollection) -> Self {
        Self {
            shots,
            strength,
            ap,
            damage,
        }
    }
}

/// Game statistics of a model: skills for the attacker, defences for the target.
///
/// Thresholds run 2 to 7 on a d6 where 7 means "cannot succeed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub ws: i32,
    pub bs: i32,
    pub toughness: i32,
    pub save: i32,
    pub invuln: i32,
    pub fnp: i32,
    pub wounds: i32,
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            ws: 7,
            bs: 7,
            toughness: 1,
            save: 7,
            invuln: 7,
            fnp: 7,
            wounds: 1,
        }
    }
}

impl Unit {
    /// An attacker only needs a skill; everything else stays at the defaults.
    #[must_use]
    pub fn attacker(skill: i32) -> Self {
        Self {
            ws: skill,
            bs: skill,
            ..Self::default()
        }
    }
}
