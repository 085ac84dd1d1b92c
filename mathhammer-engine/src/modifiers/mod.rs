//! Stackable effects applied at each stage of the attack pipeline.
//!
//! A modifier only overrides the hooks it cares about; everything else falls
//! through to the no-op defaults on [`Modifier`]. Stage membership is decided
//! by [`ModifierCollection`], not by the modifier itself.

mod collection;
mod exploding;
mod parse;
mod reroll;
mod special;
mod threshold;
mod volume;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::PmfCollection;

pub use collection::ModifierCollection;
pub use exploding::{ExplodingDice, Haywire};
pub use parse::{
    ModifierSpec, ParsedModifiers, VOCABULARY, parse_modifier, parse_modifiers,
    parse_modifiers_strict,
};
pub use reroll::{
    ModReRollOneDice, ReRollAll, ReRollFailed, ReRollLessThanExpected, ReRollOneDice,
    ReRollOneDiceVolume, ReRollOnes,
};
pub use special::{Overheat, SaviourProtocol};
pub use threshold::{AddNToInvuln, AddNToSave, AddNToThreshold, IgnoreAp, IgnoreInvuln};
pub use volume::{AddDie, AddNToVolume, HalfDamage, Melta, MinimumValue};

/// Pipeline stage a modifier list is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Shots,
    Hit,
    Wound,
    Pen,
    Fnp,
    Damage,
}

impl Stage {
    pub const ALL: [Self; 6] = [
        Self::Shots,
        Self::Hit,
        Self::Wound,
        Self::Pen,
        Self::Fnp,
        Self::Damage,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Shots => 0,
            Self::Hit => 1,
            Self::Wound => 2,
            Self::Pen => 3,
            Self::Fnp => 4,
            Self::Damage => 5,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shots => "shots",
            Self::Hit => "hit",
            Self::Wound => "wound",
            Self::Pen => "pen",
            Self::Fnp => "fnp",
            Self::Damage => "damage",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of bonus produced by an exploding-dice trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusEvent {
    ExtraHit,
    ExtraShot,
    ExtraWound,
    MortalWound,
}

/// Whether a trigger reads the modified roll or the natural die face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollBasis {
    /// Follows threshold shifts on the stage ("on a 6+" becomes "on a 5+" with +1).
    Modified,
    /// Fixed to the die face.
    Natural,
}

/// Saviour-protocol drones that may intercept wounds before the save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneProtocol {
    /// Roll needed for a drone to step in front of a wound.
    pub threshold: i32,
    /// Feel-no-pain threshold of the intercepting drone (7 means none).
    pub fnp: i32,
}

/// A single stackable rule effect.
///
/// `thresh` is the unmodified pass threshold of the stage and `mod_thresh` the
/// one after every threshold shift; volume stages (shots and damage) pass 0 for
/// both.
pub trait Modifier: fmt::Debug + Send + Sync {
    /// Ordering key within a stage; the highest-priority re-roll is the only one applied.
    fn priority(&self) -> i32 {
        0
    }

    /// Re-roll policy for the stage's dice, `None` when this modifier grants no re-roll.
    fn modify_re_roll(
        &self,
        _dice: &PmfCollection,
        _thresh: i32,
        _mod_thresh: i32,
    ) -> Option<PmfCollection> {
        None
    }

    /// Transform the dice after re-rolls have been resolved.
    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        dice
    }

    /// Shift the pass threshold; "+1 to hit" lowers it.
    fn modify_threshold(&self, thresh: i32) -> i32 {
        thresh
    }

    fn modify_save(&self, save: i32) -> i32 {
        save
    }

    fn modify_ap(&self, ap: i32) -> i32 {
        ap
    }

    fn modify_invuln(&self, invuln: i32) -> i32 {
        invuln
    }

    /// Per-face generator (index 0 through 6) of bonus events of `event` kind.
    fn generator(&self, _event: BonusEvent, _basis: RollBasis) -> Option<PmfCollection> {
        None
    }

    fn drone_protocol(&self) -> Option<DroneProtocol> {
        None
    }

    /// Natural rolls below this threshold wound the attacker.
    fn self_wound_threshold(&self) -> Option<i32> {
        None
    }
}
