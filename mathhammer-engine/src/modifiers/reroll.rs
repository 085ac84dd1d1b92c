use crate::collection::PmfCollection;
use crate::numbers::{ceil_f64_to_index, threshold_to_index};

use super::Modifier;

/// Re-roll natural ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollOnes;

impl Modifier for ReRollOnes {
    fn priority(&self) -> i32 {
        1
    }

    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        _thresh: i32,
        _mod_thresh: i32,
    ) -> Option<PmfCollection> {
        Some(dice.map(|pmf| pmf.re_roll_value(1)))
    }
}

/// Re-roll failures, judged against the lower of the two thresholds so a die
/// that already passes under the active modifiers is never thrown back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollFailed;

impl Modifier for ReRollFailed {
    fn priority(&self) -> i32 {
        99
    }

    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        thresh: i32,
        mod_thresh: i32,
    ) -> Option<PmfCollection> {
        let cutoff = threshold_to_index(thresh.min(mod_thresh));
        Some(dice.map(|pmf| pmf.re_roll_less_than(cutoff)))
    }
}

/// Re-roll every die that misses the modified threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollAll;

impl Modifier for ReRollAll {
    fn priority(&self) -> i32 {
        100
    }

    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        _thresh: i32,
        mod_thresh: i32,
    ) -> Option<PmfCollection> {
        let cutoff = threshold_to_index(mod_thresh);
        Some(dice.map(|pmf| pmf.re_roll_less_than(cutoff)))
    }
}

/// Re-roll any die that came in under its own expected value.
///
/// Meant for variable volumes (shots, damage) where no pass threshold exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollLessThanExpected;

impl Modifier for ReRollLessThanExpected {
    fn priority(&self) -> i32 {
        98
    }

    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        _thresh: i32,
        _mod_thresh: i32,
    ) -> Option<PmfCollection> {
        Some(dice.map(|pmf| pmf.re_roll_less_than(ceil_f64_to_index(pmf.mean()))))
    }
}

/// Re-roll a single die below the unmodified threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollOneDice;

impl Modifier for ReRollOneDice {
    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        thresh: i32,
        _mod_thresh: i32,
    ) -> Option<PmfCollection> {
        let cutoff = threshold_to_index(thresh);
        Some(dice.map_first(|pmf| pmf.re_roll_less_than(cutoff)))
    }
}

/// Re-roll a single die below the modified threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModReRollOneDice;

impl Modifier for ModReRollOneDice {
    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        _thresh: i32,
        mod_thresh: i32,
    ) -> Option<PmfCollection> {
        let cutoff = threshold_to_index(mod_thresh);
        Some(dice.map_first(|pmf| pmf.re_roll_less_than(cutoff)))
    }
}

/// Re-roll a single volume die that came in under its expected value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReRollOneDiceVolume;

impl Modifier for ReRollOneDiceVolume {
    fn modify_re_roll(
        &self,
        dice: &PmfCollection,
        _thresh: i32,
        _mod_thresh: i32,
    ) -> Option<PmfCollection> {
        Some(dice.map_first(|pmf| pmf.re_roll_less_than(ceil_f64_to_index(pmf.mean()))))
    }
}
