use std::cmp::Reverse;

use smallvec::SmallVec;

use crate::collection::PmfCollection;

use super::{BonusEvent, DroneProtocol, Modifier, RollBasis, Stage};

type StageList = SmallVec<[Box<dyn Modifier>; 4]>;

/// Modifiers grouped by pipeline stage, each list kept in descending priority.
#[derive(Debug, Default)]
pub struct ModifierCollection {
    stages: [StageList; 6],
}

impl ModifierCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::add`].
    #[must_use]
    pub fn with<M>(mut self, stage: Stage, modifier: M) -> Self
    where
        M: Modifier + 'static,
    {
        self.add(stage, Box::new(modifier));
        self
    }

    pub fn add(&mut self, stage: Stage, modifier: Box<dyn Modifier>) {
        self.add_mods(stage, std::iter::once(modifier));
    }

    pub fn add_mods<I>(&mut self, stage: Stage, mods: I)
    where
        I: IntoIterator<Item = Box<dyn Modifier>>,
    {
        let list = &mut self.stages[stage.index()];
        list.extend(mods);
        // Stable, so equal priorities keep insertion order.
        list.sort_by_key(|modifier| Reverse(modifier.priority()));
    }

    /// Move every modifier of `other` into the matching stage of `self`.
    pub fn merge(&mut self, other: Self) {
        for (stage, list) in Stage::ALL.into_iter().zip(other.stages) {
            self.add_mods(stage, list);
        }
    }

    #[must_use]
    pub fn mods(&self, stage: Stage) -> &[Box<dyn Modifier>] {
        &self.stages[stage.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.iter().map(SmallVec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(SmallVec::is_empty)
    }

    /// Resolve re-rolls, then dice transforms, for one stage.
    ///
    /// Only the highest-priority modifier offering a re-roll gets to apply it.
    #[must_use]
    pub fn modify_dice(
        &self,
        stage: Stage,
        dice: PmfCollection,
        thresh: i32,
        mod_thresh: i32,
    ) -> PmfCollection {
        let mods = self.mods(stage);
        let rerolled = mods
            .iter()
            .find_map(|modifier| modifier.modify_re_roll(&dice, thresh, mod_thresh));
        let dice = rerolled.unwrap_or(dice);
        mods.iter().fold(dice, |dice, modifier| {
            modifier.modify_dice(dice, thresh, mod_thresh)
        })
    }

    #[must_use]
    pub fn modify_shot_dice(&self, dice: PmfCollection) -> PmfCollection {
        self.modify_dice(Stage::Shots, dice, 0, 0)
    }

    /// Shifted hit threshold, never better than 2+.
    ///
    /// A threshold of 1 is an automatic hit and ignores modifiers entirely.
    #[must_use]
    pub fn modify_hit_thresh(&self, thresh: i32) -> i32 {
        if thresh == 1 {
            return thresh;
        }
        self.shift_threshold(Stage::Hit, thresh).max(2)
    }

    #[must_use]
    pub fn modify_hit_dice(&self, dice: PmfCollection, thresh: i32, mod_thresh: i32) -> PmfCollection {
        self.modify_dice(Stage::Hit, dice, thresh, mod_thresh)
    }

    #[must_use]
    pub fn modify_wound_thresh(&self, thresh: i32) -> i32 {
        self.shift_threshold(Stage::Wound, thresh).max(2)
    }

    #[must_use]
    pub fn modify_wound_dice(
        &self,
        dice: PmfCollection,
        thresh: i32,
        mod_thresh: i32,
    ) -> PmfCollection {
        self.modify_dice(Stage::Wound, dice, thresh, mod_thresh)
    }

    /// Effective save threshold: the better of armour (after AP) and invulnerable.
    #[must_use]
    pub fn modify_pen_thresh(&self, save: i32, ap: i32, invuln: i32) -> i32 {
        let mods = self.mods(Stage::Pen);
        let save = mods.iter().fold(save, |acc, m| m.modify_save(acc));
        let ap = mods.iter().fold(ap, |acc, m| m.modify_ap(acc));
        let invuln = mods.iter().fold(invuln, |acc, m| m.modify_invuln(acc));
        save.saturating_add(ap).max(2).min(invuln.max(2))
    }

    #[must_use]
    pub fn modify_pen_dice(&self, dice: PmfCollection, thresh: i32, mod_thresh: i32) -> PmfCollection {
        self.modify_dice(Stage::Pen, dice, thresh, mod_thresh)
    }

    /// Combined drone protocol on the save stage, taking the best of each value.
    #[must_use]
    pub fn modify_drone(&self) -> Option<DroneProtocol> {
        self.mods(Stage::Pen)
            .iter()
            .filter_map(|modifier| modifier.drone_protocol())
            .reduce(|best, next| DroneProtocol {
                threshold: best.threshold.min(next.threshold),
                fnp: best.fnp.min(next.fnp),
            })
    }

    /// Highest self-wound threshold declared on the hit stage.
    #[must_use]
    pub fn modify_self_wounds(&self) -> Option<i32> {
        self.mods(Stage::Hit)
            .iter()
            .filter_map(|modifier| modifier.self_wound_threshold())
            .max()
    }

    #[must_use]
    pub fn modify_fnp_thresh(&self, thresh: i32) -> i32 {
        self.mods(Stage::Fnp)
            .iter()
            .fold(thresh, |acc, m| m.modify_save(acc))
            .max(2)
    }

    #[must_use]
    pub fn modify_fnp_dice(&self, dice: PmfCollection, thresh: i32, mod_thresh: i32) -> PmfCollection {
        self.modify_dice(Stage::Fnp, dice, thresh, mod_thresh)
    }

    #[must_use]
    pub fn modify_damage_dice(&self, dice: PmfCollection) -> PmfCollection {
        self.modify_dice(Stage::Damage, dice, 0, 0)
    }

    /// Merge every generator of one kind on a stage into a single per-face collection.
    #[must_use]
    pub fn sum_generators(&self, stage: Stage, event: BonusEvent, basis: RollBasis) -> PmfCollection {
        let generators: Vec<PmfCollection> = self
            .mods(stage)
            .iter()
            .filter_map(|modifier| modifier.generator(event, basis))
            .collect();
        PmfCollection::add_many(&generators)
    }

    #[must_use]
    pub fn mod_extra_hit(&self) -> PmfCollection {
        self.sum_generators(Stage::Hit, BonusEvent::ExtraHit, RollBasis::Modified)
    }

    #[must_use]
    pub fn extra_hit(&self) -> PmfCollection {
        self.sum_generators(Stage::Hit, BonusEvent::ExtraHit, RollBasis::Natural)
    }

    #[must_use]
    pub fn mod_extra_shot(&self) -> PmfCollection {
        self.sum_generators(Stage::Hit, BonusEvent::ExtraShot, RollBasis::Modified)
    }

    #[must_use]
    pub fn extra_shot(&self) -> PmfCollection {
        self.sum_generators(Stage::Hit, BonusEvent::ExtraShot, RollBasis::Natural)
    }

    #[must_use]
    pub fn mod_extra_wound(&self) -> PmfCollection {
        self.sum_generators(Stage::Wound, BonusEvent::ExtraWound, RollBasis::Modified)
    }

    #[must_use]
    pub fn extra_wound(&self) -> PmfCollection {
        self.sum_generators(Stage::Wound, BonusEvent::ExtraWound, RollBasis::Natural)
    }

    #[must_use]
    pub fn mod_mortal_wounds(&self, stage: Stage) -> PmfCollection {
        self.sum_generators(stage, BonusEvent::MortalWound, RollBasis::Modified)
    }

    #[must_use]
    pub fn mortal_wounds(&self, stage: Stage) -> PmfCollection {
        self.sum_generators(stage, BonusEvent::MortalWound, RollBasis::Natural)
    }

    fn shift_threshold(&self, stage: Stage, thresh: i32) -> i32 {
        self.mods(stage)
            .iter()
            .fold(thresh, |acc, m| m.modify_threshold(acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifiers::{
        AddNToInvuln, AddNToSave, AddNToThreshold, ExplodingDice, IgnoreAp, Overheat, ReRollAll,
        ReRollOnes, SaviourProtocol,
    };
    use crate::pmf::Pmf;

    #[test]
    fn lists_sorted_by_descending_priority() {
        let mods = ModifierCollection::new()
            .with(Stage::Hit, ReRollOnes)
            .with(Stage::Hit, AddNToThreshold::new(1))
            .with(Stage::Hit, ReRollAll);
        let priorities: Vec<i32> = mods.mods(Stage::Hit).iter().map(|m| m.priority()).collect();
        assert_eq!(priorities, vec![100, 1, 1]);
        assert_eq!(mods.len(), 3);
        assert!(mods.mods(Stage::Wound).is_empty());
    }

    #[test]
    fn only_highest_priority_re_roll_applies() {
        let stacked = ModifierCollection::new()
            .with(Stage::Hit, ReRollOnes)
            .with(Stage::Hit, ReRollAll);
        let full_only = ModifierCollection::new().with(Stage::Hit, ReRollAll);
        let dice = PmfCollection::mdn(1, 6);
        assert_eq!(
            stacked.modify_hit_dice(dice.clone(), 4, 4),
            full_only.modify_hit_dice(dice, 4, 4)
        );
    }

    #[test]
    fn hit_threshold_clamps_and_respects_auto_hit() {
        let mods = ModifierCollection::new().with(Stage::Hit, AddNToThreshold::new(3));
        assert_eq!(mods.modify_hit_thresh(3), 2);
        assert_eq!(mods.modify_hit_thresh(1), 1);
        let penalty = ModifierCollection::new().with(Stage::Hit, AddNToThreshold::new(-1));
        assert_eq!(penalty.modify_hit_thresh(6), 7);
    }

    #[test]
    fn pen_threshold_takes_best_save() {
        let mods = ModifierCollection::new();
        assert_eq!(mods.modify_pen_thresh(3, 1, 7), 4);
        assert_eq!(mods.modify_pen_thresh(3, 3, 5), 5);
        assert_eq!(mods.modify_pen_thresh(1, 0, 7), 2);

        let cover = ModifierCollection::new()
            .with(Stage::Pen, AddNToSave::new(1))
            .with(Stage::Pen, IgnoreAp::new(1))
            .with(Stage::Pen, AddNToInvuln::new(-1));
        assert_eq!(cover.modify_pen_thresh(4, 1, 5), 3);
    }

    #[test]
    fn pen_threshold_saturates() {
        let mods = ModifierCollection::new();
        assert_eq!(mods.modify_pen_thresh(i32::MAX, i32::MAX, 7), 7);
        assert_eq!(mods.modify_pen_thresh(i32::MIN, i32::MIN, 7), 2);
    }

    #[test]
    fn fnp_threshold_uses_save_shift() {
        let mods = ModifierCollection::new().with(Stage::Fnp, AddNToSave::new(1));
        assert_eq!(mods.modify_fnp_thresh(6), 5);
        assert_eq!(mods.modify_fnp_thresh(2), 2);
    }

    #[test]
    fn drone_and_overheat_queries() {
        let mods = ModifierCollection::new()
            .with(Stage::Pen, SaviourProtocol::normal_drone())
            .with(Stage::Pen, SaviourProtocol::shield_drone())
            .with(Stage::Hit, Overheat);
        assert_eq!(
            mods.modify_drone(),
            Some(DroneProtocol {
                threshold: 2,
                fnp: 5
            })
        );
        assert_eq!(mods.modify_self_wounds(), Some(2));
        assert_eq!(ModifierCollection::new().modify_drone(), None);
    }

    #[test]
    fn generators_sum_per_face() {
        let mods = ModifierCollection::new()
            .with(
                Stage::Hit,
                ExplodingDice::new(BonusEvent::ExtraHit, RollBasis::Modified, 6, 1),
            )
            .with(
                Stage::Hit,
                ExplodingDice::new(BonusEvent::ExtraHit, RollBasis::Modified, 5, 1),
            );
        let faces = mods.mod_extra_hit();
        assert_eq!(faces.len(), 7);
        assert!((faces.get(6).map_or(0.0, |pmf| pmf.get(2)) - 1.0).abs() < 1e-12);
        assert!((faces.get(5).map_or(0.0, |pmf| pmf.get(1)) - 1.0).abs() < 1e-12);
        assert!((faces.get(4).map_or(0.0, Pmf::total) - 1.0).abs() < 1e-12);
        assert!(mods.extra_hit().is_empty());
        assert!(mods.mod_mortal_wounds(Stage::Wound).is_empty());
    }

    #[test]
    fn merge_keeps_stage_membership() {
        let mut mods = ModifierCollection::new().with(Stage::Hit, ReRollOnes);
        mods.merge(ModifierCollection::new().with(Stage::Damage, ReRollAll));
        assert_eq!(mods.mods(Stage::Hit).len(), 1);
        assert_eq!(mods.mods(Stage::Damage).len(), 1);
        assert!(!mods.is_empty());
    }
}
