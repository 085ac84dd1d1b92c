//! The shots → hits → wounds → saves → damage pipeline.
//!
//! Every stage consumes a distribution over "how many dice reach this stage"
//! and, for each possible count, rolls that many dice, collapses them to
//! pass/fail and weights the result by the probability of that count.
//! Mortal wounds are gathered on the side and only join the total at the end.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::collection::{PassRule, PmfCollection};
use crate::modifiers::{DroneProtocol, ModifierCollection, Stage};
use crate::numbers::{count_to_usize, threshold_to_index};
use crate::pmf::Pmf;
use crate::units::{Unit, Weapon};

const D6: usize = 6;

/// Wound roll needed for a given strength against a given toughness.
#[must_use]
pub const fn wound_threshold(strength: i32, toughness: i32) -> i32 {
    if strength.saturating_mul(2) <= toughness {
        6
    } else if strength >= toughness.saturating_mul(2) {
        2
    } else if toughness > strength {
        5
    } else if toughness == strength {
        4
    } else {
        3
    }
}

/// Intermediate per-stage count distributions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageDistributions {
    pub shots: Pmf,
    pub hits: Pmf,
    pub wounds: Pmf,
    pub penetrating: Pmf,
}

/// Everything one attack sequence produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttackResults {
    /// Damage from wounds that got through saves and feel-no-pain.
    pub damage: Pmf,
    /// Mortal wounds generated by hit and wound rolls.
    pub mortal: Pmf,
    /// Wounds suffered by intercepting drones.
    pub drone_wound: Pmf,
    /// Wounds the attacker inflicts on itself.
    pub self_wound: Pmf,
    /// Damage from a single penetrating wound, after feel-no-pain and the wound cap.
    pub per_wound_damage: Pmf,
    pub stages: StageDistributions,
}

impl AttackResults {
    /// Total damage including mortal wounds.
    #[must_use]
    pub fn damage_with_mortals(&self) -> Pmf {
        Pmf::convolve_many([&self.damage, &self.mortal])
    }
}

struct HitOutcome {
    hits: Pmf,
    self_wounds: Pmf,
}

/// One weapon firing at one target.
#[derive(Debug, Clone, Copy)]
pub struct AttackSequence<'a> {
    weapon: &'a Weapon,
    target: &'a Unit,
    attacker: &'a Unit,
    mods: &'a ModifierCollection,
}

impl<'a> AttackSequence<'a> {
    #[must_use]
    pub const fn new(
        weapon: &'a Weapon,
        target: &'a Unit,
        attacker: &'a Unit,
        mods: &'a ModifierCollection,
    ) -> Self {
        Self {
            weapon,
            target,
            attacker,
            mods,
        }
    }

    #[must_use]
    pub fn run(&self) -> AttackResults {
        let mut mortals = Vec::new();

        let shots = self.shot_dist();
        debug!("shots: mean {:.3}", shots.mean());
        let hit = self.hit_dist(&shots, true, &mut mortals);
        debug!("hits: mean {:.3}", hit.hits.mean());
        let wounds = self.wound_dist(&hit.hits, &mut mortals);
        debug!("wounds: mean {:.3}", wounds.mean());

        let (saving, drone_wound) = match self.mods.modify_drone() {
            Some(protocol) => self.drone_split(&wounds, protocol),
            None => (wounds.clone(), Pmf::constant(0)),
        };
        let penetrating = self.pen_dist(&saving);
        debug!("penetrating: mean {:.3}", penetrating.mean());

        let per_wound_damage = self.per_wound_damage();
        let damage = self.damage_dist(&penetrating, &per_wound_damage);
        let mortal = Pmf::convolve_many(&mortals);
        debug!(
            "damage: mean {:.3}, mortal: mean {:.3}",
            damage.mean(),
            mortal.mean()
        );

        AttackResults {
            damage,
            mortal,
            drone_wound,
            self_wound: hit.self_wounds,
            per_wound_damage,
            stages: StageDistributions {
                shots,
                hits: hit.hits,
                wounds,
                penetrating,
            },
        }
    }

    fn shot_dist(&self) -> Pmf {
        self.mods
            .modify_shot_dice(self.weapon.shots.clone())
            .convolve()
    }

    fn hit_dist(&self, dist: &Pmf, can_recurse: bool, mortals: &mut Vec<Pmf>) -> HitOutcome {
        let thresh = self.attacker.ws;
        let mod_thresh = self.mods.modify_hit_thresh(thresh);
        let pass = threshold_to_index(mod_thresh);
        let shift = self.mods.modify_hit_thresh(6) - 6;
        let mortal_col = self.mortal_generators(Stage::Hit, shift);
        let (extra_hits, extra_shots) = if can_recurse {
            (
                PmfCollection::add_many([
                    &self.mods.mod_extra_hit().thresh_mod(shift),
                    &self.mods.extra_hit(),
                ]),
                PmfCollection::add_many([
                    &self.mods.mod_extra_shot().thresh_mod(shift),
                    &self.mods.extra_shot(),
                ]),
            )
        } else {
            (PmfCollection::empty(), PmfCollection::empty())
        };
        let self_wound = self.mods.modify_self_wounds().map(threshold_to_index);

        let mut hit_branches = Vec::with_capacity(dist.len());
        let mut self_branches = Vec::new();
        for (dice, &p) in dist.values().iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            let dice_dists =
                self.mods
                    .modify_hit_dice(PmfCollection::mdn(dice, D6), thresh, mod_thresh);
            let hits = dice_dists
                .convert_binomial(pass, PassRule::AtLeast)
                .convolve();

            let mut bonus = Vec::with_capacity(2);
            if !extra_hits.is_empty() {
                bonus.push(extra_hits.mul_col(&dice_dists).convolve());
            }
            let mut nested_self = Pmf::constant(0);
            if !extra_shots.is_empty() {
                let shot_dist = extra_shots.mul_col(&dice_dists).convolve();
                trace!(
                    "{dice} hit dice: resolving {:.3} extra shots on average",
                    shot_dist.mean()
                );
                let nested = self.hit_dist(&shot_dist, false, mortals);
                bonus.push(nested.hits);
                nested_self = nested.self_wounds;
            }

            if !mortal_col.is_empty() {
                let mortal = mortal_col.mul_col(&dice_dists).convolve();
                mortals.push(mortal.scale(p).rectify_zero());
            }
            if let Some(threshold) = self_wound {
                let own = dice_dists
                    .convert_binomial(threshold, PassRule::Below)
                    .convolve();
                self_branches.push(Pmf::convolve_many([&own, &nested_self]).scale(p));
            }

            let extra = Pmf::convolve_many(&bonus);
            hit_branches.push(Pmf::convolve_many([&hits, &extra]).scale(p));
        }

        let self_wounds = if self_branches.is_empty() {
            Pmf::constant(0)
        } else {
            Pmf::flatten(&self_branches)
        };
        HitOutcome {
            hits: Pmf::flatten(&hit_branches),
            self_wounds,
        }
    }

    fn wound_dist(&self, dist: &Pmf, mortals: &mut Vec<Pmf>) -> Pmf {
        let thresh = wound_threshold(self.weapon.strength, self.target.toughness);
        let mod_thresh = self.mods.modify_wound_thresh(thresh);
        let pass = threshold_to_index(mod_thresh);
        let shift = self.mods.modify_wound_thresh(6) - 6;
        let extra_wounds = PmfCollection::add_many([
            &self.mods.mod_extra_wound().thresh_mod(shift),
            &self.mods.extra_wound(),
        ]);
        let mortal_col = self.mortal_generators(Stage::Wound, shift);

        let mut branches = Vec::with_capacity(dist.len());
        for (dice, &p) in dist.values().iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            let dice_dists =
                self.mods
                    .modify_wound_dice(PmfCollection::mdn(dice, D6), thresh, mod_thresh);
            let wounds = dice_dists
                .convert_binomial(pass, PassRule::AtLeast)
                .convolve();
            let extra = if extra_wounds.is_empty() {
                Pmf::constant(0)
            } else {
                extra_wounds.mul_col(&dice_dists).convolve()
            };
            if !mortal_col.is_empty() {
                let mortal = mortal_col.mul_col(&dice_dists).convolve();
                mortals.push(mortal.scale(p).rectify_zero());
            }
            branches.push(Pmf::convolve_many([&wounds, &extra]).scale(p));
        }
        Pmf::flatten(&branches)
    }

    /// Split wounds between drones and the target.
    ///
    /// Returns the wounds left for the target's save and the wounds drones
    /// fail to shrug off with their own feel-no-pain.
    fn drone_split(&self, wounds: &Pmf, protocol: DroneProtocol) -> (Pmf, Pmf) {
        let intercept = threshold_to_index(protocol.threshold);
        let drone_fnp = threshold_to_index(protocol.fnp);
        let mut remaining = Vec::new();
        let mut absorbed = Vec::new();
        for (count, &p) in wounds.values().iter().enumerate() {
            if p <= 0.0 {
                continue;
            }
            let intercepted = PmfCollection::mdn(count, D6)
                .convert_binomial(intercept, PassRule::AtLeast)
                .convolve();
            for (taken, &q) in intercepted.values().iter().enumerate() {
                let weight = p * q;
                if weight <= 0.0 {
                    continue;
                }
                remaining.push(Pmf::constant(count.saturating_sub(taken)).scale(weight));
                let suffered = PmfCollection::mdn(taken, D6)
                    .convert_binomial(drone_fnp, PassRule::Below)
                    .convolve();
                absorbed.push(suffered.scale(weight));
            }
        }
        trace!(
            "drones intercept on {}+, feel-no-pain {}+",
            protocol.threshold, protocol.fnp
        );
        (Pmf::flatten(&remaining), Pmf::flatten(&absorbed))
    }

    fn pen_dist(&self, dist: &Pmf) -> Pmf {
        let mod_thresh =
            self.mods
                .modify_pen_thresh(self.target.save, self.weapon.ap, self.target.invuln);
        self.less_than_dist(dist, mod_thresh, mod_thresh, Stage::Pen)
    }

    fn fnp_dist(&self, dist: &Pmf) -> Pmf {
        let thresh = self.target.fnp;
        let mod_thresh = self.mods.modify_fnp_thresh(thresh);
        self.less_than_dist(dist, thresh, mod_thresh, Stage::Fnp)
    }

    /// Per-die rolls where the attacker succeeds on `roll < mod_thresh`.
    fn less_than_dist(&self, dist: &Pmf, thresh: i32, mod_thresh: i32, stage: Stage) -> Pmf {
        let pass = threshold_to_index(mod_thresh);
        let branches: Vec<Pmf> = dist
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(|(dice, &p)| {
                self.mods
                    .modify_dice(stage, PmfCollection::mdn(dice, D6), thresh, mod_thresh)
                    .convert_binomial(pass, PassRule::Below)
                    .convolve()
                    .scale(p)
            })
            .collect();
        Pmf::flatten(&branches)
    }

    fn per_wound_damage(&self) -> Pmf {
        let damage = self
            .mods
            .modify_damage_dice(self.weapon.damage.clone())
            .convolve();
        self.fnp_dist(&damage)
            .ceiling(count_to_usize(self.target.wounds))
    }

    fn damage_dist(&self, penetrating: &Pmf, per_wound: &Pmf) -> Pmf {
        let branches: Vec<Pmf> = penetrating
            .values()
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(|(wounds, &p)| {
                Pmf::convolve_many(std::iter::repeat_n(per_wound, wounds)).scale(p)
            })
            .collect();
        Pmf::flatten(&branches)
    }

    fn mortal_generators(&self, stage: Stage, shift: i32) -> PmfCollection {
        PmfCollection::add_many([
            &self.mods.mod_mortal_wounds(stage).thresh_mod(shift),
            &self.mods.mortal_wounds(stage),
        ])
    }
}
