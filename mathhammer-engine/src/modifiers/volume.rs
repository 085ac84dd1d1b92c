use crate::collection::PmfCollection;
use crate::numbers::count_to_usize;
use crate::pmf::Pmf;

use super::Modifier;

/// Roll two dice and keep the highest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Melta;

impl Modifier for Melta {
    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        dice.map(Pmf::melta)
    }
}

/// Shift every volume die by `n`, never below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNToVolume {
    pub n: i32,
}

impl AddNToVolume {
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self { n }
    }
}

impl Modifier for AddNToVolume {
    fn priority(&self) -> i32 {
        self.n
    }

    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        dice.map(|pmf| pmf.roll(self.n))
    }
}

/// Add one extra `faces`-sided die to the pool (`addvol_d3`, `addvol_d6`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddDie {
    pub faces: usize,
}

impl AddDie {
    #[must_use]
    pub const fn new(faces: usize) -> Self {
        Self { faces }
    }
}

impl Modifier for AddDie {
    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        dice.with(Pmf::dn(self.faces))
    }
}

/// Any die rolling under `min` counts as `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimumValue {
    pub min: i32,
}

impl MinimumValue {
    #[must_use]
    pub const fn new(min: i32) -> Self {
        Self { min }
    }
}

impl Modifier for MinimumValue {
    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        let min = count_to_usize(self.min);
        dice.map(|pmf| pmf.min_value(min))
    }
}

/// Halve each damage die, rounding up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfDamage;

impl Modifier for HalfDamage {
    fn modify_dice(&self, dice: PmfCollection, _thresh: i32, _mod_thresh: i32) -> PmfCollection {
        dice.map(|pmf| pmf.div_min_one(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_die_extends_pool() {
        let pool = AddDie::new(3).modify_dice(PmfCollection::mdn(1, 6), 0, 0);
        assert_eq!(pool.len(), 2);
        assert!((pool.convolve().mean() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn volume_shift_clamps_at_zero() {
        let pool = AddNToVolume::new(-2).modify_dice(PmfCollection::mdn(1, 3), 0, 0);
        let pmf = pool.get(0).unwrap();
        assert!((pmf.get(0) - 2.0 / 3.0).abs() < 1e-12);
        assert!((pmf.get(1) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn minimum_and_half_damage() {
        let floored = MinimumValue::new(3).modify_dice(PmfCollection::mdn(1, 6), 0, 0);
        assert!((floored.get(0).unwrap().get(3) - 0.5).abs() < 1e-12);

        let halved = HalfDamage.modify_dice(PmfCollection::new(vec![Pmf::constant(5)]), 0, 0);
        assert!((halved.get(0).unwrap().get(3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn melta_improves_mean() {
        let melta = Melta.modify_dice(PmfCollection::mdn(1, 6), 0, 0);
        assert!(melta.convolve().mean() > 3.5);
    }
}
