use crate::collection::PmfCollection;
use crate::pmf::Pmf;

use super::{BonusEvent, Modifier, RollBasis};

const FACES: usize = 7;

/// "On a `threshold`+, generate `value` extra events".
///
/// The generator has one entry per die face 0 through 6: no bonus below the
/// trigger, `value` bonuses from it upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplodingDice {
    pub event: BonusEvent,
    pub basis: RollBasis,
    pub threshold: usize,
    pub value: usize,
}

impl ExplodingDice {
    #[must_use]
    pub const fn new(event: BonusEvent, basis: RollBasis, threshold: usize, value: usize) -> Self {
        let threshold = if threshold > FACES { FACES } else { threshold };
        Self {
            event,
            basis,
            threshold,
            value,
        }
    }

    fn faces(&self) -> PmfCollection {
        let miss = Pmf::constant(0);
        let bonus = Pmf::constant(self.value);
        (0..FACES)
            .map(|face| {
                if face < self.threshold {
                    miss.clone()
                } else {
                    bonus.clone()
                }
            })
            .collect()
    }
}

impl Modifier for ExplodingDice {
    fn generator(&self, event: BonusEvent, basis: RollBasis) -> Option<PmfCollection> {
        (event == self.event && basis == self.basis).then(|| self.faces())
    }
}

/// Wound rolls of 4+ inflict one mortal wound, 6s inflict d3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Haywire;

impl Modifier for Haywire {
    fn generator(&self, event: BonusEvent, basis: RollBasis) -> Option<PmfCollection> {
        if event != BonusEvent::MortalWound || basis != RollBasis::Modified {
            return None;
        }
        Some(
            PmfCollection::repeat(&Pmf::constant(0), 4)
                .with(Pmf::constant(1))
                .with(Pmf::constant(1))
                .with(Pmf::dn(3)),
        )
    }
}
