//! Ordered per-die distributions awaiting convolution.
//!
//! One entry per die (or per unmerged effect source). Order only matters for
//! re-roll-one-die effects, which always act on the first entry.

use serde::{Deserialize, Serialize};

use crate::pmf::Pmf;

/// Which side of a threshold counts as a success when collapsing a die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassRule {
    /// Hit and wound rolls: succeed on `roll >= threshold`.
    AtLeast,
    /// Save and feel-no-pain rolls: the attack goes through on `roll < threshold`.
    Below,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PmfCollection {
    pmfs: Vec<Pmf>,
}

impl PmfCollection {
    #[must_use]
    pub const fn new(pmfs: Vec<Pmf>) -> Self {
        Self { pmfs }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { pmfs: Vec::new() }
    }

    /// `m` independent `n`-sided dice.
    #[must_use]
    pub fn mdn(m: usize, n: usize) -> Self {
        Self::repeat(&Pmf::dn(n), m)
    }

    /// `count` copies of the same distribution.
    #[must_use]
    pub fn repeat(pmf: &Pmf, count: usize) -> Self {
        Self::new(vec![pmf.clone(); count])
    }

    #[must_use]
    pub fn pmfs(&self) -> &[Pmf] {
        &self.pmfs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pmfs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pmfs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Pmf> {
        self.pmfs.get(index)
    }

    /// Append one more die.
    #[must_use]
    pub fn with(&self, pmf: Pmf) -> Self {
        let mut pmfs = self.pmfs.clone();
        pmfs.push(pmf);
        Self { pmfs }
    }

    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(&Pmf) -> Pmf,
    {
        self.pmfs.iter().map(f).collect()
    }

    /// Transform only the first die, leaving the rest untouched.
    #[must_use]
    pub fn map_first<F>(&self, f: F) -> Self
    where
        F: FnOnce(&Pmf) -> Pmf,
    {
        let mut pmfs = self.pmfs.clone();
        if let Some(first) = pmfs.first_mut() {
            *first = f(first);
        }
        Self { pmfs }
    }

    /// Re-window a per-face generator for a shifted threshold.
    ///
    /// A positive shift pushes every trigger up a face by duplicating the
    /// first entry; a negative shift pulls triggers down by duplicating the
    /// last entry and dropping from the front. The length is preserved for
    /// negative shifts and grows for positive ones.
    #[must_use]
    pub fn thresh_mod(&self, shift: i32) -> Self {
        if shift == 0 || self.is_empty() {
            return self.clone();
        }
        let steps = usize::try_from(shift.unsigned_abs()).unwrap_or(0);
        if shift > 0 {
            let mut pmfs = vec![self.pmfs[0].clone(); steps];
            pmfs.extend_from_slice(&self.pmfs);
            return Self { pmfs };
        }
        let last = self.pmfs[self.len() - 1].clone();
        let mut extended = self.pmfs.clone();
        extended.extend(std::iter::repeat_n(last, steps));
        let start = extended.len() - self.len();
        Self {
            pmfs: extended.split_off(start),
        }
    }

    /// For a single die with face distribution `pmf`, the distribution of the
    /// events this per-face generator produces.
    ///
    /// Faces beyond the end of the collection generate nothing.
    #[must_use]
    pub fn mul_pmf(&self, pmf: &Pmf) -> Pmf {
        let nothing = Pmf::constant(0);
        let branches: Vec<Pmf> = pmf
            .values()
            .iter()
            .enumerate()
            .map(|(face, &p)| self.get(face).unwrap_or(&nothing).scale(p))
            .collect();
        Pmf::flatten(&branches)
    }

    /// Apply [`Self::mul_pmf`] to every die of `dice`.
    #[must_use]
    pub fn mul_col(&self, dice: &Self) -> Self {
        dice.pmfs.iter().map(|pmf| self.mul_pmf(pmf)).collect()
    }

    #[must_use]
    pub fn convolve(&self) -> Pmf {
        Pmf::convolve_many(&self.pmfs)
    }

    /// Collapse every die to a `[fail, pass]` distribution.
    #[must_use]
    pub fn convert_binomial(&self, threshold: usize, rule: PassRule) -> Self {
        match rule {
            PassRule::AtLeast => self.map(|pmf| pmf.convert_binomial(threshold)),
            PassRule::Below => self.map(|pmf| pmf.convert_binomial_less_than(threshold)),
        }
    }

    /// Per-index convolution across collections of possibly different lengths.
    ///
    /// Empty collections are skipped and missing indices count as "no events".
    #[must_use]
    pub fn add_many<'a, I>(collections: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let present: Vec<&Self> = collections.into_iter().filter(|c| !c.is_empty()).collect();
        let longest = present.iter().map(|c| c.len()).max().unwrap_or(0);
        let nothing = Pmf::constant(0);
        (0..longest)
            .map(|index| {
                Pmf::convolve_many(present.iter().map(|c| c.get(index).unwrap_or(&nothing)))
            })
            .collect()
    }
}

impl FromIterator<Pmf> for PmfCollection {
    fn from_iter<T: IntoIterator<Item = Pmf>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PmfCollection {
    type Item = &'a Pmf;
    type IntoIter = std::slice::Iter<'a, Pmf>;

    fn into_iter(self) -> Self::IntoIter {
        self.pmfs.iter()
    }
}
