use super::Modifier;

/// `+n` to the roll, so the numeric threshold drops by `n`. Negative `n` is a penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNToThreshold {
    pub n: i32,
}

impl AddNToThreshold {
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self { n }
    }
}

impl Modifier for AddNToThreshold {
    fn priority(&self) -> i32 {
        self.n
    }

    fn modify_threshold(&self, thresh: i32) -> i32 {
        thresh.saturating_sub(self.n)
    }
}

/// `+n` to the saving throw. On the feel-no-pain stage it shifts the FNP roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNToSave {
    pub n: i32,
}

impl AddNToSave {
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self { n }
    }
}

impl Modifier for AddNToSave {
    fn priority(&self) -> i32 {
        self.n
    }

    fn modify_save(&self, save: i32) -> i32 {
        save.saturating_sub(self.n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddNToInvuln {
    pub n: i32,
}

impl AddNToInvuln {
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self { n }
    }
}

impl Modifier for AddNToInvuln {
    fn priority(&self) -> i32 {
        self.n
    }

    fn modify_invuln(&self, invuln: i32) -> i32 {
        invuln.saturating_sub(self.n)
    }
}

/// Treat AP of `n` or less as AP 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreAp {
    pub n: i32,
}

impl IgnoreAp {
    #[must_use]
    pub const fn new(n: i32) -> Self {
        Self { n }
    }
}

impl Modifier for IgnoreAp {
    fn modify_ap(&self, ap: i32) -> i32 {
        if ap <= self.n { 0 } else { ap }
    }
}

/// The target may not take an invulnerable save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreInvuln;

impl Modifier for IgnoreInvuln {
    fn modify_invuln(&self, _invuln: i32) -> i32 {
        7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_modifier_lowers_threshold() {
        assert_eq!(AddNToThreshold::new(1).modify_threshold(4), 3);
        assert_eq!(AddNToThreshold::new(-1).modify_threshold(4), 5);
        assert_eq!(AddNToThreshold::new(2).priority(), 2);
        assert_eq!(AddNToThreshold::new(i32::MIN).modify_threshold(4), i32::MAX);
    }

    #[test]
    fn ignore_ap_only_below_cutoff() {
        let ignore = IgnoreAp::new(1);
        assert_eq!(ignore.modify_ap(1), 0);
        assert_eq!(ignore.modify_ap(2), 2);
    }

    #[test]
    fn save_and_invuln_shifts() {
        assert_eq!(AddNToSave::new(1).modify_save(4), 3);
        assert_eq!(AddNToInvuln::new(-1).modify_invuln(4), 5);
        assert_eq!(IgnoreInvuln.modify_invuln(3), 7);
    }
}
