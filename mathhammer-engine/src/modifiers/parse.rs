//! Modifier vocabulary: string tokens to typed modifier requests.
//!
//! Tokens look like `reroll_ones`, `add_1`, `addon_2_hits_6_mod` or
//! `ignoreap_1`. Parsing produces a closed [`ModifierSpec`]; turning that into
//! a boxed [`Modifier`] is a separate, infallible step.

use std::fmt;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;

use crate::error::ParseError;
use crate::numbers::{within_limit, within_signed_limit};

use super::{
    AddDie, AddNToInvuln, AddNToSave, AddNToThreshold, AddNToVolume, BonusEvent, ExplodingDice,
    HalfDamage, Haywire, IgnoreAp, IgnoreInvuln, Melta, MinimumValue, ModReRollOneDice, Modifier,
    Overheat, ReRollAll, ReRollFailed, ReRollLessThanExpected, ReRollOneDiceVolume, ReRollOnes,
    RollBasis, SaviourProtocol,
};

/// Every accepted token shape with a short description.
pub const VOCABULARY: &[(&str, &str)] = &[
    ("reroll_ones", "re-roll natural 1s"),
    ("reroll_failed", "re-roll failed rolls"),
    ("reroll_all", "re-roll every roll below the modified threshold"),
    ("reroll_allvol", "re-roll volume dice below their expected value"),
    ("reroll_one_dice", "re-roll one die below the modified threshold"),
    ("reroll_one_dicevol", "re-roll one volume die below its expected value"),
    ("reroll_melta", "roll two dice and keep the highest"),
    ("add_N", "+N to the roll"),
    ("sub_N", "-N to the roll"),
    (
        "addon_V_{hits|shots|wounds|mw}_T[_mod]",
        "rolls of T+ generate V extra hits/shots/wounds/mortal wounds; _mod follows roll modifiers",
    ),
    ("haywire", "wound rolls of 4+ inflict 1 mortal wound, 6s inflict d3"),
    ("ignoreap_N", "treat AP of N or less as 0"),
    ("ignoreinv", "no invulnerable save"),
    ("saveadd_N", "+N to the armour save"),
    ("savesub_N", "-N to the armour save"),
    ("fnpadd_N", "+N to the feel-no-pain roll"),
    ("fnpsub_N", "-N to the feel-no-pain roll"),
    ("invadd_N", "+N to the invulnerable save"),
    ("invsub_N", "-N to the invulnerable save"),
    ("halfdam", "halve damage, rounding up"),
    ("minval_N", "dice rolling under N count as N"),
    ("addvol_{N|d3|d6}", "add N (or an extra d3/d6) to each volume roll"),
    ("subvol_N", "subtract N from each volume roll"),
    ("shielddrone", "shield drones intercept wounds on a 2+ (5+ feel-no-pain)"),
    ("normaldrone", "drones intercept wounds on a 2+"),
    ("overheat", "natural hit rolls of 1 wound the firer"),
];

/// A parsed modifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierSpec {
    ReRollOnes,
    ReRollFailed,
    ReRollAll,
    ReRollAllVolume,
    ReRollOneDice,
    ReRollOneDiceVolume,
    Melta,
    /// Positive for `add_N`, negative for `sub_N`.
    Threshold(i32),
    Addon {
        value: usize,
        event: BonusEvent,
        threshold: usize,
        basis: RollBasis,
    },
    Haywire,
    IgnoreAp(i32),
    IgnoreInvuln,
    Save(i32),
    Fnp(i32),
    Invuln(i32),
    HalfDamage,
    MinimumValue(i32),
    Volume(i32),
    VolumeDie(usize),
    ShieldDrone,
    NormalDrone,
    Overheat,
}

impl ModifierSpec {
    #[must_use]
    pub fn build(self) -> Box<dyn Modifier> {
        match self {
            Self::ReRollOnes => Box::new(ReRollOnes),
            Self::ReRollFailed => Box::new(ReRollFailed),
            Self::ReRollAll => Box::new(ReRollAll),
            Self::ReRollAllVolume => Box::new(ReRollLessThanExpected),
            Self::ReRollOneDice => Box::new(ModReRollOneDice),
            Self::ReRollOneDiceVolume => Box::new(ReRollOneDiceVolume),
            Self::Melta => Box::new(Melta),
            Self::Threshold(n) => Box::new(AddNToThreshold::new(n)),
            Self::Addon {
                value,
                event,
                threshold,
                basis,
            } => Box::new(ExplodingDice::new(event, basis, threshold, value)),
            Self::Haywire => Box::new(Haywire),
            Self::IgnoreAp(n) => Box::new(IgnoreAp::new(n)),
            Self::IgnoreInvuln => Box::new(IgnoreInvuln),
            // The feel-no-pain stage reads its threshold through the save hook.
            Self::Save(n) | Self::Fnp(n) => Box::new(AddNToSave::new(n)),
            Self::Invuln(n) => Box::new(AddNToInvuln::new(n)),
            Self::HalfDamage => Box::new(HalfDamage),
            Self::MinimumValue(n) => Box::new(MinimumValue::new(n)),
            Self::Volume(n) => Box::new(AddNToVolume::new(n)),
            Self::VolumeDie(faces) => Box::new(AddDie::new(faces)),
            Self::ShieldDrone => Box::new(SaviourProtocol::shield_drone()),
            Self::NormalDrone => Box::new(SaviourProtocol::normal_drone()),
            Self::Overheat => Box::new(Overheat),
        }
    }
}

fn signed(f: &mut fmt::Formatter<'_>, add: &str, sub: &str, n: i32) -> fmt::Result {
    if n < 0 {
        write!(f, "{sub}_{}", n.unsigned_abs())
    } else {
        write!(f, "{add}_{n}")
    }
}

impl fmt::Display for ModifierSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ReRollOnes => f.write_str("reroll_ones"),
            Self::ReRollFailed => f.write_str("reroll_failed"),
            Self::ReRollAll => f.write_str("reroll_all"),
            Self::ReRollAllVolume => f.write_str("reroll_allvol"),
            Self::ReRollOneDice => f.write_str("reroll_one_dice"),
            Self::ReRollOneDiceVolume => f.write_str("reroll_one_dicevol"),
            Self::Melta => f.write_str("reroll_melta"),
            Self::Threshold(n) => signed(f, "add", "sub", n),
            Self::Addon {
                value,
                event,
                threshold,
                basis,
            } => {
                let kind = match event {
                    BonusEvent::ExtraHit => "hits",
                    BonusEvent::ExtraShot => "shots",
                    BonusEvent::ExtraWound => "wounds",
                    BonusEvent::MortalWound => "mw",
                };
                let suffix = if basis == RollBasis::Modified { "_mod" } else { "" };
                write!(f, "addon_{value}_{kind}_{threshold}{suffix}")
            }
            Self::Haywire => f.write_str("haywire"),
            Self::IgnoreAp(n) => write!(f, "ignoreap_{n}"),
            Self::IgnoreInvuln => f.write_str("ignoreinv"),
            Self::Save(n) => signed(f, "saveadd", "savesub", n),
            Self::Fnp(n) => signed(f, "fnpadd", "fnpsub", n),
            Self::Invuln(n) => signed(f, "invadd", "invsub", n),
            Self::HalfDamage => f.write_str("halfdam"),
            Self::MinimumValue(n) => write!(f, "minval_{n}"),
            Self::Volume(n) => signed(f, "addvol", "subvol", n),
            Self::VolumeDie(faces) => write!(f, "addvol_d{faces}"),
            Self::ShieldDrone => f.write_str("shielddrone"),
            Self::NormalDrone => f.write_str("normaldrone"),
            Self::Overheat => f.write_str("overheat"),
        }
    }
}

/// Outcome of lenient parsing: accepted modifiers plus every rejected token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModifiers {
    pub modifiers: Vec<ModifierSpec>,
    pub rejected: Vec<String>,
}

impl ParsedModifiers {
    #[must_use]
    pub fn build(&self) -> Vec<Box<dyn Modifier>> {
        self.modifiers.iter().map(|spec| spec.build()).collect()
    }
}

fn token_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-z]+)_?(.+)?$").ok())
        .as_ref()
}

fn addon_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)_([a-z]+)_(\d+)(_mod)?$").ok())
        .as_ref()
}

/// Parse a single modifier token (case-insensitive, surrounding whitespace ignored).
///
/// # Errors
///
/// Returns `ParseError::InvalidModifierToken` for tokens outside the vocabulary
/// or whose numeric payload is missing or malformed.
pub fn parse_modifier(token: &str) -> Result<ModifierSpec, ParseError> {
    let invalid = || ParseError::InvalidModifierToken {
        token: token.to_string(),
    };
    let normalized = token.trim().to_ascii_lowercase();
    let caps = token_regex()
        .and_then(|re| re.captures(&normalized))
        .ok_or_else(invalid)?;
    let kind = caps.get(1).map_or("", |m| m.as_str());
    let data = caps.get(2).map(|m| m.as_str());
    let number = |data: Option<&str>| -> Result<i32, ParseError> {
        data.and_then(|raw| raw.parse::<i32>().ok())
            .filter(|&n| within_signed_limit(i64::from(n)))
            .ok_or_else(invalid)
    };

    let spec = match (kind, data) {
        ("reroll", Some("ones")) => ModifierSpec::ReRollOnes,
        ("reroll", Some("failed")) => ModifierSpec::ReRollFailed,
        ("reroll", Some("all")) => ModifierSpec::ReRollAll,
        ("reroll", Some("allvol")) => ModifierSpec::ReRollAllVolume,
        ("reroll", Some("one_dice")) => ModifierSpec::ReRollOneDice,
        ("reroll", Some("one_dicevol")) => ModifierSpec::ReRollOneDiceVolume,
        ("reroll", Some("melta")) => ModifierSpec::Melta,
        ("add", data) => ModifierSpec::Threshold(number(data)?),
        ("sub", data) => ModifierSpec::Threshold(-number(data)?),
        ("addon", Some(data)) => parse_addon(data).ok_or_else(invalid)?,
        ("haywire", _) => ModifierSpec::Haywire,
        ("ignoreap", data) => ModifierSpec::IgnoreAp(number(data)?),
        ("ignoreinv", _) => ModifierSpec::IgnoreInvuln,
        ("saveadd", data) => ModifierSpec::Save(number(data)?),
        ("savesub", data) => ModifierSpec::Save(-number(data)?),
        ("fnpadd", data) => ModifierSpec::Fnp(number(data)?),
        ("fnpsub", data) => ModifierSpec::Fnp(-number(data)?),
        ("invadd", data) => ModifierSpec::Invuln(number(data)?),
        ("invsub", data) => ModifierSpec::Invuln(-number(data)?),
        ("halfdam", _) => ModifierSpec::HalfDamage,
        ("minval", data) => ModifierSpec::MinimumValue(number(data)?),
        ("addvol", Some("d6")) => ModifierSpec::VolumeDie(6),
        ("addvol", Some("d3")) => ModifierSpec::VolumeDie(3),
        ("addvol", data) => ModifierSpec::Volume(number(data)?),
        ("subvol", data) => ModifierSpec::Volume(-number(data)?),
        ("shielddrone", _) => ModifierSpec::ShieldDrone,
        ("normaldrone", _) => ModifierSpec::NormalDrone,
        ("overheat", _) => ModifierSpec::Overheat,
        _ => return Err(invalid()),
    };
    Ok(spec)
}

fn parse_addon(data: &str) -> Option<ModifierSpec> {
    let caps = addon_regex()?.captures(data)?;
    let value = caps.get(1)?.as_str().parse().ok().filter(|&v| within_limit(v))?;
    let event = match caps.get(2)?.as_str() {
        "hits" => BonusEvent::ExtraHit,
        "shots" => BonusEvent::ExtraShot,
        "wounds" => BonusEvent::ExtraWound,
        "mw" => BonusEvent::MortalWound,
        _ => return None,
    };
    let threshold = caps.get(3)?.as_str().parse().ok().filter(|&t| within_limit(t))?;
    let basis = if caps.get(4).is_some() {
        RollBasis::Modified
    } else {
        RollBasis::Natural
    };
    Some(ModifierSpec::Addon {
        value,
        event,
        threshold,
        basis,
    })
}

/// Parse a token list, dropping (and logging) anything outside the vocabulary.
///
/// Blank tokens are skipped without being reported.
pub fn parse_modifiers<I, S>(tokens: I) -> ParsedModifiers
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedModifiers::default();
    for token in tokens {
        let token = token.as_ref();
        if token.trim().is_empty() {
            continue;
        }
        match parse_modifier(token) {
            Ok(spec) => parsed.modifiers.push(spec),
            Err(err) => {
                warn!("dropping modifier: {err}");
                parsed.rejected.push(token.to_string());
            }
        }
    }
    parsed
}

/// Parse a token list, failing on the first token outside the vocabulary.
///
/// # Errors
///
/// Returns the first `ParseError::InvalidModifierToken` encountered.
pub fn parse_modifiers_strict<I, S>(tokens: I) -> Result<Vec<ModifierSpec>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .filter(|token| !token.as_ref().trim().is_empty())
        .map(|token| parse_modifier(token.as_ref()))
        .collect()
}
