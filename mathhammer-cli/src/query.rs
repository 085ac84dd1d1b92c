//! Decode form state shared as a URL query string.
//!
//! Keys carry a profile index and, for weapon fields, a weapon index:
//! `toughness_1=4`, `shots_1_2=2d6`. The short forms (`t_1`, `sh_1_2`) are
//! accepted too; both map onto the field aliases of the engine's input types.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use log::warn;
use regex::Regex;
use serde_json::{Map, Value};

use mathhammer_engine::ProfileSet;

fn key_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<input_name>[^_]+)_(?P<tab>\d+)(_(?P<weapon>\d+))?$").ok()
    })
    .as_ref()
}

/// Percent-decode a query component, treating `+` as a space.
fn decode(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    let decoded = urlencoding::decode(&spaced)
        .with_context(|| format!("query component `{raw}` is not valid UTF-8"))?;
    Ok(decoded.into_owned())
}

#[derive(Default)]
struct TabFields {
    fields: Map<String, Value>,
    weapons: BTreeMap<u32, Map<String, Value>>,
}

/// Build a profile set from a query string.
///
/// Profiles and weapons come out ordered by index. Keys without an index are ignored.
pub fn parse_query(raw: &str) -> Result<ProfileSet> {
    let re = key_regex().context("query key pattern failed to compile")?;
    let raw = raw.trim_start_matches('?');
    let mut tabs: BTreeMap<u32, TabFields> = BTreeMap::new();

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(key)?.to_ascii_lowercase();
        let Some(caps) = re.captures(&key) else {
            warn!("ignoring query key without a profile index: {key}");
            continue;
        };
        let name = caps.name("input_name").map_or("", |m| m.as_str()).to_string();
        let tab: u32 = caps
            .name("tab")
            .map_or("", |m| m.as_str())
            .parse()
            .with_context(|| format!("profile index out of range in `{key}`"))?;
        let entry = tabs.entry(tab).or_default();
        let value = Value::String(decode(value)?);
        match caps.name("weapon") {
            Some(weapon) => {
                let weapon: u32 = weapon
                    .as_str()
                    .parse()
                    .with_context(|| format!("weapon index out of range in `{key}`"))?;
                entry.weapons.entry(weapon).or_default().insert(name, value);
            }
            None => {
                entry.fields.insert(name, value);
            }
        }
    }

    let profiles: Vec<Value> = tabs
        .into_iter()
        .map(|(index, tab)| {
            let mut fields = tab.fields;
            let has_name = ["name", "tabname", "tn"]
                .iter()
                .any(|key| fields.contains_key(*key));
            if !has_name {
                fields.insert("name".to_string(), Value::String(format!("Profile {index}")));
            }
            let weapons = tab.weapons.into_values().map(Value::Object).collect();
            fields.insert("weapons".to_string(), Value::Array(weapons));
            Value::Object(fields)
        })
        .collect();

    let mut root = Map::new();
    root.insert("profiles".to_string(), Value::Array(profiles));
    serde_json::from_value(Value::Object(root))
        .context("query string does not describe valid profiles")
}
