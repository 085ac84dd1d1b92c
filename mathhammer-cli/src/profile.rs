use clap::Args;

use mathhammer_engine::{InputValue, Profile, TargetInputs, WeaponInputs, split_csv};

/// Single weapon against a single target, straight from command-line flags.
#[derive(Debug, Clone, Default, Args)]
pub struct AttackArgs {
    /// Bundled target profile; explicit target flags override its values
    #[arg(long)]
    pub target: Option<String>,

    /// Weapon or ballistic skill (roll needed to hit)
    #[arg(long)]
    pub ws: Option<String>,

    #[arg(long)]
    pub strength: Option<String>,

    #[arg(long)]
    pub ap: Option<String>,

    /// Shots as an integer or NdM dice notation
    #[arg(long)]
    pub shots: Option<String>,

    /// Damage per unsaved wound as an integer or NdM dice notation
    #[arg(long)]
    pub damage: Option<String>,

    #[arg(long)]
    pub toughness: Option<String>,

    #[arg(long)]
    pub save: Option<String>,

    #[arg(long)]
    pub invuln: Option<String>,

    #[arg(long)]
    pub fnp: Option<String>,

    #[arg(long)]
    pub wounds: Option<String>,

    /// Shot modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub shot_mods: String,

    /// Hit modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub hit_mods: String,

    /// Wound modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub wound_mods: String,

    /// Save modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub save_mods: String,

    /// Feel-no-pain modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub fnp_mods: String,

    /// Damage modifiers (comma-separated)
    #[arg(long, default_value = "")]
    pub damage_mods: String,
}

fn text(value: Option<&String>) -> Option<InputValue> {
    value.map(|raw| InputValue::Text(raw.clone()))
}

impl AttackArgs {
    pub fn to_profile(&self) -> Profile {
        let target = TargetInputs {
            preset: self.target.clone(),
            toughness: text(self.toughness.as_ref()),
            save: text(self.save.as_ref()),
            invuln: text(self.invuln.as_ref()),
            fnp: text(self.fnp.as_ref()),
            wounds: text(self.wounds.as_ref()),
        };
        let weapon = WeaponInputs {
            ws: text(self.ws.as_ref()),
            strength: text(self.strength.as_ref()),
            ap: text(self.ap.as_ref()),
            shots: text(self.shots.as_ref()),
            damage: text(self.damage.as_ref()),
            shotmods: split_csv(&self.shot_mods),
            hitmods: split_csv(&self.hit_mods),
            woundmods: split_csv(&self.wound_mods),
            savemods: split_csv(&self.save_mods),
            fnpmods: split_csv(&self.fnp_mods),
            damagemods: split_csv(&self.damage_mods),
            ..WeaponInputs::default()
        };
        Profile {
            name: self.target.clone().unwrap_or_else(|| "attack".to_string()),
            target,
            weapons: vec![weapon],
            ..Profile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_inputs() {
        let args = AttackArgs {
            ws: Some("3".to_string()),
            shots: Some("d6".to_string()),
            hit_mods: "reroll_ones, add_1".to_string(),
            toughness: Some("5".to_string()),
            ..AttackArgs::default()
        };
        let profile = args.to_profile();
        assert_eq!(profile.name, "attack");
        assert!(profile.enabled);
        let weapon = &profile.weapons[0];
        assert_eq!(weapon.hitmods, vec!["reroll_ones", "add_1"]);
        assert!(weapon.savemods.is_empty());
        let unit = profile.target.to_unit().unwrap();
        assert_eq!(unit.toughness, 5);
        assert_eq!(weapon.attacker().unwrap().ws, 3);
    }
}
