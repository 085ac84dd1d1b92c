use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

use mathhammer_engine::{Pmf, ProfileReport};

/// Probabilities worth printing in the console and markdown tables.
const REPORT_FLOOR: f64 = 1e-4;

#[derive(Serialize)]
struct JsonProfile<'a> {
    name: &'a str,
    mean: f64,
    std: f64,
    cumulative: &'a [f64],
    damage: &'a Pmf,
    drone_wound: &'a Pmf,
    self_wound: &'a Pmf,
    rejected: &'a [String],
    weapons: Vec<JsonWeapon<'a>>,
}

#[derive(Serialize)]
struct JsonWeapon<'a> {
    name: &'a str,
    mean_damage: f64,
    mean_mortal: f64,
    damage: &'a Pmf,
    mortal: &'a Pmf,
}

fn json_profile(report: &ProfileReport) -> JsonProfile<'_> {
    let results = &report.results;
    JsonProfile {
        name: &results.name,
        mean: report.summary.mean,
        std: report.summary.std,
        cumulative: &report.summary.cumulative,
        damage: &results.damage,
        drone_wound: &results.drone_wound,
        self_wound: &results.self_wound,
        rejected: &results.rejected,
        weapons: results
            .weapons
            .iter()
            .map(|weapon| JsonWeapon {
                name: &weapon.name,
                mean_damage: weapon.results.damage.mean(),
                mean_mortal: weapon.results.mortal.mean(),
                damage: &weapon.results.damage,
                mortal: &weapon.results.mortal,
            })
            .collect(),
    }
}

pub fn generate_json_report<W: Write>(writer: &mut W, reports: &[ProfileReport]) -> Result<()> {
    let profiles: Vec<JsonProfile<'_>> = reports.iter().map(json_profile).collect();
    serde_json::to_writer_pretty(&mut *writer, &profiles)?;
    writeln!(writer)?;
    Ok(())
}

fn bar(probability: f64) -> String {
    let width = (probability * 40.0).round().clamp(0.0, 40.0);
    // 0..=40
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = width as usize;
    "█".repeat(width)
}

pub fn generate_console_report<W: Write>(
    writer: &mut W,
    reports: &[ProfileReport],
    verbose: bool,
) -> Result<()> {
    if reports.is_empty() {
        writeln!(writer, "No enabled profiles.")?;
        return Ok(());
    }
    for report in reports {
        let results = &report.results;
        let summary = &report.summary;
        writeln!(writer)?;
        writeln!(writer, "{}", format!("🎲 {}", results.name).bright_cyan().bold())?;
        writeln!(writer, "{}", "=".repeat(30).cyan())?;
        writeln!(
            writer,
            "Mean damage: {}  (σ {:.3})",
            format!("{:.3}", summary.mean).green(),
            summary.std
        )?;
        writeln!(
            writer,
            "50% of the time: {}+   90% of the time: {}+",
            summary.reached_with(0.5),
            summary.reached_with(0.9)
        )?;
        if results.drone_wound.mean() > 0.0 {
            writeln!(writer, "Drone wounds: {:.3}", results.drone_wound.mean())?;
        }
        if results.self_wound.mean() > 0.0 {
            writeln!(writer, "Self wounds: {}", format!("{:.3}", results.self_wound.mean()).red())?;
        }

        for weapon in &results.weapons {
            writeln!(
                writer,
                "  {} {:.3} damage, {:.3} mortal",
                weapon.name.bold(),
                weapon.results.damage.mean(),
                weapon.results.mortal.mean()
            )?;
            if verbose {
                let stages = &weapon.results.stages;
                writeln!(
                    writer,
                    "     shots {:.3} → hits {:.3} → wounds {:.3} → unsaved {:.3}",
                    stages.shots.mean(),
                    stages.hits.mean(),
                    stages.wounds.mean(),
                    stages.penetrating.mean()
                )?;
            }
        }

        writeln!(writer, "{}", "P(damage ≥ n)".yellow())?;
        for (value, probability) in summary.cumulative.iter().enumerate().skip(1) {
            if *probability < REPORT_FLOOR {
                continue;
            }
            writeln!(
                writer,
                "  {value:>3} {:>6.2}% {}",
                probability * 100.0,
                bar(*probability)
            )?;
        }
    }
    Ok(())
}

pub fn generate_markdown_report<W: Write>(writer: &mut W, reports: &[ProfileReport]) -> Result<()> {
    writeln!(writer, "# Damage Report\n")?;
    if reports.is_empty() {
        writeln!(writer, "_No enabled profiles._")?;
        return Ok(());
    }
    for report in reports {
        let results = &report.results;
        writeln!(writer, "## {}\n", results.name)?;
        writeln!(writer, "- **Mean damage**: {:.3}", report.summary.mean)?;
        writeln!(writer, "- **Standard deviation**: {:.3}", report.summary.std)?;
        for weapon in &results.weapons {
            writeln!(
                writer,
                "- **{}**: {:.3} damage, {:.3} mortal",
                weapon.name,
                weapon.results.damage.mean(),
                weapon.results.mortal.mean()
            )?;
        }
        if !results.rejected.is_empty() {
            writeln!(writer, "- **Ignored modifiers**: {}", results.rejected.join(", "))?;
        }
        writeln!(writer)?;
        writeln!(writer, "| Damage | P(= n) | P(≥ n) |")?;
        writeln!(writer, "|---:|---:|---:|")?;
        for (value, at_least) in report.summary.cumulative.iter().enumerate() {
            writeln!(
                writer,
                "| {value} | {:.4} | {at_least:.4} |",
                results.damage.get(value)
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_csv_report<W: Write>(writer: &mut W, reports: &[ProfileReport]) -> Result<()> {
    writeln!(writer, "profile,damage,probability,at_least")?;
    for report in reports {
        let name = report.results.name.replace(',', " ");
        let cumulative = report.results.damage.cumulative();
        for (value, probability) in report.results.damage.values().iter().enumerate() {
            writeln!(
                writer,
                "{name},{value},{probability:.6},{:.6}",
                cumulative.get(value)
            )?;
        }
    }
    Ok(())
}
