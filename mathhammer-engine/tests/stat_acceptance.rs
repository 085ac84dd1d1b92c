use mathhammer_engine::{
    AttackInputs, AttackResults, InputValue, Pmf, TargetInputs, TokenPolicy, WeaponInputs,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 20_000;
const TOLERANCE: f64 = 0.05;

fn d6(rng: &mut SmallRng) -> i32 {
    rng.gen_range(1..=6)
}

fn exact(inputs: AttackInputs) -> AttackResults {
    inputs.prepare(TokenPolicy::Strict).unwrap().run()
}

fn sample_mean(samples: &[usize]) -> f64 {
    let total: usize = samples.iter().sum();
    f64::from(u32::try_from(total).expect("total fits u32"))
        / f64::from(u32::try_from(samples.len()).expect("sample size fits u32"))
}

fn at_least_rate(samples: &[usize], value: usize) -> f64 {
    let hits = samples.iter().filter(|&&x| x >= value).count();
    f64::from(u32::try_from(hits).expect("count fits"))
        / f64::from(u32::try_from(samples.len()).expect("sample size fits"))
}

fn assert_matches(exact: &Pmf, samples: &[usize]) {
    let observed = sample_mean(samples);
    assert!(
        (observed - exact.mean()).abs() <= TOLERANCE * exact.mean().max(1.0),
        "mean drifted: exact {:.4}, sampled {observed:.4}",
        exact.mean()
    );
    for value in 1..exact.len() {
        let rate = at_least_rate(samples, value);
        assert!(
            (rate - exact.at_least(value)).abs() <= 0.02,
            "P(X >= {value}) drifted: exact {:.4}, sampled {rate:.4}",
            exact.at_least(value)
        );
    }
}

#[test]
fn bolters_against_marines() {
    // 10 shots, 3+ to hit, S4 vs T4, AP1 against a 3+ save, 2 wounds each, 1 damage.
    let inputs = AttackInputs {
        target: TargetInputs {
            preset: Some("MEQ".to_string()),
            ..TargetInputs::default()
        },
        weapon: WeaponInputs {
            ws: Some(InputValue::Number(3)),
            strength: Some(InputValue::Number(4)),
            ap: Some(InputValue::Number(1)),
            shots: Some(InputValue::Number(10)),
            damage: Some(InputValue::Number(1)),
            ..WeaponInputs::default()
        },
    };
    let results = exact(inputs);

    let mut rng = SmallRng::seed_from_u64(0x00C0_FFEE);
    let samples: Vec<usize> = (0..SAMPLE_SIZE)
        .map(|_| {
            let mut unsaved = 0usize;
            for _ in 0..10 {
                if d6(&mut rng) >= 3 && d6(&mut rng) >= 4 && d6(&mut rng) < 4 {
                    unsaved += 1;
                }
            }
            unsaved
        })
        .collect();
    assert_matches(&results.damage, &samples);
}

#[test]
fn re_rolled_ones_with_capped_damage() {
    // d6 shots, 4+ to hit re-rolling 1s, S8 vs T4, no save, d3 damage against 2 wounds.
    let inputs = AttackInputs {
        target: TargetInputs {
            toughness: Some(InputValue::Number(4)),
            wounds: Some(InputValue::Number(2)),
            ..TargetInputs::default()
        },
        weapon: WeaponInputs {
            ws: Some(InputValue::Number(4)),
            strength: Some(InputValue::Number(8)),
            shots: Some(InputValue::from("d6")),
            damage: Some(InputValue::from("d3")),
            hitmods: vec!["reroll_ones".to_string()],
            ..WeaponInputs::default()
        },
    };
    let results = exact(inputs);

    let mut rng = SmallRng::seed_from_u64(0xACED);
    let samples: Vec<usize> = (0..SAMPLE_SIZE)
        .map(|_| {
            let shots = d6(&mut rng);
            let mut total = 0usize;
            for _ in 0..shots {
                let mut hit = d6(&mut rng);
                if hit == 1 {
                    hit = d6(&mut rng);
                }
                if hit < 4 || d6(&mut rng) < 2 {
                    continue;
                }
                total += rng.gen_range(1..=3usize).min(2);
            }
            total
        })
        .collect();
    assert_matches(&results.damage, &samples);
}
