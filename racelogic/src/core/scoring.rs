use crate::core::competitor::Competitor;
use crate::core::tireset::{tyre_deg_factor, Compound};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// calc_score maps the current state of a competitor onto the ranking score.
///
/// * `actual = cur_laptime > 0 ? cur_laptime : ideal * 1.1`
/// * `efficiency = ideal / actual / (1 + (tyre_age / 30)^2 * 0.5)`
/// * `weather_bonus = weather > 0.5 ? 1 + wet_skill * 0.2 : 1`
/// * `aggression = 0.1 * overtake_potential` with `overtake_potential = 10 * difficulty`, scaled
///   by 0.8 on softs and 1.3 on hards, plus 0.5 for tyres older than 20 laps
/// * `consistency_bonus = 3` if the last two lap times differ by less than 0.1 s
///
/// `score = efficiency * 100 * weather_bonus + aggression + consistency_bonus`
pub fn calc_score(competitor: &Competitor, ideal_laptime: f64, weather: f64, track_difficulty: f64) -> f64 {
    // speed efficiency
    let actual_laptime = if competitor.cur_laptime() > 0.0 {
        competitor.cur_laptime()
    } else {
        ideal_laptime * 1.1
    };
    let speed_efficiency = ideal_laptime / actual_laptime;

    // tyre degradation
    let adjusted_efficiency = speed_efficiency / tyre_deg_factor(competitor.tyre_age(), 0.5);

    // weather skill
    let weather_bonus = if weather > 0.5 {
        1.0 + competitor.wet_skill() * 0.2
    } else {
        1.0
    };

    // overtaking
    let mut overtake_potential = 10.0 * track_difficulty;
    match competitor.compound() {
        Compound::Soft => overtake_potential *= 0.8,
        Compound::Hard => overtake_potential *= 1.3,
        _ => {}
    }
    if competitor.tyre_age() > 20 {
        overtake_potential += 0.5;
    }
    let aggression_score = overtake_potential * 0.1;

    let consistency_bonus = if (competitor.cur_laptime() - competitor.last_laptime()).abs() < 0.1 {
        3.0
    } else {
        0.0
    };

    adjusted_efficiency * 100.0 * weather_bonus + aggression_score + consistency_bonus
}

/// simulate_laptime creates a synthetic lap time for a competitor without a recorded lap.
///
/// * `variance` - uniform in [0, 1 - consistency)
/// * `weather_impact` - weather * (1 - wet_skill) * 5 s
/// * `tyre impact` - ideal * (1 + (tyre_age / 30)^2 * 0.1)
pub fn simulate_laptime<R: Rng + ?Sized>(
    competitor: &Competitor,
    ideal_laptime: f64,
    weather: f64,
    rng: &mut R,
) -> f64 {
    let variance = (1.0 - competitor.consistency()) * Uniform::new(0.0, 1.0).sample(rng);
    let weather_impact = weather * (1.0 - competitor.wet_skill()) * 5.0;

    ideal_laptime * tyre_deg_factor(competitor.tyre_age(), 0.1) + weather_impact + variance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::competitor::CompetitorPars;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn competitor() -> Competitor {
        let mut pars = CompetitorPars::new("LEC", "Charles Leclerc", "Ferrari");
        pars.consistency = 0.8;
        pars.wet_skill = 0.5;
        Competitor::new(&pars)
    }

    #[test]
    fn single_lap_on_ideal_pace() {
        let mut c = competitor();
        c.update_laptime(90.0);
        assert_eq!(c.tyre_age(), 1);
        assert_eq!(c.no_pitstops(), 0);

        // efficiency 1.0, tyre age 1: deg factor 1 + (1 / 30)^2 * 0.5, dry, no consistency bonus
        // softs: 10 * 0.5 * 0.8 * 0.1 = 0.4
        let expected = 100.0 / (1.0 + (1.0_f64 / 30.0).powi(2) * 0.5) + 0.4;
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.0, 0.5), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.0, 0.5), 100.34, epsilon = 0.005);
    }

    #[test]
    fn first_lap_counts_one_lap_of_tyre_age() {
        let mut c = competitor();
        c.update_laptime(90.0);
        let expected = 100.0 / (1.0 + (1.0_f64 / 30.0).powi(2) * 0.5) + 0.4;
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.0, 0.5), expected, epsilon = 1e-9);
    }

    #[test]
    fn no_lap_yet_uses_slow_reference() {
        let c = competitor();
        // actual = 99 s, |0 - 0| < 0.1 -> consistency bonus
        let expected = 90.0 / 99.0 * 100.0 + 0.4 + 3.0;
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.0, 0.5), expected, epsilon = 1e-9);
    }

    #[test]
    fn consistent_laps_on_old_hards_in_the_rain() {
        let mut c = competitor();
        c.set_compound(Compound::Hard);
        for _ in 0..24 {
            c.update_laptime(100.0);
        }
        c.update_laptime(100.05);
        assert_eq!(c.tyre_age(), 25);

        let deg_factor = 1.0 + (25.0_f64 / 30.0).powi(2) * 0.5;
        let efficiency = 90.0 / 100.05 / deg_factor;
        let aggression = (10.0 * 0.4 * 1.3 + 0.5) * 0.1;
        let expected = efficiency * 100.0 * 1.1 + aggression + 3.0;
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.8, 0.4), expected, epsilon = 1e-9);
    }

    #[test]
    fn medium_tyres_keep_full_potential() {
        let mut c = competitor();
        c.set_compound(Compound::Medium);
        c.update_laptime(90.0);
        c.update_laptime(95.0);
        let deg_factor = 1.0 + (2.0_f64 / 30.0).powi(2) * 0.5;
        let expected = 90.0 / 95.0 / deg_factor * 100.0 + 1.0;
        assert_abs_diff_eq!(calc_score(&c, 90.0, 0.3, 1.0), expected, epsilon = 1e-9);
    }

    #[test]
    fn synthetic_lap_stays_in_band() {
        let c = competitor();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let t = simulate_laptime(&c, 90.0, 1.0, &mut rng);
            // 90 + 2.5 s rain + [0, 0.2) variance
            assert!(t >= 92.5 && t < 92.7, "lap time {} out of band", t);
        }
    }
}
