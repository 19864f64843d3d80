//! Diagonal bounce direction selection.
//!
//! Whenever the pointer crosses a screen edge a new 45° direction is picked:
//! - a hit wall forces its axis to point back into the screen
//! - the previous diagonal handedness (`sign(vy) / sign(vx)`) is preferred
//! - candidates turning more than ~102° away from the previous heading are
//!   rejected, unless nothing else is left

use std::f64::consts::SQRT_2;

use rand::Rng;
use tracing::trace;

use crate::domain::EdgeHits;
use crate::domain::Velocity;

/// Search rounds before giving up on the anti-reversal constraint.
const MAX_ROUNDS: usize = 16;

/// Candidates at or below this cosine to the previous heading are rejected.
const REVERSAL_COSINE_LIMIT: f64 = -0.2;

/// Previous velocities slower than this carry no direction.
const MIN_PREV_SPEED: f64 = 1e-6;

/// How far `|vx|` and `|vy|` may differ for a velocity to count as diagonal.
const DIAGONAL_TOLERANCE_RATIO: f64 = 0.05;
const DIAGONAL_TOLERANCE_PX: f64 = 1.0;

/// Pick a new diagonal velocity after hitting `hits`.
///
/// Each component of the result has magnitude `max(1, speed) / sqrt(2)`.
/// `rng` decides the free axis sign and, when `prev` carries no usable
/// handedness, which handedness is tried first.
pub fn pick_diagonal_velocity<R>(
    speed: f64,
    hits: EdgeHits,
    prev: Velocity,
    rng: &mut R,
) -> Velocity
where
    R: Rng,
{
    let comp = speed.max(1.0) / SQRT_2;
    let check_reversal = prev.magnitude() > MIN_PREV_SPEED;
    let prev_handedness = handedness(prev);
    let forced_x = hits.forced_x();
    let forced_y = hits.forced_y();

    for round in 0..MAX_ROUNDS {
        let order = match prev_handedness {
            Some(s) => [s, -s],
            None => {
                let first = random_sign(rng);
                [first, -first]
            }
        };

        for s in order {
            for (sx, sy) in candidate_signs(s, forced_x, forced_y, rng).into_iter().flatten() {
                let candidate = Velocity::new(sx * comp, sy * comp);

                if check_reversal
                    && prev
                        .cosine_similarity(candidate)
                        .is_some_and(|cos| cos <= REVERSAL_COSINE_LIMIT)
                {
                    continue;
                }

                trace!("Bounce {:?}: {:?} -> {:?} (round {})", hits, prev, candidate, round);
                return candidate;
            }
        }
    }

    // Nothing passed the reversal check: point away from every hit wall and
    // leave the rest to chance.
    let sx = forced_x.unwrap_or_else(|| random_sign(rng));
    let sy = forced_y.unwrap_or_else(|| random_sign(rng));
    let fallback = Velocity::new(sx * comp, sy * comp);
    trace!("Bounce {:?}: {:?} -> {:?} (fallback)", hits, prev, fallback);
    fallback
}

/// Handedness of a near-diagonal velocity, or `None` if it isn't one.
fn handedness(v: Velocity) -> Option<f64> {
    let speed = v.magnitude();
    if speed <= MIN_PREV_SPEED {
        return None;
    }

    let skew = (v.vx.abs() - v.vy.abs()).abs();
    if skew > DIAGONAL_TOLERANCE_PX.max(DIAGONAL_TOLERANCE_RATIO * speed) {
        return None;
    }

    Some(sign(v.vy) / sign(v.vx))
}

/// Axis sign pairs matching handedness `s` under the wall constraints.
///
/// With no wall hit both free signs are offered, in random order.
fn candidate_signs<R>(
    s: f64,
    forced_x: Option<f64>,
    forced_y: Option<f64>,
    rng: &mut R,
) -> [Option<(f64, f64)>; 2]
where
    R: Rng,
{
    match (forced_x, forced_y) {
        (None, None) => {
            let hx = random_sign(rng);
            [Some((hx, s * hx)), Some((-hx, -s * hx))]
        }
        // s is ±1, so hy / s == hy * s.
        (None, Some(hy)) => [Some((hy * s, hy)), None],
        (Some(hx), None) => [Some((hx, s * hx)), None],
        (Some(hx), Some(hy)) => {
            if (hy / hx - s).abs() > 0.1 {
                [None, None]
            } else {
                [Some((hx, hy)), None]
            }
        }
    }
}

fn sign(v: f64) -> f64 {
    if v >= 0.0 { 1.0 } else { -1.0 }
}

fn random_sign<R>(rng: &mut R) -> f64
where
    R: Rng,
{
    if rng.gen_bool(0.5) { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SEEDS: u64 = 64;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn hit(left: bool, right: bool, top: bool, bottom: bool) -> EdgeHits {
        EdgeHits {
            left,
            right,
            top,
            bottom,
        }
    }

    #[test]
    fn test_free_bounce_is_diagonal_with_expected_speed() {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            for speed in [0.25, 1.0, 150.0, 512.3] {
                let v = pick_diagonal_velocity(speed, EdgeHits::NONE, Velocity::ZERO, &mut rng);
                let comp = f64::max(1.0, speed) / SQRT_2;
                assert!(approx(v.vx.abs(), comp), "vx={} comp={}", v.vx, comp);
                assert!(approx(v.vy.abs(), comp), "vy={} comp={}", v.vy, comp);
            }
        }
    }

    #[test]
    fn test_walls_force_sign_away() {
        let prevs = [
            Velocity::ZERO,
            Velocity::new(200.0, 200.0),
            Velocity::new(-200.0, 200.0),
            Velocity::new(200.0, -200.0),
            Velocity::new(-200.0, -200.0),
            Velocity::new(300.0, 10.0),
        ];

        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            for prev in prevs {
                let v = pick_diagonal_velocity(300.0, hit(true, false, false, false), prev, &mut rng);
                assert!(v.vx > 0.0, "left hit, prev {prev:?} gave {v:?}");

                let v = pick_diagonal_velocity(300.0, hit(false, true, false, false), prev, &mut rng);
                assert!(v.vx < 0.0, "right hit, prev {prev:?} gave {v:?}");

                let v = pick_diagonal_velocity(300.0, hit(false, false, true, false), prev, &mut rng);
                assert!(v.vy > 0.0, "top hit, prev {prev:?} gave {v:?}");

                let v = pick_diagonal_velocity(300.0, hit(false, false, false, true), prev, &mut rng);
                assert!(v.vy < 0.0, "bottom hit, prev {prev:?} gave {v:?}");
            }
        }
    }

    #[test]
    fn test_corner_hit_forces_both_axes() {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            // Heading straight into the corner: every candidate is a reversal,
            // so this also exercises the fallback path.
            let prev = Velocity::new(-250.0, -250.0);
            let v = pick_diagonal_velocity(350.0, hit(true, false, true, false), prev, &mut rng);
            assert!(v.vx > 0.0 && v.vy > 0.0, "got {v:?}");

            let prev = Velocity::new(250.0, 250.0);
            let v = pick_diagonal_velocity(350.0, hit(false, true, false, true), prev, &mut rng);
            assert!(v.vx < 0.0 && v.vy < 0.0, "got {v:?}");
        }
    }

    #[test]
    fn test_free_bounce_keeps_handedness() {
        let c = 300.0 / SQRT_2;
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);

            let v = pick_diagonal_velocity(300.0, EdgeHits::NONE, Velocity::new(c, c), &mut rng);
            assert_eq!(sign(v.vx), sign(v.vy), "got {v:?}");

            let v = pick_diagonal_velocity(300.0, EdgeHits::NONE, Velocity::new(c, -c), &mut rng);
            assert_ne!(sign(v.vx), sign(v.vy), "got {v:?}");
        }
    }

    #[test]
    fn test_right_wall_does_not_reverse() {
        let prev = Velocity::new(100.0, 100.0);
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let v = pick_diagonal_velocity(150.0, hit(false, true, false, false), prev, &mut rng);
            assert!(v.vx < 0.0);
            assert!(v.vy > 0.0, "reversed into {v:?}");
            assert!(prev.cosine_similarity(v).unwrap() > REVERSAL_COSINE_LIMIT);
        }
    }

    #[test]
    fn test_without_history_both_handedness_occur() {
        let mut same = 0;
        let mut opposite = 0;
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let v = pick_diagonal_velocity(200.0, hit(true, false, false, false), Velocity::ZERO, &mut rng);
            assert!(v.vx > 0.0);
            if v.vy > 0.0 {
                same += 1;
            } else {
                opposite += 1;
            }
        }
        assert!(same > 0 && opposite > 0, "same={same} opposite={opposite}");
    }

    #[test]
    fn test_same_seed_same_bounce() {
        let prev = Velocity::new(-40.0, 3.0);
        let a = pick_diagonal_velocity(420.0, EdgeHits::NONE, prev, &mut StdRng::seed_from_u64(7));
        let b = pick_diagonal_velocity(420.0, EdgeHits::NONE, prev, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_handedness() {
        assert_eq!(handedness(Velocity::new(10.0, 10.0)), Some(1.0));
        assert_eq!(handedness(Velocity::new(-10.0, 10.0)), Some(-1.0));
        // Within 1px/s absolute tolerance.
        assert_eq!(handedness(Velocity::new(10.0, -10.9)), Some(-1.0));
        // Within 5% relative tolerance.
        assert_eq!(handedness(Velocity::new(1000.0, 1040.0)), Some(1.0));
        assert_eq!(handedness(Velocity::new(100.0, 0.0)), None);
        assert_eq!(handedness(Velocity::ZERO), None);
    }
}
