use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Spawn volume sits this far above the origin.
pub const SPAWN_HEIGHT: f32 = 3.0;
/// Vertical jitter added on top of [`SPAWN_HEIGHT`].
pub const SPAWN_HEIGHT_JITTER: f32 = 0.5;
/// Full width of the horizontal spawn jitter, centred on the origin.
pub const SPAWN_SPREAD: f32 = 1.0;
/// Particles above `origin.y + RECYCLE_HEIGHT` are sent back to the spawn volume.
pub const RECYCLE_HEIGHT: f32 = 15.0;
/// Largest per-tick rise a particle can have.
pub const MAX_RISE_PER_TICK: f32 = 0.03;
/// Upper bound on the pool size; larger requests are truncated.
pub const MAX_PARTICLES: usize = 100_000;

/// Smoke emitter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmokeParams {
    pub origin: Vec3,
    pub count: usize,
    pub seed: u64,
}

impl Default for SmokeParams {
    fn default() -> Self {
        Self {
            origin: Vec3::new(18.0, 0.0, 2.0),
            count: 200,
            seed: 0x5EED,
        }
    }
}

/// One particle record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Fixed-size pool of rising smoke particles.
///
/// Positions and velocities are stored side by side so the position slice
/// can be handed to the renderer as-is. Records are never added or removed;
/// recycling overwrites a position in place and keeps its velocity.
#[derive(Debug, Clone)]
pub struct ParticleField {
    origin: Vec3,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    rng: ChaCha8Rng,
    needs_update: bool,
    recycled_total: u64,
}

impl ParticleField {
    pub fn new(params: SmokeParams) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let count = params.count.min(MAX_PARTICLES);
        if count < params.count {
            tracing::warn!(requested = params.count, count, "smoke pool truncated");
        }
        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push(spawn_point(&mut rng, params.origin));
            velocities.push(drift_velocity(&mut rng));
        }
        tracing::debug!(
            count,
            origin = ?params.origin,
            "smoke field initialised"
        );
        Self {
            origin: params.origin,
            positions,
            velocities,
            rng,
            needs_update: count > 0,
            recycled_total: 0,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Read-only snapshot of every particle position, in pool order.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn particles(&self) -> impl Iterator<Item = Particle> + '_ {
        self.positions
            .iter()
            .zip(&self.velocities)
            .map(|(&position, &velocity)| Particle { position, velocity })
    }

    /// Height above which a particle is recycled.
    pub fn ceiling(&self) -> f32 {
        self.origin.y + RECYCLE_HEIGHT
    }

    /// Positions changed since the renderer last consumed them.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called by the renderer after uploading [`Self::positions`].
    pub fn mark_uploaded(&mut self) {
        self.needs_update = false;
    }

    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Lowest and highest particle height, if the pool is non-empty.
    pub fn height_range(&self) -> Option<(f32, f32)> {
        self.positions.iter().fold(None, |acc, p| match acc {
            None => Some((p.y, p.y)),
            Some((lo, hi)) => Some((lo.min(p.y), hi.max(p.y))),
        })
    }

    /// Advance every particle by one fixed step. Not scaled by frame time.
    ///
    /// Returns how many particles were recycled this tick.
    pub fn tick(&mut self) -> usize {
        let ceiling = self.ceiling();
        let mut recycled = 0;
        for (pos, vel) in self.positions.iter_mut().zip(&self.velocities) {
            *pos += *vel;
            if pos.y > ceiling {
                *pos = spawn_point(&mut self.rng, self.origin);
                recycled += 1;
            }
        }
        if !self.positions.is_empty() {
            self.needs_update = true;
        }
        self.recycled_total += recycled as u64;
        if recycled > 0 {
            tracing::trace!(recycled, "smoke particles recycled");
        }
        recycled
    }
}

/// A point in the spawn volume above `origin`.
fn spawn_point(rng: &mut impl Rng, origin: Vec3) -> Vec3 {
    Vec3::new(
        origin.x + rng.gen_range(0.0..1.0) * SPAWN_SPREAD - SPAWN_SPREAD * 0.5,
        origin.y + SPAWN_HEIGHT + rng.gen_range(0.0..1.0) * SPAWN_HEIGHT_JITTER,
        origin.z + rng.gen_range(0.0..1.0) * SPAWN_SPREAD - SPAWN_SPREAD * 0.5,
    )
}

/// Per-particle drift: mostly rightward-leaning x jitter, always rising,
/// z drifting towards +Z.
fn drift_velocity(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        (rng.gen_range(0.0..1.0) - 0.05) * 0.01,
        rng.gen_range(0.0..1.0) * 0.01 + 0.02,
        rng.gen_range(0.0..1.0) * -0.03 + 0.03,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> ParticleField {
        ParticleField::new(SmokeParams::default())
    }

    #[test]
    fn pool_has_requested_size() {
        assert_eq!(field().len(), 200);
        let small = ParticleField::new(SmokeParams {
            count: 7,
            ..SmokeParams::default()
        });
        assert_eq!(small.len(), 7);
    }

    #[test]
    fn oversized_pool_is_truncated() {
        let f = ParticleField::new(SmokeParams {
            count: MAX_PARTICLES + 5,
            ..SmokeParams::default()
        });
        assert_eq!(f.len(), MAX_PARTICLES);
    }

    #[test]
    fn particles_pair_position_with_velocity() {
        let f = field();
        let records: Vec<Particle> = f.particles().collect();
        assert_eq!(records.len(), f.len());
        assert_eq!(records[3].position, f.positions()[3]);
        assert_eq!(records[3].velocity, f.velocities()[3]);
    }

    #[test]
    fn initial_positions_in_spawn_volume() {
        let f = field();
        let o = f.origin();
        for p in f.positions() {
            assert!((p.x - o.x).abs() <= 0.5);
            assert!((p.z - o.z).abs() <= 0.5);
            assert!(p.y >= o.y + 3.0 && p.y <= o.y + 3.5);
        }
    }

    #[test]
    fn velocity_distributions() {
        let f = field();
        for v in f.velocities() {
            assert!(v.x >= -0.0005 && v.x <= 0.0095);
            assert!(v.y >= 0.02 && v.y <= 0.03);
            assert!(v.z >= 0.0 && v.z <= 0.03);
        }
    }

    #[test]
    fn tick_advects_by_velocity() {
        let mut f = field();
        let before = f.positions().to_vec();
        f.tick();
        for ((b, a), v) in before.iter().zip(f.positions()).zip(f.velocities()) {
            assert!((*a - (*b + *v)).length() < 1e-6);
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = field();
        let b = field();
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
    }

    #[test]
    fn recycled_particles_land_in_spawn_band_same_tick() {
        let mut f = field();
        let o = f.origin();
        for _ in 0..2000 {
            let before = f.positions().to_vec();
            f.tick();
            for ((b, a), v) in before.iter().zip(f.positions()).zip(f.velocities()) {
                if b.y + v.y > o.y + RECYCLE_HEIGHT {
                    assert!(a.y >= o.y + 3.0 && a.y <= o.y + 3.5);
                    assert!((a.x - o.x).abs() <= 0.5);
                    assert!((a.z - o.z).abs() <= 0.5);
                }
            }
        }
        assert!(f.recycled_total() > 0);
    }

    #[test]
    fn recycle_keeps_velocity() {
        let mut f = field();
        let velocities = f.velocities().to_vec();
        for _ in 0..1500 {
            f.tick();
        }
        assert!(f.recycled_total() > 0);
        assert_eq!(f.velocities(), velocities.as_slice());
    }

    #[test]
    fn scenario_thousand_ticks_never_exceeds_ceiling() {
        let mut f = ParticleField::new(SmokeParams {
            origin: Vec3::new(18.0, 0.0, 2.0),
            count: 200,
            seed: 1,
        });
        let bound = f.origin().y + RECYCLE_HEIGHT + MAX_RISE_PER_TICK;
        for _ in 0..1000 {
            f.tick();
            assert_eq!(f.len(), 200);
            for p in f.positions() {
                assert!(p.y <= bound);
            }
        }
    }

    #[test]
    fn pool_length_is_invariant() {
        let mut f = field();
        for _ in 0..10_000 {
            f.tick();
        }
        assert_eq!(f.len(), 200);
        assert_eq!(f.velocities().len(), 200);
    }

    #[test]
    fn dirty_flag_raised_every_tick() {
        let mut f = field();
        assert!(f.needs_update());
        f.mark_uploaded();
        assert!(!f.needs_update());
        f.tick();
        assert!(f.needs_update());
        f.mark_uploaded();
        f.tick();
        assert!(f.needs_update());
    }

    #[test]
    fn empty_field_stays_clean() {
        let mut f = ParticleField::new(SmokeParams {
            count: 0,
            ..SmokeParams::default()
        });
        assert!(f.is_empty());
        assert_eq!(f.tick(), 0);
        assert!(!f.needs_update());
        assert_eq!(f.height_range(), None);
    }

    #[test]
    fn height_range_brackets_all_particles() {
        let f = field();
        let (lo, hi) = f.height_range().unwrap();
        assert!(lo <= hi);
        assert!(f.positions().iter().all(|p| p.y >= lo && p.y <= hi));
    }
}
