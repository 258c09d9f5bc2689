// ─────────────────────────────────────────────────────────────────────
// PField — Particles
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Charged-particle model and Boris trajectory tracer.
//!
//! The tracer integrates m dv/dt = q (E + v × B), dx/dt = v with the Boris
//! scheme in the solved, trilinearly interpolated E field and the uniform
//! background B. It is a lazy iterator over trajectory samples; creating a
//! new `Tracer` from the same particle replays the identical sequence.

use crate::boundary::FieldGrid;
use crate::cancel::CancelToken;
use pfield_types::config::Units;
use pfield_types::error::{PfieldError, PfieldResult};
use pfield_types::species::{ParticleKind, ParticleRecord};

/// Single charged particle in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub id: usize,
    pub kind: ParticleKind,
    /// Position (m).
    pub position: [f64; 3],
    /// Velocity (m/s).
    pub velocity: [f64; 3],
}

impl Particle {
    pub fn new(id: usize, kind: ParticleKind, position: [f64; 3], velocity: [f64; 3]) -> Self {
        Particle {
            id,
            kind,
            position,
            velocity,
        }
    }

    /// Particle launched with kinetic energy `energy_j` along `direction`.
    /// The direction is normalized; a zero vector gives a particle at rest.
    pub fn from_energy(
        id: usize,
        kind: ParticleKind,
        position: [f64; 3],
        energy_j: f64,
        direction: [f64; 3],
    ) -> PfieldResult<Self> {
        if !energy_j.is_finite() || energy_j < 0.0 {
            return Err(PfieldError::ConfigError(format!(
                "particle {id}: energy must be finite and >= 0, got {energy_j}"
            )));
        }
        if direction.iter().any(|c| !c.is_finite()) {
            return Err(PfieldError::ConfigError(format!(
                "particle {id}: direction components must be finite"
            )));
        }
        let speed = (2.0 * energy_j / kind.mass_kg()).sqrt();
        let norm = dot(direction, direction).sqrt();
        let velocity = if norm > 0.0 {
            direction.map(|c| speed * c / norm)
        } else {
            [0.0; 3]
        };
        let particle = Particle::new(id, kind, position, velocity);
        validate_particle_state(&particle)?;
        Ok(particle)
    }

    /// Convert one particle-file entry, given in `units`, to SI.
    pub fn from_record(id: usize, record: &ParticleRecord, units: Units) -> PfieldResult<Self> {
        let kind = record.kind()?;
        let s = units.length.to_metres();
        Particle::from_energy(
            id,
            kind,
            [record.x * s, record.y * s, record.z * s],
            record.energy * units.energy.to_joules(),
            [record.ux, record.uy, record.uz],
        )
    }

    pub fn mass_kg(&self) -> f64 {
        self.kind.mass_kg()
    }

    pub fn charge_c(&self) -> f64 {
        self.kind.charge_c()
    }

    pub fn speed(&self) -> f64 {
        dot(self.velocity, self.velocity).sqrt()
    }

    pub fn kinetic_energy_j(&self) -> f64 {
        0.5 * self.mass_kg() * dot(self.velocity, self.velocity)
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn is_finite3(v: [f64; 3]) -> bool {
    v.iter().all(|c| c.is_finite())
}

fn validate_particle_state(particle: &Particle) -> PfieldResult<()> {
    let id = particle.id;
    if !is_finite3(particle.position) {
        return Err(PfieldError::ConfigError(format!(
            "particle {id}: position components must be finite"
        )));
    }
    if !is_finite3(particle.velocity) {
        return Err(PfieldError::ConfigError(format!(
            "particle {id}: velocity components must be finite"
        )));
    }
    let mass = particle.mass_kg();
    if !mass.is_finite() || mass <= 0.0 {
        return Err(PfieldError::ConfigError(format!(
            "particle {id}: mass must be finite and > 0"
        )));
    }
    if !particle.charge_c().is_finite() {
        return Err(PfieldError::ConfigError(format!(
            "particle {id}: charge must be finite"
        )));
    }
    Ok(())
}

/// Advance one particle by `dt_s` with the Boris push: half electric
/// kick, magnetic rotation, half electric kick, then drift.
pub fn boris_push_step(
    particle: &mut Particle,
    electric_v_m: [f64; 3],
    magnetic_t: [f64; 3],
    dt_s: f64,
) {
    let qmdt2 = particle.charge_c() * dt_s / (2.0 * particle.mass_kg());
    let v = particle.velocity;
    let v_minus = [
        v[0] + qmdt2 * electric_v_m[0],
        v[1] + qmdt2 * electric_v_m[1],
        v[2] + qmdt2 * electric_v_m[2],
    ];

    let t = magnetic_t.map(|b| qmdt2 * b);
    let t2 = dot(t, t);
    let s = t.map(|c| 2.0 * c / (1.0 + t2));

    let v_prime = {
        let c = cross(v_minus, t);
        [v_minus[0] + c[0], v_minus[1] + c[1], v_minus[2] + c[2]]
    };
    let v_plus = {
        let c = cross(v_prime, s);
        [v_minus[0] + c[0], v_minus[1] + c[1], v_minus[2] + c[2]]
    };

    let v_new = [
        v_plus[0] + qmdt2 * electric_v_m[0],
        v_plus[1] + qmdt2 * electric_v_m[1],
        v_plus[2] + qmdt2 * electric_v_m[2],
    ];

    particle.velocity = v_new;
    particle.position = [
        particle.position[0] + v_new[0] * dt_s,
        particle.position[1] + v_new[1] * dt_s,
        particle.position[2] + v_new[2] * dt_s,
    ];
}

/// Why a trajectory ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceStatus {
    /// Left the domain box.
    Exited,
    /// Entered an electrode cell.
    Absorbed,
    /// Reached the step cap while still inside.
    Truncated,
    Cancelled,
}

impl TraceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceStatus::Exited => "exited",
            TraceStatus::Absorbed => "absorbed",
            TraceStatus::Truncated => "truncated",
            TraceStatus::Cancelled => "cancelled",
        }
    }
}

/// One point of a trajectory: time (s), position (m), velocity (m/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub t: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub particle_id: usize,
    pub samples: Vec<TrajectorySample>,
    pub status: TraceStatus,
}

impl Trajectory {
    /// Steps taken (samples after the initial one).
    pub fn steps(&self) -> usize {
        self.samples.len().saturating_sub(1)
    }

    pub fn final_sample(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }
}

/// Lazy Boris trace of one particle through a solved field.
///
/// Yields the initial state at t = 0, then one sample per step. The
/// sample that leaves the domain or lands in an electrode cell is the
/// last one; `status()` then reports why. A particle that starts outside
/// or inside an electrode yields only its initial sample.
pub struct Tracer<'a> {
    field: &'a FieldGrid,
    particle: Particle,
    dt: f64,
    max_steps: usize,
    step: usize,
    started: bool,
    done: bool,
    status: Option<TraceStatus>,
    cancel: CancelToken,
}

impl<'a> Tracer<'a> {
    pub fn new(
        particle: Particle,
        field: &'a FieldGrid,
        dt: f64,
        max_steps: usize,
    ) -> PfieldResult<Self> {
        Self::with_cancel(particle, field, dt, max_steps, CancelToken::new())
    }

    pub fn with_cancel(
        particle: Particle,
        field: &'a FieldGrid,
        dt: f64,
        max_steps: usize,
        cancel: CancelToken,
    ) -> PfieldResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PfieldError::ConfigError(format!(
                "dt must be finite and > 0, got {dt}"
            )));
        }
        validate_particle_state(&particle)?;
        Ok(Tracer {
            field,
            particle,
            dt,
            max_steps,
            step: 0,
            started: false,
            done: false,
            status: None,
            cancel,
        })
    }

    /// Termination reason once the iterator is exhausted.
    pub fn status(&self) -> Option<TraceStatus> {
        self.status
    }

    pub fn particle(&self) -> &Particle {
        &self.particle
    }

    fn sample(&self) -> TrajectorySample {
        TrajectorySample {
            t: self.step as f64 * self.dt,
            position: self.particle.position,
            velocity: self.particle.velocity,
        }
    }

    /// Classify the current position; ends the trace on exit or absorption.
    fn classify(&mut self) {
        let p = self.particle.position;
        if !self.field.contains(p) {
            self.finish(TraceStatus::Exited);
        } else if self.field.is_fixed_at(p) {
            self.finish(TraceStatus::Absorbed);
        }
    }

    fn finish(&mut self, status: TraceStatus) {
        self.status = Some(status);
        self.done = true;
    }
}

impl Iterator for Tracer<'_> {
    type Item = PfieldResult<TrajectorySample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.classify();
            return Some(Ok(self.sample()));
        }
        if self.cancel.is_cancelled() {
            self.finish(TraceStatus::Cancelled);
            return None;
        }
        if self.step >= self.max_steps {
            self.finish(TraceStatus::Truncated);
            return None;
        }

        let e = self.field.e_field_at(self.particle.position);
        boris_push_step(&mut self.particle, e, self.field.b_field, self.dt);
        self.step += 1;

        if !is_finite3(self.particle.position) || !is_finite3(self.particle.velocity) {
            self.done = true;
            return Some(Err(PfieldError::NonFiniteParticle {
                particle: self.particle.id,
                step: self.step,
            }));
        }

        self.classify();
        Some(Ok(self.sample()))
    }
}

/// Trace `particle` to completion.
pub fn trace(
    particle: Particle,
    field: &FieldGrid,
    dt: f64,
    max_steps: usize,
) -> PfieldResult<Trajectory> {
    trace_with(particle, field, dt, max_steps, CancelToken::new())
}

/// Trace with a cancellation flag; a cancelled trace keeps the samples
/// produced so far.
pub fn trace_with(
    particle: Particle,
    field: &FieldGrid,
    dt: f64,
    max_steps: usize,
    cancel: CancelToken,
) -> PfieldResult<Trajectory> {
    let mut tracer = Tracer::with_cancel(particle, field, dt, max_steps, cancel)?;
    let mut samples = Vec::with_capacity(max_steps.min(4096) + 1);
    for sample in tracer.by_ref() {
        samples.push(sample?);
    }
    Ok(Trajectory {
        particle_id: particle.id,
        samples,
        status: tracer.status().unwrap_or(TraceStatus::Truncated),
    })
}

/// Exponentially weighted beam energies between `low` and `high`.
///
/// E_i = low + (high - low) (r_i - r_last) / (1 - r_last) with
/// r_i = exp(-10 i / ((n - 1) steep)). The first entry is `high`, the last
/// is `low`, and smaller `steep` packs more entries near `low`.
pub fn seed_energy_ladder(low: f64, high: f64, n: usize, steep: f64) -> PfieldResult<Vec<f64>> {
    if n == 0 {
        return Err(PfieldError::ConfigError("n must be >= 1".to_string()));
    }
    if !low.is_finite() || !high.is_finite() || low < 0.0 || high < low {
        return Err(PfieldError::ConfigError(format!(
            "energy range must satisfy 0 <= low <= high, got [{low}, {high}]"
        )));
    }
    if !steep.is_finite() || steep <= 0.0 {
        return Err(PfieldError::ConfigError(format!(
            "steep must be finite and > 0, got {steep}"
        )));
    }
    if n == 1 {
        return Ok(vec![high]);
    }

    let raw: Vec<f64> = (0..n)
        .map(|i| (-10.0 * i as f64 / ((n - 1) as f64 * steep)).exp())
        .collect();
    let last = raw[n - 1];
    let denom = 1.0 - last;
    if !(denom.is_finite() && denom > 0.0) {
        return Err(PfieldError::ConfigError(format!(
            "energy ladder is degenerate for n = {n}, steep = {steep}"
        )));
    }
    let span = high - low;
    Ok(raw
        .iter()
        .enumerate()
        .map(|(i, &r)| match i {
            0 => high,
            _ if i == n - 1 => low,
            _ => low + span * (r - last) / denom,
        })
        .collect())
}

/// `n` particles of one kind sharing a start point and direction, with
/// energies from `seed_energy_ladder`. Ids count up from `first_id`.
#[allow(clippy::too_many_arguments)]
pub fn seed_beam(
    first_id: usize,
    kind: ParticleKind,
    position: [f64; 3],
    direction: [f64; 3],
    low_j: f64,
    high_j: f64,
    n: usize,
    steep: f64,
) -> PfieldResult<Vec<Particle>> {
    seed_energy_ladder(low_j, high_j, n, steep)?
        .into_iter()
        .enumerate()
        .map(|(i, energy)| Particle::from_energy(first_id + i, kind, position, energy, direction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::build_grid_si;
    use pfield_types::constants::{KEV_TO_J, M_H, Q_E};
    use pfield_types::geometry::Electrode;
    use pfield_types::species::Species;
    use pfield_types::state::Grid3D;

    fn proton() -> ParticleKind {
        ParticleKind::Standard(Species::Proton)
    }

    fn empty_field(b: [f64; 3]) -> FieldGrid {
        build_grid_si(Grid3D::new(8, 8, 8, 1.0, 1.0, 1.0), &[], b).unwrap()
    }

    #[test]
    fn test_from_energy_sets_speed_and_direction() {
        let e = 1.0 * KEV_TO_J;
        let p = Particle::from_energy(0, proton(), [0.5; 3], e, [3.0, 4.0, 0.0]).unwrap();
        let v = (2.0 * e / M_H).sqrt();
        assert!((p.speed() - v).abs() / v < 1e-12);
        assert!((p.velocity[0] / p.velocity[1] - 0.75).abs() < 1e-12);
        assert!((p.kinetic_energy_j() - e).abs() / e < 1e-12);
    }

    #[test]
    fn test_zero_direction_means_rest() {
        let p = Particle::from_energy(0, proton(), [0.5; 3], 1e-16, [0.0; 3]).unwrap();
        assert_eq!(p.velocity, [0.0; 3]);
    }

    #[test]
    fn test_from_record_converts_gui_units() {
        let rec = ParticleRecord::standard(Species::Electron, [1.0, 2.0, 3.0], 2.0, [0.0, 0.0, 1.0]);
        let p = Particle::from_record(7, &rec, Units::default()).unwrap();
        assert_eq!(p.id, 7);
        assert!((p.position[1] - 0.02).abs() < 1e-15);
        assert!(p.charge_c() < 0.0);
        assert!((p.kinetic_energy_j() - 2.0 * KEV_TO_J).abs() / (2.0 * KEV_TO_J) < 1e-12);
    }

    #[test]
    fn test_negative_energy_rejected() {
        match Particle::from_energy(3, proton(), [0.5; 3], -1.0, [1.0, 0.0, 0.0]).unwrap_err() {
            PfieldError::ConfigError(msg) => {
                assert!(msg.contains("particle 3"));
                assert!(msg.contains("energy"));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_boris_push_preserves_speed_without_electric_field() {
        let mut p = Particle::new(0, proton(), [0.5; 3], [80_000.0, 10_000.0, 5_000.0]);
        let speed_0 = p.speed();
        for _ in 0..600 {
            boris_push_step(&mut p, [0.0; 3], [0.0, 0.0, 2.5], 5e-10);
        }
        let rel = (p.speed() - speed_0).abs() / speed_0;
        assert!(rel < 1e-10, "Speed drift too high for Boris push: {rel}");
    }

    #[test]
    fn test_boris_uniform_e_accelerates() {
        let mut p = Particle::new(0, proton(), [0.0; 3], [0.0; 3]);
        let dt = 1e-9;
        boris_push_step(&mut p, [1000.0, 0.0, 0.0], [0.0; 3], dt);
        let expected_v = Q_E * 1000.0 / M_H * dt;
        assert!((p.velocity[0] - expected_v).abs() / expected_v < 1e-12);
    }

    #[test]
    fn test_trace_straight_line_in_empty_domain() {
        let field = empty_field([0.0; 3]);
        let p = Particle::new(0, proton(), [0.1, 0.5, 0.5], [1e3, 0.0, 0.0]);
        let traj = trace(p, &field, 1e-6, 100).unwrap();
        assert_eq!(traj.status, TraceStatus::Truncated);
        assert_eq!(traj.samples.len(), 101);
        assert_eq!(traj.samples[0].t, 0.0);
        let last = traj.final_sample().unwrap();
        assert!((last.position[0] - 0.2).abs() < 1e-12);
        assert_eq!(last.velocity, [1e3, 0.0, 0.0]);
    }

    #[test]
    fn test_start_outside_exits_immediately() {
        let field = empty_field([0.0; 3]);
        let p = Particle::new(0, proton(), [1.5, 0.5, 0.5], [1e3, 0.0, 0.0]);
        let traj = trace(p, &field, 1e-6, 100).unwrap();
        assert_eq!(traj.status, TraceStatus::Exited);
        assert_eq!(traj.samples.len(), 1);
    }

    #[test]
    fn test_start_in_electrode_is_absorbed() {
        let sphere = Electrode::Sphere {
            potential: 5.0,
            cx: 0.5,
            cy: 0.5,
            cz: 0.5,
            radius: 0.2,
        };
        let field = build_grid_si(Grid3D::new(8, 8, 8, 1.0, 1.0, 1.0), &[sphere], [0.0; 3]).unwrap();
        let p = Particle::new(0, proton(), [0.5; 3], [1e3, 0.0, 0.0]);
        let traj = trace(p, &field, 1e-6, 100).unwrap();
        assert_eq!(traj.status, TraceStatus::Absorbed);
        assert_eq!(traj.steps(), 0);
    }

    #[test]
    fn test_exit_sample_is_last() {
        let field = empty_field([0.0; 3]);
        let p = Particle::new(0, proton(), [0.955, 0.5, 0.5], [1e4, 0.0, 0.0]);
        let traj = trace(p, &field, 1e-6, 1000).unwrap();
        assert_eq!(traj.status, TraceStatus::Exited);
        assert_eq!(traj.steps(), 5);
        assert!(traj.final_sample().unwrap().position[0] > 1.0);
    }

    #[test]
    fn test_tracer_is_restartable() {
        let field = empty_field([0.0, 0.0, 1e-3]);
        let p = Particle::new(0, proton(), [0.5; 3], [5e3, 1e3, 0.0]);
        let a: Vec<_> = Tracer::new(p, &field, 1e-7, 50)
            .unwrap()
            .map(|s| s.unwrap())
            .collect();
        let b: Vec<_> = Tracer::new(p, &field, 1e-7, 50)
            .unwrap()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 51);
    }

    #[test]
    fn test_cancelled_trace_keeps_partial_samples() {
        let field = empty_field([0.0; 3]);
        let p = Particle::new(0, proton(), [0.5; 3], [1.0, 0.0, 0.0]);
        let cancel = CancelToken::new();
        let mut tracer = Tracer::with_cancel(p, &field, 1e-6, 100, cancel.clone()).unwrap();
        assert!(tracer.next().is_some());
        assert!(tracer.next().is_some());
        cancel.cancel();
        assert!(tracer.next().is_none());
        assert_eq!(tracer.status(), Some(TraceStatus::Cancelled));
    }

    #[test]
    fn test_non_finite_state_is_numerical_error() {
        let mut field = empty_field([0.0; 3]);
        field.ex.fill(f64::INFINITY);
        let p = Particle::new(4, proton(), [0.5; 3], [0.0; 3]);
        match trace(p, &field, 1e-9, 10).unwrap_err() {
            PfieldError::NonFiniteParticle { particle, step } => {
                assert_eq!((particle, step), (4, 1));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_dt_rejected() {
        let field = empty_field([0.0; 3]);
        let p = Particle::new(0, proton(), [0.5; 3], [0.0; 3]);
        assert!(matches!(
            trace(p, &field, 0.0, 10),
            Err(PfieldError::ConfigError(_))
        ));
    }

    #[test]
    fn test_energy_ladder_endpoints_and_order() {
        let e = seed_energy_ladder(1.0, 100.0, 20, 2.0).unwrap();
        assert_eq!(e.len(), 20);
        assert_eq!(e[0], 100.0);
        assert_eq!(e[19], 1.0);
        assert!(e.windows(2).all(|w| w[0] > w[1]));
        // Weighted toward the low end.
        let below_mid = e.iter().filter(|&&x| x < 50.5).count();
        assert!(below_mid > 10, "{e:?}");

        assert_eq!(seed_energy_ladder(1.0, 2.0, 1, 1.0).unwrap(), vec![2.0]);
        assert!(seed_energy_ladder(5.0, 1.0, 3, 1.0).is_err());
        assert!(seed_energy_ladder(1.0, 5.0, 3, 0.0).is_err());
        assert!(seed_energy_ladder(1.0, 5.0, 0, 1.0).is_err());
        // exp(-10 / ((n - 1) steep)) rounds to 1.
        assert!(matches!(
            seed_energy_ladder(1.0, 2.0, 3, 1e300),
            Err(PfieldError::ConfigError(_))
        ));
    }

    #[test]
    fn test_seed_beam_ids_and_energies() {
        let beam = seed_beam(
            10,
            proton(),
            [0.1, 0.5, 0.5],
            [1.0, 0.0, 0.0],
            KEV_TO_J,
            10.0 * KEV_TO_J,
            5,
            1.0,
        )
        .unwrap();
        assert_eq!(beam.len(), 5);
        assert_eq!(beam[0].id, 10);
        assert_eq!(beam[4].id, 14);
        assert!((beam[0].kinetic_energy_j() - 10.0 * KEV_TO_J).abs() / KEV_TO_J < 1e-9);
        assert!((beam[4].kinetic_energy_j() - KEV_TO_J).abs() / KEV_TO_J < 1e-9);
    }
}
