use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::index_map::VirtualCell;

/// Integration step cap; long frames are split so the spring stays stable.
const MAX_SUBSTEP: f32 = 1.0 / 120.0;
/// At most this many substeps per call; time beyond that only advances `elapsed`.
const MAX_SUBSTEPS: u32 = 240;

/// Spring constants (mass-spring-damper, unit displacement).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damping: 20.0,
            mass: 0.8,
        }
    }
}

impl SpringParams {
    /// 1.0 is critical damping; above 1.0 never overshoots.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

/// Rest thresholds for a settling spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleTolerance {
    pub displacement: f32,
    pub velocity: f32,
}

/// One axis of a spring motion toward a fixed target.
#[derive(Debug, Clone)]
pub struct SpringAxis {
    pub position: f32,
    pub velocity: f32,
    pub target: f32,
    elapsed: f32,
    settled: bool,
}

impl SpringAxis {
    pub fn new(position: f32, velocity: f32, target: f32) -> Self {
        Self {
            position,
            velocity,
            target,
            elapsed: 0.0,
            settled: false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance by `dt` seconds. Returns true once the axis is at rest on its target.
    pub fn step(&mut self, dt: f32, params: &SpringParams, tolerance: &SettleTolerance) -> bool {
        if self.settled {
            return true;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        let mass = params.mass.max(f32::EPSILON);
        let integrated = dt.min(MAX_SUBSTEP * MAX_SUBSTEPS as f32);
        let steps = ((integrated / MAX_SUBSTEP).ceil() as u32).clamp(1, MAX_SUBSTEPS);
        let h = integrated / steps as f32;
        for _ in 0..steps {
            // Spring force: F = -k(x - x0) - c*v
            let displacement = self.position - self.target;
            let force = -params.stiffness * displacement - params.damping * self.velocity;
            self.velocity += force / mass * h;
            self.position += self.velocity * h;
        }

        if (self.position - self.target).abs() < tolerance.displacement
            && self.velocity.abs() < tolerance.velocity
        {
            self.force_settle();
        }
        self.settled
    }

    /// Jump onto the target and stop.
    pub fn force_settle(&mut self) {
        self.position = self.target;
        self.velocity = 0.0;
        self.settled = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn slot(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// Completion barrier joining the two axis motions. Trips exactly once.
#[derive(Debug, Clone, Default)]
pub struct SettleBarrier {
    arrived: [bool; 2],
    tripped: bool,
}

impl SettleBarrier {
    /// Record that `axis` finished. Returns true only for the arrival that completes the barrier.
    pub fn arrive(&mut self, axis: Axis) -> bool {
        self.arrived[axis.slot()] = true;
        if self.tripped || !self.arrived.iter().all(|a| *a) {
            return false;
        }
        self.tripped = true;
        true
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

/// Result of advancing a snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapProgress {
    Running,
    /// Both axes are at rest; reported once.
    Settled,
}

/// Spring-animated camera move toward the offset that centers `cell`.
#[derive(Debug, Clone)]
pub struct SnapAnimation {
    x: SpringAxis,
    y: SpringAxis,
    barrier: SettleBarrier,
    cell: VirtualCell,
    generation: u64,
    params: SpringParams,
    tolerance: SettleTolerance,
    max_duration: f32,
}

impl SnapAnimation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generation: u64,
        cell: VirtualCell,
        from: Vec2,
        velocity: Vec2,
        to: Vec2,
        params: SpringParams,
        tolerance: SettleTolerance,
        max_duration: f32,
    ) -> Self {
        Self {
            x: SpringAxis::new(from.x, velocity.x, to.x),
            y: SpringAxis::new(from.y, velocity.y, to.y),
            barrier: SettleBarrier::default(),
            cell,
            generation,
            params,
            tolerance,
            max_duration,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cell(&self) -> VirtualCell {
        self.cell
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x.position, self.y.position)
    }

    pub fn target(&self) -> Vec2 {
        Vec2::new(self.x.target, self.y.target)
    }

    pub fn axis(&self, axis: Axis) -> &SpringAxis {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Advance one axis. The other axis is untouched, so ticks may interleave freely.
    pub fn tick_axis(&mut self, axis: Axis, dt: f32) -> SnapProgress {
        if self.barrier.is_tripped() {
            return SnapProgress::Running;
        }
        let spring = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        };
        let mut settled = spring.step(dt, &self.params, &self.tolerance);
        if !settled && spring.elapsed() >= self.max_duration {
            log::debug!(
                "Snap axis {:?} exceeded {:.2}s; forcing settle",
                axis,
                self.max_duration
            );
            spring.force_settle();
            settled = true;
        }

        if settled && self.barrier.arrive(axis) {
            SnapProgress::Settled
        } else {
            SnapProgress::Running
        }
    }

    /// Advance both axes by the same `dt`.
    pub fn tick(&mut self, dt: f32) -> SnapProgress {
        let x = self.tick_axis(Axis::X, dt);
        let y = self.tick_axis(Axis::Y, dt);
        if x == SnapProgress::Settled || y == SnapProgress::Settled {
            SnapProgress::Settled
        } else {
            SnapProgress::Running
        }
    }
}
