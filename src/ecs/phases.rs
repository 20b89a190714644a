//! Pipeline phases and the Play/Edit gate
//!
//! Systems run once per tick, phase by phase, in registration order within a
//! phase. The `Simulation` phase holds gameplay systems (movement, animation
//! drivers, audio playback) and is disabled in Edit mode. Transform, camera
//! and spatial upkeep are observer-driven and never gated.

use serde::{Deserialize, Serialize};

use super::World;

/// Ordered execution slots within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    PreUpdate,
    /// Gameplay; skipped in Edit mode
    Simulation,
    OnUpdate,
    PostUpdate,
}

impl Phase {
    /// All phases in execution order
    pub const ORDER: [Phase; 4] = [
        Phase::PreUpdate,
        Phase::Simulation,
        Phase::OnUpdate,
        Phase::PostUpdate,
    ];
}

/// Whether gameplay is stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineMode {
    /// All phases run
    #[default]
    Play,
    /// The Simulation phase is disabled
    Edit,
}

/// State of the Simulation gate.
///
/// A mode change requested while a tick is running takes effect when the
/// tick ends, so every tick runs entirely in one mode.
#[derive(Debug, Clone, Default)]
pub struct PipelinePhases {
    mode: PipelineMode,
    pending: Option<PipelineMode>,
    in_tick: bool,
}

impl PipelinePhases {
    /// Current mode
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Request a mode change
    pub fn set_mode(&mut self, mode: PipelineMode) {
        if self.in_tick {
            self.pending = Some(mode);
        } else {
            self.apply(mode);
        }
    }

    /// Whether the Simulation phase is enabled
    pub fn simulation_enabled(&self) -> bool {
        self.mode == PipelineMode::Play
    }

    /// Whether systems in `phase` run this tick
    pub fn is_enabled(&self, phase: Phase) -> bool {
        phase != Phase::Simulation || self.simulation_enabled()
    }

    fn begin_tick(&mut self) {
        self.in_tick = true;
    }

    fn end_tick(&mut self) {
        self.in_tick = false;
        if let Some(mode) = self.pending.take() {
            self.apply(mode);
        }
    }

    fn apply(&mut self, mode: PipelineMode) {
        if self.mode != mode {
            log::info!("pipeline mode: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

type SystemFn = Box<dyn FnMut(&mut World, f32)>;

struct System {
    name: String,
    phase: Phase,
    run: SystemFn,
}

/// Per-tick system list
#[derive(Default)]
pub struct Schedule {
    systems: Vec<System>,
}

impl Schedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to a phase
    pub fn add_system(
        &mut self,
        name: impl Into<String>,
        phase: Phase,
        system: impl FnMut(&mut World, f32) + 'static,
    ) {
        let name = name.into();
        log::debug!("registered system {name} in {phase:?}");
        self.systems.push(System {
            name,
            phase,
            run: Box::new(system),
        });
    }

    /// Names of systems in a phase, in run order
    pub fn systems_in(&self, phase: Phase) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|s| s.phase == phase)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Run one tick
    pub fn run(&mut self, world: &mut World, delta_time: f32) {
        world.phases_mut().begin_tick();
        for phase in Phase::ORDER {
            if !world.phases().is_enabled(phase) {
                continue;
            }
            for system in self.systems.iter_mut().filter(|s| s.phase == phase) {
                (system.run)(world, delta_time);
            }
        }
        world.phases_mut().end_tick();
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field(
                "systems",
                &self.systems.iter().map(|s| &s.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
