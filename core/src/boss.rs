//! Read-only boss state published by the simulation.
//!
//! Each boss type exposes its phase and the transient mechanic entities it
//! currently owns. Renderers treat these values as the source of truth for a
//! single frame and never hold on to them.

use glam::Vec2;

use crate::{BossId, EntityId};

/// Boss phase in the range `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BossPhase(u8);

impl BossPhase {
    /// First phase of every encounter.
    pub const FIRST: Self = Self(1);
    /// Final phase of every encounter.
    pub const LAST: Self = Self(4);

    /// Creates a phase, clamping the value into `1..=4`.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        if value < 1 {
            Self::FIRST
        } else if value > 4 {
            Self::LAST
        } else {
            Self(value)
        }
    }

    /// Numeric phase value.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl Default for BossPhase {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Discriminant of the supported boss types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BossKind {
    /// Melee/ranged switching boss that leaves damage puddles and fires lasers.
    Cyberboss,
    /// Arena shrinking boss with void zones and pylons.
    VoidHarbinger,
    /// Spinning blade boss that heats floor tiles.
    Overclocker,
    /// Segmented worm boss that splits and builds firewalls.
    TrojanWyrm,
}

impl BossKind {
    /// Stable lowercase prefix used for node registry keys.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Cyberboss => "cyberboss",
            Self::VoidHarbinger => "voidharbinger",
            Self::Overclocker => "overclocker",
            Self::TrojanWyrm => "trojanwyrm",
        }
    }
}

/// Combat stance of the Cyberboss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CyberbossMode {
    /// Chasing towers at close range.
    Melee,
    /// Keeping distance and firing lasers.
    Ranged,
}

/// Damage puddle left behind by the Cyberboss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamagePuddle {
    /// Identifier of the puddle.
    pub id: EntityId,
    /// Center of the puddle.
    pub position: Vec2,
    /// Radius of the puddle.
    pub radius: f32,
    /// Seconds since the puddle appeared.
    pub age: f32,
    /// Total lifetime in seconds.
    pub lifetime: f32,
}

impl DamagePuddle {
    /// Remaining fraction of the lifetime in `0.0..=1.0`.
    #[must_use]
    pub fn remaining_fraction(&self) -> f32 {
        if self.lifetime <= f32::EPSILON {
            return 0.0;
        }
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

/// Charging or firing state of a laser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaserState {
    /// Telegraph before the beam becomes dangerous.
    Charging,
    /// Beam deals damage.
    Firing,
}

/// Laser beam fired by the Cyberboss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaserBeam {
    /// Identifier of the beam.
    pub id: EntityId,
    /// Start point of the beam.
    pub origin: Vec2,
    /// Direction of the beam in radians.
    pub angle: f32,
    /// Length of the beam in world units.
    pub length: f32,
    /// Telegraph or damage state.
    pub state: LaserState,
}

/// Cyberboss state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CyberbossSnapshot {
    /// Boss center.
    pub position: Vec2,
    /// Current phase.
    pub phase: BossPhase,
    /// Remaining health in `0.0..=1.0`.
    pub health_fraction: f32,
    /// Current stance.
    pub mode: CyberbossMode,
    /// Live damage puddles.
    pub puddles: Vec<DamagePuddle>,
    /// Live laser beams.
    pub lasers: Vec<LaserBeam>,
}

/// Warning or active state of a void zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoidZoneState {
    /// Telegraph before the zone becomes dangerous.
    Warning,
    /// Zone deals damage.
    Active,
}

/// Circular void zone spawned by the Void Harbinger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoidZone {
    /// Identifier of the zone.
    pub id: EntityId,
    /// Center of the zone.
    pub center: Vec2,
    /// Radius of the zone.
    pub radius: f32,
    /// Telegraph or damage state.
    pub state: VoidZoneState,
}

/// Shield pylon that must be destroyed to damage the Void Harbinger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pylon {
    /// Identifier of the pylon.
    pub id: EntityId,
    /// Pylon position.
    pub position: Vec2,
    /// Remaining health in `0.0..=1.0`.
    pub health_fraction: f32,
}

/// Gravity well pulling enemies and projectiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityWell {
    /// Center of the well.
    pub center: Vec2,
    /// Radius of influence.
    pub radius: f32,
}

/// Void Harbinger state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VoidHarbingerSnapshot {
    /// Boss center.
    pub position: Vec2,
    /// Current phase.
    pub phase: BossPhase,
    /// Remaining health in `0.0..=1.0`.
    pub health_fraction: f32,
    /// Live void zones.
    pub zones: Vec<VoidZone>,
    /// Live pylons.
    pub pylons: Vec<Pylon>,
    /// Active gravity well, if any.
    pub gravity_well: Option<GravityWell>,
    /// Radius of the shrinking arena, once the final phase starts.
    pub arena_radius: Option<f32>,
}

/// Warning or hot state of an overheated floor tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardTileState {
    /// Telegraph before the tile becomes dangerous.
    Warning,
    /// Tile deals damage.
    Hot,
}

/// Floor tile heated by the Overclocker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardTile {
    /// Index of the tile within the arena grid.
    pub index: u32,
    /// Tile center.
    pub center: Vec2,
    /// Tile side length.
    pub size: f32,
    /// Telegraph or damage state.
    pub state: HazardTileState,
}

/// Steam puff vented by the Overclocker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteamPuff {
    /// Identifier of the puff.
    pub id: EntityId,
    /// Puff center.
    pub position: Vec2,
    /// Seconds since the puff appeared.
    pub age: f32,
    /// Total lifetime in seconds.
    pub lifetime: f32,
}

/// Overclocker state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OverclockerSnapshot {
    /// Boss center.
    pub position: Vec2,
    /// Current phase.
    pub phase: BossPhase,
    /// Remaining health in `0.0..=1.0`.
    pub health_fraction: f32,
    /// Rotation of the blade assembly in radians.
    pub blade_angle: f32,
    /// Heated tiles.
    pub tiles: Vec<HazardTile>,
    /// Live steam puffs.
    pub steam: Vec<SteamPuff>,
    /// Whether the suction attack is active.
    pub suction: bool,
}

/// Head and body of a worm.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WyrmBody {
    /// Head position.
    pub head: Vec2,
    /// Head heading in radians.
    pub heading: f32,
    /// Body segment centers ordered from neck to tail.
    pub segments: Vec<Vec2>,
}

/// Smaller worm split off from the Trojan Wyrm.
#[derive(Clone, Debug, PartialEq)]
pub struct SubWorm {
    /// Identifier of the sub-worm.
    pub id: EntityId,
    /// Body of the sub-worm.
    pub body: WyrmBody,
}

/// Horizontal firewall barrier with a single gap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FirewallWall {
    /// Vertical position of the wall.
    pub y: f32,
    /// Horizontal center of the gap.
    pub gap_center: f32,
    /// Width of the gap.
    pub gap_width: f32,
    /// Total width of the wall, which spans `0.0..=width` horizontally.
    pub width: f32,
}

/// Circle the Trojan Wyrm is coiling around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoilTarget {
    /// Center of the coil.
    pub center: Vec2,
    /// Radius of the coil.
    pub radius: f32,
}

/// Trojan Wyrm state for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct TrojanWyrmSnapshot {
    /// Current phase.
    pub phase: BossPhase,
    /// Remaining health in `0.0..=1.0`.
    pub health_fraction: f32,
    /// Main worm body.
    pub head: WyrmBody,
    /// Split-off sub-worms.
    pub sub_worms: Vec<SubWorm>,
    /// Active firewall barrier, if any.
    pub firewall: Option<FirewallWall>,
    /// Active coil attack, if any.
    pub coiling: Option<CoilTarget>,
}

/// Type-specific boss state.
#[derive(Clone, Debug, PartialEq)]
pub enum BossState {
    /// Cyberboss state.
    Cyberboss(CyberbossSnapshot),
    /// Void Harbinger state.
    VoidHarbinger(VoidHarbingerSnapshot),
    /// Overclocker state.
    Overclocker(OverclockerSnapshot),
    /// Trojan Wyrm state.
    TrojanWyrm(TrojanWyrmSnapshot),
}

impl BossState {
    /// Kind of boss described by the state.
    #[must_use]
    pub const fn kind(&self) -> BossKind {
        match self {
            Self::Cyberboss(_) => BossKind::Cyberboss,
            Self::VoidHarbinger(_) => BossKind::VoidHarbinger,
            Self::Overclocker(_) => BossKind::Overclocker,
            Self::TrojanWyrm(_) => BossKind::TrojanWyrm,
        }
    }

    /// Current phase regardless of the boss kind.
    #[must_use]
    pub const fn phase(&self) -> BossPhase {
        match self {
            Self::Cyberboss(state) => state.phase,
            Self::VoidHarbinger(state) => state.phase,
            Self::Overclocker(state) => state.phase,
            Self::TrojanWyrm(state) => state.phase,
        }
    }

    /// World position of the boss body; the head for the Trojan Wyrm.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        match self {
            Self::Cyberboss(state) => state.position,
            Self::VoidHarbinger(state) => state.position,
            Self::Overclocker(state) => state.position,
            Self::TrojanWyrm(state) => state.head.head,
        }
    }
}

/// Boss encounter published by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct BossSnapshot {
    /// Identifier of the encounter.
    pub id: BossId,
    /// Type-specific state.
    pub state: BossState,
}

impl BossSnapshot {
    /// Kind of boss described by the snapshot.
    #[must_use]
    pub const fn kind(&self) -> BossKind {
        self.state.kind()
    }
}
