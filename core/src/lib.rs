#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Firewall Defence presentation layer.
//!
//! The gameplay simulation lives elsewhere and publishes a read-only
//! [`WorldSnapshot`] every frame. Visual systems diff that snapshot against
//! their own cached state and mutate the scene graph accordingly; nothing in
//! this crate ever writes back into the simulation.

pub mod boss;
pub mod geometry;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use boss::{
    BossKind, BossPhase, BossSnapshot, BossState, CoilTarget, CyberbossMode, CyberbossSnapshot,
    DamagePuddle, FirewallWall, GravityWell, HazardTile, HazardTileState, LaserBeam, LaserState,
    OverclockerSnapshot, Pylon, SteamPuff, SubWorm, TrojanWyrmSnapshot, VoidHarbingerSnapshot,
    VoidZone, VoidZoneState, WyrmBody,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Firewall Defence.";

/// Highest merge level a tower can reach.
pub const MAX_MERGE_LEVEL: u8 = 5;

/// RGBA color used by every visual system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Fully opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Fully transparent black.
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with its alpha channel replaced.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self {
            red: self.red,
            green: self.green,
            blue: self.blue,
            alpha,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }

    /// Linearly interpolates every channel towards `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            red: self.red + (other.red - self.red) * t,
            green: self.green + (other.green - self.green) * t,
            blue: self.blue + (other.blue - self.blue) * t,
            alpha: self.alpha + (other.alpha - self.alpha) * t,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier assigned to a tower by the simulation.
    TowerId
);
numeric_id!(
    /// Unique identifier assigned to an enemy by the simulation.
    EnemyId
);
numeric_id!(
    /// Unique identifier assigned to an in-flight projectile.
    ProjectileId
);
numeric_id!(
    /// Unique identifier assigned to a boss encounter.
    BossId
);
numeric_id!(
    /// Identifier of a transient boss mechanic entity (puddle, zone, puff).
    EntityId
);
numeric_id!(
    /// Identifier of a tower slot on the board.
    SlotId
);

/// Rarity tier of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    /// Entry level towers.
    Common,
    /// Uncommon towers.
    Rare,
    /// High tier towers.
    Epic,
    /// Top tier towers.
    Legendary,
}

impl Rarity {
    /// Zero-based ordinal of the tier.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Common => 0,
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legendary => 3,
        }
    }

    /// Color used for the rarity ring drawn under the tower.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Common => Color::from_rgb_u8(158, 158, 158),
            Self::Rare => Color::from_rgb_u8(33, 150, 243),
            Self::Epic => Color::from_rgb_u8(156, 39, 176),
            Self::Legendary => Color::from_rgb_u8(255, 193, 7),
        }
    }
}

/// Visual archetype of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerArchetype {
    /// Single target bullet turret.
    Projectile,
    /// Splash damage mortar.
    Artillery,
    /// Slowing crystal emitter.
    Frost,
    /// Homing orb caster.
    Magic,
    /// Continuous beam emitter.
    Beam,
    /// Chain lightning coil.
    Tesla,
    /// Short range flame vent.
    Pyro,
    /// Multi-barrel spread turret.
    MultiShot,
    /// Low-health finisher.
    Execute,
    /// Unique legendary core.
    Legendary,
}

impl TowerArchetype {
    /// Every archetype in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Projectile,
        Self::Artillery,
        Self::Frost,
        Self::Magic,
        Self::Beam,
        Self::Tesla,
        Self::Pyro,
        Self::MultiShot,
        Self::Execute,
        Self::Legendary,
    ];

    /// Signature color of the archetype.
    #[must_use]
    pub const fn accent_color(self) -> Color {
        match self {
            Self::Projectile => Color::from_rgb_u8(0, 229, 255),
            Self::Artillery => Color::from_rgb_u8(255, 152, 0),
            Self::Frost => Color::from_rgb_u8(128, 222, 234),
            Self::Magic => Color::from_rgb_u8(186, 104, 200),
            Self::Beam => Color::from_rgb_u8(255, 82, 82),
            Self::Tesla => Color::from_rgb_u8(255, 235, 59),
            Self::Pyro => Color::from_rgb_u8(255, 87, 34),
            Self::MultiShot => Color::from_rgb_u8(76, 175, 80),
            Self::Execute => Color::from_rgb_u8(244, 67, 54),
            Self::Legendary => Color::from_rgb_u8(255, 215, 64),
        }
    }

    /// Stable lowercase name used in node keys and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Projectile => "projectile",
            Self::Artillery => "artillery",
            Self::Frost => "frost",
            Self::Magic => "magic",
            Self::Beam => "beam",
            Self::Tesla => "tesla",
            Self::Pyro => "pyro",
            Self::MultiShot => "multishot",
            Self::Execute => "execute",
            Self::Legendary => "legendary",
        }
    }
}

/// Immutable snapshot describing a tower placed on the board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the simulation.
    pub id: TowerId,
    /// Visual archetype of the tower.
    pub archetype: TowerArchetype,
    /// Rarity tier of the tower.
    pub rarity: Rarity,
    /// Merge level in the range `1..=MAX_MERGE_LEVEL`.
    pub merge_level: u8,
    /// Tower center in world units.
    pub position: Vec2,
    /// Desired turret heading in radians.
    pub heading: f32,
    /// Whether the tower fired during the current simulation step.
    pub firing: bool,
    /// Position of the tracked target, if any.
    pub target: Option<Vec2>,
}

impl TowerSnapshot {
    /// Creates an idle tower snapshot.
    #[must_use]
    pub fn new(id: TowerId, archetype: TowerArchetype, rarity: Rarity, position: Vec2) -> Self {
        Self {
            id,
            archetype,
            rarity,
            merge_level: 1,
            position,
            heading: 0.0,
            firing: false,
            target: None,
        }
    }

    /// Merge level clamped into the supported range.
    #[must_use]
    pub fn clamped_merge_level(&self) -> u8 {
        self.merge_level.clamp(1, MAX_MERGE_LEVEL)
    }
}

/// Immutable snapshot describing a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Position at the end of the previous simulation step.
    pub previous: Vec2,
    /// Position at the end of the current simulation step.
    pub position: Vec2,
    /// Collision radius in world units.
    pub radius: f32,
    /// Tint of the projectile.
    pub color: Color,
    /// Piercing projectiles keep travelling after a hit.
    pub piercing: bool,
}

/// Circular hit volume of an enemy considered for projectile collision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionTarget {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Center of the enemy in world units.
    pub center: Vec2,
    /// Radius of the hit volume.
    pub radius: f32,
}

/// Read-only view of the simulation published once per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorldSnapshot {
    /// Towers currently placed on the board.
    pub towers: Vec<TowerSnapshot>,
    /// Projectiles currently in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Enemies that projectiles may collide with.
    pub enemies: Vec<CollisionTarget>,
    /// Enemies destroyed during the last simulation step, at their final position.
    pub defeated: Vec<CollisionTarget>,
    /// Active boss encounters.
    pub bosses: Vec<BossSnapshot>,
}

impl WorldSnapshot {
    /// Looks up a tower by identifier.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.towers.iter().find(|tower| tower.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::new(0.0, 0.5, 1.0, 0.25).lighten(0.5);

        assert_eq!(color, Color::new(0.5, 0.75, 1.0, 0.25));
    }

    #[test]
    fn lerp_clamps_interpolation_factor() {
        let from = Color::BLACK;
        let to = Color::WHITE;

        assert_eq!(from.lerp(to, 2.0), to);
        assert_eq!(from.lerp(to, -1.0), from);
        assert_eq!(from.lerp(to, 0.5), Color::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn merge_level_is_clamped() {
        let mut tower = TowerSnapshot::new(
            TowerId::new(1),
            TowerArchetype::Tesla,
            Rarity::Rare,
            Vec2::ZERO,
        );
        tower.merge_level = 0;
        assert_eq!(tower.clamped_merge_level(), 1);
        tower.merge_level = 42;
        assert_eq!(tower.clamped_merge_level(), MAX_MERGE_LEVEL);
    }

    #[test]
    fn archetype_names_are_unique() {
        let mut names: Vec<_> = TowerArchetype::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), TowerArchetype::ALL.len());
    }

    #[test]
    fn rarity_round_trips_through_toml_config_values() {
        #[derive(Deserialize)]
        struct Entry {
            rarity: Rarity,
        }

        let entry: Entry = toml::from_str("rarity = \"Epic\"").expect("valid rarity");
        assert_eq!(entry.rarity.tier(), 2);
    }
}
