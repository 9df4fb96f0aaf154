//! Seeded stand-in for the gameplay simulation.
//!
//! Enemies walk along a winding lane below a grid of tower slots, towers shoot at the
//! closest enemy in range and a boss encounter of each kind cycles through
//! its four phases in turn.

use std::f32::consts::TAU;

use firewall_defence_client::Simulation;
use firewall_defence_core::{
    geometry::{angle_between, path_length, point_along_path, segment_intersects_circle, Rect},
    BossId, BossPhase, BossSnapshot, BossState, CoilTarget, CollisionTarget, CyberbossMode,
    CyberbossSnapshot, DamagePuddle, EnemyId, EntityId, FirewallWall, GravityWell, HazardTile,
    HazardTileState, LaserBeam, LaserState, OverclockerSnapshot, ProjectileId, ProjectileSnapshot,
    Pylon, Rarity, SlotId, SteamPuff, SubWorm, TowerArchetype, TowerId, TowerSnapshot,
    TrojanWyrmSnapshot, VoidHarbingerSnapshot, VoidZone, VoidZoneState, WorldSnapshot, WyrmBody,
    MAX_MERGE_LEVEL,
};
use firewall_defence_interaction::{BoardQuery, InteractionCommand};
use glam::Vec2;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const COLUMNS: u32 = 6;
const ROWS: u32 = 3;
const SLOT_SPACING: f32 = 96.0;
const BOARD_SIZE: Vec2 = Vec2::new(672.0, 720.0);
const LANE: [Vec2; 6] = [
    Vec2::new(-ENEMY_RADIUS, 460.0),
    Vec2::new(200.0, 460.0),
    Vec2::new(200.0, 600.0),
    Vec2::new(470.0, 600.0),
    Vec2::new(470.0, 520.0),
    Vec2::new(BOARD_SIZE.x + ENEMY_RADIUS, 520.0),
];
const ARENA_CENTER: Vec2 = Vec2::new(336.0, 400.0);

const INITIAL_TOWERS: usize = 8;
const SPAWN_INTERVAL: f32 = 0.9;
const ENEMY_RADIUS: f32 = 14.0;
const ENEMY_HEALTH: u32 = 3;
const TOWER_RANGE: f32 = 320.0;
const TOWER_COOLDOWN: f32 = 0.6;
const PROJECTILE_SPEED: f32 = 480.0;
const PROJECTILE_RADIUS: f32 = 5.0;
const PROJECTILE_LIFETIME: f32 = 1.5;

const FIRST_ENCOUNTER: f32 = 4.0;
const ENCOUNTER_PERIOD: f32 = 24.0;
const ENCOUNTER_LENGTH: f32 = 16.0;
const PHASE_LENGTH: f32 = ENCOUNTER_LENGTH / 4.0;

#[derive(Clone, Copy, Debug)]
struct Enemy {
    id: EnemyId,
    position: Vec2,
    travelled: f32,
    lane_offset: f32,
    speed: f32,
    health: u32,
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    snapshot: ProjectileSnapshot,
    target: EnemyId,
    velocity: Vec2,
    remaining: f32,
    spent: bool,
}

#[derive(Clone, Copy, Debug)]
struct PlacedTower {
    slot: SlotId,
    snapshot: TowerSnapshot,
    cooldown: f32,
}

/// Deterministic demo battle driven by a seeded generator.
#[derive(Debug)]
pub(crate) struct DemoSimulation {
    rng: ChaCha8Rng,
    clock: f32,
    spawn_timer: f32,
    next_tower: u32,
    next_enemy: u32,
    next_projectile: u32,
    towers: Vec<PlacedTower>,
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    fallen: Vec<CollisionTarget>,
    lane_length: f32,
    kills: u32,
    world: WorldSnapshot,
}

impl DemoSimulation {
    /// Creates a battle with a few randomly placed towers.
    pub(crate) fn new(seed: u64) -> Self {
        let mut simulation = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock: 0.0,
            spawn_timer: 0.0,
            next_tower: 1,
            next_enemy: 1,
            next_projectile: 1,
            towers: Vec::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            fallen: Vec::new(),
            lane_length: path_length(&LANE),
            kills: 0,
            world: WorldSnapshot::default(),
        };

        let mut free: Vec<u32> = (0..COLUMNS * ROWS).collect();
        for _ in 0..INITIAL_TOWERS {
            let pick = simulation.rng.gen_range(0..free.len());
            let slot = SlotId::new(free.swap_remove(pick));
            // Few archetypes so that mergeable pairs show up.
            let archetype = TowerArchetype::ALL[simulation.rng.gen_range(0..3)];
            simulation.place(archetype, Rarity::Common, slot);
        }
        simulation.publish();
        simulation
    }

    /// World rectangle covered by the board.
    pub(crate) fn bounds(&self) -> Rect {
        Rect::from_corners(Vec2::ZERO, BOARD_SIZE)
    }

    /// Enemies destroyed so far.
    pub(crate) fn kills(&self) -> u32 {
        self.kills
    }

    fn slot_center(slot: SlotId) -> Vec2 {
        let index = slot.get();
        Vec2::new(
            SLOT_SPACING + (index % COLUMNS) as f32 * SLOT_SPACING,
            SLOT_SPACING + (index / COLUMNS) as f32 * SLOT_SPACING,
        )
    }

    fn place(&mut self, archetype: TowerArchetype, rarity: Rarity, slot: SlotId) {
        let id = TowerId::new(self.next_tower);
        self.next_tower += 1;
        self.towers.push(PlacedTower {
            slot,
            snapshot: TowerSnapshot::new(id, archetype, rarity, Self::slot_center(slot)),
            cooldown: self.rng.gen_range(0.0..TOWER_COOLDOWN),
        });
    }

    fn tower(&self, id: TowerId) -> Option<&PlacedTower> {
        self.towers.iter().find(|tower| tower.snapshot.id == id)
    }

    fn spawn_enemies(&mut self, dt: f32) {
        self.spawn_timer -= dt;
        while self.spawn_timer <= 0.0 {
            self.spawn_timer += SPAWN_INTERVAL;
            let id = EnemyId::new(self.next_enemy);
            self.next_enemy += 1;
            let lane_offset = self.rng.gen_range(-24.0..24.0);
            self.enemies.push(Enemy {
                id,
                position: LANE[0] + Vec2::new(0.0, lane_offset),
                travelled: 0.0,
                lane_offset,
                speed: self.rng.gen_range(50.0..90.0),
                health: ENEMY_HEALTH,
            });
        }

        for enemy in &mut self.enemies {
            enemy.travelled += enemy.speed * dt;
            if let Some(point) = point_along_path(&LANE, enemy.travelled) {
                enemy.position = point + Vec2::new(0.0, enemy.lane_offset);
            }
        }
        let lane_length = self.lane_length;
        self.enemies
            .retain(|enemy| enemy.travelled < lane_length && enemy.health > 0);
    }

    fn fire_towers(&mut self, dt: f32) {
        for index in 0..self.towers.len() {
            let position = self.towers[index].snapshot.position;
            let target = self
                .enemies
                .iter()
                .filter(|enemy| enemy.health > 0)
                .map(|enemy| (enemy.position.distance(position), enemy.id, enemy.position))
                .filter(|(distance, _, _)| *distance <= TOWER_RANGE)
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            let tower = &mut self.towers[index];
            tower.cooldown -= dt;
            tower.snapshot.target = target.map(|(_, _, target)| target);
            tower.snapshot.firing = false;
            let Some((_, enemy, target)) = target else {
                continue;
            };
            tower.snapshot.heading = angle_between(position, target);
            if tower.cooldown > 0.0 {
                continue;
            }

            tower.cooldown = TOWER_COOLDOWN;
            tower.snapshot.firing = true;
            let archetype = tower.snapshot.archetype;
            let id = ProjectileId::new(self.next_projectile);
            self.next_projectile += 1;
            self.projectiles.push(Projectile {
                snapshot: ProjectileSnapshot {
                    id,
                    previous: position,
                    position,
                    radius: PROJECTILE_RADIUS,
                    color: archetype.accent_color(),
                    piercing: archetype == TowerArchetype::Beam,
                },
                target: enemy,
                velocity: (target - position).normalize_or_zero() * PROJECTILE_SPEED,
                remaining: PROJECTILE_LIFETIME,
                spent: false,
            });
        }
    }

    /// Moves projectiles toward their targets and damages enemies they touch.
    ///
    /// Spent projectiles stay in one more snapshot so the contact is visible
    /// to the presentation layer.
    fn advance_projectiles(&mut self, dt: f32) {
        self.projectiles
            .retain(|projectile| !projectile.spent && projectile.remaining > 0.0);

        for projectile in &mut self.projectiles {
            if let Some(enemy) = self
                .enemies
                .iter()
                .find(|enemy| enemy.id == projectile.target && enemy.health > 0)
            {
                let heading = (enemy.position - projectile.snapshot.position).normalize_or_zero();
                if heading != Vec2::ZERO {
                    projectile.velocity = heading * PROJECTILE_SPEED;
                }
            }

            let snapshot = &mut projectile.snapshot;
            snapshot.previous = snapshot.position;
            snapshot.position += projectile.velocity * dt;
            projectile.remaining -= dt;

            for enemy in self.enemies.iter_mut().filter(|enemy| enemy.health > 0) {
                if segment_intersects_circle(
                    snapshot.previous,
                    snapshot.position,
                    enemy.position,
                    ENEMY_RADIUS + snapshot.radius,
                ) {
                    enemy.health -= 1;
                    if enemy.health == 0 {
                        self.kills += 1;
                        self.fallen.push(CollisionTarget {
                            id: enemy.id,
                            center: enemy.position,
                            radius: ENEMY_RADIUS,
                        });
                    }
                    if !snapshot.piercing {
                        projectile.spent = true;
                        break;
                    }
                }
            }
        }
    }

    fn publish(&mut self) {
        self.world.towers = self.towers.iter().map(|tower| tower.snapshot).collect();
        self.world.projectiles = self
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot)
            .collect();
        self.world.enemies = self
            .enemies
            .iter()
            .filter(|enemy| enemy.health > 0)
            .map(|enemy| CollisionTarget {
                id: enemy.id,
                center: enemy.position,
                radius: ENEMY_RADIUS,
            })
            .collect();
        self.world.defeated = self.fallen.clone();
        self.world.bosses = encounter(self.clock).into_iter().collect();
    }
}

impl BoardQuery for DemoSimulation {
    fn tower_at(&self, world: Vec2, radius: f32) -> Option<TowerId> {
        self.towers
            .iter()
            .map(|tower| (tower.snapshot.position.distance(world), tower.snapshot.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    fn can_merge(&self, source: TowerId, target: TowerId) -> bool {
        match (self.tower(source), self.tower(target)) {
            (Some(source), Some(target)) if source.snapshot.id != target.snapshot.id => {
                let (a, b) = (source.snapshot, target.snapshot);
                a.archetype == b.archetype
                    && a.rarity == b.rarity
                    && a.merge_level == b.merge_level
                    && b.merge_level < MAX_MERGE_LEVEL
            }
            _ => false,
        }
    }

    fn slot_at(&self, world: Vec2, radius: f32) -> Option<SlotId> {
        (0..COLUMNS * ROWS)
            .map(SlotId::new)
            .map(|slot| (Self::slot_center(slot).distance(world), slot))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, slot)| slot)
    }

    fn slot_free(&self, slot: SlotId) -> bool {
        slot.get() < COLUMNS * ROWS && self.towers.iter().all(|tower| tower.slot != slot)
    }

    fn tower_slot(&self, tower: TowerId) -> Option<SlotId> {
        self.tower(tower).map(|tower| tower.slot)
    }
}

impl Simulation for DemoSimulation {
    fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.clock += dt;
        self.fallen.clear();
        self.spawn_enemies(dt);
        self.fire_towers(dt);
        self.advance_projectiles(dt);
        self.publish();
    }

    fn snapshot(&self) -> &WorldSnapshot {
        &self.world
    }

    fn apply(&mut self, command: &InteractionCommand) {
        match *command {
            InteractionCommand::MergeTowers { source, target } => {
                if !self.can_merge(source, target) {
                    return;
                }
                self.towers.retain(|tower| tower.snapshot.id != source);
                if let Some(tower) = self
                    .towers
                    .iter_mut()
                    .find(|tower| tower.snapshot.id == target)
                {
                    tower.snapshot.merge_level += 1;
                    if tower.snapshot.merge_level == MAX_MERGE_LEVEL {
                        tower.snapshot.rarity = Rarity::Legendary;
                    }
                }
                debug!("merged tower {} into {}", source.get(), target.get());
            }
            InteractionCommand::MoveTower { tower, slot } => {
                if !self.slot_free(slot) {
                    return;
                }
                if let Some(placed) = self
                    .towers
                    .iter_mut()
                    .find(|placed| placed.snapshot.id == tower)
                {
                    placed.slot = slot;
                    placed.snapshot.position = Self::slot_center(slot);
                    debug!("moved tower {} to slot {}", tower.get(), slot.get());
                }
            }
            InteractionCommand::PlaceTower { archetype, slot } => {
                if self.slot_free(slot) {
                    self.place(archetype, Rarity::Common, slot);
                    debug!("placed {} on slot {}", archetype.name(), slot.get());
                }
            }
            _ => return,
        }
        self.publish();
    }
}

/// Boss published at `clock`, cycling through the four kinds.
fn encounter(clock: f32) -> Option<BossSnapshot> {
    let since_first = clock - FIRST_ENCOUNTER;
    if since_first < 0.0 {
        return None;
    }
    let index = (since_first / ENCOUNTER_PERIOD) as u32;
    let t = since_first - index as f32 * ENCOUNTER_PERIOD;
    if t >= ENCOUNTER_LENGTH {
        return None;
    }

    let phase = BossPhase::new(1 + (t / PHASE_LENGTH) as u8);
    let health_fraction = 1.0 - t / ENCOUNTER_LENGTH;
    let state = match index % 4 {
        0 => BossState::Cyberboss(cyberboss(t, phase, health_fraction)),
        1 => BossState::VoidHarbinger(void_harbinger(t, phase, health_fraction)),
        2 => BossState::Overclocker(overclocker(t, phase, health_fraction)),
        _ => BossState::TrojanWyrm(trojan_wyrm(t, phase, health_fraction)),
    };
    Some(BossSnapshot {
        id: BossId::new(index + 1),
        state,
    })
}

fn cyberboss(t: f32, phase: BossPhase, health_fraction: f32) -> CyberbossSnapshot {
    let position = ARENA_CENTER + Vec2::new((t * 0.6).cos() * 120.0, (t * 0.9).sin() * 40.0);
    let ranged = (t / 3.0) as u32 % 2 == 1;
    let puddles = (0..=(t / 1.5) as u32)
        .map(|index| DamagePuddle {
            id: EntityId::new(index),
            position: ARENA_CENTER
                + Vec2::from_angle(index as f32 * 2.4) * (60.0 + (index % 3) as f32 * 30.0),
            radius: 36.0,
            age: t - index as f32 * 1.5,
            lifetime: 4.0,
        })
        .filter(|puddle| puddle.age >= 0.0 && puddle.age < puddle.lifetime)
        .collect();
    let lasers = if ranged {
        vec![LaserBeam {
            id: EntityId::new((t / 3.0) as u32),
            origin: position,
            angle: t * 0.8,
            length: 500.0,
            state: if t % 3.0 < 1.0 {
                LaserState::Charging
            } else {
                LaserState::Firing
            },
        }]
    } else {
        Vec::new()
    };

    CyberbossSnapshot {
        position,
        phase,
        health_fraction,
        mode: if ranged {
            CyberbossMode::Ranged
        } else {
            CyberbossMode::Melee
        },
        puddles,
        lasers,
    }
}

fn void_harbinger(t: f32, phase: BossPhase, health_fraction: f32) -> VoidHarbingerSnapshot {
    let wave = (t / 2.0) as u32;
    let pylons = if phase.get() >= 2 {
        (0..3u32)
            .map(|index| Pylon {
                id: EntityId::new(index + 1),
                position: ARENA_CENTER + Vec2::from_angle(index as f32 * TAU / 3.0) * 190.0,
                health_fraction: 1.0 - (t - PHASE_LENGTH) / (6.0 + index as f32 * 2.0),
            })
            .filter(|pylon| pylon.health_fraction > 0.0)
            .collect()
    } else {
        Vec::new()
    };

    VoidHarbingerSnapshot {
        position: ARENA_CENTER,
        phase,
        health_fraction,
        zones: vec![VoidZone {
            id: EntityId::new(wave),
            center: ARENA_CENTER + Vec2::from_angle(wave as f32 * 1.7) * 150.0,
            radius: 70.0,
            state: if t % 2.0 < 0.8 {
                VoidZoneState::Warning
            } else {
                VoidZoneState::Active
            },
        }],
        pylons,
        gravity_well: (phase.get() >= 3).then(|| GravityWell {
            center: ARENA_CENTER,
            radius: 80.0 + t.sin() * 20.0,
        }),
        arena_radius: (phase.get() >= 4).then(|| 420.0 - (t - 3.0 * PHASE_LENGTH) * 30.0),
    }
}

fn overclocker(t: f32, phase: BossPhase, health_fraction: f32) -> OverclockerSnapshot {
    let beat = (t * 2.0) as u32;
    let tiles = (0..6u32)
        .filter_map(|index| {
            let state = match (beat + index) % 4 {
                0 => return None,
                1 => HazardTileState::Warning,
                _ => HazardTileState::Hot,
            };
            Some(HazardTile {
                index,
                center: ARENA_CENTER + Vec2::new(-160.0 + index as f32 * 64.0, 140.0),
                size: 56.0,
                state,
            })
        })
        .collect();
    let newest = (t / 0.7) as u32;
    let steam = (newest.saturating_sub(2)..=newest)
        .map(|index| SteamPuff {
            id: EntityId::new(index),
            position: ARENA_CENTER + Vec2::new(0.0, -50.0),
            age: t - index as f32 * 0.7,
            lifetime: 1.2,
        })
        .filter(|puff| puff.age >= 0.0 && puff.age < puff.lifetime)
        .collect();

    OverclockerSnapshot {
        position: ARENA_CENTER,
        phase,
        health_fraction,
        blade_angle: t * 5.0,
        tiles,
        steam,
        suction: t % 5.0 > 3.5,
    }
}

fn wyrm_body(t: f32, origin: Vec2, size: f32, segments: usize) -> WyrmBody {
    let path = |t: f32| origin + Vec2::new((t * 0.7).cos() * 200.0, (t * 1.4).sin() * 90.0) * size;
    let head = path(t);
    WyrmBody {
        head,
        heading: angle_between(head, path(t + 0.05)),
        segments: (1..=segments)
            .map(|index| path(t - 0.12 * index as f32))
            .collect(),
    }
}

fn trojan_wyrm(t: f32, phase: BossPhase, health_fraction: f32) -> TrojanWyrmSnapshot {
    let level = usize::from(phase.get());
    TrojanWyrmSnapshot {
        phase,
        health_fraction,
        head: wyrm_body(t, ARENA_CENTER, 1.0, 12 - level * 2),
        sub_worms: if level >= 3 {
            (0..2u32)
                .map(|index| SubWorm {
                    id: EntityId::new(index + 1),
                    body: wyrm_body(t * 1.3 + index as f32 * 2.0, ARENA_CENTER, 0.5, 3),
                })
                .collect()
        } else {
            Vec::new()
        },
        firewall: (level >= 2).then(|| FirewallWall {
            y: 640.0,
            gap_center: BOARD_SIZE.x * 0.5 + t.sin() * 200.0,
            gap_width: 140.0,
            width: BOARD_SIZE.x,
        }),
        coiling: (level >= 4).then(|| CoilTarget {
            center: DemoSimulation::slot_center(SlotId::new(0)),
            radius: 70.0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_core::BossKind;

    fn run(seed: u64, steps: usize) -> DemoSimulation {
        let mut simulation = DemoSimulation::new(seed);
        for _ in 0..steps {
            simulation.step(1.0 / 60.0);
        }
        simulation
    }

    #[test]
    fn identical_seeds_publish_identical_worlds() {
        let first = run(11, 600);
        let second = run(11, 600);

        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(first.kills(), second.kills());
    }

    #[test]
    fn towers_fire_and_enemies_die() {
        let simulation = run(3, 1_200);

        assert!(simulation.kills() > 0);
        assert!(!simulation.snapshot().towers.is_empty());
    }

    #[test]
    fn kills_are_published_for_a_single_step() {
        let mut simulation = DemoSimulation::new(3);
        let mut published = 0;
        let mut kills = 0;
        for _ in 0..1_200 {
            simulation.step(1.0 / 60.0);
            let world = simulation.snapshot();
            published += world.defeated.len() as u32;
            kills = simulation.kills();
            assert!(world
                .defeated
                .iter()
                .all(|fallen| world.enemies.iter().all(|enemy| enemy.id != fallen.id)));
        }

        assert!(kills > 0);
        assert_eq!(published, kills);
    }

    #[test]
    fn enemies_follow_the_lane_and_leave_at_its_end() {
        let mut simulation = DemoSimulation::new(9);
        simulation.towers.clear();
        simulation.step(0.0);
        let first = simulation.enemies[0].id;

        for _ in 0..400 {
            simulation.step(0.05);
            if let Some(enemy) = simulation.enemies.iter().find(|enemy| enemy.id == first) {
                let on_lane = point_along_path(&LANE, enemy.travelled).expect("lane");
                assert!((enemy.position.x - on_lane.x).abs() < 1e-3);
                assert!((enemy.position.y - on_lane.y).abs() <= 24.0);
            }
        }

        assert!(simulation.enemies.iter().all(|enemy| enemy.id != first));
        assert_eq!(simulation.kills(), 0);
    }

    #[test]
    fn encounters_cycle_through_every_boss_kind() {
        let kinds: Vec<BossKind> = (0..4)
            .filter_map(|index| {
                encounter(FIRST_ENCOUNTER + index as f32 * ENCOUNTER_PERIOD + 1.0)
                    .map(|boss| boss.kind())
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                BossKind::Cyberboss,
                BossKind::VoidHarbinger,
                BossKind::Overclocker,
                BossKind::TrojanWyrm,
            ]
        );
        assert!(encounter(FIRST_ENCOUNTER + ENCOUNTER_LENGTH + 1.0).is_none());
        assert!(encounter(0.0).is_none());
    }

    #[test]
    fn merging_requires_matching_towers() {
        let mut simulation = DemoSimulation::new(5);
        simulation.towers.clear();
        simulation.place(TowerArchetype::Frost, Rarity::Common, SlotId::new(0));
        simulation.place(TowerArchetype::Frost, Rarity::Common, SlotId::new(1));
        simulation.place(TowerArchetype::Magic, Rarity::Common, SlotId::new(2));
        let ids: Vec<TowerId> = simulation.towers.iter().map(|t| t.snapshot.id).collect();

        assert!(simulation.can_merge(ids[0], ids[1]));
        assert!(!simulation.can_merge(ids[0], ids[2]));
        assert!(!simulation.can_merge(ids[0], ids[0]));

        simulation.apply(&InteractionCommand::MergeTowers {
            source: ids[0],
            target: ids[1],
        });
        let merged = simulation.snapshot().tower(ids[1]).expect("target survives");
        assert_eq!(merged.merge_level, 2);
        assert!(simulation.snapshot().tower(ids[0]).is_none());
        assert!(simulation.slot_free(SlotId::new(0)));
    }

    #[test]
    fn moves_and_placements_need_a_free_slot() {
        let mut simulation = DemoSimulation::new(5);
        simulation.towers.clear();
        simulation.place(TowerArchetype::Pyro, Rarity::Rare, SlotId::new(4));
        let tower = simulation.towers[0].snapshot.id;

        simulation.apply(&InteractionCommand::MoveTower {
            tower,
            slot: SlotId::new(7),
        });
        assert_eq!(simulation.tower_slot(tower), Some(SlotId::new(7)));
        assert_eq!(
            simulation.tower_at(DemoSimulation::slot_center(SlotId::new(7)), 10.0),
            Some(tower)
        );

        simulation.apply(&InteractionCommand::PlaceTower {
            archetype: TowerArchetype::Beam,
            slot: SlotId::new(7),
        });
        assert_eq!(simulation.snapshot().towers.len(), 1);

        simulation.apply(&InteractionCommand::PlaceTower {
            archetype: TowerArchetype::Beam,
            slot: SlotId::new(8),
        });
        assert_eq!(simulation.snapshot().towers.len(), 2);
    }

    #[test]
    fn slots_snap_to_the_nearest_center() {
        let simulation = DemoSimulation::new(1);
        let center = DemoSimulation::slot_center(SlotId::new(5));

        assert_eq!(
            simulation.slot_at(center + Vec2::new(12.0, -8.0), 40.0),
            Some(SlotId::new(5))
        );
        assert_eq!(simulation.slot_at(Vec2::new(-500.0, -500.0), 40.0), None);
    }
}
