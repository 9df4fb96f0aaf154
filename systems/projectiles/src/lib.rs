#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Swept-circle projectile collision and pooled projectile visuals.

mod visuals;

use firewall_defence_core::{
    geometry::{swept_circle_hit, Rect},
    CollisionTarget, EnemyId, ProjectileId, ProjectileSnapshot,
};
use glam::Vec2;

pub use visuals::ProjectileVisuals;

/// Contact between a projectile and an enemy during the last step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileHit {
    /// Projectile that made contact.
    pub projectile: ProjectileId,
    /// Enemy that was hit.
    pub enemy: EnemyId,
    /// Normalised time of contact within the step, in `0.0..=1.0`.
    pub time: f32,
    /// Projectile center at the moment of contact.
    pub point: Vec2,
}

/// Collision system that reuses scratch buffers to avoid per-frame allocations.
#[derive(Debug, Default)]
pub struct ProjectileCollision {
    projectile_workspace: Vec<ProjectileWorkspace>,
    target_workspace: Vec<CollisionTarget>,
    candidate_workspace: Vec<Candidate>,
}

impl ProjectileCollision {
    /// Creates a collision system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests every projectile's motion during the last step against every target.
    ///
    /// The output buffer is cleared first. Hits are grouped by ascending
    /// projectile id. A non-piercing projectile reports only its earliest hit,
    /// with ties going to the lower enemy id; a piercing projectile reports
    /// every hit ordered by time and then enemy id.
    pub fn handle(
        &mut self,
        projectiles: &[ProjectileSnapshot],
        targets: &[CollisionTarget],
        out: &mut Vec<ProjectileHit>,
    ) {
        out.clear();
        if projectiles.is_empty() || targets.is_empty() {
            return;
        }

        self.prepare_projectile_workspace(projectiles);
        self.prepare_target_workspace(targets);
        if self.target_workspace.is_empty() {
            return;
        }

        for projectile in &self.projectile_workspace {
            self.candidate_workspace.clear();

            for target in &self.target_workspace {
                let reach = projectile.bounds.expand(target.radius);
                if !reach.contains(target.center) {
                    continue;
                }

                let Some(time) = swept_circle_hit(
                    projectile.start,
                    projectile.end,
                    projectile.radius,
                    target.center,
                    target.radius,
                ) else {
                    continue;
                };

                self.candidate_workspace.push(Candidate {
                    time,
                    enemy: target.id,
                });
            }

            if self.candidate_workspace.is_empty() {
                continue;
            }

            self.candidate_workspace.sort_by(Candidate::ordering);
            let take = if projectile.piercing {
                self.candidate_workspace.len()
            } else {
                1
            };

            for candidate in self.candidate_workspace.iter().take(take) {
                out.push(ProjectileHit {
                    projectile: projectile.id,
                    enemy: candidate.enemy,
                    time: candidate.time,
                    point: projectile.start.lerp(projectile.end, candidate.time),
                });
            }
        }
    }

    fn prepare_projectile_workspace(&mut self, projectiles: &[ProjectileSnapshot]) {
        self.projectile_workspace.clear();
        self.projectile_workspace.reserve(projectiles.len());

        for snapshot in projectiles {
            if !snapshot.position.is_finite() || !snapshot.previous.is_finite() {
                continue;
            }
            let radius = snapshot.radius.max(0.0);
            self.projectile_workspace.push(ProjectileWorkspace {
                id: snapshot.id,
                start: snapshot.previous,
                end: snapshot.position,
                radius,
                piercing: snapshot.piercing,
                bounds: Rect::from_corners(snapshot.previous, snapshot.position).expand(radius),
            });
        }

        self.projectile_workspace.sort_by_key(|workspace| workspace.id);
    }

    fn prepare_target_workspace(&mut self, targets: &[CollisionTarget]) {
        self.target_workspace.clear();
        self.target_workspace.extend(
            targets
                .iter()
                .filter(|target| target.center.is_finite() && target.radius >= 0.0)
                .copied(),
        );
        self.target_workspace.sort_by_key(|target| target.id);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ProjectileWorkspace {
    id: ProjectileId,
    start: Vec2,
    end: Vec2,
    radius: f32,
    piercing: bool,
    bounds: Rect,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    time: f32,
    enemy: EnemyId,
}

impl Candidate {
    fn ordering(a: &Self, b: &Self) -> std::cmp::Ordering {
        a.time.total_cmp(&b.time).then(a.enemy.cmp(&b.enemy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewall_defence_core::Color;

    fn projectile(id: u32, from: Vec2, to: Vec2, piercing: bool) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: ProjectileId::new(id),
            previous: from,
            position: to,
            radius: 1.0,
            color: Color::WHITE,
            piercing,
        }
    }

    fn enemy(id: u32, x: f32, y: f32) -> CollisionTarget {
        CollisionTarget {
            id: EnemyId::new(id),
            center: Vec2::new(x, y),
            radius: 4.0,
        }
    }

    #[test]
    fn fast_projectile_does_not_tunnel_through_enemy() {
        let mut collision = ProjectileCollision::new();
        let mut hits = Vec::new();

        collision.handle(
            &[projectile(1, Vec2::ZERO, Vec2::new(200.0, 0.0), false)],
            &[enemy(7, 100.0, 0.0)],
            &mut hits,
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].enemy, EnemyId::new(7));
        assert!((hits[0].time - 0.475).abs() < 1e-5);
        assert!((hits[0].point - Vec2::new(95.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn non_piercing_projectile_reports_earliest_hit_only() {
        let mut collision = ProjectileCollision::new();
        let mut hits = Vec::new();

        collision.handle(
            &[projectile(1, Vec2::ZERO, Vec2::new(100.0, 0.0), false)],
            &[enemy(3, 80.0, 0.0), enemy(9, 30.0, 0.0)],
            &mut hits,
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].enemy, EnemyId::new(9));
    }

    #[test]
    fn simultaneous_hits_prefer_lower_enemy_id() {
        let mut collision = ProjectileCollision::new();
        let mut hits = Vec::new();

        collision.handle(
            &[projectile(1, Vec2::ZERO, Vec2::new(100.0, 0.0), false)],
            &[enemy(5, 50.0, 2.0), enemy(2, 50.0, -2.0)],
            &mut hits,
        );

        assert_eq!(hits[0].enemy, EnemyId::new(2));
    }

    #[test]
    fn piercing_projectile_reports_every_hit_in_time_order() {
        let mut collision = ProjectileCollision::new();
        let mut hits = Vec::new();

        collision.handle(
            &[projectile(1, Vec2::ZERO, Vec2::new(100.0, 0.0), true)],
            &[enemy(3, 80.0, 0.0), enemy(9, 30.0, 0.0), enemy(4, 50.0, 40.0)],
            &mut hits,
        );

        let order: Vec<_> = hits.iter().map(|hit| hit.enemy.get()).collect();
        assert_eq!(order, vec![9, 3]);
    }

    #[test]
    fn overlap_at_start_counts_as_immediate_hit() {
        let mut collision = ProjectileCollision::new();
        let mut hits = Vec::new();

        collision.handle(
            &[projectile(1, Vec2::new(1.0, 0.0), Vec2::new(-50.0, 0.0), false)],
            &[enemy(1, 0.0, 0.0)],
            &mut hits,
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].time, 0.0);
    }

    #[test]
    fn output_is_grouped_by_projectile_id() {
        let mut collision = ProjectileCollision::new();
        let mut hits = vec![ProjectileHit {
            projectile: ProjectileId::new(99),
            enemy: EnemyId::new(99),
            time: 0.0,
            point: Vec2::ZERO,
        }];

        collision.handle(
            &[
                projectile(8, Vec2::new(0.0, 10.0), Vec2::new(100.0, 10.0), false),
                projectile(2, Vec2::ZERO, Vec2::new(100.0, 0.0), false),
            ],
            &[enemy(1, 50.0, 0.0), enemy(4, 50.0, 10.0)],
            &mut hits,
        );

        let order: Vec<_> = hits.iter().map(|hit| hit.projectile.get()).collect();
        assert_eq!(order, vec![2, 8]);
    }

    #[test]
    fn missing_inputs_clear_output() {
        let mut collision = ProjectileCollision::new();
        let mut hits = vec![ProjectileHit {
            projectile: ProjectileId::new(1),
            enemy: EnemyId::new(1),
            time: 0.5,
            point: Vec2::ZERO,
        }];

        collision.handle(&[], &[enemy(1, 0.0, 0.0)], &mut hits);

        assert!(hits.is_empty());
    }
}
