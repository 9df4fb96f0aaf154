//! Scene graph renderers for the four boss encounters.
//!
//! Every frame the simulation publishes a [`BossSnapshot`] per live boss. The
//! [`BossRenderingManager`] keeps one [`BossRenderer`] per boss id and lets it
//! diff the snapshot against what it drew last frame: new mechanic entities
//! get nodes, vanished ones are faded out or recycled and surviving ones are
//! moved in place. Renderers never touch the effect service directly; they
//! queue [`VisualCue`]s for the caller to forward.

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

mod common;
mod cyberboss;
mod overclocker;
mod trojan_wyrm;
mod void_harbinger;

use std::collections::BTreeMap;
use std::fmt::Debug;

use firewall_defence_core::{BossId, BossKind, BossSnapshot, BossState};
use firewall_defence_scene::{NodeId, NodePool, SceneGraph};
use log::debug;

pub use cyberboss::CyberbossRenderer;
pub use firewall_defence_effects::VisualCue;
pub use overclocker::OverclockerRenderer;
pub use trojan_wyrm::TrojanWyrmRenderer;
pub use void_harbinger::VoidHarbingerRenderer;

/// Mutable scene state handed to renderers for one update.
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// Scene the boss nodes live in.
    pub graph: &'a mut SceneGraph,
    /// Pool for transient mechanic nodes.
    pub pool: &'a mut NodePool,
    /// Layer every boss node is attached under.
    pub layer: NodeId,
}

impl<'a> RenderContext<'a> {
    /// Bundles the scene state for an update.
    pub fn new(graph: &'a mut SceneGraph, pool: &'a mut NodePool, layer: NodeId) -> Self {
        Self { graph, pool, layer }
    }
}

/// Keeps the nodes of a single boss in step with its snapshots.
pub trait BossRenderer: Debug {
    /// Kind of boss this renderer draws.
    fn kind(&self) -> BossKind;

    /// Applies `state` to the scene, queueing any cue the change warrants.
    ///
    /// States of another kind are ignored.
    fn update(&mut self, ctx: &mut RenderContext<'_>, state: &BossState, cues: &mut Vec<VisualCue>);

    /// Releases every node owned by the renderer.
    fn teardown(&mut self, ctx: &mut RenderContext<'_>);

    /// Number of nodes the renderer currently tracks.
    fn live_nodes(&self) -> usize;
}

/// Creates the renderer for `kind`.
#[must_use]
pub fn renderer_for(kind: BossKind) -> Box<dyn BossRenderer> {
    match kind {
        BossKind::Cyberboss => Box::new(CyberbossRenderer::new()),
        BossKind::VoidHarbinger => Box::new(VoidHarbingerRenderer::new()),
        BossKind::Overclocker => Box::new(OverclockerRenderer::new()),
        BossKind::TrojanWyrm => Box::new(TrojanWyrmRenderer::new()),
    }
}

/// One renderer per live boss, dispatched by kind.
#[derive(Debug, Default)]
pub struct BossRenderingManager {
    renderers: BTreeMap<BossId, Box<dyn BossRenderer>>,
}

impl BossRenderingManager {
    /// Creates a manager with no bosses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirrors `bosses` into the scene.
    ///
    /// Renderers are created for new ids, replaced when an id changes kind
    /// and torn down once their boss is no longer published.
    pub fn sync(
        &mut self,
        ctx: &mut RenderContext<'_>,
        bosses: &[BossSnapshot],
        cues: &mut Vec<VisualCue>,
    ) {
        let gone: Vec<BossId> = self
            .renderers
            .keys()
            .filter(|id| !bosses.iter().any(|boss| boss.id == **id))
            .copied()
            .collect();
        for id in gone {
            if let Some(mut renderer) = self.renderers.remove(&id) {
                debug!("tearing down {:?} renderer for boss {}", renderer.kind(), id.get());
                renderer.teardown(ctx);
            }
        }

        for boss in bosses {
            let kind = boss.kind();
            let stale = self
                .renderers
                .get(&boss.id)
                .is_some_and(|renderer| renderer.kind() != kind);
            if stale {
                if let Some(mut renderer) = self.renderers.remove(&boss.id) {
                    debug!(
                        "boss {} changed from {:?} to {:?}",
                        boss.id.get(),
                        renderer.kind(),
                        kind
                    );
                    renderer.teardown(ctx);
                }
            }

            let renderer = self.renderers.entry(boss.id).or_insert_with(|| {
                debug!("creating {kind:?} renderer for boss {}", boss.id.get());
                renderer_for(kind)
            });
            renderer.update(ctx, &boss.state, cues);
        }
    }

    /// Kind drawn for boss `id`, if it has a renderer.
    #[must_use]
    pub fn kind_of(&self, id: BossId) -> Option<BossKind> {
        self.renderers.get(&id).map(|renderer| renderer.kind())
    }

    /// Nodes tracked across every renderer.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.renderers.values().map(|renderer| renderer.live_nodes()).sum()
    }

    /// Number of bosses being drawn.
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// Whether no boss is being drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Tears down every renderer.
    pub fn clear(&mut self, ctx: &mut RenderContext<'_>) {
        for (_, mut renderer) in std::mem::take(&mut self.renderers) {
            renderer.teardown(ctx);
        }
    }
}
