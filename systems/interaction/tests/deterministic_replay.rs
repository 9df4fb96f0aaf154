use firewall_defence_camera::{CameraConfig, CameraController};
use firewall_defence_core::{geometry::Rect, SlotId, TowerArchetype, TowerId};
use firewall_defence_interaction::{
    BoardQuery, InteractionCommand, InteractionConfig, InteractionController, TouchPhase,
    TouchSample,
};
use glam::Vec2;

const FRAME: f32 = 1.0 / 60.0;
const PLACEMENT_FRAME: usize = 10;

/// Grid of 4x3 slots, 80 world units apart, with towers on the first row.
struct GridBoard;

impl GridBoard {
    fn slot_center(slot: u32) -> Vec2 {
        Vec2::new((slot % 4) as f32 * 80.0, (slot / 4) as f32 * 80.0)
    }
}

impl BoardQuery for GridBoard {
    fn tower_at(&self, world: Vec2, radius: f32) -> Option<TowerId> {
        (0..4)
            .filter(|slot| world.distance(Self::slot_center(*slot)) <= radius)
            .min_by(|a, b| {
                world
                    .distance(Self::slot_center(*a))
                    .total_cmp(&world.distance(Self::slot_center(*b)))
            })
            .map(|slot| TowerId::new(slot + 1))
    }

    fn can_merge(&self, source: TowerId, target: TowerId) -> bool {
        source.get() % 2 == target.get() % 2
    }

    fn slot_at(&self, world: Vec2, radius: f32) -> Option<SlotId> {
        (0..12)
            .find(|slot| world.distance(Self::slot_center(*slot)) <= radius)
            .map(SlotId::new)
    }

    fn slot_free(&self, slot: SlotId) -> bool {
        slot.get() >= 4
    }

    fn tower_slot(&self, tower: TowerId) -> Option<SlotId> {
        Some(SlotId::new(tower.get() - 1))
    }
}

#[derive(Debug, PartialEq)]
struct FrameRecord {
    commands: Vec<InteractionCommand>,
    camera_position: [u32; 2],
    camera_scale: u32,
}

#[test]
fn deterministic_replay_of_gesture_script() {
    let first = replay(&script());
    let second = replay(&script());

    assert_eq!(first, second, "replay diverged between runs");

    let commands: Vec<_> = first.iter().flat_map(|frame| frame.commands.iter()).collect();
    assert!(commands
        .iter()
        .any(|command| matches!(command, InteractionCommand::MergeTowers { .. })));
    assert!(commands
        .iter()
        .any(|command| matches!(command, InteractionCommand::MoveTower { .. })));
    assert!(commands
        .iter()
        .any(|command| matches!(command, InteractionCommand::PlaceTower { .. })));
    assert_ne!(
        first.first().map(|frame| frame.camera_scale),
        first.last().map(|frame| frame.camera_scale),
        "pinch changed the zoom"
    );
}

#[test]
fn every_begun_drag_is_resolved() {
    let frames = replay(&script());
    let mut open = 0i32;
    for command in frames.iter().flat_map(|frame| frame.commands.iter()) {
        match command {
            InteractionCommand::BeginDrag { .. } => open += 1,
            InteractionCommand::MergeTowers { .. }
            | InteractionCommand::MoveTower { .. }
            | InteractionCommand::CancelDrag { .. } => open -= 1,
            _ => {}
        }
        assert!((0..=1).contains(&open), "drags never overlap");
    }
    assert_eq!(open, 0);
}

fn replay(script: &[Vec<TouchSample>]) -> Vec<FrameRecord> {
    let mut controller = InteractionController::new(InteractionConfig::default());
    let mut camera = CameraController::new(
        CameraConfig::default(),
        Rect::from_corners(Vec2::new(-200.0, -200.0), Vec2::new(600.0, 400.0)),
        Vec2::new(800.0, 600.0),
    );
    camera.set_scale(1.0);
    let mut commands = Vec::new();
    let mut records = Vec::new();

    for (index, touches) in script.iter().enumerate() {
        if index == PLACEMENT_FRAME {
            controller.arm_placement(TowerArchetype::Tesla);
        }
        controller.advance(FRAME);
        controller.handle(touches, &GridBoard, &mut camera, &mut commands);
        camera.update(FRAME);
        records.push(FrameRecord {
            commands: commands.clone(),
            camera_position: [camera.position().x.to_bits(), camera.position().y.to_bits()],
            camera_scale: camera.scale().to_bits(),
        });
    }
    records
}

/// Touch script in world coordinates, converted with the initial camera
/// (scale one, board center under the screen center). Gestures that move the
/// camera come last so earlier taps and drops land where intended.
fn script() -> Vec<Vec<TouchSample>> {
    let center = Vec2::new(200.0, 100.0);
    let screen = |world: Vec2| world - center + Vec2::new(400.0, 300.0);
    let mut frames: Vec<Vec<TouchSample>> = vec![Vec::new(); 200];
    let mut at = |frame: usize, id: u64, phase: TouchPhase, world: Vec2| {
        frames[frame].push(TouchSample::new(id, phase, screen(world)));
    };

    // Taps: select a tower, then build on a free slot once placement is armed.
    at(2, 1, TouchPhase::Began, Vec2::new(240.0, 0.0));
    at(3, 1, TouchPhase::Ended, Vec2::new(240.0, 0.0));
    at(PLACEMENT_FRAME + 2, 2, TouchPhase::Began, Vec2::new(160.0, 160.0));
    at(PLACEMENT_FRAME + 3, 2, TouchPhase::Ended, Vec2::new(160.0, 160.0));

    // Tower 1 dragged onto tower 3, which accepts the merge.
    at(20, 3, TouchPhase::Began, Vec2::new(0.0, 0.0));
    for step in 1..=16 {
        at(20 + step, 3, TouchPhase::Moved, Vec2::new(step as f32 * 10.0, 0.0));
    }
    at(37, 3, TouchPhase::Ended, Vec2::new(160.0, 0.0));

    // Tower 2 dropped onto the free slot below it.
    at(50, 4, TouchPhase::Began, Vec2::new(80.0, 0.0));
    for step in 1..=8 {
        at(50 + step, 4, TouchPhase::Moved, Vec2::new(80.0, step as f32 * 10.0));
    }
    at(59, 4, TouchPhase::Ended, Vec2::new(80.0, 80.0));

    // Drag cancelled by a second finger, then a pinch apart.
    at(70, 5, TouchPhase::Began, Vec2::new(240.0, 0.0));
    at(72, 5, TouchPhase::Moved, Vec2::new(240.0, 30.0));
    at(74, 6, TouchPhase::Began, Vec2::new(240.0, 130.0));
    for step in 1..=10 {
        at(74 + step, 6, TouchPhase::Moved, Vec2::new(240.0, 130.0 + step as f32 * 8.0));
    }
    at(90, 6, TouchPhase::Ended, Vec2::new(240.0, 210.0));
    at(92, 5, TouchPhase::Moved, Vec2::new(250.0, 40.0));
    at(95, 5, TouchPhase::Ended, Vec2::new(250.0, 40.0));

    // Flick on empty ground.
    at(120, 7, TouchPhase::Began, Vec2::new(120.0, 220.0));
    for step in 1..=5 {
        at(120 + step, 7, TouchPhase::Moved, Vec2::new(120.0 - step as f32 * 12.0, 220.0));
    }
    at(126, 7, TouchPhase::Ended, Vec2::new(60.0, 220.0));

    frames
}
