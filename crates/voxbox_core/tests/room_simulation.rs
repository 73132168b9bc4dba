//! Integration tests for the room automaton and the threaded simulator.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxbox_core::{
    CellFlags, ModelWriter, PalettedVolume, Point, RoomConfig, RoomError, RoomGrid, RoomSimulator, Volume,
};

fn p(x: i32, y: i32, z: i32) -> Point {
    Point::new(x, y, z)
}

/// Fills roughly `density` of the grid with loose voxels of random color.
fn random_grid(size: Point, density: f64, seed: u64) -> RoomGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = RoomGrid::new(size);
    grid.bounds().for_each(|q| {
        if rng.gen_bool(density) {
            grid.set_raw(q, rng.gen_range(1..=63));
        }
    });
    grid
}

fn assert_no_illegal_flags(grid: &RoomGrid) {
    for (i, &v) in grid.as_slice().iter().enumerate() {
        assert!(CellFlags::of(v).is_legal(), "cell {i} holds attached|falling: {v:#04x}");
    }
}

#[test]
fn test_floor_attached_after_one_mark() {
    let mut grid = random_grid(p(8, 6, 8), 0.4, 1);
    grid.mark_phase();
    grid.bounds().for_each(|q| {
        if q.y == 0 && grid.raw(q) != 0 {
            assert_eq!(grid.flags(q), CellFlags::ATTACHED, "{q:?}");
        }
    });
}

#[test]
fn test_flags_stay_exclusive_across_phases() {
    let mut grid = random_grid(p(10, 10, 10), 0.3, 2);
    for i in 0..60 {
        if i % 4 == 0 {
            grid.mark_phase();
        } else {
            grid.step_phase();
        }
        assert_no_illegal_flags(&grid);
    }
}

#[test]
fn test_step_conserves_voxels() {
    let mut grid = random_grid(p(12, 9, 7), 0.35, 3);
    let before = grid.count_voxels();
    for _ in 0..40 {
        grid.step_phase();
        assert_eq!(grid.count_voxels(), before);
    }
    grid.mark_phase();
    assert_eq!(grid.count_voxels(), before);
}

#[test]
fn test_mark_is_idempotent_on_settled_stack() {
    // A floor slab with a column on top: everything is reachable in one pass.
    let mut grid = RoomGrid::new(p(4, 5, 4));
    for z in 0..4 {
        for x in 0..4 {
            grid.set_raw(p(x, 0, z), 1);
        }
    }
    for y in 1..5 {
        grid.set_raw(p(2, y, 2), 2);
    }
    grid.mark_phase();
    let once = grid.as_slice().to_vec();
    grid.mark_phase();
    assert_eq!(grid.as_slice(), once.as_slice());
}

#[test]
fn test_pile_settles_to_floor() {
    let mut grid = RoomGrid::new(p(9, 6, 9));
    for y in 1..6 {
        grid.set_raw(p(4, y, 4), 3);
    }
    for _ in 0..50 {
        grid.step_phase();
        grid.mark_phase();
    }
    assert_eq!(grid.count_voxels(), 5);
    grid.bounds().for_each(|q| {
        if grid.raw(q) != 0 {
            assert!(grid.flags(q).contains(CellFlags::ATTACHED), "{q:?} not settled");
        }
    });
}

#[test]
fn test_step_is_reproducible() {
    let mut a = random_grid(p(10, 8, 10), 0.3, 4);
    let mut b = a.clone();
    for _ in 0..10 {
        a.step_phase();
        b.step_phase();
    }
    assert_eq!(a.as_slice(), b.as_slice());
}

#[test]
fn test_timed_step_moves_voxel_down() {
    let room = RoomSimulator::with_config(&RoomConfig {
        size: [4, 4, 4],
        step_interval_ms: 5,
        mark_interval_ms: 0,
        queue_capacity: 16,
    })
    .unwrap();
    let _ = room.send(|g| g.set_raw(Point::new(1, 1, 1), 5));
    room.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let (src, dst) = room
            .send(|g| (g.raw(Point::new(1, 1, 1)), g.raw(Point::new(1, 0, 1))))
            .wait()
            .unwrap();
        if dst != 0 {
            assert_eq!(src, 0);
            assert_eq!(dst, 5 | CellFlags::FALLING.bits());
            break;
        }
        assert!(Instant::now() < deadline, "voxel never fell");
        std::thread::sleep(Duration::from_millis(2));
    }
    room.destroy();
}

#[test]
fn test_blit_round_trip_matches_colors() {
    let room = RoomSimulator::with_config(&RoomConfig {
        size: [6, 5, 4],
        step_interval_ms: 0,
        mark_interval_ms: 0,
        queue_capacity: 8,
    })
    .unwrap();
    room.start().unwrap();

    let expected = room
        .send(|g| {
            *g = random_grid(g.size(), 0.5, 7);
            g.mark_phase();
            g.as_slice().iter().map(|v| v & 0x3F).collect::<Vec<_>>()
        })
        .wait()
        .unwrap();

    let view = PalettedVolume::new(Point::new(6, 5, 4));
    let view = room.blit_to_view(view, Point::ZERO, room.bounds()).wait().unwrap();
    assert_eq!(view.as_slice(), expected.as_slice());
}

#[test]
fn test_load_model_places_and_tags() {
    let room = RoomSimulator::with_config(&RoomConfig {
        size: [8, 8, 8],
        step_interval_ms: 0,
        mark_interval_ms: 0,
        queue_capacity: 8,
    })
    .unwrap();
    room.start().unwrap();

    // Model z = 1 is one cell up in the room.
    let bytes = ModelWriter::new(2, 2, 2).voxel(0, 0, 0, 4).voxel(1, 0, 1, 5).to_bytes();
    let info = room
        .load_model(std::io::Cursor::new(bytes), p(2, 0, 3), CellFlags::ATTACHED)
        .unwrap()
        .wait()
        .unwrap()
        .unwrap();
    assert_eq!(info.voxel_count, 2);

    let (a, b) = room
        .send(|g| (g.raw(Point::new(2, 0, 3)), g.raw(Point::new(3, 1, 3))))
        .wait()
        .unwrap();
    assert_eq!(a, 4 | CellFlags::ATTACHED.bits());
    assert_eq!(b, 5 | CellFlags::ATTACHED.bits());
}

#[test]
fn test_illegal_flags_leave_room_untouched() {
    let room = RoomSimulator::new(Point::new(4, 4, 4), Duration::ZERO);
    room.start().unwrap();

    let bytes = ModelWriter::new(2, 1, 1).voxel(0, 0, 0, 1).voxel(1, 0, 0, 2).to_bytes();
    let err = room
        .load_model(std::io::Cursor::new(bytes), Point::ZERO, CellFlags::ATTACHED | CellFlags::FALLING)
        .err()
        .unwrap();
    assert!(matches!(err, RoomError::IllegalFlags(_)));
    assert_eq!(room.send(|g| g.count_voxels()).wait().unwrap(), 0);
}

#[test]
fn test_load_model_file_reports_missing_path() {
    let room = RoomSimulator::new(Point::new(4, 4, 4), Duration::ZERO);
    let err = room
        .load_model_file("/nonexistent/voxbox/room.vox", Point::ZERO, CellFlags::empty())
        .err()
        .unwrap();
    assert!(matches!(err, RoomError::Open { .. }));
}

#[test]
fn test_decode_error_arrives_through_completion() {
    let room = RoomSimulator::new(Point::new(4, 4, 4), Duration::ZERO);
    room.start().unwrap();
    let result = room
        .load_model(std::io::Cursor::new(b"nope".to_vec()), Point::ZERO, CellFlags::empty())
        .unwrap()
        .wait()
        .unwrap();
    assert!(result.is_err());
}

#[test]
fn test_many_producers_never_drop_commands() {
    let room = RoomSimulator::with_config(&RoomConfig {
        size: [16, 1, 1],
        step_interval_ms: 0,
        mark_interval_ms: 0,
        queue_capacity: 2,
    })
    .unwrap();
    room.start().unwrap();

    std::thread::scope(|s| {
        for x in 0..16 {
            let room = &room;
            s.spawn(move || {
                room.send(move |g| g.set(Point::new(x, 0, 0), 1)).wait().unwrap();
            });
        }
    });
    assert_eq!(room.send(|g| g.count_voxels()).wait().unwrap(), 16);
}
