use std::time::{Duration, Instant};

use dotflip_core::interaction::{Cursor, InputEvent, Interaction, Key};
use dotflip_core::util::{init_tracing, panic_message};
use dotflip_core::viewport::{Rotation, fit_cell_size};
use dotflip_core::{
    CoordinateMapper, Dimensions, FrameEnvelope, FrameError, Grid, GridGeometry, Layout, Matrix,
    Point, TransformConfig, ViewportState, transform,
};
use proptest::prelude::*;

fn small_geometry(cols: usize, rows: usize) -> GridGeometry {
    GridGeometry {
        grid_cols: 1,
        grid_rows: 1,
        cols_per_grid: cols,
        rows_per_grid: rows,
    }
}

/// 2×3 grid with cells (0,0) and (1,0) lit.
fn fixture_grid() -> Grid {
    let mut grid = Grid::new(small_geometry(3, 2));
    grid.set_cell(0, 0, true);
    grid.set_cell(1, 0, true);
    grid
}

fn rows(m: &Matrix) -> Vec<Vec<u8>> {
    m.rows().to_vec()
}

// ============================================================================
// Matrix Tests
// ============================================================================

#[test]
fn test_matrix_new_valid() {
    let m = Matrix::new(vec![vec![0, 1, 0], vec![1, 1, 1]]).unwrap();
    assert_eq!(m.width(), 3);
    assert_eq!(m.height(), 2);
    assert_eq!(m.count_on(), 4);
    assert!(m.is_on(1, 0));
    assert!(!m.is_on(0, 0));
    assert_eq!(m.get(5, 5), None);
}

#[test]
fn test_matrix_new_ragged() {
    let err = Matrix::new(vec![vec![0, 1], vec![1]]).unwrap_err();
    assert!(matches!(
        err,
        FrameError::Ragged {
            row: 1,
            len: 1,
            expected: 2
        }
    ));
    assert!(err.is_schema());
}

#[test]
fn test_matrix_new_non_binary() {
    let err = Matrix::new(vec![vec![0, 2]]).unwrap_err();
    assert!(matches!(err, FrameError::NonBinary { x: 1, y: 0, .. }));
}

#[test]
fn test_matrix_filled() {
    let m = Matrix::filled(84, 42, true);
    assert_eq!(m.dimensions(), Dimensions::new(84, 42));
    assert_eq!(m.count_on(), 84 * 42);
}

#[test]
fn test_matrix_empty_is_zero_by_zero() {
    let m = Matrix::new(vec![]).unwrap();
    assert_eq!(m.dimensions(), Dimensions::new(0, 0));
}

#[test]
fn test_dimensions_display() {
    assert_eq!(Dimensions::new(84, 41).to_string(), "84x41");
}

#[test]
fn test_matrix_ascii() {
    let m = Matrix::new(vec![vec![1, 0], vec![0, 1]]).unwrap();
    assert_eq!(m.to_ascii(), "⬤ ·\n· ⬤");
}

#[test]
fn test_matrix_structural_equality() {
    let a = Matrix::new(vec![vec![1, 0]]).unwrap();
    let b = Matrix::new(vec![vec![1, 0]]).unwrap();
    let c = Matrix::new(vec![vec![0, 1]]).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// ============================================================================
// FrameEnvelope Tests
// ============================================================================

#[test]
fn test_envelope_encode_shape() {
    let env = FrameEnvelope::matrix(Matrix::new(vec![vec![0, 1]]).unwrap());
    assert_eq!(env.encode().unwrap(), r#"{"type":"matrix","payload":[[0,1]]}"#);
}

#[test]
fn test_envelope_decode_valid() {
    let env = FrameEnvelope::decode(r#"{"type":"matrix","payload":[[1,0],[0,1]]}"#).unwrap();
    assert_eq!(rows(env.payload()), vec![vec![1, 0], vec![0, 1]]);
}

#[test]
fn test_envelope_decode_malformed_json() {
    let err = FrameEnvelope::decode("{not json").unwrap_err();
    assert!(matches!(err, FrameError::Parse(_)));
    assert!(!err.is_schema());
}

#[test]
fn test_envelope_decode_unknown_type() {
    let err = FrameEnvelope::decode(r#"{"type":"hello","payload":[[1]]}"#).unwrap_err();
    match err {
        FrameError::UnknownType(t) => assert_eq!(t, "hello"),
        other => panic!("Expected UnknownType, got {other:?}"),
    }
}

#[test]
fn test_envelope_decode_rejects_array_form() {
    let err = FrameEnvelope::decode(r#"["matrix",[[0,1],[1,0]]]"#).unwrap_err();
    assert!(matches!(err, FrameError::NotAnEnvelope));
    assert!(err.is_schema());
}

#[test]
fn test_envelope_decode_rejects_scalar_json() {
    for text in ["42", r#""matrix""#, "null"] {
        let err = FrameEnvelope::decode(text).unwrap_err();
        assert!(matches!(err, FrameError::NotAnEnvelope), "{text}: {err:?}");
    }
}

#[test]
fn test_envelope_decode_numeric_type_is_schema_error() {
    let err = FrameEnvelope::decode(r#"{"type":7,"payload":[[0]]}"#).unwrap_err();
    match &err {
        FrameError::UnknownType(t) => assert_eq!(t, "7"),
        other => panic!("Expected UnknownType, got {other:?}"),
    }
    assert!(err.is_schema());
}

#[test]
fn test_envelope_decode_missing_type() {
    let err = FrameEnvelope::decode(r#"{"payload":[[0]]}"#).unwrap_err();
    assert!(matches!(err, FrameError::UnknownType(ref t) if t.is_empty()));
}

#[test]
fn test_envelope_decode_missing_payload() {
    let err = FrameEnvelope::decode(r#"{"type":"matrix"}"#).unwrap_err();
    assert!(matches!(err, FrameError::NotAMatrix));
}

#[test]
fn test_envelope_decode_non_binary_cell() {
    let err = FrameEnvelope::decode(r#"{"type":"matrix","payload":[[0,1],[1,7]]}"#).unwrap_err();
    assert!(matches!(err, FrameError::NonBinary { x: 1, y: 1, .. }));
}

#[test]
fn test_envelope_decode_ragged() {
    let err = FrameEnvelope::decode(r#"{"type":"matrix","payload":[[0,1],[1]]}"#).unwrap_err();
    assert!(matches!(err, FrameError::Ragged { row: 1, .. }));
}

#[test]
fn test_envelope_serde_rejects_invalid_payload() {
    let result: Result<FrameEnvelope, _> =
        serde_json::from_str(r#"{"type":"matrix","payload":[[0,1],[1]]}"#);
    assert!(result.is_err());
}

// ============================================================================
// Grid Tests
// ============================================================================

#[test]
fn test_grid_default_geometry() {
    let grid = Grid::default();
    assert_eq!(grid.cols(), 84);
    assert_eq!(grid.rows(), 42);
}

#[test]
fn test_grid_set_cell_in_bounds() {
    let mut grid = Grid::new(small_geometry(4, 3));
    grid.set_cell(3, 2, true);
    assert_eq!(grid.get(3, 2).map(|c| c.active), Some(true));
}

#[test]
fn test_grid_set_cell_out_of_bounds_is_noop() {
    let mut grid = Grid::new(small_geometry(4, 3));
    grid.set_cell(4, 0, true);
    grid.set_cell(0, 3, true);
    assert_eq!(grid.snapshot().count_on(), 0);
}

#[test]
fn test_grid_writes_dropped_while_panning() {
    let mut grid = Grid::new(small_geometry(4, 3));
    grid.set_panning(true);
    grid.set_cell(1, 1, true);
    assert_eq!(grid.snapshot().count_on(), 0);

    grid.set_panning(false);
    grid.set_cell(1, 1, true);
    assert_eq!(grid.snapshot().count_on(), 1);
}

#[test]
fn test_grid_clear() {
    let mut grid = fixture_grid();
    grid.clear();
    assert_eq!(grid.snapshot().count_on(), 0);
}

#[test]
fn test_grid_snapshot_is_a_copy() {
    let mut grid = fixture_grid();
    let snap = grid.snapshot();
    grid.clear();
    assert_eq!(snap.count_on(), 2);
}

#[test]
fn test_grid_reshape() {
    let mut grid = fixture_grid();
    assert!(!grid.reshape(small_geometry(3, 2)));
    assert_eq!(grid.snapshot().count_on(), 2);

    assert!(grid.reshape(small_geometry(5, 4)));
    assert_eq!(grid.cols(), 5);
    assert_eq!(grid.rows(), 4);
    assert_eq!(grid.snapshot().count_on(), 0);
}

#[test]
fn test_grid_load_clips() {
    let mut grid = Grid::new(small_geometry(2, 2));
    let m = Matrix::filled(3, 3, true);
    grid.load(&m);
    assert_eq!(grid.snapshot(), Matrix::filled(2, 2, true));
}

// ============================================================================
// Transform Tests
// ============================================================================

#[test]
fn test_transform_identity() {
    let m = transform(&fixture_grid(), &TransformConfig::default());
    assert_eq!(rows(&m), vec![vec![1, 1, 0], vec![0, 0, 0]]);
}

#[test]
fn test_transform_mirror_h() {
    let config = TransformConfig {
        mirror_h: true,
        ..Default::default()
    };
    let m = transform(&fixture_grid(), &config);
    assert_eq!(rows(&m), vec![vec![0, 1, 1], vec![0, 0, 0]]);
}

#[test]
fn test_transform_mirror_v() {
    let config = TransformConfig {
        mirror_v: true,
        ..Default::default()
    };
    let m = transform(&fixture_grid(), &config);
    assert_eq!(rows(&m), vec![vec![0, 0, 0], vec![1, 1, 0]]);
}

#[test]
fn test_transform_invert() {
    let config = TransformConfig {
        invert: true,
        ..Default::default()
    };
    let m = transform(&fixture_grid(), &config);
    assert_eq!(rows(&m), vec![vec![0, 0, 1], vec![1, 1, 1]]);
}

#[test]
fn test_transform_all_flags() {
    let config = TransformConfig {
        mirror_h: true,
        mirror_v: true,
        invert: true,
        layout: Layout::Landscape,
    };
    let m = transform(&fixture_grid(), &config);
    assert_eq!(rows(&m), vec![vec![1, 1, 1], vec![1, 0, 0]]);
}

#[test]
fn test_transform_ignores_layout() {
    let config = TransformConfig {
        layout: Layout::Portrait,
        ..Default::default()
    };
    let m = transform(&fixture_grid(), &config);
    assert_eq!(m.dimensions(), Dimensions::new(3, 2));
    assert_eq!(rows(&m), vec![vec![1, 1, 0], vec![0, 0, 0]]);
}

// ============================================================================
// CoordinateMapper Tests
// ============================================================================

fn wall_mapper(layout: Layout) -> CoordinateMapper {
    CoordinateMapper::new(800.0, 600.0, 84, 42, layout)
}

#[test]
fn test_round_trip_landscape() {
    let mapper = wall_mapper(Layout::Landscape);
    let viewport = ViewportState::default();
    let p = mapper.cell_center_to_screen(&viewport, 3, 5);
    assert_eq!(p, Point::new(-216.0, 52.0));
    assert_eq!(mapper.screen_to_cell(&viewport, p), (3, 5));
}

#[test]
fn test_round_trip_portrait() {
    let mapper = wall_mapper(Layout::Portrait);
    let viewport = ViewportState::default();
    let p = mapper.cell_center_to_screen(&viewport, 3, 5);
    assert_eq!(p, Point::new(648.0, -316.0));
    assert_eq!(mapper.screen_to_cell(&viewport, p), (3, 5));
}

#[test]
fn test_portrait_inverse_rotation() {
    let inverse = Rotation::PORTRAIT.inverse();
    assert_eq!(inverse.apply(Point::new(1.0, 2.0)), Point::new(2.0, -1.0));
    let p = Point::new(-3.5, 7.25);
    assert_eq!(inverse.apply(Rotation::PORTRAIT.apply(p)), p);
}

#[test]
fn test_screen_to_cell_not_clamped() {
    let mapper = wall_mapper(Layout::Landscape);
    let viewport = ViewportState::default();
    let (gx, gy) = mapper.screen_to_cell(&viewport, Point::new(-10_000.0, 300.0));
    assert!(gx < 0);
    assert_eq!(gy, 21);
    assert_eq!(mapper.in_bounds(gx, gy), None);
    assert_eq!(mapper.in_bounds(83, 41), Some((83, 41)));
    assert_eq!(mapper.in_bounds(84, 0), None);
}

#[test]
fn test_zoom_scales_offset() {
    let mut viewport = ViewportState {
        offset_x: 10.0,
        offset_y: -20.0,
        ..Default::default()
    };
    viewport.zoom_to(32);
    assert_eq!(viewport.cell_size, 32);
    assert_eq!(viewport.offset_x, 20.0);
    assert_eq!(viewport.offset_y, -40.0);

    viewport.reset_offset();
    assert_eq!((viewport.offset_x, viewport.offset_y), (0.0, 0.0));
}

#[test]
fn test_zoom_by_clamps() {
    let mut viewport = ViewportState::default();
    viewport.zoom_by(1000);
    assert_eq!(viewport.cell_size, 80);
    viewport.zoom_by(-1000);
    assert_eq!(viewport.cell_size, 8);
}

#[test]
fn test_fit_cell_size() {
    assert_eq!(fit_cell_size(1366.0, 768.0, 84, 42, Layout::Landscape), 15);
    assert_eq!(fit_cell_size(1366.0, 768.0, 84, 42, Layout::Portrait), 8);
    assert_eq!(fit_cell_size(10.0, 10.0, 84, 42, Layout::Landscape), 1);
}

proptest! {
    #[test]
    fn prop_centroid_round_trip(
        cell_size in 1u32..64,
        ox in -500i32..500,
        oy in -500i32..500,
        gx in 0i64..84,
        gy in 0i64..42,
        portrait in any::<bool>(),
    ) {
        let layout = if portrait { Layout::Portrait } else { Layout::Landscape };
        let mapper = wall_mapper(layout);
        let viewport = ViewportState {
            offset_x: f64::from(ox),
            offset_y: f64::from(oy),
            cell_size,
            is_panning: false,
        };
        let p = mapper.cell_center_to_screen(&viewport, gx, gy);
        prop_assert_eq!(mapper.screen_to_cell(&viewport, p), (gx, gy));
    }
}

// ============================================================================
// Interaction Tests
// ============================================================================

#[test]
fn test_drag_lights_cell_then_releases() {
    let mapper = wall_mapper(Layout::Landscape);
    let mut grid = Grid::default();
    let mut input = Interaction::new(ViewportState::default(), Duration::from_millis(1000));
    let t0 = Instant::now();

    let p = mapper.cell_center_to_screen(input.viewport(), 3, 5);
    input.handle(InputEvent::PointerDown(p), t0, &mapper, &mut grid);
    assert!(grid.get(3, 5).unwrap().active);
    assert_eq!(input.pending_releases(), 1);

    assert_eq!(input.tick(t0 + Duration::from_millis(500), &mut grid), 0);
    assert!(grid.get(3, 5).unwrap().active);

    assert_eq!(input.tick(t0 + Duration::from_millis(1000), &mut grid), 1);
    assert!(!grid.get(3, 5).unwrap().active);
}

#[test]
fn test_move_without_press_does_not_draw() {
    let mapper = wall_mapper(Layout::Landscape);
    let mut grid = Grid::default();
    let mut input = Interaction::default();
    let p = mapper.cell_center_to_screen(input.viewport(), 1, 1);
    input.handle(InputEvent::PointerMove(p), Instant::now(), &mapper, &mut grid);
    assert_eq!(grid.snapshot().count_on(), 0);
}

#[test]
fn test_space_drag_pans_and_blocks_writes() {
    let mapper = wall_mapper(Layout::Landscape);
    let mut grid = Grid::default();
    let mut input = Interaction::default();
    let now = Instant::now();

    assert_eq!(input.cursor(), Cursor::Crosshair);
    input.handle(InputEvent::KeyDown(Key::Space), now, &mapper, &mut grid);
    assert_eq!(input.cursor(), Cursor::Grab);

    input.handle(InputEvent::PointerDown(Point::new(100.0, 100.0)), now, &mapper, &mut grid);
    assert_eq!(input.cursor(), Cursor::Grabbing);
    assert!(grid.is_panning());

    input.handle(InputEvent::PointerMove(Point::new(130.0, 90.0)), now, &mapper, &mut grid);
    assert_eq!(input.viewport().offset_x, 30.0);
    assert_eq!(input.viewport().offset_y, -10.0);
    assert_eq!(grid.snapshot().count_on(), 0);

    grid.set_cell(0, 0, true);
    assert_eq!(grid.snapshot().count_on(), 0);

    input.handle(InputEvent::KeyUp(Key::Space), now, &mapper, &mut grid);
    assert!(!grid.is_panning());
    assert_eq!(input.cursor(), Cursor::Crosshair);
}

#[test]
fn test_panned_view_still_hits_correct_cell() {
    let mapper = wall_mapper(Layout::Portrait);
    let mut grid = Grid::default();
    let mut input = Interaction::default();
    input.viewport_mut().offset_x = 37.0;
    input.viewport_mut().offset_y = -12.0;

    let p = mapper.cell_center_to_screen(input.viewport(), 10, 20);
    input.handle(InputEvent::PointerDown(p), Instant::now(), &mapper, &mut grid);
    assert!(grid.get(10, 20).unwrap().active);
    assert_eq!(grid.snapshot().count_on(), 1);
}

// ============================================================================
// Logging Tests
// ============================================================================

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_panic_message_payloads() {
    let static_str = std::panic::catch_unwind(|| panic!("wall on fire")).unwrap_err();
    assert_eq!(panic_message(static_str.as_ref()), "wall on fire");

    let formatted = std::panic::catch_unwind(|| panic!("panel {} stuck", 7)).unwrap_err();
    assert_eq!(panic_message(formatted.as_ref()), "panel 7 stuck");

    let opaque: Box<dyn std::any::Any + Send> = Box::new(42u8);
    assert_eq!(panic_message(opaque.as_ref()), "<non-string panic payload>");
}
