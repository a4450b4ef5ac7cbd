//! Scripted editing session: draws a polygon and a line, drags a vertex and
//! selects the result, printing the emitted events.
//!
//! Run with `cargo run --example session`; set `RUST_LOG=geoedit=debug` to
//! follow snapping and rebuilds.

use geoedit::camera::Camera;
use geoedit::config::EditorConfig;
use geoedit::geometry::GeometryKind;
use geoedit::interaction::{Button, PointerEvent};
use geoedit::layer::GeometryLayer;
use geoedit::math::{Point2, Point3, Vector3};
use geoedit::snap::SnapIndex;
use geoedit::{EditSession, GeoeditError};

fn ndc_of(camera: &Camera, world: Point3) -> Point2 {
    let projected = camera.view_projection().transform_point(&world);
    Point2::new(projected.x, projected.y)
}

fn click(session: &mut EditSession, ndc: Point2, button: Button) {
    session.handle_pointer(&PointerEvent::moved(ndc));
    session.handle_pointer(&PointerEvent::down(button, ndc));
    session.handle_pointer(&PointerEvent::up(button, ndc));
}

fn report(session: &mut EditSession, step: &str) {
    for event in session.drain_events() {
        println!("[{step}] {event:?}");
    }
    let changes = session.drain_render_changes();
    if !changes.is_empty() {
        println!("[{step}] {} render change(s)", changes.len());
    }
}

fn main() -> Result<(), GeoeditError> {
    let config = EditorConfig::discover()?;

    // Default: WARN for everything, the configured level for geoedit.
    // Override with RUST_LOG env var (e.g. RUST_LOG=geoedit=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive(config.logging.directive().parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let camera = Camera::perspective(
        Point3::new(5.0, 5.0, 40.0),
        Point3::new(5.0, 5.0, 0.0),
        Vector3::y(),
        std::f64::consts::FRAC_PI_4,
        1.0,
        0.1,
        1000.0,
    )?;

    let mut session = EditSession::new(config);
    session.set_camera(Some(camera.clone()));
    let layer = session.add_layer(GeometryLayer::new("sketch"));
    session.add_snap_index(SnapIndex::from_sources(vec![layer]));

    let draw = session.add_draw(layer, GeometryKind::Polygon)?;
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
        click(&mut session, ndc_of(&camera, Point3::new(x, y, 0.0)), Button::Primary);
    }
    click(&mut session, ndc_of(&camera, Point3::new(5.0, 5.0, 0.0)), Button::Secondary);
    report(&mut session, "draw");
    session.set_interaction_active(draw, false)?;

    let modify = session.add_modify(layer)?;
    click(&mut session, ndc_of(&camera, Point3::new(10.0, 10.0, 0.0)), Button::Primary);
    session.handle_pointer(&PointerEvent::moved(ndc_of(&camera, Point3::new(12.0, 12.5, 0.0))));
    click(&mut session, ndc_of(&camera, Point3::new(12.0, 12.5, 0.0)), Button::Primary);
    report(&mut session, "modify");
    session.set_interaction_active(modify, false)?;

    session.add_select(layer)?;
    click(&mut session, ndc_of(&camera, Point3::new(4.0, 4.0, 0.0)), Button::Primary);
    report(&mut session, "select");

    if let Some(bbox) = session.bbox(layer)? {
        println!("layer extent: {:?} .. {:?}", bbox.min, bbox.max);
    }
    Ok(())
}
