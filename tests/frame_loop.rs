use cube_core::{
    AnimationDriver, DemoConfig, FrameLoop, ManualScheduler, Mesh, RenderContext, RenderError,
};
use nalgebra_glm::Mat4;
use std::cell::Cell;
use web_time::{Duration, Instant};

thread_local! {
    static ERRORS_LOGGED: Cell<usize> = const { Cell::new(0) };
}

/// Counts error records per test thread.
struct ErrorCounter;

impl log::Log for ErrorCounter {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() == log::Level::Error
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            ERRORS_LOGGED.with(|count| count.set(count.get() + 1));
        }
    }

    fn flush(&self) {}
}

static ERROR_COUNTER: ErrorCounter = ErrorCounter;

/// Installs the counter (once per process) and resets this thread's count.
fn count_errors() {
    if log::set_logger(&ERROR_COUNTER).is_ok() {
        log::set_max_level(log::LevelFilter::Error);
    }
    ERRORS_LOGGED.with(|count| count.set(0));
}

fn errors_logged() -> usize {
    ERRORS_LOGGED.with(Cell::get)
}

/// Records every call the frame loop makes.
#[derive(Default)]
struct RecordingContext {
    uploads: Vec<usize>,
    matrices: Vec<Mat4>,
    draws: Vec<u32>,
    fail_upload: bool,
}

impl RenderContext for RecordingContext {
    fn upload_static_mesh(&mut self, mesh: &Mesh) -> cube_core::Result<u32> {
        if self.fail_upload {
            return Err(RenderError::MeshUpload("buffer allocation failed".into()));
        }
        mesh.validate()?;
        self.uploads.push(mesh.vertices.len());
        Ok(mesh.index_count())
    }

    fn set_uniform_matrix(&mut self, mvp: &Mat4) {
        self.matrices.push(*mvp);
    }

    fn clear_and_draw(&mut self, index_count: u32) {
        // The matrix must always be set before the draw that uses it.
        assert_eq!(self.matrices.len(), self.draws.len() + 1);
        self.draws.push(index_count);
    }
}

fn driver(start: Instant) -> AnimationDriver {
    AnimationDriver::new(DemoConfig::default(), start)
}

#[test]
fn failed_context_acquisition_never_draws() {
    count_errors();
    let start = Instant::now();
    let context: cube_core::Result<RecordingContext> = Err(RenderError::ContextAcquisition(
        "WebGL2 is not available".into(),
    ));

    let result = FrameLoop::start(context, &Mesh::cube(), driver(start));

    assert!(matches!(result, Err(RenderError::ContextAcquisition(_))));
    assert_eq!(errors_logged(), 1);
}

#[test]
fn failed_mesh_upload_never_draws() {
    count_errors();
    let context = RecordingContext {
        fail_upload: true,
        ..Default::default()
    };

    let result = FrameLoop::start(Ok(context), &Mesh::cube(), driver(Instant::now()));

    assert!(matches!(result, Err(RenderError::MeshUpload(_))));
    assert_eq!(errors_logged(), 1);
}

#[test]
fn mesh_is_uploaded_before_the_first_frame() {
    let frame_loop = FrameLoop::start(
        Ok(RecordingContext::default()),
        &Mesh::cube(),
        driver(Instant::now()),
    )
    .unwrap();

    assert_eq!(frame_loop.index_count(), 36);
    assert_eq!(frame_loop.context().uploads, vec![24]);
    assert!(frame_loop.context().draws.is_empty());
}

#[test]
fn three_sixteen_millisecond_ticks_advance_by_point_eight_degrees() {
    let start = Instant::now();
    let mut frame_loop =
        FrameLoop::start(Ok(RecordingContext::default()), &Mesh::cube(), driver(start)).unwrap();

    let mut angles = Vec::new();
    let mut now = start;
    for _ in 0..3 {
        now += Duration::from_millis(16);
        angles.push(frame_loop.tick(now).angle);
    }

    for (i, angle) in angles.iter().enumerate() {
        let expected = 0.8 * (i + 1) as f32;
        assert!((angle - expected).abs() < 1e-4, "tick {i}: {angle}");
        assert!((0.0..360.0).contains(angle));
    }
    assert!(angles.windows(2).all(|pair| pair[0] < pair[1]));

    // The scheduler-driven loop continues from the same state.
    let mut scheduler = ManualScheduler::uniform(now, Duration::from_millis(16), 3);
    assert_eq!(frame_loop.run(&mut scheduler), 3);
    let context = frame_loop.context();
    assert_eq!(context.draws, vec![36; 6]);
    assert_eq!(context.matrices.len(), 6);
    assert!((frame_loop.driver().angle() - 4.8).abs() < 1e-4);
}

#[test]
fn run_produces_one_frame_per_scheduled_timestamp() {
    let start = Instant::now();
    let mut frame_loop =
        FrameLoop::start(Ok(RecordingContext::default()), &Mesh::cube(), driver(start)).unwrap();

    let mut scheduler = ManualScheduler::new(
        start,
        [
            Duration::from_millis(16),
            Duration::from_millis(17),
            Duration::from_millis(33),
            Duration::from_millis(0),
        ],
    );

    assert_eq!(frame_loop.run(&mut scheduler), 4);
    assert!((frame_loop.driver().angle() - 50.0 * 0.066).abs() < 1e-4);

    // The zero-interval frame redraws with an unchanged matrix.
    let matrices = &frame_loop.context().matrices;
    assert_eq!(matrices[2], matrices[3]);
}

#[test]
fn angle_wraps_during_a_long_run() {
    let start = Instant::now();
    let mut frame_loop =
        FrameLoop::start(Ok(RecordingContext::default()), &Mesh::cube(), driver(start)).unwrap();

    // 8 seconds at 50°/s is 400°.
    let mut scheduler = ManualScheduler::uniform(start, Duration::from_millis(500), 16);
    frame_loop.run(&mut scheduler);

    assert!((frame_loop.driver().angle() - 40.0).abs() < 1e-3);
}
