//! Scene demo application
//!
//! Builds a small VR scene on the in-memory backend: a head-locked HUD, a
//! spinning panel and a panel that drifts up and fades out. Runs a few seconds of frames
//! through the frame driver and logs what reached the native side.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use std::thread;
use std::time::Duration;

use vr_scene::foundation::logging;
use vr_scene::foundation::math::constants::DEG_TO_RAD;
use vr_scene::prelude::*;

const FRAMES: u64 = 180;
const FRAME_TIME: Duration = Duration::from_millis(11);

/// Rotates its entity about +Y
struct Spin {
    degrees_per_second: f32,
    angle: f32,
}

impl Component for Spin {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, frame: &FrameInput) {
        self.angle += self.degrees_per_second * DEG_TO_RAD * frame.delta_seconds;
        ctx.set_rotation(Quat::from_euler_angles(0.0, self.angle, 0.0));
    }
}

/// Logs root activation
struct Banner;

impl Component for Banner {
    fn on_scene_init(&mut self, ctx: &mut ComponentContext<'_>) {
        log::info!("Scene initialized with {} entities", ctx.scene().len());
    }

    fn on_start_rendering(&mut self, _ctx: &mut ComponentContext<'_>) {
        log::info!("Scene started rendering");
    }

    fn on_stop_rendering(&mut self, _ctx: &mut ComponentContext<'_>) {
        log::info!("Scene stopped rendering");
    }
}

fn build_scene(scene: &mut Scene) {
    let root = scene.root();
    scene.add_component(root, Banner);

    let camera = scene.create_entity();
    scene.set_id_str(camera, "camera");
    scene.add_component(camera, CameraComponent::new());
    scene.add_child(root, camera);

    let hud = scene.create_entity();
    scene.set_id_str(hud, "hud");
    scene.set_position(hud, Vec3::new(0.0, -0.3, -1.5));
    scene.add_component(hud, GeometryComponent::quad(0.6, 0.2));
    scene.add_component(hud, SurfaceRendererComponent::new());
    scene.add_child(camera, hud);

    let spinner = scene.create_entity();
    scene.set_id_str(spinner, "spinner");
    scene.set_position(spinner, Vec3::new(0.0, 1.5, -4.0));
    scene.add_component(spinner, GeometryComponent::quad(1.6, 0.9));
    scene.add_component(
        spinner,
        SurfaceRendererComponent::new().with_stereo_mode(StereoMode::TopBottom),
    );
    scene.add_component(spinner, Spin { degrees_per_second: 45.0, angle: 0.0 });
    scene.add_child(root, spinner);

    let fading = scene.create_entity();
    scene.set_id_str(fading, "fading");
    scene.set_position(fading, Vec3::new(2.0, 1.5, -4.0));
    scene.add_component(fading, GeometryComponent::sphere_patch(60.0 * DEG_TO_RAD));
    scene.add_component(fading, SurfaceRendererComponent::new());
    scene.add_child(root, fading);
    let fade = AnimatorComponent::new()
        .move_by(Vec3::new(0.0, 0.5, 0.0))
        .opacity_to(0.0)
        .duration(1.0)
        .delay(0.5)
        .on_end(|ctx| {
            log::info!("Panel faded out, hiding it");
            let entity = ctx.entity();
            ctx.scene_mut().set_visible(entity, false);
        });
    scene.animate(fading, fade);

    let sky = scene.create_entity();
    scene.set_id_str(sky, "sky");
    scene.set_scale(sky, Vec3::new(100.0, 100.0, 100.0));
    scene.add_component(sky, GeometryComponent::globe());
    scene.add_component(sky, SurfaceRendererComponent::new());
    scene.add_child(root, sky);

    log::info!("Built scene with {} entities", scene.len());
}

fn report(scene: &Scene) {
    let root = scene.root();
    let Some(backend) = scene.backend_as::<RecordingBackend>() else {
        return;
    };

    for name in ["camera", "hud", "spinner", "fading", "sky"] {
        let Some(entity) = scene.find_by_name(root, name) else {
            continue;
        };
        let native = scene.native_handle(entity);
        let matrix = native.and_then(|handle| backend.world_matrix(handle));
        log::info!(
            "{:>8}: shown={} renderable={} opacity={:.2} world translation={:?}",
            name,
            scene.is_shown(entity),
            scene.is_renderable(entity),
            scene.effective_opacity(entity).unwrap_or_default(),
            matrix.map(|m| [m[12], m[13], m[14]]),
        );
    }

    log::info!("Native calls: {:?}", backend.stats());
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load_from_file(path)?,
        None => SceneConfig::default().with_frame_stats(true),
    };

    logging::init_with_level(&config.log_level);

    log::info!("Starting scene demo");

    let mut driver = FrameDriver::from_config(RecordingBackend::new(), config)?;
    build_scene(driver.scene_mut());

    // Simulated head tracking, pushed from another thread like a sensor callback
    let sender = driver.task_sender();
    let tracker = thread::spawn(move || {
        for step in 0..10_u8 {
            let yaw = f32::from(step) * 3.0 * DEG_TO_RAD;
            let sent = sender.send(move |scene: &mut Scene| {
                let root = scene.root();
                if let Some(spinner) = scene.find_by_name(root, "spinner") {
                    scene.set_scale_y(spinner, 1.0 + yaw);
                }
            });
            if !sent {
                break;
            }
            thread::sleep(FRAME_TIME * 10);
        }
    });

    let mut head_yaw = 0.0_f32;
    for frame in 0..FRAMES {
        head_yaw += 0.5 * DEG_TO_RAD;
        let head_pose = HeadPose {
            position: Vec3::new(0.0, 1.6, 0.0),
            orientation: Quat::from_euler_angles(0.0, head_yaw, 0.0),
        };
        let buttons = if frame % 60 < 5 { JoyButton::TOUCH } else { JoyButton::empty() };

        let stats = driver.tick(head_pose, buttons);
        if frame == 0 {
            log::info!("First frame: {:?}", stats);
        }

        thread::sleep(FRAME_TIME);
    }

    if tracker.join().is_err() {
        log::warn!("Tracker thread panicked");
    }

    report(driver.scene());

    let scene = driver.scene_mut();
    let root = scene.root();
    if let Some(fading) = scene.find_by_name(root, "fading") {
        scene.destroy_entity(fading);
        log::info!("Destroyed faded panel, {} entities left", scene.len());
    }

    scene.stop_rendering();

    log::info!("Scene demo finished after {} frames", driver.frame_count());
    Ok(())
}
