//! Frame driver
//!
//! Owns the [`Scene`] on the frame thread and runs one update pass per
//! rendered frame. Work from other threads is queued through a
//! [`TaskSender`] and applied at the start of the next frame, before the
//! update pass.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::core::{Config, SceneConfig, SceneError};
use crate::foundation::time::Timer;
use crate::input::{FrameInput, HeadPose, JoyButton};
use crate::native::NativeBackend;
use crate::scene::{Scene, UpdateStats};

type Task = Box<dyn FnOnce(&mut Scene) + Send>;

/// Cloneable handle for queueing scene work from any thread
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Task>,
}

impl TaskSender {
    /// Queue `task` to run on the frame thread before the next update pass
    ///
    /// Returns false if the driver has been dropped.
    pub fn send(&self, task: impl FnOnce(&mut Scene) + Send + 'static) -> bool {
        self.sender.send(Box::new(task)).is_ok()
    }
}

/// Runs the scene once per frame
pub struct FrameDriver {
    scene: Scene,
    config: SceneConfig,
    timer: Timer,
    frame_number: u64,
    previous_buttons: JoyButton,
    sender: Sender<Task>,
    tasks: Receiver<Task>,
}

impl FrameDriver {
    /// Drive an existing scene with the default configuration
    pub fn new(scene: Scene) -> Self {
        Self::with_scene(scene, SceneConfig::default())
    }

    /// Build a scene on `backend` from a validated configuration
    pub fn from_config(
        backend: impl NativeBackend + 'static,
        config: SceneConfig,
    ) -> Result<Self, SceneError> {
        config.validate().map_err(SceneError::InvalidConfig)?;
        let scene = Scene::with_config(backend, &config);
        Ok(Self::with_scene(scene, config))
    }

    /// Load a `.toml` or `.ron` configuration and build a scene from it
    pub fn from_config_file(
        backend: impl NativeBackend + 'static,
        path: impl AsRef<Path>,
    ) -> Result<Self, SceneError> {
        let config = SceneConfig::load_from_file(path)?;
        log::info!("Loaded scene config: {:?}", config);
        Self::from_config(backend, config)
    }

    fn with_scene(scene: Scene, config: SceneConfig) -> Self {
        let (sender, tasks) = mpsc::channel();
        Self {
            scene,
            config,
            timer: Timer::new(),
            frame_number: 0,
            previous_buttons: JoyButton::empty(),
            sender,
            tasks,
        }
    }

    /// Handle for queueing work from other threads
    pub fn task_sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// The driven scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The driven scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Active configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Run one frame with caller-supplied input
    ///
    /// The first frame also starts rendering the scene's root, see
    /// [`Scene::start_rendering`].
    pub fn frame(&mut self, input: &FrameInput) -> UpdateStats {
        let drained = self.drain_tasks();
        self.scene.start_rendering();
        let stats = self.scene.update(input);
        self.frame_number = self.frame_number.max(input.frame_number);

        if self.config.log_frame_stats {
            log::trace!(
                "Frame {}: {} tasks, {} visited, {} local, {} world, {} opacity, {} component updates",
                input.frame_number,
                drained,
                stats.visited,
                stats.local_updates,
                stats.world_updates,
                stats.opacity_updates,
                stats.component_updates
            );
        }

        stats
    }

    /// Run one frame, timing it with the driver's clock
    ///
    /// Pressed and released buttons are derived from the previous tick's
    /// state.
    pub fn tick(&mut self, head_pose: HeadPose, buttons: JoyButton) -> UpdateStats {
        self.timer.update(self.config.max_delta_seconds);

        let input = FrameInput {
            predicted_display_time: self.timer.total_time(),
            delta_seconds: self.timer.delta_time(),
            frame_number: self.frame_number + 1,
            swipe_fraction: 0.0,
            button_state: buttons,
            button_pressed: buttons & !self.previous_buttons,
            button_released: self.previous_buttons & !buttons,
            head_pose,
        };
        self.previous_buttons = buttons;

        self.frame(&input)
    }

    fn drain_tasks(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.tasks.try_recv() {
            task(&mut self.scene);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::thread;

    use super::*;
    use crate::ecs::{Component, ComponentContext};
    use crate::foundation::math::Vec3;
    use crate::native::RecordingBackend;

    /// Records the buttons pressed in the last frame
    struct PressRecorder(Rc<Cell<JoyButton>>);

    impl Component for PressRecorder {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>, frame: &FrameInput) {
            self.0.set(frame.button_pressed);
        }
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = SceneConfig::default().with_max_delta_seconds(-1.0);
        let result = FrameDriver::from_config(RecordingBackend::new(), config);

        assert!(matches!(result, Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn test_tasks_from_other_thread_run_before_update() {
        let mut driver = FrameDriver::new(Scene::new(RecordingBackend::new()));
        let root = driver.scene().root();
        let sender = driver.task_sender();

        let worker = thread::spawn(move || {
            sender.send(move |scene: &mut Scene| {
                let child = scene.create_entity();
                scene.set_id_str(child, "spawned");
                scene.set_position(child, Vec3::new(0.0, 0.0, -3.0));
                scene.add_child(root, child);
            })
        });
        assert!(worker.join().unwrap());

        let stats = driver.frame(&FrameInput::new(1, 0.016));

        let child = driver.scene().find_by_name(root, "spawned").unwrap();
        assert_eq!(stats.visited, 2);
        assert!(!driver.scene().is_world_dirty(child));
    }

    #[test]
    fn test_tick_tracks_button_edges() {
        let mut driver = FrameDriver::new(Scene::new(RecordingBackend::new()));
        let pressed = Rc::new(Cell::new(JoyButton::empty()));
        let root = driver.scene().root();
        assert!(driver
            .scene_mut()
            .add_component(root, PressRecorder(Rc::clone(&pressed))));

        driver.tick(HeadPose::default(), JoyButton::A);
        assert_eq!(pressed.get(), JoyButton::A);

        driver.tick(HeadPose::default(), JoyButton::A);
        assert_eq!(pressed.get(), JoyButton::empty());

        assert_eq!(driver.frame_count(), 2);
    }

    /// Counts scene init and start hooks
    struct StartCounter(Rc<Cell<(u32, u32)>>);

    impl Component for StartCounter {
        fn on_scene_init(&mut self, _ctx: &mut ComponentContext<'_>) {
            let (init, start) = self.0.get();
            self.0.set((init + 1, start));
        }

        fn on_start_rendering(&mut self, _ctx: &mut ComponentContext<'_>) {
            let (init, start) = self.0.get();
            self.0.set((init, start + 1));
        }
    }

    #[test]
    fn test_first_frame_starts_rendering() {
        let mut driver = FrameDriver::new(Scene::new(RecordingBackend::new()));
        let counts = Rc::new(Cell::new((0, 0)));
        let root = driver.scene().root();
        assert!(driver
            .scene_mut()
            .add_component(root, StartCounter(Rc::clone(&counts))));
        assert!(!driver.scene().is_rendering());

        driver.tick(HeadPose::default(), JoyButton::empty());
        driver.tick(HeadPose::default(), JoyButton::empty());

        assert!(driver.scene().is_rendering());
        assert_eq!(counts.get(), (1, 1));
    }

    #[test]
    fn test_from_config_file_reports_missing_file() {
        let path = std::env::temp_dir().join("vr_scene_driver_missing.toml");
        let result = FrameDriver::from_config_file(RecordingBackend::new(), path);

        assert!(matches!(result, Err(SceneError::Config(_))));
    }

    #[test]
    fn test_sender_reports_dropped_driver() {
        let driver = FrameDriver::new(Scene::new(RecordingBackend::new()));
        let sender = driver.task_sender();
        drop(driver);

        assert!(!sender.send(|_scene: &mut Scene| {}));
    }
}
