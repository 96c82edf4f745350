//! Property tweens
//!
//! [`AnimatorComponent`] eases its entity's position, scale, rotation and own
//! opacity toward target values, advanced by each frame's delta time. Tweens
//! run together by default or one after another when sequential. Each tween
//! starts from whatever value the entity has when that tween begins, so a
//! sequential `move_to(a).move_by(d)` ends at `a + d`.

use std::fmt;

use crate::ecs::{Component, ComponentContext};
use crate::foundation::math::constants::PI;
use crate::foundation::math::{Quat, Vec3};
use crate::input::FrameInput;

/// Length of one tween when none is set, in seconds
pub const DEFAULT_DURATION: f32 = 0.3;

/// Progress curve applied to every tween
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Slow start and slow end, cosine shaped
    #[default]
    AccelerateDecelerate,
}

impl Easing {
    /// Map linear progress in `0.0..=1.0` onto the curve
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    MoveTo(Vec3),
    MoveBy(Vec3),
    ScaleTo(Vec3),
    ScaleBy(Vec3),
    RotateTo(Quat),
    RotateBy(Quat),
    OpacityTo(f32),
}

impl Target {
    /// Pin the start value from the entity's current state
    fn resolve(self, ctx: &ComponentContext<'_>) -> Motion {
        let scene = ctx.scene();
        let transform = scene.transform(ctx.entity()).unwrap_or_default();
        match self {
            Self::MoveTo(to) => Motion::Position(transform.position, to),
            Self::MoveBy(by) => Motion::Position(transform.position, transform.position + by),
            Self::ScaleTo(to) => Motion::Scale(transform.scale, to),
            Self::ScaleBy(by) => Motion::Scale(transform.scale, transform.scale.component_mul(&by)),
            Self::RotateTo(to) => Motion::Rotation(transform.rotation, to),
            Self::RotateBy(by) => Motion::Rotation(transform.rotation, transform.rotation * by),
            Self::OpacityTo(to) => {
                Motion::Opacity(scene.opacity(ctx.entity()).unwrap_or(1.0), to)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Motion {
    Position(Vec3, Vec3),
    Scale(Vec3, Vec3),
    Rotation(Quat, Quat),
    Opacity(f32, f32),
}

impl Motion {
    /// Write the value at eased progress `k`; `k >= 1.0` writes the exact target
    fn apply(self, ctx: &mut ComponentContext<'_>, k: f32) {
        let done = k >= 1.0;
        match self {
            Self::Position(from, to) => {
                ctx.set_position(if done { to } else { from.lerp(&to, k) });
            }
            Self::Scale(from, to) => {
                ctx.set_scale(if done { to } else { from.lerp(&to, k) });
            }
            Self::Rotation(from, to) => {
                let rotation = if done {
                    to
                } else {
                    // Undefined for (nearly) equal or opposite rotations
                    from.try_slerp(&to, k, f32::EPSILON)
                        .unwrap_or(if k < 0.5 { from } else { to })
                };
                ctx.set_rotation(rotation);
            }
            Self::Opacity(from, to) => {
                ctx.set_opacity(if done { to } else { from + (to - from) * k });
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TrackState {
    Pending,
    Running(Motion),
    Done,
}

#[derive(Debug, Clone, Copy)]
struct Track {
    target: Target,
    state: TrackState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Running,
    Finished,
    Cancelled,
}

type EndCallback = Box<dyn FnMut(&mut ComponentContext<'_>)>;

/// Tweens its entity's transform and opacity
///
/// Plays as soon as it is attached. Stays attached when done; call
/// [`AnimatorComponent::start`] to play it again, or use
/// [`crate::scene::Scene::animate`] to replace it with a new one.
pub struct AnimatorComponent {
    tracks: Vec<Track>,
    duration: f32,
    delay: f32,
    easing: Easing,
    sequential: bool,
    elapsed: f32,
    playback: Playback,
    on_end: Option<EndCallback>,
}

impl Default for AnimatorComponent {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            duration: DEFAULT_DURATION,
            delay: 0.0,
            easing: Easing::default(),
            sequential: false,
            elapsed: 0.0,
            playback: Playback::Running,
            on_end: None,
        }
    }
}

impl fmt::Debug for AnimatorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorComponent")
            .field("tracks", &self.tracks.len())
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("sequential", &self.sequential)
            .field("playback", &self.playback)
            .finish_non_exhaustive()
    }
}

impl AnimatorComponent {
    /// Create an empty animator
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, target: Target) -> Self {
        self.tracks.push(Track {
            target,
            state: TrackState::Pending,
        });
        self
    }

    /// Tween the local position to `position`
    pub fn move_to(self, position: Vec3) -> Self {
        self.with(Target::MoveTo(position))
    }

    /// Tween the local position by `translation`
    pub fn move_by(self, translation: Vec3) -> Self {
        self.with(Target::MoveBy(translation))
    }

    /// Tween the local scale to `scale`
    pub fn scale_to(self, scale: Vec3) -> Self {
        self.with(Target::ScaleTo(scale))
    }

    /// Tween the local scale, multiplied component-wise by `factor`
    pub fn scale_by(self, factor: Vec3) -> Self {
        self.with(Target::ScaleBy(factor))
    }

    /// Tween the local rotation to `rotation`
    pub fn rotate_to(self, rotation: Quat) -> Self {
        self.with(Target::RotateTo(rotation))
    }

    /// Tween the local rotation by `rotation`, applied after the current one
    pub fn rotate_by(self, rotation: Quat) -> Self {
        self.with(Target::RotateBy(rotation))
    }

    /// Tween the entity's own opacity to `opacity`
    pub fn opacity_to(self, opacity: f32) -> Self {
        self.with(Target::OpacityTo(opacity))
    }

    /// Seconds each tween takes; negative values become zero
    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    /// Seconds to wait before the first tween; negative values become zero
    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds.max(0.0);
        self
    }

    /// Run tweens one after another instead of together
    pub fn sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Progress curve
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Called once each time every tween has completed
    ///
    /// Not called when the animator is cancelled.
    pub fn on_end(mut self, callback: impl FnMut(&mut ComponentContext<'_>) + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    /// Play again from the beginning
    ///
    /// Start values are taken afresh from the entity.
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.playback = Playback::Running;
        for track in &mut self.tracks {
            track.state = TrackState::Pending;
        }
    }

    /// Stop where it is, without the end callback
    pub fn cancel(&mut self) {
        if self.playback == Playback::Running {
            self.playback = Playback::Cancelled;
        }
    }

    /// Whether tweens are still pending or in progress
    pub fn is_running(&self) -> bool {
        self.playback == Playback::Running
    }

    /// Whether every tween completed
    pub fn is_finished(&self) -> bool {
        self.playback == Playback::Finished
    }

    /// Seconds from the first tween's start to the last tween's end
    #[allow(clippy::cast_precision_loss)]
    pub fn total_duration(&self) -> f32 {
        if self.sequential {
            self.duration * self.tracks.len() as f32
        } else if self.tracks.is_empty() {
            0.0
        } else {
            self.duration
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn start_of(&self, index: usize) -> f32 {
        if self.sequential {
            self.duration * index as f32
        } else {
            0.0
        }
    }
}

impl Component for AnimatorComponent {
    fn update(&mut self, ctx: &mut ComponentContext<'_>, frame: &FrameInput) {
        if self.playback != Playback::Running {
            return;
        }

        self.elapsed += frame.delta_seconds;
        let time = self.elapsed - self.delay;
        if time < 0.0 {
            return;
        }

        let mut complete = true;
        for index in 0..self.tracks.len() {
            let start = self.start_of(index);
            if time < start {
                complete = false;
                continue;
            }

            let track = self.tracks[index];
            let motion = match track.state {
                TrackState::Done => continue,
                TrackState::Pending => track.target.resolve(ctx),
                TrackState::Running(motion) => motion,
            };

            let progress = if self.duration > 0.0 {
                ((time - start) / self.duration).min(1.0)
            } else {
                1.0
            };
            let eased = if progress >= 1.0 { 1.0 } else { self.easing.apply(progress) };
            motion.apply(ctx, eased);

            self.tracks[index].state = if progress >= 1.0 {
                TrackState::Done
            } else {
                complete = false;
                TrackState::Running(motion)
            };
        }

        if complete {
            self.playback = Playback::Finished;
            log::debug!("Animation on {:?} finished", ctx.entity());
            if let Some(callback) = self.on_end.as_mut() {
                callback(ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::native::RecordingBackend;
    use crate::scene::{EntityId, Scene};

    fn scene_with_entity() -> (Scene, EntityId) {
        let mut scene = Scene::new(RecordingBackend::new());
        let root = scene.root();
        let entity = scene.create_entity();
        assert!(scene.add_child(root, entity));
        (scene, entity)
    }

    fn run(scene: &mut Scene, frames: u64, delta: f32) {
        for n in 1..=frames {
            scene.update(&FrameInput::new(n, delta));
        }
    }

    fn animator(scene: &Scene, entity: EntityId) -> &AnimatorComponent {
        scene.component::<AnimatorComponent>(entity).unwrap()
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::AccelerateDecelerate] {
            assert_relative_eq!(easing.apply(0.0), 0.0, epsilon = 1e-6);
            assert_relative_eq!(easing.apply(0.5), 0.5, epsilon = 1e-6);
            assert_relative_eq!(easing.apply(1.0), 1.0, epsilon = 1e-6);
        }
        assert!(Easing::AccelerateDecelerate.apply(0.1) < 0.1);
    }

    #[test]
    fn test_move_to_reaches_target() {
        let (mut scene, entity) = scene_with_entity();
        let tween = AnimatorComponent::new()
            .move_to(Vec3::new(4.0, 0.0, 0.0))
            .duration(1.0)
            .easing(Easing::Linear);
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 2, 0.25);
        assert_relative_eq!(scene.position(entity).unwrap().x, 2.0, epsilon = 1e-5);
        assert!(animator(&scene, entity).is_running());

        run(&mut scene, 3, 0.25);
        assert_eq!(scene.position(entity), Some(Vec3::new(4.0, 0.0, 0.0)));
        assert!(animator(&scene, entity).is_finished());
    }

    #[test]
    fn test_sequential_tweens_chain() {
        let (mut scene, entity) = scene_with_entity();
        let tween = AnimatorComponent::new()
            .move_to(Vec3::new(1.0, 0.0, 0.0))
            .move_by(Vec3::new(0.0, 2.0, 0.0))
            .scale_by(Vec3::new(2.0, 2.0, 2.0))
            .duration(0.5)
            .sequential(true);
        assert!(scene.add_component(entity, tween));
        assert_relative_eq!(animator(&scene, entity).total_duration(), 1.5);

        run(&mut scene, 1, 0.5);
        assert_relative_eq!(scene.position(entity).unwrap(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);

        run(&mut scene, 1, 0.5);
        assert_eq!(scene.position(entity), Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_relative_eq!(scene.scale(entity).unwrap(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);

        run(&mut scene, 1, 0.5);
        assert_eq!(scene.scale(entity), Some(Vec3::new(2.0, 2.0, 2.0)));
        assert!(animator(&scene, entity).is_finished());
    }

    #[test]
    fn test_parallel_tweens_share_the_clock() {
        let (mut scene, entity) = scene_with_entity();
        let tween = AnimatorComponent::new()
            .move_by(Vec3::new(2.0, 0.0, 0.0))
            .opacity_to(0.0)
            .duration(1.0)
            .easing(Easing::Linear);
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 1, 0.5);

        assert_relative_eq!(scene.position(entity).unwrap().x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(scene.opacity(entity).unwrap(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_delay_holds_start() {
        let (mut scene, entity) = scene_with_entity();
        scene.set_position(entity, Vec3::new(1.0, 1.0, 1.0));
        let tween = AnimatorComponent::new()
            .move_to(Vec3::zeros())
            .duration(0.5)
            .delay(1.0);
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 3, 0.25);
        assert_eq!(scene.position(entity), Some(Vec3::new(1.0, 1.0, 1.0)));

        run(&mut scene, 4, 0.25);
        assert_eq!(scene.position(entity), Some(Vec3::zeros()));
    }

    #[test]
    fn test_rotate_to_slerps() {
        let (mut scene, entity) = scene_with_entity();
        let target = Quat::from_euler_angles(0.0, FRAC_PI_2, 0.0);
        let tween = AnimatorComponent::new()
            .rotate_to(target)
            .duration(1.0)
            .easing(Easing::Linear);
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 1, 0.5);
        assert_relative_eq!(
            scene.rotation(entity).unwrap().angle(),
            FRAC_PI_2 / 2.0,
            epsilon = 1e-5
        );

        run(&mut scene, 1, 0.5);
        assert_eq!(scene.rotation(entity), Some(target));
    }

    #[test]
    fn test_opacity_tween_reaches_children() {
        let (mut scene, entity) = scene_with_entity();
        let child = scene.create_entity();
        assert!(scene.add_child(entity, child));
        let tween = AnimatorComponent::new().opacity_to(0.25).duration(0.2);
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 3, 0.1);

        assert_relative_eq!(scene.effective_opacity(child).unwrap(), 0.25);
    }

    #[test]
    fn test_on_end_fires_once() {
        let (mut scene, entity) = scene_with_entity();
        let ended = Rc::new(Cell::new(0));
        let counter = Rc::clone(&ended);
        let tween = AnimatorComponent::new()
            .scale_to(Vec3::new(3.0, 3.0, 3.0))
            .duration(0.1)
            .on_end(move |ctx| {
                counter.set(counter.get() + 1);
                ctx.set_position(Vec3::new(0.0, 0.0, -1.0));
            });
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 4, 0.1);

        assert_eq!(ended.get(), 1);
        assert_eq!(scene.position(entity), Some(Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_cancel_skips_end_and_start_replays() {
        let (mut scene, entity) = scene_with_entity();
        let ended = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ended);
        let tween = AnimatorComponent::new()
            .move_by(Vec3::new(1.0, 0.0, 0.0))
            .duration(1.0)
            .easing(Easing::Linear)
            .on_end(move |_ctx| flag.set(true));
        assert!(scene.add_component(entity, tween));

        run(&mut scene, 1, 0.5);
        if let Some(tween) = scene.component_mut::<AnimatorComponent>(entity) {
            tween.cancel();
        }
        run(&mut scene, 4, 0.5);

        assert!(!ended.get());
        assert_relative_eq!(scene.position(entity).unwrap().x, 0.5, epsilon = 1e-5);

        if let Some(tween) = scene.component_mut::<AnimatorComponent>(entity) {
            tween.start();
        }
        run(&mut scene, 2, 0.5);

        assert!(ended.get());
        assert_relative_eq!(scene.position(entity).unwrap().x, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_scene_animate_replaces_running_animator() {
        let (mut scene, entity) = scene_with_entity();
        assert!(scene.animate(entity, AnimatorComponent::new().move_to(Vec3::new(9.0, 0.0, 0.0))));
        assert!(scene.animate(
            entity,
            AnimatorComponent::new().move_to(Vec3::new(0.0, 1.0, 0.0)).duration(0.0)
        ));

        run(&mut scene, 1, 0.016);

        assert_eq!(scene.position(entity), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(scene.component_count(entity), 1);
    }
}
