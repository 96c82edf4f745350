//! # VR Scene
//!
//! Scene-graph core for a VR renderer: a tree of entities with
//! parent-relative transforms, per-entity components and a once-per-frame
//! update pass that pushes results to a native rendering backend.
//!
//! ## Features
//!
//! - **Lazy transforms**: local and world matrices are recomputed only when dirty
//! - **Opacity and visibility**: inherited down the tree, visibility applied immediately
//! - **Components**: one instance per type per entity, updated in pre-order
//! - **Tweens**: [`ecs::components::AnimatorComponent`] eases transform and opacity over time
//! - **Native boundary**: everything leaves through [`native::NativeBackend`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vr_scene::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let config = SceneConfig::default();
//!     let mut driver = FrameDriver::from_config(RecordingBackend::new(), config)?;
//!
//!     let scene = driver.scene_mut();
//!     let panel = scene.create_entity();
//!     scene.set_position(panel, Vec3::new(0.0, 0.0, -2.0));
//!     scene.add_component(panel, GeometryComponent::quad(1.6, 0.9));
//!     scene.add_component(panel, SurfaceRendererComponent::new());
//!     let root = scene.root();
//!     scene.add_child(root, panel);
//!
//!     driver.tick(HeadPose::default(), JoyButton::empty());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

pub mod config;
pub mod core;
pub mod driver;
pub mod ecs;
pub mod foundation;
pub mod input;
pub mod native;
pub mod scene;

pub use driver::{FrameDriver, TaskSender};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        core::{Config, SceneConfig, SceneError},
        driver::{FrameDriver, TaskSender},
        ecs::{
            components::{
                AnimatorComponent, CameraComponent, Easing, GeometryComponent,
                SurfaceRendererComponent,
            },
            Component, ComponentContext,
        },
        foundation::math::{Mat4, Quat, Transform, Vec3},
        input::{FrameInput, HeadPose, JoyButton},
        native::{GeometrySource, NativeBackend, NativeHandle, RecordingBackend, StereoMode},
        scene::{EntityId, Scene, UpdateStats},
    };
}
