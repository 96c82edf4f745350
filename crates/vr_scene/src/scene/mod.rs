//! Scene graph
//!
//! A tree of entities with parent-relative transforms. Matrices and opacity
//! are resolved lazily by [`Scene::update`]; visibility is resolved as soon
//! as it changes.
//!
//! ## Layout
//!
//! ```text
//! Scene
//!  ├─ SlotMap<EntityId, EntityNode>   (arena, parent links are keys)
//!  ├─ root: EntityId                   (where the frame pass starts)
//!  └─ Box<dyn NativeBackend>           (receives matrices, visibility, opacity)
//! ```

mod entity;
mod graph;
mod lifecycle;
mod propagation;
mod update;

pub use entity::{hash_id, EntityId};
pub use graph::Scene;
pub use update::UpdateStats;
