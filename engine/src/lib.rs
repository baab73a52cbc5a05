pub mod scene;

pub use crate::scene::{NodeId, SceneGraph, TransformTree};
