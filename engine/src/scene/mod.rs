mod scene_graph;
pub use scene_graph::*;

mod transform_tree;
pub use transform_tree::TransformTree;
