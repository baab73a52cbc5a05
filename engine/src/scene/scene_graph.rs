// Scene graph is the abstraction layer over the host engine's transform hierarchy.
// Gameplay code only ever holds `NodeId`s, never the nodes themselves, so a node
// destroyed by the host simply reads as 'dead' at the next use site.

use cgmath::{Deg, InnerSpace, Quaternion, Rotation, Rotation3, Vector3};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

pub trait SceneGraph {
    fn is_alive(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Attach `node` to `parent` (or detach it when `None`).
    /// With `keep_world_pose`, the local pose is recomputed so the node does not move;
    /// otherwise the local pose is kept as-is and the node jumps to its new parent space.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>, keep_world_pose: bool);

    fn local_position(&self, node: NodeId) -> Vector3<f32>;
    fn local_rotation(&self, node: NodeId) -> Quaternion<f32>;
    fn set_local_position(&mut self, node: NodeId, position: Vector3<f32>);
    fn set_local_rotation(&mut self, node: NodeId, rotation: Quaternion<f32>);

    fn position(&self, node: NodeId) -> Vector3<f32>;
    fn rotation(&self, node: NodeId) -> Quaternion<f32>;
    fn set_position(&mut self, node: NodeId, position: Vector3<f32>);
    fn set_rotation(&mut self, node: NodeId, rotation: Quaternion<f32>);

    /// Local-space point to world space
    fn transform_point(&self, node: NodeId, point: Vector3<f32>) -> Vector3<f32> {
        self.position(node) + self.rotation(node).rotate_vector(point)
    }

    /// Local-space direction to world space
    fn transform_direction(&self, node: NodeId, direction: Vector3<f32>) -> Vector3<f32> {
        self.rotation(node).rotate_vector(direction)
    }

    ///
    /// rotate_around
    ///
    /// Rotates the node by `angle` about a world-space `axis` passing through `point`.
    /// Both the position (orbiting the point) and the orientation are affected.
    fn rotate_around(
        &mut self,
        node: NodeId,
        point: Vector3<f32>,
        axis: Vector3<f32>,
        angle: Deg<f32>,
    ) {
        if axis.magnitude2() < f32::EPSILON {
            return;
        }

        let delta = Quaternion::from_axis_angle(axis.normalize(), angle);
        let offset = self.position(node) - point;
        let rotation = self.rotation(node);
        self.set_position(node, point + delta.rotate_vector(offset));
        self.set_rotation(node, (delta * rotation).normalize());
    }
}
