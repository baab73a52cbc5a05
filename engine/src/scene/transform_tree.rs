use cgmath::{One, Quaternion, Rotation, Vector3, Zero};
use tracing::{trace, warn};

use super::{NodeId, SceneGraph};

struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local_position: Vector3<f32>,
    local_rotation: Quaternion<f32>,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

///
/// TransformTree
///
/// In-memory transform hierarchy (translation + rotation, no scale).
/// Slots are recycled, but every reuse bumps the generation so stale `NodeId`s stay dead.
#[derive(Default)]
pub struct TransformTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl TransformTree {
    pub fn new() -> TransformTree {
        TransformTree {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let parent = match parent {
            Some(p) if !self.is_alive(p) => {
                warn!("create_node({}): parent {:?} is dead, creating as root", name, p);
                None
            }
            other => other,
        };

        let node = Node {
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            local_position: Vector3::zero(),
            local_rotation: Quaternion::one(),
        };

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };

        if let Some(parent_node) = parent.and_then(|p| self.get_mut(p)) {
            parent_node.children.push(id);
        }

        trace!("created node {} {:?}", name, id);
        id
    }

    /// Destroys the node and its whole subtree.
    pub fn destroy_node(&mut self, node: NodeId) {
        let Some(removed) = self.take(node) else {
            return;
        };

        if let Some(parent_node) = removed.parent.and_then(|p| self.get_mut(p)) {
            parent_node.children.retain(|c| *c != node);
        }

        for child in removed.children {
            self.destroy_node(child);
        }
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|n| n.name.as_str())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, node: NodeId) -> Option<&Node> {
        self.slots
            .get(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(node.index as usize)
            .filter(|slot| slot.generation == node.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn take(&mut self, node: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(node.index as usize)
            .filter(|slot| slot.generation == node.generation)?;
        let removed = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index);
        Some(removed)
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn world_pose(&self, node: NodeId) -> (Vector3<f32>, Quaternion<f32>) {
        match self.get(node) {
            None => (Vector3::zero(), Quaternion::one()),
            Some(n) => {
                let (parent_position, parent_rotation) = self.parent_pose(n.parent);
                (
                    parent_position + parent_rotation.rotate_vector(n.local_position),
                    parent_rotation * n.local_rotation,
                )
            }
        }
    }

    fn parent_pose(&self, parent: Option<NodeId>) -> (Vector3<f32>, Quaternion<f32>) {
        match parent {
            Some(p) => self.world_pose(p),
            None => (Vector3::zero(), Quaternion::one()),
        }
    }
}

impl SceneGraph for TransformTree {
    fn is_alive(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>, keep_world_pose: bool) {
        if !self.is_alive(node) {
            warn!("set_parent: node {:?} is dead", node);
            return;
        }

        if let Some(p) = parent {
            if !self.is_alive(p) {
                warn!("set_parent: parent {:?} is dead", p);
                return;
            }
            if p == node || self.is_ancestor(node, p) {
                warn!("set_parent: refusing to parent {:?} under its own descendant", node);
                return;
            }
        }

        let (world_position, world_rotation) = self.world_pose(node);

        if let Some(old_parent) = self.parent(node).and_then(|p| self.get_mut(p)) {
            old_parent.children.retain(|c| *c != node);
        }
        if let Some(new_parent) = parent.and_then(|p| self.get_mut(p)) {
            new_parent.children.push(node);
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = parent;
        }

        if keep_world_pose {
            self.set_position(node, world_position);
            self.set_rotation(node, world_rotation);
        }
    }

    fn local_position(&self, node: NodeId) -> Vector3<f32> {
        self.get(node)
            .map(|n| n.local_position)
            .unwrap_or_else(Vector3::zero)
    }

    fn local_rotation(&self, node: NodeId) -> Quaternion<f32> {
        self.get(node)
            .map(|n| n.local_rotation)
            .unwrap_or_else(Quaternion::one)
    }

    fn set_local_position(&mut self, node: NodeId, position: Vector3<f32>) {
        if let Some(n) = self.get_mut(node) {
            n.local_position = position;
        }
    }

    fn set_local_rotation(&mut self, node: NodeId, rotation: Quaternion<f32>) {
        if let Some(n) = self.get_mut(node) {
            n.local_rotation = rotation;
        }
    }

    fn position(&self, node: NodeId) -> Vector3<f32> {
        self.world_pose(node).0
    }

    fn rotation(&self, node: NodeId) -> Quaternion<f32> {
        self.world_pose(node).1
    }

    fn set_position(&mut self, node: NodeId, position: Vector3<f32>) {
        let (parent_position, parent_rotation) = self.parent_pose(self.parent(node));
        let local = parent_rotation
            .conjugate()
            .rotate_vector(position - parent_position);
        self.set_local_position(node, local);
    }

    fn set_rotation(&mut self, node: NodeId, rotation: Quaternion<f32>) {
        let (_, parent_rotation) = self.parent_pose(self.parent(node));
        self.set_local_rotation(node, parent_rotation.conjugate() * rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, Deg, InnerSpace, Rotation3};

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-4, "{:?} vs {:?}", a, b);
    }

    fn assert_same_rotation(a: Quaternion<f32>, b: Quaternion<f32>) {
        assert!(a.dot(b).abs() > 0.9999, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn test_world_pose_composes_parent_chain() {
        // Given a parent rotated 90 degrees about Y, offset along X
        let mut tree = TransformTree::new();
        let parent = tree.create_node("parent", None);
        tree.set_local_position(parent, vec3(1.0, 0.0, 0.0));
        tree.set_local_rotation(parent, Quaternion::from_angle_y(Deg(90.0)));

        // And a child offset along Z in parent space
        let child = tree.create_node("child", Some(parent));
        tree.set_local_position(child, vec3(0.0, 0.0, 1.0));

        // Then the child's world position is rotated into X
        assert_close(tree.position(child), vec3(2.0, 0.0, 0.0));
        assert_same_rotation(tree.rotation(child), Quaternion::from_angle_y(Deg(90.0)));
    }

    #[test]
    fn test_detach_keeping_world_pose() {
        let mut tree = TransformTree::new();
        let parent = tree.create_node("parent", None);
        tree.set_local_position(parent, vec3(0.0, 1.0, 0.0));
        tree.set_local_rotation(parent, Quaternion::from_angle_x(Deg(45.0)));
        let child = tree.create_node("child", Some(parent));
        tree.set_local_position(child, vec3(0.0, 0.0, 2.0));

        let world_position = tree.position(child);
        let world_rotation = tree.rotation(child);

        tree.set_parent(child, None, true);

        assert_eq!(tree.parent(child), None);
        assert!(tree.children(parent).is_empty());
        assert_close(tree.position(child), world_position);
        assert_same_rotation(tree.rotation(child), world_rotation);
    }

    #[test]
    fn test_reparent_without_keeping_world_pose_keeps_local() {
        let mut tree = TransformTree::new();
        let hand = tree.create_node("hand", None);
        tree.set_local_position(hand, vec3(5.0, 0.0, 0.0));
        let tool = tree.create_node("tool", None);
        tree.set_local_position(tool, vec3(0.0, 0.0, 1.0));

        tree.set_parent(tool, Some(hand), false);

        assert_eq!(tree.local_position(tool), vec3(0.0, 0.0, 1.0));
        assert_close(tree.position(tool), vec3(5.0, 0.0, 1.0));
        assert_eq!(tree.children(hand), &[tool]);
    }

    #[test]
    fn test_destroyed_nodes_are_dead_and_not_aliased() {
        let mut tree = TransformTree::new();
        let parent = tree.create_node("parent", None);
        let child = tree.create_node("child", Some(parent));

        tree.destroy_node(parent);

        assert!(!tree.is_alive(parent));
        assert!(!tree.is_alive(child));
        assert!(tree.is_empty());

        // The recycled slot must not resurrect the old handle
        let replacement = tree.create_node("replacement", None);
        assert!(tree.is_alive(replacement));
        assert!(!tree.is_alive(parent));
        assert!(!tree.is_alive(child));
        assert_eq!(tree.name(replacement), Some("replacement"));
    }

    #[test]
    fn test_dead_handles_read_as_identity() {
        let mut tree = TransformTree::new();
        let node = tree.create_node("node", None);
        tree.set_local_position(node, vec3(1.0, 2.0, 3.0));
        tree.destroy_node(node);

        tree.set_position(node, vec3(9.0, 9.0, 9.0));

        assert_eq!(tree.position(node), Vector3::zero());
        assert_eq!(tree.rotation(node), Quaternion::one());
        assert_eq!(tree.parent(node), None);
    }

    #[test]
    fn test_cycles_are_refused() {
        let mut tree = TransformTree::new();
        let a = tree.create_node("a", None);
        let b = tree.create_node("b", Some(a));

        tree.set_parent(a, Some(b), false);
        tree.set_parent(a, Some(a), false);

        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), Some(a));
    }

    #[test]
    fn test_rotate_around_pivot() {
        // Given a node one unit along +Z from the origin
        let mut tree = TransformTree::new();
        let node = tree.create_node("node", None);
        tree.set_position(node, vec3(0.0, 0.0, 1.0));

        // When rotating 90 degrees about +Y through the origin
        tree.rotate_around(node, Vector3::zero(), vec3(0.0, 1.0, 0.0), Deg(90.0));

        // Then it orbits to +X and turns with the rotation
        assert_close(tree.position(node), vec3(1.0, 0.0, 0.0));
        assert_same_rotation(tree.rotation(node), Quaternion::from_angle_y(Deg(90.0)));
    }

    #[test]
    fn test_long_spin_keeps_rotation_unit_length() {
        // Given a node under a rotated parent
        let mut tree = TransformTree::new();
        let parent = tree.create_node("parent", None);
        tree.set_local_rotation(parent, Quaternion::from_angle_z(Deg(15.0)));
        let node = tree.create_node("node", Some(parent));
        tree.set_local_position(node, vec3(0.0, 0.0, 0.05));

        // When spinning it for ten minutes at 90Hz
        for _ in 0..54_000 {
            let pivot = tree.transform_point(node, vec3(0.0, 0.0, -0.2));
            let axis = tree.transform_direction(node, vec3(1.0, 0.0, 0.0));
            tree.rotate_around(node, pivot, axis, Deg(2000.0 / 90.0));
        }

        // Then the orientation is still a unit quaternion
        assert!((tree.local_rotation(node).magnitude() - 1.0).abs() < 1e-5);
        assert!((tree.rotation(node).magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_set_world_position_under_rotated_parent() {
        let mut tree = TransformTree::new();
        let parent = tree.create_node("parent", None);
        tree.set_local_position(parent, vec3(0.0, 0.0, -3.0));
        tree.set_local_rotation(parent, Quaternion::from_angle_z(Deg(30.0)));
        let child = tree.create_node("child", Some(parent));

        tree.set_position(child, vec3(1.0, 1.0, 1.0));
        tree.set_rotation(child, Quaternion::from_angle_x(Deg(10.0)));

        assert_close(tree.position(child), vec3(1.0, 1.0, 1.0));
        assert_same_rotation(tree.rotation(child), Quaternion::from_angle_x(Deg(10.0)));
    }
}
