//! Hierarchical transforms
//!
//! A [`Transform`] owns the local pose of its entity and caches the derived
//! world pose and local-to-world matrix behind a dirty flag. Every write
//! marks the entity and all of its descendants dirty; the cache is rebuilt
//! lazily, ancestors before descendants, on the next read or on the
//! per-frame refresh.
//!
//! Composition:
//! - world matrix = parent world matrix * local TRS
//! - world position = parent world matrix * local position
//! - world rotation = parent world rotation * local rotation
//! - world scale = parent world scale * local scale (component-wise)
//!
//! Reads go through [`TransformView`], writes through [`TransformMut`]; both
//! borrow the [`World`] because every world-space value depends on the
//! parent chain.

use std::cell::Cell;

use log::{debug, warn};

use crate::foundation::collections::EntityId;
use crate::foundation::math::{self, utils, Mat4, Point3, Pose, Quat, Vec3};

use super::World;

/// Cached world-space state of one transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldState {
    /// World position, rotation and scale
    pub pose: Pose,
    /// Local-to-world matrix
    pub matrix: Mat4,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::identity()
    }
}

impl WorldState {
    /// State of a transform with no parent and an identity pose
    #[must_use]
    pub fn identity() -> Self {
        Self {
            pose: Pose::identity(),
            matrix: Mat4::identity(),
        }
    }

    /// World-to-local matrix, or identity when the matrix is singular
    #[must_use]
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix.try_inverse().unwrap_or_else(|| {
            debug!("Singular transform matrix, using identity inverse");
            Mat4::identity()
        })
    }

    /// Local position that lands on `world` under this parent state
    #[must_use]
    pub fn local_position_of(&self, world: &Vec3) -> Vec3 {
        self.inverse_matrix().transform_point(&Point3::from(*world)).coords
    }

    /// Local rotation that composes to `world` under this parent state
    #[must_use]
    pub fn local_rotation_of(&self, world: &Quat) -> Quat {
        math::normalized(self.pose.rotation.inverse() * world)
    }

    /// Local scale that composes to `world` under this parent state
    ///
    /// A zero parent scale axis yields zero on that axis.
    #[must_use]
    pub fn local_scale_of(&self, world: &Vec3) -> Vec3 {
        utils::safe_component_div(world, &self.pose.scale)
    }

    /// Full local pose that composes to `world` under this parent state
    #[must_use]
    pub fn local_pose_of(&self, world: &Pose) -> Pose {
        Pose {
            position: self.local_position_of(&world.position),
            rotation: self.local_rotation_of(&world.rotation),
            scale: self.local_scale_of(&world.scale),
        }
    }
}

/// Spatial state of one entity
#[derive(Debug)]
pub struct Transform {
    local: Pose,
    cache: Cell<WorldState>,
    dirty: Cell<bool>,
}

impl Transform {
    pub(crate) fn new(local: Pose) -> Self {
        Self {
            local,
            cache: Cell::new(WorldState::identity()),
            dirty: Cell::new(true),
        }
    }

    /// Local pose relative to the parent
    #[must_use]
    pub const fn local(&self) -> &Pose {
        &self.local
    }

    /// Whether the cached world state is stale
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Last computed world state; stale while [`Transform::is_dirty`] holds
    #[must_use]
    pub fn cached(&self) -> WorldState {
        self.cache.get()
    }

    pub(crate) fn set_local(&mut self, local: Pose) {
        self.local = Pose {
            rotation: math::normalized(local.rotation),
            ..local
        };
        self.dirty.set(true);
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Rebuild the cache from the parent's (clean) world state
    pub(crate) fn recompute(&self, parent: &WorldState) -> WorldState {
        let matrix = parent.matrix * self.local.to_matrix();
        let pose = Pose {
            position: parent.matrix.transform_point(&Point3::from(self.local.position)).coords,
            rotation: math::normalized(parent.pose.rotation * self.local.rotation),
            scale: parent.pose.scale.component_mul(&self.local.scale),
        };
        let state = WorldState { pose, matrix };
        self.cache.set(state);
        self.dirty.set(false);
        state
    }
}

impl World {
    /// World state of `entity`, rebuilding stale ancestors top-down
    pub(crate) fn world_state(&self, entity: EntityId) -> WorldState {
        let mut chain = Vec::new();
        let mut cursor = Some(entity);
        let mut base = WorldState::identity();
        while let Some(id) = cursor {
            let Some(node) = self.entities.get(id) else { break };
            if !node.transform.is_dirty() {
                base = node.transform.cached();
                break;
            }
            chain.push(&node.transform);
            cursor = node.parent;
        }
        for transform in chain.iter().rev() {
            base = transform.recompute(&base);
        }
        base
    }

    /// World state of the parent of `entity`, identity for roots
    pub(crate) fn parent_state(&self, entity: EntityId) -> WorldState {
        self.entities
            .get(entity)
            .and_then(|node| node.parent)
            .map_or_else(WorldState::identity, |parent| self.world_state(parent))
    }

    /// Mark `entity` and every descendant dirty
    pub(crate) fn mark_subtree_dirty(&self, entity: EntityId) {
        let mut stack = vec![entity];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.entities.get(id) {
                node.transform.mark_dirty();
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Rebuild every stale transform in the live tree, parents first
    pub fn refresh_transforms(&self) {
        let mut stack = vec![(self.root, WorldState::identity())];
        while let Some((id, parent)) = stack.pop() {
            let Some(node) = self.entities.get(id) else { continue };
            let state = if node.transform.is_dirty() {
                node.transform.recompute(&parent)
            } else {
                node.transform.cached()
            };
            stack.extend(node.children.iter().rev().map(|child| (*child, state)));
        }
    }

    /// Read access to an entity's transform
    #[must_use]
    pub fn transform(&self, entity: EntityId) -> Option<TransformView<'_>> {
        self.entities
            .contains_key(entity)
            .then_some(TransformView { world: self, entity })
    }

    /// Write access to an entity's transform
    pub fn transform_mut(&mut self, entity: EntityId) -> Result<TransformMut<'_>, super::WorldError> {
        if self.entities.contains_key(entity) {
            Ok(TransformMut { world: self, entity })
        } else {
            Err(super::WorldError::EntityNotFound(entity))
        }
    }
}

/// Read-only view of one entity's transform
#[derive(Clone, Copy)]
pub struct TransformView<'w> {
    world: &'w World,
    entity: EntityId,
}

impl<'w> TransformView<'w> {
    pub(crate) const fn new(world: &'w World, entity: EntityId) -> Self {
        Self { world, entity }
    }

    fn local(&self) -> Pose {
        self.world
            .entities
            .get(self.entity)
            .map_or_else(Pose::identity, |node| *node.transform.local())
    }

    fn state(&self) -> WorldState {
        self.world.world_state(self.entity)
    }

    /// Entity this view belongs to
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Local position
    #[must_use]
    pub fn local_position(&self) -> Vec3 {
        self.local().position
    }

    /// Local rotation
    #[must_use]
    pub fn local_rotation(&self) -> Quat {
        self.local().rotation
    }

    /// Local scale
    #[must_use]
    pub fn local_scale(&self) -> Vec3 {
        self.local().scale
    }

    /// Local pose
    #[must_use]
    pub fn local_pose(&self) -> Pose {
        self.local()
    }

    /// World position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.state().pose.position
    }

    /// World rotation
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.state().pose.rotation
    }

    /// World scale
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.state().pose.scale
    }

    /// World-space +Z axis
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::z()
    }

    /// World-space +Y axis
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::y()
    }

    /// World-space +X axis
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::x()
    }

    /// Local-to-world matrix
    #[must_use]
    pub fn local_to_world_matrix(&self) -> Mat4 {
        self.state().matrix
    }

    /// World-to-local matrix; identity when the transform is degenerate
    #[must_use]
    pub fn world_to_local_matrix(&self) -> Mat4 {
        self.state().inverse_matrix()
    }

    /// Map a point from this transform's local space to world space
    #[must_use]
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.local_to_world_matrix().transform_point(&Point3::from(*point)).coords
    }

    /// Map a point from world space into this transform's local space
    #[must_use]
    pub fn inverse_transform_point(&self, point: &Vec3) -> Vec3 {
        self.world_to_local_matrix().transform_point(&Point3::from(*point)).coords
    }

    /// Rotate a direction from local space to world space
    #[must_use]
    pub fn transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.rotation() * direction
    }

    /// Rotate a direction from world space into local space
    #[must_use]
    pub fn inverse_transform_direction(&self, direction: &Vec3) -> Vec3 {
        self.rotation().inverse() * direction
    }
}

/// Write access to one entity's transform
///
/// Every setter updates the matching local value immediately and marks the
/// subtree dirty, so the next read of any world value is current.
pub struct TransformMut<'w> {
    world: &'w mut World,
    entity: EntityId,
}

impl<'w> TransformMut<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId) -> Self {
        Self { world, entity }
    }

    /// Read access to the same transform
    #[must_use]
    pub fn view(&self) -> TransformView<'_> {
        TransformView::new(self.world, self.entity)
    }

    /// World position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.view().position()
    }

    /// World rotation
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.view().rotation()
    }

    /// Local position
    #[must_use]
    pub fn local_position(&self) -> Vec3 {
        self.view().local_position()
    }

    fn write_local(&mut self, edit: impl FnOnce(&mut Pose)) -> &mut Self {
        if let Some(node) = self.world.entities.get_mut(self.entity) {
            let mut local = *node.transform.local();
            edit(&mut local);
            node.transform.set_local(local);
        }
        self.world.mark_subtree_dirty(self.entity);
        self
    }

    /// Replace the whole local pose
    pub fn set_local_pose(&mut self, pose: Pose) -> &mut Self {
        self.write_local(|local| *local = pose)
    }

    /// Set the local position
    pub fn set_local_position(&mut self, position: Vec3) -> &mut Self {
        self.write_local(|local| local.position = position)
    }

    /// Set the local rotation
    pub fn set_local_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.write_local(|local| local.rotation = rotation)
    }

    /// Set the local scale
    pub fn set_local_scale(&mut self, scale: Vec3) -> &mut Self {
        self.write_local(|local| local.scale = scale)
    }

    /// Set the world position
    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        let local_position = self.world.parent_state(self.entity).local_position_of(&position);
        self.set_local_position(local_position)
    }

    /// Set the world rotation
    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        let local_rotation = self.world.parent_state(self.entity).local_rotation_of(&rotation);
        self.set_local_rotation(local_rotation)
    }

    /// Set the world scale
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        let parent = self.world.parent_state(self.entity);
        if parent.pose.scale.iter().any(|axis| *axis == 0.0) {
            debug!("Parent scale has a zero axis; local scale on that axis becomes zero");
        }
        let local_scale = parent.local_scale_of(&scale);
        self.set_local_scale(local_scale)
    }

    /// Set the full world pose
    pub fn set_world_pose(&mut self, pose: &Pose) -> &mut Self {
        let local = self.world.parent_state(self.entity).local_pose_of(pose);
        self.set_local_pose(local)
    }

    /// Move by `delta` in world space
    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        let position = self.position() + delta;
        self.set_position(position)
    }

    /// Apply `rotation` on top of the current world rotation
    pub fn rotate(&mut self, rotation: Quat) -> &mut Self {
        let combined = rotation * self.rotation();
        self.set_rotation(combined)
    }

    /// Turn so the world +Z axis points along `direction`, keeping the current up hint
    pub fn set_forward(&mut self, direction: Vec3) -> &mut Self {
        if direction.norm_squared() <= f32::EPSILON {
            warn!("Ignoring zero-length forward direction");
            return self;
        }
        let mut up = self.view().up();
        if direction.cross(&up).norm_squared() <= f32::EPSILON {
            up = self.view().forward();
        }
        let rotation = Quat::face_towards(&direction, &up);
        self.set_rotation(rotation)
    }

    /// Turn so the world +Y axis points along `direction`
    pub fn set_up(&mut self, direction: Vec3) -> &mut Self {
        self.align_axis(Vec3::y(), direction)
    }

    /// Turn so the world +X axis points along `direction`
    pub fn set_right(&mut self, direction: Vec3) -> &mut Self {
        self.align_axis(Vec3::x(), direction)
    }

    /// Point the forward axis at a world-space target
    pub fn look_at(&mut self, target: Vec3) -> &mut Self {
        let direction = target - self.position();
        self.set_forward(direction)
    }

    fn align_axis(&mut self, axis: Vec3, direction: Vec3) -> &mut Self {
        if direction.norm_squared() <= f32::EPSILON {
            warn!("Ignoring zero-length axis direction");
            return self;
        }
        let current = self.rotation() * axis;
        // rotation_between has no answer for opposite vectors; spin half a turn instead
        let delta = Quat::rotation_between(&current, &direction).unwrap_or_else(|| {
            let pivot = current.cross(&Vec3::x());
            let pivot = if pivot.norm_squared() <= f32::EPSILON {
                current.cross(&Vec3::y())
            } else {
                pivot
            };
            Quat::from_axis_angle(&nalgebra::Unit::new_normalize(pivot), math::constants::PI)
        });
        let combined = delta * self.rotation();
        self.set_rotation(combined)
    }
}
