use std::fmt;

use glam::DVec2;

use super::collision::Contact;
use super::shape::Shape;
use super::world::{BodyHandle, WorldId};

/// Collision hooks a body variant can implement.
///
/// `collide` runs while a positional response is being considered for the
/// body; returning `false` vetoes the correction, which is how one-way
/// platforms and trigger zones are built. `after_collide` runs once the
/// correction has been applied. The defaults accept every response and do
/// nothing afterwards.
pub trait BodyBehavior {
    /// Decide whether the pending positional response should be applied to
    /// `body`. `contact` carries the resolved direction or angle.
    fn collide(&mut self, body: &mut Body, other: &Body, contact: Contact) -> bool {
        let _ = (body, other, contact);
        true
    }

    /// Informational hook, invoked after `body` has been pushed out of
    /// `other`.
    fn after_collide(&mut self, body: &mut Body, other: &Body) {
        let _ = (body, other);
    }
}

/// Simulated point mass with a shape, kinematic state, and collision
/// membership.
///
/// Bodies are created standalone (usually through [`BodyBuilder`]) and
/// become live once added to a [`super::World`], which owns them.
pub struct Body {
    /// Current position (center of the shape)
    pub position: DVec2,
    /// Position at the start of the current integration step; collision
    /// response infers its push-out direction from this, not from
    /// `position`, so an overlap resolves against the edge it crossed
    pub last_position: DVec2,
    /// Velocity in units per second
    pub velocity: DVec2,
    /// Componentwise speed cap; 0 on an axis leaves that axis unbounded
    pub velocity_limit: DVec2,
    /// Constant force, applied every integration step
    pub force: DVec2,
    /// Gravity scale; 0 leaves the body unaffected by gravity
    pub mass: f64,
    /// Exponential velocity decay factor in `[0, 1)`
    pub damping: f64,
    pub(crate) shape: Option<Shape>,
    pub(crate) collision_group: Option<String>,
    pub(crate) collide_against: Vec<String>,
    pub(crate) behavior: Option<Box<dyn BodyBehavior>>,
    pub(crate) world: Option<WorldId>,
    // Scratch: bodies hit during the most recent group test
    pub(crate) collides: Vec<BodyHandle>,
    pub(crate) removed: bool,
}

impl Body {
    /// Create an inert body: no shape, no group, zero mass and velocity
    pub fn new() -> Self {
        Self {
            position: DVec2::ZERO,
            last_position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            velocity_limit: DVec2::ZERO,
            force: DVec2::ZERO,
            mass: 0.0,
            damping: 0.0,
            shape: None,
            collision_group: None,
            collide_against: Vec::new(),
            behavior: None,
            world: None,
            collides: Vec::new(),
            removed: false,
        }
    }

    /// Start building a body
    pub fn builder() -> BodyBuilder {
        BodyBuilder::new()
    }

    /// The body's collision shape, if any
    pub fn shape(&self) -> Option<&Shape> {
        self.shape.as_ref()
    }

    /// Replace the body's shape, discarding the old one
    pub fn set_shape(&mut self, shape: Option<Shape>) {
        self.shape = shape;
    }

    /// The collision group this body belongs to, if any
    pub fn collision_group(&self) -> Option<&str> {
        self.collision_group.as_deref()
    }

    /// Groups this body actively tests against, in declared order
    pub fn collide_against(&self) -> &[String] {
        &self.collide_against
    }

    /// Identity of the owning world, once the body has been added to one
    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    /// Bodies this one overlapped during its most recent group test.
    /// Per-frame scratch; rebuilt on every group test, not persisted.
    pub fn collides(&self) -> &[BodyHandle] {
        &self.collides
    }

    /// Advance the body by `dt` seconds under `gravity`.
    ///
    /// Gravity only applies when `mass` is nonzero; damping decays velocity
    /// as `(1 - damping)^dt` so the decay rate is frame-rate independent;
    /// each velocity axis is clamped to its limit when that limit is
    /// positive. Deterministic: identical inputs produce bit-identical
    /// state.
    pub fn integrate(&mut self, gravity: DVec2, dt: f64) {
        self.last_position = self.position;
        if self.mass != 0.0 {
            self.velocity += gravity * self.mass * dt;
        }
        self.velocity += self.force * dt;
        if self.damping > 0.0 && self.damping < 1.0 {
            self.velocity *= (1.0 - self.damping).powf(dt);
        }
        if self.velocity_limit.x > 0.0 {
            self.velocity.x = self
                .velocity
                .x
                .clamp(-self.velocity_limit.x, self.velocity_limit.x);
        }
        if self.velocity_limit.y > 0.0 {
            self.velocity.y = self
                .velocity
                .y
                .clamp(-self.velocity_limit.y, self.velocity_limit.y);
        }
        self.position += self.velocity * dt;
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("mass", &self.mass)
            .field("shape", &self.shape)
            .field("collision_group", &self.collision_group)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring bodies before adding them to a world.
///
/// Every recognized field is an explicit method; anything else is rejected
/// by the type system rather than silently merged in.
pub struct BodyBuilder {
    body: Body,
}

impl BodyBuilder {
    /// Start from an inert body
    pub fn new() -> Self {
        Self { body: Body::new() }
    }

    /// Set the initial position (also used as the initial last position)
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.body.position = DVec2::new(x, y);
        self.body.last_position = self.body.position;
        self
    }

    /// Set the initial velocity
    pub fn velocity(mut self, x: f64, y: f64) -> Self {
        self.body.velocity = DVec2::new(x, y);
        self
    }

    /// Set the componentwise velocity limit (0 = unbounded on that axis)
    pub fn velocity_limit(mut self, x: f64, y: f64) -> Self {
        self.body.velocity_limit = DVec2::new(x, y);
        self
    }

    /// Set the constant force applied every step
    pub fn force(mut self, x: f64, y: f64) -> Self {
        self.body.force = DVec2::new(x, y);
        self
    }

    /// Set the gravity scale (0 = unaffected by gravity)
    pub fn mass(mut self, mass: f64) -> Self {
        self.body.mass = mass;
        self
    }

    /// Set the velocity damping factor, expected in `[0, 1)`
    pub fn damping(mut self, damping: f64) -> Self {
        debug_assert!((0.0..1.0).contains(&damping), "damping must be in [0, 1)");
        self.body.damping = damping;
        self
    }

    /// Attach a collision shape
    pub fn shape(mut self, shape: Shape) -> Self {
        self.body.shape = Some(shape);
        self
    }

    /// Register the body in a collision group when it joins a world
    pub fn collision_group(mut self, group: impl Into<String>) -> Self {
        self.body.collision_group = Some(group.into());
        self
    }

    /// Declare the groups this body tests against, in resolution order.
    /// May include the body's own group; the body itself is skipped by
    /// identity.
    pub fn collide_against<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body.collide_against = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Attach collision hooks
    pub fn behavior(mut self, behavior: impl BodyBehavior + 'static) -> Self {
        self.body.behavior = Some(Box::new(behavior));
        self
    }

    /// Build the body
    pub fn build(self) -> Body {
        self.body
    }
}

impl Default for BodyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
