use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::DVec2;
use log::{debug, trace};

use super::body::Body;
use super::collision;

/// Gravity default, in pixels per second squared with +y pointing down
pub const DEFAULT_GRAVITY: DVec2 = DVec2::new(0.0, 980.0);

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`World`]. Bodies carry this instead of a live back
/// reference to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(u64);

/// Handle to a body owned by a [`World`].
///
/// Generational: once the body is removed and its slot reused, the old
/// handle goes stale instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Physics world that owns all bodies and drives the simulation.
///
/// `update` runs one fixed step: deferred removals, integration of every
/// body, group pruning, then the collision pass. Group iteration uses an
/// ordered map so identical inputs replay identically across runs.
pub struct World {
    id: WorldId,
    gravity: DVec2,
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Group tag -> members in insertion order
    groups: BTreeMap<String, Vec<BodyHandle>>,
    len: usize,
}

impl World {
    /// Create a world with the default downward gravity
    pub fn new() -> Self {
        Self::with_gravity(DEFAULT_GRAVITY)
    }

    /// Create a world with custom gravity
    pub fn with_gravity(gravity: DVec2) -> Self {
        Self {
            id: WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed)),
            gravity,
            slots: Vec::new(),
            free: Vec::new(),
            groups: BTreeMap::new(),
            len: 0,
        }
    }

    /// This world's identity
    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Current gravity
    pub fn gravity(&self) -> DVec2 {
        self.gravity
    }

    /// Set gravity for subsequent updates
    pub fn set_gravity(&mut self, gravity: DVec2) {
        self.gravity = gravity;
    }

    /// Number of live bodies (bodies flagged for removal still count until
    /// the next update sweeps them out)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the world has no bodies
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Take ownership of a body and return its handle. Registers the body
    /// in its collision group, if it declares one.
    pub fn add_body(&mut self, mut body: Body) -> BodyHandle {
        body.world = Some(self.id);
        body.removed = false;
        let group = body.collision_group.clone();

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.body = Some(body);
                BodyHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    body: Some(body),
                });
                BodyHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.len += 1;

        if let Some(group) = group {
            trace!("body {:?} joins collision group '{}'", handle, group);
            self.groups.entry(group).or_default().push(handle);
        }
        handle
    }

    /// Flag a body for removal. The body stays in place until the start of
    /// the next [`World::update`], so removal during an in-progress
    /// collision pass never invalidates iteration. Stale handles and
    /// double removal are no-ops.
    pub fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle) {
            body.removed = true;
        }
    }

    /// Whether the handle still refers to a live body
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    /// Borrow a body by handle
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    /// Mutably borrow a body by handle
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    /// Number of members in a collision group (0 for unknown groups)
    pub fn group_len(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, Vec::len)
    }

    /// Whether a collision group currently exists (empty groups are pruned
    /// during `update`)
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Drop every body and collision group; gravity and world identity are
    /// kept. Handles obtained before the clear must be discarded.
    pub fn clear(&mut self) {
        debug!("clearing world {:?} ({} bodies)", self.id, self.len);
        self.slots.clear();
        self.free.clear();
        self.groups.clear();
        self.len = 0;
    }

    /// Advance the simulation by `dt` seconds: sweep deferred removals,
    /// integrate every surviving body, prune empty groups, then resolve
    /// collisions group by group. Not reentrant; call once per fixed step.
    pub fn update(&mut self, dt: f64) {
        self.sweep_removed();

        let gravity = self.gravity;
        for slot in &mut self.slots {
            if let Some(body) = slot.body.as_mut() {
                body.integrate(gravity, dt);
            }
        }

        self.groups.retain(|group, members| {
            if members.is_empty() {
                debug!("pruning empty collision group '{}'", group);
                false
            } else {
                true
            }
        });

        self.resolve_collisions();
    }

    /// Splice out every body flagged for removal and unregister it from
    /// its collision group.
    fn sweep_removed(&mut self) {
        for index in 0..self.slots.len() {
            let flagged = matches!(&self.slots[index].body, Some(body) if body.removed);
            if !flagged {
                continue;
            }
            let slot = &mut self.slots[index];
            let body = slot.body.take();
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
            self.len -= 1;

            if let Some(group) = body.and_then(|b| b.collision_group) {
                if let Some(members) = self.groups.get_mut(&group) {
                    members.retain(|member| member.index != index as u32);
                }
            }
            trace!("removed body at slot {}", index);
        }
    }

    /// Broad phase: per group, per member with outgoing collision
    /// interest, test against each group it declares, in declared order.
    fn resolve_collisions(&mut self) {
        let group_names: Vec<String> = self.groups.keys().cloned().collect();
        for name in &group_names {
            let members = match self.groups.get(name) {
                Some(members) => members.clone(),
                None => continue,
            };
            for &caller in &members {
                let targets = match self.body(caller) {
                    Some(body) if !body.collide_against.is_empty() => {
                        body.collide_against.clone()
                    }
                    _ => continue,
                };
                for target in &targets {
                    self.collide_group(caller, target);
                }
            }
        }
    }

    /// Narrow phase against one target group: collect every overlapping
    /// member first, then run responses in hit order. The two-phase split
    /// keeps a response that moves the caller from changing which bodies
    /// counted as hit for this group.
    fn collide_group(&mut self, caller: BodyHandle, group: &str) {
        let mut hits: Vec<BodyHandle> = Vec::new();
        if let Some(members) = self.groups.get(group) {
            let body = match self.body(caller) {
                Some(body) => body,
                None => return,
            };
            for &candidate in members {
                // self is skipped by identity, not by group exclusion
                if candidate == caller {
                    continue;
                }
                if let Some(other) = self.body(candidate) {
                    if collision::hit_test(body, other) {
                        hits.push(candidate);
                    }
                }
            }
        }

        if let Some(body) = self.body_mut(caller) {
            body.collides.clear();
            body.collides.extend_from_slice(&hits);
        }

        for hit in hits {
            if let Some((body, other)) = self.pair_mut(caller, hit) {
                if collision::hit_response(body, other) {
                    collision::dispatch_after_collide(body, other);
                }
            }
        }
    }

    /// Simultaneous mutable/shared borrow of two distinct bodies.
    fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut Body, &Body)> {
        let ai = a.index as usize;
        let bi = b.index as usize;
        if ai == bi || ai >= self.slots.len() || bi >= self.slots.len() {
            return None;
        }
        let (slot_a, slot_b) = if ai < bi {
            let (lo, hi) = self.slots.split_at_mut(bi);
            (&mut lo[ai], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(ai);
            (&mut hi[0], &mut lo[bi])
        };
        if slot_a.generation != a.generation || slot_b.generation != b.generation {
            return None;
        }
        match (slot_a.body.as_mut(), slot_b.body.as_ref()) {
            (Some(body), Some(other)) => Some((body, other)),
            _ => None,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyBehavior, Contact, Shape, Side};
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn falling_box(x: f64, y: f64) -> Body {
        Body::builder()
            .position(x, y)
            .shape(Shape::rectangle(10.0, 10.0))
            .mass(1.0)
            .collision_group("boxes")
            .collide_against(["ground"])
            .build()
    }

    fn ground_box(x: f64, y: f64) -> Body {
        Body::builder()
            .position(x, y)
            .shape(Shape::rectangle(100.0, 10.0))
            .collision_group("ground")
            .build()
    }

    #[test]
    fn test_gravity_scenario() {
        // gravity (0, 980), mass 1, one 0.1s step
        let mut world = World::new();
        let handle = world.add_body(Body::builder().mass(1.0).build());
        world.update(0.1);

        let body = world.body(handle).expect("body should be live");
        assert_relative_eq!(body.velocity.y, 98.0);
        assert_relative_eq!(body.position.y, 9.8);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.position.x, 0.0);
    }

    #[test]
    fn test_custom_gravity_and_identity() {
        let mut world = World::with_gravity(DVec2::new(0.0, -10.0));
        assert_eq!(world.gravity(), DVec2::new(0.0, -10.0));

        let other = World::new();
        assert_ne!(world.id(), other.id());

        let handle = world.add_body(Body::new());
        assert_eq!(world.body(handle).unwrap().world(), Some(world.id()));
    }

    #[test]
    fn test_falling_box_lands_on_ground() {
        let mut world = World::new();
        let a = world.add_body(falling_box(0.0, -30.0));
        world.add_body(ground_box(0.0, 10.0));

        // enough steps for the box to reach and settle on the ground
        for _ in 0..30 {
            world.update(1.0 / 60.0);
        }

        let body = world.body(a).unwrap();
        // flush on top of the ground: ground top 5, box half-height 5
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.position.x, 0.0);
    }

    #[test]
    fn test_collides_scratch_records_hits() {
        let mut world = World::with_gravity(DVec2::ZERO);
        let a = world.add_body(falling_box(0.0, 2.0));
        let b = world.add_body(ground_box(0.0, 10.0));
        world.update(1.0 / 60.0);

        let body = world.body(a).unwrap();
        assert_eq!(body.collides(), [b]);
    }

    #[test]
    fn test_deferred_removal_and_group_pruning() {
        let mut world = World::new();
        let a = world.add_body(falling_box(0.0, 0.0));
        let b = world.add_body(falling_box(30.0, 0.0));
        assert_eq!(world.group_len("boxes"), 2);

        world.remove_body(a);
        // still present until the next update sweeps it
        assert!(world.contains(a));
        assert_eq!(world.group_len("boxes"), 2);

        world.update(1.0 / 60.0);
        assert!(!world.contains(a));
        assert!(world.contains(b));
        assert_eq!(world.group_len("boxes"), 1);
        assert_eq!(world.len(), 1);

        world.remove_body(b);
        world.update(1.0 / 60.0);
        assert_eq!(world.group_len("boxes"), 0);
        // emptied groups are pruned from the index
        assert!(!world.contains_group("boxes"));
        assert!(world.is_empty());
    }

    #[test]
    fn test_double_removal_is_idempotent() {
        let mut world = World::new();
        let a = world.add_body(Body::new());
        world.remove_body(a);
        world.remove_body(a);
        world.update(1.0 / 60.0);
        assert_eq!(world.len(), 0);

        // stale handle: further removal is a no-op
        world.remove_body(a);
        world.update(1.0 / 60.0);
        assert_eq!(world.len(), 0);
    }

    #[test]
    fn test_stale_handle_does_not_alias_reused_slot() {
        let mut world = World::new();
        let a = world.add_body(Body::new());
        world.remove_body(a);
        world.update(1.0 / 60.0);

        let b = world.add_body(Body::new());
        assert!(!world.contains(a));
        assert!(world.contains(b));
    }

    #[test]
    fn test_bodies_without_interest_are_skipped() {
        // ground declares no collide_against, so it never moves even while
        // overlapping another body
        let mut world = World::with_gravity(DVec2::ZERO);
        let g = world.add_body(ground_box(0.0, 0.0));
        world.add_body(falling_box(0.0, 2.0));
        world.update(1.0 / 60.0);
        assert_eq!(world.body(g).unwrap().position, DVec2::new(0.0, 0.0));
    }

    #[test]
    fn test_after_collide_fires_on_landing() {
        struct CountLandings {
            landings: Rc<Cell<u32>>,
            vetoed: Rc<Cell<u32>>,
        }
        impl BodyBehavior for CountLandings {
            fn collide(&mut self, _body: &mut Body, _other: &Body, contact: Contact) -> bool {
                if contact == Contact::Side(Side::Down) {
                    true
                } else {
                    self.vetoed.set(self.vetoed.get() + 1);
                    false
                }
            }
            fn after_collide(&mut self, body: &mut Body, _other: &Body) {
                body.velocity.y = 0.0;
                self.landings.set(self.landings.get() + 1);
            }
        }

        let landings = Rc::new(Cell::new(0));
        let vetoed = Rc::new(Cell::new(0));
        let mut world = World::new();
        let mut body = falling_box(0.0, -30.0);
        body.behavior = Some(Box::new(CountLandings {
            landings: Rc::clone(&landings),
            vetoed: Rc::clone(&vetoed),
        }));
        let a = world.add_body(body);
        world.add_body(ground_box(0.0, 10.0));

        for _ in 0..30 {
            world.update(1.0 / 60.0);
        }

        assert!(landings.get() > 0);
        assert_eq!(vetoed.get(), 0);
        let body = world.body(a).unwrap();
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_own_group_skips_self_by_identity() {
        let mut world = World::with_gravity(DVec2::ZERO);
        let lone = world.add_body(
            Body::builder()
                .shape(Shape::circle(5.0))
                .collision_group("balls")
                .collide_against(["balls"])
                .build(),
        );
        // a body alone in its own group must not collide with itself
        world.update(1.0 / 60.0);
        let body = world.body(lone).unwrap();
        assert_eq!(body.position, DVec2::ZERO);
        assert!(body.collides().is_empty());
    }

    #[test]
    fn test_circles_in_same_group_push_apart() {
        let mut world = World::with_gravity(DVec2::ZERO);
        let a = world.add_body(
            Body::builder()
                .position(2.0, 0.0)
                .shape(Shape::circle(3.0))
                .collision_group("balls")
                .collide_against(["balls"])
                .build(),
        );
        let b = world.add_body(
            Body::builder()
                .position(0.0, 0.0)
                .shape(Shape::circle(3.0))
                .collision_group("balls")
                .build(),
        );
        world.update(1.0 / 60.0);

        let pos_a = world.body(a).unwrap().position;
        let pos_b = world.body(b).unwrap().position;
        assert_relative_eq!(pos_a.distance(pos_b), 6.0);
        // b declares no interest, so only a moved
        assert_eq!(pos_b, DVec2::ZERO);
    }

    #[test]
    fn test_clear_drops_bodies_and_groups() {
        let mut world = World::new();
        world.add_body(falling_box(0.0, 0.0));
        world.add_body(ground_box(0.0, 20.0));
        world.clear();
        assert!(world.is_empty());
        assert!(!world.contains_group("boxes"));
        assert!(!world.contains_group("ground"));
        // world stays usable after a clear
        let h = world.add_body(falling_box(0.0, 0.0));
        assert!(world.contains(h));
    }
}
