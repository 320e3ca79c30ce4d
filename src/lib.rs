//! Deterministic fixed-timestep 2D physics core.
//!
//! Bodies are axis-aligned, non-rotating point masses carrying an optional
//! [`Shape`]. A [`World`] owns the bodies, partitions them into named
//! collision groups, and resolves overlaps with a positional response.
//! The [`GameLoop`] turns variable wall-clock ticks into a fixed-size
//! simulation step sequence so the same inputs always produce the same
//! simulation, regardless of frame rate.
//!
//! ```
//! use lockstep2d::{Body, GameLoop, Shape, World};
//!
//! let mut world = World::new();
//! world.add_body(
//!     Body::builder()
//!         .shape(Shape::rectangle(16.0, 16.0))
//!         .mass(1.0)
//!         .collision_group("crates")
//!         .collide_against(["ground"])
//!         .build(),
//! );
//!
//! let mut game_loop = GameLoop::new();
//! // One host tick; the timestamp is in milliseconds.
//! game_loop.run(
//!     32.0,
//!     |_step_ms, step_secs| world.update(step_secs),
//!     |_delta_ms, _delta_secs| { /* render */ },
//! );
//! ```

pub mod game_loop;
pub mod math;
pub mod physics;

pub use game_loop::GameLoop;
pub use physics::{
    Body, BodyBehavior, BodyBuilder, BodyHandle, Contact, Shape, Side, World, WorldId,
};
