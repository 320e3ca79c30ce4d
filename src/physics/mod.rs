// 2D physics: body integration, collision groups, shape-vs-shape response

pub mod body;
pub mod collision;
pub mod shape;
pub mod world;

pub use body::{Body, BodyBehavior, BodyBuilder};
pub use collision::{hit_response, hit_test, Contact, Side};
pub use shape::Shape;
pub use world::{BodyHandle, World, WorldId, DEFAULT_GRAVITY};
