use glam::DVec2;

use super::body::Body;
use super::shape::Shape;
use crate::math;

/// Push-out direction for a rectangle pair, named after the way the moving
/// body was travelling when it crossed the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Moving body came from above and landed on the other's top edge
    Down,
    /// Moving body came from below and hit the other's bottom edge
    Up,
    /// Moving body came from the left and hit the other's left edge
    Right,
    /// Moving body came from the right and hit the other's right edge
    Left,
}

/// How two bodies came into contact, as passed to
/// [`super::BodyBehavior::collide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// Rectangle pair with a clean separating axis on the previous step
    Side(Side),
    /// Rectangle pair that was already overlapping on the previous step;
    /// directionless, so no positional correction is applied
    Inside,
    /// Circle pair; angle in radians from the other body's center towards
    /// this body's center
    Angle(f64),
}

/// Pure geometric overlap test between two bodies.
///
/// All comparisons are strict, so touching is not overlapping: two
/// rectangles sharing an edge report no hit. A body with no shape never
/// overlaps anything.
pub fn hit_test(a: &Body, b: &Body) -> bool {
    match (a.shape, b.shape) {
        (
            Some(Shape::Rectangle {
                width: wa,
                height: ha,
            }),
            Some(Shape::Rectangle {
                width: wb,
                height: hb,
            }),
        ) => {
            let delta = (a.position - b.position).abs();
            delta.x < (wa + wb) * 0.5 && delta.y < (ha + hb) * 0.5
        }
        (Some(Shape::Circle { radius: ra }), Some(Shape::Circle { radius: rb })) => {
            a.position.distance(b.position) < ra + rb
        }
        (Some(Shape::Rectangle { width, height }), Some(Shape::Circle { radius })) => {
            rect_circle_overlap(a.position, width, height, b.position, radius)
        }
        (Some(Shape::Circle { radius }), Some(Shape::Rectangle { width, height })) => {
            rect_circle_overlap(b.position, width, height, a.position, radius)
        }
        _ => false,
    }
}

/// Positional collision response: pushes `a` out of `b`.
///
/// Call only for a pair that [`hit_test`] reported as overlapping. The
/// direction comes from both bodies' `last_position`, so an overlap that
/// built up during the current step still resolves against the edge that
/// was actually crossed. The body's `collide` hook may veto the
/// correction. Only same-shape pairs are corrected; mixed pairs overlap
/// without response. Returns whether `a` was moved.
pub fn hit_response(a: &mut Body, b: &Body) -> bool {
    match (a.shape, b.shape) {
        (
            Some(Shape::Rectangle {
                width: wa,
                height: ha,
            }),
            Some(Shape::Rectangle {
                width: wb,
                height: hb,
            }),
        ) => {
            let half_a = DVec2::new(wa * 0.5, ha * 0.5);
            let half_b = DVec2::new(wb * 0.5, hb * 0.5);
            let contact = rect_rect_contact(a.last_position, half_a, b.last_position, half_b);
            if !dispatch_collide(a, b, contact) {
                return false;
            }
            match contact {
                Contact::Side(Side::Down) => {
                    a.position.y = b.position.y - half_b.y - half_a.y;
                    true
                }
                Contact::Side(Side::Up) => {
                    a.position.y = b.position.y + half_b.y + half_a.y;
                    true
                }
                Contact::Side(Side::Right) => {
                    a.position.x = b.position.x - half_b.x - half_a.x;
                    true
                }
                Contact::Side(Side::Left) => {
                    a.position.x = b.position.x + half_b.x + half_a.x;
                    true
                }
                // started inside: nothing to snap against
                _ => false,
            }
        }
        (Some(Shape::Circle { radius: ra }), Some(Shape::Circle { radius: rb })) => {
            let angle = math::angle_from(b.position, a.position);
            if !dispatch_collide(a, b, Contact::Angle(angle)) {
                return false;
            }
            a.position = b.position + math::direction(angle) * (ra + rb);
            true
        }
        _ => false,
    }
}

/// Invoke the body's `collide` hook for a pending response; bodies without
/// a behavior accept by default.
fn dispatch_collide(a: &mut Body, b: &Body, contact: Contact) -> bool {
    match a.behavior.take() {
        Some(mut behavior) => {
            let accepted = behavior.collide(a, b, contact);
            a.behavior = Some(behavior);
            accepted
        }
        None => true,
    }
}

/// Invoke the body's `after_collide` hook following a successful response.
pub(crate) fn dispatch_after_collide(a: &mut Body, b: &Body) {
    if let Some(mut behavior) = a.behavior.take() {
        behavior.after_collide(a, b);
        a.behavior = Some(behavior);
    }
}

fn rect_circle_overlap(
    rect_pos: DVec2,
    width: f64,
    height: f64,
    center: DVec2,
    radius: f64,
) -> bool {
    let half = DVec2::new(width * 0.5, height * 0.5);
    let closest = center.clamp(rect_pos - half, rect_pos + half);
    center.distance_squared(closest) < radius * radius
}

/// Classify a rectangle pair by where `a` was on the previous step. The
/// four tests are mutually exclusive because the previous step had no
/// overlap along at least one clean axis; touching counts as separated,
/// matching the strict overlap test.
fn rect_rect_contact(last_a: DVec2, half_a: DVec2, last_b: DVec2, half_b: DVec2) -> Contact {
    if last_a.y + half_a.y <= last_b.y - half_b.y {
        Contact::Side(Side::Down)
    } else if last_a.y - half_a.y >= last_b.y + half_b.y {
        Contact::Side(Side::Up)
    } else if last_a.x + half_a.x <= last_b.x - half_b.x {
        Contact::Side(Side::Right)
    } else if last_a.x - half_a.x >= last_b.x + half_b.x {
        Contact::Side(Side::Left)
    } else {
        Contact::Inside
    }
}
