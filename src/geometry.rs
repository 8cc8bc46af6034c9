// src/geometry.rs
use nalgebra::Vector3;

use crate::landmarks::{LandmarkSet, Side, INDEX_MCP, PINKY_MCP, WRIST};

pub fn distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// Distance between two landmarks of the same set.
pub fn landmark_distance(set: &LandmarkSet, a: usize, b: usize) -> f64 {
    distance(&set.position(a), &set.position(b))
}

/// Unit vector in the direction of `v`; a zero vector is returned unchanged.
pub fn unit(v: Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm == 0.0 {
        v
    } else {
        v / norm
    }
}

/// Palm normal from the wrist -> index MCP and wrist -> pinky MCP edges.
/// Operand order flips with handedness so the normal points out of the palm
/// for both hands.
pub fn palm_normal(hand: &LandmarkSet, side: Side) -> Vector3<f64> {
    let wrist = hand.position(WRIST);
    let to_index = hand.position(INDEX_MCP) - wrist;
    let to_pinky = hand.position(PINKY_MCP) - wrist;

    let normal = match side {
        Side::Right => to_index.cross(&to_pinky),
        Side::Left => to_pinky.cross(&to_index),
    };
    unit(normal)
}

/// Pointing direction of the hand, wrist -> index MCP.
pub fn finger_direction(hand: &LandmarkSet) -> Vector3<f64> {
    unit(hand.position(INDEX_MCP) - hand.position(WRIST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LandmarkKind};

    fn hand_with(wrist: [f64; 3], index_mcp: [f64; 3], pinky_mcp: [f64; 3]) -> LandmarkSet {
        let mut points = vec![Landmark::default(); 21];
        points[WRIST] = Landmark::new(wrist[0], wrist[1], wrist[2]);
        points[INDEX_MCP] = Landmark::new(index_mcp[0], index_mcp[1], index_mcp[2]);
        points[PINKY_MCP] = Landmark::new(pinky_mcp[0], pinky_mcp[1], pinky_mcp[2]);
        LandmarkSet::new(LandmarkKind::Hand, points).unwrap()
    }

    #[test]
    fn test_unit_keeps_zero_vector() {
        assert_eq!(unit(Vector3::zeros()), Vector3::zeros());
        assert!((unit(Vector3::new(3.0, 4.0, 0.0)).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_palm_normal_flips_with_handedness() {
        // x -> index, y -> pinky: x cross y = +z for the right hand
        let hand = hand_with([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let right = palm_normal(&hand, Side::Right);
        let left = palm_normal(&hand, Side::Left);
        assert!((right.z - 1.0).abs() < 1e-12);
        assert!((left.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_palm_has_zero_normal() {
        let hand = hand_with([0.5, 0.5, 0.0], [0.5, 0.5, 0.0], [0.5, 0.5, 0.0]);
        assert_eq!(palm_normal(&hand, Side::Right), Vector3::zeros());
    }

    #[test]
    fn test_landmark_distance() {
        let hand = hand_with([0.0, 0.0, 0.0], [0.3, 0.4, 0.0], [0.0, 0.0, 0.0]);
        assert!((landmark_distance(&hand, WRIST, INDEX_MCP) - 0.5).abs() < 1e-12);
    }
}
