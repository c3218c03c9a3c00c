use std::f32::consts::PI;

use glam::Vec3;

/// Rotating skyrmion-like texture centered on `center`.
///
/// Directions point up (+z) at the center and turn over to -z at `radius`;
/// the in-plane part rotates with `phase`.
pub fn skyrmion(positions: &[Vec3], center: Vec3, radius: f32, phase: f32) -> Vec<Vec3> {
    positions
        .iter()
        .map(|&p| {
            let d = p - center;
            let r = (d.x * d.x + d.y * d.y).sqrt();
            let polar = PI * (r / radius.max(f32::EPSILON)).min(1.0);
            let azimuth = d.y.atan2(d.x) + PI / 2.0 + phase;
            Vec3::new(
                polar.sin() * azimuth.cos(),
                polar.sin() * azimuth.sin(),
                polar.cos(),
            )
        })
        .collect()
}
