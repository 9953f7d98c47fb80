//! 3D scene rendering
//!
//! Particles are projected on the CPU through a pinhole camera and painted
//! back to front as shaded discs with a soft glow. The camera orbits the
//! origin: it starts at (0, 0, 10) looking down -Z, so particles approach it
//! as Z grows. Behind them sit a static starfield and the wireframe home base.

use eframe::egui;
use egui::{Pos2, Rect, Stroke, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::core::{palette, PacketScene, ParticleEntity};
use crate::theme::{self, colors};

/// Radians of orbit per dragged point
const ORBIT_SPEED: f32 = 0.005;
/// Keeps the camera off the poles so the up vector stays defined
const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;
const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 60.0;
/// Zoom factor per scrolled point
const ZOOM_SPEED: f32 = 0.002;

type Vec3 = [f32; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: Vec3) -> Vec3 {
    let len = dot(v, v).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Perspective camera orbiting `target`
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub target: Vec3,
    pub distance: f32,
    /// Rotation around +Y, zero looks down -Z
    pub yaw: f32,
    /// Elevation above the XZ plane
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    /// Points closer than this are clipped
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            distance: 10.0,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 60.0,
            near: 0.1,
        }
    }
}

/// A point projected to the viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    /// Offset from the viewport's top-left corner, in points
    pub x: f32,
    pub y: f32,
    /// Distance in front of the camera
    pub depth: f32,
    /// Screen points per world unit at this depth
    pub scale: f32,
}

impl Camera {
    /// Eye position in world space
    pub fn position(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        [
            self.target[0] + self.distance * cp * sy,
            self.target[1] + self.distance * sp,
            self.target[2] + self.distance * cp * cy,
        ]
    }

    /// Rotate around the target by a pointer drag, in points
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw = (self.yaw - dx * ORBIT_SPEED).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + dy * ORBIT_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move toward (positive) or away from the target by a scroll delta
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance * (-scroll * ZOOM_SPEED).exp()).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    fn focal(&self, height: f32) -> f32 {
        (height * 0.5) / (self.fov_y.to_radians() * 0.5).tan()
    }

    /// Right, up and forward axes
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = normalize(sub(self.target, self.position()));
        let right = normalize(cross(forward, [0.0, 1.0, 0.0]));
        let up = cross(right, forward);
        (right, up, forward)
    }

    /// Project a world point into a `width` x `height` viewport.
    /// None when the point is behind the near plane.
    pub fn project(&self, point: Vec3, width: f32, height: f32) -> Option<Projected> {
        let (right, up, forward) = self.basis();
        let rel = sub(point, self.position());
        let depth = dot(rel, forward);
        if depth <= self.near {
            return None;
        }
        let scale = self.focal(height) / depth;
        Some(Projected {
            x: width * 0.5 + dot(rel, right) * scale,
            y: height * 0.5 - dot(rel, up) * scale,
            depth,
            scale,
        })
    }
}

/// Sprite ready to paint
struct Sprite {
    center: Pos2,
    radius: f32,
    depth: f32,
    color: palette::Rgb,
    rotation: [f32; 2],
}

fn sprite(p: &ParticleEntity, camera: &Camera, rect: Rect, radius: f32) -> Option<Sprite> {
    let position = p.position.map(|c| c as f32);
    let proj = camera.project(position, rect.width(), rect.height())?;
    let radius = (radius * proj.scale).max(0.5);
    let center = rect.min + Vec2::new(proj.x, proj.y);
    if !rect.expand(radius * 3.0).contains(center) {
        return None;
    }
    Some(Sprite {
        center,
        radius,
        depth: proj.depth,
        color: palette::protocol_color(p.protocol),
        rotation: p.rotation.map(|r| r as f32),
    })
}

/// Paint every particle of `scene` into `rect`. Returns how many were visible.
pub fn paint(painter: &egui::Painter, rect: Rect, scene: &PacketScene, camera: &Camera) -> usize {
    let radius = scene.config().particle_radius as f32;
    let mut sprites: Vec<Sprite> = scene
        .particles()
        .filter_map(|p| sprite(p, camera, rect, radius))
        .collect();

    // Far first so nearer spheres cover them
    sprites.sort_by(|a, b| b.depth.total_cmp(&a.depth));

    for s in &sprites {
        painter.circle_filled(s.center, s.radius * 2.2, theme::rgba(s.color, colors::GLOW_ALPHA));
        painter.circle_filled(s.center, s.radius, theme::rgb(s.color));

        // Specular spot orbiting with the sphere's spin
        let [rx, ry] = s.rotation;
        let offset = Vec2::new(ry.cos() * 0.35 - 0.2, rx.sin() * 0.35 - 0.2) * s.radius;
        painter.circle_filled(s.center + offset, s.radius * 0.3, colors::HIGHLIGHT);
    }

    sprites.len()
}

#[derive(Clone, Copy, Debug)]
struct Star {
    position: Vec3,
    /// Dot radius in points
    size: f32,
    brightness: f32,
}

/// Static shell of background stars around the origin
pub struct Starfield {
    stars: Vec<Star>,
}

impl Starfield {
    pub const COUNT: usize = 5000;
    /// Inner radius of the shell
    pub const RADIUS: f32 = 100.0;
    /// Shell thickness
    pub const DEPTH: f32 = 50.0;

    pub fn seeded(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let stars = (0..Self::COUNT)
            .map(|_| {
                let r = Self::RADIUS + Self::DEPTH * rng.gen::<f32>();
                // Uniform direction on the sphere
                let polar = (1.0 - 2.0 * rng.gen::<f32>()).clamp(-1.0, 1.0).acos();
                let azimuth = std::f32::consts::TAU * rng.gen::<f32>();
                Star {
                    position: [
                        r * polar.sin() * azimuth.cos(),
                        r * polar.cos(),
                        r * polar.sin() * azimuth.sin(),
                    ],
                    size: rng.gen_range(0.5..1.5),
                    brightness: rng.gen_range(0.3..1.0),
                }
            })
            .collect();
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Distances of every star from the origin
    pub fn radii(&self) -> impl Iterator<Item = f32> + '_ {
        self.stars.iter().map(|s| dot(s.position, s.position).sqrt())
    }

    /// Paint the stars in front of the camera. Returns how many were drawn.
    pub fn paint(&self, painter: &egui::Painter, rect: Rect, camera: &Camera) -> usize {
        let mut drawn = 0;
        for star in &self.stars {
            let Some(proj) = camera.project(star.position, rect.width(), rect.height()) else {
                continue;
            };
            let center = rect.min + Vec2::new(proj.x, proj.y);
            if !rect.contains(center) {
                continue;
            }
            // Deeper stars fade out
            let fade = 1.0 - ((proj.depth - Self::RADIUS) / (Self::DEPTH * 2.0)).clamp(0.0, 0.6);
            painter.circle_filled(center, star.size, colors::STAR.gamma_multiply(star.brightness * fade));
            drawn += 1;
        }
        drawn
    }
}

impl Default for Starfield {
    fn default() -> Self {
        Self::seeded(rand::random())
    }
}

/// Flat box under the particle stream
pub const HOME_BASE_CENTER: Vec3 = [0.0, -2.0, 0.0];
pub const HOME_BASE_SIZE: Vec3 = [2.0, 0.2, 2.0];

/// The eight corners of the home base, bottom face first
pub fn home_base_corners() -> [Vec3; 8] {
    let [cx, cy, cz] = HOME_BASE_CENTER;
    let [hx, hy, hz] = HOME_BASE_SIZE.map(|s| s * 0.5);
    let mut corners = [[0.0; 3]; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -hx } else { hx };
        let sz = if i & 2 == 0 { -hz } else { hz };
        let sy = if i & 4 == 0 { -hy } else { hy };
        *corner = [cx + sx, cy + sy, cz + sz];
    }
    corners
}

/// Corner index pairs, one per box edge
const HOME_BASE_EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 3), (3, 2), (2, 0),
    (4, 5), (5, 7), (7, 6), (6, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

/// Paint the home base wireframe. Edges crossing the near plane are skipped.
pub fn paint_home_base(painter: &egui::Painter, rect: Rect, camera: &Camera) -> usize {
    let corners = home_base_corners()
        .map(|c| camera.project(c, rect.width(), rect.height()).map(|p| rect.min + Vec2::new(p.x, p.y)));
    let stroke = Stroke::new(1.0, colors::HOME_BASE);
    let mut drawn = 0;
    for (a, b) in HOME_BASE_EDGES {
        if let (Some(a), Some(b)) = (corners[a], corners[b]) {
            painter.line_segment([a, b], stroke);
            drawn += 1;
        }
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_center() {
        let cam = Camera::default();
        let p = cam.project([0.0, 0.0, 0.0], 800.0, 600.0).unwrap();
        assert_eq!((p.x, p.y), (400.0, 300.0));
        assert_eq!(p.depth, 10.0);
    }

    #[test]
    fn test_offset_scales_with_depth() {
        let cam = Camera::default();
        let near = cam.project([1.0, 1.0, 0.0], 800.0, 600.0).unwrap();
        let far = cam.project([1.0, 1.0, -40.0], 800.0, 600.0).unwrap();

        // 60 degree fov: focal = 300 / tan(30deg)
        let focal = 300.0 / 30f32.to_radians().tan();
        assert!((near.x - (400.0 + focal / 10.0)).abs() < 1e-3);
        assert!(near.y < 300.0, "+Y is up on screen");
        assert!(far.scale < near.scale);
        assert!((far.x - 400.0) < (near.x - 400.0));
    }

    #[test]
    fn test_behind_camera_is_clipped() {
        let cam = Camera::default();
        assert!(cam.project([0.0, 0.0, 10.0], 800.0, 600.0).is_none());
        assert!(cam.project([0.0, 0.0, 12.0], 800.0, 600.0).is_none());
        // Recycle threshold is still in front of the camera
        assert!(cam.project([0.0, 0.0, 5.0], 800.0, 600.0).is_some());
    }

    #[test]
    fn test_default_camera_position() {
        let [x, y, z] = Camera::default().position();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
        assert!((z - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_keeps_distance_and_target() {
        let mut cam = Camera::default();
        cam.orbit(200.0, -120.0);
        let pos = cam.position();
        assert!((pos[0].abs() + pos[1].abs()) > 0.1, "camera moved");
        assert!((dot(pos, pos).sqrt() - 10.0).abs() < 1e-4);

        // The target stays centered wherever the camera goes
        let p = cam.project([0.0, 0.0, 0.0], 800.0, 600.0).unwrap();
        assert!((p.x - 400.0).abs() < 1e-3 && (p.y - 300.0).abs() < 1e-3);
        assert!((p.depth - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_pitch_is_clamped() {
        let mut cam = Camera::default();
        cam.orbit(0.0, 1.0e6);
        assert!(cam.pitch <= MAX_PITCH);
        cam.orbit(0.0, -1.0e7);
        assert!(cam.pitch >= -MAX_PITCH);
        // Basis stays finite at the limit
        assert!(cam.project([0.0, 0.0, 0.0], 800.0, 600.0).is_some());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = Camera::default();
        cam.zoom(120.0);
        assert!(cam.distance < 10.0, "scrolling up moves closer");
        cam.zoom(1.0e5);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(-1.0e5);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_starfield_is_seeded() {
        let a = Starfield::seeded(42);
        let b = Starfield::seeded(42);
        assert_eq!(a.len(), Starfield::COUNT);
        assert!(a.stars.iter().zip(&b.stars).all(|(x, y)| x.position == y.position));
        assert!(a
            .radii()
            .all(|r| r >= Starfield::RADIUS - 1e-3 && r <= Starfield::RADIUS + Starfield::DEPTH + 1e-3));
    }

    #[test]
    fn test_home_base_sits_below_origin() {
        let corners = home_base_corners();
        assert!(corners.iter().all(|c| (c[1] - -2.0).abs() <= 0.1 + 1e-6));
        assert!(corners.iter().all(|c| c[0].abs() == 1.0 && c[2].abs() == 1.0));

        let cam = Camera::default();
        for c in corners {
            let p = cam.project(c, 800.0, 600.0).expect("in front of the default camera");
            assert!(p.y > 300.0, "below the horizon");
        }
    }

    #[test]
    fn test_every_home_base_edge_has_length() {
        let corners = home_base_corners();
        for (a, b) in HOME_BASE_EDGES {
            let d = sub(corners[a], corners[b]);
            assert!(dot(d, d) > 0.0);
            // Box edges are axis aligned
            assert_eq!(d.iter().filter(|c| c.abs() > 0.0).count(), 1);
        }
    }
}
