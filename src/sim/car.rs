use crate::config::Material;

pub const CAR_LENGTH: f32 = 40.0;
pub const CAR_WIDTH: f32 = 20.0;

/// Wrap an angle in degrees into [0, 360).
pub fn normalize_angle(deg: f32) -> f32 {
    let a = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Kinematic car: a rotated rectangle moving along its heading.
#[derive(Clone, Debug, PartialEq)]
pub struct Car {
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, [0, 360).
    pub angle: f32,
    pub speed: f32,
    pub length: f32,
    pub width: f32,
}

impl Car {
    pub fn new(x: f32, y: f32, angle: f32, speed: f32) -> Self {
        Self { x, y, angle: normalize_angle(angle), speed, length: CAR_LENGTH, width: CAR_WIDTH }
    }

    /// `[x, y, heading]`.
    pub fn pose(&self) -> [f32; 3] { [self.x, self.y, self.angle] }

    fn axes(&self) -> ((f32, f32), (f32, f32)) {
        let (s, c) = self.angle.to_radians().sin_cos();
        ((c, s), (-s, c))
    }

    /// Footprint corners, counter-clockwise starting front-left.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let ((fx, fy), (lx, ly)) = self.axes();
        let (hl, hw) = (self.length / 2.0, self.width / 2.0);
        let at = |a: f32, b: f32| (self.x + fx * a + lx * b, self.y + fy * a + ly * b);
        [at(hl, hw), at(-hl, hw), at(-hl, -hw), at(hl, -hw)]
    }

    /// Apply steering (degrees at full speed) and acceleration on `material`,
    /// then move one tick.
    pub fn drive(&mut self, steer: f32, accel: f32, material: Material, max_speed: f32) {
        let grip = material.grip();
        let limit = max_speed * material.speed_cap();
        self.speed = (self.speed + accel * grip).clamp(0.0, limit);
        self.angle = normalize_angle(self.angle + steer * grip * (self.speed / max_speed));
        self.advance();
    }

    /// Move one tick along the current heading at the current speed.
    pub fn advance(&mut self) {
        let ((fx, fy), _) = self.axes();
        self.x += fx * self.speed;
        self.y += fy * self.speed;
    }

    /// Separating-axis test between two rotated rectangles.
    pub fn collides_with(&self, other: &Car) -> bool {
        let reach = (self.length.hypot(self.width) + other.length.hypot(other.width)) / 2.0;
        if (self.x - other.x).hypot(self.y - other.y) > reach {
            return false;
        }
        let a = self.corners();
        let b = other.corners();
        let (a0, a1) = self.axes();
        let (b0, b1) = other.axes();
        [a0, a1, b0, b1].iter().all(|&axis| {
            let (amin, amax) = project(&a, axis);
            let (bmin, bmax) = project(&b, axis);
            amax >= bmin && bmax >= amin
        })
    }
}

fn project(points: &[(f32, f32); 4], (ax, ay): (f32, f32)) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &(x, y)| {
        let d = x * ax + y * ay;
        (lo.min(d), hi.max(d))
    })
}
