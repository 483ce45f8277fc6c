//! The Jovian-planet n-body benchmark: a symplectic Euler integrator over five bodies.

use std::{
    f64::consts::PI,
    ops::{Add, Mul, Sub},
};

pub const SOLAR_MASS: f64 = 4.0 * PI * PI;
pub const DAYS_PER_YEAR: f64 = 365.24;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm_sqr(self) -> f64 {
        self.dot(self)
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f64,
}

impl Body {
    /// Position in AU, velocity in AU/day, mass in solar masses.
    fn new(position: [f64; 3], velocity: [f64; 3], mass: f64) -> Self {
        let [x, y, z] = position;
        let [vx, vy, vz] = velocity;
        Self {
            position: Vec3::new(x, y, z),
            velocity: Vec3::new(vx, vy, vz) * DAYS_PER_YEAR,
            mass: mass * SOLAR_MASS,
        }
    }
}

pub const BODY_COUNT: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct System {
    bodies: [Body; BODY_COUNT],
}

impl System {
    /// Sun, Jupiter, Saturn, Uranus and Neptune, with the Sun moving so the
    /// system's total momentum is zero.
    pub fn jovian() -> Self {
        let mut bodies = [
            Body::new([0.0; 3], [0.0; 3], 1.0),
            Body::new(
                [4.84143144246472090e+00, -1.16032004402742839e+00, -1.03622044471123109e-01],
                [1.66007664274403694e-03, 7.69901118419740425e-03, -6.90460016972063023e-05],
                9.54791938424326609e-04,
            ),
            Body::new(
                [8.34336671824457987e+00, 4.12479856412430479e+00, -4.03523417114321381e-01],
                [-2.76742510726862411e-03, 4.99852801234917238e-03, 2.30417297573763929e-05],
                2.85885980666130812e-04,
            ),
            Body::new(
                [1.28943695621391310e+01, -1.51111514016986312e+01, -2.23307578892655734e-01],
                [2.96460137564761618e-03, 2.37847173959480950e-03, -2.96589568540237556e-05],
                4.36624404335156298e-05,
            ),
            Body::new(
                [1.53796971148509165e+01, -2.59193146099879641e+01, 1.79258772950371181e-01],
                [2.68067772490389322e-03, 1.62824170038242295e-03, -9.51592254519715870e-05],
                5.15138902046611451e-05,
            ),
        ];

        let momentum = bodies
            .iter()
            .fold(Vec3::ZERO, |p, body| p + body.velocity * body.mass);
        bodies[0].velocity = momentum * (-1.0 / SOLAR_MASS);

        Self { bodies }
    }

    pub fn bodies(&self) -> &[Body; BODY_COUNT] {
        &self.bodies
    }

    /// One step: pairwise velocity kicks from the current positions, then drift.
    pub fn advance(&mut self, dt: f64) {
        for i in 0..BODY_COUNT {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let b1 = &mut head[i];
            for b2 in tail {
                let delta = b1.position - b2.position;
                let d2 = delta.norm_sqr();
                let mag = dt / (d2 * d2.sqrt());
                b1.velocity = b1.velocity - delta * (mag * b2.mass);
                b2.velocity = b2.velocity + delta * (mag * b1.mass);
            }
        }
        for body in &mut self.bodies {
            body.position = body.position + body.velocity * dt;
        }
    }

    pub fn advance_n(&mut self, steps: usize, dt: f64) {
        for _ in 0..steps {
            self.advance(dt);
        }
    }

    /// Kinetic minus potential energy; constant for an exact integrator.
    pub fn total_energy(&self) -> f64 {
        let kinetic: f64 = self
            .bodies
            .iter()
            .map(|body| 0.5 * body.mass * body.velocity.norm_sqr())
            .sum();

        let mut potential = 0.0;
        for (i, b1) in self.bodies.iter().enumerate() {
            for b2 in &self.bodies[i + 1..] {
                let distance = (b1.position - b2.position).norm_sqr().sqrt();
                potential += b1.mass * b2.mass / distance;
            }
        }

        kinetic - potential
    }
}

impl Default for System {
    fn default() -> Self {
        Self::jovian()
    }
}
