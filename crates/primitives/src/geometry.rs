use std::ops::{Add, Sub};


/// A position in view (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	/// The origin.
	pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

	/// Creates a new point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Self) -> f64 {
		let d = other - self;
		d.x.hypot(d.y)
	}
}

impl Add for Point {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}
