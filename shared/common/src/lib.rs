pub use arrayvec::*;
pub use boolinator::Boolinator;
pub use bumpalo;
pub use cgmath;
pub use cgmath::{
    Angle, EuclideanSpace, InnerSpace, Matrix, MetricSpace, Rotation2, SquareMatrix, VectorSpace,
    Zero,
};
pub use derive_more;
pub use float_cmp::ApproxEq;
pub use itertools::*;
pub use num_derive;
pub use num_traits;
pub use ordered_float::{NotNan, OrderedFloat};
pub use parking_lot;
pub use rand::prelude::*;
pub use rstar;
pub use smallvec::*;
pub use thiserror::{self, Error};

pub use lazy_static::lazy_static;
pub use logging::{self, prelude::*};

#[cfg(feature = "metrics")]
pub use metrics;

// common imports that annoyingly get resolved to other pub exports of std/core
// https://github.com/intellij-rust/intellij-rust/issues/5654
pub use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
    marker::PhantomData,
};

pub mod input;

/// Boxed trait-object error, used only at the runtime/host boundary - internal
/// crates prefer a concrete `thiserror` enum.
pub type BoxedResult<T> = Result<T, Box<dyn Error>>;

pub type F = f32;
pub type Vector2 = cgmath::Vector2<F>;
pub type Point2 = cgmath::Point2<F>;
pub type Matrix4 = cgmath::Matrix4<F>;
pub type Basis2 = cgmath::Basis2<F>;
pub type Rad = cgmath::Rad<F>;
pub type Deg = cgmath::Deg<F>;

#[inline]
pub fn rad(f: F) -> Rad {
    cgmath::Rad(f)
}

#[inline]
pub fn deg(f: F) -> Deg {
    cgmath::Deg(f)
}

/// +y is "up" on the 2D battlefield, matching screen-space convention used by the camera.
pub const AXIS_FWD_2: Vector2 = Vector2::new(0.0, 1.0);

/// Clamp `vec`'s magnitude to `max`, leaving shorter vectors untouched.
pub fn truncate(vec: Vector2, max: F) -> Vector2 {
    if vec.magnitude2() > (max * max) {
        vec.normalize_to(max)
    } else {
        vec
    }
}

/// Nearest of the 8 compass directions for a facing vector, as an index 0..8 (0 = north,
/// clockwise). Used by sprite facing and the octile pathfinding heuristic's neighbour set.
pub fn facing_8(vec: Vector2) -> u8 {
    if vec.magnitude2() < 1e-6 {
        return 0;
    }
    let angle = Angle::atan2(vec.x, vec.y); // clockwise from +y
    let deg = (cgmath::Deg::from(angle).0 + 360.0) % 360.0;
    (((deg / 45.0).round() as i32) % 8) as u8
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
