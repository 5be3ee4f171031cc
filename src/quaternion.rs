//! Unit quaternions with a memoized rotation matrix.
//!
//! [`Quaternion`] is the rotation engine behind the orbit camera. It can be
//! built from four representations and composed frame over frame:
//!
//! - explicit components `(w, x, y, z)`
//! - Euler angles (yaw about Z, pitch about Y, roll about X)
//! - an angle and an [`Axis`]
//! - a 16-element column-major rotation matrix
//!
//! The column-major matrix form is computed on demand and cached until the
//! components change again.
//!
//! # Composition Order
//!
//! `q_new * q_old` rotates by `q_old` first and `q_new` second. The orbit
//! camera relies on this: every incremental drag rotation is left-multiplied
//! onto the accumulated orientation.
//!
//! ```
//! use crystal::{AngleUnit, Quaternion, Vec3};
//!
//! let about_z = Quaternion::from_angle_axis(90.0, Vec3::Z, AngleUnit::Degrees).unwrap();
//! let about_x = Quaternion::from_angle_axis(90.0, Vec3::X, AngleUnit::Degrees).unwrap();
//!
//! // +X goes to +Y under `about_z`, then +Y goes to +Z under `about_x`.
//! let v = (about_x * about_z).rotate(Vec3::X);
//! assert!((v - Vec3::Z).length() < 1e-5);
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign};

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

/// Magnitude drift tolerated before a quaternion is renormalized.
pub const NORMALIZE_TOLERANCE: f32 = 0.0001;

/// Threshold on `trace + 1` below which matrix extraction switches to the
/// largest-diagonal formulas.
pub const TRACE_TOLERANCE: f32 = 0.0001;

/// Axes shorter than this cannot be normalized.
const MIN_AXIS_LENGTH: f32 = 1.0e-6;

const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Errors raised while building a quaternion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RotationError {
    /// The rotation axis has (almost) zero length or is not finite.
    #[error("rotation axis ({x}, {y}, {z}) has no usable direction")]
    DegenerateAxis { x: f32, y: f32, z: f32 },
    /// An axis slice did not hold exactly three values.
    #[error("rotation axis needs 3 values, got {actual}")]
    AxisLength { actual: usize },
    /// A packed array did not hold the number of values its representation needs.
    #[error("{representation:?} needs {expected} values, got {actual}")]
    WrongLength {
        representation: Representation,
        expected: usize,
        actual: usize,
    },
}

/// Unit of the angles handed to the constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AngleUnit {
    Degrees,
    #[default]
    Radians,
}

impl AngleUnit {
    /// Converts `angle` in this unit to radians.
    #[inline]
    pub fn to_radians(self, angle: f32) -> f32 {
        match self {
            AngleUnit::Degrees => angle.to_radians(),
            AngleUnit::Radians => angle,
        }
    }
}

/// Layout of a packed array given to [`Quaternion::from_slice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    /// `[yaw (Z), pitch (Y), roll (X)]`
    Euler,
    /// `[w, x, y, z]`
    Explicit,
    /// `[theta, x, y, z]`
    AngleAxis,
    /// 16 values, column-major.
    Matrix,
}

impl Representation {
    /// Number of values the representation occupies.
    pub fn value_count(self) -> usize {
        match self {
            Representation::Euler => 3,
            Representation::Explicit | Representation::AngleAxis => 4,
            Representation::Matrix => 16,
        }
    }
}

/// Canonical rotation axis input.
///
/// Arrays, tuples and [`Vec3`] convert into it directly; dynamic slices go
/// through [`Axis::from_slice`] because their length is only known at runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axis(pub Vec3);

impl Axis {
    /// Builds an axis from the first three values of a slice.
    pub fn from_slice(values: &[f32]) -> Result<Self, RotationError> {
        match values {
            [x, y, z] => Ok(Self(Vec3::new(*x, *y, *z))),
            _ => Err(RotationError::AxisLength {
                actual: values.len(),
            }),
        }
    }

    fn normalized(self) -> Result<Vec3, RotationError> {
        let v = self.0;
        let length = v.length();
        if !length.is_finite() || length < MIN_AXIS_LENGTH {
            return Err(RotationError::DegenerateAxis {
                x: v.x,
                y: v.y,
                z: v.z,
            });
        }
        Ok(v / length)
    }
}

impl From<Vec3> for Axis {
    fn from(v: Vec3) -> Self {
        Self(v)
    }
}

impl From<[f32; 3]> for Axis {
    fn from(v: [f32; 3]) -> Self {
        Self(Vec3::from(v))
    }
}

impl From<(f32, f32, f32)> for Axis {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

impl TryFrom<&[f32]> for Axis {
    type Error = RotationError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> {
        Self::from_slice(values)
    }
}

/// Memoized column-major matrix with a staleness flag.
#[derive(Clone, Copy, Debug)]
struct MatrixCache {
    matrix: [f32; 16],
    dirty: bool,
}

impl MatrixCache {
    fn stale() -> Self {
        Self {
            matrix: IDENTITY_MATRIX,
            dirty: true,
        }
    }

    fn loaded(matrix: [f32; 16]) -> Self {
        Self {
            matrix,
            dirty: false,
        }
    }

    #[inline]
    fn invalidate(&mut self) {
        self.dirty = true;
    }
}

/// A rotation stored as a unit quaternion `(w, x, y, z)`.
///
/// Public constructors and operators keep the magnitude within
/// [`NORMALIZE_TOLERANCE`] of one. Equality compares components only; the
/// cached matrix is not part of the value.
#[derive(Clone, Copy, Debug)]
pub struct Quaternion {
    w: f32,
    x: f32,
    y: f32,
    z: f32,
    cache: MatrixCache,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        self.components() == other.components()
    }
}

impl Quaternion {
    /// The identity rotation `(1, 0, 0, 0)`.
    pub fn identity() -> Self {
        Self::raw(1.0, 0.0, 0.0, 0.0)
    }

    /// Builds a quaternion from explicit components and normalizes it.
    ///
    /// A zero quaternion cannot be normalized and is kept as is.
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        let mut q = Self::raw(w, x, y, z);
        q.normalize();
        q
    }

    /// Builds a quaternion from yaw (Z), pitch (Y) and roll (X).
    ///
    /// The rotations compose in Z → Y → X order.
    pub fn from_euler(yaw: f32, pitch: f32, roll: f32, unit: AngleUnit) -> Self {
        let (sin_z, cos_z) = (unit.to_radians(yaw) * 0.5).sin_cos();
        let (sin_y, cos_y) = (unit.to_radians(pitch) * 0.5).sin_cos();
        let (sin_x, cos_x) = (unit.to_radians(roll) * 0.5).sin_cos();

        Self::new(
            cos_x * cos_y * cos_z + sin_x * sin_y * sin_z,
            sin_x * cos_y * cos_z - cos_x * sin_y * sin_z,
            cos_x * sin_y * cos_z + sin_x * cos_y * sin_z,
            cos_x * cos_y * sin_z - sin_x * sin_y * cos_z,
        )
    }

    /// Builds a rotation of `theta` around `axis`.
    ///
    /// The axis does not need to be unit length, but it must have a direction.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::DegenerateAxis`] for a zero or non-finite axis.
    pub fn from_angle_axis(
        theta: f32,
        axis: impl Into<Axis>,
        unit: AngleUnit,
    ) -> Result<Self, RotationError> {
        let axis = axis.into().normalized()?;
        let (sin_half, cos_half) = (unit.to_radians(theta) * 0.5).sin_cos();
        let v = axis * sin_half;

        Ok(Self::new(cos_half, v.x, v.y, v.z))
    }

    /// Extracts the rotation from a column-major 4x4 matrix.
    ///
    /// The supplied matrix is cached verbatim as the matrix form, so reading
    /// [`matrix`](Self::matrix) right after construction returns the exact
    /// input bits.
    pub fn from_matrix(m: &[f32; 16]) -> Self {
        let trace = m[0] + m[5] + m[10] + 1.0;

        let (w, x, y, z) = if trace > TRACE_TOLERANCE {
            let s = trace.sqrt() * 2.0;
            (
                s * 0.25,
                (m[6] - m[9]) / s,
                (m[8] - m[2]) / s,
                (m[1] - m[4]) / s,
            )
        } else if m[0] > m[5] && m[0] > m[10] {
            let s = (1.0 + m[0] - m[5] - m[10]).sqrt() * 2.0;
            (
                (m[6] - m[9]) / s,
                s * 0.25,
                (m[1] + m[4]) / s,
                (m[8] + m[2]) / s,
            )
        } else if m[5] > m[10] {
            let s = (1.0 + m[5] - m[0] - m[10]).sqrt() * 2.0;
            (
                (m[8] - m[2]) / s,
                (m[1] + m[4]) / s,
                s * 0.25,
                (m[6] + m[9]) / s,
            )
        } else {
            let s = (1.0 + m[10] - m[0] - m[5]).sqrt() * 2.0;
            (
                (m[1] - m[4]) / s,
                (m[8] + m[2]) / s,
                (m[6] + m[9]) / s,
                s * 0.25,
            )
        };

        let mut q = Self::raw(w, x, y, z);
        q.normalize();
        q.cache = MatrixCache::loaded(*m);
        q
    }

    /// Builds a quaternion from a packed array in the given representation.
    ///
    /// `unit` applies to Euler angles and to the angle of an angle-axis array.
    pub fn from_slice(
        values: &[f32],
        representation: Representation,
        unit: AngleUnit,
    ) -> Result<Self, RotationError> {
        if values.len() != representation.value_count() {
            return Err(RotationError::WrongLength {
                representation,
                expected: representation.value_count(),
                actual: values.len(),
            });
        }

        match representation {
            Representation::Euler => Ok(Self::from_euler(values[0], values[1], values[2], unit)),
            Representation::Explicit => Ok(Self::new(values[0], values[1], values[2], values[3])),
            Representation::AngleAxis => {
                Self::from_angle_axis(values[0], Axis::from_slice(&values[1..])?, unit)
            }
            Representation::Matrix => {
                let mut m = [0.0; 16];
                m.copy_from_slice(values);
                Ok(Self::from_matrix(&m))
            }
        }
    }

    /// Returns `(w, x, y, z)`.
    #[inline]
    pub fn components(&self) -> (f32, f32, f32, f32) {
        (self.w, self.x, self.y, self.z)
    }

    #[inline]
    pub fn w(&self) -> f32 {
        self.w
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean length of the four components.
    pub fn magnitude(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Returns true if the matrix form must be recomputed before the next read.
    pub fn is_matrix_stale(&self) -> bool {
        self.cache.dirty
    }

    /// Copies the components of `other` into `self` and marks the matrix stale.
    pub fn set(&mut self, other: &Quaternion) {
        self.w = other.w;
        self.x = other.x;
        self.y = other.y;
        self.z = other.z;
        self.cache.invalidate();
    }

    /// Resets to the identity rotation.
    pub fn zero(&mut self) {
        self.set(&Self::identity());
    }

    /// The conjugate, which is the inverse rotation of a unit quaternion.
    pub fn inverse(&self) -> Self {
        Self::raw(self.w, -self.x, -self.y, -self.z)
    }

    /// The column-major 4x4 rotation matrix, recomputed only when stale.
    pub fn matrix(&mut self) -> [f32; 16] {
        if self.cache.dirty {
            self.cache = MatrixCache::loaded(self.compute_matrix());
        }
        self.cache.matrix
    }

    /// The matrix form as a [`Mat4`].
    pub fn to_mat4(&mut self) -> Mat4 {
        Mat4::from_cols_array(&self.matrix())
    }

    /// Rotates a vector by conjugation: `q * (0, v) * q⁻¹`.
    pub fn rotate(&self, v: impl Into<Vec3>) -> Vec3 {
        let v = v.into();
        let pure = Self::raw(0.0, v.x, v.y, v.z);
        let r = self.hamilton(&pure.hamilton(&self.inverse()));
        Vec3::new(r.x, r.y, r.z)
    }

    /// [`rotate`](Self::rotate) for plain arrays.
    pub fn rotate_array(&self, v: [f32; 3]) -> [f32; 3] {
        self.rotate(v).to_array()
    }

    /// Formats the matrix form as four bracketed rows.
    pub fn matrix_display(&mut self) -> String {
        let m = self.matrix();
        format!(
            "[{}, {}, {}, {}]\n|{}, {}, {}, {}|\n|{}, {}, {}, {}|\n[{}, {}, {}, {}]",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12],
            m[13], m[14], m[15]
        )
    }

    fn raw(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self {
            w,
            x,
            y,
            z,
            cache: MatrixCache::stale(),
        }
    }

    fn normalize(&mut self) {
        let magnitude = self.magnitude();
        if magnitude > 0.0 && (magnitude - 1.0).abs() > NORMALIZE_TOLERANCE {
            self.w /= magnitude;
            self.x /= magnitude;
            self.y /= magnitude;
            self.z /= magnitude;
            self.cache.invalidate();
        }
    }

    // Plain Hamilton product, no normalization.
    fn hamilton(&self, b: &Quaternion) -> Quaternion {
        let (w, x, y, z) = self.components();
        Self::raw(
            w * b.w - x * b.x - y * b.y - z * b.z,
            w * b.x + x * b.w + y * b.z - z * b.y,
            w * b.y - x * b.z + y * b.w + z * b.x,
            w * b.z + x * b.y - y * b.x + z * b.w,
        )
    }

    fn compute_matrix(&self) -> [f32; 16] {
        let (w, x, y, z) = self.components();

        let xw = x * w * 2.0;
        let xx = x * x * 2.0;
        let xy = x * y * 2.0;
        let xz = x * z * 2.0;
        let yw = y * w * 2.0;
        let yy = y * y * 2.0;
        let yz = y * z * 2.0;
        let zw = z * w * 2.0;
        let zz = z * z * 2.0;

        #[rustfmt::skip]
        let m = [
            1.0 - (yy + zz), xy + zw,         xz - yw,         0.0,
            xy - zw,         1.0 - (xx + zz), yz + xw,         0.0,
            xz + yw,         yz - xw,         1.0 - (xx + yy), 0.0,
            0.0,             0.0,             0.0,             1.0,
        ];
        m
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        let mut product = self.hamilton(&rhs);
        product.normalize();
        product
    }
}

impl MulAssign for Quaternion {
    fn mul_assign(&mut self, rhs: Quaternion) {
        let product = *self * rhs;
        self.set(&product);
    }
}

impl Add for Quaternion {
    type Output = Quaternion;

    fn add(self, rhs: Quaternion) -> Quaternion {
        let mut sum = Self::raw(
            self.w + rhs.w,
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
        );
        sum.normalize();
        sum
    }
}

impl AddAssign for Quaternion {
    fn add_assign(&mut self, rhs: Quaternion) {
        let sum = *self + rhs;
        self.set(&sum);
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.w, self.x, self.y, self.z)
    }
}

impl From<Quaternion> for Quat {
    fn from(q: Quaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<Quat> for Quaternion {
    fn from(q: Quat) -> Self {
        Quaternion::new(q.w, q.x, q.y, q.z)
    }
}
