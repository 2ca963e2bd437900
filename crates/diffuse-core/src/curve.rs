//! Curve library: transfer functions between abscissa and amplitude.
//!
//! A curve maps a normalized abscissa `U ∈ [0, 1]` to an amplitude
//! `A ∈ [0, 1]` and back. Ramps advance linearly in abscissa space, so the
//! curve is what gives a ramp its perceived shape.
//!
//! Two families exist, each with its own global curve:
//!
//! | Family | Shapes | Parameter |
//! |--------|--------|-----------|
//! | [`CurveFamily::Ramp`] | linear, poly, exp, sigmoid | shape specific (exponent / steepness) |
//! | [`CurveFamily::Xfade`] | linear, sqrt, sinus | level at the midpoint, in dB (negative) |
//!
//! All curves map 0 to 0 and 1 to 1, are monotonic on `[0, 1]` and have an
//! exact inverse inside their valid parameter range. Parameters outside that
//! range fall back to the linear curve rather than producing NaN.
//!
//! # Dispatch
//!
//! [`Curve`] is a tagged shape plus a parameter. The mixing loop calls
//! [`Curve::resolve`] once per chunk, which looks the shape up in a fixed
//! table of plain function pointers, and then evaluates the
//! [`ResolvedCurve`] per output.

use core::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, LN_10};
use core::fmt;
use core::str::FromStr;

use libm::{asin, atanh, expm1, fabs, log, log1p, pow, sin, tanh};

use crate::error::DiffuseError;

/// Below this magnitude exp and sigmoid degenerate to linear.
const FLAT: f64 = 1e-9;

/// Transfer function signature: `(x, param) -> y`.
pub type CurveFn = fn(f64, f64) -> f64;

/// Which of the two global curves an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveFamily {
    /// Gain ramps between states.
    Ramp,
    /// Crossfades, including circular panning.
    #[default]
    Xfade,
}

impl CurveFamily {
    /// Both families.
    pub const ALL: [CurveFamily; 2] = [CurveFamily::Ramp, CurveFamily::Xfade];

    /// Symbolic name: `"ramp"` or `"xfade"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ramp => "ramp",
            Self::Xfade => "xfade",
        }
    }

    /// The other family.
    pub fn other(self) -> Self {
        match self {
            Self::Ramp => Self::Xfade,
            Self::Xfade => Self::Ramp,
        }
    }
}

impl fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveFamily {
    type Err = DiffuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ramp" => Ok(Self::Ramp),
            "xfade" => Ok(Self::Xfade),
            _ => Err(DiffuseError::InvalidArgument("curve family must be ramp or xfade")),
        }
    }
}

/// Curve shape, selected at runtime by symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveShape {
    /// `A = U`. Valid in both families.
    Linear,
    /// `A = U^p`, `p > 0`.
    Poly,
    /// `A = (e^(pU) - 1) / (e^p - 1)`.
    Exp,
    /// Normalized `tanh` S-curve with steepness `p > 0`.
    Sigmoid,
    /// `A = U^k`, with `k` chosen so `A(0.5)` sits at `p` dB.
    Sqrt,
    /// `A = sin(U·π/2)^k`, with `k` chosen so `A(0.5)` sits at `p` dB.
    Sinus,
}

const SHAPES: [(CurveFn, CurveFn); 6] = [
    (linear, linear),
    (poly_forward, poly_inverse),
    (exp_forward, exp_inverse),
    (sigmoid_forward, sigmoid_inverse),
    (sqrt_forward, sqrt_inverse),
    (sinus_forward, sinus_inverse),
];

impl CurveShape {
    /// Every shape, in table order.
    pub const ALL: [CurveShape; 6] = [
        CurveShape::Linear,
        CurveShape::Poly,
        CurveShape::Exp,
        CurveShape::Sigmoid,
        CurveShape::Sqrt,
        CurveShape::Sinus,
    ];

    #[inline]
    fn table_index(self) -> usize {
        match self {
            Self::Linear => 0,
            Self::Poly => 1,
            Self::Exp => 2,
            Self::Sigmoid => 3,
            Self::Sqrt => 4,
            Self::Sinus => 5,
        }
    }

    /// Symbolic name used by commands and config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Poly => "poly",
            Self::Exp => "exp",
            Self::Sigmoid => "sigmoid",
            Self::Sqrt => "sqrt",
            Self::Sinus => "sinus",
        }
    }

    /// Whether this shape may be installed as the curve of `family`.
    pub fn belongs_to(self, family: CurveFamily) -> bool {
        match self {
            Self::Linear => true,
            Self::Poly | Self::Exp | Self::Sigmoid => family == CurveFamily::Ramp,
            Self::Sqrt | Self::Sinus => family == CurveFamily::Xfade,
        }
    }

    /// Forward/inverse function pointers for this shape.
    #[inline]
    pub fn functions(self) -> (CurveFn, CurveFn) {
        SHAPES[self.table_index()]
    }
}

impl fmt::Display for CurveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveShape {
    type Err = DiffuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.name() == s)
            .ok_or(DiffuseError::InvalidArgument("unknown curve shape"))
    }
}

/// A curve shape together with its parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    /// Transfer function.
    pub shape: CurveShape,
    /// Shape parameter.
    pub param: f64,
}

impl Curve {
    /// Default ramp curve: exponential, parameter 4.
    pub const DEFAULT_RAMP: Curve = Curve::new(CurveShape::Exp, 4.0);
    /// Default crossfade curve: sine law at -3 dB.
    pub const DEFAULT_XFADE: Curve = Curve::new(CurveShape::Sinus, -3.0);
    /// Identity curve.
    pub const LINEAR: Curve = Curve::new(CurveShape::Linear, 0.0);

    /// Creates a curve.
    pub const fn new(shape: CurveShape, param: f64) -> Self {
        Self { shape, param }
    }

    /// Looks the shape up once, for repeated evaluation.
    #[inline]
    pub fn resolve(&self) -> ResolvedCurve {
        let (forward, inverse) = self.shape.functions();
        ResolvedCurve {
            forward,
            inverse,
            param: self.param,
        }
    }

    /// Abscissa to amplitude.
    #[inline]
    pub fn forward(&self, u: f64) -> f64 {
        (self.shape.functions().0)(u, self.param)
    }

    /// Amplitude to abscissa.
    #[inline]
    pub fn inverse(&self, a: f64) -> f64 {
        (self.shape.functions().1)(a, self.param)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shape, self.param)
    }
}

/// A curve with its function pointers already looked up.
#[derive(Clone, Copy)]
pub struct ResolvedCurve {
    forward: CurveFn,
    inverse: CurveFn,
    param: f64,
}

impl ResolvedCurve {
    /// Abscissa to amplitude.
    #[inline]
    pub fn forward(&self, u: f64) -> f64 {
        (self.forward)(u, self.param)
    }

    /// Amplitude to abscissa.
    #[inline]
    pub fn inverse(&self, a: f64) -> f64 {
        (self.inverse)(a, self.param)
    }
}

/// The two global curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSet {
    /// Curve used by [`CurveFamily::Ramp`] operations.
    pub ramp: Curve,
    /// Curve used by [`CurveFamily::Xfade`] operations.
    pub xfade: Curve,
}

impl Default for CurveSet {
    fn default() -> Self {
        Self {
            ramp: Curve::DEFAULT_RAMP,
            xfade: Curve::DEFAULT_XFADE,
        }
    }
}

impl CurveSet {
    /// Curve of the given family.
    #[inline]
    pub fn get(&self, family: CurveFamily) -> Curve {
        match family {
            CurveFamily::Ramp => self.ramp,
            CurveFamily::Xfade => self.xfade,
        }
    }

    /// Mutable access to the curve of the given family.
    pub fn get_mut(&mut self, family: CurveFamily) -> &mut Curve {
        match family {
            CurveFamily::Ramp => &mut self.ramp,
            CurveFamily::Xfade => &mut self.xfade,
        }
    }
}

#[inline]
fn unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn linear(x: f64, _param: f64) -> f64 {
    unit(x)
}

fn poly_forward(u: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return unit(u);
    }
    unit(pow(unit(u), p))
}

fn poly_inverse(a: f64, p: f64) -> f64 {
    if p <= 0.0 {
        return unit(a);
    }
    unit(pow(unit(a), 1.0 / p))
}

fn exp_forward(u: f64, p: f64) -> f64 {
    if fabs(p) < FLAT {
        return unit(u);
    }
    unit(expm1(p * unit(u)) / expm1(p))
}

fn exp_inverse(a: f64, p: f64) -> f64 {
    if fabs(p) < FLAT {
        return unit(a);
    }
    unit(log1p(unit(a) * expm1(p)) / p)
}

fn sigmoid_forward(u: f64, p: f64) -> f64 {
    if fabs(p) < FLAT {
        return unit(u);
    }
    unit(0.5 * (1.0 + tanh(p * (2.0 * unit(u) - 1.0)) / tanh(p)))
}

fn sigmoid_inverse(a: f64, p: f64) -> f64 {
    if fabs(p) < FLAT {
        return unit(a);
    }
    unit(0.5 * (1.0 + atanh((2.0 * unit(a) - 1.0) * tanh(p)) / p))
}

/// Exponent that puts `base^k` at `db` decibels.
///
/// Returns `None` when the level is not a cut (`db >= 0`).
#[inline]
fn midpoint_exponent(db: f64, base: f64) -> Option<f64> {
    let k = (db * LN_10 / 20.0) / log(base);
    (k > FLAT && k.is_finite()).then_some(k)
}

fn sqrt_forward(u: f64, db: f64) -> f64 {
    match midpoint_exponent(db, 0.5) {
        Some(k) => unit(pow(unit(u), k)),
        None => unit(u),
    }
}

fn sqrt_inverse(a: f64, db: f64) -> f64 {
    match midpoint_exponent(db, 0.5) {
        Some(k) => unit(pow(unit(a), 1.0 / k)),
        None => unit(a),
    }
}

fn sinus_forward(u: f64, db: f64) -> f64 {
    match midpoint_exponent(db, FRAC_1_SQRT_2) {
        Some(k) => unit(pow(sin(unit(u) * FRAC_PI_2), k)),
        None => unit(u),
    }
}

fn sinus_inverse(a: f64, db: f64) -> f64 {
    match midpoint_exponent(db, FRAC_1_SQRT_2) {
        Some(k) => unit(asin(pow(unit(a), 1.0 / k)) / FRAC_PI_2),
        None => unit(a),
    }
}
