// Centralized tolerances for canvas geometry

pub const EPS_POS: f64 = 1e-6; // point coincidence threshold (canvas units)

#[inline] pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

/// +1 for non-negative values, -1 otherwise. Unlike `f64::signum`, -0.0 maps to +1.
#[inline] pub fn step_sign(v: f64) -> f64 { if v < 0.0 { -1.0 } else { 1.0 } }
