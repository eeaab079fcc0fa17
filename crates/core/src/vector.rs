//! Vector helpers for the ANN index.

/// Scale `v` to unit L2 norm in place so that inner product equals cosine similarity.
/// Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return;
    }
    for x in v.iter_mut() {
        #[allow(clippy::cast_possible_truncation, reason = "unit-scaled component fits f32")]
        let scaled = (f64::from(*x) / norm) as f32;
        *x = scaled;
    }
}

/// Inner product of two equal-length vectors. Mismatched lengths yield `0.0`.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    #[allow(clippy::cast_possible_truncation, reason = "dot of unit vectors is bounded [-1,1]")]
    let result = sum as f32;
    result
}
