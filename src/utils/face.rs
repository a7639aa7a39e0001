// src/utils/face.rs

/// Cosine similarity between two face descriptors.
///
/// Missing trailing entries of `candidate` count as zero. A zero-norm vector is treated
/// as having norm 1. Returns 0.0 whenever the result is not finite, so a NaN can never
/// pass a threshold check.
pub fn cosine_similarity(stored: &[f64], candidate: &[f64]) -> f64 {
    let dot: f64 = stored
        .iter()
        .enumerate()
        .map(|(i, a)| a * candidate.get(i).copied().unwrap_or(0.0))
        .sum();

    let norm = |v: &[f64]| {
        let n = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if n == 0.0 { 1.0 } else { n }
    };

    let similarity = dot / (norm(stored) * norm(candidate));
    if similarity.is_finite() { similarity } else { 0.0 }
}

/// True when every entry is a finite number.
pub fn is_finite_descriptor(descriptor: &[f64]) -> bool {
    descriptor.iter().all(|x| x.is_finite())
}

/// Rounds to 4 decimal places for display.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
