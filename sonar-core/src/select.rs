//! Score-weighted random pick over search hits.

use rand::Rng;

use crate::error::{Result, SonarError};

/// Pick one candidate with probability proportional to `weight(candidate)`.
///
/// Walks the candidates in order, subtracting each normalized weight from a
/// uniform draw, and returns the first one that brings the draw to zero or
/// below. If the walk runs off the end (floating-point residue), or every
/// weight is zero, the heaviest candidate is returned instead, ties going to
/// the earliest.
pub fn weighted_choice<'a, T, F, R>(candidates: &'a [T], weight: F, rng: &mut R) -> Result<&'a T>
where
    F: Fn(&T) -> f64,
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return Err(SonarError::InvalidInput(
            "cannot choose from an empty candidate list".to_string(),
        ));
    }

    let weights: Vec<f64> = candidates.iter().map(&weight).collect();
    if let Some((index, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(SonarError::InvalidInput(format!(
            "candidate {index} has invalid weight {w}"
        )));
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        let ratio = 1.0 / total;
        let mut n: f64 = rng.gen();
        for (candidate, w) in candidates.iter().zip(&weights) {
            n -= w * ratio;
            if n <= 0.0 {
                return Ok(candidate);
            }
        }
    }

    Ok(&candidates[heaviest(&weights)])
}

/// Index of the first maximum weight. `weights` must be non-empty.
fn heaviest(weights: &[f64]) -> usize {
    let mut best = 0;
    for (i, w) in weights.iter().enumerate().skip(1) {
        if *w > weights[best] {
            best = i;
        }
    }
    best
}
