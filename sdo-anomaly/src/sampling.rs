use rand::seq::index;
use rand::Rng;

/// Draws `amount` values from `window` uniformly without replacement.
///
/// `amount` is clamped to the window length. Each position of `window` is picked
/// at most once, so duplicates in the result only come from duplicate inputs.
/// Values are returned in the order they were sampled.
pub fn sample_without_replacement<R>(rng: &mut R, window: &[f64], amount: usize) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    let amount = amount.min(window.len());
    index::sample(rng, window.len(), amount)
        .into_iter()
        .map(|i| window[i])
        .collect()
}
