use crate::Value;

/// Median of the finite values; the mean of the middle pair for even counts.
#[must_use]
pub fn median(values: &[Value]) -> Option<Value> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();

    if sorted.is_empty() {
        return None;
    }

    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        Some((sorted.get(mid - 1)? + sorted.get(mid)?) / 2.0)
    } else {
        sorted.get(mid).copied()
    }
}

/// Rounds to `decimals` places; values too large to scale are returned as is.
pub(crate) fn round_to(value: Value, decimals: u32) -> Value {
    let factor = 10_f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let scaled = value * factor;

    if scaled.is_finite() {
        // NOTE: + 0.0 turns -0.0 into 0.0 so both vote together
        (scaled.round() / factor) + 0.0
    } else {
        value
    }
}

/// Most frequent value after rounding to `decimals` places.
///
/// Ties between several most frequent values are broken by their median.
/// Non-finite inputs are ignored; `None` if nothing is left.
#[must_use]
pub fn mode(values: &[Value], decimals: u32) -> Option<Value> {
    let mut counts: crate::HashMap<u64, (Value, usize)> = crate::HashMap::default();

    for &value in values {
        if !value.is_finite() {
            continue;
        }

        let rounded = round_to(value, decimals);

        counts
            .entry(rounded.to_bits())
            .and_modify(|(_, count)| *count += 1)
            .or_insert((rounded, 1));
    }

    let max_count = counts.values().map(|&(_, count)| count).max()?;

    let candidates = counts
        .into_values()
        .filter(|&(_, count)| count == max_count)
        .map(|(value, _)| value)
        .collect::<Vec<_>>();

    match candidates.as_slice() {
        [single] => Some(*single),
        _ => median(&candidates),
    }
}

/// Collapses values into one representative: the mode, falling back to the median.
pub(crate) fn representative(values: &[Value], decimals: u32) -> Option<Value> {
    mode(values, decimals).or_else(|| median(values))
}
