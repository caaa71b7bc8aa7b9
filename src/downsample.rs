/// Series element that may or may not support averaging. Numeric series are
/// reduced by averaging runs; anything else is sampled as-is.
pub trait Value: Clone {
    /// Mean of a run of values, or `None` if this type has no meaningful mean.
    fn mean(values: &[Self]) -> Option<Self>;
}

impl Value for f64 {
    fn mean(values: &[Self]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl Value for String {
    fn mean(_values: &[Self]) -> Option<Self> {
        None
    }
}

/// Reduce a series to exactly `target_len` points, preserving order.
///
/// Inputs already at or below the target length come back unchanged. The walk
/// keeps a floating emission threshold advanced by `len / target_len` per
/// output point, which lands on exactly `target_len` emissions for any target
/// between 1 and the input length. Whether runs are averaged is decided once,
/// from the first element.
pub fn reduce<T: Value>(items: &[T], target_len: usize) -> Vec<T> {
    if target_len >= items.len() {
        return items.to_vec();
    }
    if target_len == 0 {
        return Vec::new();
    }

    let averaged = items
        .first()
        .is_some_and(|first| T::mean(std::slice::from_ref(first)).is_some());

    let step = items.len() as f64 / target_len as f64;
    let mut next_index = 0.0;
    let mut pending: Vec<T> = Vec::new();
    let mut reduced = Vec::with_capacity(target_len);

    for (index, item) in items.iter().enumerate() {
        if averaged {
            pending.push(item.clone());
        }
        if index as f64 >= next_index {
            // Pending run includes the current element in averaging mode;
            // in pass-through mode nothing was buffered and the element
            // itself is emitted.
            reduced.push(T::mean(&pending).unwrap_or_else(|| item.clone()));
            pending.clear();
            next_index += step;
        }
    }

    reduced
}
