/// Asserts that a numerical value is in the provided interval `[a,b]` and panics
/// with a helpful message if not
///
/// ### Example
/// ```should_panic
/// use qtrain::assert_interval;
/// let value = 2.0;
/// assert_interval!(value, 0.0, 1.0);
/// ```
/// This will panic with the message "Invalid value for \`value\`. Must be in the interval \[0.0, 1.0\]."
#[macro_export]
macro_rules! assert_interval {
    ($var:expr, $a:expr, $b:expr) => {
        assert!(
            $var >= $a && $var <= $b,
            "Invalid value for `{}`. Must be in the interval [{}, {}].",
            stringify!($var),
            $a,
            $b,
        );
    };
}

/// Index of the largest value in a slice, first index winning ties
///
/// **Panics** if the slice is empty
pub fn argmax(values: &[f32]) -> usize {
    assert!(!values.is_empty());
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_functional() {
        assert_eq!(argmax(&[1.0, 5.0, 2.0]), 1);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
    }

    #[test]
    fn argmax_first_index_tie_break() {
        assert_eq!(argmax(&[0.5, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
    }
}
