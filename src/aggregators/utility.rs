use crate::error::StatsError;

/// Arithmetic mean; `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds half away from zero to 2 decimal digits.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pearson correlation coefficient of two equal-length sequences.
///
/// # Errors
///
/// [`StatsError::LengthMismatch`] if the lengths differ;
/// [`StatsError::DegenerateInput`] for fewer than two points or when either
/// sequence is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64, StatsError> {
    if xs.len() != ys.len() {
        return Err(StatsError::LengthMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(StatsError::DegenerateInput);
    }
    let (Some(mean_x), Some(mean_y)) = (mean(xs), mean(ys)) else {
        return Err(StatsError::DegenerateInput);
    };

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x == 0.0 || variance_y == 0.0 {
        return Err(StatsError::DegenerateInput);
    }
    Ok((covariance / (variance_x.sqrt() * variance_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(13.98333), 13.98);
        assert_eq!(round2(7.125), 7.13);
        assert_eq!(round2(-1.005), -1.0);
    }

    #[test]
    fn test_identical_sequences() {
        let xs = [120.0, 340.0, 310.0, 295.0, 330.0, 410.0, 90.0];
        let r = pearson(&xs, &xs).unwrap();
        assert!((r - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_negated_sequence() {
        let xs = [3.0, 7.0, 1.0, 9.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 10.0 - x).collect();
        let r = pearson(&xs, &ys).unwrap();
        assert!((r + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_known_value() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 1.0, 4.0, 3.0];
        let r = pearson(&xs, &ys).unwrap();
        assert!((r - 0.6).abs() < TOLERANCE);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]),
            Err(StatsError::LengthMismatch { left: 3, right: 2 })
        );
    }

    #[test]
    fn test_degenerate_input() {
        assert_eq!(
            pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]),
            Err(StatsError::DegenerateInput)
        );
        assert_eq!(pearson(&[1.0], &[2.0]), Err(StatsError::DegenerateInput));
    }
}
