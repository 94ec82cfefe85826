pub const EPSILON5: f64 = 0.00001;
pub const EPSILON7: f64 = 0.0000001;
pub const EPSILON10: f64 = 0.0000000001;
pub const EPSILON15: f64 = 0.000000000000001;

pub fn equals_epsilon(
    left: f64,
    right: f64,
    relative_epsilon: Option<f64>,
    absolute_epsilon: Option<f64>,
) -> bool {
    let relative_epsilon = relative_epsilon.unwrap_or(0.0);
    let absolute_epsilon = absolute_epsilon.unwrap_or(relative_epsilon);
    let diff = (left - right).abs();
    diff <= absolute_epsilon || diff <= relative_epsilon * left.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_epsilon_falls_back_to_relative() {
        assert!(equals_epsilon(1.0, 1.0 + EPSILON7, Some(EPSILON5), None));
        assert!(!equals_epsilon(1.0, 1.1, Some(EPSILON5), None));
    }

    #[test]
    fn relative_epsilon_scales_with_magnitude() {
        assert!(equals_epsilon(4.0e7, 4.0e7 + 1.0, Some(EPSILON7), Some(0.0)));
        assert!(!equals_epsilon(1.0, 2.0, Some(EPSILON7), Some(0.0)));
    }
}
