pub mod time;

/// Round a seconds value to microsecond precision, the resolution every
/// latency and timestamp in the log carries.
pub fn round_micros(seconds: f64) -> f64 {
    (seconds * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::round_micros;

    #[test]
    fn round_micros_keeps_six_decimals() {
        assert_eq!(round_micros(0.123_456_789), 0.123_457);
        assert_eq!(round_micros(3.0), 3.0);
        assert_eq!(round_micros(0.0000004), 0.0);
    }
}
