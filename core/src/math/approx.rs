//! Approximate floating-point comparison for tests.

/// Asserts that two `f32` expressions are equal within `eps`
/// (default `1e-5`).
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, eps = 1e-5)
    };
    ($a:expr, $b:expr, eps = $eps:expr) => {{
        let (a, b) = ($a, $b);
        assert!(
            (a - b).abs() <= $eps,
            "approx assertion failed: `{:?} != {:?}` (eps = {:?})",
            a,
            b,
            $eps,
        );
    }};
}
