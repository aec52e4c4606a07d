/// Asserts that an expression evaluates to `Err` whose error matches the given pattern.
///
/// Prints the unexpected value on failure.
#[macro_export]
macro_rules! assert_err_matches {
    ($e:expr, $pattern:pat) => {{
        let expr_string = std::stringify!($e);
        match $e {
            Err($pattern) => {}
            Err(other) => panic!(
                "assert_err_matches!({}) failed: unexpected error {:?}",
                expr_string, other
            ),
            Ok(_) => panic!("assert_err_matches!({}) failed: expected an error", expr_string),
        }
    }};
}

/// Asserts that evaluating an expression panics.
///
/// The expression may borrow non-unwind-safe state such as a session.
#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        let expr_string = std::stringify!($e);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $e));
        if result.is_ok() {
            panic!("assert_panics!({}) failed: expected a panic", expr_string);
        }
    }};
}

/// Collects the items of an iterator of string-like values into owned strings.
///
/// Convenient for comparing label lists in tests.
pub fn owned_strings<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect()
}
