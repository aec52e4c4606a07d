use crate::sign::Sign;
use ::proptest::prelude::*;

impl Arbitrary for Sign {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![Just(Sign::Plus), Just(Sign::Minus)].boxed()
    }
}

/// A step key `k+a/b` together with its offset `a/b` from `k`.
pub fn step_key_offset() -> impl Strategy<Value = (String, f64)> {
    (-20i32..=20, 1i32..=6).prop_map(|(a, b)| {
        let key = if a < 0 {
            format!("k-{}/{}", -a, b)
        } else {
            format!("k+{}/{}", a, b)
        };
        (key, a as f64 / b as f64)
    })
}

/// A valid pair of (symbolic, linguistic) labels for a root entity.
pub fn root_labels() -> impl Strategy<Value = (String, String)> {
    "[a-z][a-z0-9]{0,8}".prop_map(|lin| (format!("x_{{{}}}", lin), lin))
}

/// Distinct valid label pairs.
pub fn distinct_root_labels(max_len: usize) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_set("[a-z][a-z0-9]{0,8}", 1..=max_len.max(1)).prop_map(|lins| {
        lins.into_iter()
            .map(|lin| (format!("x_{{{}}}", lin), lin))
            .collect()
    })
}
