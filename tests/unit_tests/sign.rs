use proptest::prelude::*;
use weakform::Sign;

#[test]
fn composition_table() {
    assert_eq!(Sign::Plus.compose(Sign::Plus), Sign::Plus);
    assert_eq!(Sign::Plus.compose(Sign::Minus), Sign::Minus);
    assert_eq!(Sign::Minus.compose(Sign::Plus), Sign::Minus);
    assert_eq!(Sign::Minus.compose(Sign::Minus), Sign::Plus);
    assert_eq!(Sign::Minus * Sign::Minus, Sign::Plus);
    assert_eq!(-Sign::Plus, Sign::Minus);
    assert_eq!(Sign::default(), Sign::Plus);
}

#[test]
fn serializes_as_symbol() {
    assert_eq!(serde_json::to_string(&Sign::Minus).unwrap(), r#""-""#);
    let signs: Vec<Sign> = serde_json::from_str(r#"["+", "-"]"#).unwrap();
    assert_eq!(signs, vec![Sign::Plus, Sign::Minus]);
}

proptest! {
    #[test]
    fn composition_is_a_group(a: Sign, b: Sign, c: Sign) {
        prop_assert_eq!(a.compose(b), b.compose(a));
        prop_assert_eq!(a.compose(b).compose(c), a.compose(b.compose(c)));
        prop_assert_eq!(a.compose(Sign::Plus), a);
        prop_assert_eq!(a.compose(a), Sign::Plus);
        prop_assert_eq!(a.flipped().flipped(), a);
        prop_assert_eq!(a.flipped(), a.compose(Sign::Minus));
    }

    #[test]
    fn display_parses_back(a: Sign) {
        prop_assert_eq!(a.to_string().parse::<Sign>().unwrap(), a);
    }
}
