use crate::outer_spaces_3d;
use insta::assert_snapshot;
use util::assert_err_matches;
use weakform::error::DerivationError;
use weakform::form::FormExpr;
use weakform::space::Orientation;

#[test]
fn derived_forms_are_interned() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], r"\alpha", "a").unwrap();
    let b = session.make_form(spaces[1], r"\beta", "b").unwrap();
    let da = session.d(a).unwrap();
    assert_eq!(session.d(a).unwrap(), da);
    assert_eq!(session.form(da).space(), spaces[2]);
    assert_eq!(session.form(da).expr(), &FormExpr::ExteriorDerivative(a));
    assert!(!session.form(da).is_root());
    assert_eq!(session.form(da).pure_lin(), None);

    let sum = session.form_add(a, b).unwrap();
    assert_eq!(session.form_add(a, b).unwrap(), sum);
    assert_ne!(session.form_add(b, a).unwrap(), sum);
    assert_eq!(session.form(sum).orientation(), Orientation::Outer);
}

#[test]
fn labels_of_derived_forms() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], r"\alpha", "a").unwrap();
    let b = session.make_form(spaces[1], r"\beta", "b").unwrap();
    let c = session.make_form(spaces[1], r"\gamma", "c").unwrap();
    assert_snapshot!(session.form(a).lin(), @r"\textsf{a}");

    let da = session.d(a).unwrap();
    assert_snapshot!(session.form(da).sym(), @r"\mathrm{d}\alpha");
    assert_snapshot!(session.form(da).lin(), @r"$\mathrm{d}$ \textsf{a}");

    let sum = session.form_add(b, c).unwrap();
    let difference = session.form_sub(a, sum).unwrap();
    assert_snapshot!(session.form(difference).sym(), @r"\alpha-\left(\beta+\gamma\right)");
    let d_sum = session.d(sum).unwrap();
    assert_snapshot!(session.form(d_sum).sym(), @r"\mathrm{d}\left(\beta+\gamma\right)");

    let half = session.form_scale(0.5, a).unwrap();
    assert_snapshot!(session.form(half).sym(), @r"\dfrac{1}{2}\alpha");
    let third = session.form_divide(a, 3.0).unwrap();
    assert_snapshot!(session.form(third).sym(), @r"\dfrac{\alpha}{3}");
}

#[test]
fn operands_must_share_a_space() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], "a", "a").unwrap();
    let b = session.make_form(spaces[2], "b", "b").unwrap();
    assert_err_matches!(session.form_add(a, b), DerivationError::StructuralMismatch(_));
    assert_err_matches!(session.form_sub(a, b), DerivationError::StructuralMismatch(_));
    assert_err_matches!(session.replace(a, a, b), DerivationError::StructuralMismatch(_));
}

#[test]
fn operator_domains() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let f0 = session.make_form(spaces[0], "f0", "f0").unwrap();
    let f1 = session.make_form(spaces[1], "f1", "f1").unwrap();
    let f2 = session.make_form(spaces[2], "f2", "f2").unwrap();
    let f3 = session.make_form(spaces[3], "f3", "f3").unwrap();
    assert_err_matches!(session.d(f3), DerivationError::Unsupported(_));
    assert_err_matches!(session.codifferential(f0), DerivationError::Unsupported(_));
    assert_err_matches!(session.wedge(f2, f2), DerivationError::Unsupported(_));

    let wedge = session.wedge(f1, f2).unwrap();
    assert_eq!(session.form(wedge).space(), spaces[3]);
    let hodge = session.hodge(f1).unwrap();
    assert_eq!(session.space(session.form(hodge).space()).k(), 2);
    assert_eq!(session.form(hodge).orientation(), Orientation::Inner);
    let dt = session.time_derivative(f1).unwrap();
    assert_eq!(session.form(dt).space(), spaces[1]);
    let trace = session.trace(f2).unwrap();
    let boundary = session.form(trace).space();
    assert_eq!(session.mesh(session.space(boundary).mesh()).ndim(), 2);
}

#[test]
fn scaling_and_division() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], "a", "a").unwrap();
    assert_eq!(session.form_scale(1.0, a).unwrap(), a);
    let one = session.unit_scalar();
    assert_eq!(session.form_scale(one, a).unwrap(), a);
    assert_err_matches!(session.form_divide(a, 0.0), DerivationError::Unsupported(_));

    let dt = session.abstract_scalar(r"\Delta t", "dt").unwrap();
    let quotient = session.form_divide(a, dt).unwrap();
    assert_eq!(session.form(quotient).expr(), &FormExpr::Quotient(a, dt));
    let scaled = session.form_scale(dt, a).unwrap();
    assert_eq!(session.form(scaled).expr(), &FormExpr::Scaled(dt, a));
}

#[test]
fn evaluation_at_time_instants() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], r"\alpha", "a").unwrap();
    let ts = session.new_time_sequence().unwrap();
    let k = session.time_instant(ts, "k").unwrap();
    let k1 = session.time_instant(ts, "k-1").unwrap();

    let a_k = session.evaluate_at(a, k).unwrap();
    assert_eq!(session.evaluate_at(a, k).unwrap(), a_k);
    assert_ne!(session.evaluate_at(a, k1).unwrap(), a_k);

    let form = session.form(a_k);
    assert!(form.is_root());
    assert_eq!(form.space(), spaces[1]);
    assert_eq!(form.pure_lin(), Some("a@Ts[k]"));
    assert_snapshot!(form.sym(), @r"\left.\alpha\right|^{(k)}");
    let binding = form.time_binding().unwrap();
    assert_eq!(binding.base_form, a);
    assert_eq!(binding.instant, k);
    assert_eq!(binding.sequence, ts);
    assert_eq!(session.registry().find_root_form("a@Ts[k]"), Some(a_k));

    assert_err_matches!(session.evaluate_at(a_k, k1), DerivationError::Unsupported(_));
    let da = session.d(a).unwrap();
    assert_err_matches!(session.evaluate_at(da, k), DerivationError::Unsupported(_));
}

#[test]
fn replacement_rebuilds_interned_forms() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], "a", "a").unwrap();
    let b = session.make_form(spaces[1], "b", "b").unwrap();
    let c = session.make_form(spaces[1], "c", "c").unwrap();
    let sum = session.form_add(a, b).unwrap();
    let half = session.form_scale(0.5, sum).unwrap();
    let f = session.d(half).unwrap();

    let replaced = session.replace(f, a, c).unwrap();
    let expected = {
        let sum = session.form_add(c, b).unwrap();
        let half = session.form_scale(0.5, sum).unwrap();
        session.d(half).unwrap()
    };
    assert_eq!(replaced, expected);

    // Nothing to replace
    let d_b = session.d(b).unwrap();
    assert_eq!(session.replace(d_b, a, c).unwrap(), d_b);
    // Replace the whole form
    assert_eq!(session.replace(a, a, c).unwrap(), c);
}

#[test]
fn elementary_forms_and_containment() {
    let (mut session, _, spaces) = outer_spaces_3d();
    let a = session.make_form(spaces[1], "a", "a").unwrap();
    let b = session.make_form(spaces[1], "b", "b").unwrap();
    let c = session.make_form(spaces[2], "c", "c").unwrap();
    let difference = session.form_sub(a, b).unwrap();
    let d_difference = session.d(difference).unwrap();
    let f = session.wedge(a, c).unwrap();

    assert_eq!(session.elementary_forms(d_difference).into_iter().collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(session.elementary_forms(f).into_iter().collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(session.elementary_forms(a).into_iter().collect::<Vec<_>>(), vec![a]);
    assert!(session.form_contains(d_difference, b));
    assert!(session.form_contains(d_difference, difference));
    assert!(!session.form_contains(d_difference, c));
}
