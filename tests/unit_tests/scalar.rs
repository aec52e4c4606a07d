use insta::assert_snapshot;
use util::assert_err_matches;
use weakform::error::DerivationError;
use weakform::Session;

#[test]
fn constant_numbers_are_real_root_scalars() {
    let mut session = Session::new();
    let half = session.constant_number(0.5).unwrap();
    assert_eq!(session.constant_number(0.5).unwrap(), half);

    let s = session.scalar(half);
    assert!(s.is_root());
    assert!(s.is_real());
    assert_eq!(s.value(), Some(0.5));
    assert_eq!(s.pure_lin(), Some("0.5"));
    assert_snapshot!(s.sym(), @r"\dfrac{1}{2}");
    assert_snapshot!(s.lin(), @r"\textsc{0.5}");

    let one = session.unit_scalar();
    assert_eq!(one, session.constant_number(1.0).unwrap());
    assert_eq!(session.scalar(one).sym(), "1");
}

#[test]
fn non_finite_constants_are_unsupported() {
    let mut session = Session::new();
    assert_err_matches!(session.constant_number(f64::NAN), DerivationError::Unsupported(_));
    assert_err_matches!(session.constant_number(f64::INFINITY), DerivationError::Unsupported(_));
}

#[test]
fn arithmetic_on_real_scalars_folds() {
    let mut session = Session::new();
    let sum = session.scalar_add(0.5, 0.25).unwrap();
    assert_eq!(session.scalar(sum).value(), Some(0.75));
    assert!(session.scalar(sum).is_root());

    let quotient = session.scalar_div(1.0, 4.0).unwrap();
    assert_eq!(session.scalar(quotient).value(), Some(0.25));
    assert_eq!(quotient, session.constant_number(0.25).unwrap());

    assert_err_matches!(session.scalar_div(1.0, 0.0), DerivationError::Unsupported(_));
}

#[test]
fn arithmetic_with_abstract_scalars_is_symbolic() {
    let mut session = Session::new();
    let dt = session.abstract_scalar(r"\Delta t", "dt").unwrap();
    let inverse = session.scalar_div(1.0, dt).unwrap();
    assert_eq!(session.scalar_div(1.0, dt).unwrap(), inverse);

    let s = session.scalar(inverse);
    assert!(!s.is_root());
    assert!(!s.is_real());
    assert_eq!(s.pure_lin(), None);
    assert_snapshot!(s.sym(), @r"\dfrac{1}{\Delta t}");
    assert_snapshot!(s.lin(), @r"\textsc{1} \emph{divided by} \textsc{dt}");

    let shifted = session.scalar_add(dt, 1.0).unwrap();
    assert_eq!(session.scalar(shifted).sym(), r"\Delta t+1");
    assert!(!session.scalar(shifted).is_real());
}

#[test]
fn abstract_scalars_are_identified_by_both_labels() {
    let mut session = Session::new();
    let c = session.abstract_scalar("c", "c").unwrap();
    assert_eq!(session.abstract_scalar("c", "c").unwrap(), c);
    assert_err_matches!(
        session.abstract_scalar("c", "other"),
        DerivationError::IdentityConflict { .. }
    );
    assert_err_matches!(
        session.abstract_scalar("other", "c"),
        DerivationError::IdentityConflict { .. }
    );
    assert_eq!(session.registry().num_scalars(), 1);
}

#[test]
fn numeric_labels_are_reserved_for_real_scalars() {
    let mut session = Session::new();
    assert_err_matches!(
        session.abstract_scalar("1", "one"),
        DerivationError::InvalidRepresentation(_)
    );
    assert_err_matches!(
        session.abstract_scalar("c", "0.5"),
        DerivationError::InvalidRepresentation(_)
    );
    assert_err_matches!(
        session.abstract_scalar(r"\dfrac{1}{2}", "half"),
        DerivationError::InvalidRepresentation(_)
    );
    assert_eq!(session.registry().num_scalars(), 0);

    let one = session.unit_scalar();
    assert_eq!(session.scalar(one).value(), Some(1.0));
    let half = session.constant_number(0.5).unwrap();
    assert_eq!(session.scalar(half).sym(), r"\dfrac{1}{2}");
    assert!(session.abstract_scalar("inf", "infinity").is_ok());
}
