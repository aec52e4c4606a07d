use insta::assert_snapshot;
use util::assert_err_matches;
use weakform::error::DerivationError;
use weakform::form::FormExpr;
use weakform::ode::{Stage, TermClass};
use weakform::registry::FormId;
use weakform::samples::pde_canonical_ph;
use weakform::term::SimplePattern;
use weakform::{Session, Sign, WeakFormulation};

/// The canonical port-Hamiltonian system in 3D, tested with `v` and `u`.
fn canonical_wf() -> (Session, WeakFormulation, [FormId; 2], [FormId; 2]) {
    let mut session = Session::new();
    let (pde, [a, b]) = pde_canonical_ph(&mut session, 3, 3).unwrap();
    let spaces = [session.form(a).space(), session.form(b).space()];
    let wf = pde
        .test_with(&mut session, &spaces, &[("v^3", "v3"), ("u^2", "u2")])
        .unwrap();
    let tests = [wf.test_forms()[0], wf.test_forms()[1]];
    (session, wf, [a, b], tests)
}

#[test]
fn ode_of_a_weak_formulation_equation() {
    let (mut session, wf, [a, b], [v, u]) = canonical_wf();
    let ode = wf.ode(&session, 0).unwrap();
    assert_eq!(ode.about(), a);
    assert_eq!(ode.overall_order(), 1);
    assert_eq!(ode.test_form(), v);
    assert_eq!(ode.len(), 2);
    assert_eq!(ode.left().len(), 1);
    assert_eq!(
        ode.get("0").unwrap().class,
        TermClass::TimeDerivative {
            order: 1,
            pattern: SimplePattern::TimeDerivative
        }
    );
    assert!(!ode.get("1").unwrap().is_time_derivative());
    assert_eq!(ode.get("1").unwrap().sign, Sign::Plus);
    assert_err_matches!(ode.get("2"), DerivationError::Indexing { .. });
    assert_err_matches!(ode.get("first"), DerivationError::Indexing { .. });

    let elementary: Vec<_> = ode.elementary_forms().iter().copied().collect();
    assert_eq!(elementary, vec![a, b, v]);
    let constant = ode.with_constant_elementary_forms(&session, &[b]).unwrap();
    assert!(constant.constant_elementary_forms().contains(&b));
    assert!(ode.constant_elementary_forms().is_empty());
    assert_err_matches!(
        ode.with_constant_elementary_forms(&session, &[u]),
        DerivationError::StructuralMismatch(_)
    );

    // The second equation is tested with u and is about b
    let ibp = wf.integration_by_parts(&mut session, "1-1").unwrap();
    let ode = ibp.ode(&session, 1).unwrap();
    assert_eq!(ode.about(), b);
    assert_eq!(ode.test_form(), u);
    assert_eq!(ode.len(), 3);
    assert_err_matches!(wf.ode(&session, 2), DerivationError::Indexing { .. });
}

#[test]
fn an_ode_needs_exactly_one_differentiated_form() {
    let (mut session, wf, [a, b], [v, _]) = canonical_wf();
    let db = session.d(b).unwrap();
    let static_wf = WeakFormulation::from_terms_and_signs(
        &session,
        vec![(vec![session.inner(a, v).unwrap()], vec![session.inner(db, v).unwrap()])],
        vec![(vec![Sign::Plus], vec![Sign::Plus])],
        vec![v],
    )
    .unwrap();
    let err = static_wf.ode(&session, 0).unwrap_err();
    assert_snapshot!(err, @"Pattern mismatch: not a valid ODE: no term is a time derivative");

    let space = session.form(a).space();
    let c = session.make_form(space, "c", "c").unwrap();
    let dc_dt = session.time_derivative(c).unwrap();
    let mut equation = wf.equations()[0].clone();
    equation.right.push(weakform::term::SignedTerm::new(Sign::Plus, session.inner(dc_dt, v).unwrap()));
    let two_forms = WeakFormulation::new(&session, vec![equation], vec![v]).unwrap();
    assert_err_matches!(two_forms.ode(&session, 0), DerivationError::PatternMismatch(_));
}

#[test]
fn discretization_stages() {
    let (mut session, wf, _, _) = canonical_wf();
    let ode = wf.ode(&session, 0).unwrap();
    let mut td = ode.discretize();
    assert_eq!(td.stage(), Stage::Uninitialized);
    assert_err_matches!(
        td.define_abstract_time_instants(&mut session, &["k"]),
        DerivationError::InvalidState(_)
    );

    let ts = td.new_time_sequence(&mut session).unwrap();
    assert_eq!(td.time_sequence(), Some(ts));
    assert_eq!(td.stage(), Stage::TimeSequenceSet);
    assert_err_matches!(
        td.differentiate(&mut session, "0", "k-1", "k"),
        DerivationError::InvalidState(_)
    );

    td.define_abstract_time_instants(&mut session, &["k-1", "k"]).unwrap();
    assert_eq!(td.stage(), Stage::InstantsDeclared);
    // Setting the same sequence again keeps the instants
    td.set_time_sequence(ts).unwrap();
    assert_eq!(td.stage(), Stage::InstantsDeclared);

    td.differentiate(&mut session, "0", "k-1", "k").unwrap();
    assert_eq!(td.stage(), Stage::Modified);
    assert_err_matches!(td.set_time_sequence(ts), DerivationError::InvalidState(_));
}

#[test]
fn differencing_and_averaging() {
    let (mut session, wf, [a, b], [v, _]) = canonical_wf();
    let ode = wf.ode(&session, 0).unwrap();
    let mut td = ode.discretize();
    let ts = td.new_time_sequence(&mut session).unwrap();
    td.define_abstract_time_instants(&mut session, &["k-1", "k"]).unwrap();

    assert_err_matches!(
        td.differentiate(&mut session, "1", "k-1", "k"),
        DerivationError::PatternMismatch(_)
    );
    assert_err_matches!(
        td.differentiate(&mut session, "0", "k-1", "k+1"),
        DerivationError::InvalidState(_)
    );
    td.differentiate(&mut session, "0", "k-1", "k").unwrap();

    let k1 = session.time_instant(ts, "k-1").unwrap();
    let k = session.time_instant(ts, "k").unwrap();
    let a_k1 = session.evaluate_at(a, k1).unwrap();
    let a_k = session.evaluate_at(a, k).unwrap();
    let dt = session.time_interval_between(k1, k).unwrap();
    let difference = session.form_sub(a_k, a_k1).unwrap();
    let quotient = session.form_divide(difference, dt).unwrap();
    let differenced = td.get("0").unwrap();
    assert_eq!(differenced.sign, Sign::Plus);
    assert_eq!(differenced.term.f1(), quotient);
    assert_eq!(differenced.term.f2(), v);
    // The differenced term is no longer a time derivative
    assert_err_matches!(
        td.differentiate(&mut session, "0", "k-1", "k"),
        DerivationError::PatternMismatch(_)
    );

    assert_err_matches!(td.average(&mut session, "1", b, &[]), DerivationError::StructuralMismatch(_));
    assert_err_matches!(
        td.average(&mut session, "1", a, &["k-1", "k"]),
        DerivationError::PatternMismatch(_)
    );
    td.average(&mut session, "1", b, &["k-1", "k"]).unwrap();
    let b_k1 = session.evaluate_at(b, k1).unwrap();
    let b_k = session.evaluate_at(b, k).unwrap();
    let sum = session.form_add(b_k1, b_k).unwrap();
    let mean = session.form_divide(sum, 2.0).unwrap();
    let averaged = td.get("1").unwrap();
    assert_eq!(session.form(averaged.term.f1()).expr(), &FormExpr::ExteriorDerivative(mean));
    assert_eq!(averaged.sign, Sign::Plus);

    let discrete = td.finish(&session).unwrap();
    assert_eq!(discrete.num_equations(), 1);
    assert_eq!(discrete.test_forms(), &[v]);
    assert_eq!(discrete.unknowns(), Some(&[a_k][..]));
    assert_eq!(discrete.get("0-0").unwrap(), &differenced);
    assert_eq!(discrete.get("0-1").unwrap(), &averaged);
}

#[test]
fn averaging_at_a_single_instant_evaluates() {
    let (mut session, wf, [_, b], _) = canonical_wf();
    let ode = wf.ode(&session, 0).unwrap();
    let mut td = ode.discretize();
    let ts = td.new_time_sequence(&mut session).unwrap();
    // Instants are declared on demand
    td.average(&mut session, "1", b, &["k-1/2"]).unwrap();
    assert_eq!(td.stage(), Stage::Modified);
    let half = session.time_instant(ts, "k-1/2").unwrap();
    let b_half = session.evaluate_at(b, half).unwrap();
    assert_eq!(session.form(td.get("1").unwrap().term.f1()).expr(), &FormExpr::ExteriorDerivative(b_half));

    // Nothing was differentiated, so there are no unknowns
    let discrete = td.finish(&session).unwrap();
    assert_eq!(discrete.unknowns(), None);
    assert_eq!(discrete.get("0-0").unwrap(), &td.get("0").unwrap());
}
