use eyre::Result;
use weakform::form::FormExpr;
use weakform::ode::Stage;
use weakform::pde::Pde;
use weakform::space::Orientation;
use weakform::term::TermKind;
use weakform::{Session, Sign};

/// Incompressible Navier-Stokes in rotational form, without the nonlinear term:
/// `∂t u - δP = f` and `d u = 0` for a 2-form velocity `u` and a 3-form pressure `P`.
#[test]
fn momentum_equation_as_an_ode() -> Result<()> {
    let mut session = Session::new();
    let manifold = session.new_manifold(3)?;
    let mesh = session.new_mesh(manifold)?;
    let o2 = session.new_space(mesh, 2, Orientation::Outer)?;
    let o3 = session.new_space(mesh, 3, Orientation::Outer)?;
    let u = session.make_form(o2, "u", "u")?;
    let f = session.make_form(o2, "f", "f")?;
    let p = session.make_form(o3, "P", "P")?;

    let du_dt = session.time_derivative(u)?;
    let ds_p = session.codifferential(p)?;
    let du = session.d(u)?;
    let table = [("du_dt", du_dt), ("dsP", ds_p), ("f", f), ("du", du)];
    let pde = Pde::from_expression(&session, &["du_dt - dsP = f", "du = 0"], &table)?.with_unknowns(&session, &[u, p])?;
    assert_eq!(pde.mesh(), mesh);
    assert_eq!(pde.equations()[1].right.len(), 0);

    let wf = pde
        .test_with(&mut session, &[o2, o3], &[("v^2", "v2"), ("q^3", "q3")])?
        .integration_by_parts(&mut session, "0-1")?
        .rearrange(&[(0, "0, 1 = 3, 2")])?;
    let v = wf.test_forms()[0];
    let ode = wf.ode(&session, 0)?;
    assert_eq!(ode.about(), u);
    assert_eq!(ode.overall_order(), 1);
    assert_eq!(ode.test_form(), v);
    assert_eq!(ode.len(), 4);

    let signs: Vec<Sign> = (0..4)
        .map(|j| ode.get(&j.to_string()).map(|t| t.sign))
        .collect::<Result<_, _>>()?;
    assert_eq!(signs, vec![Sign::Plus, Sign::Minus, Sign::Plus, Sign::Minus]);
    assert!(ode.get("0")?.is_time_derivative());
    let pressure = &ode.get("1")?.term;
    assert_eq!(pressure.f1(), p);
    assert_eq!(session.form(pressure.f2()).expr(), &FormExpr::ExteriorDerivative(v));
    assert_eq!(ode.get("3")?.term.kind(), TermKind::DualityPairing);

    let mut td = ode.discretize();
    let ts = td.new_time_sequence(&mut session)?;
    td.define_abstract_time_instants(&mut session, &["k-1", "k-1/2", "k"])?;
    td.differentiate(&mut session, "0", "k-1", "k")?;
    td.average(&mut session, "2", f, &["k-1", "k"])?;
    td.average(&mut session, "1", p, &["k-1/2"])?;
    td.average(&mut session, "3", p, &["k-1/2"])?;
    assert_eq!(td.stage(), Stage::Modified);

    let k = session.time_instant(ts, "k")?;
    let half = session.time_instant(ts, "k-1/2")?;
    let u_k = session.evaluate_at(u, k)?;
    let p_half = session.evaluate_at(p, half)?;
    assert_eq!(td.get("1")?.term.f1(), p_half);
    assert_eq!(td.get("1")?.sign, Sign::Minus);
    assert!(session.form_contains(td.get("3")?.term.f1(), p_half));
    assert!(!session.form_contains(td.get("3")?.term.f1(), p));
    assert_eq!(session.elementary_forms(td.get("2")?.term.f1()).len(), 2);

    let discrete = td.finish(&session)?;
    assert_eq!(discrete.num_equations(), 1);
    assert_eq!(discrete.unknowns(), Some(&[u_k][..]));
    assert_eq!(discrete.test_forms(), &[v]);
    assert_eq!(discrete.equations()[0].left.len(), 2);
    assert_eq!(discrete.equations()[0].right.len(), 2);
    Ok(())
}
