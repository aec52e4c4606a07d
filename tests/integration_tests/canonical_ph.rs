use eyre::Result;
use weakform::array::{AbstractArray, ArrayKind};
use weakform::registry::{ArrayId, FormId, ScalarId};
use weakform::samples::pde_canonical_ph;
use weakform::scalar::ScalarOperand;
use weakform::wf::derive::Slot;
use weakform::wf::mp::{AssemblyStatus, BlockCell, MatrixProxy, Target};
use weakform::{Session, Sign, WeakFormulation};

/// The canonical port-Hamiltonian system in 3D after a midpoint-type time discretization,
/// rearranged so that the unknowns at instant `k` are on the left.
struct Discretized {
    session: Session,
    wf: WeakFormulation,
    /// `a` and `b` at the instants `k` and `k-1`.
    current: [FormId; 2],
    previous: [FormId; 2],
    /// `a` at `k-1/2`.
    a_half: FormId,
    inv_dt: ScalarId,
}

fn discretize() -> Result<Discretized> {
    let mut session = Session::new();
    let (pde, [a, b]) = pde_canonical_ph(&mut session, 3, 3)?;
    let spaces = [session.form(a).space(), session.form(b).space()];
    let wf = pde
        .test_with(&mut session, &spaces, &[("v^3", "v3"), ("u^2", "u2")])?
        .integration_by_parts(&mut session, "1-1")?;

    let mut td = wf.td();
    let ts = td.new_time_sequence(&mut session)?;
    td.define_abstract_time_instants(&mut session, &["k-1", "k-1/2", "k"])?;
    td.differentiate(&mut session, "0-0", "k-1", "k")?;
    td.average(&mut session, "0-1", b, &["k-1", "k"])?;
    td.differentiate(&mut session, "1-0", "k-1", "k")?;
    td.average(&mut session, "1-1", a, &["k-1", "k"])?;
    td.average(&mut session, "1-2", a, &["k-1/2"])?;
    let wf = td.finish(&session)?;

    let [k1, half, k] = ["k-1", "k-1/2", "k"].map(|key| session.time_instant(ts, key));
    let (k1, half, k) = (k1?, half?, k?);
    let a_k = session.evaluate_at(a, k)?;
    let b_k = session.evaluate_at(b, k)?;
    let a_k1 = session.evaluate_at(a, k1)?;
    let b_k1 = session.evaluate_at(b, k1)?;
    let a_half = session.evaluate_at(a, half)?;
    assert_eq!(wf.unknowns(), Some(&[a_k, b_k][..]));

    let dt = session.time_interval(ts, "k-1", "k")?;
    let dt = session.interval_scalar(dt);
    let inv_dt = session.scalar_div(1.0, dt)?;
    let inverse = [ScalarOperand::from(inv_dt); 2];
    let halves = [ScalarOperand::from(0.5); 2];
    let db_k1 = session.d(b_k1)?;
    let db_k = session.d(b_k)?;

    let wf = wf
        .split(&mut session, "0-0", Slot::F0, &[a_k, a_k1], &[Sign::Plus, Sign::Minus], Some(&inverse[..]))?
        .split(&mut session, "0-2", Slot::F0, &[db_k1, db_k], &[Sign::Plus, Sign::Plus], Some(&halves[..]))?
        .split(&mut session, "1-0", Slot::F0, &[b_k, b_k1], &[Sign::Plus, Sign::Minus], Some(&inverse[..]))?
        .split(&mut session, "1-2", Slot::F0, &[a_k1, a_k], &[Sign::Plus, Sign::Plus], Some(&halves[..]))?
        .rearrange(&[(0, "0, 3 = 2, 1"), (1, "3, 0 = 2, 1, 4")])?;

    Ok(Discretized {
        session,
        wf,
        current: [a_k, b_k],
        previous: [a_k1, b_k1],
        a_half,
        inv_dt,
    })
}

/// Kinds of the arrays of a single-term cell, with its factor and sign.
fn single_term(session: &Session, cell: &BlockCell) -> (Vec<(ArrayKind, bool)>, ScalarId, Sign) {
    assert_eq!(cell.len(), 1);
    let (sign, term) = cell.iter().next().unwrap();
    let kinds = term
        .chain()
        .iter()
        .map(|link| (session.array(link.component()).kind(), link.is_transposed()))
        .collect();
    (kinds, term.factor(), sign)
}

fn vector_of(session: &Session, term: &AbstractArray) -> ArrayId {
    assert_eq!(term.chain().len(), 1);
    let link = &term.chain()[0];
    assert!(!link.is_transposed());
    assert!(matches!(session.array(link.component()).kind(), ArrayKind::Vector { .. }));
    link.component()
}

#[test]
fn discretized_equations_are_rearranged() -> Result<()> {
    let Discretized {
        mut session,
        wf,
        current: [a_k, b_k],
        previous: [a_k1, b_k1],
        inv_dt,
        ..
    } = discretize()?;
    let (v, u) = (wf.test_forms()[0], wf.test_forms()[1]);
    let first = &wf.equations()[0];
    assert_eq!(first.left.len(), 2);
    assert_eq!(first.right.len(), 2);
    let second = &wf.equations()[1];
    assert_eq!(second.left.len(), 2);
    assert_eq!(second.right.len(), 3);

    let signs = |terms: &[weakform::term::SignedTerm]| terms.iter().map(|t| t.sign).collect::<Vec<_>>();
    assert_eq!(signs(&first.left), vec![Sign::Plus, Sign::Minus]);
    assert_eq!(signs(&first.right), vec![Sign::Plus, Sign::Plus]);
    assert_eq!(signs(&second.left), vec![Sign::Plus, Sign::Plus]);
    assert_eq!(signs(&second.right), vec![Sign::Minus, Sign::Plus, Sign::Plus]);

    let scaled = session.form_scale(inv_dt, a_k)?;
    assert_eq!(first.left[0].term, session.inner(scaled, v)?);
    assert_eq!(second.left[1].term.f2(), u);
    assert_eq!(
        session.elementary_forms(first.right[1].term.f1()).into_iter().collect::<Vec<_>>(),
        vec![a_k1]
    );
    assert!(session.form_contains(second.right[1].term.f1(), b_k1));
    assert!(session.form_contains(first.left[1].term.f1(), b_k));
    Ok(())
}

#[test]
fn matrix_proxy_of_the_discretized_system() -> Result<()> {
    let Discretized {
        mut session,
        wf,
        current: [a_k, b_k],
        previous: [a_k1, b_k1],
        a_half,
        inv_dt,
    } = discretize()?;
    let (v, u) = (wf.test_forms()[0], wf.test_forms()[1]);
    let (space_a, space_b) = (session.form(a_k).space(), session.form(b_k).space());
    session.finite(3)?;
    let mp = wf.mp(&mut session)?;
    let half = session.constant_number(0.5)?;

    let mass_a = ArrayKind::MassMatrix { space: space_a };
    let mass_b = ArrayKind::MassMatrix { space: space_b };
    let d = ArrayKind::IncidenceMatrix { space: space_b };
    assert_eq!(mp.test_vectors(), &[session.form_vector(v)?, session.form_vector(u)?]);
    assert_eq!(mp.unknowns(), &[session.form_vector(a_k)?, session.form_vector(b_k)?]);
    assert_eq!(mp.status(), AssemblyStatus::PartiallyAssembled);
    assert_eq!(mp.left_sections().len(), 1);
    assert!(mp.left_remainder().is_empty());
    assert!(mp.right_sections().is_empty());
    assert_eq!(mp.num_blocks(), 2);

    assert_eq!(single_term(&session, mp.get("0-0,0")?), (vec![(mass_a, false)], inv_dt, Sign::Plus));
    assert_eq!(
        single_term(&session, mp.get("0-0,1")?),
        (vec![(mass_a, false), (d, false)], half, Sign::Minus)
    );
    assert_eq!(
        single_term(&session, mp.get("0-1,0")?),
        (vec![(d, true), (mass_a, false)], half, Sign::Plus)
    );
    assert_eq!(single_term(&session, mp.get("0-1,1")?), (vec![(mass_b, false)], inv_dt, Sign::Plus));
    assert_eq!(mp.get("1-0")?.len(), 2);
    assert_eq!(mp.get("1-1")?.len(), 3);

    let previous = [Target::Form(a_k1), Target::Form(b_k1)];
    let parsed = mp.parse(&mut session, &previous)?;
    assert_eq!(parsed.status(), AssemblyStatus::PartiallyAssembled);
    assert_eq!(parsed.num_blocks(), 3);
    assert_eq!(single_term(&session, parsed.get("1-0,0")?), (vec![(mass_a, false)], inv_dt, Sign::Plus));
    assert_eq!(
        single_term(&session, parsed.get("1-0,1")?),
        (vec![(mass_a, false), (d, false)], half, Sign::Plus)
    );
    assert_eq!(
        single_term(&session, parsed.get("1-1,0")?),
        (vec![(d, true), (mass_a, false)], half, Sign::Minus)
    );
    assert_eq!(single_term(&session, parsed.get("1-1,1")?), (vec![(mass_b, false)], inv_dt, Sign::Plus));

    let a_k1_vector = vector_of(&session, &parsed.get("1-0")?.terms()[0]);
    assert_eq!(a_k1_vector, session.form_vector(a_k1)?);
    assert_eq!(parsed.get("1-0")?.signs(), &[Sign::Plus]);

    // Only the boundary term remains as known data
    assert!(parsed.get("2-0")?.is_empty());
    let (kinds, factor, sign) = single_term(&session, parsed.get("2-1")?);
    assert_eq!(kinds, vec![(ArrayKind::WedgeVector { form: a_half, test_space: space_b }, false)]);
    assert_eq!(factor, session.unit_scalar());
    assert_eq!(sign, Sign::Plus);
    assert!(parsed.get("9-0").is_err());

    let system = parsed.export(&session);
    assert_eq!(system.unknowns.len(), 4);
    assert_eq!(system.right_sections.len(), 1);
    assert_eq!(system.right_remainder[1].terms.len(), 1);
    let json = serde_json::to_string(&system)?;
    assert!(json.contains("WedgeVec:traceHodge[a3@Ts[k-1/2]]-wedge-d3"));
    Ok(())
}

#[test]
fn assembly_is_independent_of_the_route() -> Result<()> {
    let Discretized {
        mut session,
        wf,
        previous: [a_k1, b_k1],
        ..
    } = discretize()?;
    session.finite(3)?;
    let ap = wf.ap(&mut session)?;
    assert!(ap.is_linear());
    let from_ap = MatrixProxy::from_algebraic_proxy(&mut session, &ap)?;
    assert_eq!(from_ap, wf.mp(&mut session)?);

    let targets = [Target::Form(a_k1), Target::Form(b_k1)];
    let once = from_ap.parse(&mut session, &targets)?;
    let vectors: Vec<Target> = targets
        .iter()
        .map(|t| match *t {
            Target::Form(f) => session.form_vector(f).map(Target::Array),
            other => Ok(other),
        })
        .collect::<Result<_, _>>()?;
    assert_eq!(from_ap.parse(&mut session, &vectors)?, once);
    Ok(())
}
