use weakform::samples::pde_canonical_ph;
use weakform::scalar::ScalarOperand;
use weakform::wf::derive::Slot;
use weakform::wf::mp::Target;
use weakform::{Session, Sign};

/// Derives the block system of a midpoint-type time discretization of the canonical
/// port-Hamiltonian system `∂t a = d b`, `∂t b = -δ a` in 3D and prints it as JSON.
fn main() -> eyre::Result<()> {
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

    let k1 = session.time_instant(ts, "k-1")?;
    let k = session.time_instant(ts, "k")?;
    let [a_k1, a_k, b_k1, b_k] = [(a, k1), (a, k), (b, k1), (b, k)].map(|(f, t)| session.evaluate_at(f, t));
    let (a_k1, a_k, b_k1, b_k) = (a_k1?, a_k?, b_k1?, b_k?);
    let dt = session.time_interval_between(k1, k)?;
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
    for equation in wf.equations() {
        let side = |terms: &[weakform::term::SignedTerm]| {
            terms
                .iter()
                .map(|t| format!("{} {}", t.sign, t.term.sym()))
                .collect::<Vec<_>>()
                .join(" ")
        };
        println!("{} = {}", side(&equation.left), side(&equation.right));
    }

    session.finite(3)?;
    let mp = wf
        .mp(&mut session)?
        .parse(&mut session, &[Target::Form(a_k1), Target::Form(b_k1)])?;
    println!("Assembly status: {:?}", mp.status());
    println!("{}", serde_json::to_string_pretty(&mp.export(&session))?);
    Ok(())
}
