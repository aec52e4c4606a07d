//! Ready-made systems of equations.
use crate::error::{DerivationError, DerivationResult};
use crate::pde::{Pde, PdeEquation};
use crate::registry::FormId;
use crate::session::Session;
use crate::sign::Sign;
use crate::space::Orientation;

/// The canonical port-Hamiltonian system `∂t a = d b`, `∂t b = -δ a` on a new
/// `n`-dimensional mesh, with `a` an outer `p`-form and `b` an outer `(p-1)`-form.
///
/// Returns the PDE, whose unknowns are `[a, b]`, together with `a` and `b`.
pub fn pde_canonical_ph(session: &mut Session, n: usize, p: usize) -> DerivationResult<(Pde, [FormId; 2])> {
    if p == 0 || p > n {
        return Err(DerivationError::StructuralMismatch(format!(
            "the canonical port-Hamiltonian system needs 1 <= p <= n, got n = {} and p = {}",
            n, p
        )));
    }
    let manifold = session.new_manifold(n)?;
    let mesh = session.new_mesh(manifold)?;
    let space_a = session.new_space(mesh, p, Orientation::Outer)?;
    let space_b = session.new_space(mesh, p - 1, Orientation::Outer)?;
    let a = session.make_form(space_a, &format!(r"\alpha^{{{}}}", p), &format!("a{}", p))?;
    let b = session.make_form(space_b, &format!(r"\beta^{{{}}}", p - 1), &format!("b{}", p - 1))?;

    let da_dt = session.time_derivative(a)?;
    let db_dt = session.time_derivative(b)?;
    let db = session.d(b)?;
    let delta_a = session.codifferential(a)?;
    let equations = vec![
        PdeEquation::new(vec![(Sign::Plus, da_dt)], vec![(Sign::Plus, db)]),
        PdeEquation::new(vec![(Sign::Plus, db_dt)], vec![(Sign::Minus, delta_a)]),
    ];
    let pde = Pde::new(session, equations)?.with_unknowns(session, &[a, b])?;
    Ok((pde, [a, b]))
}
