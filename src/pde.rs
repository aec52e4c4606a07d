//! Systems of partial differential equations in terms of forms.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{FormId, MeshId, SpaceId};
use crate::session::Session;
use crate::sign::Sign;
use crate::term::SignedTerm;
use crate::wf::{WeakFormulation, WfEquation};
use std::collections::BTreeSet;

/// One equation: signed forms on the left and on the right.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdeEquation {
    pub left: Vec<(Sign, FormId)>,
    pub right: Vec<(Sign, FormId)>,
}

impl PdeEquation {
    pub fn new(left: Vec<(Sign, FormId)>, right: Vec<(Sign, FormId)>) -> Self {
        Self { left, right }
    }

    pub fn forms(&self) -> impl Iterator<Item = FormId> + '_ {
        self.left.iter().chain(&self.right).map(|(_, f)| *f)
    }
}

/// A system of PDEs on one mesh.
///
/// All forms of an equation live in the same space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pde {
    mesh: MeshId,
    equations: Vec<PdeEquation>,
    unknowns: Option<Vec<FormId>>,
}

impl Pde {
    pub fn new(session: &Session, equations: Vec<PdeEquation>) -> DerivationResult<Self> {
        let mut mesh = None;
        for (i, equation) in equations.iter().enumerate() {
            let mut forms = equation.forms();
            let first = forms
                .next()
                .ok_or_else(|| DerivationError::StructuralMismatch(format!("equation {} has no terms", i)))?;
            let space = session.form(first).space();
            if let Some(other) = forms.find(|f| session.form(*f).space() != space) {
                return Err(DerivationError::StructuralMismatch(format!(
                    "equation {}: {} and {} are in different spaces",
                    i,
                    session.form(first).lin(),
                    session.form(other).lin()
                )));
            }
            let equation_mesh = session.space(space).mesh();
            match mesh {
                None => mesh = Some(equation_mesh),
                Some(m) if m != equation_mesh => {
                    return Err(DerivationError::StructuralMismatch(format!(
                        "equation {} lives on a different mesh than the previous equations",
                        i
                    )))
                }
                Some(_) => {}
            }
        }
        let mesh = mesh.ok_or_else(|| {
            DerivationError::StructuralMismatch("a PDE needs at least one equation".to_string())
        })?;
        Ok(Self {
            mesh,
            equations,
            unknowns: None,
        })
    }

    /// Builds a PDE from expressions such as `"du_dt - dsP = f"`, where names refer to the
    /// given forms. A side that reads `0` has no terms.
    pub fn from_expression(
        session: &Session,
        expressions: &[&str],
        forms: &[(&str, FormId)],
    ) -> DerivationResult<Self> {
        let equations = expressions
            .iter()
            .map(|expression| parse_equation(expression, forms))
            .collect::<DerivationResult<Vec<_>>>()?;
        Self::new(session, equations)
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn equations(&self) -> &[PdeEquation] {
        &self.equations
    }

    pub fn unknowns(&self) -> Option<&[FormId]> {
        self.unknowns.as_deref()
    }

    /// Sets the unknowns. Every unknown must be a root form occurring in the system.
    pub fn with_unknowns(&self, session: &Session, unknowns: &[FormId]) -> DerivationResult<Self> {
        let elementary = self.elementary_forms(session);
        if let Some(u) = unknowns.iter().find(|u| !elementary.contains(u)) {
            return Err(DerivationError::StructuralMismatch(format!(
                "{} is not an elementary form of the PDE",
                session.form(*u).lin()
            )));
        }
        Ok(Self {
            unknowns: Some(unknowns.to_vec()),
            ..self.clone()
        })
    }

    pub fn elementary_forms(&self, session: &Session) -> BTreeSet<FormId> {
        self.equations
            .iter()
            .flat_map(|equation| equation.forms())
            .flat_map(|f| session.elementary_forms(f))
            .collect()
    }

    /// Tests equation `i` with a new root form from `spaces[i]` labelled `labels[i]`
    /// (symbolic, linguistic), giving a weak formulation of L2 inner products.
    pub fn test_with(
        &self,
        session: &mut Session,
        spaces: &[SpaceId],
        labels: &[(&str, &str)],
    ) -> DerivationResult<WeakFormulation> {
        let n = self.equations.len();
        if spaces.len() != n || labels.len() != n {
            return Err(DerivationError::StructuralMismatch(format!(
                "{} equations need {} test spaces and labels, got {} spaces and {} labels",
                n,
                n,
                spaces.len(),
                labels.len()
            )));
        }
        let mut test_forms = Vec::with_capacity(n);
        let mut equations = Vec::with_capacity(n);
        for ((equation, &space), &(sym, lin)) in self.equations.iter().zip(spaces).zip(labels) {
            let v = session.make_form(space, sym, lin)?;
            let test = |side: &[(Sign, FormId)]| {
                side.iter()
                    .map(|&(sign, f)| Ok(SignedTerm::new(sign, session.inner(f, v)?)))
                    .collect::<DerivationResult<Vec<_>>>()
            };
            equations.push(WfEquation::new(test(&equation.left)?, test(&equation.right)?));
            test_forms.push(v);
        }
        let wf = WeakFormulation::new(session, equations, test_forms)?;
        match &self.unknowns {
            Some(unknowns) => wf.with_unknowns(session, unknowns),
            None => Ok(wf),
        }
    }
}

fn parse_equation(expression: &str, forms: &[(&str, FormId)]) -> DerivationResult<PdeEquation> {
    let sides: Vec<&str> = expression.split('=').collect();
    if sides.len() != 2 {
        return Err(DerivationError::InvalidRepresentation(format!(
            "expression \"{}\" must contain exactly one '='",
            expression
        )));
    }
    Ok(PdeEquation::new(
        parse_side(expression, sides[0], forms)?,
        parse_side(expression, sides[1], forms)?,
    ))
}

fn parse_side(expression: &str, side: &str, forms: &[(&str, FormId)]) -> DerivationResult<Vec<(Sign, FormId)>> {
    let side = side.trim();
    if side == "0" {
        return Ok(Vec::new());
    }
    let invalid = |reason: String| {
        DerivationError::InvalidRepresentation(format!("cannot parse expression \"{}\": {}", expression, reason))
    };
    let lookup = |name: &str| {
        forms
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| invalid(format!("unknown name {}", name)))
    };

    let mut terms = Vec::new();
    let mut sign = Sign::Plus;
    let mut name = String::new();
    for c in side.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '+' | '-' => {
                let op = if c == '+' { Sign::Plus } else { Sign::Minus };
                if name.is_empty() {
                    sign = sign.compose(op);
                } else {
                    terms.push((sign, lookup(&name)?));
                    name.clear();
                    sign = op;
                }
            }
            c => name.push(c),
        }
    }
    if name.is_empty() {
        return Err(invalid("expected a name".to_string()));
    }
    terms.push((sign, lookup(&name)?));
    Ok(terms)
}
