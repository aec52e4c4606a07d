//! Weak formulations.
//!
//! A weak formulation holds, per equation, the signed terms on the left and on the right of
//! the equals sign, together with the test form of each equation and optionally the unknowns.
//! Terms are addressed by index strings `"i-j"`, where `i` is the equation and `j` counts the
//! terms of the equation from left to right, continuing across the equals sign.
//!
//! All derivations produce new formulations and leave the original untouched.
use crate::error::{DerivationError, DerivationResult};
use crate::ode::Ode;
use crate::registry::{FormId, MeshId};
use crate::session::Session;
use crate::sign::Sign;
use crate::term::{SignedTerm, Term};
use std::collections::BTreeSet;

pub mod ap;
pub mod derive;
pub mod mp;
pub mod td;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// The terms of one equation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WfEquation {
    pub left: Vec<SignedTerm>,
    pub right: Vec<SignedTerm>,
}

impl WfEquation {
    pub fn new(left: Vec<SignedTerm>, right: Vec<SignedTerm>) -> Self {
        Self { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn side(&self, side: Side) -> &[SignedTerm] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// The side and local position of the term at position `j`.
    pub fn position(&self, j: usize) -> Option<(Side, usize)> {
        if j < self.left.len() {
            Some((Side::Left, j))
        } else if j < self.len() {
            Some((Side::Right, j - self.left.len()))
        } else {
            None
        }
    }

    pub fn get(&self, j: usize) -> Option<&SignedTerm> {
        self.position(j).map(|(side, k)| &self.side(side)[k])
    }

    /// All terms with their side, from left to right.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &SignedTerm)> {
        self.left
            .iter()
            .map(|t| (Side::Left, t))
            .chain(self.right.iter().map(|t| (Side::Right, t)))
    }
}

/// Parses a composite index `"i-j"`.
pub(crate) fn parse_term_index(index: &str) -> DerivationResult<(usize, usize)> {
    let parts: Vec<&str> = index.split('-').collect();
    if parts.len() != 2 {
        return Err(DerivationError::indexing(index, "expected the form \"i-j\""));
    }
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| DerivationError::indexing(index, format!("{} is not a non-negative integer", s)))
    };
    Ok((parse(parts[0])?, parse(parts[1])?))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakFormulation {
    mesh: MeshId,
    equations: Vec<WfEquation>,
    test_forms: Vec<FormId>,
    unknowns: Option<Vec<FormId>>,
}

impl WeakFormulation {
    /// Creates a weak formulation with one test form per equation.
    ///
    /// Every term must be tested with its equation's test form and live on the mesh of the
    /// test forms or on its boundary.
    pub fn new(session: &Session, equations: Vec<WfEquation>, test_forms: Vec<FormId>) -> DerivationResult<Self> {
        let mesh = check_equations(session, &equations, &test_forms)?;
        Ok(Self {
            mesh,
            equations,
            test_forms,
            unknowns: None,
        })
    }

    /// Creates a weak formulation from parallel tables of terms and signs.
    ///
    /// The table of signs must have exactly the shape of the table of terms.
    pub fn from_terms_and_signs(
        session: &Session,
        terms: Vec<(Vec<Term>, Vec<Term>)>,
        signs: Vec<(Vec<Sign>, Vec<Sign>)>,
        test_forms: Vec<FormId>,
    ) -> DerivationResult<Self> {
        if terms.len() != signs.len() {
            return Err(DerivationError::StructuralMismatch(format!(
                "{} equations of terms but {} equations of signs",
                terms.len(),
                signs.len()
            )));
        }
        let zip_side = |i: usize, terms: Vec<Term>, signs: Vec<Sign>| -> DerivationResult<Vec<SignedTerm>> {
            if terms.len() != signs.len() {
                return Err(DerivationError::StructuralMismatch(format!(
                    "equation {}: {} terms but {} signs",
                    i,
                    terms.len(),
                    signs.len()
                )));
            }
            Ok(signs
                .into_iter()
                .zip(terms)
                .map(|(sign, term)| SignedTerm::new(sign, term))
                .collect())
        };
        let equations = terms
            .into_iter()
            .zip(signs)
            .enumerate()
            .map(|(i, ((lt, rt), (ls, rs)))| Ok(WfEquation::new(zip_side(i, lt, ls)?, zip_side(i, rt, rs)?)))
            .collect::<DerivationResult<Vec<_>>>()?;
        Self::new(session, equations, test_forms)
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn equations(&self) -> &[WfEquation] {
        &self.equations
    }

    pub fn num_equations(&self) -> usize {
        self.equations.len()
    }

    pub fn test_forms(&self) -> &[FormId] {
        &self.test_forms
    }

    pub fn unknowns(&self) -> Option<&[FormId]> {
        self.unknowns.as_deref()
    }

    /// Sets the unknowns, which must be root forms.
    pub fn with_unknowns(&self, session: &Session, unknowns: &[FormId]) -> DerivationResult<Self> {
        if let Some(u) = unknowns.iter().find(|u| !session.form(**u).is_root()) {
            return Err(DerivationError::Unsupported(format!(
                "unknowns must be root forms, {} is not",
                session.form(*u).lin()
            )));
        }
        Ok(Self {
            unknowns: Some(unknowns.to_vec()),
            ..self.clone()
        })
    }

    /// Resolves an index `"i-j"` to the equation, side and position within the side.
    pub fn locate(&self, index: &str) -> DerivationResult<(usize, Side, usize)> {
        let (i, j) = parse_term_index(index)?;
        let equation = self
            .equations
            .get(i)
            .ok_or_else(|| {
                DerivationError::indexing(index, format!("there are only {} equations", self.equations.len()))
            })?;
        let (side, k) = equation
            .position(j)
            .ok_or_else(|| {
                DerivationError::indexing(index, format!("equation {} has only {} terms", i, equation.len()))
            })?;
        Ok((i, side, k))
    }

    pub fn get(&self, index: &str) -> DerivationResult<&SignedTerm> {
        let (i, side, k) = self.locate(index)?;
        Ok(&self.equations[i].side(side)[k])
    }

    /// All root forms the terms are built from.
    pub fn elementary_forms(&self, session: &Session) -> BTreeSet<FormId> {
        self.equations
            .iter()
            .flat_map(|equation| equation.iter())
            .flat_map(|(_, signed)| session.term_elementary_forms(&signed.term))
            .collect()
    }

    /// The ordinary differential equation in time given by equation `i`.
    pub fn ode(&self, session: &Session, i: usize) -> DerivationResult<Ode> {
        let equation = self
            .equations
            .get(i)
            .ok_or_else(|| {
                DerivationError::indexing(i.to_string(), format!("there are only {} equations", self.equations.len()))
            })?;
        Ode::new(session, equation.left.clone(), equation.right.clone())
    }

    /// The formulation with its equations replaced by a permutation of their own terms.
    pub(crate) fn with_equations(&self, equations: Vec<WfEquation>) -> Self {
        Self {
            equations,
            ..self.clone()
        }
    }

    /// The formulation with its equations replaced by new terms, which must again be tested
    /// with the test forms of their equations.
    pub(crate) fn with_new_terms(
        &self,
        session: &Session,
        equations: Vec<WfEquation>,
    ) -> DerivationResult<Self> {
        check_equations(session, &equations, &self.test_forms)?;
        Ok(self.with_equations(equations))
    }
}

/// Checks the shape of a table of equations and returns the mesh of its test forms.
fn check_equations(
    session: &Session,
    equations: &[WfEquation],
    test_forms: &[FormId],
) -> DerivationResult<MeshId> {
    if equations.is_empty() {
        return Err(DerivationError::StructuralMismatch(
            "a weak formulation needs at least one equation".to_string(),
        ));
    }
    if equations.len() != test_forms.len() {
        return Err(DerivationError::StructuralMismatch(format!(
            "{} equations but {} test forms",
            equations.len(),
            test_forms.len()
        )));
    }
    let mesh = session.space(session.form(test_forms[0]).space()).mesh();
    for (i, (equation, &v)) in equations.iter().zip(test_forms).enumerate() {
        if equation.is_empty() {
            return Err(DerivationError::StructuralMismatch(format!("equation {} has no terms", i)));
        }
        if session.space(session.form(v).space()).mesh() != mesh {
            return Err(DerivationError::StructuralMismatch(format!(
                "test form {} lives on a different mesh",
                session.form(v).lin()
            )));
        }
        for (_, signed) in equation.iter() {
            let term = &signed.term;
            if session.term_test_form(term) != Some(v) {
                return Err(DerivationError::StructuralMismatch(format!(
                    "term {} of equation {} is not tested with {}",
                    term.lin(),
                    i,
                    session.form(v).lin()
                )));
            }
            if term.mesh() != mesh && session.mesh(term.mesh()).inclusion() != Some(mesh) {
                return Err(DerivationError::StructuralMismatch(format!(
                    "term {} is neither on the mesh nor on its boundary",
                    term.lin()
                )));
            }
        }
    }
    Ok(mesh)
}
