//! Derivations that rewrite the terms of a weak formulation.
use crate::error::{DerivationError, DerivationResult};
use crate::form::FormExpr;
use crate::registry::FormId;
use crate::scalar::ScalarOperand;
use crate::session::Session;
use crate::sign::Sign;
use crate::term::{SignedTerm, TermKind};
use crate::wf::{Side, WeakFormulation, WfEquation};
use std::str::FromStr;

/// Which form of a term to operate on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Slot {
    F0,
    F1,
}

impl FromStr for Slot {
    type Err = DerivationError;

    fn from_str(s: &str) -> DerivationResult<Self> {
        match s {
            "f0" => Ok(Slot::F0),
            "f1" => Ok(Slot::F1),
            other => Err(DerivationError::InvalidRepresentation(format!(
                "slot must be f0 or f1, got \"{}\"",
                other
            ))),
        }
    }
}

fn parse_index_list(pattern: &str, side: &str) -> DerivationResult<Vec<usize>> {
    let side = side.trim();
    if side.is_empty() {
        return Ok(Vec::new());
    }
    side.split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| DerivationError::indexing(pattern, format!("{} is not a term index", s.trim())))
        })
        .collect()
}

impl WeakFormulation {
    /// Integrates the term `(δa, b)` at `index` by parts.
    ///
    /// The term is replaced by `(a, d b)` with the same sign, followed by the boundary term
    /// `<tr ⋆a, tr b>` with the opposite sign.
    pub fn integration_by_parts(&self, session: &mut Session, index: &str) -> DerivationResult<WeakFormulation> {
        let (i, side, k) = self.locate(index)?;
        let signed = self.get(index)?.clone();
        let term = &signed.term;
        let a = match (term.kind(), *session.form(term.f1()).expr()) {
            (TermKind::L2InnerProduct, FormExpr::Codifferential(a)) => a,
            _ => {
                return Err(DerivationError::PatternMismatch(format!(
                    "integration by parts needs a term (δa, b), got {}",
                    term.lin()
                )))
            }
        };
        let b = term.f2();
        let db = session.d(b)?;
        let volume = session.inner(a, db)?;
        let hodge_a = session.hodge(a)?;
        let trace_hodge_a = session.trace(hodge_a)?;
        let trace_b = session.trace(b)?;
        let boundary = session.duality_pairing(trace_hodge_a, trace_b)?;

        let mut equations = self.equations.clone();
        let terms = match side {
            Side::Left => &mut equations[i].left,
            Side::Right => &mut equations[i].right,
        };
        terms.splice(
            k..=k,
            [
                SignedTerm::new(signed.sign, volume),
                SignedTerm::new(signed.sign.flipped(), boundary),
            ],
        );
        self.with_new_terms(session, equations)
    }

    /// Reorders and moves terms across the equals sign.
    ///
    /// Each rule gives an equation and a pattern such as `"0, 3 = 2, 1"`, listing the indices of
    /// the equation's terms in their new order on each side. The pattern must use every index
    /// of the equation exactly once. Terms that change side change sign.
    pub fn rearrange(&self, rules: &[(usize, &str)]) -> DerivationResult<WeakFormulation> {
        let mut equations = self.equations.clone();
        for &(i, pattern) in rules {
            let equation = self
                .equations
                .get(i)
                .ok_or_else(|| DerivationError::indexing(i.to_string(), "no such equation"))?;
            let sides: Vec<&str> = pattern.split('=').collect();
            if sides.len() != 2 {
                return Err(DerivationError::InvalidRepresentation(format!(
                    "rearrangement \"{}\" must contain exactly one '='",
                    pattern
                )));
            }
            let left = parse_index_list(pattern, sides[0])?;
            let right = parse_index_list(pattern, sides[1])?;
            let mut seen = vec![false; equation.len()];
            for &j in left.iter().chain(&right) {
                match seen.get_mut(j) {
                    Some(s) if !*s => *s = true,
                    Some(_) => {
                        return Err(DerivationError::StructuralMismatch(format!(
                            "term {} appears more than once in \"{}\"",
                            j, pattern
                        )))
                    }
                    None => {
                        return Err(DerivationError::indexing(
                            pattern,
                            format!("equation {} has only {} terms", i, equation.len()),
                        ))
                    }
                }
            }
            if let Some(missing) = seen.iter().position(|s| !s) {
                return Err(DerivationError::StructuralMismatch(format!(
                    "term {} of equation {} is missing from \"{}\"",
                    missing, i, pattern
                )));
            }
            let place = |indices: &[usize], target: Side| -> Vec<SignedTerm> {
                indices
                    .iter()
                    .filter_map(|&j| equation.position(j).map(|(side, k)| (side, &equation.side(side)[k])))
                    .map(|(side, signed)| {
                        let sign = if side == target { signed.sign } else { signed.sign.flipped() };
                        SignedTerm::new(sign, signed.term.clone())
                    })
                    .collect()
            };
            equations[i] = WfEquation::new(place(&left, Side::Left), place(&right, Side::Right));
        }
        Ok(self.with_equations(equations))
    }

    /// Splits the term at `index` into one term per piece.
    ///
    /// The form in `slot` is replaced by `factors[p] · pieces[p]` (or by the piece itself when
    /// no factors are given) and the new term gets the sign `signs[p]` composed with the sign of
    /// the original term.
    pub fn split(
        &self,
        session: &mut Session,
        index: &str,
        slot: Slot,
        pieces: &[FormId],
        signs: &[Sign],
        factors: Option<&[ScalarOperand]>,
    ) -> DerivationResult<WeakFormulation> {
        if pieces.is_empty() || pieces.len() != signs.len() || factors.map_or(false, |f| f.len() != pieces.len()) {
            return Err(DerivationError::StructuralMismatch(format!(
                "split of {} needs equally many pieces, signs and factors",
                index
            )));
        }
        let (i, side, k) = self.locate(index)?;
        let original = self.get(index)?.clone();
        let term = &original.term;
        let mut new_terms = Vec::with_capacity(pieces.len());
        for (p, (&piece, &sign)) in pieces.iter().zip(signs).enumerate() {
            let f = match factors {
                Some(factors) => session.form_scale(factors[p], piece)?,
                None => piece,
            };
            let new_term = match slot {
                Slot::F0 => session.make_term(term.kind(), f, term.f2())?,
                Slot::F1 => session.make_term(term.kind(), term.f1(), f)?,
            };
            new_terms.push(SignedTerm::new(original.sign.compose(sign), new_term));
        }

        let mut equations = self.equations.clone();
        let terms = match side {
            Side::Left => &mut equations[i].left,
            Side::Right => &mut equations[i].right,
        };
        terms.splice(k..=k, new_terms);
        self.with_new_terms(session, equations)
    }
}
