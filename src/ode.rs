//! Ordinary differential equations in time extracted from one weak-formulation equation.
//!
//! An ODE is about a single root form: every recognized time-derivative term must
//! differentiate the same form. Terms are addressed by their position `"0"`, `"1"`, ... counted
//! over the left terms and then the right terms.
use crate::error::{DerivationError, DerivationResult};
use crate::form::FormExpr;
use crate::registry::FormId;
use crate::session::Session;
use crate::sign::Sign;
use crate::term::{SignedTerm, SimplePattern, Term};
use crate::wf::Side;
use std::collections::BTreeSet;

pub mod discretize;

pub use discretize::{OdeDiscretization, Stage};

/// How a term of an ODE relates to the time derivative.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TermClass {
    /// A recognized time-derivative term of the given order.
    TimeDerivative { order: usize, pattern: SimplePattern },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdeTerm {
    pub sign: Sign,
    pub term: Term,
    pub class: TermClass,
}

impl OdeTerm {
    pub fn signed_term(&self) -> SignedTerm {
        SignedTerm::new(self.sign, self.term.clone())
    }

    pub fn is_time_derivative(&self) -> bool {
        matches!(self.class, TermClass::TimeDerivative { .. })
    }
}

/// Recognized time-derivative patterns and their orders.
fn recognized_order(pattern: Option<SimplePattern>) -> Option<(usize, SimplePattern)> {
    match pattern {
        Some(SimplePattern::TimeDerivative) => Some((1, SimplePattern::TimeDerivative)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ode {
    left: Vec<OdeTerm>,
    right: Vec<OdeTerm>,
    elementary_forms: BTreeSet<FormId>,
    constant_elementary_forms: BTreeSet<FormId>,
    about: FormId,
    overall_order: usize,
    test_form: FormId,
}

impl Ode {
    /// Classifies the terms of one equation.
    ///
    /// Fails with a pattern mismatch if no term is a recognized time-derivative term, or if the
    /// time-derivative terms differentiate more than one form.
    pub fn new(session: &Session, left: Vec<SignedTerm>, right: Vec<SignedTerm>) -> DerivationResult<Self> {
        let classify = |signed: SignedTerm| {
            let class = match recognized_order(session.term_pattern(&signed.term)) {
                Some((order, pattern)) => TermClass::TimeDerivative { order, pattern },
                None => TermClass::Other,
            };
            OdeTerm {
                sign: signed.sign,
                term: signed.term,
                class,
            }
        };
        let left: Vec<OdeTerm> = left.into_iter().map(classify).collect();
        let right: Vec<OdeTerm> = right.into_iter().map(classify).collect();

        let mut about = BTreeSet::new();
        let mut overall_order = 0;
        for term in left.iter().chain(&right) {
            if let TermClass::TimeDerivative { order, .. } = term.class {
                if let FormExpr::TimeDerivative(u) = *session.form(term.term.f1()).expr() {
                    about.insert(u);
                }
                overall_order = overall_order.max(order);
            }
        }
        let about = match about.len() {
            0 => {
                return Err(DerivationError::PatternMismatch(
                    "not a valid ODE: no term is a time derivative".to_string(),
                ))
            }
            1 => about.into_iter().next().expect("exactly one form"),
            _ => {
                return Err(DerivationError::PatternMismatch(format!(
                    "an ODE must be about a single form, found time derivatives of {}",
                    about.iter().map(|f| session.form(*f).lin()).collect::<Vec<_>>().join(", ")
                )))
            }
        };

        let mut test_forms = left
            .iter()
            .chain(&right)
            .map(|t| session.term_test_form(&t.term));
        let test_form = match test_forms.next().flatten() {
            Some(v) if test_forms.all(|w| w == Some(v)) => v,
            _ => {
                return Err(DerivationError::StructuralMismatch(
                    "all terms of an ODE must be tested with the same root form".to_string(),
                ))
            }
        };

        let elementary_forms = left
            .iter()
            .chain(&right)
            .flat_map(|t| session.term_elementary_forms(&t.term))
            .collect();
        Ok(Self {
            left,
            right,
            elementary_forms,
            constant_elementary_forms: BTreeSet::new(),
            about,
            overall_order,
            test_form,
        })
    }

    pub fn left(&self) -> &[OdeTerm] {
        &self.left
    }

    pub fn right(&self) -> &[OdeTerm] {
        &self.right
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The form the ODE is about.
    pub fn about(&self) -> FormId {
        self.about
    }

    pub fn overall_order(&self) -> usize {
        self.overall_order
    }

    pub fn test_form(&self) -> FormId {
        self.test_form
    }

    pub fn elementary_forms(&self) -> &BTreeSet<FormId> {
        &self.elementary_forms
    }

    pub fn constant_elementary_forms(&self) -> &BTreeSet<FormId> {
        &self.constant_elementary_forms
    }

    /// Declares forms that do not change in time. Each must be an elementary form of the ODE.
    pub fn with_constant_elementary_forms(&self, session: &Session, forms: &[FormId]) -> DerivationResult<Self> {
        if let Some(f) = forms.iter().find(|f| !self.elementary_forms.contains(f)) {
            return Err(DerivationError::StructuralMismatch(format!(
                "{} is not an elementary form of the ODE",
                session.form(*f).lin()
            )));
        }
        Ok(Self {
            constant_elementary_forms: forms.iter().copied().collect(),
            ..self.clone()
        })
    }

    pub(crate) fn position(&self, j: usize) -> Option<(Side, usize)> {
        if j < self.left.len() {
            Some((Side::Left, j))
        } else if j < self.len() {
            Some((Side::Right, j - self.left.len()))
        } else {
            None
        }
    }

    pub(crate) fn parse_index(&self, index: &str) -> DerivationResult<usize> {
        let j = index
            .trim()
            .parse::<usize>()
            .map_err(|_| DerivationError::indexing(index, "expected a non-negative integer"))?;
        if j < self.len() {
            Ok(j)
        } else {
            Err(DerivationError::indexing(index, format!("the ODE has only {} terms", self.len())))
        }
    }

    /// The term at position `index`.
    pub fn get(&self, index: &str) -> DerivationResult<&OdeTerm> {
        let j = self.parse_index(index)?;
        Ok(self.term_at(j))
    }

    pub(crate) fn term_at(&self, j: usize) -> &OdeTerm {
        match self.position(j) {
            Some((Side::Left, k)) => &self.left[k],
            Some((Side::Right, k)) => &self.right[k],
            None => panic!("term position {} out of range", j),
        }
    }

    /// Starts a time discretization of this ODE.
    pub fn discretize(&self) -> OdeDiscretization {
        OdeDiscretization::new(self.clone())
    }
}
