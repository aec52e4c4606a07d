//! Algebraic proxies of weak formulations.
//!
//! Every term is converted into an [`AbstractArray`] tested with the coefficient vector of its
//! equation's test form. Terms without an algebraic representation are kept verbatim.
use crate::array::AbstractArray;
use crate::error::{DerivationError, DerivationResult};
use crate::registry::ArrayId;
use crate::session::Session;
use crate::sign::Sign;
use crate::term::ap::Conversion;
use crate::term::Term;
use crate::wf::{parse_term_index, Side, WeakFormulation};
use log::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgebraicTerm {
    Array(AbstractArray),
    /// A term that could not be converted.
    Symbolic(Term),
}

impl AlgebraicTerm {
    pub fn as_array(&self) -> Option<&AbstractArray> {
        match self {
            AlgebraicTerm::Array(array) => Some(array),
            AlgebraicTerm::Symbolic(_) => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Linearity {
    Linear,
    Nonlinear,
    /// The term was not converted, so its linearity is not known.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApEntry {
    /// Index `"i-k"` of the term.
    pub index: String,
    pub sign: Sign,
    pub term: AlgebraicTerm,
    pub linearity: Linearity,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApEquation {
    pub left: Vec<ApEntry>,
    pub right: Vec<ApEntry>,
}

impl ApEquation {
    pub fn side(&self, side: Side) -> &[ApEntry] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Side, &ApEntry)> {
        self.left
            .iter()
            .map(|e| (Side::Left, e))
            .chain(self.right.iter().map(|e| (Side::Right, e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgebraicProxy {
    equations: Vec<ApEquation>,
    unknowns: Vec<ArrayId>,
    test_vectors: Vec<ArrayId>,
    elementary_vectors: Vec<ArrayId>,
    is_linear: bool,
}

impl AlgebraicProxy {
    /// Converts all terms of a weak formulation, which must have unknowns.
    pub fn new(session: &mut Session, wf: &WeakFormulation) -> DerivationResult<Self> {
        let unknown_forms = wf.unknowns().ok_or_else(|| {
            DerivationError::InvalidState("set the unknowns of the weak formulation first".to_string())
        })?;
        let unknowns = unknown_forms
            .iter()
            .map(|&u| session.form_vector(u))
            .collect::<DerivationResult<Vec<_>>>()?;
        let test_vectors = wf
            .test_forms()
            .iter()
            .map(|&v| session.form_vector(v))
            .collect::<DerivationResult<Vec<_>>>()?;

        let mut is_linear = true;
        let mut equations = Vec::with_capacity(wf.num_equations());
        for (i, (equation, &test_form)) in wf.equations().iter().zip(wf.test_forms()).enumerate() {
            let mut ap_equation = ApEquation::default();
            for (k, (side, signed)) in equation.iter().enumerate() {
                let index = format!("{}-{}", i, k);
                let entry = match session.try_convert_term(&signed.term, test_form)? {
                    Conversion::Converted { array, sign } => {
                        let linearity = if array.is_linear(session) {
                            Linearity::Linear
                        } else {
                            is_linear = false;
                            Linearity::Nonlinear
                        };
                        ApEntry {
                            index,
                            sign: sign.compose(signed.sign),
                            term: AlgebraicTerm::Array(array),
                            linearity,
                        }
                    }
                    Conversion::Unsupported { reason } => {
                        warn!("Keeping term {} of the weak formulation verbatim: {}", index, reason);
                        is_linear = false;
                        ApEntry {
                            index,
                            sign: signed.sign,
                            term: AlgebraicTerm::Symbolic(signed.term.clone()),
                            linearity: Linearity::Unknown,
                        }
                    }
                };
                match side {
                    Side::Left => ap_equation.left.push(entry),
                    Side::Right => ap_equation.right.push(entry),
                }
            }
            equations.push(ap_equation);
        }

        let mut elementary_vectors = Vec::new();
        for f in wf.elementary_forms(session) {
            let vector = session.form_vector(f)?;
            if !elementary_vectors.contains(&vector) {
                elementary_vectors.push(vector);
            }
        }

        Ok(Self {
            equations,
            unknowns,
            test_vectors,
            elementary_vectors,
            is_linear,
        })
    }

    pub fn equations(&self) -> &[ApEquation] {
        &self.equations
    }

    pub fn num_equations(&self) -> usize {
        self.equations.len()
    }

    /// Whether every term was converted into a linear array.
    pub fn is_linear(&self) -> bool {
        self.is_linear
    }

    /// Coefficient vectors of the unknowns.
    pub fn unknowns(&self) -> &[ArrayId] {
        &self.unknowns
    }

    pub fn test_vectors(&self) -> &[ArrayId] {
        &self.test_vectors
    }

    /// Coefficient vectors of all elementary forms of the weak formulation.
    pub fn elementary_vectors(&self) -> &[ArrayId] {
        &self.elementary_vectors
    }

    pub fn get(&self, index: &str) -> DerivationResult<&ApEntry> {
        let (i, k) = parse_term_index(index)?;
        let equation = self
            .equations
            .get(i)
            .ok_or_else(|| {
                DerivationError::indexing(index, format!("there are only {} equations", self.equations.len()))
            })?;
        equation
            .iter()
            .nth(k)
            .map(|(_, entry)| entry)
            .ok_or_else(|| DerivationError::indexing(index, format!("equation {} has fewer than {} terms", i, k + 1)))
    }
}

impl WeakFormulation {
    /// The algebraic proxy of this weak formulation.
    pub fn ap(&self, session: &mut Session) -> DerivationResult<AlgebraicProxy> {
        AlgebraicProxy::new(session, self)
    }
}
