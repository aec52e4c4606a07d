//! Terms of weak formulations: integrals pairing two forms.
use crate::error::{DerivationError, DerivationResult};
use crate::form::FormExpr;
use crate::registry::{FormId, MeshId};
use crate::session::Session;
use crate::sign::Sign;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub mod ap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermKind {
    /// `(a, b)`: the L2 inner product of two k-forms over a mesh.
    L2InnerProduct,
    /// `<a, b>`: the duality pairing of a k-form and an (n-k)-form over an n-dimensional mesh.
    DualityPairing,
}

/// A term built from two forms, integrated over a mesh.
///
/// The second form is the (possibly differentiated) test form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    kind: TermKind,
    f1: FormId,
    f2: FormId,
    mesh: MeshId,
    sym: String,
    lin: String,
}

impl Term {
    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn f1(&self) -> FormId {
        self.f1
    }

    pub fn f2(&self) -> FormId {
        self.f2
    }

    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }
}

/// A term together with the sign in front of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTerm {
    pub sign: Sign,
    pub term: Term,
}

impl SignedTerm {
    pub fn new(sign: Sign, term: Term) -> Self {
        Self { sign, term }
    }
}

/// Simple structural patterns of terms.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimplePattern {
    /// `(∂t u, v)` with `u` a root form.
    TimeDerivative,
    /// `(δ a, v)`.
    Codifferential,
    /// `(u, v)` with both root forms.
    RootRoot,
    /// `(d u, v)` with both `u` and `v` root forms.
    DRoot,
    /// `(u, d v)` with both `u` and `v` root forms.
    RootD,
    /// `<tr ⋆u, tr v>` with both root forms.
    TraceHodgeTrace,
}

impl Session {
    /// Builds a term of the given kind.
    pub fn make_term(&self, kind: TermKind, f1: FormId, f2: FormId) -> DerivationResult<Term> {
        let (a, b) = (self.form(f1), self.form(f2));
        let (sa, sb) = (self.space(a.space()), self.space(b.space()));
        if sa.mesh() != sb.mesh() {
            return Err(DerivationError::StructuralMismatch(format!(
                "cannot pair {} and {}: they live on different meshes",
                a.lin(),
                b.lin()
            )));
        }
        let mesh = self.mesh(sa.mesh());
        let (infix_sym, infix_lin) = match kind {
            TermKind::L2InnerProduct => {
                if sa.k() != sb.k() {
                    return Err(DerivationError::StructuralMismatch(format!(
                        "inner product of a {}-form and a {}-form",
                        sa.k(),
                        sb.k()
                    )));
                }
                (&self.settings.repr.sym_ops.inner_product, &self.settings.repr.lin_ops.inner_product)
            }
            TermKind::DualityPairing => {
                if sa.k() + sb.k() != mesh.ndim() {
                    return Err(DerivationError::StructuralMismatch(format!(
                        "duality pairing of a {}-form and a {}-form over a {}-dimensional mesh",
                        sa.k(),
                        sb.k(),
                        mesh.ndim()
                    )));
                }
                (
                    &self.settings.repr.sym_ops.duality_pairing,
                    &self.settings.repr.lin_ops.duality_pairing,
                )
            }
        };
        let sym = format!("{}_{{{}}}", infix_sym.join(a.sym(), b.sym()), mesh.sym());
        let lin = format!("{}{}", infix_lin.join(a.lin(), b.lin()), mesh.lin());
        Ok(Term {
            kind,
            f1,
            f2,
            mesh: sa.mesh(),
            sym,
            lin,
        })
    }

    /// The L2 inner product `(f1, f2)`.
    pub fn inner(&self, f1: FormId, f2: FormId) -> DerivationResult<Term> {
        self.make_term(TermKind::L2InnerProduct, f1, f2)
    }

    /// The duality pairing `<f1, f2>`.
    pub fn duality_pairing(&self, f1: FormId, f2: FormId) -> DerivationResult<Term> {
        self.make_term(TermKind::DualityPairing, f1, f2)
    }

    /// Classifies a term against the known simple patterns.
    pub fn term_pattern(&self, term: &Term) -> Option<SimplePattern> {
        let is_root = |f: FormId| self.form(f).is_root();
        let (e1, e2) = (*self.form(term.f1).expr(), *self.form(term.f2).expr());
        match term.kind {
            TermKind::L2InnerProduct => match e1 {
                FormExpr::TimeDerivative(u) if is_root(u) => Some(SimplePattern::TimeDerivative),
                FormExpr::Codifferential(_) => Some(SimplePattern::Codifferential),
                FormExpr::ExteriorDerivative(u) if is_root(u) && is_root(term.f2) => Some(SimplePattern::DRoot),
                _ if is_root(term.f1) && is_root(term.f2) => Some(SimplePattern::RootRoot),
                _ if is_root(term.f1) => match e2 {
                    FormExpr::ExteriorDerivative(v) if is_root(v) => Some(SimplePattern::RootD),
                    _ => None,
                },
                _ => None,
            },
            TermKind::DualityPairing => match (e1, e2) {
                (FormExpr::Trace(h), FormExpr::Trace(v)) if is_root(v) => match *self.form(h).expr() {
                    FormExpr::Hodge(u) if is_root(u) => Some(SimplePattern::TraceHodgeTrace),
                    _ => None,
                },
                _ => None,
            },
        }
    }

    pub fn term_elementary_forms(&self, term: &Term) -> BTreeSet<FormId> {
        let mut forms = self.elementary_forms(term.f1);
        forms.extend(self.elementary_forms(term.f2));
        forms
    }

    /// Replaces `target` by `by` in both forms of a term.
    ///
    /// Returns the sign in front of the new term relative to the old one.
    pub fn replace_in_term(&mut self, term: &Term, target: FormId, by: FormId) -> DerivationResult<(Sign, Term)> {
        let f1 = self.replace(term.f1, target, by)?;
        let f2 = self.replace(term.f2, target, by)?;
        if f1 == term.f1 && f2 == term.f2 {
            return Ok((Sign::Plus, term.clone()));
        }
        Ok((Sign::Plus, self.make_term(term.kind, f1, f2)?))
    }

    /// The root test form of a term, found by looking through `d` and `tr` applied to the
    /// second form.
    pub fn term_test_form(&self, term: &Term) -> Option<FormId> {
        let mut f = term.f2;
        loop {
            match *self.form(f).expr() {
                FormExpr::Root => return Some(f),
                FormExpr::ExteriorDerivative(g) | FormExpr::Trace(g) => f = g,
                _ => return None,
            }
        }
    }
}
