//! Conversion of terms into their algebraic representation.
use crate::array::{AbstractArray, ChainLink};
use crate::error::DerivationResult;
use crate::form::FormExpr;
use crate::registry::{FormId, ScalarId};
use crate::session::Session;
use crate::sign::Sign;
use crate::term::{Term, TermKind};

/// The outcome of converting a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Converted { array: AbstractArray, sign: Sign },
    /// The term has no known algebraic representation.
    Unsupported { reason: String },
}

impl Conversion {
    fn unsupported(reason: impl Into<String>) -> Self {
        Conversion::Unsupported { reason: reason.into() }
    }
}

impl Session {
    /// Tries to convert a term tested with `test_form` into an algebraic term.
    ///
    /// The recognized terms are, with `v` the test form, `u` a root form and `c` a scalar,
    ///
    /// - `(u, v)`, `(c u, v)` and `(u / c, v)`, giving `c vᵀ M u`,
    /// - `(d u, v)` with the same factors, giving `c vᵀ M D u`,
    /// - each of the above with `d v` in place of `v`, giving `c vᵀ Dᵀ M ...`,
    /// - `<tr ⋆u, tr v>`, giving `vᵀ b(u)`.
    ///
    /// Terms of any other shape give [`Conversion::Unsupported`]. Errors are reserved for
    /// terms whose spaces are not finite or whose arrays do not chain.
    pub fn try_convert_term(&mut self, term: &Term, test_form: FormId) -> DerivationResult<Conversion> {
        match term.kind() {
            TermKind::L2InnerProduct => self.convert_inner_product(term, test_form),
            TermKind::DualityPairing => self.convert_duality_pairing(term, test_form),
        }
    }

    fn convert_inner_product(&mut self, term: &Term, test_form: FormId) -> DerivationResult<Conversion> {
        let test_vector = self.form_vector(test_form)?;
        let mut chain = vec![self.link(test_vector, true)];
        if term.f2() != test_form {
            let e2 = *self.form(term.f2()).expr();
            match e2 {
                FormExpr::ExteriorDerivative(v) if v == test_form => {
                    let d = self.incidence_matrix(self.form(test_form).space())?;
                    chain.push(self.link(d, true));
                }
                _ => {
                    return Ok(Conversion::unsupported(format!(
                        "second form of {} is neither the test form nor its exterior derivative",
                        term.lin()
                    )))
                }
            }
        }

        let (factor, g) = self.split_factor(term.f1())?;
        let Some(core) = self.form_chain(g)? else {
            return Ok(Conversion::unsupported(format!(
                "first form of {} is neither a root form nor the exterior derivative of one",
                term.lin()
            )));
        };
        chain.extend(core);
        Ok(Conversion::Converted {
            array: AbstractArray::new(factor, chain)?,
            sign: Sign::Plus,
        })
    }

    fn convert_duality_pairing(&mut self, term: &Term, test_form: FormId) -> DerivationResult<Conversion> {
        let (e1, e2) = (*self.form(term.f1()).expr(), *self.form(term.f2()).expr());
        let g = match (e1, e2) {
            (FormExpr::Trace(h), FormExpr::Trace(v)) if v == test_form => match *self.form(h).expr() {
                FormExpr::Hodge(g) if self.form(g).is_root() => g,
                _ => return Ok(Conversion::unsupported(format!("{} is not of the form <tr ⋆u, tr v>", term.lin()))),
            },
            _ => return Ok(Conversion::unsupported(format!("{} is not of the form <tr ⋆u, tr v>", term.lin()))),
        };
        let test_vector = self.form_vector(test_form)?;
        let b = self.wedge_vector(g, self.form(test_form).space())?;
        let one = self.unit_scalar();
        let chain = vec![self.link(test_vector, true), self.link(b, false)];
        Ok(Conversion::Converted {
            array: AbstractArray::new(one, chain)?,
            sign: Sign::Plus,
        })
    }

    /// Splits `c u` and `u / c` into the coefficient and `u`. Other forms have coefficient 1.
    fn split_factor(&mut self, f: FormId) -> DerivationResult<(ScalarId, FormId)> {
        let expr = *self.form(f).expr();
        match expr {
            FormExpr::Scaled(c, g) => Ok((c, g)),
            FormExpr::Quotient(g, s) => Ok((self.scalar_div(1.0, s)?, g)),
            _ => Ok((self.unit_scalar(), f)),
        }
    }

    /// The chain `M u` or `M D u` representing the form `u` or `d u` against test functions.
    fn form_chain(&mut self, g: FormId) -> DerivationResult<Option<Vec<ChainLink>>> {
        let (space, expr) = (self.form(g).space(), *self.form(g).expr());
        if expr.is_leaf() {
            let m = self.mass_matrix(space)?;
            let u = self.form_vector(g)?;
            return Ok(Some(vec![self.link(m, false), self.link(u, false)]));
        }
        match expr {
            FormExpr::ExteriorDerivative(r) if self.form(r).is_root() => {
                let m = self.mass_matrix(space)?;
                let d = self.incidence_matrix(self.form(r).space())?;
                let u = self.form_vector(r)?;
                Ok(Some(vec![self.link(m, false), self.link(d, false), self.link(u, false)]))
            }
            _ => Ok(None),
        }
    }
}
