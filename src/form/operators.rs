//! Differential operators on forms.
use crate::error::DerivationResult;
use crate::form::FormExpr;
use crate::registry::{FormId, SpaceId};
use crate::session::Session;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum UnaryOperator {
    D,
    Codifferential,
    Hodge,
    Trace,
    TimeDerivative,
}

impl Session {
    fn apply_unary(&mut self, op: UnaryOperator, f: FormId) -> DerivationResult<FormId> {
        let space = self.form(f).space();
        let (target, expr): (SpaceId, FormExpr) = match op {
            UnaryOperator::D => (self.space_d(space)?, FormExpr::ExteriorDerivative(f)),
            UnaryOperator::Codifferential => (self.space_codifferential(space)?, FormExpr::Codifferential(f)),
            UnaryOperator::Hodge => (self.space_hodge(space)?, FormExpr::Hodge(f)),
            UnaryOperator::Trace => (self.space_trace(space)?, FormExpr::Trace(f)),
            UnaryOperator::TimeDerivative => (space, FormExpr::TimeDerivative(f)),
        };
        let (sym_ops, lin_ops) = (&self.settings.repr.sym_ops, &self.settings.repr.lin_ops);
        let (op_sym, op_lin) = match op {
            UnaryOperator::D => (&sym_ops.d, &lin_ops.d),
            UnaryOperator::Codifferential => (&sym_ops.codifferential, &lin_ops.codifferential),
            UnaryOperator::Hodge => (&sym_ops.hodge, &lin_ops.hodge),
            UnaryOperator::Trace => (&sym_ops.trace, &lin_ops.trace),
            UnaryOperator::TimeDerivative => (&sym_ops.time_derivative, &lin_ops.time_derivative),
        };
        let sym = format!("{}{}", op_sym, self.operand_sym(f));
        let lin = format!("{}{}", op_lin, self.operand_lin(f));
        Ok(self.intern_derived_form(target, sym, lin, expr))
    }

    /// The exterior derivative `d f`.
    pub fn d(&mut self, f: FormId) -> DerivationResult<FormId> {
        self.apply_unary(UnaryOperator::D, f)
    }

    /// The codifferential `δ f`, the formal adjoint of `d`.
    pub fn codifferential(&mut self, f: FormId) -> DerivationResult<FormId> {
        self.apply_unary(UnaryOperator::Codifferential, f)
    }

    /// The Hodge star `⋆ f`.
    pub fn hodge(&mut self, f: FormId) -> DerivationResult<FormId> {
        self.apply_unary(UnaryOperator::Hodge, f)
    }

    /// The trace of `f` on the boundary of its mesh.
    pub fn trace(&mut self, f: FormId) -> DerivationResult<FormId> {
        self.apply_unary(UnaryOperator::Trace, f)
    }

    pub fn time_derivative(&mut self, f: FormId) -> DerivationResult<FormId> {
        self.apply_unary(UnaryOperator::TimeDerivative, f)
    }

    /// The wedge product `a ∧ b`.
    pub fn wedge(&mut self, a: FormId, b: FormId) -> DerivationResult<FormId> {
        let space = self.space_wedge(self.form(a).space(), self.form(b).space())?;
        let sym = format!("{}{}{}", self.operand_sym(a), self.settings.repr.sym_ops.wedge, self.operand_sym(b));
        let lin = format!("{}{}{}", self.operand_lin(a), self.settings.repr.lin_ops.wedge, self.operand_lin(b));
        Ok(self.intern_derived_form(space, sym, lin, FormExpr::Wedge(a, b)))
    }
}
