//! Differential forms and their algebra.
//!
//! Forms are stored as an expression tree in the session's registry: root forms are leaves,
//! and each derived form records the ids of its operands in its [`FormExpr`]. A root form
//! evaluated at an abstract time instant is itself a root form, bound to its base form through
//! a [`TimeBinding`].
//!
//! Derived forms are interned by their expression, so building the same expression twice
//! yields the same [`FormId`].
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{
    push, validate_root_labels, EntityKind, FormId, InstantId, IntervalId, ScalarId, SpaceId, TimeSequenceId,
};
use crate::scalar::ScalarOperand;
use crate::session::Session;
use crate::space::Orientation;
use log::debug;
use std::collections::BTreeSet;

pub mod operators;

/// Binding of an evaluated form to the form and instant it was evaluated from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimeBinding {
    pub base_form: FormId,
    pub sequence: TimeSequenceId,
    pub instant: InstantId,
}

/// How a form is built.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormExpr {
    Root,
    AtInstant(TimeBinding),
    Sum(FormId, FormId),
    Difference(FormId, FormId),
    Quotient(FormId, ScalarId),
    Scaled(ScalarId, FormId),
    Wedge(FormId, FormId),
    ExteriorDerivative(FormId),
    Codifferential(FormId),
    Hodge(FormId),
    Trace(FormId),
    TimeDerivative(FormId),
}

impl FormExpr {
    /// The forms this expression is directly built from.
    pub fn operands(&self) -> Vec<FormId> {
        match *self {
            FormExpr::Root | FormExpr::AtInstant(_) => Vec::new(),
            FormExpr::Sum(a, b) | FormExpr::Difference(a, b) | FormExpr::Wedge(a, b) => vec![a, b],
            FormExpr::Quotient(a, _)
            | FormExpr::Scaled(_, a)
            | FormExpr::ExteriorDerivative(a)
            | FormExpr::Codifferential(a)
            | FormExpr::Hodge(a)
            | FormExpr::Trace(a)
            | FormExpr::TimeDerivative(a) => vec![a],
        }
    }

    /// Whether forms built by this expression are root forms.
    pub fn is_leaf(&self) -> bool {
        matches!(self, FormExpr::Root | FormExpr::AtInstant(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    space: SpaceId,
    orientation: Orientation,
    sym: String,
    lin: String,
    pure_lin: Option<String>,
    expr: FormExpr,
}

impl Form {
    pub fn space(&self) -> SpaceId {
        self.space
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    /// The linguistic label of a root form without its wrapper.
    pub fn pure_lin(&self) -> Option<&str> {
        self.pure_lin.as_deref()
    }

    pub fn expr(&self) -> &FormExpr {
        &self.expr
    }

    pub fn is_root(&self) -> bool {
        self.expr.is_leaf()
    }

    pub fn time_binding(&self) -> Option<&TimeBinding> {
        match &self.expr {
            FormExpr::AtInstant(binding) => Some(binding),
            _ => None,
        }
    }
}

/// Anything a form can be divided by.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Divisor {
    Number(f64),
    Scalar(ScalarId),
    /// The duration of an abstract time interval.
    Interval(IntervalId),
}

impl From<f64> for Divisor {
    fn from(x: f64) -> Self {
        Divisor::Number(x)
    }
}

impl From<ScalarId> for Divisor {
    fn from(id: ScalarId) -> Self {
        Divisor::Scalar(id)
    }
}

impl From<IntervalId> for Divisor {
    fn from(id: IntervalId) -> Self {
        Divisor::Interval(id)
    }
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn form(&self, id: FormId) -> &Form {
        &self.registry.forms[id.0]
    }

    /// Creates a root form in a space.
    ///
    /// Fails with an identity conflict if another root form already uses either label.
    pub fn make_form(&mut self, space: SpaceId, sym: &str, lin: &str) -> DerivationResult<FormId> {
        validate_root_labels(EntityKind::Form, sym, lin)?;
        self.register_root_form(space, sym.to_string(), lin.to_string(), FormExpr::Root)
    }

    fn register_root_form(
        &mut self,
        space: SpaceId,
        sym: String,
        pure_lin: String,
        expr: FormExpr,
    ) -> DerivationResult<FormId> {
        self.registry.form_labels.check_available(&sym, &pure_lin)?;
        let lin = self.settings.repr.lin_wrappers.form.wrap(&pure_lin);
        let id = FormId(self.registry.forms.len());
        self.registry.form_labels.insert(&sym, &pure_lin, id);
        debug!("Registered root form {}", pure_lin);
        let orientation = self.space(space).orientation();
        push(
            &mut self.registry.forms,
            Form {
                space,
                orientation,
                sym,
                lin,
                pure_lin: Some(pure_lin),
                expr,
            },
        );
        Ok(id)
    }

    pub(crate) fn intern_derived_form(&mut self, space: SpaceId, sym: String, lin: String, expr: FormExpr) -> FormId {
        debug_assert!(!expr.is_leaf());
        if let Some(&existing) = self.registry.derived_forms.get(&expr) {
            return existing;
        }
        let id = FormId(self.registry.forms.len());
        self.registry.derived_forms.insert(expr, id);
        let orientation = self.space(space).orientation();
        push(
            &mut self.registry.forms,
            Form {
                space,
                orientation,
                sym,
                lin,
                pure_lin: None,
                expr,
            },
        );
        id
    }

    /// Linguistic label of an operand, wrapped unless it is a root form.
    pub(crate) fn operand_lin(&self, f: FormId) -> String {
        let form = self.form(f);
        if form.is_root() {
            form.lin.clone()
        } else {
            self.settings.repr.lin_ops.non_root.wrap(&form.lin)
        }
    }

    /// Symbolic label of an operand, wrapped unless it is a root form.
    pub(crate) fn operand_sym(&self, f: FormId) -> String {
        let form = self.form(f);
        if form.is_root() {
            form.sym.clone()
        } else {
            self.settings.repr.sym_ops.non_root.wrap(&form.sym)
        }
    }

    fn check_same_space(&self, a: FormId, b: FormId, operation: &str) -> DerivationResult<SpaceId> {
        let (fa, fb) = (self.form(a), self.form(b));
        if fa.space == fb.space {
            Ok(fa.space)
        } else {
            Err(DerivationError::StructuralMismatch(format!(
                "cannot {} {} and {}: they are in the different spaces {} and {}",
                operation,
                fa.lin,
                fb.lin,
                self.space(fa.space).lin(),
                self.space(fb.space).lin()
            )))
        }
    }

    pub fn form_add(&mut self, a: FormId, b: FormId) -> DerivationResult<FormId> {
        let space = self.check_same_space(a, b, "add")?;
        let (fa, fb) = (self.form(a), self.form(b));
        let sym = format!("{}{}{}", fa.sym, self.settings.repr.sym_ops.plus, fb.sym);
        let lin = format!("{}{}{}", fa.lin, self.settings.repr.lin_ops.plus, fb.lin);
        Ok(self.intern_derived_form(space, sym, lin, FormExpr::Sum(a, b)))
    }

    pub fn form_sub(&mut self, a: FormId, b: FormId) -> DerivationResult<FormId> {
        let space = self.check_same_space(a, b, "subtract")?;
        // A sum or difference on the right needs to be grouped
        let grouped = matches!(self.form(b).expr, FormExpr::Sum(..) | FormExpr::Difference(..));
        let (fa, fb) = (self.form(a), self.form(b));
        let repr = &self.settings.repr;
        let (b_sym, b_lin) = if grouped {
            (repr.sym_ops.non_root.wrap(&fb.sym), repr.lin_ops.non_root.wrap(&fb.lin))
        } else {
            (fb.sym.clone(), fb.lin.clone())
        };
        let sym = format!("{}{}{}", fa.sym, repr.sym_ops.minus, b_sym);
        let lin = format!("{}{}{}", fa.lin, repr.lin_ops.minus, b_lin);
        Ok(self.intern_derived_form(space, sym, lin, FormExpr::Difference(a, b)))
    }

    /// Divides a form by a number, a scalar or the duration of a time interval.
    pub fn form_divide(&mut self, f: FormId, divisor: impl Into<Divisor>) -> DerivationResult<FormId> {
        let scalar = match divisor.into() {
            Divisor::Number(x) if x == 0.0 => {
                return Err(DerivationError::Unsupported(format!(
                    "division of {} by zero",
                    self.form(f).lin
                )))
            }
            Divisor::Number(x) => self.constant_number(x)?,
            Divisor::Scalar(s) => s,
            Divisor::Interval(interval) => self.interval_scalar(interval),
        };
        let form = self.form(f);
        let cs = self.scalar(scalar);
        let sym = self.settings.repr.sym_ops.division.join(&form.sym, cs.sym());
        let lin = format!("{}{}{}", self.operand_lin(f), self.settings.repr.lin_ops.division, cs.lin());
        let space = form.space;
        Ok(self.intern_derived_form(space, sym, lin, FormExpr::Quotient(f, scalar)))
    }

    /// Multiplies a form by a scalar. Multiplying by the real scalar 1 returns the form itself.
    pub fn form_scale(&mut self, factor: impl Into<ScalarOperand>, f: FormId) -> DerivationResult<FormId> {
        let scalar = match factor.into() {
            ScalarOperand::Number(x) => self.constant_number(x)?,
            ScalarOperand::Scalar(s) => s,
        };
        let cs = self.scalar(scalar);
        if cs.value() == Some(1.0) {
            return Ok(f);
        }
        let sym = format!("{}{}", cs.sym(), self.operand_sym(f));
        let lin = format!("{}{}{}", cs.lin(), self.settings.repr.lin_ops.multiply, self.operand_lin(f));
        let space = self.form(f).space;
        Ok(self.intern_derived_form(space, sym, lin, FormExpr::Scaled(scalar, f)))
    }

    /// Evaluates a root form at an abstract time instant.
    ///
    /// The result is a root form bound to `f`, the instant and the instant's sequence.
    /// Evaluating the same form at the same instant again returns the same form.
    /// A form that is already bound to an instant cannot be evaluated again, even though it
    /// is a root form.
    pub fn evaluate_at(&mut self, f: FormId, instant: InstantId) -> DerivationResult<FormId> {
        if let Some(&evaluated) = self.registry.evaluations.get(&(f, instant)) {
            return Ok(evaluated);
        }
        let form = self.form(f);
        match form.expr {
            FormExpr::Root => {}
            FormExpr::AtInstant(_) => {
                return Err(DerivationError::Unsupported(format!(
                    "{} is already evaluated at a time instant",
                    form.lin
                )))
            }
            _ => {
                return Err(DerivationError::Unsupported(format!(
                    "only root forms can be evaluated at a time instant, {} is not a root form",
                    form.lin
                )))
            }
        }
        let i = self.instant(instant);
        let binding = TimeBinding {
            base_form: f,
            sequence: i.sequence(),
            instant,
        };
        let sym = self.settings.repr.sym_ops.evaluate_at.join(&form.sym, i.key());
        let pure_lin = format!(
            "{}{}{}",
            form.pure_lin.as_deref().unwrap_or_default(),
            self.settings.repr.lin_ops.evaluate_at,
            i.pure_lin()
        );
        let space = form.space;
        let evaluated = self.register_root_form(space, sym, pure_lin, FormExpr::AtInstant(binding))?;
        self.registry.evaluations.insert((f, instant), evaluated);
        Ok(evaluated)
    }

    /// Whether `target` occurs in the expression tree of `f`.
    pub fn form_contains(&self, f: FormId, target: FormId) -> bool {
        f == target
            || self
                .form(f)
                .expr
                .operands()
                .into_iter()
                .any(|operand| self.form_contains(operand, target))
    }

    /// The root forms (including evaluated forms) that `f` is built from.
    pub fn elementary_forms(&self, f: FormId) -> BTreeSet<FormId> {
        let mut forms = BTreeSet::new();
        self.collect_elementary_forms(f, &mut forms);
        forms
    }

    fn collect_elementary_forms(&self, f: FormId, forms: &mut BTreeSet<FormId>) {
        let form = self.form(f);
        if form.is_root() {
            forms.insert(f);
        } else {
            for operand in form.expr.operands() {
                self.collect_elementary_forms(operand, forms);
            }
        }
    }

    /// Replaces every occurrence of `target` in `f` by `by`.
    ///
    /// Returns `f` itself if `target` does not occur in it, and `by` if `f` is `target`.
    /// `target` and `by` must be in the same space.
    pub fn replace(&mut self, f: FormId, target: FormId, by: FormId) -> DerivationResult<FormId> {
        self.check_same_space(target, by, "replace")?;
        self.replace_unchecked(f, target, by)
    }

    fn replace_unchecked(&mut self, f: FormId, target: FormId, by: FormId) -> DerivationResult<FormId> {
        if f == target {
            return Ok(by);
        }
        if !self.form_contains(f, target) {
            return Ok(f);
        }
        let rebuild = |session: &mut Session, operand: FormId| session.replace_unchecked(operand, target, by);
        let expr = self.form(f).expr;
        match expr {
            FormExpr::Root | FormExpr::AtInstant(_) => Ok(f),
            FormExpr::Sum(a, b) => {
                let (a, b) = (rebuild(self, a)?, rebuild(self, b)?);
                self.form_add(a, b)
            }
            FormExpr::Difference(a, b) => {
                let (a, b) = (rebuild(self, a)?, rebuild(self, b)?);
                self.form_sub(a, b)
            }
            FormExpr::Wedge(a, b) => {
                let (a, b) = (rebuild(self, a)?, rebuild(self, b)?);
                self.wedge(a, b)
            }
            FormExpr::Quotient(a, s) => {
                let a = rebuild(self, a)?;
                self.form_divide(a, s)
            }
            FormExpr::Scaled(c, a) => {
                let a = rebuild(self, a)?;
                self.form_scale(c, a)
            }
            FormExpr::ExteriorDerivative(a) => {
                let a = rebuild(self, a)?;
                self.d(a)
            }
            FormExpr::Codifferential(a) => {
                let a = rebuild(self, a)?;
                self.codifferential(a)
            }
            FormExpr::Hodge(a) => {
                let a = rebuild(self, a)?;
                self.hodge(a)
            }
            FormExpr::Trace(a) => {
                let a = rebuild(self, a)?;
                self.trace(a)
            }
            FormExpr::TimeDerivative(a) => {
                let a = rebuild(self, a)?;
                self.time_derivative(a)
            }
        }
    }
}
