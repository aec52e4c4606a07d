//! Constant scalars used as coefficients of forms and arrays.
//!
//! A scalar is either *real*, i.e. it stands for a known number such as `1/2`, or *abstract*,
//! such as a time step `Δt`. Arithmetic on two real scalars folds into a new real scalar;
//! anything else produces a derived abstract scalar whose labels are composed from the
//! operand labels.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{push, validate_root_labels, EntityKind, ScalarId};
use crate::session::Session;
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantScalar {
    sym: String,
    lin: String,
    pure_lin: Option<String>,
    is_root: bool,
    value: Option<f64>,
}

impl ConstantScalar {
    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    pub fn pure_lin(&self) -> Option<&str> {
        self.pure_lin.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_real(&self) -> bool {
        self.value.is_some()
    }

    /// The numeric value of a real scalar.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// An operand of scalar arithmetic.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ScalarOperand {
    Number(f64),
    Scalar(ScalarId),
}

impl From<f64> for ScalarOperand {
    fn from(x: f64) -> Self {
        ScalarOperand::Number(x)
    }
}

impl From<ScalarId> for ScalarOperand {
    fn from(id: ScalarId) -> Self {
        ScalarOperand::Scalar(id)
    }
}

/// Symbolic and linguistic text of a number.
fn number_labels(x: f64) -> (String, String) {
    let lin = if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    };
    let sym = if x == 0.5 { r"\dfrac{1}{2}".to_string() } else { lin.clone() };
    (sym, lin)
}

/// Whether a label could be issued to a real scalar by [`number_labels`].
fn is_number_label(label: &str) -> bool {
    label.parse::<f64>().map_or(false, f64::is_finite) || label == number_labels(0.5).0
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn scalar(&self, id: ScalarId) -> &ConstantScalar {
        &self.registry.scalars[id.0]
    }

    /// The real scalar standing for a number.
    pub fn constant_number(&mut self, x: f64) -> DerivationResult<ScalarId> {
        if !x.is_finite() {
            return Err(DerivationError::Unsupported(format!("non-finite constant {}", x)));
        }
        let (sym, pure_lin) = number_labels(x);
        self.register_root_scalar(sym, pure_lin, Some(x))
    }

    /// The real scalar 1.
    pub fn unit_scalar(&mut self) -> ScalarId {
        self.constant_number(1.0)
            .expect("1 is a finite number with valid labels")
    }

    /// An abstract root scalar.
    ///
    /// Asking again with the same pair of labels returns the same scalar, but reusing only
    /// one of the labels is an identity conflict.
    /// Labels that read as numbers are reserved for real scalars.
    pub fn abstract_scalar(&mut self, sym: &str, lin: &str) -> DerivationResult<ScalarId> {
        validate_root_labels(EntityKind::Scalar, sym, lin)?;
        if let Some(label) = [sym, lin].into_iter().find(|label| is_number_label(label)) {
            return Err(DerivationError::InvalidRepresentation(format!(
                "\"{}\" is reserved for a real scalar",
                label
            )));
        }
        self.register_root_scalar(sym.to_string(), lin.to_string(), None)
    }

    fn register_root_scalar(
        &mut self,
        sym: String,
        pure_lin: String,
        value: Option<f64>,
    ) -> DerivationResult<ScalarId> {
        let index = &self.registry.scalar_labels;
        if let (Some(a), Some(b)) = (index.by_sym(&sym), index.by_lin(&pure_lin)) {
            if a == b && self.scalar(a).value == value {
                return Ok(a);
            }
        }
        index.check_available(&sym, &pure_lin)?;
        let lin = self.settings.repr.lin_wrappers.scalar.wrap(&pure_lin);
        let id = ScalarId(self.registry.scalars.len());
        self.registry.scalar_labels.insert(&sym, &pure_lin, id);
        debug!("Registered scalar {}", pure_lin);
        push(
            &mut self.registry.scalars,
            ConstantScalar {
                sym,
                lin,
                pure_lin: Some(pure_lin),
                is_root: true,
                value,
            },
        );
        Ok(id)
    }

    fn intern_derived_scalar(&mut self, sym: String, lin: String) -> ScalarId {
        if let Some(&existing) = self.registry.derived_scalars.get(&lin) {
            return existing;
        }
        let id = ScalarId(self.registry.scalars.len());
        self.registry.derived_scalars.insert(lin.clone(), id);
        push(
            &mut self.registry.scalars,
            ConstantScalar {
                sym,
                lin,
                pure_lin: None,
                is_root: false,
                value: None,
            },
        );
        id
    }

    fn resolve_scalar_operand(&mut self, operand: ScalarOperand) -> DerivationResult<ScalarId> {
        match operand {
            ScalarOperand::Number(x) => self.constant_number(x),
            ScalarOperand::Scalar(id) => Ok(id),
        }
    }

    /// The sum of two scalars.
    pub fn scalar_add(
        &mut self,
        lhs: impl Into<ScalarOperand>,
        rhs: impl Into<ScalarOperand>,
    ) -> DerivationResult<ScalarId> {
        let a = self.resolve_scalar_operand(lhs.into())?;
        let b = self.resolve_scalar_operand(rhs.into())?;
        let (sa, sb) = (self.scalar(a), self.scalar(b));
        if let (Some(x), Some(y)) = (sa.value, sb.value) {
            return self.constant_number(x + y);
        }
        let sym = format!("{}{}{}", sa.sym, self.settings.repr.sym_ops.plus, sb.sym);
        let lin = format!("{}{}{}", sa.lin, self.settings.repr.lin_ops.plus, sb.lin);
        Ok(self.intern_derived_scalar(sym, lin))
    }

    /// The quotient of two scalars.
    pub fn scalar_div(
        &mut self,
        lhs: impl Into<ScalarOperand>,
        rhs: impl Into<ScalarOperand>,
    ) -> DerivationResult<ScalarId> {
        let a = self.resolve_scalar_operand(lhs.into())?;
        let b = self.resolve_scalar_operand(rhs.into())?;
        let (sa, sb) = (self.scalar(a), self.scalar(b));
        if let (Some(x), Some(y)) = (sa.value, sb.value) {
            if y == 0.0 {
                return Err(DerivationError::Unsupported(format!("division of {} by zero", sa.lin)));
            }
            return self.constant_number(x / y);
        }
        let sym = self.settings.repr.sym_ops.division.join(&sa.sym, &sb.sym);
        let lin = format!("{}{}{}", sa.lin, self.settings.repr.lin_ops.division, sb.lin);
        Ok(self.intern_derived_scalar(sym, lin))
    }
}
