//! Arrays of the algebraic representation of weak formulations.
//!
//! A [`RootArray`] is a named vector or matrix, such as the coefficient vector of a form or
//! the mass matrix of a finite space. An [`AbstractArray`] is one algebraic term: a scalar
//! factor times a chain of (possibly transposed) root arrays.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{push, ArrayId, FormId, ScalarId, SpaceId};
use crate::session::Session;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

/// Shape of an array, given by labels of its row and column index sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayShape {
    pub rows: String,
    pub cols: String,
}

impl ArrayShape {
    pub fn new(rows: impl Into<String>, cols: impl Into<String>) -> Self {
        Self {
            rows: rows.into(),
            cols: cols.into(),
        }
    }

    pub fn transposed(&self) -> Self {
        Self::new(self.cols.clone(), self.rows.clone())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayKind {
    /// Coefficient vector of a root form.
    Vector { form: FormId },
    MassMatrix { space: SpaceId },
    /// Incidence matrix of the exterior derivative acting on a space.
    IncidenceMatrix { space: SpaceId },
    /// Vector of the boundary pairing `<tr ⋆u, tr v>` against the test functions of a space.
    WedgeVector { form: FormId, test_space: SpaceId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootArray {
    sym: String,
    lin: String,
    pure_lin: String,
    shape: ArrayShape,
    kind: ArrayKind,
}

impl RootArray {
    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    pub fn pure_lin(&self) -> &str {
        &self.pure_lin
    }

    pub fn shape(&self) -> &ArrayShape {
        &self.shape
    }

    pub fn kind(&self) -> ArrayKind {
        self.kind
    }
}

/// One factor of an [`AbstractArray`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainLink {
    component: ArrayId,
    transposed: bool,
    /// Shape after transposition.
    shape: ArrayShape,
}

impl ChainLink {
    pub fn component(&self) -> ArrayId {
        self.component
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    pub fn shape(&self) -> &ArrayShape {
        &self.shape
    }
}

/// A scalar factor times an ordered product of root arrays.
///
/// An empty chain stands for the factor times the identity and has no fixed shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbstractArray {
    factor: ScalarId,
    chain: Vec<ChainLink>,
}

impl AbstractArray {
    /// Checks that consecutive links have compatible shapes.
    pub fn new(factor: ScalarId, chain: Vec<ChainLink>) -> DerivationResult<Self> {
        if let Some((a, b)) = chain
            .iter()
            .tuple_windows()
            .find(|(a, b)| a.shape.cols != b.shape.rows)
        {
            return Err(DerivationError::StructuralMismatch(format!(
                "cannot chain an array of shape ({}, {}) with an array of shape ({}, {})",
                a.shape.rows, a.shape.cols, b.shape.rows, b.shape.cols
            )));
        }
        Ok(Self { factor, chain })
    }

    pub fn factor(&self) -> ScalarId {
        self.factor
    }

    pub fn chain(&self) -> &[ChainLink] {
        &self.chain
    }

    pub fn first(&self) -> Option<&ChainLink> {
        self.chain.first()
    }

    pub fn last(&self) -> Option<&ChainLink> {
        self.chain.last()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn shape(&self) -> Option<ArrayShape> {
        match (self.chain.first(), self.chain.last()) {
            (Some(first), Some(last)) => Some(ArrayShape::new(first.shape.rows.clone(), last.shape.cols.clone())),
            _ => None,
        }
    }

    /// The same array without its leftmost factor.
    pub fn without_first(&self) -> AbstractArray {
        Self {
            factor: self.factor,
            chain: self.chain.iter().skip(1).cloned().collect(),
        }
    }

    /// The same array without its rightmost factor.
    pub fn without_last(&self) -> AbstractArray {
        let n = self.chain.len().saturating_sub(1);
        Self {
            factor: self.factor,
            chain: self.chain[..n].to_vec(),
        }
    }

    /// Whether the array is linear in the forms it depends on: at most one non-transposed
    /// link may stand for a form.
    pub fn is_linear(&self, session: &Session) -> bool {
        self.chain
            .iter()
            .filter(|link| !link.transposed)
            .filter(|link| {
                matches!(
                    session.array(link.component).kind(),
                    ArrayKind::Vector { .. } | ArrayKind::WedgeVector { .. }
                )
            })
            .count()
            <= 1
    }

    pub fn sym_repr(&self, session: &Session) -> String {
        let factor = session.scalar(self.factor);
        let mut sym = match factor.value() {
            Some(x) if x == 1.0 && !self.chain.is_empty() => String::new(),
            _ => factor.sym().to_string(),
        };
        for link in &self.chain {
            sym.push_str(session.array(link.component).sym());
            if link.transposed {
                sym.push_str(&session.settings.repr.sym_ops.transpose);
            }
        }
        sym
    }

    pub fn lin_repr(&self, session: &Session) -> String {
        let ops = &session.settings.repr.lin_ops;
        let components = self
            .chain
            .iter()
            .map(|link| {
                let lin = session.array(link.component).lin();
                if link.transposed {
                    format!("{}{}", lin, ops.transpose)
                } else {
                    lin.to_string()
                }
            })
            .join(&ops.array_connector);
        format!(
            "{}{}{}",
            session.scalar(self.factor).lin(),
            ops.array_factor_separator,
            components
        )
    }
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn array(&self, id: ArrayId) -> &RootArray {
        &self.registry.arrays[id.0]
    }

    /// A link to a root array in an [`AbstractArray`] chain.
    pub fn link(&self, component: ArrayId, transposed: bool) -> ChainLink {
        let shape = self.array(component).shape();
        ChainLink {
            component,
            transposed,
            shape: if transposed { shape.transposed() } else { shape.clone() },
        }
    }

    /// The abstract array `1 · component`.
    pub fn single_array(&mut self, component: ArrayId) -> AbstractArray {
        let one = self.unit_scalar();
        AbstractArray {
            factor: one,
            chain: vec![self.link(component, false)],
        }
    }

    /// Registers a root array, or returns the array already registered with the same
    /// linguistic label.
    fn register_array(
        &mut self,
        sym: String,
        pure_lin: String,
        shape: ArrayShape,
        kind: ArrayKind,
    ) -> DerivationResult<ArrayId> {
        if let Some(existing) = self.registry.array_labels.by_lin(&pure_lin) {
            return Ok(existing);
        }
        self.registry.array_labels.check_available(&sym, &pure_lin)?;
        let lin = self.settings.repr.lin_wrappers.array.wrap(&pure_lin);
        let id = ArrayId(self.registry.arrays.len());
        self.registry.array_labels.insert(&sym, &pure_lin, id);
        debug!("Registered array {} of shape ({}, {})", pure_lin, shape.rows, shape.cols);
        push(
            &mut self.registry.arrays,
            RootArray {
                sym,
                lin,
                pure_lin,
                shape,
                kind,
            },
        );
        Ok(id)
    }

    /// Like `register_array`, but picks the symbol `sym_{n}` for the first free `n` when
    /// `sym` is taken.
    fn register_numbered_array(
        &mut self,
        sym: &str,
        pure_lin: String,
        shape: ArrayShape,
        kind: ArrayKind,
    ) -> DerivationResult<ArrayId> {
        if let Some(existing) = self.registry.array_labels.by_lin(&pure_lin) {
            return Ok(existing);
        }
        let labels = &self.registry.array_labels;
        let sym = (0..)
            .map(|n| if n == 0 { sym.to_string() } else { format!("{}_{{{}}}", sym, n) })
            .find(|s| !labels.contains_sym(s))
            .expect("there are always free labels");
        self.register_array(sym, pure_lin, shape, kind)
    }

    /// The coefficient vector of a root form in a finite space.
    pub fn form_vector(&mut self, f: FormId) -> DerivationResult<ArrayId> {
        let form = self.form(f);
        let Some(pure) = form.pure_lin() else {
            return Err(DerivationError::Unsupported(format!(
                "only root forms have coefficient vectors, {} is not a root form",
                form.lin()
            )));
        };
        let sym = self.settings.repr.sym_ops.vector.wrap(form.sym());
        let pure_lin = format!("{}{}", pure, self.settings.repr.lin_ops.vector_suffix);
        let rows = self.space_shape_label(form.space())?;
        self.register_array(sym, pure_lin, ArrayShape::new(rows, "1"), ArrayKind::Vector { form: f })
    }

    /// The mass matrix of a finite space.
    pub fn mass_matrix(&mut self, space: SpaceId) -> DerivationResult<ArrayId> {
        let label = self.space_shape_label(space)?;
        let s = self.space(space);
        let degree = s.degree().unwrap_or_default();
        let sym = format!(r"\mathsf{{M}}^{{({})}}", s.k());
        let pure_lin = format!("MassMat-{}-d{}", s.lin(), degree);
        let shape = ArrayShape::new(label.clone(), label);
        self.register_numbered_array(&sym, pure_lin, shape, ArrayKind::MassMatrix { space })
    }

    /// The incidence matrix of the exterior derivative acting on a finite space.
    pub fn incidence_matrix(&mut self, space: SpaceId) -> DerivationResult<ArrayId> {
        let target = self.space_d(space)?;
        let cols = self.space_shape_label(space)?;
        let rows = self.space_shape_label(target)?;
        let s = self.space(space);
        let degree = s.degree().unwrap_or_default();
        let sym = format!(r"\mathsf{{D}}^{{({},{})}}", s.k() + 1, s.k());
        let pure_lin = format!("dMat-{}-d{}", s.lin(), degree);
        self.register_numbered_array(&sym, pure_lin, ArrayShape::new(rows, cols), ArrayKind::IncidenceMatrix { space })
    }

    /// The vector of the boundary pairing `<tr ⋆g, tr v>` for all test functions `v` of a
    /// finite space.
    pub fn wedge_vector(&mut self, g: FormId, test_space: SpaceId) -> DerivationResult<ArrayId> {
        let rows = self.space_shape_label(test_space)?;
        let form = self.form(g);
        let Some(pure) = form.pure_lin() else {
            return Err(DerivationError::Unsupported(format!(
                "boundary vector of the non-root form {}",
                form.lin()
            )));
        };
        let degree = self.space(test_space).degree().unwrap_or_default();
        let sym = format!(r"\boldsymbol{{b}}_{{{}}}", form.sym());
        let pure_lin = format!("WedgeVec:traceHodge[{}]-wedge-d{}", pure, degree);
        self.register_array(
            sym,
            pure_lin,
            ArrayShape::new(rows, "1"),
            ArrayKind::WedgeVector { form: g, test_space },
        )
    }
}
