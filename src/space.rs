//! Spaces of scalar-valued k-forms on a mesh.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{push, MeshId, SpaceId};
use crate::session::Session;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

/// Orientation of the forms in a space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Inner,
    Outer,
    Unknown,
}

impl Orientation {
    /// The orientation of the Hodge dual.
    pub fn dual(self) -> Orientation {
        match self {
            Orientation::Inner => Orientation::Outer,
            Orientation::Outer => Orientation::Inner,
            Orientation::Unknown => Orientation::Unknown,
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Inner => "inner",
            Orientation::Outer => "outer",
            Orientation::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Orientation {
    type Err = DerivationError;

    fn from_str(s: &str) -> DerivationResult<Self> {
        match s {
            "inner" | "i" => Ok(Orientation::Inner),
            "outer" | "o" => Ok(Orientation::Outer),
            "unknown" | "None" => Ok(Orientation::Unknown),
            other => Err(DerivationError::InvalidRepresentation(format!(
                "orientation must be one of inner, i, outer, o, unknown or None, got \"{}\"",
                other
            ))),
        }
    }
}

/// The space of k-forms of a given orientation on a mesh.
///
/// A space becomes *finite* once it is given a polynomial degree, which is required before any
/// of its forms can be represented as arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    mesh: MeshId,
    k: usize,
    orientation: Orientation,
    degree: Option<usize>,
    sym: String,
    lin: String,
}

impl Space {
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn degree(&self) -> Option<usize> {
        self.degree
    }

    pub fn is_finite(&self) -> bool {
        self.degree.is_some()
    }

    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn space(&self, id: SpaceId) -> &Space {
        &self.registry.spaces[id.0]
    }

    /// Returns the space of `k`-forms with the given orientation on a mesh.
    ///
    /// Spaces are unique: asking twice for the same space returns the same id.
    pub fn new_space(&mut self, mesh: MeshId, k: usize, orientation: Orientation) -> DerivationResult<SpaceId> {
        self.space_with_degree(mesh, k, orientation, None)
    }

    fn space_with_degree(
        &mut self,
        mesh: MeshId,
        k: usize,
        orientation: Orientation,
        degree: Option<usize>,
    ) -> DerivationResult<SpaceId> {
        let m = self.mesh(mesh);
        if k > m.ndim() {
            return Err(DerivationError::StructuralMismatch(format!(
                "cannot have {}-forms on the {}-dimensional mesh {}",
                k,
                m.ndim(),
                m.pure_lin()
            )));
        }
        let tag = match orientation {
            Orientation::Inner => "-inner",
            Orientation::Outer => "-outer",
            Orientation::Unknown => "",
        };
        let lin = format!("Lambda{}-k{}-over-{}", tag, k, m.pure_lin());
        if let Some(&existing) = self.registry.space_by_lin.get(&lin) {
            if let Some(degree) = degree {
                self.set_space_degree(existing, degree)?;
            }
            return Ok(existing);
        }
        let base = match orientation {
            Orientation::Inner => r"\widetilde\Lambda",
            Orientation::Outer => r"\Lambda",
            Orientation::Unknown => r"\Lambda_{?}",
        };
        let sym = format!("{}^{{({})}}({})", base, k, m.sym());
        let id = SpaceId(self.registry.spaces.len());
        self.registry.space_by_lin.insert(lin.clone(), id);
        debug!("Registered space {}", lin);
        push(
            &mut self.registry.spaces,
            Space {
                mesh,
                k,
                orientation,
                degree,
                sym,
                lin,
            },
        );
        Ok(id)
    }

    /// Gives a polynomial degree to one space.
    ///
    /// The degree of a space can be set only once; setting the same degree again is a no-op.
    pub fn set_space_degree(&mut self, space: SpaceId, degree: usize) -> DerivationResult<()> {
        let s = &mut self.registry.spaces[space.0];
        match s.degree {
            None => {
                s.degree = Some(degree);
                Ok(())
            }
            Some(d) if d == degree => Ok(()),
            Some(d) => Err(DerivationError::InvalidState(format!(
                "space {} is already finite with degree {}, cannot change it to {}",
                s.lin, d, degree
            ))),
        }
    }

    /// Makes every existing space finite with the given degree.
    pub fn finite(&mut self, degree: usize) -> DerivationResult<()> {
        for i in 0..self.registry.spaces.len() {
            self.set_space_degree(SpaceId(i), degree)?;
        }
        Ok(())
    }

    /// Label of the rows of arrays indexed by the degrees of freedom of a finite space.
    pub(crate) fn space_shape_label(&self, space: SpaceId) -> DerivationResult<String> {
        let s = self.space(space);
        match s.degree {
            Some(degree) => Ok(format!("{}-{}", s.lin, degree)),
            None => Err(DerivationError::InvalidState(format!(
                "space {} is not finite",
                s.lin
            ))),
        }
    }

    /// The space that the exterior derivative maps into.
    pub fn space_d(&mut self, space: SpaceId) -> DerivationResult<SpaceId> {
        let s = self.space(space).clone();
        let ndim = self.mesh(s.mesh).ndim();
        if s.k >= ndim {
            return Err(DerivationError::Unsupported(format!(
                "exterior derivative of {}-forms on a {}-dimensional mesh",
                s.k, ndim
            )));
        }
        self.space_with_degree(s.mesh, s.k + 1, s.orientation, s.degree)
    }

    /// The space that the codifferential maps into.
    pub fn space_codifferential(&mut self, space: SpaceId) -> DerivationResult<SpaceId> {
        let s = self.space(space).clone();
        if s.k == 0 {
            return Err(DerivationError::Unsupported("codifferential of 0-forms".to_string()));
        }
        self.space_with_degree(s.mesh, s.k - 1, s.orientation, s.degree)
    }

    /// The space that the Hodge star maps into. The orientation is flipped.
    pub fn space_hodge(&mut self, space: SpaceId) -> DerivationResult<SpaceId> {
        let s = self.space(space).clone();
        let ndim = self.mesh(s.mesh).ndim();
        self.space_with_degree(s.mesh, ndim - s.k, s.orientation.dual(), s.degree)
    }

    /// The space of traces on the boundary mesh.
    pub fn space_trace(&mut self, space: SpaceId) -> DerivationResult<SpaceId> {
        let s = self.space(space).clone();
        let boundary = self
            .mesh_boundary(s.mesh)?
            .ok_or_else(|| DerivationError::Unsupported(format!("trace of forms in {}: mesh has no boundary", s.lin)))?;
        if s.k > self.mesh(boundary).ndim() {
            return Err(DerivationError::Unsupported(format!(
                "trace of {}-forms on the {}-dimensional boundary",
                s.k,
                self.mesh(boundary).ndim()
            )));
        }
        self.space_with_degree(boundary, s.k, s.orientation, s.degree)
    }

    /// The space of wedge products of forms from two spaces on the same mesh.
    pub fn space_wedge(&mut self, a: SpaceId, b: SpaceId) -> DerivationResult<SpaceId> {
        let (sa, sb) = (self.space(a).clone(), self.space(b).clone());
        if sa.mesh != sb.mesh {
            return Err(DerivationError::StructuralMismatch(format!(
                "wedge product of forms in {} and {} on different meshes",
                sa.lin, sb.lin
            )));
        }
        let ndim = self.mesh(sa.mesh).ndim();
        if sa.k + sb.k > ndim {
            return Err(DerivationError::Unsupported(format!(
                "wedge product of a {}-form and a {}-form on a {}-dimensional mesh",
                sa.k, sb.k, ndim
            )));
        }
        let orientation = if sa.orientation == sb.orientation {
            sa.orientation
        } else {
            Orientation::Unknown
        };
        self.space_with_degree(sa.mesh, sa.k + sb.k, orientation, sa.degree.or(sb.degree))
    }
}
