//! Manifolds and the meshes that cover them.
//!
//! Only the identity, dimension and boundary structure of manifolds and meshes matter for
//! the derivation, so these types carry labels and topology but no geometry.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{next_free_labels, push, validate_root_labels, EntityKind, ManifoldId, MeshId};
use crate::session::Session;
use log::debug;

/// An abstract manifold of fixed dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifold {
    ndim: usize,
    sym: String,
    lin: String,
    pure_lin: String,
    boundary_of: Option<ManifoldId>,
}

impl Manifold {
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    /// The linguistic label without its wrapper.
    pub fn pure_lin(&self) -> &str {
        &self.pure_lin
    }

    /// The manifold this manifold is the boundary of, if any.
    pub fn boundary_of(&self) -> Option<ManifoldId> {
        self.boundary_of
    }
}

/// A mesh covering a manifold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mesh {
    manifold: ManifoldId,
    ndim: usize,
    sym: String,
    lin: String,
    pure_lin: String,
    boundary_of: Option<MeshId>,
}

impl Mesh {
    pub fn manifold(&self) -> ManifoldId {
        self.manifold
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    pub fn pure_lin(&self) -> &str {
        &self.pure_lin
    }

    /// The mesh this mesh is the boundary of, if any.
    pub fn inclusion(&self) -> Option<MeshId> {
        self.boundary_of
    }
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn manifold(&self, id: ManifoldId) -> &Manifold {
        &self.registry.manifolds[id.0]
    }

    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.registry.meshes[id.0]
    }

    /// Creates a new manifold of dimension `ndim` with default labels.
    pub fn new_manifold(&mut self, ndim: usize) -> DerivationResult<ManifoldId> {
        let max_dim = self.settings.embedding_space_dim;
        if ndim > max_dim {
            return Err(DerivationError::Unsupported(format!(
                "cannot embed a manifold of dimension {} in a space of dimension {}",
                ndim, max_dim
            )));
        }
        let defaults = &self.settings.repr.defaults.manifold;
        let (sym, pure_lin) = next_free_labels(&self.registry.manifold_labels, &defaults.sym, &defaults.lin);
        Ok(self.register_manifold(ndim, sym, pure_lin, None))
    }

    fn register_manifold(
        &mut self,
        ndim: usize,
        sym: String,
        pure_lin: String,
        boundary_of: Option<ManifoldId>,
    ) -> ManifoldId {
        let lin = self.settings.repr.lin_wrappers.manifold.wrap(&pure_lin);
        let id = ManifoldId(self.registry.manifolds.len());
        self.registry.manifold_labels.insert(&sym, &pure_lin, id);
        debug!("Registered manifold {} of dimension {}", pure_lin, ndim);
        push(
            &mut self.registry.manifolds,
            Manifold {
                ndim,
                sym,
                lin,
                pure_lin,
                boundary_of,
            },
        );
        id
    }

    /// The boundary of a manifold, created on first request.
    ///
    /// Returns `None` for zero-dimensional manifolds.
    pub fn boundary_manifold(&mut self, manifold: ManifoldId) -> DerivationResult<Option<ManifoldId>> {
        if let Some(&boundary) = self.registry.manifold_boundaries.get(&manifold) {
            return Ok(Some(boundary));
        }
        let m = self.manifold(manifold);
        if m.ndim == 0 {
            return Ok(None);
        }
        let sym = format!(r"\partial{}", m.sym);
        let pure_lin = format!("boundary-of-{}", m.pure_lin);
        let ndim = m.ndim - 1;
        self.registry.manifold_labels.check_available(&sym, &pure_lin)?;
        let boundary = self.register_manifold(ndim, sym, pure_lin, Some(manifold));
        self.registry.manifold_boundaries.insert(manifold, boundary);
        Ok(Some(boundary))
    }

    /// Creates the mesh of a manifold with default labels.
    ///
    /// A manifold is covered by at most one mesh.
    pub fn new_mesh(&mut self, manifold: ManifoldId) -> DerivationResult<MeshId> {
        let defaults = &self.settings.repr.defaults.mesh;
        let (sym, lin) = next_free_labels(&self.registry.mesh_labels, &defaults.sym, &defaults.lin);
        self.new_mesh_with_labels(manifold, &sym, &lin)
    }

    pub fn new_mesh_with_labels(&mut self, manifold: ManifoldId, sym: &str, lin: &str) -> DerivationResult<MeshId> {
        validate_root_labels(EntityKind::Mesh, sym, lin)?;
        self.registry.mesh_labels.check_available(sym, lin)?;
        if let Some(&existing) = self.registry.mesh_of_manifold.get(&manifold) {
            return Err(DerivationError::InvalidState(format!(
                "manifold {} is already covered by mesh {}",
                self.manifold(manifold).pure_lin,
                self.mesh(existing).pure_lin
            )));
        }
        Ok(self.register_mesh(manifold, sym.to_string(), lin.to_string(), None))
    }

    fn register_mesh(
        &mut self,
        manifold: ManifoldId,
        sym: String,
        pure_lin: String,
        boundary_of: Option<MeshId>,
    ) -> MeshId {
        let lin = self.settings.repr.lin_wrappers.mesh.wrap(&pure_lin);
        let ndim = self.manifold(manifold).ndim;
        let id = MeshId(self.registry.meshes.len());
        self.registry.mesh_labels.insert(&sym, &pure_lin, id);
        self.registry.mesh_of_manifold.insert(manifold, id);
        debug!("Registered mesh {} of dimension {}", pure_lin, ndim);
        push(
            &mut self.registry.meshes,
            Mesh {
                manifold,
                ndim,
                sym,
                lin,
                pure_lin,
                boundary_of,
            },
        );
        id
    }

    /// The mesh of the boundary of the mesh's manifold, created on first request.
    ///
    /// Returns `None` if the manifold has no boundary.
    pub fn mesh_boundary(&mut self, mesh: MeshId) -> DerivationResult<Option<MeshId>> {
        if let Some(&boundary) = self.registry.mesh_boundaries.get(&mesh) {
            return Ok(Some(boundary));
        }
        let manifold = self.mesh(mesh).manifold;
        let Some(boundary_manifold) = self.boundary_manifold(manifold)? else {
            return Ok(None);
        };
        let m = self.mesh(mesh);
        let sym = format!(r"\eth{}", m.sym);
        let pure_lin = format!("boundary-of-{}", m.pure_lin);
        self.registry.mesh_labels.check_available(&sym, &pure_lin)?;
        let boundary = self.register_mesh(boundary_manifold, sym, pure_lin, Some(mesh));
        self.registry.mesh_boundaries.insert(mesh, boundary);
        Ok(Some(boundary))
    }
}
