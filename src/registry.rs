//! Arena storage and label indices for all entities of a session.
//!
//! Entities are referred to by small `Copy` ids into the arenas. Root entities additionally
//! have their labels recorded in a [`LabelIndex`], which guarantees that no two root
//! entities of the same kind share a symbolic or linguistic label.
use crate::array::RootArray;
use crate::error::{DerivationError, DerivationResult};
use crate::form::{Form, FormExpr};
use crate::mesh::{Manifold, Mesh};
use crate::scalar::ConstantScalar;
use crate::space::Space;
use crate::time_sequence::{AbstractTimeInstant, AbstractTimeInterval, AbstractTimeSequence};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

macro_rules! entity_id {
    ($($(#[$attr:meta])* $name:ident;)*) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            pub struct $name(pub(crate) usize);

            impl $name {
                /// Position of the entity in its arena.
                pub fn index(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

entity_id! {
    ManifoldId;
    MeshId;
    SpaceId;
    /// Identifies a root or derived form.
    FormId;
    /// Identifies a constant (real or abstract) scalar.
    ScalarId;
    TimeSequenceId;
    InstantId;
    IntervalId;
    /// Identifies a root array (vector, matrix) in the algebraic representation.
    ArrayId;
}

/// The kinds of entities held by a [`Registry`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Manifold,
    Mesh,
    Space,
    Form,
    Scalar,
    TimeSequence,
    TimeInstant,
    TimeInterval,
    Array,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Manifold => "manifold",
            EntityKind::Mesh => "mesh",
            EntityKind::Space => "space",
            EntityKind::Form => "form",
            EntityKind::Scalar => "scalar",
            EntityKind::TimeSequence => "time sequence",
            EntityKind::TimeInstant => "time instant",
            EntityKind::TimeInterval => "time interval",
            EntityKind::Array => "array",
        };
        write!(f, "{}", name)
    }
}

const FORBIDDEN_LIN_CHARS: [char; 4] = ['{', '$', '\\', '}'];

/// Checks the labels a user supplies for a new root entity.
///
/// The linguistic label must be non-empty and must not contain any of `{`, `$`, `\` or `}`,
/// since those are used by the wrappers and operators of composed labels. The symbolic label
/// must contain something other than whitespace.
pub fn validate_root_labels(kind: EntityKind, sym: &str, lin: &str) -> DerivationResult<()> {
    if sym.chars().all(char::is_whitespace) {
        return Err(DerivationError::InvalidRepresentation(format!(
            "symbolic label of a {} must not be blank",
            kind
        )));
    }
    if lin.is_empty() {
        return Err(DerivationError::InvalidRepresentation(format!(
            "linguistic label of a {} must not be empty",
            kind
        )));
    }
    if let Some(c) = lin.chars().find(|c| FORBIDDEN_LIN_CHARS.contains(c)) {
        return Err(DerivationError::InvalidRepresentation(format!(
            "linguistic label \"{}\" of a {} contains the reserved character '{}'",
            lin, kind, c
        )));
    }
    Ok(())
}

/// Symbolic and linguistic label lookup for the root entities of one kind.
#[derive(Debug, Clone)]
pub struct LabelIndex<Id> {
    kind: EntityKind,
    by_sym: FxHashMap<String, Id>,
    by_lin: FxHashMap<String, Id>,
}

impl<Id: Copy> LabelIndex<Id> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            by_sym: FxHashMap::default(),
            by_lin: FxHashMap::default(),
        }
    }

    pub fn by_sym(&self, sym: &str) -> Option<Id> {
        self.by_sym.get(sym).copied()
    }

    pub fn by_lin(&self, lin: &str) -> Option<Id> {
        self.by_lin.get(lin).copied()
    }

    pub fn contains_sym(&self, sym: &str) -> bool {
        self.by_sym.contains_key(sym)
    }

    pub fn contains_lin(&self, lin: &str) -> bool {
        self.by_lin.contains_key(lin)
    }

    /// Fails with [`DerivationError::IdentityConflict`] if either label is taken.
    pub fn check_available(&self, sym: &str, lin: &str) -> DerivationResult<()> {
        if self.contains_sym(sym) {
            Err(DerivationError::IdentityConflict {
                kind: self.kind,
                label: sym.to_string(),
            })
        } else if self.contains_lin(lin) {
            Err(DerivationError::IdentityConflict {
                kind: self.kind,
                label: lin.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Records the labels of a new root entity. The labels must have been checked.
    pub fn insert(&mut self, sym: &str, lin: &str, id: Id) {
        debug_assert!(self.check_available(sym, lin).is_ok());
        self.by_sym.insert(sym.to_string(), id);
        self.by_lin.insert(lin.to_string(), id);
    }

    pub fn len(&self) -> usize {
        self.by_lin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lin.is_empty()
    }
}

/// Finds the first free numbered variant of a default label pair.
///
/// Variant 0 is the pair itself, variant `n` appends `_{n}` to the symbolic label and `n` to the
/// linguistic one.
pub(crate) fn next_free_labels<Id: Copy>(index: &LabelIndex<Id>, sym: &str, lin: &str) -> (String, String) {
    (0..)
        .map(|n| numbered_labels(sym, lin, n))
        .find(|(s, l)| !index.contains_sym(s) && !index.contains_lin(l))
        .expect("there are always free labels")
}

pub(crate) fn numbered_labels(sym: &str, lin: &str, n: usize) -> (String, String) {
    if n == 0 {
        (sym.to_string(), lin.to_string())
    } else {
        (format!("{}_{{{}}}", sym, n), format!("{}{}", lin, n))
    }
}

/// Storage for every entity created in a session.
///
/// Entries are only ever added. Accessors panic when given an id that was issued by a
/// different registry.
#[derive(Debug)]
pub struct Registry {
    pub(crate) manifolds: Vec<Manifold>,
    pub(crate) manifold_labels: LabelIndex<ManifoldId>,
    pub(crate) manifold_boundaries: FxHashMap<ManifoldId, ManifoldId>,
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) mesh_labels: LabelIndex<MeshId>,
    pub(crate) mesh_of_manifold: FxHashMap<ManifoldId, MeshId>,
    pub(crate) mesh_boundaries: FxHashMap<MeshId, MeshId>,
    pub(crate) spaces: Vec<Space>,
    pub(crate) space_by_lin: FxHashMap<String, SpaceId>,
    pub(crate) forms: Vec<Form>,
    pub(crate) form_labels: LabelIndex<FormId>,
    pub(crate) derived_forms: FxHashMap<FormExpr, FormId>,
    pub(crate) evaluations: FxHashMap<(FormId, InstantId), FormId>,
    pub(crate) scalars: Vec<ConstantScalar>,
    pub(crate) scalar_labels: LabelIndex<ScalarId>,
    pub(crate) derived_scalars: FxHashMap<String, ScalarId>,
    pub(crate) time_sequences: Vec<AbstractTimeSequence>,
    pub(crate) time_sequence_labels: LabelIndex<TimeSequenceId>,
    pub(crate) instants: Vec<AbstractTimeInstant>,
    pub(crate) intervals: Vec<AbstractTimeInterval>,
    pub(crate) interval_labels: LabelIndex<IntervalId>,
    pub(crate) arrays: Vec<RootArray>,
    pub(crate) array_labels: LabelIndex<ArrayId>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            manifolds: Vec::new(),
            manifold_labels: LabelIndex::new(EntityKind::Manifold),
            manifold_boundaries: FxHashMap::default(),
            meshes: Vec::new(),
            mesh_labels: LabelIndex::new(EntityKind::Mesh),
            mesh_of_manifold: FxHashMap::default(),
            mesh_boundaries: FxHashMap::default(),
            spaces: Vec::new(),
            space_by_lin: FxHashMap::default(),
            forms: Vec::new(),
            form_labels: LabelIndex::new(EntityKind::Form),
            derived_forms: FxHashMap::default(),
            evaluations: FxHashMap::default(),
            scalars: Vec::new(),
            scalar_labels: LabelIndex::new(EntityKind::Scalar),
            derived_scalars: FxHashMap::default(),
            time_sequences: Vec::new(),
            time_sequence_labels: LabelIndex::new(EntityKind::TimeSequence),
            instants: Vec::new(),
            intervals: Vec::new(),
            interval_labels: LabelIndex::new(EntityKind::TimeInterval),
            arrays: Vec::new(),
            array_labels: LabelIndex::new(EntityKind::Array),
        }
    }

    pub fn num_forms(&self) -> usize {
        self.forms.len()
    }

    pub fn num_root_forms(&self) -> usize {
        self.form_labels.len()
    }

    pub fn num_scalars(&self) -> usize {
        self.scalars.len()
    }

    pub fn num_arrays(&self) -> usize {
        self.arrays.len()
    }

    /// Looks up a root form by its linguistic label.
    pub fn find_root_form(&self, lin: &str) -> Option<FormId> {
        self.form_labels.by_lin(lin)
    }

    /// Ids of all root forms, in creation order.
    pub fn root_forms(&self) -> impl Iterator<Item = FormId> + '_ {
        self.forms
            .iter()
            .enumerate()
            .filter(|(_, form)| form.is_root())
            .map(|(i, _)| FormId(i))
    }
}

/// Pushes an entity and returns its position.
pub(crate) fn push<T>(arena: &mut Vec<T>, item: T) -> usize {
    arena.push(item);
    arena.len() - 1
}
