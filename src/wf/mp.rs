//! Block assembly of algebraic proxies.
//!
//! After the test vectors are stripped, the terms of every equation are sorted into sections
//! `A x`, where `A` is a block matrix and `x` a block vector of unknowns, and the remaining
//! terms of known data. Each call to [`MatrixProxy::parse`] moves the terms that end with one
//! of the given targets into a new section and returns a new proxy.
//!
//! Blocks are addressed by `"a-b"` or `"a-b,c"`: `a` counts the left sections, the left
//! remainder (if not empty), the right sections and the right remainder (if not empty), in this
//! order. `b` addresses a row of a block vector (for a section, of its unknowns) and `b,c` a
//! cell of a section's matrix.
use crate::array::{AbstractArray, ArrayKind, ArrayShape};
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{ArrayId, FormId};
use crate::session::Session;
use crate::sign::Sign;
use crate::wf::ap::{AlgebraicProxy, AlgebraicTerm};
use crate::wf::{Side, WeakFormulation};
use log::debug;
use serde::{Deserialize, Serialize};

/// Signed terms summed in one block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockCell {
    terms: Vec<AbstractArray>,
    signs: Vec<Sign>,
}

impl BlockCell {
    pub fn terms(&self) -> &[AbstractArray] {
        &self.terms
    }

    pub fn signs(&self) -> &[Sign] {
        &self.signs
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Sign, &AbstractArray)> {
        self.signs.iter().copied().zip(&self.terms)
    }

    /// The shape of the terms in the cell, if any term has one.
    pub fn shape(&self) -> Option<ArrayShape> {
        self.terms.iter().find_map(|t| t.shape())
    }

    /// Appends a term, which must have the shape of the terms already in the cell.
    pub fn push(&mut self, term: AbstractArray, sign: Sign) -> DerivationResult<()> {
        if let (Some(existing), Some(new)) = (self.shape(), term.shape()) {
            if existing != new {
                return Err(DerivationError::StructuralMismatch(format!(
                    "cannot add a term of shape ({}, {}) to a block of shape ({}, {})",
                    new.rows, new.cols, existing.rows, existing.cols
                )));
            }
        }
        self.terms.push(term);
        self.signs.push(sign);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockColVector {
    entries: Vec<BlockCell>,
}

impl BlockColVector {
    pub fn new(rows: usize) -> Self {
        Self {
            entries: vec![BlockCell::default(); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, i: usize) -> Option<&BlockCell> {
        self.entries.get(i)
    }

    pub fn entries(&self) -> &[BlockCell] {
        &self.entries
    }

    /// Whether all entries are empty.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(BlockCell::is_empty)
    }

    pub fn push(&mut self, i: usize, term: AbstractArray, sign: Sign) -> DerivationResult<()> {
        let rows = self.rows();
        self.entries
            .get_mut(i)
            .ok_or_else(|| DerivationError::indexing(i.to_string(), format!("block vector has {} rows", rows)))?
            .push(term, sign)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<BlockCell>,
}

impl BlockMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: vec![BlockCell::default(); rows * cols],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&BlockCell> {
        if i < self.rows && j < self.cols {
            self.entries.get(i * self.cols + j)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(BlockCell::is_empty)
    }

    pub fn push(&mut self, i: usize, j: usize, term: AbstractArray, sign: Sign) -> DerivationResult<()> {
        if i >= self.rows || j >= self.cols {
            return Err(DerivationError::indexing(
                format!("{},{}", i, j),
                format!("block matrix has shape ({}, {})", self.rows, self.cols),
            ));
        }
        self.entries[i * self.cols + j].push(term, sign)
    }
}

/// Something whose coefficient vector can be moved into a block matrix section.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    Form(FormId),
    Array(ArrayId),
}

impl From<FormId> for Target {
    fn from(f: FormId) -> Self {
        Target::Form(f)
    }
}

impl From<ArrayId> for Target {
    fn from(a: ArrayId) -> Self {
        Target::Array(a)
    }
}

/// A block matrix times a block vector of unknowns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub matrix: BlockMatrix,
    pub unknowns: BlockColVector,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssemblyStatus {
    /// No term was moved into a section yet.
    Unassembled,
    /// Some terms are in sections, and some known data remains.
    PartiallyAssembled,
    /// Every term is in a section.
    Assembled,
}

enum Block<'a> {
    Section(&'a Section),
    Remainder(&'a BlockColVector),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixProxy {
    num_equations: usize,
    test_vectors: Vec<ArrayId>,
    unknowns: Vec<ArrayId>,
    left_sections: Vec<Section>,
    right_sections: Vec<Section>,
    left_remainder: BlockColVector,
    right_remainder: BlockColVector,
}

impl MatrixProxy {
    /// Builds the algebraic proxy of a weak formulation and sorts out its unknowns.
    pub fn new(session: &mut Session, wf: &WeakFormulation) -> DerivationResult<Self> {
        let ap = wf.ap(session)?;
        Self::from_algebraic_proxy(session, &ap)
    }

    pub fn from_algebraic_proxy(session: &mut Session, ap: &AlgebraicProxy) -> DerivationResult<Self> {
        let mut equations = Vec::with_capacity(ap.num_equations());
        for equation in ap.equations() {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for (side, entry) in equation.iter() {
                let array = match &entry.term {
                    AlgebraicTerm::Array(array) => array.clone(),
                    AlgebraicTerm::Symbolic(term) => {
                        return Err(DerivationError::Unsupported(format!(
                            "term {} ({}) has no algebraic representation",
                            entry.index,
                            term.lin()
                        )))
                    }
                };
                match side {
                    Side::Left => left.push((entry.sign, array)),
                    Side::Right => right.push((entry.sign, array)),
                }
            }
            equations.push((left, right));
        }
        let proxy = Self::from_algebraic_terms(session, ap.test_vectors().to_vec(), equations)?;
        let targets: Vec<Target> = ap.unknowns().iter().map(|&u| Target::Array(u)).collect();
        proxy.parse(session, &targets)
    }

    /// Builds an unassembled proxy from per-equation signed algebraic terms, each starting with
    /// the transposed test vector of its equation.
    pub fn from_algebraic_terms(
        session: &Session,
        test_vectors: Vec<ArrayId>,
        equations: Vec<(Vec<(Sign, AbstractArray)>, Vec<(Sign, AbstractArray)>)>,
    ) -> DerivationResult<Self> {
        if equations.len() != test_vectors.len() {
            return Err(DerivationError::StructuralMismatch(format!(
                "{} equations but {} test vectors",
                equations.len(),
                test_vectors.len()
            )));
        }
        let n = equations.len();
        let mut left_remainder = BlockColVector::new(n);
        let mut right_remainder = BlockColVector::new(n);
        for (i, (left, right)) in equations.into_iter().enumerate() {
            for (sign, term) in left {
                left_remainder.push(i, strip_test_vector(session, test_vectors[i], &term)?, sign)?;
            }
            for (sign, term) in right {
                right_remainder.push(i, strip_test_vector(session, test_vectors[i], &term)?, sign)?;
            }
        }
        Ok(Self {
            num_equations: n,
            test_vectors,
            unknowns: Vec::new(),
            left_sections: Vec::new(),
            right_sections: Vec::new(),
            left_remainder,
            right_remainder,
        })
    }

    pub fn num_equations(&self) -> usize {
        self.num_equations
    }

    pub fn test_vectors(&self) -> &[ArrayId] {
        &self.test_vectors
    }

    /// All targets parsed so far, in order.
    pub fn unknowns(&self) -> &[ArrayId] {
        &self.unknowns
    }

    pub fn left_sections(&self) -> &[Section] {
        &self.left_sections
    }

    pub fn right_sections(&self) -> &[Section] {
        &self.right_sections
    }

    pub fn left_remainder(&self) -> &BlockColVector {
        &self.left_remainder
    }

    pub fn right_remainder(&self) -> &BlockColVector {
        &self.right_remainder
    }

    pub fn status(&self) -> AssemblyStatus {
        if self.left_sections.is_empty() && self.right_sections.is_empty() {
            AssemblyStatus::Unassembled
        } else if self.left_remainder.is_empty() && self.right_remainder.is_empty() {
            AssemblyStatus::Assembled
        } else {
            AssemblyStatus::PartiallyAssembled
        }
    }

    /// Moves every remaining term whose last factor is one of the (non-transposed) target
    /// vectors into a new section per side.
    ///
    /// A side gets a section only if at least one of its terms moved.
    pub fn parse(&self, session: &mut Session, targets: &[Target]) -> DerivationResult<MatrixProxy> {
        let targets = targets
            .iter()
            .map(|&target| match target {
                Target::Form(f) => session.form_vector(f),
                Target::Array(a) => Ok(a),
            })
            .collect::<DerivationResult<Vec<_>>>()?;
        let mut unknown_vector = BlockColVector::new(targets.len());
        for (k, &target) in targets.iter().enumerate() {
            unknown_vector.push(k, session.single_array(target), Sign::Plus)?;
        }

        let mut next = self.clone();
        for side in [Side::Left, Side::Right] {
            let remainder = match side {
                Side::Left => &self.left_remainder,
                Side::Right => &self.right_remainder,
            };
            let mut matrix = BlockMatrix::new(self.num_equations, targets.len());
            let mut remaining = BlockColVector::new(self.num_equations);
            for (i, cell) in remainder.entries().iter().enumerate() {
                for (sign, term) in cell.iter() {
                    let column = term
                        .last()
                        .filter(|link| !link.is_transposed())
                        .and_then(|link| targets.iter().position(|&t| t == link.component()));
                    match column {
                        Some(k) => matrix.push(i, k, term.without_last(), sign)?,
                        None => remaining.push(i, term.clone(), sign)?,
                    }
                }
            }
            let (sections, next_remainder) = match side {
                Side::Left => (&mut next.left_sections, &mut next.left_remainder),
                Side::Right => (&mut next.right_sections, &mut next.right_remainder),
            };
            if !matrix.is_empty() {
                debug!("New {:?} section with {} unknowns", side, targets.len());
                sections.push(Section {
                    matrix,
                    unknowns: unknown_vector.clone(),
                });
            }
            *next_remainder = remaining;
        }
        for target in targets {
            if !next.unknowns.contains(&target) {
                next.unknowns.push(target);
            }
        }
        Ok(next)
    }

    fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks: Vec<Block<'_>> = self.left_sections.iter().map(Block::Section).collect();
        if !self.left_remainder.is_empty() {
            blocks.push(Block::Remainder(&self.left_remainder));
        }
        blocks.extend(self.right_sections.iter().map(Block::Section));
        if !self.right_remainder.is_empty() {
            blocks.push(Block::Remainder(&self.right_remainder));
        }
        blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks().len()
    }

    /// The cell at index `"a-b"` or `"a-b,c"`.
    pub fn get(&self, index: &str) -> DerivationResult<&BlockCell> {
        let illegal = |reason: &str| DerivationError::indexing(index, reason);
        let (block, local) = index
            .split_once('-')
            .ok_or_else(|| illegal("expected \"a-b\" or \"a-b,c\""))?;
        let block: usize = block.trim().parse().map_err(|_| illegal("block is not a non-negative integer"))?;
        let local = local
            .split(',')
            .map(|s| s.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| illegal("position is not a list of non-negative integers"))?;
        let blocks = self.blocks();
        let block = blocks
            .get(block)
            .ok_or_else(|| DerivationError::indexing(index, format!("there are only {} blocks", blocks.len())))?;
        let cell = match (block, local.as_slice()) {
            (Block::Section(section), &[i]) => section.unknowns.get(i),
            (Block::Section(section), &[i, j]) => section.matrix.get(i, j),
            (Block::Remainder(vector), &[i]) => vector.get(i),
            _ => return Err(illegal("wrong number of positions for this block")),
        };
        cell.ok_or_else(|| illegal("position out of range"))
    }

    /// A description of all blocks for a numeric backend.
    pub fn export(&self, session: &Session) -> AssembledSystem {
        let cell = |cell: &BlockCell| ExportedCell {
            terms: cell
                .iter()
                .map(|(sign, term)| export_term(session, sign, term))
                .collect(),
        };
        let vector = |v: &BlockColVector| v.entries().iter().map(cell).collect::<Vec<_>>();
        let section = |s: &Section| ExportedSection {
            matrix: (0..s.matrix.rows)
                .map(|i| {
                    (0..s.matrix.cols)
                        .filter_map(|j| s.matrix.get(i, j))
                        .map(cell)
                        .collect()
                })
                .collect(),
            unknowns: vector(&s.unknowns),
        };
        let labels = |ids: &[ArrayId]| -> Vec<String> {
            ids.iter()
                .map(|&a| session.array(a).lin().to_string())
                .collect()
        };
        AssembledSystem {
            unknowns: labels(&self.unknowns),
            test_vectors: labels(&self.test_vectors),
            left_sections: self.left_sections.iter().map(section).collect(),
            left_remainder: vector(&self.left_remainder),
            right_sections: self.right_sections.iter().map(section).collect(),
            right_remainder: vector(&self.right_remainder),
        }
    }
}

fn strip_test_vector(session: &Session, test_vector: ArrayId, term: &AbstractArray) -> DerivationResult<AbstractArray> {
    match term.first() {
        Some(link) if link.component() == test_vector && link.is_transposed() => Ok(term.without_first()),
        _ => Err(DerivationError::StructuralMismatch(format!(
            "cannot remove the test vector {} from {}",
            session.array(test_vector).lin(),
            term.lin_repr(session)
        ))),
    }
}

fn export_term(session: &Session, sign: Sign, term: &AbstractArray) -> ExportedTerm {
    let factor = session.scalar(term.factor());
    ExportedTerm {
        sign,
        factor: factor.lin().to_string(),
        factor_value: factor.value(),
        components: term
            .chain()
            .iter()
            .map(|link| {
                let array = session.array(link.component());
                ExportedComponent {
                    lin: array.lin().to_string(),
                    kind: array.kind(),
                    transposed: link.is_transposed(),
                    shape: link.shape().clone(),
                }
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedComponent {
    pub lin: String,
    pub kind: ArrayKind,
    pub transposed: bool,
    pub shape: ArrayShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTerm {
    pub sign: Sign,
    pub factor: String,
    pub factor_value: Option<f64>,
    pub components: Vec<ExportedComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCell {
    pub terms: Vec<ExportedTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSection {
    /// Rows of cells.
    pub matrix: Vec<Vec<ExportedCell>>,
    pub unknowns: Vec<ExportedCell>,
}

/// Serializable description of an assembled system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledSystem {
    pub unknowns: Vec<String>,
    pub test_vectors: Vec<String>,
    pub left_sections: Vec<ExportedSection>,
    pub left_remainder: Vec<ExportedCell>,
    pub right_sections: Vec<ExportedSection>,
    pub right_remainder: Vec<ExportedCell>,
}

impl WeakFormulation {
    /// The matrix proxy of this weak formulation.
    pub fn mp(&self, session: &mut Session) -> DerivationResult<MatrixProxy> {
        MatrixProxy::new(session, self)
    }
}
