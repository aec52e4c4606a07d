//! Configuration of a derivation session.
//!
//! All textual conventions (wrappers around linguistic labels, operator glyphs and default
//! labels) live here so that a session can be configured from e.g. a JSON file. Every struct
//! deserializes with defaults for missing fields.
use serde::{Deserialize, Serialize};

/// Settings for a [`Session`](crate::session::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Dimension of the space that manifolds are embedded in.
    pub embedding_space_dim: usize,
    pub repr: ReprSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            embedding_space_dim: 3,
            repr: ReprSettings::default(),
        }
    }
}

/// A pair of strings placed around a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub start: String,
    pub end: String,
}

impl Wrapper {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn wrap(&self, inner: &str) -> String {
        format!("{}{}{}", self.start, inner, self.end)
    }
}

/// Three strings placed around and between two labels, as in `start a middle b end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infix {
    pub start: String,
    pub middle: String,
    pub end: String,
}

impl Infix {
    pub fn new(start: &str, middle: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            middle: middle.to_string(),
            end: end.to_string(),
        }
    }

    pub fn join(&self, a: &str, b: &str) -> String {
        format!("{}{}{}{}{}", self.start, a, self.middle, b, self.end)
    }
}

/// Symbolic and linguistic label of a default-labelled entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPair {
    pub sym: String,
    pub lin: String,
}

impl LabelPair {
    fn new(sym: &str, lin: &str) -> Self {
        Self {
            sym: sym.to_string(),
            lin: lin.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprSettings {
    pub lin_wrappers: LinWrappers,
    pub lin_ops: LinOperators,
    pub sym_ops: SymOperators,
    pub defaults: DefaultLabels,
}

impl Default for ReprSettings {
    fn default() -> Self {
        Self {
            lin_wrappers: LinWrappers::default(),
            lin_ops: LinOperators::default(),
            sym_ops: SymOperators::default(),
            defaults: DefaultLabels::default(),
        }
    }
}

/// Wrappers placed around the linguistic label of each kind of root entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinWrappers {
    pub form: Wrapper,
    pub scalar: Wrapper,
    pub time_sequence: Wrapper,
    pub time_interval: Wrapper,
    pub time_instant: Wrapper,
    pub array: Wrapper,
    pub mesh: Wrapper,
    pub manifold: Wrapper,
}

impl Default for LinWrappers {
    fn default() -> Self {
        Self {
            form: Wrapper::new(r"\textsf{", "}"),
            scalar: Wrapper::new(r"\textsc{", "}"),
            time_sequence: Wrapper::new(r"\textit{", "}"),
            time_interval: Wrapper::new(r"\texttt{", "}"),
            time_instant: Wrapper::new(r"\textsl{", "}"),
            array: Wrapper::new(r"\textbf{", "}"),
            mesh: Wrapper::new(r"\textrm{", "}"),
            manifold: Wrapper::new(r"\underline{", "}"),
        }
    }
}

/// Glyphs used when composing linguistic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinOperators {
    pub plus: String,
    pub minus: String,
    pub wedge: String,
    pub hodge: String,
    pub d: String,
    pub codifferential: String,
    pub time_derivative: String,
    pub trace: String,
    pub inner_product: Infix,
    pub duality_pairing: Infix,
    pub division: String,
    pub multiply: String,
    pub evaluate_at: String,
    pub transpose: String,
    /// Placed around non-root operands of unary operators.
    pub non_root: Wrapper,
    pub array_factor_separator: String,
    pub array_connector: String,
    pub vector_suffix: String,
}

impl Default for LinOperators {
    fn default() -> Self {
        Self {
            plus: r" $+$ ".to_string(),
            minus: r" $-$ ".to_string(),
            wedge: r" $\wedge$ ".to_string(),
            hodge: r"$\star$ ".to_string(),
            d: r"$\mathrm{d}$ ".to_string(),
            codifferential: r"$\mathrm{d}^{\ast}$ ".to_string(),
            time_derivative: r"$\partial_{t}$ ".to_string(),
            trace: r"\emph{tr} ".to_string(),
            inner_product: Infix::new(r"$($", r"\emph{,} ", r"$)$ \emph{over} "),
            duality_pairing: Infix::new(r"$<$", r"\emph{,} ", r"$>$ \emph{over} "),
            division: r" \emph{divided by} ".to_string(),
            multiply: r" \emph{multiply} ".to_string(),
            evaluate_at: "@".to_string(),
            transpose: "-transpose".to_string(),
            non_root: Wrapper::new(r"\{", r"\}"),
            array_factor_separator: r"\{*\}".to_string(),
            array_connector: r"\{@\}".to_string(),
            vector_suffix: "+vec".to_string(),
        }
    }
}

/// Glyphs used when composing symbolic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymOperators {
    pub plus: String,
    pub minus: String,
    pub wedge: String,
    pub hodge: String,
    pub d: String,
    pub codifferential: String,
    pub time_derivative: String,
    pub trace: String,
    pub inner_product: Infix,
    pub duality_pairing: Infix,
    pub division: Infix,
    pub evaluate_at: Infix,
    pub vector: Wrapper,
    pub transpose: String,
    /// Placed around non-root operands of unary operators.
    pub non_root: Wrapper,
}

impl Default for SymOperators {
    fn default() -> Self {
        Self {
            plus: "+".to_string(),
            minus: "-".to_string(),
            wedge: r"{\wedge}".to_string(),
            hodge: r"{\star}".to_string(),
            d: r"\mathrm{d}".to_string(),
            codifferential: r"\mathrm{d}^{\ast}".to_string(),
            time_derivative: r"\partial_{t}".to_string(),
            trace: r"\mathrm{tr}".to_string(),
            inner_product: Infix::new(r"\left(", ",", r"\right)"),
            duality_pairing: Infix::new(r"\left<", ",", r"\right>"),
            division: Infix::new(r"\dfrac{", "}{", "}"),
            evaluate_at: Infix::new(r"\left.", r"\right|^{(", ")}"),
            vector: Wrapper::new(r"\vec{", "}"),
            transpose: r"^{\mathsf{T}}".to_string(),
            non_root: Wrapper::new(r"\left(", r"\right)"),
        }
    }
}

/// Labels given to entities that are created without explicit labels.
///
/// The second and later entity of a kind gets a numbered variant of the default label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultLabels {
    pub manifold: LabelPair,
    pub mesh: LabelPair,
    pub time_sequence: LabelPair,
    pub time_interval_sym: String,
}

impl Default for DefaultLabels {
    fn default() -> Self {
        Self {
            manifold: LabelPair::new(r"\mathcal{M}", "Manifold"),
            mesh: LabelPair::new(r"\mathfrak{M}", "Mesh"),
            time_sequence: LabelPair::new(r"\mathtt{T}^S", "Ts"),
            time_interval_sym: r"\Delta t".to_string(),
        }
    }
}
