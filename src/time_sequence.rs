//! Abstract and concrete time sequences.
//!
//! An [`AbstractTimeSequence`] hands out abstract time instants keyed by step strings such as
//! `"k-1"` and intervals between them, without committing to any numeric stepping. Once the
//! sequence is specified to a concrete [`TimeSequence`], its instants can be resolved to
//! numeric [`TimeInstant`]s.
use crate::error::{DerivationError, DerivationResult};
use crate::registry::{
    next_free_labels, push, validate_root_labels, EntityKind, InstantId, IntervalId, ScalarId, TimeSequenceId,
};
use crate::session::Session;
use log::debug;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

mod step;

pub use step::evaluate_step_key;

/// A numeric point in time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeInstant {
    time: OrderedFloat<f64>,
}

impl TimeInstant {
    pub fn new(time: f64) -> Self {
        Self {
            time: OrderedFloat(time),
        }
    }

    pub fn time(&self) -> f64 {
        self.time.0
    }
}

/// A numeric time interval of positive duration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    start: TimeInstant,
    end: TimeInstant,
}

impl TimeInterval {
    pub fn new(start: TimeInstant, end: TimeInstant) -> DerivationResult<Self> {
        if end <= start {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "interval [{}, {}] does not have a positive duration",
                start.time(),
                end.time()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> TimeInstant {
        self.start
    }

    pub fn end(&self) -> TimeInstant {
        self.end
    }

    pub fn dt(&self) -> f64 {
        self.end.time() - self.start.time()
    }
}

/// A concrete rule mapping (possibly fractional) steps to time instants.
pub trait TimeSequence: Debug {
    fn t_0(&self) -> f64;

    fn t_max(&self) -> f64;

    /// The time instant at step `k`, if `k` is a valid step of the sequence.
    fn instant(&self, k: f64) -> DerivationResult<TimeInstant>;
}

// Sub-step fractions are compared in units of 1e-8
const REMAINDER_UNITS: f64 = 1e8;

fn remainder_units(x: f64) -> i64 {
    let units = (x.rem_euclid(1.0) * REMAINDER_UNITS).round() as i64;
    units % REMAINDER_UNITS as i64
}

/// A sequence with a constant time step.
///
/// The interval `[t_0, t_max]` is divided into `n` pieces and every step covers `factor` of
/// them, so `dt = (t_max - t_0) * factor / n`. Fractional steps are allowed at multiples of
/// `1 / factor`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantTimeSequence {
    t_0: f64,
    t_max: f64,
    n: usize,
    factor: usize,
    allowed_remainders: Vec<i64>,
}

impl ConstantTimeSequence {
    pub fn new((t_0, t_max, n): (f64, f64, usize), factor: usize) -> DerivationResult<Self> {
        if !(t_max > t_0) {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "t_max = {} must be larger than t_0 = {}",
                t_max, t_0
            )));
        }
        if n == 0 || factor == 0 {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "number of intervals ({}) and factor ({}) must be positive",
                n, factor
            )));
        }
        let allowed_remainders = (0..factor)
            .map(|i| remainder_units(i as f64 / factor as f64))
            .collect();
        Ok(Self {
            t_0,
            t_max,
            n,
            factor,
            allowed_remainders,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn dt(&self) -> f64 {
        (self.t_max - self.t_0) * self.factor as f64 / self.n as f64
    }

    /// The largest valid step.
    pub fn k_max(&self) -> f64 {
        self.n as f64 / self.factor as f64
    }
}

impl TimeSequence for ConstantTimeSequence {
    fn t_0(&self) -> f64 {
        self.t_0
    }

    fn t_max(&self) -> f64 {
        self.t_max
    }

    fn instant(&self, k: f64) -> DerivationResult<TimeInstant> {
        let time = self.t_0 + k * self.dt();
        let tolerance = 1e-10 * (self.t_max - self.t_0);
        if time < self.t_0 - tolerance {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "step {} is at t = {}, before t_0 = {}",
                k, time, self.t_0
            )));
        }
        if time > self.t_max + tolerance {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "step {} is at t = {}, after t_max = {}",
                k, time, self.t_max
            )));
        }
        if !self.allowed_remainders.contains(&remainder_units(k)) {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "step {} is not a multiple of 1/{}",
                k, self.factor
            )));
        }
        Ok(TimeInstant::new(time))
    }
}

/// A time sequence whose instants are known only by their step keys.
#[derive(Debug)]
pub struct AbstractTimeSequence {
    sym: String,
    lin: String,
    pure_lin: String,
    specification: Option<Box<dyn TimeSequence>>,
    instants: FxHashMap<String, InstantId>,
    intervals: FxHashMap<(InstantId, InstantId), IntervalId>,
}

impl AbstractTimeSequence {
    pub fn sym(&self) -> &str {
        &self.sym
    }

    pub fn lin(&self) -> &str {
        &self.lin
    }

    pub fn pure_lin(&self) -> &str {
        &self.pure_lin
    }

    pub fn is_specified(&self) -> bool {
        self.specification.is_some()
    }

    pub fn specification(&self) -> Option<&dyn TimeSequence> {
        self.specification.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractTimeInstant {
    sequence: TimeSequenceId,
    key: String,
    sym: String,
    lin: String,
    pure_lin: String,
}

impl AbstractTimeInstant {
    pub fn sequence(&self) -> TimeSequenceId {
        self.sequence
    }

    /// The step key, e.g. `k-1`.
    pub fn key(&self) -> &str {
        &self.key
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractTimeInterval {
    sequence: TimeSequenceId,
    start: InstantId,
    end: InstantId,
    sym: String,
    lin: String,
    pure_lin: String,
    scalar: ScalarId,
}

impl AbstractTimeInterval {
    pub fn sequence(&self) -> TimeSequenceId {
        self.sequence
    }

    pub fn start(&self) -> InstantId {
        self.start
    }

    pub fn end(&self) -> InstantId {
        self.end
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

    /// The abstract scalar standing for the duration of the interval.
    pub fn scalar(&self) -> ScalarId {
        self.scalar
    }
}

const FORBIDDEN_KEY_CHARS: [char; 7] = ['{', '$', '\\', '}', '[', ']', ','];

fn validate_step_key(key: &str) -> DerivationResult<()> {
    if key.is_empty() || key.chars().any(|c| c.is_whitespace() || FORBIDDEN_KEY_CHARS.contains(&c)) {
        Err(DerivationError::InvalidRepresentation(format!(
            "\"{}\" is not a valid step key: keys must be non-empty and must not contain whitespace, \
             brackets, commas, '$' or '\\'",
            key
        )))
    } else {
        Ok(())
    }
}

impl Session {
    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn time_sequence(&self, id: TimeSequenceId) -> &AbstractTimeSequence {
        &self.registry.time_sequences[id.0]
    }

    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn instant(&self, id: InstantId) -> &AbstractTimeInstant {
        &self.registry.instants[id.0]
    }

    /// # Panics
    ///
    /// Panics if the id was not issued by this session.
    pub fn interval(&self, id: IntervalId) -> &AbstractTimeInterval {
        &self.registry.intervals[id.0]
    }

    /// Creates an abstract time sequence with default labels.
    pub fn new_time_sequence(&mut self) -> DerivationResult<TimeSequenceId> {
        let defaults = &self.settings.repr.defaults.time_sequence;
        let (sym, lin) = next_free_labels(&self.registry.time_sequence_labels, &defaults.sym, &defaults.lin);
        self.new_time_sequence_with_labels(&sym, &lin)
    }

    pub fn new_time_sequence_with_labels(&mut self, sym: &str, lin: &str) -> DerivationResult<TimeSequenceId> {
        validate_root_labels(EntityKind::TimeSequence, sym, lin)?;
        self.registry.time_sequence_labels.check_available(sym, lin)?;
        let id = TimeSequenceId(self.registry.time_sequences.len());
        self.registry.time_sequence_labels.insert(sym, lin, id);
        debug!("Registered abstract time sequence {}", lin);
        push(
            &mut self.registry.time_sequences,
            AbstractTimeSequence {
                sym: sym.to_string(),
                lin: self.settings.repr.lin_wrappers.time_sequence.wrap(lin),
                pure_lin: lin.to_string(),
                specification: None,
                instants: FxHashMap::default(),
                intervals: FxHashMap::default(),
            },
        );
        Ok(id)
    }

    /// The abstract instant of a sequence at the given step key.
    ///
    /// Asking twice for the same key returns the same instant.
    pub fn time_instant(&mut self, sequence: TimeSequenceId, key: &str) -> DerivationResult<InstantId> {
        if let Some(&instant) = self.time_sequence(sequence).instants.get(key) {
            return Ok(instant);
        }
        validate_step_key(key)?;
        let ts = self.time_sequence(sequence);
        let pure_lin = format!("{}[{}]", ts.pure_lin, key);
        let instant = AbstractTimeInstant {
            sequence,
            key: key.to_string(),
            sym: format!("{}[{}]", ts.sym, key),
            lin: self.settings.repr.lin_wrappers.time_instant.wrap(&pure_lin),
            pure_lin,
        };
        let id = InstantId(push(&mut self.registry.instants, instant));
        self.registry.time_sequences[sequence.0]
            .instants
            .insert(key.to_string(), id);
        Ok(id)
    }

    /// The abstract interval between the instants at two step keys of a sequence.
    pub fn time_interval(
        &mut self,
        sequence: TimeSequenceId,
        start_key: &str,
        end_key: &str,
    ) -> DerivationResult<IntervalId> {
        let start = self.time_instant(sequence, start_key)?;
        let end = self.time_instant(sequence, end_key)?;
        self.time_interval_between(start, end)
    }

    /// The abstract interval between two instants of the same sequence.
    ///
    /// Intervals are cached, so the same pair of instants always gives the same interval and
    /// the same duration scalar.
    pub fn time_interval_between(
        &mut self,
        start: InstantId,
        end: InstantId,
    ) -> DerivationResult<IntervalId> {
        let (s, e) = (self.instant(start), self.instant(end));
        if s.sequence != e.sequence {
            return Err(DerivationError::StructuralMismatch(format!(
                "instants {} and {} belong to different time sequences",
                s.pure_lin, e.pure_lin
            )));
        }
        if start == end {
            return Err(DerivationError::InvalidTimeInstant(format!(
                "interval from {} to itself",
                s.pure_lin
            )));
        }
        let sequence = s.sequence;
        if let Some(&interval) = self.time_sequence(sequence).intervals.get(&(start, end)) {
            return Ok(interval);
        }
        let ts = self.time_sequence(sequence);
        let pure_lin = format!("{}[{},{}]", ts.pure_lin, s.key, e.key);
        let lin = self.settings.repr.lin_wrappers.time_interval.wrap(&pure_lin);
        let base_sym = &self.settings.repr.defaults.time_interval_sym;
        let (labels, scalars) = (&self.registry.interval_labels, &self.registry.scalar_labels);
        let sym = (0..)
            .map(|n| {
                if n == 0 {
                    base_sym.clone()
                } else {
                    format!("{}_{{{}}}", base_sym, n)
                }
            })
            .find(|sym| !labels.contains_sym(sym) && !scalars.contains_sym(sym))
            .expect("there are always free labels");
        let scalar = self.abstract_scalar(&sym, &pure_lin)?;
        let id = IntervalId(self.registry.intervals.len());
        self.registry.interval_labels.insert(&sym, &pure_lin, id);
        debug!("Registered abstract time interval {}", pure_lin);
        push(
            &mut self.registry.intervals,
            AbstractTimeInterval {
                sequence,
                start,
                end,
                sym,
                lin,
                pure_lin,
                scalar,
            },
        );
        self.registry.time_sequences[sequence.0]
            .intervals
            .insert((start, end), id);
        Ok(id)
    }

    /// The abstract scalar standing for the duration of an interval.
    pub fn interval_scalar(&self, interval: IntervalId) -> ScalarId {
        self.interval(interval).scalar
    }

    /// Specifies an abstract time sequence to a concrete stepping rule.
    ///
    /// A sequence can be specified only once.
    pub fn specify_time_sequence(
        &mut self,
        sequence: TimeSequenceId,
        rule: Box<dyn TimeSequence>,
    ) -> DerivationResult<()> {
        let ts = &mut self.registry.time_sequences[sequence.0];
        if ts.specification.is_some() {
            return Err(DerivationError::InvalidState(format!(
                "time sequence {} is already specified",
                ts.pure_lin
            )));
        }
        debug!("Specified time sequence {} as {:?}", ts.pure_lin, rule);
        ts.specification = Some(rule);
        Ok(())
    }

    /// Resolves an abstract instant to a numeric instant of its specified sequence.
    ///
    /// The step key is evaluated with the given identifier bindings, e.g. `[("k", 2.0)]`.
    pub fn resolve_instant(&self, instant: InstantId, bindings: &[(&str, f64)]) -> DerivationResult<TimeInstant> {
        let i = self.instant(instant);
        let ts = self.time_sequence(i.sequence);
        let rule = ts.specification.as_deref().ok_or_else(|| {
            DerivationError::InvalidState(format!("time sequence {} is not specified", ts.pure_lin))
        })?;
        let k = evaluate_step_key(&i.key, bindings)?;
        rule.instant(k)
    }

    pub fn resolve_interval(&self, interval: IntervalId, bindings: &[(&str, f64)]) -> DerivationResult<TimeInterval> {
        let i = self.interval(interval);
        let start = self.resolve_instant(i.start, bindings)?;
        let end = self.resolve_instant(i.end, bindings)?;
        TimeInterval::new(start, end)
    }
}
