//! Time discretization of terms by differencing and averaging at abstract time instants.
use crate::error::{DerivationError, DerivationResult};
use crate::form::FormExpr;
use crate::ode::Ode;
use crate::registry::{FormId, InstantId, IntervalId, TimeSequenceId};
use crate::session::Session;
use crate::term::{SignedTerm, SimplePattern};
use crate::wf::{Side, WeakFormulation, WfEquation};
use log::debug;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Progress of a discretization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    TimeSequenceSet,
    InstantsDeclared,
    /// At least one term was differentiated or averaged.
    Modified,
}

/// Discretization state shared by ODEs and weak formulations, with terms addressed by keys
/// of type `K`.
#[derive(Debug, Clone)]
pub(crate) struct Discretizer<K> {
    stage: Stage,
    sequence: Option<TimeSequenceId>,
    instants: BTreeMap<String, InstantId>,
    modified: BTreeMap<K, SignedTerm>,
    unknowns: BTreeMap<K, FormId>,
}

impl<K: Copy + Ord + Debug> Discretizer<K> {
    pub fn new() -> Self {
        Self {
            stage: Stage::Uninitialized,
            sequence: None,
            instants: BTreeMap::new(),
            modified: BTreeMap::new(),
            unknowns: BTreeMap::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn time_sequence(&self) -> Option<TimeSequenceId> {
        self.sequence
    }

    pub fn set_time_sequence(&mut self, sequence: TimeSequenceId) -> DerivationResult<()> {
        if self.stage == Stage::Modified {
            return Err(DerivationError::InvalidState(
                "cannot change the time sequence after terms were discretized".to_string(),
            ));
        }
        if self.sequence != Some(sequence) {
            self.instants.clear();
        }
        self.sequence = Some(sequence);
        self.stage = if self.instants.is_empty() {
            Stage::TimeSequenceSet
        } else {
            Stage::InstantsDeclared
        };
        Ok(())
    }

    /// Declares the instants with the given keys. Keys declared before are kept as they are.
    pub fn define_instants(&mut self, session: &mut Session, keys: &[&str]) -> DerivationResult<Vec<InstantId>> {
        let sequence = self.sequence.ok_or_else(|| {
            DerivationError::InvalidState("set the time sequence before declaring time instants".to_string())
        })?;
        let mut instants = Vec::with_capacity(keys.len());
        for &key in keys {
            let instant = match self.instants.get(key) {
                Some(&instant) => instant,
                None => {
                    let instant = session.time_instant(sequence, key)?;
                    self.instants.insert(key.to_string(), instant);
                    instant
                }
            };
            instants.push(instant);
        }
        if self.stage < Stage::InstantsDeclared && !self.instants.is_empty() {
            self.stage = Stage::InstantsDeclared;
        }
        Ok(instants)
    }

    fn declared_instant(&self, key: &str) -> DerivationResult<InstantId> {
        self.instants
            .get(key)
            .copied()
            .ok_or_else(|| DerivationError::InvalidState(format!("time instant {} is not defined", key)))
    }

    fn interval(&self, session: &mut Session, start: &str, end: &str) -> DerivationResult<IntervalId> {
        let (start, end) = (self.declared_instant(start)?, self.declared_instant(end)?);
        session.time_interval_between(start, end)
    }

    /// The current version of the term at `key`.
    pub fn current(&self, key: K, original: &SignedTerm) -> SignedTerm {
        self.modified.get(&key).cloned().unwrap_or_else(|| original.clone())
    }

    /// Replaces `(∂t u, w)` by `((u@end - u@start) / Δt, w)` with `Δt` the interval from
    /// `start` to `end`. Both instants must have been declared.
    pub fn differentiate(
        &mut self,
        session: &mut Session,
        key: K,
        current: &SignedTerm,
        start: &str,
        end: &str,
    ) -> DerivationResult<()> {
        let term = &current.term;
        let u = match (session.term_pattern(term), *session.form(term.f1()).expr()) {
            (Some(SimplePattern::TimeDerivative), FormExpr::TimeDerivative(u)) => u,
            _ => {
                return Err(DerivationError::PatternMismatch(format!(
                    "cannot differentiate {}: it is not of the form (∂t u, w)",
                    term.lin()
                )))
            }
        };
        let interval = self.interval(session, start, end)?;
        let (start, end) = {
            let i = session.interval(interval);
            (i.start(), i.end())
        };
        let u_start = session.evaluate_at(u, start)?;
        let u_end = session.evaluate_at(u, end)?;
        let difference = session.form_sub(u_end, u_start)?;
        let quotient = session.form_divide(difference, interval)?;
        let new_term = session.make_term(term.kind(), quotient, term.f2())?;
        debug!("Differentiated term {:?}: {} -> {}", key, term.lin(), new_term.lin());
        self.modified.insert(key, SignedTerm::new(current.sign, new_term));
        self.unknowns.insert(key, u_end);
        self.stage = Stage::Modified;
        Ok(())
    }

    /// Replaces `form` in the term at `key` by the average of its evaluations at the given
    /// instants, declaring the instants if needed.
    pub fn average(
        &mut self,
        session: &mut Session,
        key: K,
        current: &SignedTerm,
        form: FormId,
        keys: &[&str],
    ) -> DerivationResult<()> {
        if keys.is_empty() {
            return Err(DerivationError::StructuralMismatch(
                "averaging needs at least one time instant".to_string(),
            ));
        }
        let term = &current.term;
        if !session.form_contains(term.f1(), form) && !session.form_contains(term.f2(), form) {
            return Err(DerivationError::PatternMismatch(format!(
                "{} does not occur in {}",
                session.form(form).lin(),
                term.lin()
            )));
        }
        let instants = self.define_instants(session, keys)?;
        let mut evaluations = Vec::with_capacity(instants.len());
        for instant in instants {
            evaluations.push(session.evaluate_at(form, instant)?);
        }
        let mut average = evaluations[0];
        for &f in &evaluations[1..] {
            average = session.form_add(average, f)?;
        }
        if evaluations.len() > 1 {
            average = session.form_divide(average, evaluations.len() as f64)?;
        }
        let (sign, new_term) = session.replace_in_term(term, form, average)?;
        debug!("Averaged term {:?}: {} -> {}", key, term.lin(), new_term.lin());
        self.modified
            .insert(key, SignedTerm::new(current.sign.compose(sign), new_term));
        self.stage = Stage::Modified;
        Ok(())
    }

    /// The forms made unknown by `differentiate`, ordered by key, without repetitions.
    pub fn unknowns(&self) -> Vec<FormId> {
        let mut unknowns: Vec<FormId> = Vec::new();
        for &u in self.unknowns.values() {
            if !unknowns.contains(&u) {
                unknowns.push(u);
            }
        }
        unknowns
    }
}

/// Time discretization of an [`Ode`].
#[derive(Debug, Clone)]
pub struct OdeDiscretization {
    ode: Ode,
    core: Discretizer<usize>,
}

impl OdeDiscretization {
    pub(crate) fn new(ode: Ode) -> Self {
        Self {
            ode,
            core: Discretizer::new(),
        }
    }

    pub fn ode(&self) -> &Ode {
        &self.ode
    }

    pub fn stage(&self) -> Stage {
        self.core.stage()
    }

    pub fn time_sequence(&self) -> Option<TimeSequenceId> {
        self.core.time_sequence()
    }

    pub fn set_time_sequence(&mut self, sequence: TimeSequenceId) -> DerivationResult<()> {
        self.core.set_time_sequence(sequence)
    }

    /// Creates a time sequence with default labels and uses it.
    pub fn new_time_sequence(&mut self, session: &mut Session) -> DerivationResult<TimeSequenceId> {
        let sequence = session.new_time_sequence()?;
        self.core.set_time_sequence(sequence)?;
        Ok(sequence)
    }

    /// For example `&["k-1", "k-1/2", "k"]`.
    pub fn define_abstract_time_instants(&mut self, session: &mut Session, keys: &[&str]) -> DerivationResult<()> {
        self.core.define_instants(session, keys).map(|_| ())
    }

    /// The current version of the term at `index`.
    pub fn get(&self, index: &str) -> DerivationResult<SignedTerm> {
        let j = self.ode.parse_index(index)?;
        Ok(self.core.current(j, &self.ode.term_at(j).signed_term()))
    }

    pub fn differentiate(
        &mut self,
        session: &mut Session,
        index: &str,
        start: &str,
        end: &str,
    ) -> DerivationResult<()> {
        let j = self.ode.parse_index(index)?;
        let current = self.core.current(j, &self.ode.term_at(j).signed_term());
        self.core.differentiate(session, j, &current, start, end)
    }

    pub fn average(&mut self, session: &mut Session, index: &str, form: FormId, keys: &[&str]) -> DerivationResult<()> {
        let j = self.ode.parse_index(index)?;
        let current = self.core.current(j, &self.ode.term_at(j).signed_term());
        self.core.average(session, j, &current, form, keys)
    }

    /// The discretized equation as a weak formulation with a single equation.
    ///
    /// Terms that were never modified are carried over unchanged. The forms made unknown by
    /// `differentiate` become the unknowns.
    pub fn finish(&self, session: &Session) -> DerivationResult<WeakFormulation> {
        let mut equation = WfEquation::default();
        for j in 0..self.ode.len() {
            let term = self.core.current(j, &self.ode.term_at(j).signed_term());
            match self.ode.position(j) {
                Some((Side::Left, _)) => equation.left.push(term),
                _ => equation.right.push(term),
            }
        }
        let wf = WeakFormulation::new(session, vec![equation], vec![self.ode.test_form()])?;
        let unknowns = self.core.unknowns();
        if unknowns.is_empty() {
            Ok(wf)
        } else {
            wf.with_unknowns(session, &unknowns)
        }
    }
}
