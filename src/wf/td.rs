//! Time discretization over all equations of a weak formulation.
use crate::error::DerivationResult;
use crate::ode::discretize::Discretizer;
use crate::ode::Stage;
use crate::registry::{FormId, TimeSequenceId};
use crate::session::Session;
use crate::term::SignedTerm;
use crate::wf::{parse_term_index, WeakFormulation, WfEquation};

/// Differencing and averaging of the terms of a weak formulation, addressed by `"i-j"`.
#[derive(Debug, Clone)]
pub struct TimeDiscretization {
    wf: WeakFormulation,
    core: Discretizer<(usize, usize)>,
}

impl WeakFormulation {
    pub fn td(&self) -> TimeDiscretization {
        TimeDiscretization {
            wf: self.clone(),
            core: Discretizer::new(),
        }
    }
}

impl TimeDiscretization {
    pub fn weak_formulation(&self) -> &WeakFormulation {
        &self.wf
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

    pub fn new_time_sequence(&mut self, session: &mut Session) -> DerivationResult<TimeSequenceId> {
        let sequence = session.new_time_sequence()?;
        self.core.set_time_sequence(sequence)?;
        Ok(sequence)
    }

    pub fn define_abstract_time_instants(&mut self, session: &mut Session, keys: &[&str]) -> DerivationResult<()> {
        self.core.define_instants(session, keys).map(|_| ())
    }

    fn key_and_current(&self, index: &str) -> DerivationResult<((usize, usize), SignedTerm)> {
        let original = self.wf.get(index)?;
        let key = parse_term_index(index)?;
        Ok((key, self.core.current(key, original)))
    }

    /// The current version of the term at `index`.
    pub fn get(&self, index: &str) -> DerivationResult<SignedTerm> {
        self.key_and_current(index).map(|(_, term)| term)
    }

    pub fn differentiate(
        &mut self,
        session: &mut Session,
        index: &str,
        start: &str,
        end: &str,
    ) -> DerivationResult<()> {
        let (key, current) = self.key_and_current(index)?;
        self.core.differentiate(session, key, &current, start, end)
    }

    pub fn average(&mut self, session: &mut Session, index: &str, form: FormId, keys: &[&str]) -> DerivationResult<()> {
        let (key, current) = self.key_and_current(index)?;
        self.core.average(session, key, &current, form, keys)
    }

    /// The discretized weak formulation.
    ///
    /// Untouched terms and equations are carried over. The unknowns are the forms made unknown
    /// by `differentiate`, in equation order, or none if nothing was differentiated.
    pub fn finish(&self, session: &Session) -> DerivationResult<WeakFormulation> {
        let equations = self
            .wf
            .equations()
            .iter()
            .enumerate()
            .map(|(i, equation)| {
                let mut j = 0;
                let mut side = |terms: &[SignedTerm]| {
                    terms
                        .iter()
                        .map(|t| {
                            let current = self.core.current((i, j), t);
                            j += 1;
                            current
                        })
                        .collect::<Vec<_>>()
                };
                let left = side(&equation.left);
                let right = side(&equation.right);
                WfEquation::new(left, right)
            })
            .collect();
        let wf = WeakFormulation::new(session, equations, self.wf.test_forms().to_vec())?;
        let unknowns = self.core.unknowns();
        if unknowns.is_empty() {
            Ok(wf)
        } else {
            wf.with_unknowns(session, &unknowns)
        }
    }
}
