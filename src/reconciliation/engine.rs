//! Engine Submodule (of Reconciliation)
//!
//! The memoized dynamic program over (parasite edge, host edge) pairs.
//!
//! * `alive(ep, eh)`: `ep` lands exactly on `eh`, by cospeciation or by a
//!   loss down one side of `eh`.
//! * `optimal(ep, eh)`: `ep` anywhere under `eh`, additionally allowing a
//!   duplication or a host switch at `ep`.
//! * `switches(ep, eh)`: `optimal(ep, e')` for every host edge `e'` off the
//!   lineage of `eh`.
//!
//! The tables are owned by one `Engine` and die with it. [`Engine::run`]
//! fills them bottom-up, parasite post-order outside and host post-order
//! inside, so every recursive call finds its inputs already memoized.
//!
//! This module contains the type: `Engine`
//!
use std::rc::Rc;

use itertools::Itertools;
use log::{debug, info, trace};

use crate::reconciliation::cost_vector::CostVector;
use crate::reconciliation::error::{ReconcileError, Result};
use crate::reconciliation::pareto::ParetoFrontier;
use crate::reconciliation::provenance::{Event, EventKind, EventRecorder, NoEvents, SolutionKey};
use crate::reconciliation::{CostRange, EdgeId, LeafMapping, Tree};

/// A memoized frontier.
pub type Frontier = Rc<[CostVector]>;
/// Landing host edge and the frontier of the switching child on it.
pub type SwitchTargets = Rc<[(EdgeId, Frontier)]>;

/// One reconciliation run of `parasite` onto `host`.
///
/// `R` decides whether merges are recorded as events; plain runs use
/// [`NoEvents`].
pub struct Engine<'a, R: EventRecorder = NoEvents> {
    parasite: &'a Tree,
    host: &'a Tree,
    phi: &'a LeafMapping,
    frontier: ParetoFrontier,
    recorder: R,
    /// tables indexed by `ep * host.len() + eh`
    alive: Vec<Option<Frontier>>,
    optimal: Vec<Option<Frontier>>,
    switches: Vec<Option<SwitchTargets>>,
    budget: Option<u64>,
    steps: u64,
}

impl<'a> Engine<'a, NoEvents> {
    /// Creates an engine that records nothing.
    /// # Arguments
    /// * `parasite` - parasite tree, its root edge is placed on every host edge
    /// * `host` - host tree
    /// * `phi` - parasite tip vertex -> host tip vertex
    /// * `range` - switch and loss cost ranges
    pub fn new(parasite: &'a Tree, host: &'a Tree, phi: &'a LeafMapping, range: CostRange) -> Self {
        Engine::with_recorder(parasite, host, phi, range, NoEvents)
    }
}

impl<'a, R: EventRecorder> Engine<'a, R> {
    pub fn with_recorder(parasite: &'a Tree, host: &'a Tree, phi: &'a LeafMapping, range: CostRange, recorder: R) -> Self {
        let pairs = parasite.len() * host.len();
        Engine {
            parasite,
            host,
            phi,
            frontier: ParetoFrontier::new(range),
            recorder,
            alive: vec![None; pairs],
            optimal: vec![None; pairs],
            switches: vec![None; pairs],
            budget: None,
            steps: 0,
        }
    }
    /// Caps the number of table entries the run may evaluate.
    pub fn with_step_budget(mut self, limit: u64) -> Self {
        self.budget = Some(limit);
        self
    }
    pub fn recorder(&self) -> &R {
        &self.recorder
    }
    pub fn into_recorder(self) -> R {
        self.recorder
    }
    /// Table entries evaluated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Pareto-optimal vectors of the parasite root placed on any host edge,
    /// infeasible vectors removed. Empty when no reconciliation exists.
    pub fn run(&mut self) -> Result<Vec<CostVector>> {
        let parasite = self.parasite;
        let host = self.host;
        let root = parasite.root();
        info!(
            "reconciling {} parasite edges onto {} host edges",
            parasite.len(),
            host.len()
        );
        for &ep in parasite.post_order() {
            if ep == root {
                continue;
            }
            for &eh in host.post_order() {
                self.optimal(ep, eh)?;
            }
        }
        let mut solutions = Vec::new();
        for &eh in host.post_order() {
            let rooted = self.optimal(root, eh)?;
            debug!(
                "{} on {}: {} vectors",
                parasite.label(root),
                host.label(eh),
                rooted.len()
            );
            self.recorder.offer_solutions(&rooted);
            solutions.extend(rooted.iter().copied());
        }
        let mut result = self.frontier.filter(solutions);
        result.retain(|v| !v.is_infeasible());
        info!(
            "{} Pareto-optimal vectors after {} table evaluations",
            result.len(),
            self.steps
        );
        Ok(result)
    }

    /// Frontier of `ep` landing exactly on `eh`, without switching at `ep`.
    pub fn alive(&mut self, ep: EdgeId, eh: EdgeId) -> Result<Frontier> {
        let idx = self.index(ep, eh)?;
        if let Some(memo) = &self.alive[idx] {
            return Ok(Rc::clone(memo));
        }
        self.step()?;
        let result: Frontier = if self.host.is_tip(eh) {
            Rc::from(vec![self.tip_match(ep, eh)?])
        } else {
            let (eh_l, eh_r) = self.host.children(eh)?;
            let mut candidates = Vec::new();
            if self.parasite.is_tip(ep) {
                candidates.push(CostVector::INFEASIBLE);
            } else {
                let (ep_l, ep_r) = self.parasite.children(ep)?;
                for (to_l, to_r) in [(eh_l, eh_r), (eh_r, eh_l)] {
                    let first = self.optimal(ep_l, to_l)?;
                    let second = self.optimal(ep_r, to_r)?;
                    let merged = self.merge(
                        (ep, eh, EventKind::Cospeciation),
                        CostVector::COSPECIATION,
                        (ep_l, to_l, &first[..]),
                        (ep_r, to_r, &second[..]),
                    );
                    candidates.extend(merged);
                }
            }
            for child in [eh_l, eh_r] {
                let below = self.optimal(ep, child)?;
                candidates.extend(self.lose(ep, eh, child, &below));
            }
            self.frontier.filter(candidates).into()
        };
        trace!(
            "A({}, {}) = {} vectors",
            self.parasite.label(ep),
            self.host.label(eh),
            result.len()
        );
        self.alive[idx] = Some(Rc::clone(&result));
        Ok(result)
    }

    /// Frontier of `ep` reconciled under `eh`, duplications and switches
    /// at `ep` allowed.
    pub fn optimal(&mut self, ep: EdgeId, eh: EdgeId) -> Result<Frontier> {
        let idx = self.index(ep, eh)?;
        if let Some(memo) = &self.optimal[idx] {
            return Ok(Rc::clone(memo));
        }
        let pass_through = self.alive(ep, eh)?;
        if self.parasite.is_tip(ep) {
            self.optimal[idx] = Some(Rc::clone(&pass_through));
            return Ok(pass_through);
        }
        self.step()?;
        let (ep_l, ep_r) = self.parasite.children(ep)?;
        let mut candidates: Vec<CostVector> = pass_through.to_vec();

        let first = self.optimal(ep_l, eh)?;
        let second = self.optimal(ep_r, eh)?;
        let duplicated = self.merge(
            (ep, eh, EventKind::Duplication),
            CostVector::DUPLICATION,
            (ep_l, eh, &first[..]),
            (ep_r, eh, &second[..]),
        );
        candidates.extend(duplicated);

        for (stay, go) in [(ep_l, ep_r), (ep_r, ep_l)] {
            let staying = self.optimal(stay, eh)?;
            let targets = self.switches(go, eh)?;
            for (to, landed) in targets.iter() {
                let switched = self.merge(
                    (ep, eh, EventKind::Switch { to: *to }),
                    CostVector::SWITCH,
                    (stay, eh, &staying[..]),
                    (go, *to, &landed[..]),
                );
                candidates.extend(switched);
            }
        }
        let result: Frontier = self.frontier.filter(candidates).into();
        trace!(
            "C({}, {}) = {} vectors",
            self.parasite.label(ep),
            self.host.label(eh),
            result.len()
        );
        self.optimal[idx] = Some(Rc::clone(&result));
        Ok(result)
    }

    /// `optimal(ep, e')` for every valid switch landing `e'` of `eh`.
    pub fn switches(&mut self, ep: EdgeId, eh: EdgeId) -> Result<SwitchTargets> {
        let idx = self.index(ep, eh)?;
        if let Some(memo) = &self.switches[idx] {
            return Ok(Rc::clone(memo));
        }
        let destinations: Vec<EdgeId> = self.switch_destinations(eh).collect();
        let mut targets = Vec::with_capacity(destinations.len());
        for to in destinations {
            targets.push((to, self.optimal(ep, to)?));
        }
        let targets: SwitchTargets = targets.into();
        self.switches[idx] = Some(Rc::clone(&targets));
        Ok(targets)
    }

    /// Host edges a parasite may switch to from `eh`: neither `eh` itself
    /// nor one of its ancestors or descendants.
    pub fn switch_destinations(&self, eh: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.host.edges().filter(move |e| !self.host.is_lineage(eh, *e))
    }

    // ---- helpers
    fn index(&self, ep: EdgeId, eh: EdgeId) -> Result<usize> {
        let ep = self.parasite.check_edge(ep)?;
        let eh = self.host.check_edge(eh)?;
        Ok(ep * self.host.len() + eh)
    }

    fn step(&mut self) -> Result<()> {
        self.steps += 1;
        match self.budget {
            Some(limit) if self.steps > limit => Err(ReconcileError::BudgetExhausted { limit }),
            _ => Ok(()),
        }
    }

    /// Base case on a host tip.
    fn tip_match(&self, ep: EdgeId, eh: EdgeId) -> Result<CostVector> {
        if !self.parasite.is_tip(ep) {
            return Ok(CostVector::INFEASIBLE);
        }
        let tip = self.parasite.end_vertex(ep);
        let mapped = self
            .phi
            .get(tip)
            .ok_or_else(|| ReconcileError::IncompleteMapping { tip: tip.to_owned() })?;
        if *mapped == self.host.end_vertex(eh) {
            Ok(CostVector::TIP_MATCH)
        } else {
            Ok(CostVector::INFEASIBLE)
        }
    }

    /// Every pairing of `first` and `second` tagged with one `unit` event.
    /// # Arguments
    /// * `at` - parasite edge, host edge and kind of the event
    /// * `first`, `second` - the two sub-solutions as (parasite edge, host edge, frontier)
    fn merge(
        &mut self,
        at: (EdgeId, EdgeId, EventKind),
        unit: CostVector,
        first: (EdgeId, EdgeId, &[CostVector]),
        second: (EdgeId, EdgeId, &[CostVector]),
    ) -> Vec<CostVector> {
        let (ep, eh, kind) = at;
        let (p1, h1, list1) = first;
        let (p2, h2, list2) = second;
        let mut output = Vec::with_capacity(list1.len() * list2.len());
        for (v, w) in list1.iter().cartesian_product(list2.iter()) {
            let merged = unit + *v + *w;
            if !self.recorder.admit(&merged) {
                continue;
            }
            if !merged.is_infeasible() {
                let event = Event::new(ep, eh, kind, merged.counts());
                let parts = [SolutionKey::new(p1, h1, v.counts()), SolutionKey::new(p2, h2, w.counts())];
                self.recorder.record(event, &parts);
            }
            output.push(merged);
        }
        output
    }

    /// `below` tagged with one loss of host edge `eh` down to `child`.
    fn lose(&mut self, ep: EdgeId, eh: EdgeId, child: EdgeId, below: &[CostVector]) -> Vec<CostVector> {
        let mut output = Vec::with_capacity(below.len());
        for (lost, v) in CostVector::LOSS.scale(below).into_iter().zip(below) {
            if !self.recorder.admit(&lost) {
                continue;
            }
            if !lost.is_infeasible() {
                let event = Event::new(ep, eh, EventKind::Loss { child }, lost.counts());
                self.recorder.record(event, &[SolutionKey::new(ep, child, v.counts())]);
            }
            output.push(lost);
        }
        output
    }
}
