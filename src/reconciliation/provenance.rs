//! Provenance Submodule (of Reconciliation)
//!
//! Records which events realise the cost vectors the engine builds. The
//! engine talks to an [`EventRecorder`]; plain runs plug in [`NoEvents`],
//! recorded runs plug in [`EventProvenance`].
//!
//! Every merge the engine keeps is an [`Event`]: the parasite edge, the host
//! edge, the kind of event and the counts of the merged vector. Its event set
//! is the event itself plus the solution sets of the sub-solutions it was
//! built from. The solution set of `(parasite edge, host edge, counts)` is the
//! union of the event sets that produced those counts there.
//!
//! This module contains the types: `Event`, `EventKind`, `SolutionKey`,
//! `EventProvenance`
//!
use std::collections::{BTreeSet, HashMap};

use crate::reconciliation::cost_vector::{CostVector, Counts};
use crate::reconciliation::{EdgeId, Tree};

/// What happened at one (parasite edge, host edge) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Cospeciation,
    Duplication,
    /// one child of the parasite edge switched to host edge `to`
    Switch { to: EdgeId },
    /// the host edge was lost down to its child `child`
    Loss { child: EdgeId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Event {
    pub parasite: EdgeId,
    pub host: EdgeId,
    pub kind: EventKind,
    /// counts of the vector this event produced
    pub counts: Counts,
}

pub type EventSet = BTreeSet<Event>;

impl Event {
    pub fn new(parasite: EdgeId, host: EdgeId, kind: EventKind, counts: Counts) -> Self {
        Event {
            parasite,
            host,
            kind,
            counts,
        }
    }
    /// Human readable form using the edge labels of both trees, e.g.
    /// `p1 on h0: switch to C <0, 0, 1, 0>`.
    pub fn describe(&self, parasite: &Tree, host: &Tree) -> String {
        let kind = match self.kind {
            EventKind::Cospeciation => "cospeciation".to_owned(),
            EventKind::Duplication => "duplication".to_owned(),
            EventKind::Switch { to } => format!("switch to {}", host.label(to)),
            EventKind::Loss { child } => format!("loss {}", host.label(child)),
        };
        let [c, d, s, l] = self.counts;
        format!(
            "{} on {}: {kind} <{c}, {d}, {s}, {l}>",
            parasite.label(self.parasite),
            host.label(self.host)
        )
    }
}

/// A partial solution: `parasite` reconciled under `host` with these counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolutionKey {
    pub parasite: EdgeId,
    pub host: EdgeId,
    pub counts: Counts,
}

impl SolutionKey {
    pub fn new(parasite: EdgeId, host: EdgeId, counts: Counts) -> Self {
        SolutionKey { parasite, host, counts }
    }
}

/// Hooks the engine calls while merging sub-solutions.
pub trait EventRecorder {
    /// False rejects `merged` before it is recorded or returned.
    fn admit(&self, _merged: &CostVector) -> bool {
        true
    }
    /// A kept, feasible merge and the sub-solutions it was built from.
    fn record(&mut self, _event: Event, _parts: &[SolutionKey]) {}
    /// Frontier of the parasite root on one host edge.
    fn offer_solutions(&mut self, _solutions: &[CostVector]) {}
}

/// Records nothing and admits everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoEvents;

impl EventRecorder for NoEvents {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProvenanceMode {
    /// every event of any assignment with the counts
    #[default]
    Union,
    /// only the events shared by all assignments with the counts
    Intersection,
}

/// Event bookkeeping for one run.
#[derive(Clone, Debug, Default)]
pub struct EventProvenance {
    mode: ProvenanceMode,
    event_sets: HashMap<Event, EventSet>,
    solution_sets: HashMap<SolutionKey, EventSet>,
    /// counts -> events common to every event set that produced them
    common: HashMap<Counts, EventSet>,
    /// complete solutions seen so far, mutually non-dominated
    candidates: Vec<CostVector>,
}

impl EventProvenance {
    pub fn new(mode: ProvenanceMode) -> Self {
        EventProvenance {
            mode,
            ..Default::default()
        }
    }
    pub fn mode(&self) -> ProvenanceMode {
        self.mode
    }
    pub fn candidates(&self) -> &[CostVector] {
        &self.candidates
    }
    pub fn event_set(&self, event: &Event) -> Option<&EventSet> {
        self.event_sets.get(event)
    }
    pub fn solution_set(&self, key: &SolutionKey) -> Option<&EventSet> {
        self.solution_sets.get(key)
    }
    /// Events shared by every recorded assignment producing `counts`,
    /// whichever edge pair produced it.
    pub fn common_events(&self, counts: &Counts) -> Option<&EventSet> {
        self.common.get(counts)
    }
    /// Events of a complete solution `v` with the parasite root on any host
    /// edge: the union of the root's solution sets, or in intersection mode
    /// the events common to every assignment with those counts.
    /// # Arguments
    /// * `root` - the parasite root edge
    /// * `host` - the host tree
    /// * `v` - a vector of the final frontier
    pub fn solution_events(&self, root: EdgeId, host: &Tree, v: &CostVector) -> EventSet {
        match self.mode {
            ProvenanceMode::Union => host
                .edges()
                .filter_map(|eh| self.solution_sets.get(&SolutionKey::new(root, eh, v.counts())))
                .flatten()
                .copied()
                .collect(),
            ProvenanceMode::Intersection => self.common.get(&v.counts()).cloned().unwrap_or_default(),
        }
    }
}

impl EventRecorder for EventProvenance {
    fn admit(&self, merged: &CostVector) -> bool {
        !self.candidates.iter().any(|c| c.dominates(merged))
    }

    fn record(&mut self, event: Event, parts: &[SolutionKey]) {
        let mut events = self.event_sets.remove(&event).unwrap_or_default();
        events.insert(event);
        for part in parts {
            if let Some(below) = self.solution_sets.get(part) {
                events.extend(below.iter().copied());
            }
        }
        let key = SolutionKey::new(event.parasite, event.host, event.counts);
        self.solution_sets
            .entry(key)
            .or_default()
            .extend(events.iter().copied());
        if self.mode == ProvenanceMode::Intersection {
            match self.common.get_mut(&event.counts) {
                Some(shared) => shared.retain(|e| events.contains(e)),
                None => {
                    self.common.insert(event.counts, events.clone());
                }
            }
        }
        self.event_sets.insert(event, events);
    }

    fn offer_solutions(&mut self, solutions: &[CostVector]) {
        for v in solutions.iter().filter(|v| !v.is_infeasible()) {
            if self.candidates.iter().any(|c| c.dominates(v) || c.counts() == v.counts()) {
                continue;
            }
            self.candidates.retain(|c| !v.dominates(c));
            self.candidates.push(*v);
        }
    }
}
