//! Reconciliation Module
//!
//! Host and parasite trees are strict binary trees given edge by edge. Each
//! parasite tip is mapped to a host tip, and the parasite tree is reconciled
//! onto the host tree under the cospeciation / duplication / switch / loss
//! event model.
//!
//! `reconciliation` module contains the tree index, the cost range
//! configuration and the entry points [`reconcile`] and
//! [`reconcile_with_events`]. The dynamic program, the frontier maintenance
//! and the event bookkeeping live in submodules.
//!
//! This module contains 3 main types: `Tree`, `EdgeRecord`, `CostRange`
//!
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt::Display;

pub mod cost_vector;
pub mod engine;
pub mod error;
pub mod newick;
pub mod pareto;
pub mod provenance;
pub mod random;

pub use cost_vector::CostVector;
pub use engine::Engine;
pub use error::{ReconcileError, Result};
pub use pareto::ParetoFrontier;
pub use provenance::{Event, EventKind, EventProvenance, EventSet, ProvenanceMode};

/// Index of an edge in its tree.
pub type EdgeId = usize;

/// Parasite tip vertex -> host tip vertex.
pub type LeafMapping = HashMap<String, String>;

/// Label of the dummy edge above the parasite root.
pub const PARASITE_TOP: &str = "pTop";
/// Label of the dummy edge above the host root.
pub const HOST_TOP: &str = "hTop";
/// Start vertex of both dummy edges.
pub const TOP_VERTEX: &str = "Top";

/// One edge as handed over by a tree loader: the vertices it joins and its
/// two child edges, both absent on a tip edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeRecord {
    pub start: String,
    pub end: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl EdgeRecord {
    pub fn tip(start: &str, end: &str) -> Self {
        EdgeRecord {
            start: start.to_owned(),
            end: end.to_owned(),
            left: None,
            right: None,
        }
    }
    pub fn internal(start: &str, end: &str, left: &str, right: &str) -> Self {
        EdgeRecord {
            start: start.to_owned(),
            end: end.to_owned(),
            left: Some(left.to_owned()),
            right: Some(right.to_owned()),
        }
    }
}

#[derive(Clone, Debug)]
struct Edge {
    label: String,
    start: String,
    end: String,
    children: Option<(EdgeId, EdgeId)>,
}

/// A validated, immutable binary tree indexed by edge.
///
/// Ancestor and descendant sets are computed once when the tree is built,
/// so every switch query can rely on them.
#[derive(Clone, Debug)]
pub struct Tree {
    /// the edges, the index is the id of the edge stored there
    edges: Vec<Edge>,
    ids: HashMap<String, EdgeId>,
    root: EdgeId,
    /// children before parents
    post_order: Vec<EdgeId>,
    descendants: Vec<BTreeSet<EdgeId>>,
    ancestors: Vec<BTreeSet<EdgeId>>,
}

//   ------------------------------- TREE Implementation
impl Tree {
    // ----- Constructors and Building
    /// Builds and validates a tree from its edge records.
    /// # Arguments
    /// * `records` - `(edge label, record)` pairs, in any order
    ///
    /// Fails with `InvalidTree` when the records do not form a strict binary
    /// tree hanging from a single root edge.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, EdgeRecord)>,
    {
        let mut records: Vec<(String, EdgeRecord)> = records.into_iter().collect();
        if records.is_empty() {
            return Err(ReconcileError::invalid_tree("", "tree has no edges"));
        }
        //ids follow label order so runs are reproducible
        records.sort_by(|a, b| a.0.cmp(&b.0));
        let mut ids = HashMap::with_capacity(records.len());
        for (i, (label, _)) in records.iter().enumerate() {
            if ids.insert(label.clone(), i).is_some() {
                return Err(ReconcileError::invalid_tree(label, "duplicate edge label"));
            }
        }
        let mut edges = Vec::with_capacity(records.len());
        for (label, record) in &records {
            let children = match (&record.left, &record.right) {
                (None, None) => None,
                (Some(l), Some(r)) => Some((child_id(&ids, label, l)?, child_id(&ids, label, r)?)),
                _ => {
                    return Err(ReconcileError::invalid_tree(
                        label,
                        "asymmetric children: exactly one child edge is present",
                    ))
                }
            };
            edges.push(Edge {
                label: label.clone(),
                start: record.start.clone(),
                end: record.end.clone(),
                children,
            });
        }
        let root = find_root(&edges)?;
        let post_order = post_order_from(&edges, root)?;
        let (descendants, ancestors) = lineages(&edges, &post_order);
        Ok(Tree {
            edges,
            ids,
            root,
            post_order,
            descendants,
            ancestors,
        })
    }
    // ------ Getters
    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
    /// The edge no other edge points to, e.g. `pTop` or `hTop`.
    pub fn root(&self) -> EdgeId {
        self.root
    }
    pub fn edge_id(&self, label: &str) -> Option<EdgeId> {
        self.ids.get(label).copied()
    }
    pub fn label(&self, e: EdgeId) -> &str {
        &self.get_edge_ref(e).label
    }
    pub fn start_vertex(&self, e: EdgeId) -> &str {
        &self.get_edge_ref(e).start
    }
    pub fn end_vertex(&self, e: EdgeId) -> &str {
        &self.get_edge_ref(e).end
    }
    /// Fails with `InvalidTree` when called on a tip edge.
    pub fn children(&self, e: EdgeId) -> Result<(EdgeId, EdgeId)> {
        self.check_edge(e)?;
        self.get_edge_ref(e)
            .children
            .ok_or_else(|| ReconcileError::invalid_tree(self.label(e), "tip edge has no children"))
    }
    /// Returns `e` if it names an edge of this tree.
    pub fn check_edge(&self, e: EdgeId) -> Result<EdgeId> {
        if e < self.edges.len() {
            Ok(e)
        } else {
            Err(ReconcileError::invalid_tree(&format!("#{e}"), "no edge with this id"))
        }
    }
    /// All edge ids.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> {
        0..self.edges.len()
    }
    /// Edge ids with every child before its parent.
    pub fn post_order(&self) -> &[EdgeId] {
        &self.post_order
    }
    pub fn tips(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges().filter(|e| self.is_tip(*e))
    }
    /// Strict ancestors of `e`.
    pub fn ancestors_of(&self, e: EdgeId) -> &BTreeSet<EdgeId> {
        &self.ancestors[e]
    }
    /// Strict descendants of `e`.
    pub fn descendants_of(&self, e: EdgeId) -> &BTreeSet<EdgeId> {
        &self.descendants[e]
    }
    // ------ Functionality
    pub fn is_tip(&self, e: EdgeId) -> bool {
        self.get_edge_ref(e).children.is_none()
    }
    /// True when `other` is `e` itself, an ancestor or a descendant of `e`.
    pub fn is_lineage(&self, e: EdgeId, other: EdgeId) -> bool {
        e == other || self.ancestors[e].contains(&other) || self.descendants[e].contains(&other)
    }
    fn get_edge_ref(&self, e: EdgeId) -> &Edge {
        match self.edges.get(e) {
            Some(edge) => edge,
            None => panic!("cannot get edge: id {e} too large"),
        }
    }
    // ---- printing the tree as newick
    fn display_helper(&self, e: EdgeId) -> String {
        let mut result = String::new();
        if let Some((l, r)) = self.get_edge_ref(e).children {
            result.push('(');
            result.push_str(&self.display_helper(l));
            result.push(',');
            result.push_str(&self.display_helper(r));
            result.push(')');
        }
        result.push_str(self.end_vertex(e));
        result
    }
}

fn child_id(ids: &HashMap<String, EdgeId>, parent: &str, child: &str) -> Result<EdgeId> {
    ids.get(child)
        .copied()
        .ok_or_else(|| ReconcileError::invalid_tree(parent, format!("child edge `{child}` is not in the tree")))
}

fn find_root(edges: &[Edge]) -> Result<EdgeId> {
    let mut parents: Vec<Option<EdgeId>> = vec![None; edges.len()];
    for (i, edge) in edges.iter().enumerate() {
        if let Some((l, r)) = edge.children {
            for child in [l, r] {
                if let Some(other) = parents[child] {
                    return Err(ReconcileError::invalid_tree(
                        &edges[child].label,
                        format!("edge has two parents `{}` and `{}`", edges[other].label, edge.label),
                    ));
                }
                parents[child] = Some(i);
            }
            let end = &edge.end;
            for child in [l, r] {
                if edges[child].start != *end {
                    return Err(ReconcileError::invalid_tree(
                        &edges[child].label,
                        format!("starts at `{}` but parent `{}` ends at `{end}`", edges[child].start, edge.label),
                    ));
                }
            }
        }
    }
    let roots: Vec<EdgeId> = (0..edges.len()).filter(|i| parents[*i].is_none()).collect();
    match roots.as_slice() {
        [root] => Ok(*root),
        [] => Err(ReconcileError::invalid_tree(&edges[0].label, "no root edge: the edges form a cycle")),
        [_, second, ..] => Err(ReconcileError::invalid_tree(
            &edges[*second].label,
            "more than one root edge: edge is unreachable from the root",
        )),
    }
}

fn post_order_from(edges: &[Edge], root: EdgeId) -> Result<Vec<EdgeId>> {
    let mut result = Vec::with_capacity(edges.len());
    let mut visited = vec![false; edges.len()];
    //(edge, children already pushed)
    let mut work_list = vec![(root, false)];
    while let Some((cur, expanded)) = work_list.pop() {
        if expanded {
            result.push(cur);
            continue;
        }
        visited[cur] = true;
        work_list.push((cur, true));
        if let Some((l, r)) = edges[cur].children {
            work_list.push((r, false));
            work_list.push((l, false));
        }
    }
    //every edge has one parent and a unique root, so leftovers sit on a cycle
    if let Some(lost) = visited.iter().position(|v| !v) {
        return Err(ReconcileError::invalid_tree(
            &edges[lost].label,
            "edge is unreachable from the root (cyclic structure)",
        ));
    }
    Ok(result)
}

fn lineages(edges: &[Edge], post_order: &[EdgeId]) -> (Vec<BTreeSet<EdgeId>>, Vec<BTreeSet<EdgeId>>) {
    let mut descendants: Vec<BTreeSet<EdgeId>> = vec![BTreeSet::new(); edges.len()];
    for &e in post_order {
        if let Some((l, r)) = edges[e].children {
            let mut below: BTreeSet<EdgeId> = BTreeSet::from([l, r]);
            below.extend(descendants[l].iter().copied());
            below.extend(descendants[r].iter().copied());
            descendants[e] = below;
        }
    }
    //d descendant of e => e ancestor of d
    let mut ancestors: Vec<BTreeSet<EdgeId>> = vec![BTreeSet::new(); edges.len()];
    for (e, below) in descendants.iter().enumerate() {
        for d in below {
            ancestors[*d].insert(e);
        }
    }
    (descendants, ancestors)
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{};", self.display_helper(self.root))
    }
}

//   ------------------------------- COST RANGE
/// Ranges of the switch and loss costs, relative to a duplication costing 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostRange {
    switch_lo: f64,
    switch_hi: f64,
    loss_lo: f64,
    loss_hi: f64,
}

impl CostRange {
    /// # Arguments
    /// * `switch_lo`, `switch_hi` - bounds of the switch cost
    /// * `loss_lo`, `loss_hi` - bounds of the loss cost
    ///
    /// Bounds must be finite, non-negative and ordered.
    pub fn new(switch_lo: f64, switch_hi: f64, loss_lo: f64, loss_hi: f64) -> Result<Self> {
        for (name, value) in [
            ("switch low", switch_lo),
            ("switch high", switch_hi),
            ("loss low", loss_lo),
            ("loss high", loss_hi),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReconcileError::InvalidCostRange(format!(
                    "{name} bound {value} must be finite and non-negative"
                )));
            }
        }
        if switch_lo > switch_hi {
            return Err(ReconcileError::InvalidCostRange(format!(
                "switch low {switch_lo} exceeds switch high {switch_hi}"
            )));
        }
        if loss_lo > loss_hi {
            return Err(ReconcileError::InvalidCostRange(format!(
                "loss low {loss_lo} exceeds loss high {loss_hi}"
            )));
        }
        Ok(CostRange {
            switch_lo,
            switch_hi,
            loss_lo,
            loss_hi,
        })
    }
    pub fn switch_lo(&self) -> f64 {
        self.switch_lo
    }
    pub fn switch_hi(&self) -> f64 {
        self.switch_hi
    }
    pub fn loss_lo(&self) -> f64 {
        self.loss_lo
    }
    pub fn loss_hi(&self) -> f64 {
        self.loss_hi
    }
}

// ----------------------- public functions
/// Pareto-optimal cost vectors of reconciling `parasite` onto `host`, the
/// parasite root edge placed on every host edge in turn.
/// # Arguments
/// * `parasite` - parasite tree, its root edge is the dummy `pTop` edge
/// * `host` - host tree
/// * `phi` - parasite tip vertex -> host tip vertex
/// * `range` - switch and loss cost ranges
///
/// The result is in scan order with multiplicities. It is empty when no
/// reconciliation exists.
pub fn reconcile(parasite: &Tree, host: &Tree, phi: &LeafMapping, range: CostRange) -> Result<Vec<CostVector>> {
    Engine::new(parasite, host, phi, range).run()
}

/// Like [`reconcile`], pairing every cost vector with the events that
/// realise it.
/// # Arguments
/// * `mode` - union of all realising events, or only the events common to
///   every assignment with those counts
pub fn reconcile_with_events(
    parasite: &Tree,
    host: &Tree,
    phi: &LeafMapping,
    range: CostRange,
    mode: ProvenanceMode,
) -> Result<Vec<(CostVector, EventSet)>> {
    let mut engine = Engine::with_recorder(parasite, host, phi, range, EventProvenance::new(mode));
    let solutions = engine.run()?;
    let provenance = engine.into_recorder();
    Ok(solutions
        .into_iter()
        .map(|v| {
            let events = provenance.solution_events(parasite.root(), host, &v);
            (v, events)
        })
        .collect())
}

/// The cheapest vector of `frontier` at one point of the cost plane, as
/// `(index, cost)`. `None` for an empty frontier.
/// # Arguments
/// * `switch` - cost of one host switch
/// * `loss` - cost of one loss
pub fn cheapest_at(frontier: &[CostVector], switch: f64, loss: f64) -> Option<(usize, f64)> {
    frontier
        .iter()
        .map(|v| v.cost_at(switch, loss))
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, cost)| match best {
            Some((_, best_cost)) if best_cost <= cost => best,
            _ => Some((i, cost)),
        })
}
