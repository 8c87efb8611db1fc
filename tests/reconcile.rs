use costscape::reconciliation::newick::parse_input;
use costscape::reconciliation::{
    reconcile, reconcile_with_events, CostRange, CostVector, EdgeRecord, Engine, Event, EventKind, EventSet, LeafMapping,
    ProvenanceMode, ReconcileError, Tree,
};

fn rec(label: &str, record: EdgeRecord) -> (String, EdgeRecord) {
    (label.to_owned(), record)
}

fn phi(pairs: &[(&str, &str)]) -> LeafMapping {
    pairs.iter().map(|(p, h)| (p.to_string(), h.to_string())).collect()
}

fn range() -> CostRange {
    CostRange::new(0.0, 10.0, 0.0, 10.0).unwrap()
}

const SWITCH_CASE: &str = "
# host
((A,B)h1,C)h0;
# parasite
(a,b)p0;
a:A
b:C
";

#[test]
fn single_tip_match() {
    let parasite = Tree::from_records([rec("pTop", EdgeRecord::tip("Top", "a"))]).unwrap();
    let host = Tree::from_records([rec("hTop", EdgeRecord::tip("Top", "A"))]).unwrap();
    let out = reconcile(&parasite, &host, &phi(&[("a", "A")]), range()).unwrap();
    assert_eq!(out, vec![CostVector::new(0, 0, 0, 0, 1)]);
}

#[test]
fn single_tip_mismatch_has_no_reconciliation() {
    let parasite = Tree::from_records([rec("pTop", EdgeRecord::tip("Top", "a"))]).unwrap();
    let host = Tree::from_records([rec("hTop", EdgeRecord::tip("Top", "B"))]).unwrap();
    let out = reconcile(&parasite, &host, &phi(&[("a", "A")]), range()).unwrap();
    assert!(out.is_empty());
}

#[test]
fn loss_only_star() {
    let parasite = Tree::from_records([rec("pTop", EdgeRecord::tip("Top", "a"))]).unwrap();
    let host = Tree::from_records([
        rec("hTop", EdgeRecord::internal("Top", "h0", "A", "B")),
        rec("A", EdgeRecord::tip("h0", "A")),
        rec("B", EdgeRecord::tip("h0", "B")),
    ])
    .unwrap();
    let map = phi(&[("a", "A")]);
    // parasite root on the host root: one loss
    let mut engine = Engine::new(&parasite, &host, &map, range());
    let on_root = engine.optimal(parasite.root(), host.root()).unwrap();
    assert_eq!(on_root[..], [CostVector::new(0, 0, 0, 1, 1)]);
    // over every host edge the parasite may root on A directly
    let out = reconcile(&parasite, &host, &map, range()).unwrap();
    assert_eq!(out, vec![CostVector::new(0, 0, 0, 0, 1)]);
}

#[test]
fn switch_and_cospeciation_trade_off() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let out = reconcile(&input.parasite, &input.host, &input.phi, range()).unwrap();
    // rooted on A or on C with one switch, duplicating at the root with three
    // losses, or cospeciating at the root with one loss
    assert_eq!(
        out,
        vec![
            CostVector::new(0, 0, 1, 0, 2),
            CostVector::new(0, 1, 0, 3, 1),
            CostVector::new(1, 0, 0, 1, 1),
        ]
    );
}

#[test]
fn expensive_losses_leave_only_the_switch() {
    let input = parse_input(SWITCH_CASE).unwrap();
    // a loss costs at least 3, a switch at most 2
    let r = CostRange::new(1.0, 2.0, 3.0, 4.0).unwrap();
    let out = reconcile(&input.parasite, &input.host, &input.phi, r).unwrap();
    assert_eq!(out, vec![CostVector::new(0, 0, 1, 0, 2)]);
}

#[test]
fn switch_cannot_land_on_its_own_edge() {
    // both parasite tips on A: landing on A itself would beat duplicating
    let input = parse_input("((A,B)h1,C)h0;\n(a,b)p0;\na:A\nb:A\n").unwrap();
    let (p, h) = (&input.parasite, &input.host);
    let mut engine = Engine::new(p, h, &input.phi, range());
    let a = h.edge_id("A").unwrap();
    assert_eq!(engine.optimal(p.root(), a).unwrap()[..], [CostVector::new(0, 1, 0, 0, 1)]);
    for ep in p.edges() {
        let targets = engine.switches(ep, a).unwrap();
        let labels: Vec<&str> = targets.iter().map(|(to, _)| h.label(*to)).collect();
        assert_eq!(labels.len(), 2);
        assert!(labels.contains(&"B") && labels.contains(&"C"));
    }
    let out = reconcile(p, h, &input.phi, range()).unwrap();
    assert_eq!(out, vec![CostVector::new(0, 1, 0, 0, 1)]);
}

#[test]
fn runs_do_not_share_state() {
    let first = parse_input(SWITCH_CASE).unwrap();
    let second = parse_input("((A,B)h1,C)h0;\n(a,b)p0;\na:A\nb:B\n").unwrap();
    let alone = reconcile(&second.parasite, &second.host, &second.phi, range()).unwrap();
    let _ = reconcile(&first.parasite, &first.host, &first.phi, range()).unwrap();
    let after = reconcile(&second.parasite, &second.host, &second.phi, range()).unwrap();
    assert_eq!(alone, after);
    assert_eq!(after, vec![CostVector::new(0, 0, 1, 0, 2), CostVector::new(1, 0, 0, 0, 1)]);
}

#[test]
fn incomplete_mapping_names_the_tip() {
    let input = parse_input("((A,B)h1,C)h0;\n(a,b)p0;\na:A\n").unwrap();
    let err = reconcile(&input.parasite, &input.host, &input.phi, range()).unwrap_err();
    assert_eq!(err, ReconcileError::IncompleteMapping { tip: "b".into() });
    assert_eq!(err.to_string(), "parasite tip `b` is missing from the leaf mapping");
}

#[test]
fn invalid_tree_names_the_edge() {
    let err = parse_input("((A,B)h1,C,D)h0;\n(a,b)p0;\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid tree at edge `h0`: vertex has more than two children"
    );
}

#[test]
fn unknown_edge_id_is_an_invalid_tree() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let mut engine = Engine::new(&input.parasite, &input.host, &input.phi, range());
    let err = engine.optimal(99, input.host.root()).unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidTree { .. }));
    let err = engine.switches(input.parasite.root(), 99).unwrap_err();
    assert_eq!(err.to_string(), "invalid tree at edge `#99`: no edge with this id");
}

#[test]
fn budget_is_enforced_through_the_engine() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let mut engine = Engine::new(&input.parasite, &input.host, &input.phi, range()).with_step_budget(2);
    assert_eq!(engine.run(), Err(ReconcileError::BudgetExhausted { limit: 2 }));
}

fn event(input: &costscape::reconciliation::newick::CophylogenyInput, p: &str, h: &str, kind: EventKind, counts: [u32; 4]) -> Event {
    Event::new(
        input.parasite.edge_id(p).unwrap(),
        input.host.edge_id(h).unwrap(),
        kind,
        counts,
    )
}

#[test]
fn union_provenance_lists_every_realising_event() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let plain = reconcile(&input.parasite, &input.host, &input.phi, range()).unwrap();
    let recorded =
        reconcile_with_events(&input.parasite, &input.host, &input.phi, range(), ProvenanceMode::Union).unwrap();
    let vectors: Vec<CostVector> = recorded.iter().map(|(v, _)| *v).collect();
    assert_eq!(vectors, plain);

    let host = &input.host;
    let to = |label: &str| host.edge_id(label).unwrap();
    let events_of = |counts: [u32; 4]| {
        recorded
            .iter()
            .find(|(v, _)| v.counts() == counts)
            .map(|(_, events)| events.clone())
            .unwrap()
    };
    let switches = EventSet::from([
        event(&input, "pTop", "A", EventKind::Switch { to: to("C") }, [0, 0, 1, 0]),
        event(&input, "pTop", "C", EventKind::Switch { to: to("A") }, [0, 0, 1, 0]),
    ]);
    assert_eq!(events_of([0, 0, 1, 0]), switches);
    let duplication = EventSet::from([
        event(&input, "pTop", "hTop", EventKind::Duplication, [0, 1, 0, 3]),
        event(&input, "a", "hTop", EventKind::Loss { child: to("h1") }, [0, 0, 0, 2]),
        event(&input, "a", "h1", EventKind::Loss { child: to("A") }, [0, 0, 0, 1]),
        event(&input, "b", "hTop", EventKind::Loss { child: to("C") }, [0, 0, 0, 1]),
    ]);
    assert_eq!(events_of([0, 1, 0, 3]), duplication);
    let cospeciation = EventSet::from([
        event(&input, "pTop", "hTop", EventKind::Cospeciation, [1, 0, 0, 1]),
        event(&input, "a", "h1", EventKind::Loss { child: to("A") }, [0, 0, 0, 1]),
    ]);
    assert_eq!(events_of([1, 0, 0, 1]), cospeciation);
}

#[test]
fn intersection_provenance_keeps_shared_events() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let recorded = reconcile_with_events(
        &input.parasite,
        &input.host,
        &input.phi,
        range(),
        ProvenanceMode::Intersection,
    )
    .unwrap();
    assert_eq!(recorded.len(), 3);
    // the two switches realise the same counts but share no event
    assert!(recorded[0].1.is_empty());
    assert_eq!(recorded[1].1.len(), 4);
    assert_eq!(recorded[2].1.len(), 2);
}

#[test]
fn event_descriptions_use_labels() {
    let input = parse_input(SWITCH_CASE).unwrap();
    let e = event(&input, "pTop", "A", EventKind::Switch { to: input.host.edge_id("C").unwrap() }, [0, 0, 1, 0]);
    assert_eq!(
        e.describe(&input.parasite, &input.host),
        "pTop on A: switch to C <0, 0, 1, 0>"
    );
}
