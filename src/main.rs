use costscape::reconciliation::newick::{self, CophylogenyInput};
use costscape::reconciliation::random::{random_mapping, random_tree};
use costscape::reconciliation::{
    cheapest_at, CostRange, CostVector, Engine, EventProvenance, ProvenanceMode, Result, HOST_TOP,
    PARASITE_TOP,
};
use std::env;
use std::fs;

/// Options shared by both modes.
struct Options {
    debug: bool,
    events: Option<ProvenanceMode>,
    at: Option<(f64, f64)>,
    budget: Option<u64>,
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    //     ---------        set up environment variables
    let mut opts = Options {
        debug: false,
        events: None,
        at: None,
        budget: None,
    };
    let is_gen_mode;
    let mut req_args: Vec<&str> = vec![];
    //       --------------             parse command
    match args.get(1).map(String::as_str) {
        Some("gen") => is_gen_mode = true,
        Some("read") => is_gen_mode = false,
        Some("-h") | Some("--help") => {
            help("printing help...");
            return;
        }
        _ => {
            help("error: provide command for mode.");
            return;
        }
    }
    //    -------------          parse option flags
    //short form and long form
    for arg in args.iter().skip(2) {
        let v: Vec<&str> = arg.splitn(2, '=').collect();
        let flag = v[0].trim_start_matches('-');
        if arg.starts_with("--") {
            match flag {
                "debug" => opts.debug = true,
                "events" => opts.events = Some(ProvenanceMode::Union),
                "intersection" => opts.events = Some(ProvenanceMode::Intersection),
                "at" => match v.get(1).and_then(|e| parse_point(e)) {
                    Some(point) => opts.at = Some(point),
                    None => {
                        help("--at expects <loss>,<switch>");
                        return;
                    }
                },
                "budget" => match v.get(1).and_then(|e| e.parse::<u64>().ok()) {
                    Some(limit) => opts.budget = Some(limit),
                    None => {
                        help("--budget expects a whole number");
                        return;
                    }
                },
                "help" => {
                    help("printing help...");
                    return;
                }
                _ => {
                    help("unknown flag encountered");
                    return;
                }
            }
        } else if arg.starts_with('-') && arg.len() > 1 && arg.parse::<f64>().is_err() {
            for c in flag.chars() {
                match c {
                    'd' => opts.debug = true,
                    'e' => opts.events = Some(ProvenanceMode::Union),
                    'i' => opts.events = Some(ProvenanceMode::Intersection),
                    'h' => {
                        help("printing help...");
                        return;
                    }
                    _ => {
                        print!("{c} ");
                        help("unknown flag encountered");
                        return;
                    }
                }
            }
        } else {
            req_args.push(arg);
        }
    }
    //      -----------           parse arguments and call
    let outcome = if is_gen_mode {
        if req_args.len() != 6 {
            help("Not the required number of arguments for random generation mode");
            return;
        }
        let Ok(host_leaves) = req_args[0].parse::<usize>() else {
            help("gen mode host leaves argument is not a whole number.");
            return;
        };
        let Ok(parasite_leaves) = req_args[1].parse::<usize>() else {
            help("gen mode parasite leaves argument is not a whole number.");
            return;
        };
        let Some(range) = parse_range(&req_args[2..]) else {
            return;
        };
        call_gen_mode(&opts, host_leaves, parasite_leaves, range)
    } else {
        if req_args.len() != 5 {
            help("Not the required number of arguments for newick file mode");
            return;
        }
        let text = match fs::read_to_string(req_args[0]) {
            Ok(text) => text,
            Err(_) => {
                help("Could not read input file.");
                return;
            }
        };
        let Some(range) = parse_range(&req_args[1..]) else {
            return;
        };
        call_read_mode(&opts, &text, range)
    };
    if let Err(e) = outcome {
        help(&format!("error: {e}"));
    }
}

fn help(message: &str) {
    println!("exit message: {}", message);
    println!(
        "
    Costscape calculates the Pareto-optimal event count vectors of host-parasite tree reconciliations over a range of switch and loss costs, and prints them to stdout. It runs in two modes:

    COMMANDS
    gen     random generation mode
    read    newick input file mode

    Random generation mode builds a random host tree and a random parasite tree with the given numbers of leaves, maps every parasite leaf to a random host leaf and reconciles them.

    Newick input file mode reads one file: the host tree in newick format on the first line, the parasite tree on the second, then one `parasiteLeaf:hostLeaf` pair per line. Lines starting with # are comments.

    Costs are relative to a duplication costing 1, cospeciation is free. Every printed vector <c, d, s, l> counts cospeciations, duplications, switches and losses, followed by the number of reconciliations with those counts.

    USAGE
    1. random generation mode
    usage: gen [options] <hostLeaves> <parasiteLeaves> <switchLo> <switchHi> <lossLo> <lossHi>

    2. newick input file mode
    usage: read [options] <file> <switchLo> <switchHi> <lossLo> <lossHi>

    OPTIONS
    -d     Debug, any mode, prints the trees and the leaf mapping.
    -e     Events, any mode, prints every event of the reconciliations of each vector.
    -i     Intersection, any mode, prints only the events shared by all reconciliations of each vector.
    --at=<loss>,<switch>     any mode, prints the cheapest vector at that point of the cost plane.
    --budget=<n>     any mode, stops after n table evaluations.
    -h     Help, any mode, print this help guide.

    Set RUST_LOG=info (or debug, trace) to follow the computation.
    "
    );
}

fn parse_point(s: &str) -> Option<(f64, f64)> {
    let (loss, switch) = s.split_once(',')?;
    Some((loss.trim().parse().ok()?, switch.trim().parse().ok()?))
}

fn parse_range(bounds: &[&str]) -> Option<CostRange> {
    let mut values = [0.0f64; 4];
    for (value, bound) in values.iter_mut().zip(bounds) {
        match bound.parse::<f64>() {
            Ok(x) => *value = x,
            Err(_) => {
                help("cost range argument is not numeric.");
                return None;
            }
        }
    }
    let [switch_lo, switch_hi, loss_lo, loss_hi] = values;
    match CostRange::new(switch_lo, switch_hi, loss_lo, loss_hi) {
        Ok(range) => Some(range),
        Err(e) => {
            help(&format!("error: {e}"));
            None
        }
    }
}

fn call_gen_mode(opts: &Options, host_leaves: usize, parasite_leaves: usize, range: CostRange) -> Result<()> {
    let mut rng = rand::thread_rng();
    let host = random_tree(host_leaves, HOST_TOP, "h", &mut rng)?;
    let parasite = random_tree(parasite_leaves, PARASITE_TOP, "p", &mut rng)?;
    let phi = random_mapping(&parasite, &host, &mut rng);
    run(opts, &CophylogenyInput { host, parasite, phi }, range)
}

fn call_read_mode(opts: &Options, text: &str, range: CostRange) -> Result<()> {
    let input = newick::parse_input(text)?;
    run(opts, &input, range)
}

fn run(opts: &Options, input: &CophylogenyInput, range: CostRange) -> Result<()> {
    let CophylogenyInput { host, parasite, phi } = input;
    if opts.debug {
        println!("Host tree: {host}");
        println!("Parasite tree: {parasite}");
        let mut pairs: Vec<_> = phi.iter().collect();
        pairs.sort();
        for (p, h) in pairs {
            println!("  {p} -> {h}");
        }
    }
    let frontier: Vec<CostVector> = match opts.events {
        None => {
            let mut engine = Engine::new(parasite, host, phi, range);
            if let Some(limit) = opts.budget {
                engine = engine.with_step_budget(limit);
            }
            let frontier = engine.run()?;
            print_frontier(&frontier);
            frontier
        }
        Some(mode) => {
            let mut engine = Engine::with_recorder(parasite, host, phi, range, EventProvenance::new(mode));
            if let Some(limit) = opts.budget {
                engine = engine.with_step_budget(limit);
            }
            let frontier = engine.run()?;
            let provenance = engine.into_recorder();
            print_frontier(&frontier);
            for v in &frontier {
                println!("Events of {v}:");
                for event in provenance.solution_events(parasite.root(), host, v) {
                    println!("  {}", event.describe(parasite, host));
                }
            }
            frontier
        }
    };
    if let Some((loss, switch)) = opts.at {
        match cheapest_at(&frontier, switch, loss) {
            Some((i, cost)) => println!("Cheapest at loss {loss}, switch {switch}: {} (cost {cost})", frontier[i]),
            None => println!("Cheapest at loss {loss}, switch {switch}: none"),
        }
    }
    Ok(())
}

fn print_frontier(frontier: &[CostVector]) {
    if frontier.is_empty() {
        println!("No reconciliation exists.");
        return;
    }
    for v in frontier {
        println!("{v} x{}", v.count());
    }
    //last output
    println!("Pareto-optimal vectors: {}", frontier.len());
}
