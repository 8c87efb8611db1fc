//! Random Submodule (of Reconciliation)
//!
//! Generates random binary host and parasite trees and random tip mappings,
//! for exercising the engine on instances nobody wrote by hand.
//!
use std::cmp;

use rand::distributions::Uniform;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::reconciliation::error::{ReconcileError, Result};
use crate::reconciliation::{EdgeRecord, LeafMapping, Tree, TOP_VERTEX};

// --------------------------- PUBLIC
/// A random binary tree with `leaves` tips hanging from the dummy edge `top`.
///
/// Every internal vertex splits its tips at a random percentage. Vertices
/// are named `<prefix>0, <prefix>1, ..` in pre-order, tips upper case for
/// hosts (prefix `h`) and lower case otherwise.
/// # Arguments
/// * `leaves` - number of tips, at least 1
/// * `top` - label of the dummy edge above the root
/// * `prefix` - vertex name prefix
pub fn random_tree<R: Rng + ?Sized>(leaves: usize, top: &str, prefix: &str, rng: &mut R) -> Result<Tree> {
    if leaves == 0 {
        return Err(ReconcileError::invalid_tree(top, "a tree needs at least one leaf"));
    }
    //one split percentage per vertex
    let dist = Uniform::from(1usize..100usize); //[1,99] (percent)
    let rands: Vec<usize> = (0..2 * leaves - 1).map(|_| rng.sample(dist)).collect();
    let mut builder = Builder {
        prefix,
        records: Vec::with_capacity(2 * leaves - 1),
        vertices: 0,
        tips: 0,
    };
    builder.grow(&rands, leaves, TOP_VERTEX, Some(top));
    Tree::from_records(builder.records)
}

/// Maps every parasite tip to a uniformly chosen host tip.
pub fn random_mapping<R: Rng + ?Sized>(parasite: &Tree, host: &Tree, rng: &mut R) -> LeafMapping {
    let host_tips: Vec<&str> = host.tips().map(|e| host.end_vertex(e)).collect();
    parasite
        .tips()
        .filter_map(|e| {
            host_tips
                .choose(&mut *rng)
                .map(|h| (parasite.end_vertex(e).to_owned(), (*h).to_owned()))
        })
        .collect()
}

// --------------------------- building the tree
struct Builder<'p> {
    prefix: &'p str,
    records: Vec<(String, EdgeRecord)>,
    vertices: usize,
    tips: usize,
}

impl Builder<'_> {
    /// Adds a subtree of `size` tips below vertex `start`, returns the label
    /// of its root edge.
    fn grow(&mut self, rands: &[usize], size: usize, start: &str, label: Option<&str>) -> String {
        if size < 2 {
            //BASE CASE
            let name = self.tip_name();
            let edge = label.map_or_else(|| name.clone(), str::to_owned);
            self.records.push((edge.clone(), EdgeRecord::tip(start, &name)));
            return edge;
        }
        let name = format!("{}{}", self.prefix, self.vertices);
        self.vertices += 1;
        //   ---------   recursive calls for left and right subtrees
        //determine size (# leaves) of subtrees
        let left_pc = rands[0];
        let left_size = cmp::max(1, left_pc * size / 100);
        let right_size = size - left_size;
        let (left_rands, right_rands) = rands[1..].split_at(2 * left_size - 1);
        let left = self.grow(left_rands, left_size, &name, None);
        let right = self.grow(right_rands, right_size, &name, None);
        let edge = label.map_or_else(|| name.clone(), str::to_owned);
        self.records
            .push((edge.clone(), EdgeRecord::internal(start, &name, &left, &right)));
        edge
    }
    fn tip_name(&mut self) -> String {
        let n = self.tips;
        self.tips += 1;
        let mut name = String::new();
        let mut rest = n;
        loop {
            name.insert(0, char::from(b'a' + (rest % 26) as u8));
            rest /= 26;
            if rest == 0 {
                break;
            }
            rest -= 1;
        }
        if self.prefix == "h" {
            name.make_ascii_uppercase();
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::{HOST_TOP, PARASITE_TOP};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_tree_has_requested_tips() {
        let mut rng = StdRng::seed_from_u64(7);
        for leaves in [1, 2, 5, 30] {
            let t = random_tree(leaves, HOST_TOP, "h", &mut rng).unwrap();
            assert_eq!(t.tips().count(), leaves);
            assert_eq!(t.len(), 2 * leaves - 1);
            assert_eq!(t.label(t.root()), "hTop");
        }
        assert!(random_tree(0, PARASITE_TOP, "p", &mut rng).is_err());
    }

    #[test]
    fn tip_names_stay_unique() {
        let mut rng = StdRng::seed_from_u64(11);
        let t = random_tree(60, PARASITE_TOP, "p", &mut rng).unwrap();
        let mut names: Vec<&str> = t.tips().map(|e| t.end_vertex(e)).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 60);
        assert!(names.contains(&"a") && names.contains(&"aa"));
    }

    #[test]
    fn mapping_covers_every_parasite_tip() {
        let mut rng = StdRng::seed_from_u64(3);
        let host = random_tree(4, HOST_TOP, "h", &mut rng).unwrap();
        let parasite = random_tree(6, PARASITE_TOP, "p", &mut rng).unwrap();
        let phi = random_mapping(&parasite, &host, &mut rng);
        assert_eq!(phi.len(), 6);
        for e in parasite.tips() {
            let h = &phi[parasite.end_vertex(e)];
            assert!(host.edge_id(h).is_some_and(|eh| host.is_tip(eh)));
        }
    }
}
