//! Newick Submodule (of Reconciliation)
//!
//! Reads a host tree, a parasite tree and the tip mapping from one text.
//!
//! ```text
//! # comment lines and blank lines are skipped
//! ((A,B)h1,C)h0;        <- host tree
//! (a,b)p0;              <- parasite tree
//! a:A                   <- parasite tip : host tip, one per line
//! b:C
//! ```
//!
//! Every Newick vertex becomes the edge ending in it, labelled by the vertex
//! name. The root vertex hangs from a dummy top edge (`hTop`, `pTop`)
//! starting at vertex `Top`. Unnamed internal vertices get generated names
//! and branch lengths are dropped.
//!
use std::collections::HashSet;

use crate::reconciliation::error::{ReconcileError, Result};
use crate::reconciliation::{EdgeRecord, LeafMapping, Tree, HOST_TOP, PARASITE_TOP, TOP_VERTEX};

/// Everything a reconciliation run needs.
#[derive(Clone, Debug)]
pub struct CophylogenyInput {
    pub host: Tree,
    pub parasite: Tree,
    pub phi: LeafMapping,
}

/// Parses a host tree line, a parasite tree line and the mapping lines.
pub fn parse_input(text: &str) -> Result<CophylogenyInput> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));
    let (_, host_line) = lines
        .next()
        .ok_or_else(|| ReconcileError::Parse("missing host tree".into()))?;
    let (_, parasite_line) = lines
        .next()
        .ok_or_else(|| ReconcileError::Parse("missing parasite tree".into()))?;
    let host = parse_tree(host_line, HOST_TOP, "h")?;
    let parasite = parse_tree(parasite_line, PARASITE_TOP, "p")?;

    let host_tips: HashSet<&str> = host.tips().map(|e| host.end_vertex(e)).collect();
    let parasite_tips: HashSet<&str> = parasite.tips().map(|e| parasite.end_vertex(e)).collect();
    let mut phi = LeafMapping::new();
    for (number, line) in lines {
        let Some((p, h)) = line.split_once(':') else {
            return Err(ReconcileError::Parse(format!(
                "line {number}: expected `parasiteTip:hostTip`, found `{line}`"
            )));
        };
        let (p, h) = (p.trim(), h.trim());
        if !parasite_tips.contains(p) {
            return Err(ReconcileError::Parse(format!("line {number}: `{p}` is not a parasite tip")));
        }
        if !host_tips.contains(h) {
            return Err(ReconcileError::Parse(format!("line {number}: `{h}` is not a host tip")));
        }
        if phi.insert(p.to_owned(), h.to_owned()).is_some() {
            return Err(ReconcileError::Parse(format!("line {number}: `{p}` is mapped twice")));
        }
    }
    Ok(CophylogenyInput { host, parasite, phi })
}

/// production rules for the binary Newick subset read here
//Tree → Subtree Length ";"
//Subtree → Leaf | Internal
//Leaf → Name
//Internal → "(" Branch "," Branch ")" Name
//Branch → Subtree Length
//Name → empty | string
//Length → empty | ":" number
//
//example: ((A,B)h1,C)h0;
/// # Arguments
/// * `newick` - one tree terminated by `;`
/// * `top` - label of the dummy edge above the root
/// * `prefix` - prefix of generated names for unnamed internal vertices
pub fn parse_tree(newick: &str, top: &str, prefix: &str) -> Result<Tree> {
    //Tree → Subtree Length ";"
    let newick = newick.trim();
    let Some(bare) = newick.strip_suffix(';') else {
        return Err(ReconcileError::Parse(format!("no trailing semicolon in `{newick}`")));
    };
    let bare = trim_length(bare.trim());
    if bare.is_empty() {
        return Err(ReconcileError::Parse("cannot parse an empty tree".into()));
    }
    let mut builder = Builder {
        prefix,
        records: Vec::new(),
        generated: 0,
    };
    builder.subtree(bare, TOP_VERTEX, Some(top))?;
    Tree::from_records(builder.records)
}

struct Builder<'p> {
    prefix: &'p str,
    records: Vec<(String, EdgeRecord)>,
    generated: usize,
}

impl Builder<'_> {
    /// Adds the edge ending at the root of `s`, returns its label.
    fn subtree(&mut self, s: &str, start: &str, label: Option<&str>) -> Result<String> {
        //Subtree → Leaf | Internal
        if s.contains('(') {
            self.internal(s, start, label)
        } else {
            self.leaf(s, start, label)
        }
    }
    fn internal(&mut self, s: &str, start: &str, label: Option<&str>) -> Result<String> {
        //Internal → "(" Branch "," Branch ")" Name
        let (bare, name) = split_name(s)?;
        let name = match name.trim() {
            "" => self.generate_name(),
            named => named.to_owned(),
        };
        let branches = peel_parens(bare)?;
        let Some((left, right)) = split_first_branch(branches) else {
            return Err(ReconcileError::invalid_tree(&name, "vertex has a single child"));
        };
        if split_first_branch(right).is_some() {
            return Err(ReconcileError::invalid_tree(&name, "vertex has more than two children"));
        }
        //Branch → Subtree Length
        let left = self.subtree(trim_length(left.trim()), &name, None)?;
        let right = self.subtree(trim_length(right.trim()), &name, None)?;
        let edge = label.map_or_else(|| name.clone(), str::to_owned);
        self.records
            .push((edge.clone(), EdgeRecord::internal(start, &name, &left, &right)));
        Ok(edge)
    }
    fn leaf(&mut self, s: &str, start: &str, label: Option<&str>) -> Result<String> {
        //Leaf → Name
        let name = s.trim();
        if name.is_empty() {
            return Err(ReconcileError::Parse(format!("unlabelled leaf below `{start}`")));
        }
        if name.contains([')', ',', ';']) {
            return Err(ReconcileError::Parse(format!("malformed leaf `{name}`")));
        }
        let edge = label.map_or_else(|| name.to_owned(), str::to_owned);
        self.records.push((edge.clone(), EdgeRecord::tip(start, name)));
        Ok(edge)
    }
    fn generate_name(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.generated);
        self.generated += 1;
        name
    }
}

//
//  -------------------------------    helper functions
//
fn trim_length(s: &str) -> &str {
    //only trim if ':' is found after the last ')'
    let tail_start = s.rfind(')').map_or(0, |i| i + 1);
    match s[tail_start..].rfind(':') {
        Some(i) => s[..tail_start + i].trim_end(),
        None => s,
    }
}
fn split_name(s: &str) -> Result<(&str, &str)> {
    match s.rfind(')') {
        Some(i) => Ok(s.split_at(i + 1)),
        None => Err(ReconcileError::Parse(format!("unbalanced parentheses in `{s}`"))),
    }
}
fn peel_parens(s: &str) -> Result<&str> {
    s.trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| ReconcileError::Parse(format!("no parens to peel in `{s}`")))
}
fn split_first_branch(s: &str) -> Option<(&str, &str)> {
    //split on the first comma outside inner parens
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_tree_with_top_edge() {
        let t = parse_tree("((A,B)h1,C)h0;", HOST_TOP, "h").unwrap();
        assert_eq!(t.len(), 5);
        let top = t.root();
        assert_eq!(t.label(top), "hTop");
        assert_eq!(t.start_vertex(top), "Top");
        assert_eq!(t.end_vertex(top), "h0");
        let h1 = t.edge_id("h1").unwrap();
        assert_eq!(t.start_vertex(h1), "h0");
        assert_eq!(t.to_string(), "((A,B)h1,C)h0;");
    }

    #[test]
    fn generates_names_and_drops_lengths() {
        let t = parse_tree("((a:0.5,b:1):2,c:3.25):0;", PARASITE_TOP, "p").unwrap();
        assert_eq!(t.len(), 5);
        assert_eq!(t.tips().count(), 3);
        assert!(t.edge_id("a").is_some() && t.edge_id("c").is_some());
        assert_eq!(t.end_vertex(t.root()), "p0");
        assert!(t.edge_id("p1").is_some());
    }

    #[test]
    fn single_leaf_tree() {
        let t = parse_tree("a;", PARASITE_TOP, "p").unwrap();
        assert_eq!(t.len(), 1);
        assert!(t.is_tip(t.root()));
        assert_eq!(t.label(t.root()), "pTop");
        assert_eq!(t.end_vertex(t.root()), "a");
    }

    #[test]
    fn rejects_malformed_trees() {
        assert!(matches!(parse_tree("(A,B)", HOST_TOP, "h"), Err(ReconcileError::Parse(_))));
        assert!(matches!(parse_tree(";", HOST_TOP, "h"), Err(ReconcileError::Parse(_))));
        assert!(matches!(parse_tree("(A,)r;", HOST_TOP, "h"), Err(ReconcileError::Parse(_))));
        let err = parse_tree("(A,B,C)r;", HOST_TOP, "h").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidTree { edge, .. } if edge == "r"));
        let err = parse_tree("((A)x,B)r;", HOST_TOP, "h").unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidTree { edge, .. } if edge == "x"));
        // vertex names double as edge labels
        assert!(matches!(parse_tree("(A,A)r;", HOST_TOP, "h"), Err(ReconcileError::InvalidTree { .. })));
    }

    #[test]
    fn reads_full_input() {
        let text = "# host then parasite\n((A,B)h1,C)h0;\n\n(a,b)p0;\na:A\nb : C\n";
        let input = parse_input(text).unwrap();
        assert_eq!(input.host.len(), 5);
        assert_eq!(input.parasite.len(), 3);
        assert_eq!(input.phi.len(), 2);
        assert_eq!(input.phi["b"], "C");
    }

    #[test]
    fn rejects_bad_mappings() {
        let bad_line = parse_input("(A,B)h;\n(a,b)p;\na=A\n").unwrap_err();
        assert_eq!(
            bad_line,
            ReconcileError::Parse("line 3: expected `parasiteTip:hostTip`, found `a=A`".into())
        );
        assert!(parse_input("(A,B)h;\n(a,b)p;\na:Z\n").is_err());
        assert!(parse_input("(A,B)h;\n(a,b)p;\nz:A\n").is_err());
        assert!(parse_input("(A,B)h;\n(a,b)p;\na:A\na:B\n").is_err());
        assert!(parse_input("(A,B)h;\n").is_err());
    }
}
