//! Property-based tests for the citation graph.
//!
//! Random sequences of create, cite and remove calls are applied both to a
//! graph and to a plain edge-set model. In an acyclic graph a node is alive
//! exactly when it can be reached from the root, so the model recomputes
//! reachability after each removal and the two must always agree.

use std::collections::{HashMap, HashSet, VecDeque};

use proptest::prelude::*;

use citegraph_core::{AllocError, CitationGraph, GraphError, Publication};

const ROOT: u8 = 0;
const ID_SPACE: u8 = 10;

struct Entry(u8);

impl Publication for Entry {
    type Id = u8;

    fn from_id(id: u8) -> Result<Self, AllocError> {
        Ok(Self(id))
    }

    fn id(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone)]
enum Op {
    Create { id: u8, parents: Vec<u8> },
    Cite { child: u8, parent: u8 },
    Remove { id: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    AlreadyExists,
    NotFound,
    InvalidOperation,
}

impl From<Result<(), GraphError>> for Outcome {
    fn from(result: Result<(), GraphError>) -> Self {
        match result {
            Ok(()) => Outcome::Ok,
            Err(GraphError::AlreadyExists) => Outcome::AlreadyExists,
            Err(GraphError::NotFound) => Outcome::NotFound,
            Err(GraphError::InvalidOperation(_)) => Outcome::InvalidOperation,
            Err(err @ GraphError::AllocationFailure(_)) => panic!("unexpected {err}"),
        }
    }
}

/// Edge-set model. A child may only cite nodes created before it, which keeps
/// the generated graphs acyclic.
struct Model {
    parents: HashMap<u8, HashSet<u8>>,
    rank: HashMap<u8, usize>,
    next_rank: usize,
}

impl Model {
    fn new() -> Self {
        Self {
            parents: HashMap::from([(ROOT, HashSet::new())]),
            rank: HashMap::from([(ROOT, 0)]),
            next_rank: 1,
        }
    }

    fn live(&self, id: u8) -> bool {
        self.parents.contains_key(&id)
    }

    fn children(&self, id: u8) -> HashSet<u8> {
        self.parents
            .iter()
            .filter(|(_, parents)| parents.contains(&id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// Returns `None` when the op would close a cycle and must be skipped.
    fn apply(&mut self, op: &Op) -> Option<Outcome> {
        match op {
            Op::Create { id, parents } => {
                if self.live(*id) {
                    return Some(Outcome::AlreadyExists);
                }
                if parents.is_empty() || parents.iter().any(|p| !self.live(*p)) {
                    return Some(Outcome::NotFound);
                }
                self.parents.insert(*id, parents.iter().copied().collect());
                self.rank.insert(*id, self.next_rank);
                self.next_rank += 1;
                Some(Outcome::Ok)
            }
            Op::Cite { child, parent } => {
                if !self.live(*child) || !self.live(*parent) {
                    return Some(Outcome::NotFound);
                }
                if child == parent {
                    return Some(Outcome::InvalidOperation);
                }
                if self.rank[parent] > self.rank[child] {
                    return None;
                }
                self.parents.entry(*child).or_default().insert(*parent);
                Some(Outcome::Ok)
            }
            Op::Remove { id } => {
                if *id == ROOT {
                    return Some(Outcome::InvalidOperation);
                }
                if !self.live(*id) {
                    return Some(Outcome::NotFound);
                }
                self.parents.remove(id);
                self.sweep();
                Some(Outcome::Ok)
            }
        }
    }

    /// Drop every node that is no longer reachable from the root.
    fn sweep(&mut self) {
        let mut reachable = HashSet::from([ROOT]);
        let mut queue = VecDeque::from([ROOT]);
        while let Some(id) = queue.pop_front() {
            for child in self.children(id) {
                if reachable.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        self.parents.retain(|id, _| reachable.contains(id));
        self.rank.retain(|id, _| reachable.contains(id));
        for parents in self.parents.values_mut() {
            parents.retain(|p| reachable.contains(p));
        }
    }
}

fn run(graph: &mut CitationGraph<Entry>, op: &Op) -> Outcome {
    match op {
        Op::Create { id, parents } => graph.create_with_parents(*id, parents).into(),
        Op::Cite { child, parent } => graph.add_citation(child, parent).into(),
        Op::Remove { id } => graph.remove(id).into(),
    }
}

fn arb_id() -> impl Strategy<Value = u8> {
    0..ID_SPACE
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (arb_id(), prop::collection::vec(arb_id(), 0..4))
            .prop_map(|(id, parents)| Op::Create { id, parents }),
        2 => (arb_id(), arb_id()).prop_map(|(child, parent)| Op::Cite { child, parent }),
        1 => arb_id().prop_map(|id| Op::Remove { id }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// The graph agrees with the model on outcomes, liveness and adjacency
    /// after every operation.
    #[test]
    fn graph_matches_reachability_model(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut graph = CitationGraph::<Entry>::new(ROOT).unwrap();
        let mut model = Model::new();

        for op in &ops {
            let Some(expected) = model.apply(op) else { continue };
            prop_assert_eq!(run(&mut graph, op), expected, "op {:?}", op);

            for id in 0..ID_SPACE {
                prop_assert_eq!(graph.exists(&id), model.live(id), "liveness of {}", id);
                if model.live(id) {
                    let children: HashSet<u8> = graph.children(&id).unwrap().into_iter().collect();
                    let parents: HashSet<u8> = graph.parents(&id).unwrap().into_iter().collect();
                    prop_assert_eq!(children, model.children(id), "children of {}", id);
                    prop_assert_eq!(&parents, &model.parents[&id], "parents of {}", id);
                } else {
                    prop_assert_eq!(graph.children(&id), Err(GraphError::NotFound));
                }
            }
            prop_assert_eq!(graph.len(), model.parents.len());
        }
    }

    /// Any failed call can be repeated with the same outcome and no effect.
    #[test]
    fn failed_calls_are_stable(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut graph = CitationGraph::<Entry>::new(ROOT).unwrap();
        let mut model = Model::new();

        for op in &ops {
            let Some(expected) = model.apply(op) else { continue };
            let first = run(&mut graph, op);
            prop_assert_eq!(first, expected);
            if first != Outcome::Ok {
                let len = graph.len();
                prop_assert_eq!(run(&mut graph, op), first);
                prop_assert_eq!(graph.len(), len);
            }
        }
    }
}
