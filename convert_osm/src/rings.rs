//! Stitching open node sequences together into closed rings.

use map_model::NodeID;

/// A closed ring of nodes (the first node is repeated at the end), along with whatever pieces it
/// was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledRing<T> {
    pub sources: Vec<T>,
    pub nodes: Vec<NodeID>,
}

/// Glues sequences of nodes together end to end until every one of them is part of a closed ring.
/// Sequences that are already closed become rings on their own.
///
/// The current ring grows by taking the first remaining sequence that continues it, trying in
/// order: appending the sequence at the end, appending it reversed, prepending it, and prepending
/// it reversed. When `directional` is set, sequences are never reversed; that's needed for
/// coastlines, where the direction says which side is land.
///
/// If some ring can't be closed, everything fails, returning the sources of the stuck ring.
pub fn assemble_rings<T: Copy>(
    sequences: Vec<(T, Vec<NodeID>)>,
    directional: bool,
) -> Result<Vec<AssembledRing<T>>, Vec<T>> {
    let mut remaining: Vec<(T, Vec<NodeID>)> = sequences
        .into_iter()
        .map(|(src, mut nodes)| {
            nodes.dedup();
            (src, nodes)
        })
        .filter(|(_, nodes)| nodes.len() >= 2)
        .collect();
    remaining.reverse();

    let mut results = Vec::new();
    while let Some((src, mut current)) = remaining.pop() {
        let mut sources = vec![src];
        while !is_closed(&current) {
            let first = current[0];
            let last = current[current.len() - 1];

            let mut extended = false;
            // Scan in the original input order
            for idx in (0..remaining.len()).rev() {
                let nodes = &remaining[idx].1;
                let (seq_first, seq_last) = (nodes[0], nodes[nodes.len() - 1]);
                let splice = if seq_first == last {
                    Splice::Append
                } else if !directional && seq_last == last {
                    Splice::AppendReversed
                } else if seq_last == first {
                    Splice::Prepend
                } else if !directional && seq_first == first {
                    Splice::PrependReversed
                } else {
                    continue;
                };

                let (seq_src, mut seq) = remaining.remove(idx);
                sources.push(seq_src);
                if splice == Splice::AppendReversed || splice == Splice::PrependReversed {
                    seq.reverse();
                }
                if splice == Splice::Append || splice == Splice::AppendReversed {
                    current.pop();
                    current.extend(seq);
                } else {
                    seq.pop();
                    seq.extend(current);
                    current = seq;
                }
                extended = true;
                break;
            }

            if !extended {
                return Err(sources);
            }
        }
        results.push(AssembledRing {
            sources,
            nodes: current,
        });
    }
    Ok(results)
}

#[derive(PartialEq)]
enum Splice {
    Append,
    AppendReversed,
    Prepend,
    PrependReversed,
}

fn is_closed(nodes: &[NodeID]) -> bool {
    nodes.len() >= 3 && nodes[0] == nodes[nodes.len() - 1]
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn seq(ids: &[usize]) -> Vec<NodeID> {
        ids.iter().map(|id| NodeID(*id)).collect()
    }

    // The ring as a set of undirected edges, ignoring where it starts and which way it runs
    fn edges(nodes: &[NodeID]) -> Vec<(NodeID, NodeID)> {
        let mut result: Vec<(NodeID, NodeID)> = nodes
            .windows(2)
            .map(|pair| (pair[0].min(pair[1]), pair[0].max(pair[1])))
            .collect();
        result.sort();
        result
    }

    #[test]
    fn all_splice_directions() {
        let rings = assemble_rings(
            vec![
                ("a", seq(&[1, 2, 3])),
                // Reversed, continuing at the end
                ("b", seq(&[5, 4, 3])),
                // Continues at the start
                ("c", seq(&[7, 1])),
                // Reversed, continuing at the start
                ("d", seq(&[5, 6, 7])),
            ],
            false,
        )
        .unwrap();
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].nodes, seq(&[5, 6, 7, 1, 2, 3, 4, 5]));
        assert_eq!(rings[0].sources, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn closed_and_unclosable() {
        let rings = assemble_rings(
            vec![(1, seq(&[1, 2, 3, 1])), (2, seq(&[4, 5])), (3, seq(&[5, 6, 4]))],
            false,
        )
        .unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].sources, vec![1]);
        assert_eq!(rings[1].nodes, seq(&[4, 5, 6, 4]));

        assert_eq!(
            assemble_rings(vec![(1, seq(&[1, 2])), (2, seq(&[2, 3]))], false),
            Err(vec![1, 2])
        );
    }

    #[test]
    fn directional_never_reverses() {
        // The second piece runs the wrong way
        assert!(assemble_rings(vec![(1, seq(&[1, 2, 3])), (2, seq(&[1, 4, 3]))], true).is_err());
        let rings =
            assemble_rings(vec![(1, seq(&[1, 2, 3])), (2, seq(&[3, 4, 1]))], true).unwrap();
        assert_eq!(rings[0].nodes, seq(&[1, 2, 3, 4, 1]));
    }

    #[test]
    fn reassembly_ignores_order_and_direction() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        // Three disjoint rings, each chopped into pieces
        let rings = vec![
            seq(&[0, 1, 2, 3, 4, 5, 6, 7, 0]),
            seq(&[10, 11, 12, 13, 10]),
            seq(&[20, 21, 22, 23, 24, 25, 20]),
        ];
        let expected: Vec<Vec<(NodeID, NodeID)>> = rings.iter().map(|r| edges(r)).collect();

        for _ in 0..50 {
            let mut pieces: Vec<(usize, Vec<NodeID>)> = Vec::new();
            for ring in &rings {
                let mut start = 0;
                while start < ring.len() - 1 {
                    let end = (start + rng.gen_range(1..4)).min(ring.len() - 1);
                    let mut piece = ring[start..=end].to_vec();
                    if rng.gen_bool(0.5) {
                        piece.reverse();
                    }
                    pieces.push((pieces.len(), piece));
                    start = end;
                }
            }
            pieces.shuffle(&mut rng);

            let result = assemble_rings(pieces, false).unwrap();
            assert_eq!(result.len(), 3);
            let mut got: Vec<Vec<(NodeID, NodeID)>> =
                result.iter().map(|r| edges(&r.nodes)).collect();
            got.sort();
            let mut want = expected.clone();
            want.sort();
            assert_eq!(got, want);
        }
    }
}
