use rustc_hash::FxHashMap;

use crate::ir::{EdgeSpec, Graph};

/// Median-based up/down sweeps over the rank buckets. Each pass sorts every
/// bucket by the median position of its neighbours in the adjacent rank;
/// ties keep the current position, then fall back to declaration order.
pub(super) fn order_ranks(
    rank_nodes: &mut [Vec<String>],
    edges: &[EdgeSpec],
    node_order: &FxHashMap<String, usize>,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: FxHashMap<String, Vec<String>> = FxHashMap::default();
    let mut outgoing: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for edge in edges {
        outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge.target.clone());
        incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge.source.clone());
    }

    let mut positions: FxHashMap<String, usize> = FxHashMap::default();
    let update_positions =
        |rank_nodes: &[Vec<String>], positions: &mut FxHashMap<String, usize>| {
            positions.clear();
            for bucket in rank_nodes {
                for (idx, id) in bucket.iter().enumerate() {
                    positions.insert(id.clone(), idx);
                }
            }
        };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &FxHashMap<String, Vec<String>>,
                       positions: &FxHashMap<String, usize>| {
        let current: FxHashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        bucket.sort_by(|a, b| {
            let a_score = median_position(a, neighbors, positions, &current);
            let b_score = median_position(b, neighbors, positions, &current);
            match a_score.partial_cmp(&b_score) {
                Some(std::cmp::Ordering::Equal) | None => {
                    let a_pos = current.get(a).copied().unwrap_or(0);
                    let b_pos = current.get(b).copied().unwrap_or(0);
                    a_pos.cmp(&b_pos).then_with(|| {
                        node_order
                            .get(a)
                            .copied()
                            .unwrap_or(usize::MAX)
                            .cmp(&node_order.get(b).copied().unwrap_or(usize::MAX))
                    })
                }
                Some(ordering) => ordering,
            }
        });
    };

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

fn median_position(
    node_id: &str,
    neighbors: &FxHashMap<String, Vec<String>>,
    positions: &FxHashMap<String, usize>,
    current: &FxHashMap<String, usize>,
) -> f32 {
    let Some(list) = neighbors.get(node_id) else {
        return *current.get(node_id).unwrap_or(&0) as f32;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|neighbor| positions.get(neighbor))
        .map(|&pos| pos as f32)
        .collect();
    if values.is_empty() {
        return *current.get(node_id).unwrap_or(&0) as f32;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// The median step knows nothing about port semantics, so a branch node's
/// children could land in any order. Reslot every branch's direct children
/// within their rank by source-handle index: output-0 leftmost, output-1
/// next, and so on. Positions of unrelated nodes do not move.
pub(super) fn enforce_port_order(rank_nodes: &mut [Vec<String>], graph: &Graph) {
    let mut slot: FxHashMap<String, (usize, usize)> = FxHashMap::default();
    for (rank, bucket) in rank_nodes.iter().enumerate() {
        for (idx, id) in bucket.iter().enumerate() {
            slot.insert(id.clone(), (rank, idx));
        }
    }

    for branch_id in graph.nodes.keys() {
        // First edge per child wins; its order key carries the handle index.
        let mut children: Vec<(usize, &str)> = Vec::new();
        for (declaration, edge) in graph.edges.iter().enumerate() {
            if edge.source != *branch_id || edge.target == *branch_id {
                continue;
            }
            if children.iter().any(|(_, id)| *id == edge.target) {
                continue;
            }
            children.push((edge.order_key(declaration), edge.target.as_str()));
        }
        if children.len() < 2 {
            continue;
        }

        // Group by rank; children pulled deeper by other parents are ordered
        // within their own row only.
        let mut by_rank: FxHashMap<usize, Vec<(usize, &str)>> = FxHashMap::default();
        for &(key, id) in &children {
            if let Some(&(rank, _)) = slot.get(id) {
                by_rank.entry(rank).or_default().push((key, id));
            }
        }

        for (rank, mut members) in by_rank {
            if members.len() < 2 {
                continue;
            }
            let mut positions: Vec<usize> = members
                .iter()
                .map(|(_, id)| slot[*id].1)
                .collect();
            positions.sort_unstable();
            members.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            for (&position, &(_, id)) in positions.iter().zip(&members) {
                rank_nodes[rank][position] = id.to_string();
                slot.insert(id.to_string(), (rank, position));
            }
        }
    }
}
