use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hasher;

use kgs_core::VertexId;
use sha2::{Digest, Sha256};
use siphasher::sip::SipHasher13;

use crate::multigraph::{ColorFilter, ColoredMultigraph};

/// Computes the canonical structural hash for the provided graph.
///
/// The hash depends on vertex labels but not on the order in which vertices
/// or parallel edges were inserted.
pub fn canonical_hash(graph: &ColoredMultigraph) -> String {
    let mut hasher = Sha256::new();
    encode_counts(graph, &mut hasher);

    let mut vertices: Vec<u64> = graph.vertices().iter().map(VertexId::as_raw).collect();
    vertices.sort_unstable();
    update_slice(&vertices, &mut hasher);

    let mut edges: Vec<(u64, u64, u64)> = graph
        .edges()
        .into_iter()
        .map(|(source, target, color)| (source.as_raw(), target.as_raw(), color as u64))
        .collect();
    edges.sort_unstable();
    hasher.update((edges.len() as u64).to_le_bytes());
    for (source, target, color) in edges {
        hasher.update(source.to_le_bytes());
        hasher.update(target.to_le_bytes());
        hasher.update(color.to_le_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Computes a label-independent fingerprint by color refinement.
///
/// Every vertex starts from its per-color in/out degree profile; each round
/// rehashes a vertex label together with the sorted labels of its per-color
/// out- and in-neighbors. Refinement stops once a round no longer splits any
/// class. Isomorphic graphs always share the fingerprint.
pub fn invariant_hash(graph: &ColoredMultigraph) -> String {
    let vertices = graph.vertices();
    let index: BTreeMap<VertexId, usize> = vertices
        .iter()
        .enumerate()
        .map(|(idx, vertex)| (*vertex, idx))
        .collect();
    let colors = graph.colors();

    // (out, in) neighbor indices per vertex and color
    let mut profile: Vec<Vec<(Vec<usize>, Vec<usize>)>> = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        let mut per_color = Vec::with_capacity(colors);
        for color in 0..colors {
            let neighborhood = graph
                .neighbors(*vertex, ColorFilter::Only(color))
                .unwrap_or_default();
            let lookup = |list: Vec<VertexId>| -> Vec<usize> {
                list.iter().filter_map(|w| index.get(w).copied()).collect()
            };
            per_color.push((lookup(neighborhood.outgoing), lookup(neighborhood.incoming)));
        }
        profile.push(per_color);
    }

    let mut labels: Vec<u64> = profile
        .iter()
        .map(|per_color| {
            let mut hasher = SipHasher13::new_with_keys(0, 0);
            for (outgoing, incoming) in per_color {
                hasher.write_u64(outgoing.len() as u64);
                hasher.write_u64(incoming.len() as u64);
            }
            hasher.finish()
        })
        .collect();

    let mut classes = distinct(&labels);
    for _ in 0..vertices.len() {
        let refined: Vec<u64> = profile
            .iter()
            .enumerate()
            .map(|(idx, per_color)| {
                let mut hasher = SipHasher13::new_with_keys(0, 0);
                hasher.write_u64(labels[idx]);
                for (color, (outgoing, incoming)) in per_color.iter().enumerate() {
                    hasher.write_u64(color as u64);
                    let mut out_labels: Vec<u64> = outgoing.iter().map(|w| labels[*w]).collect();
                    let mut in_labels: Vec<u64> = incoming.iter().map(|u| labels[*u]).collect();
                    out_labels.sort_unstable();
                    in_labels.sort_unstable();
                    write_all(&mut hasher, &out_labels);
                    write_all(&mut hasher, &in_labels);
                }
                hasher.finish()
            })
            .collect();
        let refined_classes = distinct(&refined);
        labels = refined;
        if refined_classes == classes {
            break;
        }
        classes = refined_classes;
    }

    let mut hasher = Sha256::new();
    encode_counts(graph, &mut hasher);
    labels.sort_unstable();
    update_slice(&labels, &mut hasher);
    format!("{:x}", hasher.finalize())
}

fn encode_counts(graph: &ColoredMultigraph, hasher: &mut Sha256) {
    hasher.update((graph.vertex_count() as u64).to_le_bytes());
    hasher.update((graph.edge_count() as u64).to_le_bytes());
    hasher.update((graph.colors() as u64).to_le_bytes());
}

fn distinct(labels: &[u64]) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}

fn write_all(hasher: &mut SipHasher13, values: &[u64]) {
    hasher.write_u64(values.len() as u64);
    for value in values {
        hasher.write_u64(*value);
    }
}

fn update_slice(values: &[u64], hasher: &mut Sha256) {
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        hasher.update(value.to_le_bytes());
    }
}
