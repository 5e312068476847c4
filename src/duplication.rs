//! Duplicate and near-duplicate method detection
//!
//! Exact duplicates share the SHA-256 of their normalized body. Near duplicates
//! are pairs whose character-level similarity
//! `1 - levenshtein / max(len1, len2)` lies strictly between the threshold and
//! 1.0. A pair whose length ratio is already at or below the threshold cannot
//! reach it and is skipped before the edit distance is computed.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::DuplicationConfig;
use crate::schema::EntityModel;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Collapse whitespace runs to single spaces
///
/// Front-ends remove comment nodes before handing body text over.
pub fn normalize_body(body: &str) -> String {
    WHITESPACE.replace_all(body, " ").trim().to_string()
}

/// SHA-256 of a normalized body, lowercase hex
pub fn hash_body(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `1 - levenshtein / max(len1, len2)` over characters
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance::edit_distance(a, b) as f64 / max_len as f64
}

/// One method body offered to the detector
#[derive(Debug, Clone)]
pub struct MethodBody<'a> {
    /// `Owner.name(ParamTypes)`
    pub id: String,
    /// Normalized body
    pub body: &'a str,
    pub line_count: usize,
    pub complexity: usize,
}

impl<'a> MethodBody<'a> {
    /// Every callable with a body, in method-id order
    pub fn collect(model: &'a EntityModel) -> Vec<MethodBody<'a>> {
        let mut bodies: Vec<MethodBody<'a>> = model
            .iter()
            .flat_map(|entity| {
                entity.callables().filter_map(move |member| {
                    member.body.as_deref().map(|body| MethodBody {
                        id: entity.member_id(member),
                        body,
                        line_count: member.line_count,
                        complexity: member.complexity.max(1),
                    })
                })
            })
            .collect();
        bodies.sort_by(|a, b| a.id.cmp(&b.id));
        bodies
    }
}

/// Exact or near
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicationKind {
    Exact,
    Similar,
}

/// A set of methods with identical or near-identical bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicationGroup {
    pub kind: DuplicationKind,
    /// Method ids, sorted
    pub members: Vec<String>,
    /// Representative line count (first member for exact groups, mean for near pairs)
    pub line_count: usize,
    /// 1.0 for exact groups
    pub similarity: f64,
    pub impact: f64,
}

impl DuplicationGroup {
    pub fn is_similar(&self) -> bool {
        self.kind == DuplicationKind::Similar
    }

    /// Lines that would disappear if the group were merged into one method
    pub fn duplicated_lines(&self) -> usize {
        self.line_count * self.members.len().saturating_sub(1)
    }
}

fn impact(size: usize, line_count: usize, avg_complexity: f64) -> f64 {
    size as f64 * line_count as f64 * (1.0 + avg_complexity / 10.0)
}

/// Find exact and near duplicate groups, sorted by impact then members
pub fn detect_duplicates(bodies: &[MethodBody<'_>], config: &DuplicationConfig) -> Vec<DuplicationGroup> {
    let mut by_hash: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, method) in bodies.iter().enumerate() {
        if method.body.chars().count() > config.min_body_length {
            by_hash.entry(hash_body(method.body)).or_default().push(idx);
        }
    }

    let mut groups = Vec::new();
    let mut exact_group_of: BTreeMap<usize, usize> = BTreeMap::new();

    for indices in by_hash.values().filter(|indices| indices.len() > 1) {
        let group_id = groups.len();
        for &idx in indices {
            exact_group_of.insert(idx, group_id);
        }

        let avg_complexity = indices.iter().map(|&i| bodies[i].complexity as f64).sum::<f64>()
            / indices.len() as f64;
        let line_count = bodies[indices[0]].line_count;

        groups.push(DuplicationGroup {
            kind: DuplicationKind::Exact,
            members: indices.iter().map(|&i| bodies[i].id.clone()).collect(),
            line_count,
            similarity: 1.0,
            impact: impact(indices.len(), line_count, avg_complexity),
        });
    }

    if config.detect_similar {
        let near = detect_similar_pairs(bodies, config.similarity_threshold, &exact_group_of);
        debug!("Duplication: {} exact groups, {} near pairs", groups.len(), near.len());
        groups.extend(near);
    }

    groups.sort_by(|a, b| {
        b.impact
            .total_cmp(&a.impact)
            .then_with(|| a.members.cmp(&b.members))
    });
    groups
}

fn detect_similar_pairs(
    bodies: &[MethodBody<'_>],
    threshold: f64,
    exact_group_of: &BTreeMap<usize, usize>,
) -> Vec<DuplicationGroup> {
    let lengths: Vec<usize> = bodies.iter().map(|m| m.body.chars().count()).collect();

    (0..bodies.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let lengths = &lengths;
            ((i + 1)..bodies.len()).filter_map(move |j| {
                let same_group = matches!(
                    (exact_group_of.get(&i), exact_group_of.get(&j)),
                    (Some(a), Some(b)) if a == b
                );
                if same_group {
                    return None;
                }

                let (short, long) = if lengths[i] <= lengths[j] {
                    (lengths[i], lengths[j])
                } else {
                    (lengths[j], lengths[i])
                };
                if long == 0 || (short as f64 / long as f64) <= threshold {
                    return None;
                }

                let (a, b) = (&bodies[i], &bodies[j]);
                let sim = similarity(a.body, b.body);
                if sim > threshold && sim < 1.0 {
                    let line_count = (a.line_count + b.line_count) / 2;
                    let avg_complexity = (a.complexity + b.complexity) as f64 / 2.0;
                    Some(DuplicationGroup {
                        kind: DuplicationKind::Similar,
                        members: vec![a.id.clone(), b.id.clone()],
                        line_count,
                        similarity: sim,
                        impact: impact(2, line_count, avg_complexity) * sim,
                    })
                } else {
                    None
                }
            })
        })
        .collect()
}

/// Method ids appearing in any group
pub fn duplicated_methods(groups: &[DuplicationGroup]) -> BTreeSet<&str> {
    groups
        .iter()
        .flat_map(|g| g.members.iter().map(String::as_str))
        .collect()
}
