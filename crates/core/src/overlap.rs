//! Turns the routes under a single click or hover into a decision.

use std::collections::BTreeSet;

use atlas_transit::RouteCode;
use itertools::Itertools;

use crate::map::HitFeature;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    Click,
    Hover,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlapOutcome {
    /// Nothing routable was hit
    NoOp,
    /// Commit this route as the selection
    Select(RouteCode),
    /// Emphasize this route, nothing is committed
    Highlight(RouteCode),
    /// Several routes coincide; the user has to pick one
    Disambiguate(BTreeSet<RouteCode>),
    /// Several routes under the pointer; name them all, commit nothing
    Tooltip(Vec<RouteCode>),
}

/// Route codes from route layers, first occurrence wins
pub fn hit_codes(hits: &[HitFeature]) -> Vec<RouteCode> {
    hits.iter()
        .filter(|hit| hit.source.is_route_layer())
        .filter_map(|hit| hit.route_code.clone())
        .unique()
        .collect()
}

pub fn resolve(interaction: Interaction, hits: &[HitFeature]) -> OverlapOutcome {
    let mut codes = hit_codes(hits);

    match (codes.len(), interaction) {
        (0, _) => OverlapOutcome::NoOp,
        (1, Interaction::Click) => OverlapOutcome::Select(codes.remove(0)),
        (1, Interaction::Hover) => OverlapOutcome::Highlight(codes.remove(0)),
        (_, Interaction::Click) => OverlapOutcome::Disambiguate(codes.into_iter().collect()),
        (_, Interaction::Hover) => OverlapOutcome::Tooltip(codes),
    }
}
