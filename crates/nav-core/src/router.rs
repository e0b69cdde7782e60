//! Airway router.
//!
//! Nodes are waypoint names. An airway edge joins two adjacent entries of an
//! airway whose altitude band covers the cruise altitude; a direct edge joins
//! any node to waypoints within `max_direct_step_nm` (and to the destination
//! when it is within `max_search_distance_nm`). Edge cost is great-circle
//! distance scaled by the airway bonus, the preferred-airway bonus or the
//! direct penalty.

use crate::error::{NavError, NavResult};
use crate::models::{Route, RouteQuality, RouteSegment, Waypoint};
use crate::navdb::{normalize_name, NavDatabase, NavIndex};
use crate::spatial::{haversine_distance_nm, heading_difference, initial_bearing_deg};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

/// Altitude band given to direct legs.
pub const DIRECT_MIN_ALTITUDE_FT: f64 = 0.0;
pub const DIRECT_MAX_ALTITUDE_FT: f64 = 60000.0;

/// Flight levels are used at and above the transition altitude.
const TRANSITION_ALTITUDE_FT: f64 = 18000.0;
const MAX_TURN_DEG: f64 = 90.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Longest single edge the search will consider
    pub max_search_distance_nm: f64,
    pub prefer_airways: bool,
    pub min_altitude_ft: f64,
    pub max_altitude_ft: f64,
    pub cruise_speed_kn: f64,
    pub fuel_burn_lb_per_nm: f64,
    /// Radius of the direct-neighbour set
    pub max_direct_step_nm: f64,
    pub airway_bonus: f64,
    pub direct_penalty: f64,
    pub preferred_airway_bonus: f64,
}

impl RouterConfig {
    fn airway_factor(&self) -> f64 {
        if self.prefer_airways {
            self.airway_bonus
        } else {
            1.0
        }
    }

    fn direct_factor(&self) -> f64 {
        if self.prefer_airways {
            self.direct_penalty
        } else {
            1.0
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_search_distance_nm: 500.0,
            prefer_airways: true,
            min_altitude_ft: 0.0,
            max_altitude_ft: 60000.0,
            cruise_speed_kn: 450.0,
            fuel_burn_lb_per_nm: 15.0,
            max_direct_step_nm: 120.0,
            airway_bonus: 0.9,
            direct_penalty: 1.2,
            preferred_airway_bonus: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenNode {
    f_score: FloatOrd,
    g_score: FloatOrd,
    name: String,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Parameters of one A* run.
#[derive(Debug, Clone)]
pub(crate) struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub cruise_altitude_ft: f64,
    pub allow_direct: bool,
    pub airway_factor: f64,
    pub direct_factor: f64,
    pub preferred_factor: f64,
    pub preferred_airways: HashSet<String>,
    pub max_edge_nm: f64,
    pub max_direct_step_nm: f64,
    pub banned_edges: HashSet<(String, String)>,
    pub banned_nodes: HashSet<String>,
}

impl SearchRequest {
    /// Plain shortest path over airway edges only.
    pub fn airways_only(origin: &str, destination: &str, cruise_altitude_ft: f64) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            cruise_altitude_ft,
            allow_direct: false,
            airway_factor: 1.0,
            direct_factor: 1.0,
            preferred_factor: 1.0,
            preferred_airways: HashSet::new(),
            max_edge_nm: f64::INFINITY,
            max_direct_step_nm: 0.0,
            banned_edges: HashSet::new(),
            banned_nodes: HashSet::new(),
        }
    }

    fn from_config(
        config: &RouterConfig,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
    ) -> Self {
        Self {
            allow_direct: true,
            airway_factor: config.airway_factor(),
            direct_factor: config.direct_factor(),
            preferred_factor: config.preferred_airway_bonus,
            max_edge_nm: config.max_search_distance_nm,
            max_direct_step_nm: config.max_direct_step_nm,
            ..Self::airways_only(origin, destination, cruise_altitude_ft)
        }
    }

    fn airway_cost_factor(&self, airway: &str) -> f64 {
        if self.preferred_airways.contains(airway) {
            self.airway_factor * self.preferred_factor
        } else {
            self.airway_factor
        }
    }

    /// Smallest factor any edge can carry; scales the heuristic so it never
    /// overestimates.
    fn heuristic_factor(&self) -> f64 {
        let mut factor = self.airway_factor;
        if !self.preferred_airways.is_empty() {
            factor = factor.min(self.airway_factor * self.preferred_factor);
        }
        if self.allow_direct {
            factor = factor.min(self.direct_factor);
        }
        factor.max(0.0)
    }

    fn is_banned(&self, from: &str, to: &str) -> bool {
        self.banned_nodes.contains(to)
            || self
                .banned_edges
                .contains(&(from.to_string(), to.to_string()))
    }
}

/// One edge of a search result.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PathStep {
    pub from: String,
    pub to: String,
    pub airway: Option<String>,
    pub distance_nm: f64,
    pub cost: f64,
    pub min_altitude_ft: f64,
    pub max_altitude_ft: f64,
}

impl PathStep {
    fn same_edge(&self, other: &PathStep) -> bool {
        self.from == other.from && self.to == other.to && self.airway == other.airway
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SearchPath {
    pub origin: String,
    pub steps: Vec<PathStep>,
    pub cost: f64,
    pub nodes_visited: usize,
}

impl SearchPath {
    pub fn node_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.steps.len() + 1);
        names.push(self.origin.clone());
        names.extend(self.steps.iter().map(|step| step.to.clone()));
        names
    }

    fn distance_nm(&self) -> f64 {
        self.steps.iter().map(|step| step.distance_nm).sum()
    }

    fn same_steps(&self, other: &SearchPath) -> bool {
        self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.same_edge(b))
    }
}

fn better_step(candidate: &PathStep, current: &PathStep) -> bool {
    match candidate.cost.total_cmp(&current.cost) {
        Ordering::Less => true,
        Ordering::Greater => false,
        // airway legs win ties over direct legs, then lowest airway name
        Ordering::Equal => match (&candidate.airway, &current.airway) {
            (Some(_), None) => true,
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
    }
}

/// Cheapest edge to every neighbour of `from`, ordered by neighbour name.
fn expand(index: &NavIndex, request: &SearchRequest, from: &Waypoint) -> Vec<PathStep> {
    let mut best: BTreeMap<String, PathStep> = BTreeMap::new();
    let mut offer = |step: PathStep| match best.get(&step.to) {
        Some(current) if !better_step(&step, current) => {}
        _ => {
            best.insert(step.to.clone(), step);
        }
    };

    for (neighbor, airway) in index.airway_neighbors(&from.name) {
        if !airway.covers_altitude(request.cruise_altitude_ft)
            || request.is_banned(&from.name, neighbor)
        {
            continue;
        }
        let Some(to) = index.waypoint(neighbor) else {
            continue;
        };
        let distance_nm = haversine_distance_nm(from.lat, from.lon, to.lat, to.lon);
        if distance_nm > request.max_edge_nm {
            continue;
        }
        offer(PathStep {
            from: from.name.clone(),
            to: to.name.clone(),
            airway: Some(airway.name.clone()),
            distance_nm,
            cost: distance_nm * request.airway_cost_factor(&airway.name),
            min_altitude_ft: airway.min_altitude_ft,
            max_altitude_ft: airway.max_altitude_ft,
        });
    }

    if request.allow_direct {
        let radius = request.max_direct_step_nm.min(request.max_edge_nm);
        let mut candidates = if radius >= 0.0 {
            index.nearby_names(from.lat, from.lon, radius)
        } else {
            Vec::new()
        };
        if let Some(goal) = index.waypoint(&request.destination) {
            let distance_nm = haversine_distance_nm(from.lat, from.lon, goal.lat, goal.lon);
            if distance_nm <= request.max_edge_nm {
                candidates.push((goal.name.clone(), distance_nm));
            }
        }
        for (name, distance_nm) in candidates {
            if name == from.name || request.is_banned(&from.name, &name) {
                continue;
            }
            offer(PathStep {
                from: from.name.clone(),
                to: name,
                airway: None,
                distance_nm,
                cost: distance_nm * request.direct_factor,
                min_altitude_ft: DIRECT_MIN_ALTITUDE_FT,
                max_altitude_ft: DIRECT_MAX_ALTITUDE_FT,
            });
        }
    }

    best.into_values().collect()
}

/// A* from `request.origin` to `request.destination`.
///
/// Ties in the open set break by lower `g`, then by waypoint name. Returns
/// `None` when either endpoint is unknown or the frontier is exhausted.
pub(crate) fn search(index: &NavIndex, request: &SearchRequest) -> Option<SearchPath> {
    let start = index.waypoint(&request.origin)?;
    let goal = index.waypoint(&request.destination)?;
    if request.banned_nodes.contains(&start.name) {
        return None;
    }

    let h_factor = request.heuristic_factor();
    let heuristic =
        |wp: &Waypoint| haversine_distance_nm(wp.lat, wp.lon, goal.lat, goal.lon) * h_factor;

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    open_set.push(Reverse(OpenNode {
        f_score: FloatOrd(heuristic(start)),
        g_score: FloatOrd(0.0),
        name: start.name.clone(),
    }));
    let mut g_score: HashMap<String, f64> = HashMap::new();
    let mut came_from: HashMap<String, PathStep> = HashMap::new();
    let mut closed_set: HashSet<String> = HashSet::new();
    g_score.insert(start.name.clone(), 0.0);

    let mut nodes_visited = 0usize;

    while let Some(Reverse(current)) = open_set.pop() {
        if closed_set.contains(&current.name) {
            continue;
        }
        let best_g = g_score
            .get(&current.name)
            .copied()
            .unwrap_or(f64::INFINITY);
        if current.g_score.0 > best_g + 1e-9 {
            continue;
        }

        nodes_visited += 1;

        if current.name == goal.name {
            let mut steps = Vec::new();
            let mut cursor = current.name.clone();
            while let Some(step) = came_from.get(&cursor) {
                cursor = step.from.clone();
                steps.push(step.clone());
            }
            steps.reverse();
            return Some(SearchPath {
                origin: start.name.clone(),
                steps,
                cost: best_g,
                nodes_visited,
            });
        }

        closed_set.insert(current.name.clone());
        let Some(node) = index.waypoint(&current.name) else {
            continue;
        };

        for step in expand(index, request, node) {
            if closed_set.contains(&step.to) {
                continue;
            }
            let tentative_g = best_g + step.cost;
            if tentative_g < g_score.get(&step.to).copied().unwrap_or(f64::INFINITY) {
                let Some(next) = index.waypoint(&step.to) else {
                    continue;
                };
                g_score.insert(step.to.clone(), tentative_g);
                open_set.push(Reverse(OpenNode {
                    f_score: FloatOrd(tentative_g + heuristic(next)),
                    g_score: FloatOrd(tentative_g),
                    name: step.to.clone(),
                }));
                came_from.insert(step.to.clone(), step);
            }
        }
    }

    tracing::debug!(
        origin = %request.origin,
        destination = %request.destination,
        nodes_visited,
        "Route search exhausted frontier"
    );
    None
}

/// Yen's loopless k-shortest paths built on `search`.
fn k_shortest(index: &NavIndex, base: &SearchRequest, k: usize) -> Vec<SearchPath> {
    let Some(best) = search(index, base) else {
        return Vec::new();
    };
    let mut accepted = vec![best];
    let mut candidates: Vec<SearchPath> = Vec::new();

    while accepted.len() < k {
        let Some(previous) = accepted.last().cloned() else {
            break;
        };
        let previous_nodes = previous.node_names();

        for spur_idx in 0..previous.steps.len() {
            let root_nodes = &previous_nodes[..=spur_idx];
            let spur_node = &previous_nodes[spur_idx];

            let mut request = base.clone();
            request.origin = spur_node.clone();
            for path in &accepted {
                let nodes = path.node_names();
                if nodes.len() > spur_idx + 1 && nodes[..=spur_idx] == *root_nodes {
                    request
                        .banned_edges
                        .insert((nodes[spur_idx].clone(), nodes[spur_idx + 1].clone()));
                }
            }
            request
                .banned_nodes
                .extend(root_nodes[..spur_idx].iter().cloned());

            let Some(spur) = search(index, &request) else {
                continue;
            };

            let mut steps: Vec<PathStep> = previous.steps[..spur_idx].to_vec();
            steps.extend(spur.steps);
            let cost = steps.iter().map(|step| step.cost).sum();
            let candidate = SearchPath {
                origin: previous.origin.clone(),
                steps,
                cost,
                nodes_visited: spur.nodes_visited,
            };
            let known = accepted
                .iter()
                .chain(candidates.iter())
                .any(|path| path.same_steps(&candidate));
            if !known {
                candidates.push(candidate);
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| a.distance_nm().total_cmp(&b.distance_nm()))
                .then_with(|| a.node_names().cmp(&b.node_names()))
        });
        accepted.push(candidates.remove(0));
    }

    accepted
}

/// Stateless router over a shared navigation database.
pub struct AirwayRouter {
    db: Arc<NavDatabase>,
    config: RouterConfig,
}

impl AirwayRouter {
    pub fn new(db: Arc<NavDatabase>, config: RouterConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<NavDatabase> {
        &self.db
    }

    fn check_request(
        &self,
        index: &NavIndex,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
    ) -> NavResult<()> {
        if !cruise_altitude_ft.is_finite()
            || cruise_altitude_ft < self.config.min_altitude_ft
            || cruise_altitude_ft > self.config.max_altitude_ft
        {
            return Err(NavError::invalid_input(
                "cruise_altitude_ft",
                format!(
                    "{cruise_altitude_ft} outside [{}, {}] ft",
                    self.config.min_altitude_ft, self.config.max_altitude_ft
                ),
            ));
        }
        for name in [origin, destination] {
            if index.waypoint(name).is_none() {
                return Err(NavError::NotFound(format!("waypoint {name}")));
            }
        }
        if origin == destination {
            return Err(NavError::invalid_input(
                "destination",
                "origin and destination are the same waypoint",
            ));
        }
        Ok(())
    }

    fn route_from_path(&self, index: &NavIndex, path: &SearchPath, cruise_altitude_ft: f64) -> Route {
        let segments = path
            .steps
            .iter()
            .map(|step| self.segment(index, step))
            .collect();
        let mut route = Route::from_segments(segments, cruise_altitude_ft, path.cost);
        route.nodes_visited = path.nodes_visited;
        route
    }

    fn segment(&self, index: &NavIndex, step: &PathStep) -> RouteSegment {
        let heading_deg = match (index.waypoint(&step.from), index.waypoint(&step.to)) {
            (Some(a), Some(b)) => initial_bearing_deg(a.lat, a.lon, b.lat, b.lon),
            _ => 0.0,
        };
        RouteSegment {
            from: step.from.clone(),
            to: step.to.clone(),
            airway: step.airway.clone(),
            distance_nm: step.distance_nm,
            heading_deg,
            min_altitude_ft: step.min_altitude_ft,
            max_altitude_ft: step.max_altitude_ft,
            time_min: self.leg_time_min(step.distance_nm),
            fuel_lb: step.distance_nm * self.config.fuel_burn_lb_per_nm,
        }
    }

    fn leg_time_min(&self, distance_nm: f64) -> f64 {
        if self.config.cruise_speed_kn > 0.0 {
            distance_nm / self.config.cruise_speed_kn * 60.0
        } else {
            0.0
        }
    }

    fn run(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
        preferred: &[&str],
    ) -> NavResult<Route> {
        let origin = normalize_name(origin);
        let destination = normalize_name(destination);
        let index = self.db.read();
        self.check_request(&index, &origin, &destination, cruise_altitude_ft)?;

        let mut request =
            SearchRequest::from_config(&self.config, &origin, &destination, cruise_altitude_ft);
        request.preferred_airways = preferred.iter().map(|name| normalize_name(name)).collect();

        let path = search(&index, &request)
            .ok_or_else(|| NavError::no_route(origin.clone(), destination.clone()))?;
        tracing::debug!(
            origin = %origin,
            destination = %destination,
            nodes_visited = path.nodes_visited,
            legs = path.steps.len(),
            "Route found"
        );
        Ok(self.route_from_path(&index, &path, cruise_altitude_ft))
    }

    /// Cheapest route at the cruise altitude.
    pub fn find_optimal_route(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
    ) -> NavResult<Route> {
        self.run(origin, destination, cruise_altitude_ft, &[])
    }

    /// Like `find_optimal_route`, with an extra bonus on the named airways.
    ///
    /// The bonus only rescales edge costs, so this reaches the destination
    /// exactly when the optimal search does. Unknown airway names are ignored.
    pub fn find_preferred_route(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
        preferred_airways: &[&str],
    ) -> NavResult<Route> {
        self.run(origin, destination, cruise_altitude_ft, preferred_airways)
    }

    /// Up to `max_results` distinct loopless routes in non-decreasing cost,
    /// the optimal route first.
    pub fn find_alternate_routes(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
        max_results: usize,
    ) -> NavResult<Vec<Route>> {
        let origin = normalize_name(origin);
        let destination = normalize_name(destination);
        let index = self.db.read();
        self.check_request(&index, &origin, &destination, cruise_altitude_ft)?;
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let request =
            SearchRequest::from_config(&self.config, &origin, &destination, cruise_altitude_ft);
        let paths = k_shortest(&index, &request, max_results);
        if paths.is_empty() {
            return Err(NavError::no_route(origin, destination));
        }
        tracing::debug!(
            origin = %origin,
            destination = %destination,
            found = paths.len(),
            "Alternate routes computed"
        );
        Ok(paths
            .iter()
            .map(|path| self.route_from_path(&index, path, cruise_altitude_ft))
            .collect())
    }

    /// Single great-circle leg with the direct altitude band.
    pub fn direct_route(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
    ) -> NavResult<Route> {
        let a = self
            .db
            .get_waypoint(origin)
            .ok_or_else(|| NavError::NotFound(format!("waypoint {origin}")))?;
        let b = self
            .db
            .get_waypoint(destination)
            .ok_or_else(|| NavError::NotFound(format!("waypoint {destination}")))?;
        let distance_nm = haversine_distance_nm(a.lat, a.lon, b.lat, b.lon);
        let segment = RouteSegment {
            from: a.name.clone(),
            to: b.name.clone(),
            airway: None,
            distance_nm,
            heading_deg: initial_bearing_deg(a.lat, a.lon, b.lat, b.lon),
            min_altitude_ft: DIRECT_MIN_ALTITUDE_FT,
            max_altitude_ft: DIRECT_MAX_ALTITUDE_FT,
            time_min: self.leg_time_min(distance_nm),
            fuel_lb: distance_nm * self.config.fuel_burn_lb_per_nm,
        };
        let cost = distance_nm * self.config.direct_factor();
        Ok(Route::from_segments(vec![segment], cruise_altitude_ft, cost))
    }

    /// Rebuild a route from a waypoint list, using the first airway that
    /// covers the cruise altitude for each leg and a direct leg otherwise.
    pub fn build_route<S: AsRef<str>>(
        &self,
        waypoints: &[S],
        cruise_altitude_ft: f64,
    ) -> NavResult<Route> {
        if waypoints.len() < 2 {
            return Err(NavError::invalid_input(
                "waypoints",
                "a route needs at least 2 waypoints",
            ));
        }
        let index = self.db.read();
        let mut steps = Vec::with_capacity(waypoints.len() - 1);
        for pair in waypoints.windows(2) {
            let from_name = normalize_name(pair[0].as_ref());
            let to_name = normalize_name(pair[1].as_ref());
            let from = index
                .waypoint(&from_name)
                .ok_or_else(|| NavError::NotFound(format!("waypoint {from_name}")))?;
            let to = index
                .waypoint(&to_name)
                .ok_or_else(|| NavError::NotFound(format!("waypoint {to_name}")))?;
            let distance_nm = haversine_distance_nm(from.lat, from.lon, to.lat, to.lon);
            let airway = index
                .airways_for_leg(&from_name, &to_name)
                .into_iter()
                .find(|airway| airway.covers_altitude(cruise_altitude_ft));
            let step = match airway {
                Some(airway) => PathStep {
                    from: from_name,
                    to: to_name,
                    airway: Some(airway.name.clone()),
                    distance_nm,
                    cost: distance_nm * self.config.airway_factor(),
                    min_altitude_ft: airway.min_altitude_ft,
                    max_altitude_ft: airway.max_altitude_ft,
                },
                None => PathStep {
                    from: from_name,
                    to: to_name,
                    airway: None,
                    distance_nm,
                    cost: distance_nm * self.config.direct_factor(),
                    min_altitude_ft: DIRECT_MIN_ALTITUDE_FT,
                    max_altitude_ft: DIRECT_MAX_ALTITUDE_FT,
                },
            };
            steps.push(step);
        }
        let origin = normalize_name(waypoints[0].as_ref());
        let cost = steps.iter().map(|step| step.cost).sum();
        let path = SearchPath {
            origin,
            steps,
            cost,
            nodes_visited: 0,
        };
        Ok(self.route_from_path(&index, &path, cruise_altitude_ft))
    }

    /// Course on arrival at the end of a leg: the reverse of the great-circle
    /// bearing from its end back to its start.
    fn inbound_course_deg(&self, segment: &RouteSegment) -> f64 {
        match self.db.calculate_heading(&segment.to, &segment.from) {
            Ok(reverse) => (reverse + 180.0).rem_euclid(360.0),
            Err(_) => segment.heading_deg,
        }
    }

    /// Distance, time, fuel and quality figures for a route.
    pub fn analyze_route(&self, route: &Route) -> RouteQuality {
        let total_distance_nm: f64 = route.segments.iter().map(|s| s.distance_nm).sum();
        let direct_distance_nm = match (route.origin(), route.destination()) {
            (Some(origin), Some(destination)) => self
                .db
                .calculate_distance(origin, destination)
                .unwrap_or(total_distance_nm),
            _ => 0.0,
        };
        let estimated_time_min = route
            .segments
            .iter()
            .map(|s| self.leg_time_min(s.distance_nm))
            .sum();
        let fuel_lb = total_distance_nm * self.config.fuel_burn_lb_per_nm;
        let altitude_violations = route
            .segments
            .iter()
            .filter(|s| !s.covers_altitude(route.cruise_altitude_ft))
            .count();
        let turn_restrictions = route
            .segments
            .windows(2)
            .filter(|pair| {
                heading_difference(self.inbound_course_deg(&pair[0]), pair[1].heading_deg)
                    > MAX_TURN_DEG
            })
            .count();

        let legs = route.segments.len();
        let cost_index = if legs == 0 {
            0.0
        } else {
            let inefficiency = if total_distance_nm > 0.0 {
                (1.0 - direct_distance_nm / total_distance_nm).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let violation_ratio = altitude_violations as f64 / legs as f64;
            let turn_ratio = turn_restrictions as f64 / (legs.saturating_sub(1).max(1)) as f64;
            (0.5 * inefficiency + 0.3 * violation_ratio + 0.2 * turn_ratio).clamp(0.0, 1.0)
        };

        RouteQuality {
            total_distance_nm,
            direct_distance_nm,
            estimated_time_min,
            fuel_lb,
            altitude_violations,
            turn_restrictions,
            cost_index,
        }
    }
}

/// `KJFK → WP1 (airway J121) → KBOS (airway J121)`; direct legs carry no tag.
pub fn format_route(route: &Route) -> String {
    let Some(origin) = route.origin() else {
        return String::new();
    };
    let mut out = origin.to_string();
    for segment in &route.segments {
        out.push_str(" → ");
        out.push_str(&segment.to);
        if let Some(airway) = &segment.airway {
            out.push_str(&format!(" (airway {airway})"));
        }
    }
    out
}

/// Recover the waypoint sequence from `format_route` output.
/// Accepts `->` as well as `→` between waypoints.
pub fn parse_route(text: &str) -> NavResult<Vec<String>> {
    let normalized = text.replace("->", "→");
    let mut names = Vec::new();
    for (idx, part) in normalized.split('→').enumerate() {
        let name = match part.find('(') {
            Some(open) => &part[..open],
            None => part,
        }
        .trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(NavError::invalid_input(
                "route",
                format!("element {idx} ('{}') is not a waypoint", part.trim()),
            ));
        }
        names.push(name.to_ascii_uppercase());
    }
    if names.len() < 2 {
        return Err(NavError::invalid_input(
            "route",
            "a route needs at least 2 waypoints",
        ));
    }
    Ok(names)
}

/// Flight level at or above 18,000 ft (`FL350`), hundreds of feet below (`A050`).
pub fn format_altitude(altitude_ft: f64) -> String {
    let hundreds = (altitude_ft / 100.0).round().max(0.0) as u32;
    // compare what is written, so 17,960 ft cannot print as A180
    if f64::from(hundreds) * 100.0 >= TRANSITION_ALTITUDE_FT {
        format!("FL{hundreds:03}")
    } else {
        format!("A{hundreds:03}")
    }
}

/// Filing string: origin and destination, then the route body with
/// consecutive legs on one airway collapsed and direct legs as `DCT`, then the
/// cruise altitude.
///
/// `KJFK KBOS KJFK J121 KBOS FL350`
pub fn format_route_for_filing(route: &Route) -> String {
    let (Some(origin), Some(destination)) = (route.origin(), route.destination()) else {
        return String::new();
    };
    let mut parts: Vec<String> = vec![origin.to_string(), destination.to_string(), origin.to_string()];
    let mut idx = 0;
    while idx < route.segments.len() {
        let airway = route.segments[idx].airway.clone();
        let mut end = idx;
        if airway.is_some() {
            while end + 1 < route.segments.len() && route.segments[end + 1].airway == airway {
                end += 1;
            }
        }
        parts.push(airway.unwrap_or_else(|| "DCT".to_string()));
        parts.push(route.segments[end].to.clone());
        idx = end + 1;
    }
    parts.push(format_altitude(route.cruise_altitude_ft));
    parts.join(" ")
}
