use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Weather above this value counts as wet for the lookup table strategy.
const WET_THRESHOLD: f64 = 0.1;
const WET_FACTOR: f64 = 1.15;

/// Result of an ideal time query. `Unreachable` must never be used as a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdealTime {
    Reachable(f64),
    Unreachable,
}

impl IdealTime {
    /// Returns the time in seconds or the `-1.0` sentinel if no ideal time exists.
    pub fn as_seconds(&self) -> f64 {
        match self {
            IdealTime::Reachable(t) => *t,
            IdealTime::Unreachable => -1.0,
        }
    }

    pub fn or(self, fallback: f64) -> f64 {
        match self {
            IdealTime::Reachable(t) => t,
            IdealTime::Unreachable => fallback,
        }
    }
}

/// * `from` - Start node of the segment
/// * `to` - End node of the segment
/// * `base_time` - (s) Dry traversal time
/// * `grip_factor` - Sensitivity to rain (1.0 = standard, higher = more affected)
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SegmentPars {
    pub from: usize,
    pub to: usize,
    pub base_time: f64,
    pub grip_factor: f64,
}

/// * `no_nodes` - Number of nodes of the track graph
/// * `segments` - Directed track segments
/// * `start` - Start node of the ideal lap
/// * `end` - End node of the ideal lap
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TrackGraphPars {
    pub no_nodes: usize,
    pub segments: Vec<SegmentPars>,
    pub start: usize,
    pub end: usize,
}

impl Default for TrackGraphPars {
    /// Ten sectors of 10 s in a loop, start/finish between sector 0 and 9 (90 s dry).
    fn default() -> Self {
        let no_nodes = 10;
        TrackGraphPars {
            no_nodes,
            segments: (0..no_nodes)
                .map(|i| SegmentPars {
                    from: i,
                    to: (i + 1) % no_nodes,
                    base_time: 10.0,
                    grip_factor: 0.5,
                })
                .collect(),
            start: 0,
            end: no_nodes - 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    to: usize,
    base_time: f64,
    grip_factor: f64,
}

impl Segment {
    /// Weight = base_time * (1 + weather * grip_factor)
    fn weight(&self, weather: f64) -> f64 {
        self.base_time * (1.0 + weather * self.grip_factor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueEl {
    cost: f64,
    node: usize,
}

impl Eq for QueueEl {}

impl Ord for QueueEl {
    // reversed: BinaryHeap is a max-heap, Dijkstra needs the cheapest element first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// TrackGraph is a directed graph of track segments. Segments referring to nodes outside the
/// graph are dropped on construction.
#[derive(Debug, Clone)]
pub struct TrackGraph {
    adj: Vec<Vec<Segment>>,
    start: usize,
    end: usize,
}

impl TrackGraph {
    pub fn new(pars: &TrackGraphPars) -> TrackGraph {
        let mut adj = vec![Vec::new(); pars.no_nodes];

        for seg in pars.segments.iter() {
            if seg.from >= pars.no_nodes || seg.to >= pars.no_nodes {
                tracing::warn!(
                    from = seg.from,
                    to = seg.to,
                    "Ignoring track segment outside the graph"
                );
                continue;
            }
            adj[seg.from].push(Segment {
                to: seg.to,
                base_time: seg.base_time,
                grip_factor: seg.grip_factor,
            });
        }

        TrackGraph {
            adj,
            start: pars.start,
            end: pars.end,
        }
    }

    /// Shortest traversal time from `start` to `end` for a fixed weather (Dijkstra).
    pub fn shortest_time(&self, start: usize, end: usize, weather: f64) -> IdealTime {
        let no_nodes = self.adj.len();
        if start >= no_nodes || end >= no_nodes {
            return IdealTime::Unreachable;
        }

        let mut dist = vec![f64::INFINITY; no_nodes];
        let mut queue = BinaryHeap::new();

        dist[start] = 0.0;
        queue.push(QueueEl {
            cost: 0.0,
            node: start,
        });

        while let Some(QueueEl { cost, node }) = queue.pop() {
            if node == end {
                return IdealTime::Reachable(cost);
            }
            if cost > dist[node] {
                continue;
            }

            for seg in self.adj[node].iter() {
                let cost_next = cost + seg.weight(weather);
                if cost_next < dist[seg.to] {
                    dist[seg.to] = cost_next;
                    queue.push(QueueEl {
                        cost: cost_next,
                        node: seg.to,
                    });
                }
            }
        }

        IdealTime::Unreachable
    }

    pub fn ideal_lap_time(&self, weather: f64) -> IdealTime {
        self.shortest_time(self.start, self.end, weather)
    }
}

/// * `name` - Track name as used for the race slot
/// * `ideal_lap_time` - (s) Dry ideal lap time
/// * `difficulty` - (Optional) overtaking difficulty, falls back to the global value
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TrackEntry {
    pub name: String,
    pub ideal_lap_time: f64,
    pub difficulty: Option<f64>,
}

/// Configuration of the ideal time strategy.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum IdealTimePars {
    Graph(TrackGraphPars),
    Table { tracks: Vec<TrackEntry> },
}

impl Default for IdealTimePars {
    fn default() -> Self {
        IdealTimePars::Graph(TrackGraphPars::default())
    }
}

/// IdealTimeResolver answers "what is the reference lap time of this track in this weather".
/// Queries never change the track data and are deterministic.
#[derive(Debug, Clone)]
pub enum IdealTimeResolver {
    Graph(TrackGraph),
    Table(HashMap<String, TrackEntry>),
}

impl IdealTimeResolver {
    pub fn new(pars: &IdealTimePars) -> IdealTimeResolver {
        match pars {
            IdealTimePars::Graph(graph_pars) => IdealTimeResolver::Graph(TrackGraph::new(graph_pars)),
            IdealTimePars::Table { tracks } => IdealTimeResolver::Table(
                tracks
                    .iter()
                    .map(|entry| (entry.name.to_lowercase(), entry.to_owned()))
                    .collect(),
            ),
        }
    }

    /// The graph strategy uses the same graph for every track, the table strategy looks the
    /// track up by name (case-insensitive) and applies the wet factor above 0.1 weather.
    pub fn ideal_time(&self, track_name: &str, weather: f64) -> IdealTime {
        match self {
            IdealTimeResolver::Graph(graph) => graph.ideal_lap_time(weather),
            IdealTimeResolver::Table(tracks) => match tracks.get(&track_name.to_lowercase()) {
                Some(entry) => {
                    let mut ideal = entry.ideal_lap_time;
                    if weather > WET_THRESHOLD {
                        ideal *= WET_FACTOR;
                    }
                    IdealTime::Reachable(ideal)
                }
                None => IdealTime::Unreachable,
            },
        }
    }

    pub fn difficulty(&self, track_name: &str) -> Option<f64> {
        match self {
            IdealTimeResolver::Graph(_) => None,
            IdealTimeResolver::Table(tracks) => tracks
                .get(&track_name.to_lowercase())
                .and_then(|entry| entry.difficulty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn seg(from: usize, to: usize, base_time: f64, grip_factor: f64) -> SegmentPars {
        SegmentPars {
            from,
            to,
            base_time,
            grip_factor,
        }
    }

    #[test]
    fn default_loop_is_ninety_seconds_dry() {
        let graph = TrackGraph::new(&TrackGraphPars::default());
        assert_abs_diff_eq!(graph.ideal_lap_time(0.0).as_seconds(), 90.0, epsilon = 1e-9);
        // every segment gets 50% slower in full rain
        assert_abs_diff_eq!(graph.ideal_lap_time(1.0).as_seconds(), 135.0, epsilon = 1e-9);
    }

    #[test]
    fn weather_can_change_the_best_line() {
        // 0 -> 1 -> 3 is quick but grip sensitive, 0 -> 2 -> 3 is slower but robust
        let graph = TrackGraph::new(&TrackGraphPars {
            no_nodes: 4,
            segments: vec![
                seg(0, 1, 10.0, 2.0),
                seg(1, 3, 10.0, 2.0),
                seg(0, 2, 12.0, 0.0),
                seg(2, 3, 12.0, 0.0),
            ],
            start: 0,
            end: 3,
        });
        assert_eq!(graph.ideal_lap_time(0.0), IdealTime::Reachable(20.0));
        assert_eq!(graph.ideal_lap_time(1.0), IdealTime::Reachable(24.0));
    }

    #[test]
    fn unreachable_end_is_a_sentinel() {
        let graph = TrackGraph::new(&TrackGraphPars {
            no_nodes: 3,
            segments: vec![seg(0, 1, 5.0, 0.0), seg(2, 0, 5.0, 0.0)],
            start: 0,
            end: 2,
        });
        let ideal = graph.ideal_lap_time(0.0);
        assert_eq!(ideal, IdealTime::Unreachable);
        assert_abs_diff_eq!(ideal.as_seconds(), -1.0);
        assert_abs_diff_eq!(ideal.or(88.0), 88.0);
        assert_eq!(graph.shortest_time(0, 7, 0.0), IdealTime::Unreachable);
    }

    #[test]
    fn table_applies_wet_factor() {
        let resolver = IdealTimeResolver::new(&IdealTimePars::Table {
            tracks: vec![TrackEntry {
                name: "Monaco".to_owned(),
                ideal_lap_time: 72.0,
                difficulty: Some(0.9),
            }],
        });
        assert_eq!(resolver.ideal_time("monaco", 0.1), IdealTime::Reachable(72.0));
        assert_abs_diff_eq!(resolver.ideal_time("Monaco", 0.6).as_seconds(), 82.8, epsilon = 1e-9);
        assert_eq!(resolver.ideal_time("Imola", 0.0), IdealTime::Unreachable);
        assert_eq!(resolver.difficulty("MONACO"), Some(0.9));
    }

    #[test]
    fn strategy_is_read_from_json() {
        let pars: IdealTimePars = serde_json::from_str(
            r#"{"strategy": "table", "tracks": [{"name": "Spa", "ideal_lap_time": 106.0}]}"#,
        )
        .unwrap();
        let resolver = IdealTimeResolver::new(&pars);
        assert_eq!(resolver.ideal_time("Spa", 0.0), IdealTime::Reachable(106.0));
        assert_eq!(resolver.difficulty("Spa"), None);
    }
}
