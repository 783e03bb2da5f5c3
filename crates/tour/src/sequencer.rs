//! Ordered waypoint sequence.
//!
//! Ordering contract:
//! - Dated waypoints come first, ascending by parsed year.
//! - Ties (same year) keep dataset order.
//! - Waypoints without a parseable year follow, in dataset order. They can
//!   still be visited individually but never match a year lookup.

use tracing::warn;

use crate::waypoint::{RawWaypoint, Waypoint};

#[derive(Debug, Clone, Default)]
pub struct WaypointSequencer {
    waypoints: Vec<Waypoint>,
}

impl WaypointSequencer {
    /// Builds the sequence once. An absent or empty dataset yields an empty
    /// sequence, which turns playback into a no-op.
    pub fn load(raw: Option<&[RawWaypoint]>) -> Self {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            warn!("waypoint dataset is missing or empty; playback disabled");
            return Self::default();
        };

        let mut waypoints: Vec<Waypoint> = Vec::with_capacity(raw.len());
        for record in raw {
            let wp = Waypoint::from(record);
            if !wp.location.is_finite() {
                warn!("skipping waypoint {:?}: non-finite location", wp.name);
                continue;
            }
            waypoints.push(wp);
        }

        // `sort_by_key` is stable, which is what keeps same-year ties in
        // dataset order.
        waypoints.sort_by_key(|wp| match wp.year_value() {
            Some(year) => (0u8, year),
            None => (1u8, 0),
        });

        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }

    pub fn index_of_year(&self, year: &str) -> Option<usize> {
        self.waypoints
            .iter()
            .position(|wp| wp.year_value().is_some() && wp.year.as_deref() == Some(year))
    }

    pub fn index_of_location(&self, lat: f64, lon: f64, eps_deg: f64) -> Option<usize> {
        let at = foundation::math::LatLng::new(lat, lon);
        self.waypoints
            .iter()
            .position(|wp| wp.location.approx_eq(at, eps_deg))
    }

    /// Where playback goes after dwelling at `index`.
    ///
    /// Inside a year group this is simply the next member. From the last
    /// member of a group it skips any undated entries and returns the first
    /// entry of the next group, or `None` at the end of the sequence.
    pub fn next_index_after_year_group(&self, index: usize) -> Option<usize> {
        let year = self.waypoints.get(index)?.year_value();

        let mut last_in_group = index;
        while let Some(next) = self.waypoints.get(last_in_group + 1) {
            if next.year_value() != year {
                break;
            }
            last_in_group += 1;
        }
        if last_in_group != index {
            return Some(index + 1);
        }

        (last_in_group + 1..self.waypoints.len())
            .find(|&i| self.waypoints[i].year_value().is_some())
    }

    /// Distinct dated years in ascending numeric order (timeline entries).
    pub fn years(&self) -> Vec<String> {
        let mut years: Vec<String> = Vec::new();
        for wp in &self.waypoints {
            if wp.year_value().is_none() {
                continue;
            }
            let Some(year) = wp.year.as_ref() else {
                continue;
            };
            if !years.contains(year) {
                years.push(year.clone());
            }
        }
        years
    }
}

#[cfg(test)]
mod tests {
    use super::WaypointSequencer;
    use crate::waypoint::RawWaypoint;
    use pretty_assertions::assert_eq;

    fn raw(name: &str, year: Option<&str>) -> RawWaypoint {
        RawWaypoint::new(name, year, [28.0, 112.0])
    }

    fn names(seq: &WaypointSequencer) -> Vec<&str> {
        seq.iter().map(|wp| wp.name.as_str()).collect()
    }

    #[test]
    fn sorts_by_numeric_year() {
        let data = vec![
            raw("c", Some("1950")),
            raw("a", Some("900")),
            raw("b", Some("1900")),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(names(&seq), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_dataset_order() {
        let data = vec![
            raw("x1", Some("1920")),
            raw("y1", Some("1900")),
            raw("x2", Some("1920")),
            raw("y2", Some("1900")),
            raw("x3", Some("1920")),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(names(&seq), vec!["y1", "y2", "x1", "x2", "x3"]);
    }

    #[test]
    fn sort_is_stable_for_any_permutation_of_ties() {
        // Every input order must come back grouped by year with the original
        // relative order inside each group.
        let years = ["1990", "1980", "1990", "1970", "1980", "1990"];
        for rotation in 0..years.len() {
            let data: Vec<RawWaypoint> = (0..years.len())
                .map(|i| {
                    let idx = (i + rotation) % years.len();
                    raw(&format!("{}-{idx}", years[idx]), Some(years[idx]))
                })
                .collect();
            let seq = WaypointSequencer::load(Some(data.as_slice()));

            let mut expected: Vec<(i64, usize, String)> = data
                .iter()
                .enumerate()
                .map(|(pos, r)| (r.year.as_deref().unwrap().parse().unwrap(), pos, r.name.clone()))
                .collect();
            expected.sort();
            let expected: Vec<String> = expected.into_iter().map(|(_, _, n)| n).collect();

            let got: Vec<String> = seq.iter().map(|wp| wp.name.clone()).collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn undated_waypoints_sort_last() {
        let data = vec![
            raw("u1", None),
            raw("b", Some("1950")),
            raw("u2", Some("n/a")),
            raw("a", Some("1900")),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(names(&seq), vec!["a", "b", "u1", "u2"]);
    }

    #[test]
    fn missing_or_empty_dataset_is_empty_sequence() {
        assert!(WaypointSequencer::load(None).is_empty());
        assert!(WaypointSequencer::load(Some(&[][..])).is_empty());
    }

    #[test]
    fn skips_non_finite_locations() {
        let data = vec![
            RawWaypoint::new("bad", Some("1900"), [f64::NAN, 112.0]),
            raw("good", Some("1900")),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(names(&seq), vec!["good"]);
    }

    #[test]
    fn index_of_year_finds_first_match() {
        let data = vec![raw("a", Some("1900")), raw("b", Some("1900")), raw("c", Some("1950"))];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(seq.index_of_year("1900"), Some(0));
        assert_eq!(seq.index_of_year("1950"), Some(2));
        assert_eq!(seq.index_of_year("2000"), None);
    }

    #[test]
    fn next_index_walks_group_then_skips_undated() {
        let data = vec![
            raw("a", Some("1900")),
            raw("b", Some("1900")),
            raw("c", Some("1950")),
            raw("u", None),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(seq.next_index_after_year_group(0), Some(1));
        assert_eq!(seq.next_index_after_year_group(1), Some(2));
        assert_eq!(seq.next_index_after_year_group(2), None);
        assert_eq!(seq.next_index_after_year_group(3), None);
        assert_eq!(seq.next_index_after_year_group(99), None);
    }

    #[test]
    fn year_groups_compare_numeric_years() {
        let data = vec![
            raw("a", Some("1900")),
            raw("b", Some("1900年")),
            raw("c", Some("1950")),
            raw("u", Some("unknown")),
            raw("v", None),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(names(&seq), vec!["a", "b", "c", "u", "v"]);
        assert_eq!(seq.next_index_after_year_group(0), Some(1));
        assert_eq!(seq.next_index_after_year_group(1), Some(2));
        // Undated labels form one group whatever their text.
        assert_eq!(seq.next_index_after_year_group(3), Some(4));
        assert_eq!(seq.next_index_after_year_group(4), None);
    }

    #[test]
    fn years_are_distinct_and_ascending() {
        let data = vec![
            raw("c", Some("1950")),
            raw("a", Some("1900")),
            raw("u", None),
            raw("b", Some("1900")),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(seq.years(), vec!["1900".to_string(), "1950".to_string()]);
    }

    #[test]
    fn index_of_location_matches_within_epsilon() {
        let data = vec![
            RawWaypoint::new("a", Some("1900"), [28.1, 112.9]),
            RawWaypoint::new("b", None, [28.2, 113.0]),
        ];
        let seq = WaypointSequencer::load(Some(data.as_slice()));
        assert_eq!(seq.index_of_location(28.2000001, 113.0, 1e-6), Some(1));
        assert_eq!(seq.index_of_location(28.3, 113.0, 1e-6), None);
    }
}
