use std::fmt::Write as _;

use client_core::MapMarker;
use shared::domain::{Coordinate, DayPlan, DaySegment};

pub fn day(plan: &DayPlan) -> String {
    let mut out = format!("Day {}\n", plan.day);
    let mut empty = true;
    for segment in DaySegment::ALL {
        let Some(label) = plan.label(segment) else {
            continue;
        };
        empty = false;
        let _ = write!(out, "  {:<10} {label}", format!("{}:", segment.label()));
        if let Some(location) = plan.location(segment) {
            let _ = write!(out, "  @ {location}");
        }
        out.push('\n');
    }
    if empty {
        out.push_str("  (nothing planned)\n");
    }
    out
}

pub fn map(center: Option<Coordinate>, markers: &[MapMarker]) -> String {
    let mut out = match center {
        Some(center) => format!("Map centered on {center}\n"),
        None => "Map has no center\n".to_string(),
    };
    for marker in markers {
        let _ = writeln!(
            out,
            "  [day {} {}] {} @ {}",
            marker.day,
            marker.segment.label().to_lowercase(),
            marker.label,
            marker.coordinate
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_lists_labelled_segments_with_locations() {
        let plan = DayPlan::new(2)
            .with_segment(
                DaySegment::Morning,
                "Amber Fort",
                Some(Coordinate::new(26.9855, 75.8513)),
            )
            .with_segment(DaySegment::Evening, "Chokhi Dhani", None);

        let rendered = day(&plan);

        assert_eq!(
            rendered,
            "Day 2\n  Morning:   Amber Fort  @ 26.9855, 75.8513\n  Evening:   Chokhi Dhani\n"
        );
    }

    #[test]
    fn empty_day_is_marked() {
        assert!(day(&DayPlan::new(1)).contains("nothing planned"));
    }

    #[test]
    fn map_lists_each_marker() {
        let markers = vec![MapMarker {
            day: 1,
            day_index: 0,
            segment: DaySegment::Morning,
            label: "Amber Fort".into(),
            coordinate: Coordinate::new(26.9855, 75.8513),
        }];

        let rendered = map(Some(Coordinate::new(26.9855, 75.8513)), &markers);

        assert!(rendered.starts_with("Map centered on 26.9855, 75.8513\n"));
        assert!(rendered.contains("[day 1 morning] Amber Fort @ 26.9855, 75.8513"));
    }
}
