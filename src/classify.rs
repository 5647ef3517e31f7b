use geo::{Coord, Rect};
use indicatif::ParallelProgressIterator;
use log::{debug, info};
use rayon::prelude::*;

use crate::municipality::{Boundary, Municipality};
use crate::tracks::Track;

/// Municipalities split by whether a done track passes through them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    pub visited: Vec<Municipality>,
    pub todo: Vec<Municipality>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    pub visited: usize,
    pub planned: usize,
    pub unvisited: usize,
}

impl ClassificationResult {
    pub fn summary(&self) -> ClassificationSummary {
        let planned = self.todo.iter().filter(|m| m.planned).count();
        ClassificationSummary {
            visited: self.visited.len(),
            planned,
            unvisited: self.todo.len() - planned,
        }
    }
}

fn rect_contains(rect: &Rect<f64>, coord: &Coord<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    min.x <= coord.x && coord.x <= max.x && min.y <= coord.y && coord.y <= max.y
}

/// Whether any point of the track lies in the boundary, edges included.
/// Stops at the first such point.
fn passes_through(boundary: &Boundary, rect: Option<&Rect<f64>>, track: &Track) -> bool {
    let Some(rect) = rect else {
        return false;
    };
    track
        .points
        .iter()
        .any(|coord| rect_contains(rect, coord) && boundary.contains(coord))
}

fn classify_municipality(
    mut municipality: Municipality,
    done_by_date: &[&Track],
    planned: &[Track],
) -> Municipality {
    let rect = municipality.boundary.bounding_rect();
    let boundary = &municipality.boundary;

    // earliest track wins because the slice is in date order
    let first_visit = done_by_date
        .iter()
        .find(|track| passes_through(boundary, rect.as_ref(), track))
        .map(|track| track.date);

    let is_planned = first_visit.is_none()
        && planned
            .iter()
            .any(|track| passes_through(boundary, rect.as_ref(), track));

    match (first_visit, is_planned) {
        (Some(date), _) => debug!("✅ {} (first visit {})", municipality.name, date),
        (None, true) => debug!("🗺 {} (planned)", municipality.name),
        (None, false) => debug!("❌ {}", municipality.name),
    }

    municipality.first_visit = first_visit;
    municipality.planned = is_planned;
    municipality
}

/// Classifies every municipality against the done and planned tracks.
///
/// Done tracks are scanned oldest first, so `first_visit` is the date of
/// the earliest track passing through. Planned tracks are only consulted
/// for municipalities no done track reaches. The output keeps the input
/// order within each partition.
pub fn classify(
    municipalities: Vec<Municipality>,
    done: &[Track],
    planned: &[Track],
) -> ClassificationResult {
    let mut done_by_date: Vec<&Track> = done.iter().collect();
    done_by_date.sort_by_key(|track| track.date);

    info!(
        "Classifying {} municipalities against {} done and {} planned tracks...",
        municipalities.len(),
        done.len(),
        planned.len()
    );

    let classified: Vec<Municipality> = municipalities
        .into_par_iter()
        .progress()
        .map(|municipality| classify_municipality(municipality, &done_by_date, planned))
        .collect();

    let (visited, todo): (Vec<_>, Vec<_>) =
        classified.into_iter().partition(Municipality::is_visited);

    let result = ClassificationResult { visited, todo };
    let summary = result.summary();
    info!(
        "✓ {} visited, {} planned, {} unvisited",
        summary.visited, summary.planned, summary.unvisited
    );
    result
}
