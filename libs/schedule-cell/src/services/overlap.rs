// libs/schedule-cell/src/services/overlap.rs
//
// Overlap detection and column assignment for one rendering window.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{LayoutError, LayoutStrategy, PositionedAppointment, ScheduledAppointment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    overlap_group_size: usize,
    column_index: usize,
}

/// Lays out a day's appointments with the default sweep-line strategy.
pub fn layout_appointments<P>(
    appointments: Vec<ScheduledAppointment<P>>,
) -> Result<Vec<PositionedAppointment<P>>, LayoutError> {
    layout_with_strategy(appointments, LayoutStrategy::default())
}

/// Computes `overlap_group_size` and `column_index` for every appointment.
///
/// The whole batch is rejected if any appointment has `end <= start`. Results
/// come back ordered by `(start, id)`, which is also the column tie-break
/// order, regardless of the order they were passed in.
pub fn layout_with_strategy<P>(
    appointments: Vec<ScheduledAppointment<P>>,
    strategy: LayoutStrategy,
) -> Result<Vec<PositionedAppointment<P>>, LayoutError> {
    validate_intervals(&appointments)?;

    let mut sorted = appointments;
    sorted.sort_by(layout_order);

    let placements = match strategy {
        LayoutStrategy::Pairwise => pairwise_placements(&sorted),
        LayoutStrategy::SweepLine => sweep_placements(&sorted),
        LayoutStrategy::GreedyColumns => greedy_placements(&sorted),
    };

    debug!("Laid out {} appointments using {} strategy", sorted.len(), strategy);

    Ok(sorted
        .into_iter()
        .zip(placements)
        .map(|(appointment, placement)| PositionedAppointment {
            appointment,
            overlap_group_size: placement.overlap_group_size,
            column_index: placement.column_index,
            geometry: None,
        })
        .collect())
}

/// Largest overlap group in a laid-out batch, 0 when empty.
pub fn max_overlap<P>(positioned: &[PositionedAppointment<P>]) -> usize {
    positioned
        .iter()
        .map(|p| p.overlap_group_size)
        .max()
        .unwrap_or(0)
}

fn validate_intervals<P>(appointments: &[ScheduledAppointment<P>]) -> Result<(), LayoutError> {
    let ids: Vec<String> = appointments
        .iter()
        .filter(|a| !a.has_valid_interval())
        .map(|a| a.id.clone())
        .collect();

    if ids.is_empty() {
        return Ok(());
    }

    warn!("Rejecting schedule layout, {} appointment(s) with invalid interval: {:?}", ids.len(), ids);
    Err(LayoutError::InvalidInterval { ids })
}

// Ties on (start, id) only happen for duplicate ids; end keeps those stable.
fn layout_order<P>(a: &ScheduledAppointment<P>, b: &ScheduledAppointment<P>) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.end.cmp(&b.end))
}

fn pairwise_placements<P>(sorted: &[ScheduledAppointment<P>]) -> Vec<Placement> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let mut placement = Placement { overlap_group_size: 0, column_index: 0 };
            for (j, other) in sorted.iter().enumerate() {
                if other.overlaps(current) {
                    placement.overlap_group_size += 1;
                    if j < i {
                        placement.column_index += 1;
                    }
                }
            }
            placement
        })
        .collect()
}

/// Counting form of the pairwise rule.
///
/// Every appointment that ended at or before `current.start` also started
/// before it, so it is counted by both `started` and the rank of `current`.
/// Removing those leaves exactly the overlap set and the overlapping
/// predecessors.
fn sweep_placements<P>(sorted: &[ScheduledAppointment<P>]) -> Vec<Placement> {
    let mut ends: Vec<DateTime<Utc>> = sorted.iter().map(|a| a.end).collect();
    ends.sort_unstable();

    sorted
        .iter()
        .enumerate()
        .map(|(rank, current)| {
            let finished = ends.partition_point(|end| *end <= current.start);
            let started = sorted.partition_point(|a| a.start < current.end);
            Placement {
                overlap_group_size: started - finished,
                column_index: rank - finished,
            }
        })
        .collect()
}

/// Group sizes as in the sweep, columns from a first-free-lane assignment.
fn greedy_placements<P>(sorted: &[ScheduledAppointment<P>]) -> Vec<Placement> {
    let mut placements = sweep_placements(sorted);

    let mut active: BinaryHeap<Reverse<(DateTime<Utc>, usize)>> = BinaryHeap::new();
    let mut free: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    let mut next_column = 0;

    for (appointment, placement) in sorted.iter().zip(placements.iter_mut()) {
        while let Some(Reverse((end, column))) = active.peek().copied() {
            if end > appointment.start {
                break;
            }
            active.pop();
            free.push(Reverse(column));
        }

        let column = match free.pop() {
            Some(Reverse(column)) => column,
            None => {
                next_column += 1;
                next_column - 1
            }
        };

        active.push(Reverse((appointment.end, column)));
        placement.column_index = column;
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 20, hour, minute, 0).unwrap()
    }

    fn apt(id: &str, start: (u32, u32), end: (u32, u32)) -> ScheduledAppointment<()> {
        ScheduledAppointment::new(id, at(start.0, start.1), at(end.0, end.1), ())
    }

    fn summary(positioned: &[PositionedAppointment<()>]) -> Vec<(String, usize, usize)> {
        positioned
            .iter()
            .map(|p| (p.id().to_string(), p.overlap_group_size, p.column_index))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let out = layout_appointments(Vec::<ScheduledAppointment<()>>::new()).unwrap();
        assert!(out.is_empty());
        assert_eq!(max_overlap(&out), 0);
    }

    #[test]
    fn test_overlapping_pair() {
        let out = layout_appointments(vec![
            apt("late", (9, 30), (10, 30)),
            apt("early", (9, 0), (10, 0)),
        ])
        .unwrap();

        assert_eq!(
            summary(&out),
            vec![("early".to_string(), 2, 0), ("late".to_string(), 2, 1)]
        );
    }

    #[test]
    fn test_strategies_agree_on_rank_rule() {
        let input = vec![
            apt("a", (9, 0), (10, 0)),
            apt("b", (9, 30), (10, 30)),
            apt("c", (10, 15), (11, 0)),
            apt("d", (10, 15), (10, 45)),
            apt("e", (12, 0), (12, 30)),
        ];

        let sweep = layout_with_strategy(input.clone(), LayoutStrategy::SweepLine).unwrap();
        let pairwise = layout_with_strategy(input, LayoutStrategy::Pairwise).unwrap();
        assert_eq!(summary(&sweep), summary(&pairwise));
    }

    #[test]
    fn test_greedy_reuses_freed_lane() {
        let out = layout_with_strategy(
            vec![
                apt("a", (9, 0), (9, 40)),
                apt("b", (9, 30), (11, 0)),
                apt("c", (9, 45), (10, 0)),
            ],
            LayoutStrategy::GreedyColumns,
        )
        .unwrap();

        assert_eq!(
            summary(&out),
            vec![
                ("a".to_string(), 2, 0),
                ("b".to_string(), 3, 1),
                ("c".to_string(), 2, 0),
            ]
        );
    }

    #[test]
    fn test_rejects_every_invalid_interval() {
        let err = layout_appointments(vec![
            apt("ok", (9, 0), (9, 30)),
            apt("zero", (10, 0), (10, 0)),
            apt("backwards", (11, 0), (10, 30)),
        ])
        .unwrap_err();

        assert_matches!(err, LayoutError::InvalidInterval { ref ids } if ids == &vec!["zero".to_string(), "backwards".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_still_get_distinct_columns() {
        let out = layout_appointments(vec![
            apt("dup", (9, 0), (10, 0)),
            apt("dup", (9, 0), (9, 30)),
        ])
        .unwrap();

        let columns: Vec<usize> = out.iter().map(|p| p.column_index).collect();
        assert_eq!(columns, vec![0, 1]);
    }
}
