//! Fractional ordering
//!
//! Positions are floats; moving a note only rewrites the moved note's
//! position, never its siblings'.

use crate::config::POSITION_TAIL_GAP;

/// Position strictly between two neighbours.
///
/// A missing predecessor counts as 0, a missing successor as
/// predecessor + `POSITION_TAIL_GAP`.
pub fn midpoint(before: Option<f64>, after: Option<f64>) -> f64 {
    let before = before.unwrap_or(0.0);
    let after = after.unwrap_or(before + POSITION_TAIL_GAP);
    (before + after) / 2.0
}

/// New position for the item at `from` dropped at index `to`.
///
/// `to` indexes the list with the moved item already taken out, so
/// `position_for_move(&p, i, i)` leaves the item where it was.
pub fn position_for_move(positions: &[f64], from: usize, to: usize) -> f64 {
    let rest: Vec<f64> = positions
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != from)
        .map(|(_, p)| *p)
        .collect();
    let to = to.min(rest.len());

    let before = to.checked_sub(1).map(|i| rest[i]);
    let after = rest.get(to).copied();
    midpoint(before, after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint_between_neighbours() {
        assert_eq!(midpoint(Some(1.0), Some(2.0)), 1.5);
    }

    #[test]
    fn test_midpoint_at_head() {
        assert_eq!(midpoint(None, Some(2.0)), 1.0);
    }

    #[test]
    fn test_midpoint_at_tail() {
        assert_eq!(midpoint(Some(5.0), None), 6.0);
    }

    #[test]
    fn test_midpoint_empty_list() {
        assert_eq!(midpoint(None, None), 1.0);
    }

    #[test]
    fn test_move_uses_neighbours_without_moved_item() {
        let positions = [1.0, 2.0, 3.0, 4.0];

        // last item between the first two
        assert_eq!(position_for_move(&positions, 3, 1), 1.5);
        // first item to the end
        assert_eq!(position_for_move(&positions, 0, 3), 5.0);
        // second item to the head
        assert_eq!(position_for_move(&positions, 1, 0), 0.5);
    }

    #[test]
    fn test_move_index_clamped() {
        let positions = [1.0, 2.0];
        assert_eq!(position_for_move(&positions, 0, 10), 3.0);
    }
}
