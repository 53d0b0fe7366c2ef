//! Position plans that keep every bucket dense.
//!
//! Each structural mutation is expressed as a set of range shifts plus the
//! final slot of the affected task. Plans are pure: the task services apply
//! them inside a single store transaction after taking the bucket locks.

use super::{Bucket, Position, Slot};

/// Direction of a one-step position shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// Increment positions by one to open a slot.
    Up,
    /// Decrement positions by one to close a gap.
    Down,
}

impl Shift {
    /// Applies the shift to a single position.
    #[must_use]
    pub const fn apply(self, position: Position) -> Position {
        match self {
            Self::Up => position.succ(),
            Self::Down => position.pred(),
        }
    }
}

/// Inclusive range of positions, optionally unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRange {
    start: Position,
    end: Option<Position>,
}

impl PositionRange {
    /// Range covering `start` and every later position.
    #[must_use]
    pub const fn starting_at(start: Position) -> Self {
        Self { start, end: None }
    }

    /// Range covering `start..=end`.
    #[must_use]
    pub const fn between(start: Position, end: Position) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Returns the first position in the range.
    #[must_use]
    pub const fn start(self) -> Position {
        self.start
    }

    /// Returns the last position in the range, if bounded.
    #[must_use]
    pub const fn end(self) -> Option<Position> {
        self.end
    }

    /// Returns `true` when `position` falls inside the range.
    #[must_use]
    pub fn contains(self, position: Position) -> bool {
        position >= self.start && self.end.is_none_or(|end| position <= end)
    }
}

/// One set-based shift over a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftOp {
    /// Bucket whose tasks move.
    pub bucket: Bucket,
    /// Positions affected.
    pub range: PositionRange,
    /// Direction of the move.
    pub shift: Shift,
}

impl ShiftOp {
    /// Returns the new position for `slot` after this shift.
    #[must_use]
    pub fn apply_to(self, slot: Slot) -> Position {
        if slot.bucket == self.bucket && self.range.contains(slot.position) {
            self.shift.apply(slot.position)
        } else {
            slot.position
        }
    }
}

/// Where a new task lands and what has to move to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    /// Final position of the new task.
    pub position: Position,
    /// Shift opening the slot, when inserting before existing tasks.
    pub shift: Option<ShiftOp>,
}

/// Plans an insert into a bucket currently holding `len` tasks.
///
/// Without a desired position the task is appended. A desired position past
/// the end is clamped to the end.
#[must_use]
pub fn plan_insert(bucket: Bucket, len: u32, desired: Option<Position>) -> InsertPlan {
    let end = Position::from_index(len);
    match desired {
        Some(position) if position < end => InsertPlan {
            position,
            shift: Some(ShiftOp {
                bucket,
                range: PositionRange::starting_at(position),
                shift: Shift::Up,
            }),
        },
        _ => InsertPlan {
            position: end,
            shift: None,
        },
    }
}

/// Final slot of a moved task and the shifts applied to its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// Slot the task occupies before the move.
    pub from: Slot,
    /// Slot the task occupies after the move.
    pub to: Slot,
    /// Shifts applied to other tasks, in order.
    pub shifts: Vec<ShiftOp>,
}

impl MovePlan {
    /// Returns `true` when the move leaves every position unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.shifts.is_empty()
    }
}

/// Lengths of the buckets touched by a move, read under their locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveBounds {
    /// Tasks currently in the source bucket, including the moved one.
    pub source_len: u32,
    /// Tasks currently in the destination bucket. Equal to `source_len`
    /// for same-bucket moves.
    pub destination_len: u32,
}

/// Plans moving the task at `from` to (`bucket`, `position`).
///
/// A missing bucket keeps the task in its bucket. A missing position keeps
/// the current index for same-bucket moves and appends for cross-bucket
/// moves. Targets past the end clamp to the last valid slot.
#[must_use]
pub fn plan_move(
    from: Slot,
    bucket: Option<Bucket>,
    position: Option<Position>,
    bounds: MoveBounds,
) -> MovePlan {
    let destination = bucket.unwrap_or(from.bucket);
    if destination == from.bucket {
        let last = Position::from_index(bounds.source_len.saturating_sub(1));
        let target = position.unwrap_or(from.position).min(last);
        let old = from.position;
        let shifts = if target > old {
            vec![ShiftOp {
                bucket: destination,
                range: PositionRange::between(old.succ(), target),
                shift: Shift::Down,
            }]
        } else if target < old {
            vec![ShiftOp {
                bucket: destination,
                range: PositionRange::between(target, old.pred()),
                shift: Shift::Up,
            }]
        } else {
            Vec::new()
        };
        return MovePlan {
            from,
            to: Slot::new(destination, target),
            shifts,
        };
    }

    let end = Position::from_index(bounds.destination_len);
    let target = position.unwrap_or(end).min(end);
    MovePlan {
        from,
        to: Slot::new(destination, target),
        shifts: vec![
            plan_remove(from),
            ShiftOp {
                bucket: destination,
                range: PositionRange::starting_at(target),
                shift: Shift::Up,
            },
        ],
    }
}

/// Plans closing the gap left by removing the task at `from`.
#[must_use]
pub const fn plan_remove(from: Slot) -> ShiftOp {
    ShiftOp {
        bucket: from.bucket,
        range: PositionRange::starting_at(from.position.succ()),
        shift: Shift::Down,
    }
}

/// Returns the buckets a move has to lock, in canonical lock order.
#[must_use]
pub fn lock_order(source: Bucket, destination: Bucket) -> Vec<Bucket> {
    let mut buckets = vec![source, destination];
    buckets.sort_by_key(|bucket| bucket.rank());
    buckets.dedup();
    buckets
}
