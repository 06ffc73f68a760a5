//! TaskBuffer - the FIFO of pending task points.

use std::collections::VecDeque;

use nalgebra::Vector3;

use super::TaskPoint;

/// The work queue consumed by the task runner.
///
/// Points are loaded in one go by `start_tasks` and popped from the front as
/// their motions are issued. Calibration corrections only ever touch what is
/// still in here.
#[derive(Debug, Clone, Default)]
pub struct TaskBuffer {
    points: VecDeque<TaskPoint>,
}

impl TaskBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a new run.
    pub fn replace(&mut self, points: impl IntoIterator<Item = TaskPoint>) {
        self.points.clear();
        self.points.extend(points);
    }

    /// Pop a point from the front of the buffer.
    pub fn pop(&mut self) -> Option<TaskPoint> {
        self.points.pop_front()
    }

    /// Peek at the front point without removing it.
    pub fn peek(&self) -> Option<&TaskPoint> {
        self.points.front()
    }

    /// Mutable access to the front point (flags are cleared in place).
    pub fn front_mut(&mut self) -> Option<&mut TaskPoint> {
        self.points.front_mut()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Clear all points from the buffer.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Shift every remaining point by `offset`.
    pub fn apply_offset(&mut self, offset: &Vector3<f64>) {
        for point in self.points.iter_mut() {
            point.global_pos += offset;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskPoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> TaskPoint {
        TaskPoint::new(Vector3::new(x, 0.0, 0.0), Vector3::z())
    }

    #[test]
    fn test_fifo_order() {
        let mut buffer = TaskBuffer::new();
        buffer.replace([point(1.0), point(2.0)]);
        assert_eq!(buffer.pop().map(|p| p.global_pos.x), Some(1.0));
        assert_eq!(buffer.pop().map(|p| p.global_pos.x), Some(2.0));
        assert!(buffer.pop().is_none());
    }

    #[test]
    fn test_apply_offset_touches_only_remaining() {
        let mut buffer = TaskBuffer::new();
        buffer.replace([point(1.0), point(2.0), point(3.0)]);
        let done = buffer.pop().unwrap();

        buffer.apply_offset(&Vector3::new(0.5, -1.0, 2.0));

        assert_eq!(done.global_pos, Vector3::new(1.0, 0.0, 0.0));
        let remaining: Vec<_> = buffer.iter().map(|p| p.global_pos).collect();
        assert_eq!(remaining, vec![Vector3::new(2.5, -1.0, 2.0), Vector3::new(3.5, -1.0, 2.0)]);
    }

    #[test]
    fn test_replace_discards_previous_run() {
        let mut buffer = TaskBuffer::new();
        buffer.replace([point(1.0), point(2.0)]);
        buffer.replace([point(9.0)]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.peek().map(|p| p.global_pos.x), Some(9.0));
    }
}
