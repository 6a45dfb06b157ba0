//! A module for the [`Overlapper`], which doubles the analysis rate with
//! 50%-overlapped bridging frames.
//!
//! Hann windowing strongly attenuates the signal near frame edges; the
//! bridging frame built from the halves of two consecutive raw frames
//! recovers what would otherwise be lost there.  N raw frames yield 2N−1
//! analysis frames.

/// Builds bridging frames between consecutive raw frames.
pub struct Overlapper {
    prev_half: Vec<f32>,
}

impl Overlapper {
    /// Creates an overlapper for the given raw frame size.
    pub fn new(window_size: usize) -> Self {
        Self {
            prev_half: Vec::with_capacity(window_size / 2),
        }
    }

    /// Saves the second half of `frame` for the next bridge.
    pub fn save(&mut self, frame: &[f32]) {
        let half = frame.len() / 2;

        self.prev_half.clear();
        self.prev_half.extend_from_slice(&frame[half..]);
    }

    /// Builds the bridging frame: the saved second half of the previous raw
    /// frame followed by the first half of `next`.
    pub fn bridge(&self, next: &[f32]) -> Vec<f32> {
        let half = next.len() / 2;

        let mut bridged = Vec::with_capacity(next.len());
        bridged.extend_from_slice(&self.prev_half);
        bridged.extend_from_slice(&next[..half]);

        bridged
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bridge_spans_the_frame_boundary() {
        let mut overlapper = Overlapper::new(4);

        let first = [1.0, 2.0, 3.0, 4.0];
        let second = [5.0, 6.0, 7.0, 8.0];

        overlapper.save(&first);

        assert_eq!(overlapper.bridge(&second), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_save_replaces_previous_half() {
        let mut overlapper = Overlapper::new(4);

        overlapper.save(&[1.0, 2.0, 3.0, 4.0]);
        overlapper.save(&[5.0, 6.0, 7.0, 8.0]);

        assert_eq!(overlapper.bridge(&[9.0, 10.0, 11.0, 12.0]), vec![7.0, 8.0, 9.0, 10.0]);
    }
}
