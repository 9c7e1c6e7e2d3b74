/// Coalesces repaint requests.
///
/// Call `mark_dirty()` whenever state changes. `begin_frame()` reports
/// whether a repaint is due and clears the flag, so any number of
/// mutations between two frame requests costs a single render.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    dirty: bool,
    frames: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        // First request always paints.
        Self {
            dirty: true,
            frames: 0,
        }
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns `true` if a frame should be painted now.
    pub fn begin_frame(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.frames += 1;
        true
    }

    /// Frames painted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_always_painted() {
        let mut s = FrameScheduler::new();
        assert!(s.begin_frame());
        assert!(!s.begin_frame());
        assert_eq!(s.frames(), 1);
    }

    #[test]
    fn many_marks_coalesce_into_one_frame() {
        let mut s = FrameScheduler::new();
        s.begin_frame();
        for _ in 0..10 {
            s.mark_dirty();
        }
        assert!(s.begin_frame());
        assert!(!s.begin_frame());
        assert_eq!(s.frames(), 2);
    }
}
