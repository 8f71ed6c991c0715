//! Play queue with a cursor.

use rand::Rng;

use crate::client::models::Track;

/// Ordered list of tracks and the index of the current one.
///
/// `current < tracks.len()` whenever the queue is non-empty; `current` is 0
/// when it is empty.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    current: usize,
}

impl Queue {
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Replace all tracks, placing the cursor at `start` (clamped).
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize) {
        self.current = start.min(tracks.len().saturating_sub(1));
        self.tracks = tracks;
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Remove the track at `index`, keeping the cursor on the same track
    /// where possible.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.tracks.len() {
            self.current = self.tracks.len().saturating_sub(1);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = 0;
    }

    /// Move the cursor. Returns `false` if `index` is out of range.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Index `next` would move to: a uniform pick over the whole queue when
    /// shuffling (the current index included), otherwise the following entry,
    /// wrapping around.
    pub fn next_index<R: Rng + ?Sized>(&self, shuffle: bool, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        if shuffle {
            Some(rng.gen_range(0..len))
        } else {
            Some((self.current + 1) % len)
        }
    }

    /// Index `previous` would move to, wrapping around. Shuffle does not apply.
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        Some((self.current + len - 1) % len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Track {}", id),
            artists: vec![String::from("Artist")],
            album: None,
            duration: Some(180),
            artwork: Vec::new(),
            streams: Vec::new(),
        }
    }

    fn queue_of(len: usize) -> Queue {
        let mut q = Queue::default();
        q.replace((0..len).map(|i| track(&i.to_string())).collect(), 0);
        q
    }

    #[test]
    fn test_empty_queue_has_no_neighbours() {
        let q = Queue::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(q.next_index(false, &mut rng), None);
        assert_eq!(q.next_index(true, &mut rng), None);
        assert_eq!(q.previous_index(), None);
        assert!(q.current().is_none());
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut q = queue_of(3);
        let mut rng = StdRng::seed_from_u64(1);
        q.set_current(2);
        assert_eq!(q.next_index(false, &mut rng), Some(0));
        q.set_current(0);
        assert_eq!(q.previous_index(), Some(2));
    }

    #[test]
    fn test_remove_keeps_cursor_on_track() {
        let mut q = queue_of(4);
        q.set_current(2);
        q.remove(0);
        assert_eq!(q.current_index(), 1);
        assert_eq!(q.current().map(|t| t.id.as_str()), Some("2"));

        // Removing the last entry while it is current pulls the cursor back.
        q.set_current(2);
        q.remove(2);
        assert_eq!(q.current_index(), 1);

        q.clear();
        assert_eq!(q.current_index(), 0);
        assert!(q.remove(0).is_none());
    }

    #[test]
    fn test_replace_clamps_start() {
        let mut q = Queue::default();
        q.replace(vec![track("a"), track("b")], 10);
        assert_eq!(q.current_index(), 1);
        q.replace(Vec::new(), 3);
        assert_eq!(q.current_index(), 0);
    }

    proptest! {
        #[test]
        fn prop_next_len_times_is_identity(len in 1usize..40, start in 0usize..40) {
            let mut q = queue_of(len);
            let start = start % len;
            q.set_current(start);
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..len {
                let next = q.next_index(false, &mut rng).unwrap();
                q.set_current(next);
            }
            prop_assert_eq!(q.current_index(), start);
        }

        #[test]
        fn prop_previous_then_next_is_identity(len in 1usize..40, start in 0usize..40) {
            let mut q = queue_of(len);
            let start = start % len;
            q.set_current(start);
            let mut rng = StdRng::seed_from_u64(7);
            let prev = q.previous_index().unwrap();
            q.set_current(prev);
            let next = q.next_index(false, &mut rng).unwrap();
            q.set_current(next);
            prop_assert_eq!(q.current_index(), start);
        }

        #[test]
        fn prop_shuffle_stays_in_range(len in 1usize..40, seed in any::<u64>()) {
            let q = queue_of(len);
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..10 {
                let next = q.next_index(true, &mut rng).unwrap();
                prop_assert!(next < len);
            }
        }

        #[test]
        fn prop_remove_keeps_index_invariant(len in 1usize..20, current in 0usize..20, remove in 0usize..20) {
            let mut q = queue_of(len);
            q.set_current(current % len);
            q.remove(remove % len);
            prop_assert!(q.is_empty() || q.current_index() < q.len());
            prop_assert!(!q.is_empty() || q.current_index() == 0);
        }
    }
}
