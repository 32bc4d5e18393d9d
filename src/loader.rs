use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use image::GenericImageView;
use winit::event_loop::EventLoopProxy;

use crate::gallery::Photo;

/// Strip thumbnails are decoded to fit this box.
const THUMB_SIZE: u32 = 160;

/// How far (in ring distance) ahead/behind the current photo full-size
/// decodes are prefetched. The slideshow only ever moves one step, so a
/// short horizon is enough; thumbnails are decoded for the whole strip.
const PREFETCH_RADIUS: usize = 8;

// ---------------------------------------------------------------------------
// Decoded pixels (CPU side)
// ---------------------------------------------------------------------------

pub struct DecodedImage {
    pub rgba_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

impl DecodedImage {
    pub fn mem_size(&self) -> u64 {
        self.rgba_bytes.len() as u64
    }
}

fn decode_photo(path: &Path, target_size: Option<(u32, u32)>) -> Result<DecodedImage, String> {
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    match image::open(path) {
        Ok(img) => {
            let final_img = match target_size {
                Some((w, h)) => img.thumbnail(w, h),
                None => img,
            };
            let (width, height) = final_img.dimensions();
            Ok(DecodedImage {
                rgba_bytes: final_img.to_rgba8().into_raw(),
                width,
                height,
                file_size,
            })
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Distance between two indices on the carousel ring. The gallery wraps, so
/// the photo "before" index 0 is the last one and must count as a neighbor.
pub fn ring_distance(a: usize, b: usize, count: usize) -> usize {
    let linear = a.abs_diff(b);
    linear.min(count - linear)
}

// ---------------------------------------------------------------------------
// Cache state (shared between UI and worker threads via Mutex + Condvar)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    Full,
    Thumbnail,
}

pub struct CacheState {
    current_idx: usize,
    photo_count: usize,

    images: HashMap<usize, Arc<DecodedImage>>,
    thumbnails: HashMap<usize, Arc<DecodedImage>>,

    in_progress: HashSet<(usize, WorkKind)>,
    pub errors: HashMap<usize, String>,
    thumbnail_errors: HashSet<usize>,

    used_bytes: u64,
    budget: u64,
}

pub type SharedState = Arc<(Mutex<CacheState>, Condvar)>;

impl CacheState {
    pub fn new(budget: u64, photo_count: usize) -> Self {
        Self {
            current_idx: 0,
            photo_count,
            images: HashMap::new(),
            thumbnails: HashMap::new(),
            in_progress: HashSet::new(),
            errors: HashMap::new(),
            thumbnail_errors: HashSet::new(),
            used_bytes: 0,
            budget,
        }
    }

    pub fn set_current_idx(&mut self, idx: usize) {
        self.current_idx = idx;
    }

    pub fn get(&self, idx: usize) -> Option<Arc<DecodedImage>> {
        self.images.get(&idx).cloned()
    }

    pub fn get_thumbnail(&self, idx: usize) -> Option<Arc<DecodedImage>> {
        self.thumbnails.get(&idx).cloned()
    }

    pub fn stats(&self) -> (usize, u64, u64) {
        (self.images.len(), self.used_bytes, self.budget)
    }

    fn is_wanted(&self, idx: usize, kind: WorkKind) -> bool {
        if idx >= self.photo_count || self.in_progress.contains(&(idx, kind)) {
            return false;
        }
        match kind {
            WorkKind::Full => {
                !self.images.contains_key(&idx) && !self.errors.contains_key(&idx)
            }
            WorkKind::Thumbnail => {
                !self.thumbnails.contains_key(&idx) && !self.thumbnail_errors.contains(&idx)
            }
        }
    }

    /// Picks the next decode job, nearest ring distance first. The current
    /// photo's full decode always wins; after that full decodes within the
    /// prefetch radius alternate forward/backward (forward first — that is
    /// the direction autoplay moves), then the thumbnail strip fills in.
    fn find_work(&self) -> Option<(usize, WorkKind)> {
        if self.is_wanted(self.current_idx, WorkKind::Full) {
            return Some((self.current_idx, WorkKind::Full));
        }

        let count = self.photo_count;
        let radius = PREFETCH_RADIUS.min(count / 2);
        for dist in 1..=radius {
            let fwd = (self.current_idx + dist) % count;
            if self.is_wanted(fwd, WorkKind::Full) && self.fits(fwd) {
                return Some((fwd, WorkKind::Full));
            }
            let bwd = (self.current_idx + count - dist) % count;
            if self.is_wanted(bwd, WorkKind::Full) && self.fits(bwd) {
                return Some((bwd, WorkKind::Full));
            }
        }

        for dist in 0..=count / 2 {
            let fwd = (self.current_idx + dist) % count;
            if self.is_wanted(fwd, WorkKind::Thumbnail) {
                return Some((fwd, WorkKind::Thumbnail));
            }
            let bwd = (self.current_idx + count - dist) % count;
            if self.is_wanted(bwd, WorkKind::Thumbnail) {
                return Some((bwd, WorkKind::Thumbnail));
            }
        }

        None
    }

    /// Whether a prefetched full image at `idx` would still be closer than
    /// what eviction would have to throw out for it.
    fn fits(&self, idx: usize) -> bool {
        let avg = if self.images.is_empty() {
            8 * 1024 * 1024
        } else {
            self.used_bytes.max(1) / self.images.len() as u64
        };
        if self.used_bytes + avg <= self.budget {
            return true;
        }
        let my_dist = ring_distance(idx, self.current_idx, self.photo_count);
        self.farthest_cached()
            .map(|(_, d)| my_dist < d)
            .unwrap_or(false)
    }

    fn farthest_cached(&self) -> Option<(usize, usize)> {
        self.images
            .keys()
            .filter(|&&i| i != self.current_idx)
            .map(|&i| (i, ring_distance(i, self.current_idx, self.photo_count)))
            .max_by_key(|&(_, d)| d)
    }

    fn insert(&mut self, idx: usize, decoded: DecodedImage, kind: WorkKind) {
        match kind {
            WorkKind::Full => {
                if let Some(old) = self.images.remove(&idx) {
                    self.used_bytes -= old.mem_size();
                }
                self.used_bytes += decoded.mem_size();
                self.images.insert(idx, Arc::new(decoded));
                self.evict_distant();
            }
            WorkKind::Thumbnail => {
                // Small and bounded by the strip length; not budgeted.
                self.thumbnails.insert(idx, Arc::new(decoded));
            }
        }
    }

    fn evict_distant(&mut self) {
        while self.used_bytes > self.budget && self.images.len() > 1 {
            match self.farthest_cached() {
                Some((evict_idx, _)) => {
                    if let Some(img) = self.images.remove(&evict_idx) {
                        self.used_bytes -= img.mem_size();
                    }
                }
                None => break,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// User event for waking the UI from worker threads
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum UserEvent {
    ImageReady(usize),
    ThumbnailReady(usize),
}

// ---------------------------------------------------------------------------
// Background decode workers
// ---------------------------------------------------------------------------

pub fn spawn_decode_workers(
    shared: SharedState,
    photos: Arc<Vec<Photo>>,
    proxy: EventLoopProxy<UserEvent>,
    num_threads: usize,
) {
    for _ in 0..num_threads {
        let shared = Arc::clone(&shared);
        let photos = Arc::clone(&photos);
        let proxy = proxy.clone();
        thread::spawn(move || loop {
            let (idx, kind) = {
                let (lock, cvar) = &*shared;
                let mut state = lock.lock().unwrap();
                loop {
                    if let Some((idx, kind)) = state.find_work() {
                        state.in_progress.insert((idx, kind));
                        break (idx, kind);
                    }
                    state = cvar.wait(state).unwrap();
                }
            };

            let target_size = match kind {
                WorkKind::Full => None,
                WorkKind::Thumbnail => Some((THUMB_SIZE, THUMB_SIZE)),
            };
            let result = decode_photo(&photos[idx].source, target_size);

            {
                let (lock, cvar) = &*shared;
                let mut state = lock.lock().unwrap();
                state.in_progress.remove(&(idx, kind));
                match result {
                    Ok(decoded) => state.insert(idx, decoded, kind),
                    Err(e) => {
                        log::warn!("Decode failed for {}: {}", photos[idx].source.display(), e);
                        match kind {
                            WorkKind::Full => {
                                state.errors.insert(idx, e);
                            }
                            WorkKind::Thumbnail => {
                                state.thumbnail_errors.insert(idx);
                            }
                        }
                    }
                }
                cvar.notify_all();
            }

            let event = match kind {
                WorkKind::Full => UserEvent::ImageReady(idx),
                WorkKind::Thumbnail => UserEvent::ThumbnailReady(idx),
            };
            let _ = proxy.send_event(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(bytes: usize) -> DecodedImage {
        DecodedImage {
            rgba_bytes: vec![0; bytes],
            width: 1,
            height: 1,
            file_size: bytes as u64,
        }
    }

    #[test]
    fn ring_distance_wraps() {
        assert_eq!(ring_distance(0, 9, 10), 1);
        assert_eq!(ring_distance(2, 7, 10), 5);
        assert_eq!(ring_distance(3, 3, 10), 0);
        assert_eq!(ring_distance(0, 1, 2), 1);
    }

    #[test]
    fn current_photo_is_decoded_first() {
        let mut state = CacheState::new(u64::MAX, 10);
        state.set_current_idx(4);
        assert_eq!(state.find_work(), Some((4, WorkKind::Full)));
        state.insert(4, decoded(16), WorkKind::Full);
        // Next: the forward neighbor, then the backward one.
        assert_eq!(state.find_work(), Some((5, WorkKind::Full)));
        state.insert(5, decoded(16), WorkKind::Full);
        assert_eq!(state.find_work(), Some((3, WorkKind::Full)));
    }

    #[test]
    fn prefetch_wraps_past_the_ends() {
        let mut state = CacheState::new(u64::MAX, 5);
        state.set_current_idx(0);
        state.insert(0, decoded(16), WorkKind::Full);
        assert_eq!(state.find_work(), Some((1, WorkKind::Full)));
        state.insert(1, decoded(16), WorkKind::Full);
        // Backward neighbor of 0 is the last photo.
        assert_eq!(state.find_work(), Some((4, WorkKind::Full)));
    }

    #[test]
    fn eviction_drops_the_ring_farthest() {
        let mut state = CacheState::new(100, 10);
        state.set_current_idx(0);
        state.insert(0, decoded(40), WorkKind::Full);
        state.insert(1, decoded(40), WorkKind::Full);
        // 9 is distance 1 from 0 on the ring; inserting it while over budget
        // must evict 1 or 9 (both distance 1), never the current photo.
        state.insert(9, decoded(40), WorkKind::Full);
        assert!(state.get(0).is_some());
        assert_eq!(state.stats().0, 2);
    }

    #[test]
    fn thumbnails_fill_after_fulls() {
        let mut state = CacheState::new(u64::MAX, 2);
        state.insert(0, decoded(16), WorkKind::Full);
        state.insert(1, decoded(16), WorkKind::Full);
        assert_eq!(state.find_work(), Some((0, WorkKind::Thumbnail)));
        state.insert(0, decoded(4), WorkKind::Thumbnail);
        assert_eq!(state.find_work(), Some((1, WorkKind::Thumbnail)));
        state.insert(1, decoded(4), WorkKind::Thumbnail);
        assert_eq!(state.find_work(), None);
    }

    #[test]
    fn failed_decode_is_not_retried() {
        let mut state = CacheState::new(u64::MAX, 1);
        state.errors.insert(0, "bad file".into());
        assert_ne!(state.find_work(), Some((0, WorkKind::Full)));
    }
}
