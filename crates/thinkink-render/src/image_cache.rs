//! Bounded decode cache for image elements.
//!
//! Entries are keyed by the content of the encoded payload, so an image
//! keeps its cache slot across copy/paste and undo. A lookup that misses
//! only schedules the decode; [`ImageCache::process_pending`] does the work
//! between frames and reports whether a re-render is needed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thinkink_core::element::ImageData;

/// An image decoded to straight-alpha RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Decode any format the `image` crate was built with.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// What the renderer should draw for an image right now.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Ready(Arc<DecodedImage>),
    /// Queued for decoding; draw nothing yet.
    Pending,
    /// Decoding failed; draw a placeholder. Never retried.
    Failed,
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Arc<DecodedImage>),
    Failed,
}

#[derive(Debug)]
struct Entry {
    /// Encoded payload, compared on every hit since keys are hashes.
    source: ImageData,
    slot: Slot,
    last_used: u64,
    /// Frame in which the entry was last requested.
    frame: u64,
}

/// LRU cache of decoded images.
///
/// Capacity is a soft limit: entries requested during the current frame are
/// never evicted, so a frame that needs more images than the capacity grows
/// the cache instead of thrashing. [`ImageCache::begin_frame`] shrinks it back
/// once those images are no longer on screen.
#[derive(Debug)]
pub struct ImageCache {
    entries: HashMap<u64, Entry>,
    queue: VecDeque<u64>,
    capacity: usize,
    clock: u64,
    frame: u64,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            queue: VecDeque::new(),
            capacity: capacity.max(1),
            clock: 0,
            frame: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.queue.clear();
    }

    /// Start a new frame. Entries beyond capacity that the previous frame
    /// did not request are dropped, oldest first.
    pub fn begin_frame(&mut self) {
        while self.entries.len() > self.capacity {
            if !self.evict_lru(self.frame) {
                break;
            }
        }
        self.frame += 1;
    }

    /// Look up an image, scheduling a decode on a miss.
    pub fn get(&mut self, image: &ImageData) -> ImageState {
        self.lookup(image.content_key(), image)
    }

    fn lookup(&mut self, key: u64, image: &ImageData) -> ImageState {
        self.clock += 1;

        match self.entries.get_mut(&key) {
            Some(entry) if entry.source == *image => {
                entry.last_used = self.clock;
                entry.frame = self.frame;
                return match &entry.slot {
                    Slot::Ready(decoded) => ImageState::Ready(Arc::clone(decoded)),
                    Slot::Pending => ImageState::Pending,
                    Slot::Failed => ImageState::Failed,
                };
            }
            Some(_) => {
                log::debug!("Image cache key {:016x} collided, replacing entry", key);
                self.remove(key);
            }
            None => {}
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru(self.frame);
        }
        self.entries.insert(
            key,
            Entry {
                source: image.clone(),
                slot: Slot::Pending,
                last_used: self.clock,
                frame: self.frame,
            },
        );
        self.queue.push_back(key);
        ImageState::Pending
    }

    /// Evict the least recently used entry not requested in `pinned_frame`.
    fn evict_lru(&mut self, pinned_frame: u64) -> bool {
        let oldest = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.frame != pinned_frame)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key);
        match oldest {
            Some(key) => {
                self.remove(key);
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: u64) {
        self.entries.remove(&key);
        self.queue.retain(|k| *k != key);
    }

    /// Decode everything queued. Returns true when any entry changed state.
    pub fn process_pending(&mut self) -> bool {
        let mut changed = false;
        while let Some(key) = self.queue.pop_front() {
            // Evicted while queued.
            let Some(entry) = self.entries.get_mut(&key) else {
                continue;
            };
            if !matches!(entry.slot, Slot::Pending) {
                continue;
            }

            let decoded = entry
                .source
                .bytes()
                .map_err(|e| e.to_string())
                .and_then(|bytes| DecodedImage::decode(&bytes).map_err(|e| e.to_string()));
            entry.slot = match decoded {
                Ok(image) => {
                    log::debug!("Decoded {}x{} image", image.width, image.height);
                    Slot::Ready(Arc::new(image))
                }
                Err(e) => {
                    log::warn!("Failed to decode image: {}", e);
                    Slot::Failed
                }
            };
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32, shade: u8) -> ImageData {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([shade, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        ImageData::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_miss_then_ready() {
        let mut cache = ImageCache::new(4);
        let data = png(3, 2, 10);

        assert_eq!(cache.get(&data), ImageState::Pending);
        assert_eq!(cache.get(&data), ImageState::Pending);
        assert!(cache.process_pending());
        assert!(!cache.process_pending());

        let ImageState::Ready(decoded) = cache.get(&data) else {
            panic!("expected decoded image");
        };
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.rgba.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut cache = ImageCache::new(4);
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0; 16]);
        let broken = ImageData::from_bytes(&bytes).unwrap();

        cache.get(&broken);
        assert!(cache.process_pending());
        assert_eq!(cache.get(&broken), ImageState::Failed);
        assert!(!cache.has_pending());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ImageCache::new(2);
        let (a, b, c) = (png(1, 1, 1), png(1, 1, 2), png(1, 1, 3));

        cache.begin_frame();
        cache.get(&a);
        cache.get(&b);
        cache.process_pending();
        cache.begin_frame();
        // Touch `a` so `b` becomes the oldest.
        cache.get(&a);
        cache.get(&c);

        assert_eq!(cache.len(), 2);
        assert!(matches!(cache.get(&a), ImageState::Ready(_)));
        assert_eq!(cache.get(&b), ImageState::Pending);
    }

    #[test]
    fn test_evicted_pending_is_skipped() {
        let mut cache = ImageCache::new(1);
        let (a, b) = (png(1, 1, 1), png(1, 1, 2));
        cache.begin_frame();
        cache.get(&a);
        cache.begin_frame();
        cache.get(&b);
        assert!(cache.process_pending());
        assert_eq!(cache.len(), 1);
        assert!(matches!(cache.get(&b), ImageState::Ready(_)));
    }

    #[test]
    fn test_frame_working_set_is_never_evicted() {
        let mut cache = ImageCache::new(2);
        let images: Vec<ImageData> = (0..5).map(|i| png(1, 1, i)).collect();

        cache.begin_frame();
        for image in &images {
            assert_eq!(cache.get(image), ImageState::Pending);
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.process_pending());

        for _ in 0..3 {
            cache.begin_frame();
            for image in &images {
                assert!(matches!(cache.get(image), ImageState::Ready(_)));
            }
            assert!(!cache.process_pending());
        }
    }

    #[test]
    fn test_shrinks_back_after_working_set_leaves() {
        let mut cache = ImageCache::new(2);
        let images: Vec<ImageData> = (0..4).map(|i| png(1, 1, i)).collect();
        cache.begin_frame();
        for image in &images {
            cache.get(image);
        }
        cache.process_pending();

        // Only the last image stays on screen.
        cache.begin_frame();
        cache.get(&images[3]);
        cache.begin_frame();
        assert_eq!(cache.len(), 2);
        assert!(matches!(cache.get(&images[3]), ImageState::Ready(_)));
    }

    #[test]
    fn test_key_collision_is_not_a_hit() {
        let mut cache = ImageCache::new(4);
        let (a, b) = (png(2, 2, 1), png(3, 3, 2));
        cache.lookup(7, &a);
        cache.process_pending();
        assert!(matches!(cache.lookup(7, &a), ImageState::Ready(_)));

        assert_eq!(cache.lookup(7, &b), ImageState::Pending);
        assert!(cache.process_pending());
        let ImageState::Ready(decoded) = cache.lookup(7, &b) else {
            panic!("expected decoded image");
        };
        assert_eq!((decoded.width, decoded.height), (3, 3));
    }

    #[test]
    fn test_same_content_shares_entry() {
        let mut cache = ImageCache::new(4);
        cache.get(&png(2, 2, 7));
        cache.get(&png(2, 2, 7));
        assert_eq!(cache.len(), 1);
    }
}
