use plaza_common::{AvatarKind, Facing};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::raster::{AssetError, Image};

/// Composite cache key for one animation frame of one avatar kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub kind: AvatarKind,
    pub facing: Facing,
    pub frame: u32,
}

impl SpriteKey {
    pub fn new(kind: impl Into<AvatarKind>, facing: Facing, frame: u32) -> Self {
        Self {
            kind: kind.into(),
            facing,
            frame,
        }
    }
}

/// Everything the catalog can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageKey {
    Sprite(SpriteKey),
    /// The full-world background image.
    Backdrop,
}

/// Load state of one key.
#[derive(Debug, Clone)]
pub enum Slot {
    Pending,
    Ready(Image),
    Failed,
}

/// Starts an image load. The result comes back through [`SpriteCatalog::complete`].
///
/// Implementations must not block the caller.
pub trait SpriteLoader {
    fn request(&mut self, key: ImageKey, source: &str);
}

/// Lazily populated image cache keyed by [`ImageKey`].
pub struct SpriteCatalog {
    slots: HashMap<ImageKey, Slot>,
    loader: Box<dyn SpriteLoader>,
    backdrop_source: Option<String>,
}

impl SpriteCatalog {
    pub fn new(loader: impl SpriteLoader + 'static) -> Self {
        Self {
            slots: HashMap::new(),
            loader: Box::new(loader),
            backdrop_source: None,
        }
    }

    /// Set the reference of the full-world background image.
    pub fn with_backdrop(mut self, source: impl Into<String>) -> Self {
        self.backdrop_source = Some(source.into());
        self
    }

    /// The image for a sprite frame, requesting it on first sight.
    ///
    /// `source` is the frame's image reference from the avatar descriptor.
    pub fn sprite(&mut self, key: &SpriteKey, source: &str) -> Option<Image> {
        self.fetch(ImageKey::Sprite(key.clone()), source)
    }

    /// The background image, requesting it on first call. `None` if none is configured.
    pub fn backdrop(&mut self) -> Option<Image> {
        let source = self.backdrop_source.clone()?;
        self.fetch(ImageKey::Backdrop, &source)
    }

    /// Record a finished load. Returns true when a new image became drawable.
    ///
    /// Failures are logged and remembered; the key is never requested again.
    pub fn complete(&mut self, key: ImageKey, result: Result<Image, AssetError>) -> bool {
        if matches!(self.slots.get(&key), Some(Slot::Ready(_) | Slot::Failed)) {
            tracing::debug!(?key, "ignoring late image completion");
            return false;
        }
        match result {
            Ok(image) => {
                tracing::debug!(?key, source = image.source(), "image ready");
                self.slots.insert(key, Slot::Ready(image));
                true
            }
            Err(e) => {
                tracing::warn!(?key, error = %e, "image failed to load; skipping it for this session");
                self.slots.insert(key, Slot::Failed);
                false
            }
        }
    }

    pub fn slot(&self, key: &ImageKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    pub fn ready_count(&self) -> usize {
        self.count(|s| matches!(s, Slot::Ready(_)))
    }

    pub fn pending_count(&self) -> usize {
        self.count(|s| matches!(s, Slot::Pending))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, Slot::Failed))
    }

    fn count(&self, pred: impl Fn(&Slot) -> bool) -> usize {
        self.slots.values().filter(|s| pred(s)).count()
    }

    fn fetch(&mut self, key: ImageKey, source: &str) -> Option<Image> {
        match self.slots.entry(key) {
            Entry::Occupied(e) => match e.get() {
                Slot::Ready(image) => Some(image.clone()),
                Slot::Pending | Slot::Failed => None,
            },
            Entry::Vacant(e) => {
                tracing::trace!(key = ?e.key(), source, "requesting image");
                self.loader.request(e.key().clone(), source);
                e.insert(Slot::Pending);
                None
            }
        }
    }
}

/// Requests waiting to be served, shared between a [`QueuedLoader`] and its owner.
#[derive(Debug, Clone, Default)]
pub struct LoadQueue(Rc<RefCell<VecDeque<(ImageKey, String)>>>);

impl LoadQueue {
    /// Take every request queued so far.
    pub fn drain(&self) -> Vec<(ImageKey, String)> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Loader that only records requests; the owner serves them later from the
/// [`LoadQueue`] and feeds results back into the catalog.
#[derive(Debug, Clone, Default)]
pub struct QueuedLoader {
    queue: LoadQueue,
}

impl QueuedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> LoadQueue {
        self.queue.clone()
    }
}

impl SpriteLoader for QueuedLoader {
    fn request(&mut self, key: ImageKey, source: &str) {
        self.queue.0.borrow_mut().push_back((key, source.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fox_south(frame: u32) -> SpriteKey {
        SpriteKey::new("fox", Facing::South, frame)
    }

    fn catalog() -> (SpriteCatalog, LoadQueue) {
        let loader = QueuedLoader::new();
        let queue = loader.queue();
        (SpriteCatalog::new(loader), queue)
    }

    #[test]
    fn first_lookup_requests_once() {
        let (mut cat, queue) = catalog();
        assert!(cat.sprite(&fox_south(0), "fox_s0.png").is_none());
        assert!(cat.sprite(&fox_south(0), "fox_s0.png").is_none());
        let requests = queue.drain();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "fox_s0.png");
        assert_eq!(cat.pending_count(), 1);
    }

    #[test]
    fn completed_image_is_served() {
        let (mut cat, _queue) = catalog();
        let key = fox_south(0);
        cat.sprite(&key, "fox_s0.png");
        assert!(cat.complete(
            ImageKey::Sprite(key.clone()),
            Ok(Image::blank("fox_s0.png", 32, 48))
        ));
        let img = cat.sprite(&key, "fox_s0.png").unwrap();
        assert_eq!(img.height(), 48);
        assert_eq!(cat.ready_count(), 1);
    }

    #[test]
    fn failure_is_permanent() {
        let (mut cat, queue) = catalog();
        let key = fox_south(1);
        cat.sprite(&key, "missing.png");
        let err = AssetError::Unsupported("missing.png".into());
        assert!(!cat.complete(ImageKey::Sprite(key.clone()), Err(err)));
        queue.drain();

        assert!(cat.sprite(&key, "missing.png").is_none());
        assert!(queue.is_empty(), "failed keys are never requested again");
        assert_eq!(cat.failed_count(), 1);

        // A late success does not resurrect the key.
        assert!(!cat.complete(ImageKey::Sprite(key.clone()), Ok(Image::blank("x", 1, 1))));
        assert!(cat.sprite(&key, "missing.png").is_none());
    }

    #[test]
    fn keys_are_exact() {
        let (mut cat, queue) = catalog();
        cat.sprite(&SpriteKey::new("fox", Facing::South, 0), "a.png");
        cat.sprite(&SpriteKey::new("fox", Facing::North, 0), "b.png");
        cat.sprite(&SpriteKey::new("Fox", Facing::South, 0), "c.png");
        cat.sprite(&SpriteKey::new("fox", Facing::South, 1), "d.png");
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn backdrop_requires_configuration() {
        let (mut cat, queue) = catalog();
        assert!(cat.backdrop().is_none());
        assert!(queue.is_empty());

        let loader = QueuedLoader::new();
        let queue = loader.queue();
        let mut cat = SpriteCatalog::new(loader).with_backdrop("world.png");
        assert!(cat.backdrop().is_none());
        assert_eq!(queue.drain(), vec![(ImageKey::Backdrop, "world.png".to_owned())]);
        cat.complete(ImageKey::Backdrop, Ok(Image::blank("world.png", 2048, 2048)));
        assert_eq!(cat.backdrop().unwrap().width(), 2048);
    }
}
