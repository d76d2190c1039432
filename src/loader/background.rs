// Background page loader: decodes the neighboring pages on a worker thread
// so that turning a page usually hits a warm cache.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use super::{ImageLoader, LoadError, PageImage};

const CACHE_SLOTS: usize = 3;

struct CacheSlot {
    index: usize,
    image: Arc<PageImage>,
}

/// Holds the current page plus its two wrap-around neighbors. Anything else
/// is evicted; a prefetched page whose index is no longer adjacent to the
/// current one is dropped on arrival.
struct NeighborCache {
    slots: [Option<CacheSlot>; CACHE_SLOTS],
    current: usize,
    len: usize,
}

impl NeighborCache {
    fn new(len: usize) -> Self {
        Self {
            slots: [None, None, None],
            current: 0,
            len,
        }
    }

    fn next_index(&self) -> usize {
        (self.current + 1) % self.len
    }

    fn prev_index(&self) -> usize {
        if self.current == 0 {
            self.len - 1
        } else {
            self.current - 1
        }
    }

    fn wanted(&self, index: usize) -> bool {
        index == self.current || index == self.next_index() || index == self.prev_index()
    }

    fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    fn get(&self, index: usize) -> Option<Arc<PageImage>> {
        self.slots
            .iter()
            .flatten()
            .find(|slot| slot.index == index)
            .map(|slot| slot.image.clone())
    }

    fn insert(&mut self, index: usize, image: Arc<PageImage>) {
        if !self.wanted(index) {
            tracing::debug!(index, "dropping page no longer adjacent to current");
            return;
        }

        // Reuse the slot already holding this index, else take an empty or
        // unwanted one. With three slots and at most three wanted indices,
        // one of those always exists.
        let position = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.index == index))
            .or_else(|| {
                self.slots
                    .iter()
                    .position(|slot| slot.as_ref().map_or(true, |s| !self.wanted(s.index)))
            });

        match position {
            Some(pos) => self.slots[pos] = Some(CacheSlot { index, image }),
            None => debug_assert!(false, "no cache slot available for index {index}"),
        }
    }

    /// The neighbor to prefetch, next page before previous, or `None` when
    /// both are already cached.
    fn missing_neighbor(&self) -> Option<usize> {
        let next = self.next_index();
        if self.get(next).is_none() {
            return Some(next);
        }
        let prev = self.prev_index();
        if self.get(prev).is_none() {
            return Some(prev);
        }
        None
    }
}

struct PrefetchResult {
    index: usize,
    image: Result<Arc<PageImage>, LoadError>,
}

/// Decorator around another loader that serves the current page from a small
/// neighbor cache and keeps one background decode in flight at a time.
///
/// The worker thread only touches the inner loader; results are marshalled
/// back onto the GTK main loop before the cache is updated, so all cache
/// state stays main-thread-only.
///
/// The struct holds the only strong handle on the request sender. Dropping
/// it closes the request channel, which ends the worker thread; the worker
/// dropping its result sender then ends the main-loop task. Replacing the
/// loader on a folder re-open therefore tears the whole pipeline down.
pub struct BackgroundImageLoader {
    inner: Arc<dyn ImageLoader + Send + Sync>,
    cache: Rc<RefCell<NeighborCache>>,
    loading: Rc<Cell<bool>>,
    request_tx: Rc<flume::Sender<usize>>,
}

impl BackgroundImageLoader {
    pub fn new(inner: Arc<dyn ImageLoader + Send + Sync>) -> Self {
        let cache = Rc::new(RefCell::new(NeighborCache::new(inner.num_pages())));
        let loading = Rc::new(Cell::new(false));

        let (request_tx, request_rx) = flume::unbounded::<usize>();
        let request_tx = Rc::new(request_tx);
        let (result_tx, result_rx) = async_channel::unbounded::<PrefetchResult>();

        let worker_inner = inner.clone();
        std::thread::spawn(move || {
            while let Ok(index) = request_rx.recv() {
                let image = worker_inner.page(index);
                if result_tx.send_blocking(PrefetchResult { index, image }).is_err() {
                    break;
                }
            }
        });

        let cache_weak = Rc::downgrade(&cache);
        let loading_weak = Rc::downgrade(&loading);
        // Only a weak handle: a strong clone here would keep the request
        // channel open after the loader is dropped and strand the worker.
        let chain_tx: Weak<flume::Sender<usize>> = Rc::downgrade(&request_tx);
        glib::spawn_future_local(async move {
            while let Ok(result) = result_rx.recv().await {
                let (Some(cache), Some(loading)) = (cache_weak.upgrade(), loading_weak.upgrade())
                else {
                    // Loader was dropped, exit the loop
                    break;
                };
                loading.set(false);
                match result.image {
                    Ok(image) => cache.borrow_mut().insert(result.index, image),
                    Err(err) => {
                        // Only the displayed page is allowed to fail fatally;
                        // the on-demand path surfaces this if navigated to.
                        tracing::warn!(index = result.index, error = %err, "background page load failed");
                    }
                }
                let missing = cache.borrow().missing_neighbor();
                if let Some(index) = missing {
                    let Some(chain_tx) = chain_tx.upgrade() else {
                        break;
                    };
                    loading.set(true);
                    let _ = chain_tx.send(index);
                }
            }
        });

        Self {
            inner,
            cache,
            loading,
            request_tx,
        }
    }

    fn maybe_start_prefetch(&self) {
        if self.loading.get() {
            return;
        }
        if let Some(index) = self.cache.borrow().missing_neighbor() {
            self.loading.set(true);
            let _ = self.request_tx.send(index);
        }
    }
}

impl ImageLoader for BackgroundImageLoader {
    fn num_pages(&self) -> usize {
        self.inner.num_pages()
    }

    fn page(&self, index: usize) -> Result<Arc<PageImage>, LoadError> {
        self.cache.borrow_mut().set_current(index);

        let cached = self.cache.borrow().get(index);
        let image = match cached {
            Some(image) => image,
            None => {
                tracing::debug!(index, "page cache miss, loading inline");
                let image = self.inner.page(index)?;
                self.cache.borrow_mut().insert(index, image.clone());
                image
            }
        };

        self.maybe_start_prefetch();
        Ok(image)
    }
}
