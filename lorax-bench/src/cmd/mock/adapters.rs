use std::collections::VecDeque;

/// Adapters the mock server keeps "in GPU memory",
/// ordered from least to most recently used.
#[derive(Debug, Clone)]
pub(super) struct LoadedAdapters {
    capacity: usize,
    lru: VecDeque<String>,
}

impl LoadedAdapters {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lru: VecDeque::with_capacity(capacity),
        }
    }

    /// Mark the adapter as used, returns `true` if it had to be loaded first.
    ///
    /// When full the least recently used adapter is evicted.
    /// A capacity of zero means every request has to load its adapter.
    pub(super) fn touch(&mut self, adapter_id: &str) -> bool {
        if let Some(index) = self.lru.iter().position(|id| id == adapter_id) {
            if let Some(id) = self.lru.remove(index) {
                self.lru.push_back(id);
            }
            return false;
        }

        if self.capacity == 0 {
            return true;
        }
        if self.lru.len() >= self.capacity {
            let _ = self.lru.pop_front();
        }
        self.lru.push_back(adapter_id.to_owned());
        true
    }

    pub(super) fn len(&self) -> usize {
        self.lru.len()
    }
}
