use std::sync::Arc;

use super::Region;
use crate::sync::{Notifier, Status};

/// A region queued in a [`StreamBuffer`](crate::StreamBuffer), positioned in
/// the global stream.
///
/// Every region of a submission becomes its own chunk; the submission
/// notifier is shared by all of them and fires when the last reference is
/// released.
#[derive(Debug)]
pub(crate) struct Chunk {
    region: Region,
    /// Global stream offset of the first byte of `region`.
    start: u64,
    notifier: Option<Arc<Notifier>>,
}

impl Chunk {
    pub(crate) fn new(region: Region, start: u64, notifier: Option<Arc<Notifier>>) -> Self {
        Self {
            region,
            start,
            notifier,
        }
    }

    pub(crate) const fn len(&self) -> u64 {
        self.region.len() as u64
    }

    pub(crate) const fn start(&self) -> u64 {
        self.start
    }

    /// Global stream offset one past the last byte of this chunk.
    pub(crate) const fn end(&self) -> u64 {
        self.start + self.len()
    }

    /// Returns the bytes of this chunk from global `offset` onwards.
    ///
    /// Offsets before the chunk yield the whole chunk, offsets past it an empty
    /// slice.
    pub(crate) fn slice_from(&self, offset: u64) -> &[u8] {
        let skip = offset.saturating_sub(self.start).min(self.len()) as usize;
        &self.region.as_slice()[skip..]
    }

    /// Releases the chunk memory and, if this was the last chunk of its
    /// submission, fires the notifier with `status`.
    ///
    /// Returns `true` if the notifier fired.
    pub(crate) fn release(self, status: Status) -> bool {
        let Self { region, notifier, .. } = self;
        drop(region);
        match notifier.and_then(Arc::into_inner) {
            Some(notifier) => {
                notifier.notify(status);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;

    use super::*;

    #[test]
    fn chunk_offsets() {
        let chunk = Chunk::new(vec![0u8, 1, 2, 3, 4].into(), 10, None);
        assert_eq!(chunk.start(), 10);
        assert_eq!(chunk.len(), 5);
        assert_eq!(chunk.end(), 15);

        // 1. Before, inside and past the chunk
        assert_eq!(chunk.slice_from(0), &[0, 1, 2, 3, 4]);
        assert_eq!(chunk.slice_from(12), &[2, 3, 4]);
        assert_eq!(chunk.slice_from(15), &[] as &[u8]);
        assert_eq!(chunk.slice_from(100), &[] as &[u8]);
    }

    #[test]
    fn chunk_release_shared_notifier() {
        let (sender, receiver) = channel();
        let notifier = Arc::new(Notifier::new(move |status| sender.send(status).unwrap()));

        let region: Region = vec![0u8; 8].into();
        let first = Chunk::new(region.view(..4).unwrap(), 0, Some(notifier.clone()));
        let second = Chunk::new(region.view(4..).unwrap(), 4, Some(notifier));
        drop(region);

        // 1. Not the last reference: nothing fires
        assert!(!first.release(Status::Ok));
        assert!(receiver.try_recv().is_err());

        // 2. Last reference fires exactly once
        assert!(second.release(Status::Cancelled));
        assert_eq!(receiver.try_recv().unwrap(), Status::Cancelled);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn chunk_release_frees_memory() {
        let region: Region = vec![0u8; 4].into();
        let chunk = Chunk::new(region.clone(), 0, None);
        assert_eq!(region.ref_count(), 2);

        assert!(!chunk.release(Status::Ok));
        assert_eq!(region.ref_count(), 1);
    }
}
