use super::StreamBuffer;

/// Default number of chunks the queue is allocated for.
pub(crate) const DEFAULT_CAPACITY: usize = 8;
/// Default cap on descriptors handed out by a single pull.
pub(crate) const DEFAULT_MAX_REGIONS: usize = 16;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) id: u64,
    pub(crate) capacity: usize,
    pub(crate) max_regions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: 0,
            capacity: DEFAULT_CAPACITY,
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

/// Builder for configuring and creating a [`StreamBuffer`].
///
/// # Examples
///
/// ```
/// use ackbuf::StreamBuffer;
///
/// let buffer = StreamBuffer::builder().id(4).capacity(64).max_regions(8).build();
/// assert_eq!(buffer.id(), 4);
/// assert_eq!(buffer.length(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamBufferBuilder {
    config: Config,
}

impl StreamBufferBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the identifier attached to every log event of the buffer.
    ///
    /// Stream multiplexers typically use the transport stream id.
    ///
    /// Default: 0
    #[must_use]
    pub fn id(mut self, id: u64) -> Self {
        self.config.id = id;
        self
    }

    /// Sets the number of chunks the queue is initially allocated for.
    ///
    /// Each region pushed occupies one chunk until it is acknowledged. The
    /// queue grows past this value when needed.
    ///
    /// Default: 8 chunks
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Sets the descriptor cap used by
    /// [`pull_default()`](StreamBuffer::pull_default).
    ///
    /// Values below 1 are raised to 1.
    ///
    /// Default: 16 descriptors
    #[must_use]
    pub fn max_regions(mut self, max_regions: usize) -> Self {
        self.config.max_regions = max_regions.max(1);
        self
    }

    /// Builds an empty [`StreamBuffer`].
    #[must_use]
    pub fn build(self) -> StreamBuffer {
        StreamBuffer::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        // 1. Defaults
        let buffer = StreamBufferBuilder::new().build();
        assert_eq!(buffer.id(), 0);
        assert_eq!(buffer.config.capacity, DEFAULT_CAPACITY);
        assert_eq!(buffer.config.max_regions, DEFAULT_MAX_REGIONS);

        // 2. Overrides
        let buffer = StreamBufferBuilder::new().id(7).capacity(2).max_regions(0).build();
        assert_eq!(buffer.id(), 7);
        assert_eq!(buffer.config.capacity, 2);
        assert_eq!(buffer.config.max_regions, 1);
    }
}
