// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Lock-free decoder pool.
//!
//! Decoders are reused across decode calls through a
//! `crossbeam_queue::ArrayQueue`. Acquiring never blocks: an empty pool
//! constructs a new decoder. A [`PooledDecoder`] returns its decoder to the
//! pool when dropped, whatever the outcome of the decode; a full pool drops
//! the surplus decoder instead.
//!
//! Idle decoders keep their traversal state; the next checkout's
//! [`Decoder::reset`] replaces it before any token is read.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam_queue::ArrayQueue;
use tracing::trace;

use super::{Decoder, DecoderConfig};

/// A checked-out decoder that returns itself to the pool when dropped.
pub struct PooledDecoder<'r> {
    /// The decoder; `Default` only while being returned
    decoder: Decoder<'r>,
    /// Pool to return to
    pool: Arc<DecoderPoolInner>,
}

impl<'r> Deref for PooledDecoder<'r> {
    type Target = Decoder<'r>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.decoder
    }
}

impl DerefMut for PooledDecoder<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.decoder
    }
}

impl Drop for PooledDecoder<'_> {
    fn drop(&mut self) {
        let decoder = std::mem::take(&mut self.decoder);
        self.pool.release(decoder.detach());
    }
}

impl fmt::Debug for PooledDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledDecoder")
            .field("decoder", &self.decoder)
            .finish()
    }
}

/// Inner pool state (shared via Arc).
struct DecoderPoolInner {
    /// Lock-free queue of idle decoders
    queue: ArrayQueue<Decoder<'static>>,
    /// Configuration for newly constructed decoders
    config: DecoderConfig,
    /// Total number of decoder constructions (for metrics)
    total_allocations: AtomicUsize,
}

impl DecoderPoolInner {
    fn take(&self) -> Decoder<'static> {
        if let Some(decoder) = self.queue.pop() {
            return decoder;
        }
        let allocated = self.total_allocations.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(
            context = "decoder_pool",
            total_allocations = allocated,
            "Pool empty; constructing decoder"
        );
        Decoder::new(self.config.clone())
    }

    fn release(&self, decoder: Decoder<'static>) {
        if self.queue.push(decoder).is_err() {
            trace!(
                context = "decoder_pool",
                capacity = self.queue.capacity(),
                "Pool full; dropping decoder"
            );
        }
    }
}

/// Pool of reusable decoders.
///
/// # Example
///
/// ```
/// use bsoncodec::{DecoderConfig, DecoderPool};
///
/// let pool = DecoderPool::new(DecoderConfig::default().with_pool_capacity(2));
/// {
///     let decoder = pool.acquire();
///     assert!(!decoder.is_bound());
/// }
/// assert_eq!(pool.pool_size(), 1);
/// assert_eq!(pool.total_allocations(), 1);
/// ```
#[derive(Clone)]
pub struct DecoderPool {
    inner: Arc<DecoderPoolInner>,
}

impl DecoderPool {
    /// Create a pool holding up to `config.pool_capacity` idle decoders.
    pub fn new(config: DecoderConfig) -> Self {
        let capacity = config.pool_capacity.max(1);
        Self {
            inner: Arc::new(DecoderPoolInner {
                queue: ArrayQueue::new(capacity),
                config,
                total_allocations: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a pool with default configuration and the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(DecoderConfig::default().with_pool_capacity(capacity))
    }

    /// Check out a decoder. Never blocks.
    ///
    /// The decoder is unbound; call [`Decoder::reset`] and
    /// [`Decoder::set_context`] before decoding.
    pub fn acquire<'r>(&self) -> PooledDecoder<'r> {
        PooledDecoder {
            decoder: self.inner.take(),
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of idle decoders currently held.
    pub fn pool_size(&self) -> usize {
        self.inner.queue.len()
    }

    /// Maximum number of idle decoders held.
    pub fn capacity(&self) -> usize {
        self.inner.queue.capacity()
    }

    /// Number of decoders constructed because the pool was empty.
    pub fn total_allocations(&self) -> usize {
        self.inner.total_allocations.load(Ordering::Relaxed)
    }

    /// Configuration given to new decoders.
    pub fn config(&self) -> &DecoderConfig {
        &self.inner.config
    }

    /// Pre-fill the pool with up to `count` decoders.
    pub fn warmup(&self, count: usize) {
        for _ in 0..count.min(self.capacity()) {
            let decoder = Decoder::new(self.inner.config.clone());
            if self.inner.queue.push(decoder).is_err() {
                break;
            }
            self.inner.total_allocations.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for DecoderPool {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl fmt::Debug for DecoderPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderPool")
            .field("pool_size", &self.pool_size())
            .field("capacity", &self.capacity())
            .field("total_allocations", &self.total_allocations())
            .finish()
    }
}

/// Global decoder pool.
///
/// Sized at twice the available parallelism so every worker thread can hold
/// a decoder while another is being returned.
static GLOBAL_POOL: OnceLock<DecoderPool> = OnceLock::new();

/// Get the process-wide decoder pool used by the dispatch functions.
pub fn global_pool() -> &'static DecoderPool {
    GLOBAL_POOL.get_or_init(|| {
        let workers = std::thread::available_parallelism().map_or(4, |n| n.get());
        DecoderPool::new(DecoderConfig::default().with_pool_capacity(workers * 2))
    })
}
