//! Row-partitioned execution.
//!
//! Every engine produces its output one row at a time from read-only inputs,
//! so rows are the unit of work handed to the worker pool. Results are
//! always returned in row order, whatever order workers finish in.
//!
//! With the `parallel` feature disabled (e.g. for WASM builds), every mode
//! runs sequentially on the calling thread.

use mapalg_core::{Error, Result};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Processing mode for the row loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Rayon's global pool
    #[default]
    Parallel,
    /// A dedicated pool with a fixed number of workers
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Compute `f(row)` for each row in `0..rows`, returned in row order.
    pub fn map_rows<T, F>(&self, rows: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match *self {
            ProcessingMode::Sequential => Ok((0..rows).map(f).collect()),
            ProcessingMode::Parallel => Ok(par_map(rows, f)),
            ProcessingMode::ParallelWith(0) => Err(no_workers()),
            ProcessingMode::ParallelWith(threads) => {
                debug!("Partitioning {} rows across {} workers", rows, threads);
                in_pool(threads, || par_map(rows, f))
            }
        }
    }

    /// Run `op` with this mode's pool as the default pool.
    ///
    /// Engines called inside `op` that use the default mode run on the
    /// dedicated pool of a `ParallelWith` mode. Other modes run `op` as is.
    pub fn install<R, OP>(&self, op: OP) -> Result<R>
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match *self {
            ProcessingMode::ParallelWith(0) => Err(no_workers()),
            ProcessingMode::ParallelWith(threads) => in_pool(threads, op),
            _ => Ok(op()),
        }
    }
}

fn no_workers() -> Error {
    Error::InvalidParameter {
        name: "threads",
        value: "0".into(),
        reason: "worker count must be at least 1".into(),
    }
}

#[cfg(feature = "parallel")]
fn par_map<T, F>(rows: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..rows).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn par_map<T, F>(rows: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..rows).map(f).collect()
}

#[cfg(feature = "parallel")]
fn in_pool<R, OP>(threads: usize, op: OP) -> Result<R>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Algorithm(format!("Failed to build thread pool: {}", e)))?;
    Ok(pool.install(op))
}

#[cfg(not(feature = "parallel"))]
fn in_pool<R, OP>(_threads: usize, op: OP) -> Result<R>
where
    R: Send,
    OP: FnOnce() -> R + Send,
{
    Ok(op())
}

/// Number of workers the default mode uses
pub fn num_workers() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads()
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}
