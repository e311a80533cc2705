use anyhow::Result;
use log::{debug, info};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Frames smaller than this are evaluated on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 2048;

pub struct Timer {
    operation: String,
    start_time: Instant,
}

impl Timer {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log the elapsed time at info level and return it.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!("{} took {:.3} s", self.operation, elapsed.as_secs_f64());
        elapsed
    }
}

#[derive(Debug, Clone)]
pub struct WorkerPlan {
    pub parallel_workers: usize,
}

impl WorkerPlan {
    pub fn for_items(item_count: usize) -> Self {
        let parallel_workers = if item_count < PARALLEL_THRESHOLD {
            1
        } else {
            rayon::current_num_threads().min(num_cpus::get()).max(1)
        };
        Self { parallel_workers }
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel_workers > 1
    }
}

/// Apply `f` to every item, on the rayon pool once the input is large
/// enough. Output order matches input order; any error aborts the map.
pub fn parallel_map<T, R, F>(items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> Result<R> + Sync + Send,
{
    let plan = WorkerPlan::for_items(items.len());
    if !plan.is_parallel() {
        return items.iter().map(f).collect();
    }
    debug!("Evaluating {} items on {} workers", items.len(), plan.parallel_workers);
    items.par_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[test]
    fn small_inputs_stay_sequential() {
        let plan = WorkerPlan::for_items(10);
        assert!(!plan.is_parallel());
        assert_eq!(plan.parallel_workers, 1);
    }

    #[test]
    fn parallel_map_preserves_order() {
        let items: Vec<usize> = (0..PARALLEL_THRESHOLD * 3 + 7).collect();
        let doubled = parallel_map(&items, |x| Ok(x * 2)).unwrap();
        assert_eq!(doubled.len(), items.len());
        assert!(doubled.iter().enumerate().all(|(i, v)| *v == i * 2));
    }

    #[test]
    fn parallel_map_stops_at_errors() {
        let items: Vec<usize> = (0..PARALLEL_THRESHOLD * 2).collect();
        let squares = parallel_map(&items, |x| Ok(x * x)).unwrap();
        assert_eq!(squares[PARALLEL_THRESHOLD], PARALLEL_THRESHOLD * PARALLEL_THRESHOLD);

        let err = parallel_map(&items, |&x| {
            if x == 3000 {
                bail!("bad item {}", x);
            }
            Ok(x)
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "bad item 3000");
    }
}
