//! Minimal internal worker fan-out, built on `std::thread::scope` since this
//! crate has no thread-pool dependency.

/// Runs `f(i)` for every `i` in `0..count`, each on its own scoped thread.
///
/// Used by [`crate::mpn_mul`]/[`crate::polymul`] to fan the per-prime
/// transform/pointwise-multiply/inverse pipeline out across threads, one
/// worker per prime lane.
pub fn for_each<F>(count: usize, f: F)
where
    F: Fn(usize) + Sync,
{
    if count == 0 {
        return;
    }
    if count == 1 {
        f(0);
        return;
    }
    std::thread::scope(|scope| {
        let f = &f;
        for i in 0..count {
            scope.spawn(move || f(i));
        }
    });
}

/// Runs `f(i)` for every `i` in `0..count`, each on its own scoped thread,
/// collecting their return values in order.
///
/// Disjoint `&mut Option<T>` slots (one per worker, handed out via
/// `iter_mut`) let every thread write its own result without a lock.
pub fn map_each<T, F>(count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let mut out: Vec<Option<T>> = (0..count).map(|_| None).collect();
    if count == 1 {
        out[0] = Some(f(0));
        return out.into_iter().map(|x| x.unwrap()).collect();
    }
    std::thread::scope(|scope| {
        let f = &f;
        for (i, slot) in out.iter_mut().enumerate() {
            scope.spawn(move || *slot = Some(f(i)));
        }
    });
    out.into_iter().map(|x| x.unwrap()).collect()
}

// ======================================================================
// TESTS

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn map_each_collects_results_in_order() {
        let got = map_each(6, |i| i * i);
        assert_eq!(got, vec![0, 1, 4, 9, 16, 25]);
    }

    #[test]
    fn for_each_runs_every_index_exactly_once() {
        let seen: Vec<AtomicUsize> = (0..8).map(|_| AtomicUsize::new(0)).collect();
        for_each(8, |i| {
            seen[i].fetch_add(1, Ordering::SeqCst);
        });
        for s in &seen {
            assert_eq!(s.load(Ordering::SeqCst), 1);
        }
    }
}
