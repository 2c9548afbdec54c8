use rayon::prelude::*;

/// Batches shorter than this are mapped on the calling thread.
pub const MIN_PARALLEL_LEN: usize = 16;

/// Map a fallible closure over `items`, optionally in parallel.
///
/// Output order always matches input order. The first error encountered
/// (in no particular order when parallel) is returned and the rest of the
/// batch is abandoned.
///
/// `sequential` keeps the whole map on the calling thread; callers set it
/// for batches below [`MIN_PARALLEL_LEN`], where spawning rayon tasks costs
/// more than the evaluations themselves.
pub fn par_map<T, U, E>(
    items: &[T],
    sequential: bool,
    body: impl Fn(&T) -> Result<U, E> + Send + Sync,
) -> Result<Vec<U>, E>
where
    T: Sync,
    U: Send,
    E: Send,
{
    if sequential {
        items.iter().map(body).collect()
    } else {
        items.par_iter().map(body).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_both_ways() {
        let xs: Vec<u64> = (0..1000).collect();
        let seq = par_map(&xs, true, |&x| Ok::<_, ()>(x * x)).unwrap();
        let par = par_map(&xs, false, |&x| Ok::<_, ()>(x * x)).unwrap();
        assert_eq!(seq, par);
        assert_eq!(par[999], 999 * 999);
    }

    #[test]
    fn error_aborts_batch() {
        let xs: Vec<i32> = (0..100).collect();
        let res = par_map(&xs, false, |&x| if x == 57 { Err(x) } else { Ok(x) });
        assert_eq!(res, Err(57));
    }
}
