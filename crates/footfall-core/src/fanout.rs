use rayon::prelude::*;

/// Element count above which independent per-element work is forked onto the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 8;

/// Applies `f` to every element. Elements must not depend on each other; small
/// slices stay on the calling thread.
pub fn for_each_mut<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    if items.len() > PARALLEL_THRESHOLD {
        items.par_iter_mut().for_each(f);
    } else {
        items.iter_mut().for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_result_both_paths() {
        let mut small: Vec<u32> = (0..PARALLEL_THRESHOLD as u32).collect();
        let mut large: Vec<u32> = (0..64).collect();
        for_each_mut(&mut small, |x| *x *= 3);
        for_each_mut(&mut large, |x| *x *= 3);
        assert!(small.iter().enumerate().all(|(i, &x)| x == i as u32 * 3));
        assert!(large.iter().enumerate().all(|(i, &x)| x == i as u32 * 3));
    }
}
