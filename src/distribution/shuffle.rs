use rand::Rng;

/// Unbiased in-place Fisher-Yates shuffle.
/// Walks from the last index down, swapping each element with a uniformly
/// chosen element at or before it, so every permutation is equally likely
/// given a fair generator. Callers inject the generator, which keeps runs
/// reproducible under a seeded rng.
pub fn fisher_yates<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);

        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn same_seed_gives_same_order() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b: Vec<u32> = (0..20).collect();
        fisher_yates(&mut a, &mut StdRng::seed_from_u64(3));
        fisher_yates(&mut b, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn trivial_inputs_are_untouched() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut empty: Vec<u32> = Vec::new();
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut single = vec![42];
        fisher_yates(&mut single, &mut rng);
        assert_eq!(single, vec![42]);
    }
}
