//! Random value generation.
//!
//! Generated sequences always start with the type's minimum, maximum and zero,
//! followed by random values, so that a round trip of any length above three
//! covers the boundaries.

/// Integer types with a random generator and known extremes.
pub trait RandomValue: Copy {
    const MIN: Self;
    const MAX: Self;
    const ZERO: Self;

    fn random() -> Self;
}

macro_rules! impl_random_int {
    ($($ty:ident),*) => {
        $(
            impl RandomValue for $ty {
                const MIN: $ty = $ty::MIN;
                const MAX: $ty = $ty::MAX;
                const ZERO: $ty = 0;

                fn random() -> $ty {
                    fastrand::$ty(..)
                }
            }
        )*
    };
}

impl_random_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

impl RandomValue for f32 {
    const MIN: f32 = f32::MIN;
    const MAX: f32 = f32::MAX;
    const ZERO: f32 = 0.0;

    fn random() -> f32 {
        (fastrand::f32() - 0.5) * 1e6
    }
}

impl RandomValue for f64 {
    const MIN: f64 = f64::MIN;
    const MAX: f64 = f64::MAX;
    const ZERO: f64 = 0.0;

    fn random() -> f64 {
        (fastrand::f64() - 0.5) * 1e12
    }
}

/// `count` values: the extremes and zero first, random values after.
pub fn values_with_extremes<T: RandomValue>(count: usize) -> Vec<T> {
    [T::MIN, T::MAX, T::ZERO]
        .into_iter()
        .chain(std::iter::repeat_with(T::random))
        .take(count)
        .collect()
}

/// Random values only.
pub fn random_values<T: RandomValue>(count: usize) -> Vec<T> {
    std::iter::repeat_with(T::random).take(count).collect()
}

/// Random alphanumeric strings with lengths in `0..=max_len`.
pub fn random_strings(count: usize, max_len: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let len = fastrand::usize(0..=max_len);
            std::iter::repeat_with(fastrand::alphanumeric)
                .take(len)
                .collect()
        })
        .collect()
}

/// A null map with roughly `null_ratio` of the rows set.
pub fn random_null_map(count: usize, null_ratio: f64) -> Vec<bool> {
    (0..count).map(|_| fastrand::f64() < null_ratio).collect()
}

/// Strictly ascending row offsets below `row_count`, each row picked with
/// probability `density`.
pub fn random_sparse_offsets(row_count: usize, density: f64) -> Vec<usize> {
    (0..row_count)
        .filter(|_| fastrand::f64() < density)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes_come_first() {
        fastrand::seed(7);
        let values = values_with_extremes::<i16>(10);
        assert_eq!(&values[..3], &[i16::MIN, i16::MAX, 0]);
        assert_eq!(values.len(), 10);
        assert_eq!(values_with_extremes::<u8>(2), vec![0, u8::MAX]);
    }

    #[test]
    fn test_sparse_offsets_ascend() {
        let offsets = random_sparse_offsets(1000, 0.1);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert!(offsets.iter().all(|&o| o < 1000));
    }
}
