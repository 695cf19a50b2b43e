use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use ordered_float::{FloatCore, OrderedFloat};

/// A wrapper around basic floating point types that implements the total
/// ordering, equality and hashing required to memoize float values.
///
/// All NaN bit patterns compare and hash as a single value, as do `0.0`
/// and `-0.0`, so a dictionary holds at most one entry for each.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct FloatValue<T>(pub OrderedFloat<T>)
where
    T: FloatCore;

impl<T> FloatValue<T>
where
    T: FloatCore,
{
    pub const fn new(value: T) -> Self {
        FloatValue(OrderedFloat(value))
    }
}

impl<T> From<T> for FloatValue<T>
where
    T: FloatCore,
{
    fn from(value: T) -> Self {
        Self(OrderedFloat(value))
    }
}

impl<T> Default for FloatValue<T>
where
    T: FloatCore,
{
    fn default() -> Self {
        FloatValue(OrderedFloat(T::zero()))
    }
}

impl<T> Hash for FloatValue<T>
where
    T: FloatCore,
    OrderedFloat<T>: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialEq for FloatValue<T>
where
    T: FloatCore,
{
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T: FloatCore> Eq for FloatValue<T> {}

impl<T> PartialOrd for FloatValue<T>
where
    T: FloatCore,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for FloatValue<T>
where
    T: FloatCore,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

unsafe impl bytemuck::Zeroable for FloatValue<f32> {}

unsafe impl bytemuck::Zeroable for FloatValue<f64> {}

unsafe impl bytemuck::Pod for FloatValue<f32> {}

unsafe impl bytemuck::Pod for FloatValue<f64> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_and_zero_collapse() {
        assert_eq!(FloatValue::new(f64::NAN), FloatValue::new(-f64::NAN));
        assert_eq!(FloatValue::new(0.0f64), FloatValue::new(-0.0f64));
        assert_ne!(FloatValue::new(1.0f32), FloatValue::new(2.0f32));
    }

    #[test]
    fn test_pod_cast() {
        let values = [FloatValue::new(1.5f32), FloatValue::new(-2.5f32)];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        assert_eq!(bytes.len(), 8);
        let back: &[FloatValue<f32>] = bytemuck::cast_slice(bytes);
        assert_eq!(back, &values);
    }
}
