use std::{
    collections::HashSet,
    error::Error,
    fmt::{Debug, Display},
    hash::Hash,
};

use num_traits::{cast, Bounded, One, PrimInt, Unsigned, WrappingAdd, Zero};

pub trait Key: Copy + Eq + Hash + Debug {
    type Id: PrimInt + Unsigned + WrappingAdd + Hash + Debug;
    fn new(id: Self::Id) -> Self;
    fn id(&self) -> Self::Id;
}

/// Generates a newtype key wrapper, the way [`Key`] implementors are meant to be declared.
macro_rules! key_type {
    ($name:ident, $id:ty) => {
        #[derive(
            serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug,
        )]
        pub struct $name($id);
        impl $crate::composition::utils::key_generator::Key for $name {
            type Id = $id;
            fn new(id: Self::Id) -> Self {
                Self(id)
            }
            fn id(&self) -> Self::Id {
                self.0
            }
        }
    };
}
pub(crate) use key_type;

/// Construct for generating unique keys, via an incrementing counter.
///
/// Contains a set of all keys currently in use, so a freed key is never reused until the
/// counter has wrapped all the way back around to it.
#[derive(Debug)]
pub struct KeyGenerator<K>
where
    K: Key,
{
    last_id: K::Id,
    used_ids: HashSet<K::Id>,
}
impl<K> Default for KeyGenerator<K>
where
    K: Key,
    K::Id: Bounded + Zero + One + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}
impl<K> KeyGenerator<K>
where
    K: Key,
    // This should be implied by the above, but rustc doesn't seem to think so.
    K::Id: Bounded + Zero + One + Ord,
{
    pub fn new() -> Self {
        KeyGenerator {
            last_id: K::Id::max_value(),
            used_ids: HashSet::new(),
        }
    }

    /// Amount of keys currently in use.
    pub fn used_keys(&self) -> K::Id {
        cast(self.used_ids.len()).unwrap()
    }

    /// Amount of unique keys left before `next()` returns [`OverflowError`].
    pub fn remaining_keys(&self) -> K::Id {
        K::Id::max_value() - self.used_keys()
    }

    /// Return a new unique key, registering it as occupied until [`Self::free()`] is called.
    pub fn next(&mut self) -> Result<K, OverflowError> {
        let id = self.peek_next_id()?;
        let key = K::new(id);
        self.reserve(key).unwrap();
        self.last_id = id;
        Ok(key)
    }

    fn peek_next_id(&self) -> Result<K::Id, OverflowError> {
        if self.remaining_keys() == K::Id::zero() {
            return Err(OverflowError);
        }

        let mut id = self.last_id;
        loop {
            id = id.wrapping_add(&K::Id::one());
            if !self.used_ids.contains(&id) {
                return Ok(id);
            }
        }
    }

    /// Free a key, allowing it to eventually be reused once the counter wraps back around.
    pub fn free(&mut self, key: K) -> Result<(), InvalidKeyError<K>> {
        if self.used_ids.remove(&key.id()) {
            Ok(())
        } else {
            Err(InvalidKeyError { key })
        }
    }

    /// Check whether a key is currently in use.
    pub fn in_use(&self, key: K) -> bool {
        self.used_ids.contains(&key.id())
    }

    fn reserve(&mut self, key: K) -> Result<(), KeyCollisionError<K>> {
        if self.used_ids.insert(key.id()) {
            Ok(())
        } else {
            Err(KeyCollisionError { key })
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct OverflowError;
impl Display for OverflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "The max number of keys has been exceeded")
    }
}
impl Error for OverflowError {}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidKeyError<K: Key> {
    key: K,
}
impl<K> Display for InvalidKeyError<K>
where
    K: Key,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key not present: {:?}", self.key)
    }
}
impl<K> Error for InvalidKeyError<K> where K: Key {}

#[derive(Debug, PartialEq, Eq)]
pub struct KeyCollisionError<K: Key> {
    key: K,
}
impl<K> Display for KeyCollisionError<K>
where
    K: Key,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key already present: {:?}", self.key)
    }
}
impl<K> Error for KeyCollisionError<K> where K: Key {}

#[cfg(test)]
mod tests {
    use super::*;

    key_type!(TestKey, u8);

    #[test]
    fn add_one() {
        let mut kg = KeyGenerator::<TestKey>::new();
        assert_eq!(kg.remaining_keys(), u8::MAX);
        kg.next().unwrap();
        assert_eq!(kg.remaining_keys(), u8::MAX - 1);
    }

    #[test]
    fn free_then_reuse_requires_wraparound() {
        let mut kg = KeyGenerator::<TestKey>::new();
        let k = kg.next().unwrap();
        kg.free(k).unwrap();
        assert_eq!(kg.remaining_keys(), u8::MAX);

        let k2 = kg.next().unwrap();
        assert_ne!(k, k2);
    }

    #[test]
    fn free_invalid() {
        let mut kg = KeyGenerator::<TestKey>::new();
        let r = kg.free(TestKey(6));
        assert_eq!(r, Err(InvalidKeyError { key: TestKey(6) }));
    }

    #[test]
    fn overflow() {
        let mut kg = KeyGenerator::<TestKey>::new();
        for _ in 0..=255u32 {
            kg.next().unwrap();
        }
        let r = kg.next();
        assert_eq!(r, Err(OverflowError));
    }

    #[test]
    fn in_use() {
        let mut kg = KeyGenerator::<TestKey>::new();
        let k = kg.next().unwrap();
        assert!(kg.in_use(k));
        kg.free(k).unwrap();
        assert!(!kg.in_use(k));
    }
}
