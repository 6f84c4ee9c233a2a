use std::hash::Hash;

/// Identity capability for set elements and map keys.
///
/// The hash contribution is [`Hash::hash`] and the equality test is [`Eq`].
/// Two values are the same element when they hash alike and compare equal;
/// reference identity plays no part.
pub trait Collectable: Hash + Eq {}

impl<T> Collectable for T where T: Hash + Eq + ?Sized {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::{BuildHasher, Hasher};

    use crate::FnvBuildHasher;

    #[derive(Debug)]
    struct Caseless(String);

    impl PartialEq for Caseless {
        fn eq(&self, other: &Self) -> bool {
            self.0.eq_ignore_ascii_case(&other.0)
        }
    }

    impl Eq for Caseless {}

    impl Hash for Caseless {
        fn hash<H: Hasher>(&self, state: &mut H) {
            for b in self.0.bytes() {
                state.write_u8(b.to_ascii_lowercase());
            }
        }
    }

    fn assert_collectable<T: Collectable>(_: &T) {}

    #[test]
    fn custom_identity_is_collectable() {
        let a = Caseless("Key".into());
        let b = Caseless("kEY".into());
        assert_collectable(&a);

        let s = FnvBuildHasher::default();
        assert_eq!(s.hash_one(&a), s.hash_one(&b));
        assert_eq!(a, b);
    }
}
