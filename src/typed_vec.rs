/// Defines an index newtype and a vector that can only be indexed by it.
///
/// Segment and subpath indices are both plain `usize`s underneath, and mixing
/// them up is an easy mistake to make, so each gets its own type.
macro_rules! typed_vec {
    ($(#[$idx_meta:meta])* $idx_name:ident, $(#[$vec_meta:meta])* $vec_name:ident, $dbg_prefix:expr) => {
        $(#[$idx_meta])*
        #[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
        pub struct $idx_name(pub usize);

        impl std::fmt::Debug for $idx_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", $dbg_prefix, self.0)
            }
        }

        $(#[$vec_meta])*
        #[derive(Clone, PartialEq)]
        pub struct $vec_name<T> {
            inner: Vec<T>,
        }

        #[allow(dead_code)]
        impl<T> $vec_name<T> {
            /// Wraps a plain vector.
            pub fn from_vec(vec: Vec<T>) -> Self {
                Self { inner: vec }
            }

            /// Creates a new vector with capacity for at least `cap` elements before reallocating.
            pub fn with_capacity(cap: usize) -> Self {
                Self {
                    inner: Vec::with_capacity(cap),
                }
            }

            /// Returns an iterator over all indices into this vector.
            pub fn indices(&self) -> impl Iterator<Item = $idx_name> {
                (0..self.inner.len()).map($idx_name)
            }

            /// The length of this vector.
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            /// Are we empty?
            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Adds a new element, returning its index.
            pub fn push(&mut self, elt: T) -> $idx_name {
                self.inner.push(elt);
                $idx_name(self.inner.len() - 1)
            }

            /// Returns an iterator over indices and elements.
            pub fn iter(&self) -> impl Iterator<Item = ($idx_name, &T)> + '_ {
                self.inner
                    .iter()
                    .enumerate()
                    .map(|(idx, t)| ($idx_name(idx), t))
            }

            /// Returns an iterator over the elements, without their indices.
            pub fn values(&self) -> std::slice::Iter<'_, T> {
                self.inner.iter()
            }

            /// The elements in index order, as a slice.
            pub fn as_slice(&self) -> &[T] {
                &self.inner
            }

            /// Builds a new vector, with one element for each element of this one.
            pub fn map<U>(&self, mut f: impl FnMut($idx_name, &T) -> U) -> $vec_name<U> {
                $vec_name {
                    inner: self.iter().map(|(idx, t)| f(idx, t)).collect(),
                }
            }

            /// Like [`Self::map`], but the mapping function can fail.
            pub fn try_map<U, E>(
                &self,
                mut f: impl FnMut($idx_name, &T) -> Result<U, E>,
            ) -> Result<$vec_name<U>, E> {
                Ok($vec_name {
                    inner: self
                        .iter()
                        .map(|(idx, t)| f(idx, t))
                        .collect::<Result<_, _>>()?,
                })
            }
        }

        #[allow(dead_code)]
        impl<T: Default> $vec_name<T> {
            /// Creates a new vector with `size` elements, each initialized with the default value.
            pub fn with_size(size: usize) -> Self {
                Self {
                    inner: std::iter::repeat_with(T::default).take(size).collect(),
                }
            }
        }

        impl<T> Default for $vec_name<T> {
            fn default() -> Self {
                Self { inner: Vec::new() }
            }
        }

        impl<T> std::ops::Index<$idx_name> for $vec_name<T> {
            type Output = T;

            fn index(&self, index: $idx_name) -> &Self::Output {
                &self.inner[index.0]
            }
        }

        impl<T> std::ops::IndexMut<$idx_name> for $vec_name<T> {
            fn index_mut(&mut self, index: $idx_name) -> &mut T {
                &mut self.inner[index.0]
            }
        }

        impl<T> FromIterator<T> for $vec_name<T> {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                Self {
                    inner: iter.into_iter().collect(),
                }
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $vec_name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut map = f.debug_map();
                for (idx, elt) in self.iter() {
                    map.entry(&idx, elt);
                }
                map.finish()
            }
        }
    };
}
