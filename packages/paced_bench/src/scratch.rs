use std::any::{Any, type_name};
use std::fmt;

use foldhash::{HashMap, HashMapExt};

/// Mutable state owned by one workload and shared by its setup hook, its workload function
/// and its teardown hook.
///
/// Values of any `Send` type are stored under string keys and retrieved by requesting the
/// same type back. The scratch state is emptied whenever the workload is reset.
///
/// # Examples
///
/// ```
/// use paced_bench::Scratch;
///
/// let mut scratch = Scratch::new();
/// scratch.insert("buffer", vec![1_u8, 2, 3]);
///
/// let buffer = scratch.get_mut::<Vec<u8>>("buffer").unwrap();
/// buffer.push(4);
///
/// assert_eq!(scratch.get::<Vec<u8>>("buffer").unwrap().len(), 4);
/// assert!(scratch.get::<String>("buffer").is_none());
/// ```
#[derive(Default)]
pub struct Scratch {
    values: HashMap<String, Box<dyn Any + Send>>,
}

impl Scratch {
    /// Creates empty scratch state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Stores `value` under `key`, replacing any previous value regardless of its type.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send,
    {
        self.values.insert(key.into(), Box::new(value));
    }

    /// The value stored under `key`, if there is one and it is of type `T`.
    #[must_use]
    pub fn get<T>(&self, key: &str) -> Option<&T>
    where
        T: Any + Send,
    {
        self.values.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// The value stored under `key`, if there is one and it is of type `T`.
    #[must_use]
    pub fn get_mut<T>(&mut self, key: &str) -> Option<&mut T>
    where
        T: Any + Send,
    {
        self.values
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// The value stored under `key`, first storing the result of `f` if there is no value
    /// or the existing value is not of type `T`.
    pub fn get_or_insert_with<T>(&mut self, key: &str, f: impl FnOnce() -> T) -> &mut T
    where
        T: Any + Send,
    {
        let present = self.values.get(key).is_some_and(|value| value.is::<T>());

        if !present {
            self.values.insert(key.to_string(), Box::new(f()));
        }

        self.values
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
            .expect("guarded by insertion of a value of the requested type above")
    }

    /// Removes the value stored under `key`. Returns whether there was one.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Whether any value is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.values.keys().collect::<Vec<_>>();
        keys.sort_unstable();

        f.debug_struct(type_name::<Self>())
            .field("keys", &keys)
            .finish()
    }
}
