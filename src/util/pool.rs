/*!
A thread safe pool of mutable search caches.

A compiled [`Regex`](crate::meta::Regex) is immutable and shared, but some of
its engines need scratch space to run a search: the PikeVM's thread lists,
the lazy DFA's state cache and the one-pass DFA's slot buffer. The pool hands
each search exclusive access to one cache and takes it back when the guard is
dropped. The pool grows to the number of simultaneous searches and never
shrinks.
*/

use std::sync::Mutex;

/// A thread safe pool of values created on demand by `F`.
pub(crate) struct Pool<T, F> {
    create: F,
    stack: Mutex<Vec<Box<T>>>,
}

impl<T, F: Fn() -> T> Pool<T, F> {
    pub(crate) fn new(create: F) -> Pool<T, F> {
        Pool { create, stack: Mutex::new(vec![]) }
    }

    /// Get a value from the pool, creating a fresh one if the pool is empty.
    pub(crate) fn get(&self) -> PoolGuard<'_, T, F> {
        // A panic while the lock is held can't leave the stack in a broken
        // state, so poisoning is ignored.
        let idle =
            self.stack.lock().unwrap_or_else(|err| err.into_inner()).pop();
        let value = idle.unwrap_or_else(|| Box::new((self.create)()));
        PoolGuard { pool: self, value: Some(value) }
    }

    /// Run `f` on every value currently sitting in the pool.
    pub(crate) fn for_each_idle<G: FnMut(&mut T)>(&self, mut f: G) {
        let mut stack =
            self.stack.lock().unwrap_or_else(|err| err.into_inner());
        for value in stack.iter_mut() {
            f(value);
        }
    }

    fn put(&self, value: Box<T>) {
        self.stack.lock().unwrap_or_else(|err| err.into_inner()).push(value);
    }
}

impl<T, F> core::fmt::Debug for Pool<T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let idle = self.stack.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("Pool").field("idle", &idle).finish()
    }
}

/// A guard giving exclusive access to a pooled value. The value goes back
/// into the pool when the guard is dropped.
pub(crate) struct PoolGuard<'a, T, F: Fn() -> T> {
    pool: &'a Pool<T, F>,
    value: Option<Box<T>>,
}

impl<'a, T, F: Fn() -> T> core::ops::Deref for PoolGuard<'a, T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.value {
            Some(ref value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<'a, T, F: Fn() -> T> core::ops::DerefMut for PoolGuard<'a, T, F> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value {
            Some(ref mut value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<'a, T, F: Fn() -> T> Drop for PoolGuard<'a, T, F> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put(value);
        }
    }
}
