#![allow(unused_macros)]

/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut handlers = lock!(self.handlers);
///  handlers.push(handler);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let name = read_lock!(self.name).clone();
/// ```
macro_rules! read_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  *write_lock!(self.salary) = 175.47;
/// ```
macro_rules! write_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.write().expect("Failed to acquire write lock")
    };
}
