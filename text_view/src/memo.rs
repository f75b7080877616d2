// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::cell::OnceCell;

/// A lazily computed value that can be dropped and recomputed on demand.
#[derive(Debug)]
pub(crate) struct Memo<T> {
    cell: OnceCell<T>,
}

impl<T> Memo<T> {
    pub(crate) const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the cached value, computing it with `f` first if needed.
    ///
    /// A failing `f` leaves the memo empty.
    pub(crate) fn get_or_try_init<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let value = f()?;
        Ok(self.cell.get_or_init(|| value))
    }

    pub(crate) fn invalidate(&mut self) {
        self.cell.take();
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Memo;

    #[test]
    fn computes_once_until_invalidated() {
        let mut memo = Memo::new();
        let mut calls = 0;
        let mut compute = || {
            calls += 1;
            Ok::<_, ()>(calls)
        };
        assert_eq!(memo.get_or_try_init(&mut compute), Ok(&1));
        assert_eq!(memo.get_or_try_init(&mut compute), Ok(&1));
        memo.invalidate();
        assert!(!memo.is_cached());
        assert_eq!(memo.get_or_try_init(&mut compute), Ok(&2));
    }

    #[test]
    fn failure_leaves_memo_empty() {
        let memo: Memo<u32> = Memo::new();
        assert_eq!(memo.get_or_try_init(|| Err("boom")), Err("boom"));
        assert!(!memo.is_cached());
    }
}
