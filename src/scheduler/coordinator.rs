// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change detector gating downstream refreshes.

/// Remembers the last value of a sensor group and reports changes.
///
/// The first value always counts as a change.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::scheduler::GroupCoordinator;
///
/// let mut coordinator = GroupCoordinator::new();
/// assert!(coordinator.maybe_refresh((3, 1)));
/// assert!(!coordinator.maybe_refresh((3, 1)));
/// assert!(coordinator.maybe_refresh((4, 1)));
/// ```
#[derive(Debug, Clone)]
pub struct GroupCoordinator<T> {
    last: Option<T>,
}

impl<T: PartialEq> GroupCoordinator<T> {
    /// Creates a coordinator that has not seen any value.
    #[must_use]
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Stores `value` and returns `true` if it differs from the last one.
    pub fn maybe_refresh(&mut self, value: T) -> bool {
        if self.last.as_ref() == Some(&value) {
            return false;
        }
        self.last = Some(value);
        true
    }

    /// Returns the last stored value.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

impl<T: PartialEq> Default for GroupCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}
