// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stable-keyed slot storage
//!
//! Values live in a growable vector of slots. Erased slots go to a free
//! list and are reused by later insertions. Keys are plain dense indices
//! without a generation counter: a key must not be used after the value it
//! named was erased.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Typed key of a [`SlotVector`]
pub trait SlotKey: Copy + Eq {
    fn from_index(index: u32) -> Self;
    fn index(self) -> u32;
}

macro_rules! slot_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl SlotKey for $name {
            #[inline]
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> u32 {
                self.0
            }
        }
    };
}

slot_key!(
    /// Key of a cached surface
    SurfaceId
);
slot_key!(
    /// Key of a cached sampler
    SamplerId
);
slot_key!(
    /// Key of a cached framebuffer
    FramebufferId
);

/// Growable slot storage with a free list
pub struct SlotVector<K: SlotKey, T> {
    slots: Vec<Option<T>>,
    free_list: Vec<u32>,
    _key: PhantomData<K>,
}

impl<K: SlotKey, T> SlotVector<K, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            _key: PhantomData,
        }
    }

    /// Store a value and return its key
    ///
    /// # Example
    ///
    /// ```
    /// use pica_cache::core::rasterizer_cache::{SlotVector, SurfaceId};
    ///
    /// let mut slots: SlotVector<SurfaceId, &str> = SlotVector::new();
    /// let a = slots.insert("a");
    /// let b = slots.insert("b");
    /// slots.erase(a);
    ///
    /// // Freed slots are reused
    /// let c = slots.insert("c");
    /// assert_eq!(c, a);
    /// assert_eq!(slots[b], "b");
    /// ```
    pub fn insert(&mut self, value: T) -> K {
        match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(value);
                K::from_index(index)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(value));
                K::from_index(index)
            }
        }
    }

    /// Remove a value, returning it
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty.
    pub fn erase(&mut self, key: K) -> T {
        let value = self
            .slots
            .get_mut(key.index() as usize)
            .and_then(Option::take);
        match value {
            Some(value) => {
                self.free_list.push(key.index());
                value
            }
            None => panic!("Erasing empty slot {}", key.index()),
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.slots.get(key.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots.get_mut(key.index() as usize)?.as_mut()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over occupied slots in key order
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref().map(|value| (K::from_index(index as u32), value))
            })
    }

    /// Borrow two distinct values mutably
    ///
    /// # Panics
    ///
    /// Panics if both keys are equal or either slot is empty.
    pub fn get_pair_mut(&mut self, a: K, b: K) -> (&mut T, &mut T) {
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        assert_ne!(ia, ib, "Borrowing slot {ia} twice");

        let (low, high) = (ia.min(ib), ia.max(ib));
        let (head, tail) = self.slots.split_at_mut(high);
        let Some(low_value) = head[low].as_mut() else {
            panic!("slot {} is empty", low);
        };
        let Some(high_value) = tail[0].as_mut() else {
            panic!("slot {} is empty", high);
        };
        if ia < ib {
            (low_value, high_value)
        } else {
            (high_value, low_value)
        }
    }

    /// Replace the value at `key`, moving the previous value to a new slot
    ///
    /// # Returns
    ///
    /// The key now holding the previous value
    pub fn swap_and_insert(&mut self, key: K, value: T) -> K {
        let slot = self
            .slots
            .get_mut(key.index() as usize)
            .unwrap_or_else(|| panic!("Swapping unknown slot {}", key.index()));
        let previous = slot
            .replace(value)
            .unwrap_or_else(|| panic!("Swapping empty slot {}", key.index()));
        self.insert(previous)
    }
}

impl<K: SlotKey, T> Default for SlotVector<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SlotKey, T> Index<K> for SlotVector<K, T> {
    type Output = T;

    fn index(&self, key: K) -> &T {
        self.get(key)
            .unwrap_or_else(|| panic!("Accessing empty slot {}", key.index()))
    }
}

impl<K: SlotKey, T> IndexMut<K> for SlotVector<K, T> {
    fn index_mut(&mut self, key: K) -> &mut T {
        self.get_mut(key)
            .unwrap_or_else(|| panic!("Accessing empty slot {}", key.index()))
    }
}
