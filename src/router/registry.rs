//! Bounded registries for user buttons and sliders.
//!
//! Entries are identified by insertion index; that index is the `id` a
//! client sends in `/btn?id=` and `/sld?id=`. The first
//! [`REGISTRY_CAPACITY`] registrations win; later ones fail explicitly
//! and change nothing.

use crate::error::CapacityError;

/// Entries per registry.
pub const REGISTRY_CAPACITY: usize = 8;

/// Longest label, in bytes.
pub const LABEL_CAPACITY: usize = 32;

pub type Label = heapless::String<LABEL_CAPACITY>;

pub type ButtonCallback = Box<dyn FnMut()>;
pub type SliderCallback = Box<dyn FnMut(i32)>;

/// Copy `text` into a fixed label buffer.
pub fn label(text: &str) -> Result<Label, CapacityError> {
    let mut l = Label::new();
    l.push_str(text).map_err(|()| CapacityError::LabelTooLong)?;
    Ok(l)
}

// ───────────────────────────────────────────────────────────────
// Registrations
// ───────────────────────────────────────────────────────────────

pub struct ButtonRegistration {
    label: Label,
    on_press: ButtonCallback,
}

impl ButtonRegistration {
    pub fn new(label: Label, on_press: ButtonCallback) -> Self {
        Self { label, on_press }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn press(&mut self) {
        (self.on_press)();
    }
}

/// A ranged control. `min <= value <= max` always holds.
pub struct SliderRegistration {
    label: Label,
    min: i32,
    max: i32,
    step: i32,
    value: i32,
    on_change: SliderCallback,
}

impl SliderRegistration {
    /// Swaps reversed bounds, coerces a non-positive step to 1 and clamps
    /// the initial value into range.
    pub fn new(
        label: Label,
        on_change: SliderCallback,
        min: i32,
        max: i32,
        initial: i32,
        step: i32,
    ) -> Self {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        Self {
            label,
            min,
            max,
            step: step.max(1),
            value: initial.clamp(min, max),
            on_change,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Clamp, store and report a new value. Returns the stored value.
    pub fn set(&mut self, v: i32) -> i32 {
        self.value = v.clamp(self.min, self.max);
        (self.on_change)(self.value);
        self.value
    }
}

// ───────────────────────────────────────────────────────────────
// Registry
// ───────────────────────────────────────────────────────────────

/// Ordered, fixed-capacity collection with stable insertion-index ids.
pub struct Registry<T, const N: usize> {
    entries: heapless::Vec<T, N>,
}

impl<T, const N: usize> Default for Registry<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Registry<T, N> {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Append an entry and return its id.
    pub fn push(&mut self, entry: T) -> Result<usize, CapacityError> {
        let id = self.entries.len();
        self.entries
            .push(entry)
            .map_err(|_| CapacityError::RegistryFull)?;
        Ok(id)
    }

    /// Look up by wire id; negative and out-of-range ids yield `None`.
    pub fn get(&self, id: i32) -> Option<&T> {
        usize::try_from(id).ok().and_then(|i| self.entries.get(i))
    }

    pub fn get_mut(&mut self, id: i32) -> Option<&mut T> {
        usize::try_from(id).ok().and_then(|i| self.entries.get_mut(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

pub type ButtonRegistry = Registry<ButtonRegistration, REGISTRY_CAPACITY>;
pub type SliderRegistry = Registry<SliderRegistration, REGISTRY_CAPACITY>;
