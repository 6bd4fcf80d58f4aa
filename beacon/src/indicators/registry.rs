use log::debug;

use crate::errors::Error;
use crate::errors::RegistryError::{AllocationFailed, DuplicateOutput, NotFound};
use crate::indicators::{Indicator, IndicatorHandle};

/// A storage slot: the generation is bumped every time the slot is vacated.
#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    indicator: Option<Indicator>,
}

/// The collection of all registered [`Indicator`]s.
///
/// Indicators live in a slot arena addressed by generation-checked [`IndicatorHandle`]s: removing an
/// indicator frees its slot for reuse, and any handle still pointing to it is detected as stale.
///
/// The registry itself is not synchronized: the scheduler keeps it behind its single guard.
#[derive(Clone, Debug)]
pub struct Registry {
    slots: Vec<Slot>,
    /// Indexes of vacant slots.
    free: Vec<u32>,
    /// Maximum number of indicators held at once.
    capacity: usize,
    len: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl Registry {
    /// Creates an empty registry holding at most `capacity` indicators.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            capacity,
            len: 0,
        }
    }

    /// Inserts an indicator.
    ///
    /// # Errors
    /// * `DuplicateOutput`: an indicator is already bound to the same output pin.
    /// * `AllocationFailed`: the registry is full or memory could not be reserved.
    pub fn insert(&mut self, indicator: Indicator) -> Result<IndicatorHandle, Error> {
        let pin = indicator.get_output().pin;
        self.ensure_vacant(pin)?;

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.indicator = Some(indicator);
                IndicatorHandle::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| AllocationFailed {
                    capacity: self.capacity,
                })?;
                self.slots.try_reserve(1).map_err(|_| AllocationFailed {
                    capacity: self.capacity,
                })?;
                self.slots.push(Slot {
                    generation: 0,
                    indicator: Some(indicator),
                });
                IndicatorHandle::new(index, 0)
            }
        };
        self.len += 1;
        debug!("Registry: insert indicator {} on pin {}", handle, pin);
        Ok(handle)
    }

    /// Checks an indicator bound to `pin` could be inserted.
    ///
    /// # Errors
    /// * `DuplicateOutput`: an indicator is already bound to `pin`.
    /// * `AllocationFailed`: the registry is full.
    pub fn ensure_vacant(&self, pin: u16) -> Result<(), Error> {
        if self.find_output(pin).is_some() {
            return Err(DuplicateOutput { pin }.into());
        }
        if self.len >= self.capacity {
            return Err(AllocationFailed {
                capacity: self.capacity,
            }
            .into());
        }
        Ok(())
    }

    /// Removes an indicator and returns it: the handle becomes stale.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    pub fn remove(&mut self, handle: IndicatorHandle) -> Result<Indicator, Error> {
        let slot = self
            .slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .ok_or(NotFound { handle })?;
        let indicator = slot.indicator.take().ok_or(NotFound { handle })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        debug!("Registry: remove indicator {}", handle);
        Ok(indicator)
    }

    /// Retrieves a reference to an indicator.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    pub fn get(&self, handle: IndicatorHandle) -> Result<&Indicator, Error> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.indicator.as_ref())
            .ok_or(Error::from(NotFound { handle }))
    }

    /// Retrieves a mutable reference to an indicator.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    pub fn get_mut(&mut self, handle: IndicatorHandle) -> Result<&mut Indicator, Error> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.indicator.as_mut())
            .ok_or(Error::from(NotFound { handle }))
    }

    /// Finds the indicator bound to the given output pin.
    pub fn find_output(&self, pin: u16) -> Option<IndicatorHandle> {
        self.iter()
            .find(|(_, indicator)| indicator.get_output().pin == pin)
            .map(|(handle, _)| handle)
    }

    /// Iterates over all indicators.
    pub fn iter(&self) -> impl Iterator<Item = (IndicatorHandle, &Indicator)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.indicator
                .as_ref()
                .map(|indicator| (IndicatorHandle::new(index as u32, slot.generation), indicator))
        })
    }

    /// Iterates mutably over all indicators.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (IndicatorHandle, &mut Indicator)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.indicator
                .as_mut()
                .map(|indicator| (IndicatorHandle::new(index as u32, generation), indicator))
        })
    }

    /// Lists the handles of all indicators.
    pub fn handles(&self) -> Vec<IndicatorHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Removes every indicator: all handles become stale.
    pub fn drain(&mut self) -> Vec<Indicator> {
        let handles = self.handles();
        handles
            .into_iter()
            .filter_map(|handle| self.remove(handle).ok())
            .collect()
    }

    /// Returns the number of indicators held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Indicates the registry holds no indicator.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum number of indicators held at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
