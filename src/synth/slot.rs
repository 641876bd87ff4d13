/// Lifecycle slot for an optional effect node in the graph.
///
/// Settings express effects as `Option<config>`; the graph has to turn that
/// into create / update-in-place / dispose against whatever node currently
/// exists. Keeping the transition a pure data operation here means the
/// three-way logic is testable without any audio backend.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectSlot<T> {
    Absent,
    Present(T),
}

/// What `reconcile` did to the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotTransition {
    Unchanged,
    Created,
    Updated,
    Disposed,
}

impl<T: PartialEq> EffectSlot<T> {
    /// Drives the slot toward `desired` and reports the transition taken.
    pub fn reconcile(&mut self, desired: Option<T>) -> SlotTransition {
        match desired {
            None => {
                if self.is_present() {
                    *self = EffectSlot::Absent;
                    SlotTransition::Disposed
                } else {
                    SlotTransition::Unchanged
                }
            }
            Some(config) => match self {
                EffectSlot::Absent => {
                    *self = EffectSlot::Present(config);
                    SlotTransition::Created
                }
                EffectSlot::Present(current) => {
                    if *current == config {
                        SlotTransition::Unchanged
                    } else {
                        *current = config;
                        SlotTransition::Updated
                    }
                }
            },
        }
    }
}

impl<T> EffectSlot<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            EffectSlot::Absent => None,
            EffectSlot::Present(config) => Some(config),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, EffectSlot::Present(_))
    }

    pub fn to_option(&self) -> Option<T>
    where
        T: Clone,
    {
        self.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_stays_absent() {
        let mut slot: EffectSlot<u32> = EffectSlot::Absent;
        assert_eq!(slot.reconcile(None), SlotTransition::Unchanged);
        assert_eq!(slot, EffectSlot::Absent);
    }

    #[test]
    fn test_enable_creates() {
        let mut slot: EffectSlot<u32> = EffectSlot::Absent;
        assert_eq!(slot.reconcile(Some(7)), SlotTransition::Created);
        assert_eq!(slot.get(), Some(&7));
    }

    #[test]
    fn test_matching_config_is_untouched() {
        let mut slot = EffectSlot::Present(7u32);
        assert_eq!(slot.reconcile(Some(7)), SlotTransition::Unchanged);
    }

    #[test]
    fn test_stale_config_updates_in_place() {
        let mut slot = EffectSlot::Present(7u32);
        assert_eq!(slot.reconcile(Some(8)), SlotTransition::Updated);
        assert_eq!(slot.get(), Some(&8));
    }

    #[test]
    fn test_disable_disposes() {
        let mut slot = EffectSlot::Present(7u32);
        assert_eq!(slot.reconcile(None), SlotTransition::Disposed);
        assert!(!slot.is_present());
    }

    #[test]
    fn test_disable_then_enable_rebuilds_from_config() {
        // toggling off and on does not resurrect the old node; whatever
        // config arrives on re-enable wins
        let mut slot = EffectSlot::Present(7u32);
        slot.reconcile(None);
        assert_eq!(slot.reconcile(Some(3)), SlotTransition::Created);
        assert_eq!(slot.get(), Some(&3));
    }
}
