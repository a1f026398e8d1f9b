//! Generational slab of drag sessions owned by a container

use std::fmt;

use crate::drag::DragSession;

/// Handle to a session in a [`SessionRegistry`]
///
/// A handle outlives its session harmlessly: after removal every lookup with
/// it returns `None`, even once the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    session: Option<DragSession>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, session: DragSession) -> SessionHandle {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.session = Some(session);
            return SessionHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            session: Some(session),
        });
        SessionHandle { index, generation: 0 }
    }

    pub(crate) fn get(&self, handle: SessionHandle) -> Option<&DragSession> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.session.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut DragSession> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.session.as_mut())
    }

    pub(crate) fn remove(&mut self, handle: SessionHandle) -> Option<DragSession> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let session = slot.session.take()?;
        self.free.push(handle.index);
        self.len -= 1;
        Some(session)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (SessionHandle, &DragSession)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.session.as_ref().map(|session| {
                (
                    SessionHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    session,
                )
            })
        })
    }

    pub(crate) fn handles(&self) -> Vec<SessionHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}
