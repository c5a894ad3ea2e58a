#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure interaction system that turns pointer input into dig and item commands.
//!
//! At most one item is held at a time. Pressing on an item picks it up,
//! moving the pointer drags it, and lifting the pointer drops it into the
//! sack, onto the column below, or back where it came from.

use excavation_core::{Command, Event, ItemId, PointerScheme, WorldProbe};
use glam::Vec3;

/// Stage of a pointer gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// The pointer was pressed or the screen touched.
    Down,
    /// The pointer moved while pressed.
    Move,
    /// The pointer was lifted.
    Up,
}

/// Pointer event with its position already resolved into world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Stage of the gesture.
    pub phase: PointerPhase,
    /// World-space position of the pointer.
    pub position: Vec3,
    /// Device family that produced the event.
    pub scheme: PointerScheme,
    /// Whether the pointer is over the sack widget.
    pub over_container: bool,
}

impl PointerEvent {
    /// Creates a pointer event that is not over the sack widget.
    #[must_use]
    pub const fn new(phase: PointerPhase, position: Vec3, scheme: PointerScheme) -> Self {
        Self {
            phase,
            position,
            scheme,
            over_container: false,
        }
    }

    /// Marks the event as hovering the sack widget.
    #[must_use]
    pub fn above_container(self) -> Self {
        Self {
            over_container: true,
            ..self
        }
    }
}

/// What the pointer currently controls.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
    /// Nothing is held.
    #[default]
    Idle,
    /// An item follows the pointer.
    Holding {
        /// Item under pointer control.
        item: ItemId,
        /// Position the item returns to when dropped somewhere invalid.
        original_position: Vec3,
        /// Device family that picked the item up.
        scheme: PointerScheme,
    },
}

/// Interaction system translating pointer events into level commands.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
    state: InteractionState,
}

impl Interaction {
    /// Creates an idle interaction system.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: InteractionState::Idle,
        }
    }

    /// Current state of the machine.
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Item currently under pointer control.
    #[must_use]
    pub const fn held_item(&self) -> Option<ItemId> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Holding { item, .. } => Some(item),
        }
    }

    /// Consumes level events and pointer input to emit level commands.
    ///
    /// Level events are processed first so that a restart or load drops any
    /// stale hold before the input of the frame is interpreted.
    pub fn handle<P>(
        &mut self,
        events: &[Event],
        input: &[PointerEvent],
        probe: &P,
        out: &mut Vec<Command>,
    ) where
        P: WorldProbe + ?Sized,
    {
        for event in events {
            match event {
                Event::LevelRestarted { .. } | Event::LevelLoaded => {
                    self.state = InteractionState::Idle;
                }
                Event::ItemDeposited { item, .. } if self.held_item() == Some(*item) => {
                    self.state = InteractionState::Idle;
                }
                _ => {}
            }
        }

        for pointer in input {
            match pointer.phase {
                PointerPhase::Down => self.pointer_down(pointer, probe, out),
                PointerPhase::Move => self.pointer_move(pointer, out),
                PointerPhase::Up => self.pointer_up(pointer, probe, out),
            }
        }
    }

    fn pointer_down<P>(&mut self, pointer: &PointerEvent, probe: &P, out: &mut Vec<Command>)
    where
        P: WorldProbe + ?Sized,
    {
        if probe.is_won() {
            return;
        }

        let hit = probe.item_at(pointer.position);
        match self.state {
            InteractionState::Holding {
                item,
                original_position,
                ..
            } => match hit {
                Some(other) if other != item => {
                    out.push(Command::ReleaseItem {
                        item,
                        at: original_position,
                    });
                    self.pick(other, pointer, probe, out);
                }
                _ => out.push(Command::DragItem {
                    item,
                    to: pointer.position,
                }),
            },
            InteractionState::Idle => match hit {
                Some(item) => self.pick(item, pointer, probe, out),
                None if probe.tool_count() > 0 => out.push(Command::Dig {
                    at: pointer.position,
                }),
                None => {}
            },
        }
    }

    fn pointer_move(&mut self, pointer: &PointerEvent, out: &mut Vec<Command>) {
        if let InteractionState::Holding { item, scheme, .. } = self.state {
            if scheme == pointer.scheme {
                out.push(Command::DragItem {
                    item,
                    to: pointer.position,
                });
            }
        }
    }

    fn pointer_up<P>(&mut self, pointer: &PointerEvent, probe: &P, out: &mut Vec<Command>)
    where
        P: WorldProbe + ?Sized,
    {
        let InteractionState::Holding {
            item,
            original_position,
            ..
        } = self.state
        else {
            return;
        };

        if pointer.over_container {
            out.push(Command::DepositItem { item });
        } else {
            let at = probe
                .floor_below(pointer.position)
                .unwrap_or(original_position);
            out.push(Command::ReleaseItem { item, at });
        }
        self.state = InteractionState::Idle;
    }

    fn pick<P>(&mut self, item: ItemId, pointer: &PointerEvent, probe: &P, out: &mut Vec<Command>)
    where
        P: WorldProbe + ?Sized,
    {
        let original_position = probe.item_position(item).unwrap_or(pointer.position);
        out.push(Command::GrabItem { item });
        self.state = InteractionState::Holding {
            item,
            original_position,
            scheme: pointer.scheme,
        };
    }
}
