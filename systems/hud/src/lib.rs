#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that forwards level events to the host's user interface.

use excavation_core::Event;

/// Observer implemented by the host presentation layer.
///
/// Every callback is fire-and-forget.
pub trait UiNotifier {
    /// The level was regenerated or replaced by a saved game.
    fn on_restart(&mut self);

    /// The sack reached the gold bar goal.
    fn on_win(&mut self);

    /// The player ran out of tools with nothing left to collect.
    fn on_lose(&mut self);

    /// The sack content changed.
    fn on_inventory_changed(&mut self, count: i32);

    /// The remaining tool allowance changed.
    fn on_tool_count_changed(&mut self, count: i32);
}

/// HUD system dispatching level events to a [`UiNotifier`] in event order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hud;

impl Hud {
    /// Creates a new HUD system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Forwards the events the interface cares about.
    pub fn handle<N>(&mut self, events: &[Event], notifier: &mut N)
    where
        N: UiNotifier + ?Sized,
    {
        for event in events {
            match event {
                Event::LevelRestarted { .. } | Event::LevelLoaded => notifier.on_restart(),
                Event::LevelWon => notifier.on_win(),
                Event::LevelLost => notifier.on_lose(),
                Event::InventoryChanged { count } => notifier.on_inventory_changed(*count),
                Event::ToolCountChanged { remaining } => {
                    notifier.on_tool_count_changed(*remaining);
                }
                _ => {}
            }
        }
    }
}
