use std::time::Duration;

use excavation_core::{Command, Event, ItemId, LevelConfig};
use excavation_system_hud::{Hud, UiNotifier};
use excavation_world::{self as world, Level, RewardRng};
use glam::Vec3;

#[derive(Debug, Default)]
struct RecordingNotifier {
    calls: Vec<String>,
}

impl UiNotifier for RecordingNotifier {
    fn on_restart(&mut self) {
        self.calls.push("restart".to_owned());
    }

    fn on_win(&mut self) {
        self.calls.push("win".to_owned());
    }

    fn on_lose(&mut self) {
        self.calls.push("lose".to_owned());
    }

    fn on_inventory_changed(&mut self, count: i32) {
        self.calls.push(format!("inventory {count}"));
    }

    fn on_tool_count_changed(&mut self, count: i32) {
        self.calls.push(format!("tools {count}"));
    }
}

#[test]
fn restart_refreshes_every_counter() {
    let mut level = Level::new(LevelConfig::default(), RewardRng::from_seed(5));
    let mut events = Vec::new();
    world::apply(
        &mut level,
        Command::Restart {
            uptime: Duration::from_secs(2),
        },
        &mut events,
    );

    let mut notifier = RecordingNotifier::default();
    Hud::new().handle(&events, &mut notifier);

    assert_eq!(notifier.calls, vec!["restart", "inventory 0", "tools 10"]);
}

#[test]
fn running_out_of_tools_reports_defeat_after_the_counter() {
    let config = LevelConfig {
        tool_count: 1,
        reward_probability: 0.0,
        ..LevelConfig::default()
    };
    let mut level = Level::new(config, RewardRng::from_seed(6));
    let mut events = Vec::new();
    world::apply(
        &mut level,
        Command::Restart {
            uptime: Duration::ZERO,
        },
        &mut events,
    );
    events.clear();
    world::apply(
        &mut level,
        Command::Dig {
            at: Vec3::new(0.5, 0.5, 0.0),
        },
        &mut events,
    );

    let mut notifier = RecordingNotifier::default();
    Hud::new().handle(&events, &mut notifier);

    assert_eq!(notifier.calls, vec!["tools 0", "lose"]);
}

#[test]
fn unrelated_events_are_not_forwarded() {
    let mut notifier = RecordingNotifier::default();
    Hud::new().handle(
        &[
            Event::LevelWon,
            Event::ItemMoved {
                item: ItemId::new(1),
                position: Vec3::ZERO,
            },
            Event::LevelLoaded,
        ],
        &mut notifier,
    );

    assert_eq!(notifier.calls, vec!["win", "restart"]);
}
