use bevy::prelude::*;

use crate::game::{
    ClockTicked, CoreSet, HudUpdated, ResetRequested, SessionOverEvent, SessionResetEvent,
    SessionStarted, StartRequested,
};
use crate::session::{HudSnapshot, Session, SessionSummary};

const PANEL_COLOR: Color = Color::srgba(0.0, 0.0, 0.0, 0.6);
const BUTTON_COLOR: Color = Color::srgb(0.2, 0.2, 0.25);
const BUTTON_HOVER_COLOR: Color = Color::srgb(0.3, 0.3, 0.38);
const BUTTON_PRESSED_COLOR: Color = Color::srgb(0.45, 0.2, 0.2);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudLabel {
    Remaining,
    Time,
    Score,
    Ammo,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Restart,
    BackToStart,
}

#[derive(Component)]
pub struct StartPanel;

#[derive(Component)]
pub struct ResultPanel;

#[derive(Component)]
pub struct ResultText;

pub fn label_text(label: HudLabel, hud: &HudSnapshot) -> String {
    match label {
        HudLabel::Remaining => format!("Targets: {}", hud.remaining_targets),
        HudLabel::Time => format!("Time: {:.2}", hud.elapsed_secs),
        HudLabel::Score => format!("Score: {}", hud.score),
        HudLabel::Ammo => format!("Shots: {}", hud.ammo),
    }
}

pub fn format_summary(summary: &SessionSummary) -> String {
    format!(
        "Time: {:.2}s\nScore: {}\nTargets never launched: {}",
        summary.elapsed_secs, summary.score, summary.unspawned_targets
    )
}

fn spawn_button(parent: &mut ChildBuilder, label: &str, action: MenuAction) {
    parent
        .spawn((
            Button,
            action,
            Node {
                padding: UiRect::axes(Val::Px(24.0), Val::Px(10.0)),
                margin: UiRect::all(Val::Px(6.0)),
                justify_content: JustifyContent::Center,
                ..default()
            },
            BackgroundColor(BUTTON_COLOR),
            BorderRadius::all(Val::Px(6.0)),
        ))
        .with_children(|button| {
            button.spawn((Text::new(label), TextFont { font_size: 24.0, ..default() }));
        });
}

pub fn setup_hud(mut commands: Commands, session: Res<Session>) {
    let hud = session.hud();

    // Counters, top left
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(15.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(4.0),
            ..default()
        })
        .with_children(|column| {
            for label in [HudLabel::Remaining, HudLabel::Time, HudLabel::Score, HudLabel::Ammo] {
                column.spawn((
                    Text::new(label_text(label, &hud)),
                    TextFont { font_size: 22.0, ..default() },
                    TextColor(Color::WHITE),
                    label,
                ));
            }
        });

    let centered = || Node {
        position_type: PositionType::Absolute,
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        flex_direction: FlexDirection::Column,
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    };

    commands.spawn((centered(), StartPanel)).with_children(|panel| {
        panel.spawn((Text::new("Clay Shooter"), TextFont { font_size: 48.0, ..default() }));
        spawn_button(panel, "Start", MenuAction::Start);
    });

    commands
        .spawn((
            Node { display: Display::None, ..centered() },
            ResultPanel,
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(Val::Px(24.0)),
                        ..default()
                    },
                    BackgroundColor(PANEL_COLOR),
                    BorderRadius::all(Val::Px(10.0)),
                ))
                .with_children(|card| {
                    card.spawn((Text::new("Round over"), TextFont { font_size: 40.0, ..default() }));
                    card.spawn((
                        Text::new(""),
                        TextFont { font_size: 24.0, ..default() },
                        TextLayout::new_with_justify(JustifyText::Center),
                        ResultText,
                    ));
                    card.spawn(Node { flex_direction: FlexDirection::Row, ..default() })
                        .with_children(|row| {
                            spawn_button(row, "Try again", MenuAction::Restart);
                            spawn_button(row, "Back to start", MenuAction::BackToStart);
                        });
                });
        });
}

pub fn menu_buttons(
    mut buttons: Query<(&Interaction, &MenuAction, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
    mut starts: EventWriter<StartRequested>,
    mut resets: EventWriter<ResetRequested>,
) {
    for (interaction, action, mut background) in &mut buttons {
        background.0 = match interaction {
            Interaction::Pressed => BUTTON_PRESSED_COLOR,
            Interaction::Hovered => BUTTON_HOVER_COLOR,
            Interaction::None => BUTTON_COLOR,
        };
        if *interaction != Interaction::Pressed {
            continue;
        }
        debug!("Menu button {action:?} pressed");
        match action {
            MenuAction::Start | MenuAction::Restart => {
                starts.send(StartRequested);
            }
            MenuAction::BackToStart => {
                resets.send(ResetRequested);
            }
        }
    }
}

pub fn refresh_hud(
    mut updates: EventReader<HudUpdated>,
    mut ticks: EventReader<ClockTicked>,
    mut labels: Query<(&HudLabel, &mut Text)>,
) {
    // Only the newest snapshot matters.
    if let Some(HudUpdated(hud)) = updates.read().last() {
        for (label, mut text) in &mut labels {
            text.0 = label_text(*label, hud);
        }
    }
    if let Some(tick) = ticks.read().last() {
        for (label, mut text) in &mut labels {
            if *label == HudLabel::Time {
                text.0 = format!("Time: {:.2}", tick.elapsed_secs);
            }
        }
    }
}

pub fn toggle_panels(
    mut started: EventReader<SessionStarted>,
    mut over: EventReader<SessionOverEvent>,
    mut reset: EventReader<SessionResetEvent>,
    mut start_panel: Query<&mut Node, (With<StartPanel>, Without<ResultPanel>)>,
    mut result_panel: Query<&mut Node, (With<ResultPanel>, Without<StartPanel>)>,
    mut result_text: Query<&mut Text, With<ResultText>>,
) {
    let mut show = |start: Display, results: Display| {
        for mut node in &mut start_panel {
            node.display = start;
        }
        for mut node in &mut result_panel {
            node.display = results;
        }
    };

    // A start and an over in the same frame means the round ended on the spot.
    if started.read().count() > 0 {
        show(Display::None, Display::None);
    }
    if let Some(SessionOverEvent(summary)) = over.read().last() {
        for mut text in &mut result_text {
            text.0 = format_summary(summary);
        }
        show(Display::None, Display::Flex);
    }
    if reset.read().count() > 0 {
        show(Display::Flex, Display::None);
    }
}

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, menu_buttons.before(CoreSet))
            .add_systems(Update, (refresh_hud, toggle_panels).after(CoreSet));
    }
}
