use bevy::{prelude::*, ui::FocusPolicy, window::PrimaryWindow};

use crate::config::{rgb, CursorConfig, GameConfig};

/// Lagging crosshair drawn in place of the OS pointer.
#[derive(Component, Debug)]
pub struct Crosshair {
    pub position: Vec2,
}

// Strokes and dot; recoloured on press.
#[derive(Component, Default)]
pub struct CrosshairPart;

/// One frame of exponential smoothing towards the pointer.
pub fn follow_step(current: Vec2, pointer: Vec2, factor: f32) -> Vec2 {
    current + (pointer - current) * factor
}

/// Size and colour for the current button state.
pub fn crosshair_style(cfg: &CursorConfig, pressed: bool) -> (f32, Color) {
    if pressed {
        (cfg.pressed_size, rgb(cfg.pressed_color))
    } else {
        (cfg.size, rgb(cfg.idle_color))
    }
}

pub fn hide_system_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.get_single_mut() {
        window.cursor_options.visible = false;
    }
}

pub fn setup_crosshair(mut commands: Commands, windows: Query<&Window, With<PrimaryWindow>>, config: Res<GameConfig>) {
    let start = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()) * 0.5)
        .unwrap_or_default();
    let (size, color) = crosshair_style(&config.cursor, false);

    commands
        .spawn((
            Crosshair { position: start },
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(start.x - size * 0.5),
                top: Val::Px(start.y - size * 0.5),
                width: Val::Px(size),
                height: Val::Px(size),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            FocusPolicy::Pass,
            GlobalZIndex(i32::MAX),
        ))
        .with_children(|parent| {
            // Horizontal and vertical strokes scale with the root; the dot doesn't.
            for (width, height) in [(Val::Percent(100.0), Val::Px(2.0)), (Val::Px(2.0), Val::Percent(100.0))] {
                parent.spawn((
                    Node { position_type: PositionType::Absolute, width, height, ..default() },
                    BackgroundColor(color),
                    FocusPolicy::Pass,
                    CrosshairPart,
                ));
            }
            parent.spawn((
                Node {
                    position_type: PositionType::Absolute,
                    width: Val::Px(4.0),
                    height: Val::Px(4.0),
                    ..default()
                },
                BackgroundColor(color),
                BorderRadius::MAX,
                FocusPolicy::Pass,
                CrosshairPart,
            ));
        });
}

pub fn follow_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    config: Res<GameConfig>,
    mut crosshair: Query<(&mut Crosshair, &mut Node)>,
) {
    let pointer = windows.get_single().ok().and_then(Window::cursor_position);
    let (size, _) = crosshair_style(&config.cursor, mouse_button_input.pressed(MouseButton::Left));

    for (mut cross, mut node) in &mut crosshair {
        if let Some(pointer) = pointer {
            cross.position = follow_step(cross.position, pointer, config.cursor.follow_factor);
        }
        node.left = Val::Px(cross.position.x - size * 0.5);
        node.top = Val::Px(cross.position.y - size * 0.5);
        node.width = Val::Px(size);
        node.height = Val::Px(size);
    }
}

pub fn recolor_on_press(
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    config: Res<GameConfig>,
    mut parts: Query<&mut BackgroundColor, With<CrosshairPart>>,
) {
    let pressed = mouse_button_input.just_pressed(MouseButton::Left);
    let released = mouse_button_input.just_released(MouseButton::Left);
    if !pressed && !released {
        return;
    }
    let (_, color) = crosshair_style(&config.cursor, mouse_button_input.pressed(MouseButton::Left));
    for mut background in &mut parts {
        background.0 = color;
    }
}

pub struct CursorPlugin;

impl Plugin for CursorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (hide_system_cursor, setup_crosshair))
            .add_systems(Update, (follow_pointer, recolor_on_press));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_moves_a_fifth_of_the_way() {
        let p = follow_step(Vec2::ZERO, Vec2::new(100.0, 50.0), 0.2);
        assert_eq!(p, Vec2::new(20.0, 10.0));
    }

    #[test]
    fn smoothing_converges_on_a_still_pointer() {
        let target = Vec2::new(640.0, 360.0);
        let mut p = Vec2::ZERO;
        for _ in 0..60 {
            p = follow_step(p, target, 0.2);
        }
        assert!(p.distance(target) < 0.01, "{p}");
    }

    #[test]
    fn press_grows_and_turns_red() {
        let cfg = CursorConfig::default();
        let (idle_size, idle_color) = crosshair_style(&cfg, false);
        let (size, color) = crosshair_style(&cfg, true);
        assert_eq!(idle_size, 12.0);
        assert_eq!(size, 36.0);
        assert_eq!(idle_color, Color::srgb(1.0, 1.0, 1.0));
        assert_eq!(color, Color::srgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn parts_recolor_on_press_and_release() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(GameConfig::default());
        app.init_resource::<ButtonInput<MouseButton>>();
        app.add_systems(Update, recolor_on_press);
        let part = app
            .world_mut()
            .spawn((BackgroundColor(Color::WHITE), CrosshairPart))
            .id();

        app.world_mut().resource_mut::<ButtonInput<MouseButton>>().press(MouseButton::Left);
        app.update();
        assert_eq!(app.world().get::<BackgroundColor>(part).unwrap().0, Color::srgb(1.0, 0.0, 0.0));

        {
            let mut input = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
            input.clear();
            input.release(MouseButton::Left);
        }
        app.update();
        assert_eq!(app.world().get::<BackgroundColor>(part).unwrap().0, Color::srgb(1.0, 1.0, 1.0));
    }
}
