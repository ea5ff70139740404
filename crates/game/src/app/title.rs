use engine::{
    HudFrame, InputSnapshot, MenuPanel, Scene, SceneCommand, SceneKey, SceneWorld,
};
use tracing::info;

const MENU_ENTRIES: [&str; 2] = ["Enter World", "Quit"];

pub(crate) struct TitleScene {
    selected: usize,
}

impl TitleScene {
    pub(crate) fn new() -> Self {
        Self { selected: 0 }
    }
}

impl Scene for TitleScene {
    fn load(&mut self, _world: &mut SceneWorld) {
        self.selected = 0;
        info!(scene = "title", "scene_loaded");
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        _world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.move_up_pressed() && self.selected > 0 {
            self.selected -= 1;
        }
        if input.move_down_pressed() && self.selected + 1 < MENU_ENTRIES.len() {
            self.selected += 1;
        }

        if input.cancel_pressed() {
            return SceneCommand::Quit;
        }
        if input.confirm_pressed() {
            return match self.selected {
                0 => SceneCommand::SwitchTo(SceneKey::Overworld),
                _ => SceneCommand::Quit,
            };
        }
        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        info!(scene = "title", "scene_unload");
    }

    fn hud(&self, _world: &SceneWorld) -> Option<HudFrame> {
        Some(HudFrame {
            lines: Vec::new(),
            log: vec![
                "Arrows/WASD move, Space attacks, E opens chests".to_string(),
                "I opens the inventory, 1-3 swap weapons".to_string(),
            ],
            menu: Some(MenuPanel {
                title: "HOLLOWMERE".to_string(),
                entries: MENU_ENTRIES.iter().map(|entry| entry.to_string()).collect(),
                selected: self.selected,
            }),
        })
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some("Hollowmere".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_moves_and_clamps() {
        let mut scene = TitleScene::new();
        let mut world = SceneWorld::default();

        let down = InputSnapshot::empty().with_move_down_pressed(true);
        scene.update(1.0 / 60.0, &down, &mut world);
        assert_eq!(scene.selected, 1);
        scene.update(1.0 / 60.0, &down, &mut world);
        assert_eq!(scene.selected, 1);

        let up = InputSnapshot::empty().with_move_up_pressed(true);
        scene.update(1.0 / 60.0, &up, &mut world);
        assert_eq!(scene.selected, 0);
        scene.update(1.0 / 60.0, &up, &mut world);
        assert_eq!(scene.selected, 0);
    }

    #[test]
    fn confirm_on_first_entry_enters_the_world() {
        let mut scene = TitleScene::new();
        let mut world = SceneWorld::default();
        let confirm = InputSnapshot::empty().with_confirm_pressed(true);
        assert_eq!(
            scene.update(1.0 / 60.0, &confirm, &mut world),
            SceneCommand::SwitchTo(SceneKey::Overworld)
        );
    }

    #[test]
    fn confirm_on_quit_entry_quits() {
        let mut scene = TitleScene::new();
        let mut world = SceneWorld::default();
        let down = InputSnapshot::empty().with_move_down_pressed(true);
        scene.update(1.0 / 60.0, &down, &mut world);

        let confirm = InputSnapshot::empty().with_confirm_pressed(true);
        assert_eq!(
            scene.update(1.0 / 60.0, &confirm, &mut world),
            SceneCommand::Quit
        );
    }
}
