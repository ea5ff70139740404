#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Attack,
    Interact,
    ToggleInventory,
    Confirm,
    Cancel,
    WeaponSlot1,
    WeaponSlot2,
    WeaponSlot3,
}

const ACTION_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Attack => 4,
            InputAction::Interact => 5,
            InputAction::ToggleInventory => 6,
            InputAction::Confirm => 7,
            InputAction::Cancel => 8,
            InputAction::WeaponSlot1 => 9,
            InputAction::WeaponSlot2 => 10,
            InputAction::WeaponSlot3 => 11,
        }
    }
}
