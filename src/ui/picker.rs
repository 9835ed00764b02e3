/// Highlight position in a full-screen picker list.
///
/// The list itself lives wherever the picker's data lives; callers pass its
/// length so an empty list behaves like a single virtual slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickerState {
    pub selected: usize,
}

impl PickerState {
    pub fn new(selected: usize) -> Self {
        Self { selected }
    }

    pub fn move_up(&mut self, len: usize) {
        let len = len.max(1);
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn move_down(&mut self, len: usize) {
        let len = len.max(1);
        self.selected = (self.selected + 1) % len;
    }

    pub fn reset(&mut self) {
        self.selected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_in_both_directions() {
        let mut picker = PickerState::default();
        picker.move_up(3);
        assert_eq!(picker.selected, 2);
        picker.move_down(3);
        assert_eq!(picker.selected, 0);
        picker.move_down(3);
        picker.move_down(3);
        picker.move_down(3);
        assert_eq!(picker.selected, 0);
    }

    #[test]
    fn empty_list_stays_on_the_virtual_slot() {
        let mut picker = PickerState::default();
        picker.move_down(0);
        assert_eq!(picker.selected, 0);
        picker.move_up(0);
        assert_eq!(picker.selected, 0);
    }
}
