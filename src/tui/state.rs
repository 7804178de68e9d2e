use anyhow::Result;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    Enabled,
    Disabled,
    Running,
    Stopped,
    Error,
}

impl ItemStatus {
    pub fn glyph(self) -> &'static str {
        match self {
            ItemStatus::Enabled => "✓",
            ItemStatus::Disabled => "✗",
            ItemStatus::Running => "●",
            ItemStatus::Stopped => "○",
            ItemStatus::Error => "!",
        }
    }

    pub fn color(self) -> Color {
        match self {
            ItemStatus::Enabled | ItemStatus::Running => Color::Green,
            ItemStatus::Disabled | ItemStatus::Stopped | ItemStatus::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuItem<V> {
    pub label: String,
    pub value: V,
    pub status: Option<ItemStatus>,
}

impl<V> MenuItem<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self {
            label: label.into(),
            value,
            status: None,
        }
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Input the selector understands, already decoded from raw terminal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKey {
    Up,
    Down,
    /// Enter
    Confirm,
    /// Space
    Activate,
    Quit,
    Interrupt,
    /// Terminal resized; nothing changes but the screen must be drawn again.
    Redraw,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    Rendering,
    AwaitingKey,
    Resolved,
}

pub struct SelectorState<V> {
    title: String,
    items: Vec<MenuItem<V>>,
    cursor: usize,
    phase: SelectorPhase,
    choice: Option<V>,
}

impl<V: Clone> SelectorState<V> {
    pub fn new(title: impl Into<String>, items: Vec<MenuItem<V>>) -> Self {
        Self {
            title: title.into(),
            items,
            cursor: 0,
            phase: SelectorPhase::Rendering,
            choice: None,
        }
    }

    /// Start at a cursor remembered from an earlier run, clamped to the current list.
    pub fn with_cursor(mut self, previous: usize) -> Self {
        self.cursor = previous.min(self.items.len().saturating_sub(1));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[MenuItem<V>] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    pub fn mark_rendered(&mut self) {
        if self.phase == SelectorPhase::Rendering {
            self.phase = SelectorPhase::AwaitingKey;
        }
    }

    pub fn apply(&mut self, key: SelectorKey) {
        if self.phase == SelectorPhase::Resolved {
            return;
        }
        match key {
            SelectorKey::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.phase = SelectorPhase::Rendering;
            }
            SelectorKey::Down => {
                let last = self.items.len().saturating_sub(1);
                self.cursor = (self.cursor + 1).min(last);
                self.phase = SelectorPhase::Rendering;
            }
            SelectorKey::Confirm | SelectorKey::Activate => {
                if let Some(item) = self.items.get(self.cursor) {
                    self.choice = Some(item.value.clone());
                    self.phase = SelectorPhase::Resolved;
                }
            }
            SelectorKey::Quit | SelectorKey::Interrupt => {
                self.choice = None;
                self.phase = SelectorPhase::Resolved;
            }
            SelectorKey::Redraw => self.phase = SelectorPhase::Rendering,
            SelectorKey::Other => {}
        }
    }
}

/// Run the selector until it resolves.
///
/// `next_key` blocks for one key; `render` draws the current state. Returns the chosen value,
/// or `None` when the user quit.
pub fn drive<V, K, R>(state: &mut SelectorState<V>, mut next_key: K, mut render: R) -> Result<Option<V>>
where
    V: Clone,
    K: FnMut() -> Result<SelectorKey>,
    R: FnMut(&SelectorState<V>) -> Result<()>,
{
    loop {
        match state.phase() {
            SelectorPhase::Rendering => {
                render(state)?;
                state.mark_rendered();
            }
            SelectorPhase::AwaitingKey => {
                let key = next_key()?;
                state.apply(key);
            }
            SelectorPhase::Resolved => return Ok(state.choice.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SelectorKey::*;

    fn three() -> SelectorState<&'static str> {
        SelectorState::new(
            "t",
            vec![
                MenuItem::new("first", "one"),
                MenuItem::new("second", "two"),
                MenuItem::new("third", "three"),
            ],
        )
    }

    fn run(state: &mut SelectorState<&'static str>, keys: &[SelectorKey]) -> (Result<Option<&'static str>>, usize) {
        let mut keys = keys.iter().copied();
        let mut renders = 0;
        let res = drive(
            state,
            || keys.next().ok_or_else(|| anyhow::anyhow!("out of keys")),
            |_| {
                renders += 1;
                Ok(())
            },
        );
        (res, renders)
    }

    #[test]
    fn down_down_confirm_picks_third() {
        let mut state = three();
        let (res, renders) = run(&mut state, &[Down, Down, Confirm]);
        assert_eq!(res.unwrap(), Some("three"));
        assert_eq!(renders, 3);
        assert_eq!(state.phase(), SelectorPhase::Resolved);
    }

    #[test]
    fn quit_yields_nothing_wherever_the_cursor_is() {
        for start in 0..3 {
            let mut state = three().with_cursor(start);
            let (res, _) = run(&mut state, &[Quit]);
            assert_eq!(res.unwrap(), None);
        }
        let mut state = three();
        let (res, _) = run(&mut state, &[Down, Interrupt]);
        assert_eq!(res.unwrap(), None);
    }

    #[test]
    fn activate_selects_like_confirm() {
        let mut state = three();
        let (res, _) = run(&mut state, &[Down, Activate]);
        assert_eq!(res.unwrap(), Some("two"));
    }

    #[test]
    fn cursor_is_clamped_at_both_ends() {
        let mut state = three();
        let (res, _) = run(&mut state, &[Up, Up, Confirm]);
        assert_eq!(res.unwrap(), Some("one"));

        let mut state = three();
        let (res, _) = run(&mut state, &[Down, Down, Down, Down, Confirm]);
        assert_eq!(res.unwrap(), Some("three"));
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn remembered_cursor_is_clamped_to_list_length() {
        assert_eq!(three().with_cursor(7).cursor(), 2);
        assert_eq!(three().with_cursor(1).cursor(), 1);
        let empty: SelectorState<&str> = SelectorState::new("t", vec![]).with_cursor(4);
        assert_eq!(empty.cursor(), 0);
    }

    #[test]
    fn unknown_keys_do_not_redraw_but_resize_does() {
        let mut state = three();
        let (res, renders) = run(&mut state, &[Other, Other, Redraw, Confirm]);
        assert_eq!(res.unwrap(), Some("one"));
        assert_eq!(renders, 2);
    }

    #[test]
    fn empty_list_ignores_selection_until_quit() {
        let mut state: SelectorState<&'static str> = SelectorState::new("t", vec![]);
        let (res, _) = run(&mut state, &[Confirm, Activate, Down, Quit]);
        assert_eq!(res.unwrap(), None);
    }

    #[test]
    fn key_source_errors_propagate() {
        let mut state = three();
        let (res, _) = run(&mut state, &[Down]);
        assert!(res.is_err());
    }

    #[test]
    fn status_glyphs() {
        assert_eq!(ItemStatus::Running.glyph(), "●");
        assert_eq!(ItemStatus::Error.glyph(), "!");
        assert_eq!(ItemStatus::Disabled.color(), Color::Red);
    }
}
