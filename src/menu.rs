use crate::text;

/// Rows a bordered menu spends on chrome: two borders, title, rule, help line.
pub const MENU_CHROME_ROWS: u16 = 5;

/// Columns kept clear on each side of centered text.
pub const MIN_MARGIN: u16 = 1;

/// Minimal scroll adjustment that keeps `selected` inside a window of `height` rows.
///
/// The offset only moves when the selection leaves the window, so stepping
/// through a long list scrolls one row at a time instead of recentering.
pub fn adjust_scroll(selected: usize, height: usize, offset: usize) -> usize {
    let height = height.max(1);
    if selected >= offset + height {
        selected + 1 - height
    } else if selected < offset {
        selected
    } else {
        offset
    }
}

/// Left column for `text_width` columns of text centered in `width`.
pub fn centered_x(text_width: usize, width: u16, margin: u16) -> u16 {
    let width = usize::from(width);
    let x = width.saturating_sub(text_width) / 2;
    (x as u16).max(margin)
}

/// Text fitted for a centered line in a `width`-column bordered frame.
pub fn centered_line(text: &str, width: u16) -> (u16, String) {
    let budget = usize::from(width.saturating_sub(MIN_MARGIN * 2)).max(1);
    let fitted = text::truncate(text, budget);
    (centered_x(text::display_width(&fitted), width, MIN_MARGIN), fitted)
}

/// Single-select list with a persistent viewport offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    pub items: Vec<String>,
    pub selected: usize,
    pub offset: usize,
}

impl MenuState {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            selected: 0,
            offset: 0,
        }
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(self.items.len() - 1);
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// Rows of the menu that fit in a terminal of `rows` lines.
    pub fn viewport_height(rows: u16) -> usize {
        usize::from(rows.saturating_sub(MENU_CHROME_ROWS)).max(1)
    }

    pub fn scroll_into_view(&mut self, height: usize) {
        self.offset = adjust_scroll(self.selected, height, self.offset);
    }

    pub fn view<'a>(&'a self, title: &'a str, help: &'a str) -> MenuView<'a> {
        MenuView {
            title,
            help,
            items: &self.items,
            selected: self.selected,
            offset: self.offset,
        }
    }
}

/// Everything the renderer needs for one menu frame.
#[derive(Debug, Clone, Copy)]
pub struct MenuView<'a> {
    pub title: &'a str,
    pub help: &'a str,
    pub items: &'a [String],
    pub selected: usize,
    pub offset: usize,
}
