use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};

pub struct Layout {
    pub inner_area: Rect,  // Area inside the outer border
    pub tabs_area: Rect,
    pub list_area: Rect,
    pub input_area: Rect,
    pub footer_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application (inside the outer border)
    /// Height: 1 tabs + 3 list + 3 input + 1 footer + 1 status
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 9;

    pub fn calculate(size: Rect) -> Self {
        // Never lay out smaller than the minimum (accounting for outer border)
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Filter tabs
                Constraint::Min(3),    // Todo list
                Constraint::Length(3), // Input line (borders + content)
                Constraint::Length(1), // Footer summary
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        Self {
            inner_area,
            tabs_area: vertical[0],
            list_area: vertical[1],
            input_area: vertical[2],
            footer_area: vertical[3],
            status_area: vertical[4],
        }
    }
}
