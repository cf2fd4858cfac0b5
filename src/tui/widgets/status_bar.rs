use ratatui::widgets::Paragraph;
use ratatui::style::{Style, Modifier};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use ratatui::layout::Rect;
use crate::todo_list::Footer;
use crate::tui::widgets::color::{Palette, get_contrast_text_color};

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

/// Join as many hints as fit in `max_width`, ending with "..." when some are dropped
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut hints_text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let current_len = hints_text.chars().count();
        let would_be_len = if i == 0 {
            hint.chars().count()
        } else {
            current_len + SEPARATOR.chars().count() + hint.chars().count()
        };

        if would_be_len > max_width {
            if i == 0 {
                hints_text = hint.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
            } else if current_len + ELLIPSIS.len() > max_width {
                hints_text = hints_text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
            }
            hints_text.push_str(ELLIPSIS);
            break;
        }

        if i > 0 {
            hints_text.push_str(SEPARATOR);
        }
        hints_text.push_str(hint);
    }
    hints_text
}

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&String>,
    key_hints: &[String],
    palette: &Palette,
) {
    let max_width = area.width as usize;

    let (content, style) = if let Some(msg) = message {
        // Status messages get a highlighted background for visibility
        let msg_fg = get_contrast_text_color(palette.highlight_bg);
        let mut content = msg.clone();
        if content.chars().count() > max_width {
            content = content.chars().take(max_width.saturating_sub(3)).collect::<String>() + ELLIPSIS;
        }
        (content, Style::default().fg(msg_fg).bg(palette.highlight_bg).add_modifier(Modifier::BOLD))
    } else {
        (fit_hints(key_hints, max_width), Style::default().fg(palette.fg).bg(palette.bg))
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

/// Items-left summary plus the clear-completed affordance when anything is done
pub fn render_footer(f: &mut Frame, area: Rect, footer: &Footer, clear_key: &str, palette: &Palette) {
    let base = Style::default().fg(palette.fg).bg(palette.bg);
    if !footer.visible {
        f.render_widget(Paragraph::new("").style(base), area);
        return;
    }

    let mut spans = vec![Span::styled(footer.label.clone(), base.add_modifier(Modifier::BOLD))];
    if footer.show_clear_completed {
        spans.push(Span::styled(
            format!("   [{}] Clear completed", clear_key),
            Style::default().fg(palette.completed_fg).bg(palette.bg),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).style(base), area);
}
