//! Render pass: pure functions from the model to ratatui widgets. All the
//! interesting state lives in `AppModel`; nothing here mutates anything.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table};
use ratatui::Frame;

use crate::model::{AppModel, Screen};

/// Cheap digest of everything that affects the frame; the loop skips the
/// draw when it has not changed.
pub fn frame_signature(model: &AppModel) -> String {
    let last_log = model.logs.back().cloned().unwrap_or_default();
    let held_stock = model
        .stock
        .as_ref()
        .map(|quote| quote.ticker.as_str())
        .unwrap_or("");
    format!(
        "{:?}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        model.screen,
        model.input,
        model.status,
        model.quit_pending,
        model.show_more,
        held_stock,
        model.summary.len(),
        model.crypto.len(),
        model.category_rows.len(),
        model.budget_result.len(),
        last_log
    )
}

pub fn draw(frame: &mut Frame<'_>, model: &AppModel, color: bool) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(8),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(frame.area());

    frame.render_widget(Paragraph::new(model.screen.title()).block(bordered("")), rows[0]);
    frame.render_widget(
        Paragraph::new(model.screen.description()).block(bordered("")),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(model.screen.commands_text()).block(bordered("Commands")),
        rows[2],
    );
    frame.render_widget(
        Paragraph::new(format!("{}{}", model.input_label(), model.input)).block(bordered("Input")),
        rows[3],
    );
    frame.render_widget(
        Paragraph::new(model.status.clone())
            .style(status_style(color, &model.status))
            .block(bordered("Status")),
        rows[4],
    );

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(rows[5]);
    draw_results(frame, model, color, cols[0]);
    draw_logs(frame, model, cols[1]);
}

fn draw_results(frame: &mut Frame<'_>, model: &AppModel, color: bool, area: Rect) {
    match model.screen {
        Screen::Main => {
            frame.render_widget(bordered("Results"), area);
        }
        Screen::Summary => {
            let headers = ["Name", "Ticker", "Date", "Open", "High", "Low", "Close", "Volume"];
            let rows: Vec<Row> = model
                .summary
                .iter()
                .map(|entry| {
                    Row::new(vec![
                        entry.name.clone(),
                        entry.ticker.clone(),
                        entry.date.clone(),
                        format!("{:.2}", entry.open),
                        format!("{:.2}", entry.high),
                        format!("{:.2}", entry.low),
                        format!("{:.2}", entry.close),
                        entry.volume.to_string(),
                    ])
                })
                .collect();
            render_table(frame, area, "Market Summary", &headers, rows, color);
        }
        Screen::SearchStocks => {
            let (headers, rows): (&[&str], Vec<Row>) = match model.stock.as_ref() {
                Some(quote) if model.show_more => (
                    &["Ticker", "Date", "Open", "High", "Low", "Close"],
                    vec![Row::new(vec![
                        quote.ticker.clone(),
                        quote.date.clone(),
                        format!("{:.2}", quote.open),
                        format!("{:.2}", quote.high),
                        format!("{:.2}", quote.low),
                        format!("{:.2}", quote.close),
                    ])],
                ),
                Some(quote) => (
                    &["Ticker", "Date", "Close"],
                    vec![Row::new(vec![
                        quote.ticker.clone(),
                        quote.date.clone(),
                        format!("{:.2}", quote.close),
                    ])],
                ),
                None => (&["Ticker", "Date", "Close"], Vec::new()),
            };
            render_table(frame, area, "Quote", headers, rows, color);
        }
        Screen::SearchCrypto => {
            let rows: Vec<Row> = model
                .crypto
                .iter()
                .map(|(coin, price)| Row::new(vec![coin.clone(), price.clone()]))
                .collect();
            render_table(frame, area, "Prices", &["Coin", "Price"], rows, color);
        }
        Screen::Budget => {
            let halves = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            let category_rows: Vec<Row> = model
                .category_rows
                .iter()
                .map(|(name, pct)| Row::new(vec![name.clone(), format!("{pct}%")]))
                .collect();
            render_table(
                frame,
                halves[0],
                "Categories",
                &["Category", "Percentage"],
                category_rows,
                color,
            );
            let result_rows: Vec<Row> = model
                .budget_result
                .iter()
                .map(|(name, amount)| Row::new(vec![name.clone(), amount.clone()]))
                .collect();
            render_table(
                frame,
                halves[1],
                "Computed Budget",
                &["Category", "Amount"],
                result_rows,
                color,
            );
        }
    }
}

fn draw_logs(frame: &mut Frame<'_>, model: &AppModel, area: Rect) {
    let height = (area.height.saturating_sub(2) as usize).max(1);
    let skip = model.logs.len().saturating_sub(height);
    let items: Vec<ListItem> = model
        .logs
        .iter()
        .skip(skip)
        .map(|line| ListItem::new(line.clone()))
        .collect();
    frame.render_widget(List::new(items).block(bordered("Log")), area);
}

fn render_table(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &'static str,
    headers: &[&str],
    rows: Vec<Row>,
    color: bool,
) {
    let widths = vec![Constraint::Ratio(1, headers.len().max(1) as u32); headers.len()];
    let header_style = if color {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let header = Row::new(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>())
        .style(header_style);
    let table = Table::new(rows, widths).header(header).block(bordered(title));
    frame.render_widget(table, area);
}

fn status_style(color: bool, status: &str) -> Style {
    if !color {
        return Style::default();
    }
    if status.starts_with("Failed") || status.starts_with("Invalid") {
        Style::default().fg(Color::Red)
    } else if status.starts_with("Success") || status.starts_with("Budget") {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn bordered(title: &'static str) -> Block<'static> {
    let block = Block::default().borders(Borders::ALL);
    if title.is_empty() {
        block
    } else {
        block.title(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppModel;

    #[test]
    fn signature_changes_with_visible_state() {
        let mut model = AppModel::new();
        let initial = frame_signature(&model);

        model.input.push('s');
        let typed = frame_signature(&model);
        assert_ne!(initial, typed);

        model.set_status("Waiting for data...");
        assert_ne!(typed, frame_signature(&model));
    }

    #[test]
    fn signature_is_stable_for_identical_state() {
        let model = AppModel::new();
        assert_eq!(frame_signature(&model), frame_signature(&model));
    }
}
