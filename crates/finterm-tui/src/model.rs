//! Foreground render state. Only the foreground loop mutates this.

use std::collections::VecDeque;

use crate::feeds::{IndexEntry, StockQuote};

pub const LOG_RING_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Main,
    Summary,
    Budget,
    SearchStocks,
    SearchCrypto,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Screen::Main => "Finterm",
            Screen::Summary => "Major Stock Indices",
            Screen::Budget => "Budget Calculator",
            Screen::SearchStocks => "Search Stocks",
            Screen::SearchCrypto => "Search Cryptocurrencies",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Screen::Main => "Set a budget and search prices of stocks and cryptocurrencies",
            Screen::Summary => "Summary of the Dow Jones, S&P 500, and NASDAQ stock indices",
            Screen::Budget => {
                "Enter budget total, categories, and percentages.\n\
                 The calculated values of the total budget will then be displayed."
            }
            Screen::SearchStocks => {
                "Search for stocks using the ticker symbol\n\nExample: search $AAPL"
            }
            Screen::SearchCrypto => {
                "Search for cryptocurrencies using their name\n\nExample: search bitcoin"
            }
        }
    }

    pub fn commands_text(self) -> &'static str {
        match self {
            Screen::Main => {
                "COMMANDS\n\
                 summary          Get a summary of the three major stock indices\n\
                 budget           Enter a budget\n\
                 search-stocks    Search for stocks\n\
                 search-crypto    Search for cryptocurrencies\n\
                 quit             Quit the application"
            }
            Screen::Summary | Screen::Budget => {
                "COMMANDS\n\
                 main    Go to main screen\n\
                 quit    Quit the application"
            }
            Screen::SearchStocks => {
                "COMMANDS\n\
                 search $TICKER    Search for company\n\
                 show-more         Show additional price details\n\
                 main              Go to main screen\n\
                 quit              Quit the application"
            }
            Screen::SearchCrypto => {
                "COMMANDS\n\
                 search COIN    Search for cryptocurrency\n\
                 main           Go to main screen\n\
                 quit           Quit the application"
            }
        }
    }
}

/// Where the budget screen's prompt walk currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetPrompt {
    Total,
    Category,
    Percentage { category: String },
}

impl BudgetPrompt {
    pub fn label(&self) -> String {
        match self {
            BudgetPrompt::Total => "Enter Total Budget: ".to_string(),
            BudgetPrompt::Category => "Category Name: ".to_string(),
            BudgetPrompt::Percentage { category } => format!("Percentage for {category}: "),
        }
    }
}

pub struct AppModel {
    pub screen: Screen,
    pub input: String,
    pub status: String,
    pub logs: VecDeque<String>,
    pub quit_pending: bool,

    // Held results, re-rendered until replaced.
    pub stock: Option<StockQuote>,
    pub show_more: bool,
    pub summary: Vec<IndexEntry>,
    pub crypto: Vec<(String, String)>,
    pub budget_prompt: BudgetPrompt,
    pub category_rows: Vec<(String, u8)>,
    pub budget_result: Vec<(String, String)>,

    pub dirty: bool,
    pub last_render_signature: String,
}

impl AppModel {
    pub fn new() -> Self {
        Self {
            screen: Screen::Main,
            input: String::new(),
            status: String::new(),
            logs: VecDeque::new(),
            quit_pending: false,
            stock: None,
            show_more: false,
            summary: Vec::new(),
            crypto: Vec::new(),
            budget_prompt: BudgetPrompt::Total,
            category_rows: Vec::new(),
            budget_result: Vec::new(),
            dirty: true,
            last_render_signature: String::new(),
        }
    }

    pub fn push_log(&mut self, message: String) {
        if self.logs.len() >= LOG_RING_LIMIT {
            self.logs.pop_front();
        }
        self.logs.push_back(message);
        self.dirty = true;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.dirty = true;
    }

    pub fn take_input(&mut self) -> String {
        self.dirty = true;
        std::mem::take(&mut self.input).trim().to_string()
    }

    /// The input label shown next to the prompt.
    pub fn input_label(&self) -> String {
        if self.quit_pending {
            return "(y/n) ".to_string();
        }
        if self.screen == Screen::Budget {
            return self.budget_prompt.label();
        }
        "> ".to_string()
    }
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_ring_is_capped() {
        let mut model = AppModel::new();
        for index in 0..(LOG_RING_LIMIT + 8) {
            model.push_log(format!("line {index}"));
        }
        assert_eq!(model.logs.len(), LOG_RING_LIMIT);
        assert_eq!(model.logs.front().unwrap(), "line 8");
    }

    #[test]
    fn input_label_follows_budget_prompt() {
        let mut model = AppModel::new();
        assert_eq!(model.input_label(), "> ");
        model.screen = Screen::Budget;
        assert_eq!(model.input_label(), "Enter Total Budget: ");
        model.budget_prompt = BudgetPrompt::Percentage {
            category: "rent".to_string(),
        };
        assert_eq!(model.input_label(), "Percentage for rent: ");
        model.quit_pending = true;
        assert_eq!(model.input_label(), "(y/n) ");
    }
}
