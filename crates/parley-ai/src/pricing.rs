//! Request cost estimates from provider token usage

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ProviderKind, Usage};

/// Billing currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    Rub,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Rub => "₽",
        }
    }
}

/// Price of a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub amount: f64,
    pub currency: Currency,
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.currency {
            Currency::Usd => write!(f, "${:.6}", self.amount),
            Currency::Rub => write!(f, "{:.4} ₽", self.amount),
        }
    }
}

/// Per-token rates for one model family
#[derive(Debug, Clone, Copy, PartialEq)]
enum Rate {
    /// USD per million input / output tokens
    PerMillion { input: f64, output: f64 },
    /// Flat RUB per thousand tokens, input and output alike
    PerThousand(f64),
}

fn rate(kind: ProviderKind, model: &str) -> Option<Rate> {
    let model = model.to_lowercase();
    match kind {
        ProviderKind::Claude => {
            if model.contains("haiku") {
                Some(Rate::PerMillion { input: 1.00, output: 5.00 })
            } else if model.contains("sonnet") {
                Some(Rate::PerMillion { input: 3.00, output: 15.00 })
            } else {
                None
            }
        }
        ProviderKind::DeepSeek => match model.as_str() {
            "deepseek-chat" => Some(Rate::PerMillion { input: 0.27, output: 1.10 }),
            "deepseek-reasoner" => Some(Rate::PerMillion { input: 0.55, output: 2.19 }),
            _ => None,
        },
        ProviderKind::YandexGpt => {
            if model.contains("yandexgpt-lite") {
                Some(Rate::PerThousand(0.20))
            } else {
                Some(Rate::PerThousand(0.40))
            }
        }
    }
}

fn currency(kind: ProviderKind) -> Currency {
    match kind {
        ProviderKind::YandexGpt => Currency::Rub,
        ProviderKind::Claude | ProviderKind::DeepSeek => Currency::Usd,
    }
}

/// Estimate what `usage` cost on `model`. Unknown models cost nothing.
pub fn cost(kind: ProviderKind, model: &str, usage: Usage) -> Cost {
    let amount = match rate(kind, model) {
        Some(Rate::PerMillion { input, output }) => {
            (usage.input as f64 / 1_000_000.0) * input + (usage.output as f64 / 1_000_000.0) * output
        }
        Some(Rate::PerThousand(price)) => (usage.total() as f64 / 1_000.0) * price,
        None => {
            tracing::debug!("No pricing for {} model {}", kind, model);
            0.0
        }
    };

    Cost {
        amount,
        currency: currency(kind),
    }
}
