// 💱 Canonical transaction - the sent/received ledger unit
//
// Direction lives in which side is populated, never in the sign: every
// amount stored here is a non-negative magnitude.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exchange name appended to every description
pub const EXCHANGE_NAME: &str = "Mercado Bitcoin";

/// Fiat currency of the exchange
pub const FIAT: &str = "BRL";

// ============================================================================
// MONEY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Money {
            amount: amount.abs(),
            currency: currency.into(),
        }
    }

    /// Like `new`, but a zero amount means "nothing moved"
    pub fn nonzero(amount: f64, currency: impl Into<String>) -> Option<Self> {
        if amount == 0.0 {
            None
        } else {
            Some(Money::new(amount, currency))
        }
    }
}

// ============================================================================
// LABEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Label {
    #[default]
    None,
    Trade,
    Deposit,
    Withdrawal,
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::None => "",
            Label::Trade => "Trade",
            Label::Deposit => "Deposit",
            Label::Withdrawal => "Withdrawal",
        }
    }
}

// ============================================================================
// TRANSACTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub sent: Option<Money>,
    pub received: Option<Money>,
    pub fee: Option<Money>,
    pub label: Label,
    pub description: String,
    pub net_worth: Option<Money>,
}

impl Transaction {
    /// Build a transaction, `None` if neither side moved anything.
    ///
    /// Exchange timestamps carry no zone; they are taken as already UTC.
    pub fn try_new(
        timestamp: NaiveDateTime,
        sent: Option<Money>,
        received: Option<Money>,
    ) -> Option<Self> {
        if sent.is_none() && received.is_none() {
            return None;
        }
        Some(Transaction {
            timestamp: timestamp.and_utc(),
            sent,
            received,
            fee: None,
            label: Label::None,
            description: String::new(),
            net_worth: None,
        })
    }

    pub fn deposit(timestamp: NaiveDateTime, received: Money) -> Self {
        Transaction {
            timestamp: timestamp.and_utc(),
            sent: None,
            received: Some(received),
            fee: None,
            label: Label::None,
            description: String::new(),
            net_worth: None,
        }
    }

    pub fn withdrawal(timestamp: NaiveDateTime, sent: Money) -> Self {
        Transaction {
            timestamp: timestamp.and_utc(),
            sent: Some(sent),
            received: None,
            fee: None,
            label: Label::None,
            description: String::new(),
            net_worth: None,
        }
    }

    pub fn trade(timestamp: NaiveDateTime, sent: Money, received: Money) -> Self {
        Transaction {
            timestamp: timestamp.and_utc(),
            sent: Some(sent),
            received: Some(received),
            fee: None,
            label: Label::None,
            description: String::new(),
            net_worth: None,
        }
    }

    /// Builder pattern: set label
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Builder pattern: set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder pattern: optional fee
    pub fn with_fee(mut self, fee: Option<Money>) -> Self {
        self.fee = fee;
        self
    }

    /// Builder pattern: optional fiat valuation
    pub fn with_net_worth(mut self, net_worth: Option<Money>) -> Self {
        self.net_worth = net_worth;
        self
    }
}
