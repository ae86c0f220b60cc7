// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::fmt::{self, Display};

/// Market quote used as a realistic payload in hot-flow tests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quote {
    pub symbol: String,
    pub price: u64,
}

impl Quote {
    #[must_use]
    pub fn new(symbol: impl Into<String>, price: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

impl Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quote[{}@{}]", self.symbol, self.price)
    }
}

pub fn quote_acme() -> Quote {
    Quote::new("ACME", 100)
}

pub fn quote_acme_up() -> Quote {
    Quote::new("ACME", 105)
}

pub fn quote_globex() -> Quote {
    Quote::new("GLBX", 42)
}

pub fn quote_initech() -> Quote {
    Quote::new("INTC", 7)
}
