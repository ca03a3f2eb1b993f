//! Exchange resolution for six-digit A-share codes.

/// Mainland exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl Exchange {
    /// Exchange a six-digit code is listed on. `None` for anything that is
    /// not exactly six ASCII digits.
    pub fn of(symbol: &str) -> Option<Exchange> {
        if symbol.len() != 6 || !symbol.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if symbol.starts_with("92") {
            return Some(Exchange::Beijing);
        }
        match symbol.as_bytes()[0] {
            b'5' | b'6' | b'9' => Some(Exchange::Shanghai),
            b'0' | b'1' | b'2' | b'3' => Some(Exchange::Shenzhen),
            b'4' | b'8' => Some(Exchange::Beijing),
            _ => None,
        }
    }

    /// Lowercase market code (`sh`, `sz`, `bj`).
    pub fn code(self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
            Exchange::Beijing => "bj",
        }
    }

    /// Suffix used in `SECUCODE` filters (`600000.SH`).
    pub fn suffix(self) -> &'static str {
        match self {
            Exchange::Shanghai => "SH",
            Exchange::Shenzhen => "SZ",
            Exchange::Beijing => "BJ",
        }
    }

    /// Market id in quote-server `secid` values (`1.600000`).
    pub fn secid_market(self) -> u8 {
        match self {
            Exchange::Shanghai => 1,
            Exchange::Shenzhen | Exchange::Beijing => 0,
        }
    }
}
