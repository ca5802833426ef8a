//! WebSocket close codes and the normal-termination policy.
//!
//! A close code is the numeric reason exchanged when a WebSocket session ends
//! (RFC 6455, section 7.4). The adapter only cares whether a code describes an
//! ordinary teardown or a fault; that decision is made here, against the fixed
//! [`NORMAL_CLOSE_CODES`] set.

use std::fmt;

/// Numeric WebSocket close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    pub const NORMAL_CLOSURE: Self = Self(1000);
    pub const GOING_AWAY: Self = Self(1001);
    pub const PROTOCOL_ERROR: Self = Self(1002);
    pub const UNSUPPORTED_DATA: Self = Self(1003);
    /// Reserved: the peer sent a close frame without a status code.
    pub const NO_STATUS_RECEIVED: Self = Self(1005);
    /// Reserved: the connection dropped without a close frame.
    pub const ABNORMAL_CLOSURE: Self = Self(1006);
    pub const INVALID_PAYLOAD: Self = Self(1007);
    pub const POLICY_VIOLATION: Self = Self(1008);
    pub const MESSAGE_TOO_BIG: Self = Self(1009);
    pub const MANDATORY_EXTENSION: Self = Self(1010);
    pub const INTERNAL_ERROR: Self = Self(1011);
    pub const SERVICE_RESTART: Self = Self(1012);
    pub const TRY_AGAIN_LATER: Self = Self(1013);
    pub const TLS_HANDSHAKE: Self = Self(1015);

    /// Returns the raw numeric code.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Check whether this code marks an ordinary, expected session end.
    ///
    /// Returns `true` exactly for the members of [`NORMAL_CLOSE_CODES`].
    pub fn is_normal_closure(self) -> bool {
        NORMAL_CLOSE_CODES.contains(&self)
    }
}

/// Close codes that represent ordinary session teardown rather than a fault.
pub const NORMAL_CLOSE_CODES: [CloseCode; 3] = [
    CloseCode::GOING_AWAY,
    CloseCode::NORMAL_CLOSURE,
    CloseCode::NO_STATUS_RECEIVED,
];

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NORMAL_CLOSURE => "normal closure",
            Self::GOING_AWAY => "going away",
            Self::PROTOCOL_ERROR => "protocol error",
            Self::UNSUPPORTED_DATA => "unsupported data",
            Self::NO_STATUS_RECEIVED => "no status received",
            Self::ABNORMAL_CLOSURE => "abnormal closure",
            Self::INVALID_PAYLOAD => "invalid payload",
            Self::POLICY_VIOLATION => "policy violation",
            Self::MESSAGE_TOO_BIG => "message too big",
            Self::MANDATORY_EXTENSION => "mandatory extension",
            Self::INTERNAL_ERROR => "internal error",
            Self::SERVICE_RESTART => "service restart",
            Self::TRY_AGAIN_LATER => "try again later",
            Self::TLS_HANDSHAKE => "TLS handshake",
            _ => return write!(f, "{}", self.0),
        };
        write!(f, "{} ({})", self.0, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_codes_are_recognized() {
        assert!(CloseCode::GOING_AWAY.is_normal_closure());
        assert!(CloseCode::NORMAL_CLOSURE.is_normal_closure());
        assert!(CloseCode::NO_STATUS_RECEIVED.is_normal_closure());
    }

    #[test]
    fn every_other_code_is_abnormal() {
        for raw in 0..=u16::MAX {
            let code = CloseCode(raw);
            let expected = matches!(raw, 1000 | 1001 | 1005);
            assert_eq!(code.is_normal_closure(), expected, "code {}", raw);
        }
    }

    #[test]
    fn display_names_registered_codes() {
        assert_eq!(CloseCode::POLICY_VIOLATION.to_string(), "1008 (policy violation)");
        assert_eq!(CloseCode(4000).to_string(), "4000");
    }
}
