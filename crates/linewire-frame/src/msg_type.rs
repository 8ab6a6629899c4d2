//! Message type tags and field layout.
//!
//! A line splits on [`MSG_DELIMITER`] into the length header, the type tag,
//! then the body.

use std::fmt;
use std::str::FromStr;

use crate::error::FrameError;

/// Separator between message fields. Must never appear inside a field.
pub const MSG_DELIMITER: &str = "###";

/// Semantic kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    /// Client is leaving; the server should drop the session.
    Disconnect,
    /// Client announces its user name.
    User,
    /// Client asks the server to start a session round.
    Start,
    /// Free-form input typed by the user.
    UserInput,
    /// Text pushed from the server to the client.
    ServerMsg,
}

impl MsgType {
    /// Every known type, in declaration order.
    pub const ALL: [MsgType; 5] = [
        MsgType::Disconnect,
        MsgType::User,
        MsgType::Start,
        MsgType::UserInput,
        MsgType::ServerMsg,
    ];

    /// The wire tag for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            MsgType::Disconnect => "DISCONNECT",
            MsgType::User => "USER",
            MsgType::Start => "START",
            MsgType::UserInput => "USER_INPUT",
            MsgType::ServerMsg => "SERVERMSG",
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsgType {
    type Err = FrameError;

    /// Parse a wire tag, ignoring ASCII case.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        MsgType::ALL
            .into_iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| FrameError::UnknownType(tag.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!("SERVERMSG".parse::<MsgType>().unwrap(), MsgType::ServerMsg);
        assert_eq!("servermsg".parse::<MsgType>().unwrap(), MsgType::ServerMsg);
        assert_eq!("User_Input".parse::<MsgType>().unwrap(), MsgType::UserInput);
        assert_eq!("disconnect".parse::<MsgType>().unwrap(), MsgType::Disconnect);
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "BOGUS".parse::<MsgType>().unwrap_err();
        assert!(matches!(err, FrameError::UnknownType(tag) if tag == "BOGUS"));
    }

    #[test]
    fn rejects_padded_tag() {
        assert!(" USER".parse::<MsgType>().is_err());
        assert!("".parse::<MsgType>().is_err());
    }

    #[test]
    fn display_matches_wire_tag() {
        for ty in MsgType::ALL {
            assert_eq!(ty.to_string(), ty.as_str());
            assert_eq!(ty.as_str().parse::<MsgType>().unwrap(), ty);
        }
    }

    #[test]
    fn delimiter_is_not_a_tag_substring() {
        for ty in MsgType::ALL {
            assert!(!ty.as_str().contains(MSG_DELIMITER));
        }
    }
}
