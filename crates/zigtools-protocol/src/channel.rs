//! 802.15.4 channel numbering.
//!
//! The 2.4 GHz band has channels 11 through 26. Stepping past either end
//! wraps around to the other.

use crate::constants::*;
use crate::error::*;

/// Direction to step through the channel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher channel numbers.
    Up,
    /// Towards lower channel numbers.
    Down,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "+" => Ok(Direction::Up),
            "down" | "-" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{}', expected up or down", other)),
        }
    }
}

/// A validated 2.4 GHz channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Validate a raw channel number.
    pub fn new(channel: u8) -> ProtocolResult<Self> {
        if (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
            Ok(Channel(channel))
        } else {
            Err(ProtocolError::InvalidChannel(channel))
        }
    }

    /// The channel number.
    pub fn get(self) -> u8 {
        self.0
    }

    /// The neighboring channel, wrapping 26 → 11 and 11 → 26.
    pub fn next(self, direction: Direction) -> Self {
        match direction {
            Direction::Up if self.0 == MAX_CHANNEL => Channel(MIN_CHANNEL),
            Direction::Up => Channel(self.0 + 1),
            Direction::Down if self.0 == MIN_CHANNEL => Channel(MAX_CHANNEL),
            Direction::Down => Channel(self.0 - 1),
        }
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel(DEFAULT_CHANNEL)
    }
}

impl TryFrom<u8> for Channel {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Channel::new(value)
    }
}

impl From<Channel> for u8 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Step a raw channel number.
///
/// An out-of-range `current` is pulled back to the default channel.
pub fn next_channel(current: u8, direction: Direction) -> u8 {
    match Channel::new(current) {
        Ok(channel) => channel.next(direction).get(),
        Err(_) => DEFAULT_CHANNEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_channel_up() {
        for channel in 11..=25 {
            assert_eq!(next_channel(channel, Direction::Up), channel + 1);
        }
        assert_eq!(next_channel(26, Direction::Up), 11);
    }

    #[test]
    fn test_next_channel_down() {
        for channel in 12..=26 {
            assert_eq!(next_channel(channel, Direction::Down), channel - 1);
        }
        assert_eq!(next_channel(11, Direction::Down), 26);
    }

    #[test]
    fn test_next_channel_out_of_range() {
        assert_eq!(next_channel(0, Direction::Up), 11);
        assert_eq!(next_channel(27, Direction::Down), 11);
    }

    #[test]
    fn test_channel_bounds() {
        assert_eq!(Channel::new(10), Err(ProtocolError::InvalidChannel(10)));
        assert_eq!(Channel::new(27), Err(ProtocolError::InvalidChannel(27)));
        assert_eq!(Channel::new(11).unwrap().get(), 11);
        assert_eq!(Channel::new(26).unwrap().get(), 26);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("-".parse::<Direction>(), Ok(Direction::Down));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
