use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParsePinsError {
    #[error("invalid pin number: {0}")]
    InvalidNumber(String),
}

/// Parses a list of pin numbers separated by commas, spaces or semicolons,
/// e.g. `"4, 5, 6"`.
pub fn parse_pins(pin_str: &str) -> Result<Vec<usize>, ParsePinsError> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| ParsePinsError::InvalidNumber(s.to_string())))
        .collect()
}

/// Extension trait for iterating over the set bits of a button mask.
pub trait MaskExt {
    fn bits(self) -> impl Iterator<Item = usize>;
}

impl MaskExt for u8 {
    fn bits(self) -> impl Iterator<Item = usize> {
        (0..8usize).filter(move |&i| self >> i & 1 != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separated_pin_lists() {
        assert_eq!(parse_pins("4, 5, 6").unwrap(), vec![4, 5, 6]);
        assert_eq!(parse_pins("17 27;22").unwrap(), vec![17, 27, 22]);
        assert!(parse_pins("4, five").is_err());
    }

    #[test]
    fn bits_iterates_set_bits_in_order() {
        assert_eq!(0b0000_0000u8.bits().collect::<Vec<_>>(), Vec::<usize>::new());
        assert_eq!(0b1011_0010u8.bits().collect::<Vec<_>>(), vec![1, 4, 5, 7]);
    }
}
