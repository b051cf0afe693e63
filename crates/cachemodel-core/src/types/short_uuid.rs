use uuid::Uuid;

///
/// Short UUID text form.
///
/// Base57 over an alphabet without visually ambiguous characters
/// (no `0`, `1`, `I`, `O`, `l`), most significant digit first, left-padded
/// to a fixed 22 characters.
///

pub const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of every encoded value.
pub const ENCODED_LEN: usize = 22;

const BASE: u128 = ALPHABET.len() as u128;

/// Encode a UUID into its 22-character short form.
#[must_use]
pub fn encode(uuid: &Uuid) -> String {
    let mut n = uuid.as_u128();
    let mut digits = [ALPHABET[0]; ENCODED_LEN];

    for slot in digits.iter_mut().rev() {
        if n == 0 {
            break;
        }
        // remainder is always < 57
        #[allow(clippy::cast_possible_truncation)]
        let digit = (n % BASE) as usize;
        *slot = ALPHABET[digit];
        n /= BASE;
    }

    digits.iter().map(|&b| char::from(b)).collect()
}

/// Decode a short form back into a UUID.
///
/// Returns `None` on wrong length, characters outside the alphabet, or
/// overflow past 128 bits.
#[must_use]
pub fn decode(text: &str) -> Option<Uuid> {
    if text.len() != ENCODED_LEN {
        return None;
    }

    let mut n: u128 = 0;
    for byte in text.bytes() {
        let digit = ALPHABET.iter().position(|&a| a == byte)?;
        n = n.checked_mul(BASE)?.checked_add(digit as u128)?;
    }

    Some(Uuid::from_u128(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_is_fixed_width() {
        for uuid in [Uuid::nil(), Uuid::from_u128(u128::MAX), Uuid::from_u128(57)] {
            assert_eq!(encode(&uuid).len(), ENCODED_LEN);
        }
    }

    #[test]
    fn short_form_round_trips() {
        for _ in 0..64 {
            let uuid = Uuid::new_v4();
            let short = encode(&uuid);
            assert!(short.len() < uuid.simple().to_string().len());
            assert_eq!(decode(&short), Some(uuid));
        }
    }

    #[test]
    fn nil_encodes_to_padding() {
        assert_eq!(encode(&Uuid::nil()), "2".repeat(ENCODED_LEN));
        assert_eq!(encode(&Uuid::from_u128(1)), format!("{}3", "2".repeat(21)));
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        assert_eq!(decode(&"0".repeat(ENCODED_LEN)), None);
        assert_eq!(decode("abc"), None);
    }
}
