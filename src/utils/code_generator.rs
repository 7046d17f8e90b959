use rand::Rng;

const DISCOUNT_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Numeric one-time code of the given length, zero padded
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Four digit login code
pub fn generate_otp_code() -> String {
    generate_numeric_code(4)
}

/// Upper-case discount code without ambiguous characters (0/O, 1/I)
pub fn generate_discount_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| DISCOUNT_ALPHABET[rng.gen_range(0..DISCOUNT_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_code() {
        let code = generate_otp_code();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_numeric_code_keeps_leading_zeros() {
        for _ in 0..50 {
            let code = generate_numeric_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.parse::<u32>().is_ok());
        }
    }

    #[test]
    fn test_generate_discount_code() {
        let code = generate_discount_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| DISCOUNT_ALPHABET.contains(&b)));
    }
}
