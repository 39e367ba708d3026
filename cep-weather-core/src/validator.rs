/// Number of digits in a Brazilian postal code (CEP).
pub const POSTAL_CODE_LEN: usize = 8;

/// Returns true when `code` is exactly eight ASCII digits with no separators.
pub fn validate(code: &str) -> bool {
    code.len() == POSTAL_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
