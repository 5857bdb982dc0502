/// Reduce a phone number to the international digits form
/// expected by the gateway. A leading `0` is the national trunk
/// prefix and gets replaced by `country_code`.
pub fn normalize_phone(phone: &str, country_code: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.strip_prefix('0') {
        Some(rest) => {
            let code: String = country_code.chars().filter(char::is_ascii_digit).collect();
            Some(format!("{}{}", code, rest))
        }
        None => Some(digits),
    }
}
