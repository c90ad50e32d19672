//! Line-level parsing for the station and network CSV files

use crate::data_structures::graph::ServiceTier;

/// Splits one CSV record into trimmed fields
///
/// Double quotes group a field so it may contain commas; a doubled quote
/// inside a quoted field is a literal quote. A trailing `\r` is dropped.
pub fn split_record(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(field.trim().to_owned());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_owned());
    fields
}

/// Maps a service label from the network file onto a tier
pub fn parse_service(raw: &str) -> Option<ServiceTier> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "STANDARD" => Some(ServiceTier::Standard),
        "ALFA PENDULAR" | "PREMIUM" => Some(ServiceTier::Premium),
        "EXPRESS" | "VERY EXPENSIVE" => Some(ServiceTier::Express),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_record() {
        assert_eq!(
            split_record("Faro,Faro,Faro,Sé,Linha do Algarve\r"),
            vec!["Faro", "Faro", "Faro", "Sé", "Linha do Algarve"]
        );
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(
            split_record(r#""Porto, Campanhã",PORTO,"say ""hi""",,"#),
            vec!["Porto, Campanhã", "PORTO", r#"say "hi""#, "", ""]
        );
    }

    #[test]
    fn test_service_labels() {
        assert_eq!(parse_service("STANDARD"), Some(ServiceTier::Standard));
        assert_eq!(parse_service("Alfa Pendular"), Some(ServiceTier::Premium));
        assert_eq!(parse_service(" express "), Some(ServiceTier::Express));
        assert_eq!(parse_service("VERY EXPENSIVE"), Some(ServiceTier::Express));
        assert_eq!(parse_service("INTERCIDADES"), None);
    }
}
