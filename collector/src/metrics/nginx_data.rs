use eyre::{
    bail,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Connection counters of the nginx `stub_status` page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NginxData {
    pub active_connections: u64,
    pub total_accepts: u64,
    pub total_handled: u64,
    pub total_requests: u64,
    pub reading_connections: u64,
    pub writing_connections: u64,
    pub waiting_connections: u64,
}

impl NginxData {
    /// Parses a `stub_status` body:
    ///
    /// ```text
    /// Active connections: 291
    /// server accepts handled requests
    ///  16630948 16630948 31070465
    /// Reading: 6 Writing: 179 Waiting: 106
    /// ```
    pub fn parse(body: &str) -> Result<Self> {
        let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() < 3 {
            bail!("unexpected stub_status format: expected at least 3 lines, got {}", lines.len());
        }

        let number = |s: Option<&str>| -> u64 { s.and_then(|s| s.parse().ok()).unwrap_or_default() };
        let mut data = Self {
            active_connections: number(lines[0].strip_prefix("Active connections:").map(str::trim)),
            ..Self::default()
        };

        let mut totals = lines[2].split_whitespace();
        data.total_accepts = number(totals.next());
        data.total_handled = number(totals.next());
        data.total_requests = number(totals.next());

        if let Some(line) = lines.get(3) {
            let mut fields = line.split_whitespace();
            while let Some(key) = fields.next() {
                let value = number(fields.next());
                match key {
                    "Reading:" => data.reading_connections = value,
                    "Writing:" => data.writing_connections = value,
                    "Waiting:" => data.waiting_connections = value,
                    _ => {}
                }
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_canonical_body() {
        let body = "Active connections: 291 \nserver accepts handled requests\n 16630948 16630948 31070465 \nReading: 6 Writing: 179 Waiting: 106 \n";
        assert_eq!(
            NginxData::parse(body).unwrap(),
            NginxData {
                active_connections: 291,
                total_accepts: 16630948,
                total_handled: 16630948,
                total_requests: 31070465,
                reading_connections: 6,
                writing_connections: 179,
                waiting_connections: 106,
            }
        );
    }

    #[test]
    fn short_body_is_an_error() {
        assert!(NginxData::parse("Active connections: 1\nserver accepts handled requests\n").is_err());
        assert!(NginxData::parse("").is_err());
    }

    #[test]
    fn missing_connection_states_stay_zero() {
        let data = NginxData::parse("Active connections: 3\nserver accepts handled requests\n 10 9 8\n").unwrap();
        assert_eq!(data.active_connections, 3);
        assert_eq!(data.total_requests, 8);
        assert_eq!(data.reading_connections, 0);
        assert_eq!(data.waiting_connections, 0);
    }
}
