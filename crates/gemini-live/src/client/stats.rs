use std::fmt;

use crate::types::UsageMetadata;

/// Token usage accumulated over a session.
///
/// The Live API reports usage per turn; each report is added here.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Stats {
    reports: u32,
    input_tokens: i64,
    output_tokens: i64,
    total_tokens: i64,
}

impl Stats {
    pub(crate) fn record(&mut self, usage: &UsageMetadata) {
        self.reports += 1;
        self.input_tokens += usage.prompt_token_count;
        self.output_tokens += usage.response_token_count;
        // Older servers leave the total out.
        self.total_tokens += if usage.total_token_count > 0 {
            usage.total_token_count
        } else {
            usage.prompt_token_count + usage.response_token_count
        };
    }

    /// Number of usage reports received, roughly one per model turn.
    pub fn reports(&self) -> u32 {
        self.reports
    }

    pub fn input_tokens(&self) -> i64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> i64 {
        self.output_tokens
    }

    pub fn total_tokens(&self) -> i64 {
        self.total_tokens
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tokens over {} turns ({} in, {} out)",
            self.total_tokens, self.reports, self.input_tokens, self.output_tokens
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: i64, response: i64, total: i64) -> UsageMetadata {
        UsageMetadata {
            prompt_token_count: prompt,
            response_token_count: response,
            total_token_count: total,
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut stats = Stats::default();
        stats.record(&usage(3, 4, 7));
        stats.record(&usage(2, 5, 0));
        assert_eq!(stats.reports(), 2);
        assert_eq!(stats.input_tokens(), 5);
        assert_eq!(stats.output_tokens(), 9);
        assert_eq!(stats.total_tokens(), 14);
        assert_eq!(stats.to_string(), "14 tokens over 2 turns (5 in, 9 out)");
    }
}
