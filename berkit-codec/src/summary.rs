//! One-line message summaries
//!
//! Every encode and decode returns a short human readable label next to the
//! result, e.g. `SNMP get-request` or `TCAP begin`. The label comes from the
//! codec's [`Summarizer`]; when it declines or fails, the schema's type name
//! is used.

use crate::message::Message;
use log::warn;
use std::panic::{self, AssertUnwindSafe};

/// Produces a summary line for a message
///
/// Returning `None` selects the default label.
#[cfg_attr(test, mockall::automock)]
pub trait Summarizer: Send + Sync {
    fn summarize(&self, message: &Message) -> Option<String>;
}

impl<F> Summarizer for F
where
    F: Fn(&Message) -> Option<String> + Send + Sync,
{
    fn summarize(&self, message: &Message) -> Option<String> {
        self(message)
    }
}

/// Always defers to the schema's type name
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSummary;

impl Summarizer for DefaultSummary {
    fn summarize(&self, _message: &Message) -> Option<String> {
        None
    }
}

/// Names the selected alternative of a top-level CHOICE
#[derive(Debug, Clone)]
pub struct ChoiceSummary {
    prefix: String,
}

impl ChoiceSummary {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Summarizer for ChoiceSummary {
    fn summarize(&self, message: &Message) -> Option<String> {
        let (name, _) = message.as_choice()?;
        Some(join(&self.prefix, name))
    }
}

/// Names the selected alternative of a CHOICE field of a top-level SEQUENCE
#[derive(Debug, Clone)]
pub struct FieldChoiceSummary {
    prefix: String,
    field: String,
}

impl FieldChoiceSummary {
    pub fn new(prefix: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            field: field.into(),
        }
    }
}

impl Summarizer for FieldChoiceSummary {
    fn summarize(&self, message: &Message) -> Option<String> {
        let (name, _) = message.get(&self.field)?.as_choice()?;
        Some(join(&self.prefix, name))
    }
}

/// Run `summarizer`, falling back to `fallback` when it declines or panics
pub(crate) fn summarize_or(summarizer: &dyn Summarizer, message: &Message, fallback: &str) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| summarizer.summarize(message))) {
        Ok(Some(summary)) => summary,
        Ok(None) => fallback.to_string(),
        Err(_) => {
            warn!("summarizer panicked, falling back to '{}'", fallback);
            fallback.to_string()
        }
    }
}

pub(crate) fn join(prefix: &str, label: &str) -> String {
    if prefix.is_empty() {
        label.to_string()
    } else {
        format!("{} {}", prefix, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_summary() {
        let message = Message::choice("begin", Message::Null);
        assert_eq!(ChoiceSummary::new("TCAP").summarize(&message).as_deref(), Some("TCAP begin"));
        assert_eq!(ChoiceSummary::new("").summarize(&message).as_deref(), Some("begin"));
        assert_eq!(ChoiceSummary::new("TCAP").summarize(&Message::Null), None);
    }

    #[test]
    fn test_field_choice_summary() {
        let message = Message::map([
            ("version", Message::from("version_1")),
            ("data", Message::choice("get-request", Message::Null)),
        ]);
        let summary = FieldChoiceSummary::new("SNMP", "data");
        assert_eq!(summary.summarize(&message).as_deref(), Some("SNMP get-request"));
        assert_eq!(FieldChoiceSummary::new("SNMP", "version").summarize(&message), None);
    }

    #[test]
    fn test_closure_summarizer() {
        let summarizer = |m: &Message| m.as_int().map(|v| format!("int {}", v));
        assert_eq!(summarize_or(&summarizer, &Message::Int(4), "X"), "int 4");
        assert_eq!(summarize_or(&summarizer, &Message::Null, "X"), "X");
    }

    #[test]
    fn test_panicking_summarizer_falls_back() {
        let summarizer = |_: &Message| -> Option<String> { panic!("boom") };
        assert_eq!(summarize_or(&summarizer, &Message::Null, "Message"), "Message");
    }

    #[test]
    fn test_summarizer_sees_message() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .withf(|m| m.as_int() == Some(9))
            .times(1)
            .returning(|_| Some("nine".to_string()));
        assert_eq!(summarize_or(&mock, &Message::Int(9), "X"), "nine");
    }

    #[test]
    fn test_default_summary_declines() {
        assert_eq!(summarize_or(&DefaultSummary, &Message::Null, "PDU"), "PDU");
    }
}
