//! Answer depth evaluation
//!
//! A deliberately simple information bar: accumulated answer length. The
//! state machine concatenates the primary answer with any follow-up answers
//! before calling this, so depth is judged over everything the user has
//! said on the topic, not per message.

/// Check whether accumulated answer text meets a minimum-character bar
///
/// Pure and total: `min_chars == 0` disables the check entirely (selection
/// topics and topics with no depth requirement). Length is measured on
/// trimmed text; the boundary is inclusive.
pub fn is_sufficient(text: &str, min_chars: usize) -> bool {
    if min_chars == 0 {
        return true;
    }
    text.trim().chars().count() >= min_chars
}
