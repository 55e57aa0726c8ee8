//! Parsing of the one-line commands typed into the interactive tools

use crate::haptic::Line;
use crate::registers::MAX_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    Quit,
    /// Move the pulse end by this many counts
    Adjust(i32),
    /// Anything else; the tool just prompts again
    Ignore,
}

/// `x` quits, `+`/`-` step by one, an integer steps by that much
pub fn parse_step(line: &str) -> StepCommand {
    match line.trim() {
        "x" | "X" => StepCommand::Quit,
        "+" => StepCommand::Adjust(1),
        "-" => StepCommand::Adjust(-1),
        other => other
            .parse::<i32>()
            .map(StepCommand::Adjust)
            .unwrap_or(StepCommand::Ignore),
    }
}

/// `counts + delta`, saturated into the 12-bit count range
pub fn apply_step(counts: u16, delta: i32) -> u16 {
    (counts as i32)
        .saturating_add(delta)
        .clamp(0, MAX_COUNT as i32) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticCommand {
    Quit,
    Toggle(Line),
    Reverse,
    Unrecognized,
}

pub fn parse_haptic(line: &str) -> HapticCommand {
    match line.trim().to_lowercase().as_str() {
        "x" => HapticCommand::Quit,
        "<>" => HapticCommand::Reverse,
        other => Line::ALL
            .into_iter()
            .find(|l| l.name() == other)
            .map(HapticCommand::Toggle)
            .unwrap_or(HapticCommand::Unrecognized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        assert_eq!(parse_step("x\n"), StepCommand::Quit);
        assert_eq!(parse_step("+"), StepCommand::Adjust(1));
        assert_eq!(parse_step(" - "), StepCommand::Adjust(-1));
        assert_eq!(parse_step("25"), StepCommand::Adjust(25));
        assert_eq!(parse_step("-40"), StepCommand::Adjust(-40));
        assert_eq!(parse_step("++"), StepCommand::Ignore);
        assert_eq!(parse_step(""), StepCommand::Ignore);
    }

    #[test]
    fn test_apply_step_saturates() {
        assert_eq!(apply_step(300, 100), 400);
        assert_eq!(apply_step(10, -50), 0);
        assert_eq!(apply_step(4000, 500), MAX_COUNT);
        assert_eq!(apply_step(0, i32::MIN), 0);
    }

    #[test]
    fn test_parse_haptic() {
        assert_eq!(parse_haptic("EN"), HapticCommand::Toggle(Line::Enable));
        assert_eq!(parse_haptic(" in2 \n"), HapticCommand::Toggle(Line::In2));
        assert_eq!(parse_haptic("<>"), HapticCommand::Reverse);
        assert_eq!(parse_haptic("X"), HapticCommand::Quit);
        assert_eq!(parse_haptic("in3"), HapticCommand::Unrecognized);
    }
}
