use std::fmt::Display;

use owo_colors::{OwoColorize, Stream};

/// Echo a step right before performing it.
pub fn announce(action: impl Display) {
    eprintln!(
        "{} {}",
        "==>".if_supports_color(Stream::Stderr, |s| s.blue()),
        action
    );
}

/// A step that was skipped or needs no work.
pub fn note(message: impl Display) {
    eprintln!(
        "{} {}",
        "-->".if_supports_color(Stream::Stderr, |s| s.blue()),
        message.if_supports_color(Stream::Stderr, |s| s.yellow())
    );
}

pub fn success(message: impl Display) {
    eprintln!(
        "{}",
        message.if_supports_color(Stream::Stderr, |s| s.green())
    );
}
