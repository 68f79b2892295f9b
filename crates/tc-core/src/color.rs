//! CSS color values.
//!
//! Node attributes store colors the way the browser hands them to us:
//! hex strings, `rgb()`/`rgba()` functions, or a handful of names. They are
//! parsed once on input and always emitted as hex.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, preceded, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take_while;

/// RGBA color. Stored as 4 × f32 in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);
        let short = |i: usize| Some(hex_val(bytes[i])? * 17);

        match bytes.len() {
            3 => Some(Self::from_rgba8(short(0)?, short(1)?, short(2)?, 255)),
            4 => Some(Self::from_rgba8(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::from_rgba8(pair(0)?, pair(2)?, pair(4)?, 255)),
            8 => Some(Self::from_rgba8(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        parse_color(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse any supported CSS color value.
pub fn parse_color(input: &str) -> CoreResult<Color> {
    let lowered = input.trim().to_ascii_lowercase();
    color_value
        .parse(lowered.as_str())
        .map_err(|e| CoreError::invalid_color(format!("{input:?} ({e})")))
}

fn color_value(input: &mut &str) -> ModalResult<Color> {
    alt((hex_color, rgb_function, named_color)).parse_next(input)
}

fn hex_color(input: &mut &str) -> ModalResult<Color> {
    preceded('#', take_while(3..=8, |c: char| c.is_ascii_hexdigit()))
        .verify_map(Color::from_hex)
        .parse_next(input)
}

fn named_color(input: &mut &str) -> ModalResult<Color> {
    alt((
        "black".value(Color::BLACK),
        "white".value(Color::WHITE),
        "transparent".value(Color::TRANSPARENT),
    ))
    .parse_next(input)
}

/// `rgb(r, g, b)` or `rgba(r, g, b, a)` with 0-255 channels and 0-1 alpha.
fn rgb_function(input: &mut &str) -> ModalResult<Color> {
    let with_alpha = rgb_prefix(input)?;
    let args = rgb_args(input)?;

    let expected = if with_alpha { 4 } else { 3 };
    if args.len() != expected {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let channel = |v: f32| v.clamp(0.0, 255.0) / 255.0;
    let alpha = args.get(3).copied().unwrap_or(1.0).clamp(0.0, 1.0);
    Ok(Color::rgba(channel(args[0]), channel(args[1]), channel(args[2]), alpha))
}

fn rgb_prefix(input: &mut &str) -> ModalResult<bool> {
    alt(("rgba".value(true), "rgb".value(false))).parse_next(input)
}

fn rgb_args(input: &mut &str) -> ModalResult<Vec<f32>> {
    delimited(
        ('(', space0),
        separated(3..=4, parse_number, (space0, ',', space0)),
        (space0, ')'),
    )
    .parse_next(input)
}

fn parse_number(input: &mut &str) -> ModalResult<f32> {
    let start = *input;
    if input.starts_with('-') {
        *input = &input[1..];
    }
    let _ = take_while::<_, _, ErrMode<ContextError>>(1.., |c: char| c.is_ascii_digit())
        .parse_next(input)?;
    if input.starts_with('.') {
        *input = &input[1..];
        let _ =
            take_while::<_, _, ContextError>(0.., |c: char| c.is_ascii_digit()).parse_next(input);
    }
    let matched = &start[..start.len() - input.len()];
    matched
        .parse::<f32>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}
