//! Naming patterns for template-generated slots.
//!
//! A pattern is literal text with placeholders: `{n}` (or `{index}`) for the
//! slot's index and `{orientation}` for its orientation, e.g. `leg_{n}` or
//! `{orientation}_wing`.

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::combinator::{all_consuming, map, value};
use nom::multi::many1;
use nom::sequence::delimited;
use nom::{IResult, Parser};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Index,
    Orientation,
}

/// A parsed naming pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    segments: Vec<Segment>,
}

fn placeholder(input: &str) -> IResult<&str, Segment> {
    delimited(
        tag("{"),
        alt((
            value(Segment::Index, tag("n")),
            value(Segment::Index, tag("index")),
            value(Segment::Orientation, tag("orientation")),
        )),
        tag("}"),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Segment> {
    map(is_not("{}"), |text: &str| Segment::Literal(text.to_string())).parse(input)
}

fn segments(input: &str) -> IResult<&str, Vec<Segment>> {
    all_consuming(many1(alt((placeholder, literal)))).parse(input)
}

impl NamingPattern {
    pub fn parse(input: &str) -> Result<Self, String> {
        match segments(input) {
            Ok((_, segments)) => Ok(Self { segments }),
            Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
                if err.input.is_empty() {
                    Err("pattern is empty".to_string())
                } else {
                    Err(format!("unexpected input at '{}'", err.input))
                }
            }
            Err(nom::Err::Incomplete(_)) => Err("pattern is incomplete".to_string()),
        }
    }

    pub fn uses_index(&self) -> bool {
        self.segments.contains(&Segment::Index)
    }

    pub fn uses_orientation(&self) -> bool {
        self.segments.contains(&Segment::Orientation)
    }

    /// Render the slot id for one generated slot
    pub fn render(&self, index: u32, orientation: Option<&str>) -> Result<String, String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Index => out.push_str(&index.to_string()),
                Segment::Orientation => match orientation {
                    Some(o) => out.push_str(o),
                    None => {
                        return Err("uses {orientation} but the limb set assigns none".to_string())
                    }
                },
            }
        }
        Ok(out)
    }
}
