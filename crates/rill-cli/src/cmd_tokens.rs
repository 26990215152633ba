/// Implementation of `rill tokens`.
///
/// Decodes one CBOR data item and prints a line per token, indented by
/// nesting depth:
///
/// ```text
/// $ rill tokens item.cbor
///      0  1  push map len=1
///      1  1    text header len=1 +
///      2  1    text content "a"
///      3  1    unsigned 1
///      4  0  pop map
/// ```
///
/// Columns are position, length, then the token. `+` marks a string piece
/// that continues in the next token. With `--json` each line is a JSON
/// object instead.
use std::fmt::Write as _;
use std::io::{self, Write};

use anyhow::{Context, Result};
use rill_decoder::CborDecoder;
use rill_driver::{PumpConfig, collect_tokens};
use rill_types::{Container, FloatWidth, Literal, StringPart, Token, TokenValue};
use serde::Serialize;

use crate::{TokensArgs, input};

/// One token as printed by `--json`.
#[derive(Serialize)]
struct TokenRecord {
    position: u64,
    length: u64,
    depth: usize,
    kind: &'static str,
    detail: String,
    continued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
}

/// # Errors
///
/// Returns an error if the input cannot be read or is not valid CBOR.
pub fn run(args: &TokensArgs) -> Result<()> {
    let name = input::display(args.file.as_ref());
    let bytes = input::read_all(args.file.as_ref())?;
    let config = PumpConfig::default().with_limits(args.read_limit, None);
    let tokens = collect_tokens(&mut CborDecoder::new(), &bytes[..], &config, args.capacity)
        .with_context(|| format!("cannot decode {name} as CBOR"))?;

    let mut out = io::BufWriter::new(io::stdout().lock());
    let mut depth = 0usize;
    for token in &tokens {
        if matches!(token.value, TokenValue::Pop(_)) {
            depth = depth.saturating_sub(1);
        }
        if args.json {
            let record = record(token, depth, &bytes);
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", line(token, depth, &bytes))?;
        }
        if matches!(token.value, TokenValue::Push { .. }) {
            depth += 1;
        }
    }
    out.flush()?;
    Ok(())
}

fn container(c: Container) -> &'static str {
    match c {
        Container::Array => "array",
        Container::Map => "map",
    }
}

fn len(len: Option<u64>) -> String {
    len.map_or_else(|| "indefinite".to_owned(), |n| format!("len={n}"))
}

fn part(p: StringPart, token: &Token, input: &[u8], text: bool) -> String {
    match p {
        StringPart::Header { len: n } => format!("header {}", len(n)),
        StringPart::End => "end".to_owned(),
        StringPart::Content => {
            let bytes = token.bytes(input).unwrap_or_default();
            if text {
                format!("content {:?}", String::from_utf8_lossy(bytes))
            } else {
                format!("content h'{}'", hex::encode(bytes))
            }
        }
    }
}

/// The kind name and detail text of a token.
fn describe(token: &Token, input: &[u8]) -> (&'static str, String) {
    match token.value {
        TokenValue::Push { container: c, len: n } => ("push", format!("{} {}", container(c), len(n))),
        TokenValue::Pop(c) => ("pop", container(c).to_owned()),
        TokenValue::Unsigned(n) => ("unsigned", n.to_string()),
        TokenValue::Negative(n) => ("negative", format!("-1-{n}")),
        TokenValue::Bytes(p) => ("bytes", part(p, token, input, false)),
        TokenValue::Text(p) => ("text", part(p, token, input, true)),
        TokenValue::Tag(n) => ("tag", n.to_string()),
        TokenValue::Literal(l) => (
            "literal",
            match l {
                Literal::False => "false",
                Literal::True => "true",
                Literal::Null => "null",
                Literal::Undefined => "undefined",
            }
            .to_owned(),
        ),
        TokenValue::Simple(n) => ("simple", n.to_string()),
        TokenValue::Float { bits, width } => ("float", float(bits, width)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float(bits: u64, width: FloatWidth) -> String {
    match width {
        FloatWidth::F16 => format!("f16 {bits:#06x}"),
        FloatWidth::F32 => format!("f32 {}", f32::from_bits(bits as u32)),
        FloatWidth::F64 => format!("f64 {}", f64::from_bits(bits)),
    }
}

fn line(token: &Token, depth: usize, input: &[u8]) -> String {
    let (kind, detail) = describe(token, input);
    let mut s = format!(
        "{:>6} {:>2}  {:indent$}{kind}",
        token.position,
        token.length,
        "",
        indent = depth * 2
    );
    if !detail.is_empty() {
        let _ = write!(s, " {detail}");
    }
    if token.continued {
        s.push_str(" +");
    }
    s
}

fn record(token: &Token, depth: usize, input: &[u8]) -> TokenRecord {
    let (kind, detail) = describe(token, input);
    TokenRecord {
        position: token.position,
        length: token.length,
        depth,
        kind,
        detail,
        continued: token.continued,
        hex: token
            .is_content()
            .then(|| token.bytes(input).map(hex::encode))
            .flatten(),
    }
}
