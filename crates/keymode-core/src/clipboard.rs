// Keymode Clipboard Helpers
// Text transforms and list items offered by the host's clipboard history list

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use strum_macros::{Display, EnumIter};

use crate::host::HostCommand;

/// Clipboard history settings handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClipboardHistoryConfig {
    /// Monitor the clipboard
    pub enable_hook: bool,
    pub max_items: usize,
    /// Total size limit in bytes
    pub quota: usize,
    /// Prefix used by quote pasting
    pub quote_mark: String,
}

impl Default for ClipboardHistoryConfig {
    fn default() -> Self {
        Self {
            enable_hook: true,
            max_items: 1000,
            quota: 10 * 1024 * 1024,
            quote_mark: "> ".to_string(),
        }
    }
}

// Index-aligned; the tilde maps to itself
const FULL_WIDTH: &str = "ａｂｃｄｅｆｇｈｉｊｋｌｍｎｏｐｑｒｓｔｕｖｗｘｙｚＡＢＣＤＥＦＧＨＩＪＫＬＭＮＯＰＱＲＳＴＵＶＷＸＹＺ！”＃＄％＆’（）＊＋，−．／：；＜＝＞？＠［￥］＾＿‘｛｜｝～０１２３４５６７８９　";
const HALF_WIDTH: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}～0123456789 ";

fn translate(text: &str, from: &str, to: &str) -> String {
    text.chars()
        .map(|c| {
            from.chars()
                .position(|f| f == c)
                .and_then(|i| to.chars().nth(i))
                .unwrap_or(c)
        })
        .collect()
}

/// Lines of `text` with their terminators attached.
///
/// Breaks on `\n`, `\r`, `\r\n`, the vertical tab and form feed, the
/// file/group/record separators, NEL and the Unicode line and paragraph
/// separators.
pub fn lines_inclusive(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let end = match c {
            '\r' => match chars.peek() {
                Some(&(j, '\n')) => {
                    chars.next();
                    j + 1
                }
                _ => i + 1,
            },
            '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => i + c.len_utf8(),
            _ => continue,
        };
        lines.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_blank(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
}

/// Prefix every line with `mark`
pub fn quote(text: &str, mark: &str) -> String {
    lines_inclusive(text)
        .into_iter()
        .map(|line| format!("{}{}", mark, line))
        .collect()
}

/// Indent non-blank lines by four spaces
pub fn indent(text: &str) -> String {
    lines_inclusive(text)
        .into_iter()
        .map(|line| {
            if is_blank(line) {
                line.to_string()
            } else {
                format!("    {}", line)
            }
        })
        .collect()
}

/// Drop up to four leading spaces, or leading spaces up to and including a tab
pub fn unindent(text: &str) -> String {
    lines_inclusive(text)
        .into_iter()
        .map(|line| {
            let bytes = line.as_bytes();
            let mut cut = 0;
            for i in 0..=4 {
                cut = i;
                match bytes.get(i) {
                    None => break,
                    Some(b'\t') => {
                        cut = i + 1;
                        break;
                    }
                    Some(b' ') => {}
                    Some(_) => break,
                }
            }
            &line[cut..]
        })
        .collect()
}

pub fn to_half_width(text: &str) -> String {
    translate(text, FULL_WIDTH, HALF_WIDTH)
}

pub fn to_full_width(text: &str) -> String {
    translate(text, HALF_WIDTH, FULL_WIDTH)
}

/// UTF-8 with BOM and CRLF line endings
pub fn encode_crlf_bom(text: &str) -> Vec<u8> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let crlf = normalized.replace('\n', "\r\n");
    let mut bytes = Vec::with_capacity(crlf.len() + 3);
    bytes.extend_from_slice(b"\xEF\xBB\xBF");
    bytes.extend_from_slice(crlf.as_bytes());
    bytes
}

pub fn clip_file_name(now: &NaiveDateTime) -> String {
    now.format("clip_%Y%m%d_%H%M%S.txt").to_string()
}

/// Save `text` into `dir` as `clip_<timestamp>.txt`.
///
/// Returns `None` without touching the disk when `text` is empty.
pub fn save_to_dir(dir: &Path, text: &str, now: &NaiveDateTime) -> io::Result<Option<PathBuf>> {
    if text.is_empty() {
        return Ok(None);
    }
    let path = dir.join(clip_file_name(now));
    fs::write(&path, encode_crlf_bom(text))?;
    log::info!("saved clipboard to {}", path.display());
    Ok(Some(path))
}

/// Transforms of the current clipboard text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TextTransform {
    #[strum(to_string = "Quote clipboard")]
    Quote,
    #[strum(to_string = "Indent clipboard")]
    Indent,
    #[strum(to_string = "Unindent clipboard")]
    Unindent,
    #[strum(to_string = "To Half-Width")]
    ToHalfWidth,
    #[strum(to_string = "To Full-Width")]
    ToFullWidth,
}

impl TextTransform {
    pub fn apply(self, text: &str, quote_mark: &str) -> String {
        match self {
            TextTransform::Quote => quote(text, quote_mark),
            TextTransform::Indent => indent(text),
            TextTransform::Unindent => unindent(text),
            TextTransform::ToHalfWidth => to_half_width(text),
            TextTransform::ToFullWidth => to_full_width(text),
        }
    }
}

/// One entry of a clipboard list extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListerItem {
    Phrase { label: String, text: String },
    /// Current local time in a strftime format
    DateTime { label: String, format: String },
    Transform(TextTransform),
    /// Write the clipboard to the save directory
    SaveToFile,
    /// Ask the host to run a command instead of pasting
    Command(HostCommand),
    Separator,
}

impl ListerItem {
    pub fn phrase(label: &str, text: &str) -> Self {
        ListerItem::Phrase {
            label: label.to_string(),
            text: text.to_string(),
        }
    }

    pub fn date_time(label: &str, format: &str) -> Self {
        ListerItem::DateTime {
            label: label.to_string(),
            format: format.to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ListerItem::Phrase { label, .. } | ListerItem::DateTime { label, .. } => label.clone(),
            ListerItem::Transform(transform) => transform.to_string(),
            ListerItem::SaveToFile => "Save clipboard to file".to_string(),
            ListerItem::Command(HostCommand::EditConfig) => "Edit config".to_string(),
            ListerItem::Command(HostCommand::ReloadConfig) => "Reload config".to_string(),
            ListerItem::Command(command) => command.to_string(),
            ListerItem::Separator => String::new(),
        }
    }

    /// Text to paste for this item, if it produces any
    pub fn text(&self, clipboard: &str, quote_mark: &str, now: &NaiveDateTime) -> Option<String> {
        match self {
            ListerItem::Phrase { text, .. } => Some(text.clone()),
            ListerItem::DateTime { format, .. } => Some(now.format(format).to_string()),
            ListerItem::Transform(transform) => Some(transform.apply(clipboard, quote_mark)),
            ListerItem::SaveToFile | ListerItem::Command(_) | ListerItem::Separator => None,
        }
    }
}

/// A named list of items shown beside the clipboard history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardLister {
    pub name: String,
    pub items: Vec<ListerItem>,
}

/// The three extension lists: fixed phrases, date-time and the others list
/// of text transforms and config commands
pub fn default_listers(phrases: &[(String, String)]) -> Vec<ClipboardLister> {
    let fixed = phrases
        .iter()
        .map(|(label, text)| ListerItem::phrase(label, text))
        .collect();

    let date_time = [
        ("YYYY/MM/DD HH:MM:SS", "%Y/%m/%d %H:%M:%S"),
        ("YYYY/MM/DD", "%Y/%m/%d"),
        ("HH:MM:SS", "%H:%M:%S"),
        ("YYYYMMDD_HHMMSS", "%Y%m%d_%H%M%S"),
        ("YYYYMMDD", "%Y%m%d"),
        ("HHMMSS", "%H%M%S"),
    ]
    .iter()
    .map(|(label, format)| ListerItem::date_time(label, format))
    .collect();

    let others = vec![
        ListerItem::Transform(TextTransform::Quote),
        ListerItem::Transform(TextTransform::Indent),
        ListerItem::Transform(TextTransform::Unindent),
        ListerItem::Separator,
        ListerItem::Transform(TextTransform::ToHalfWidth),
        ListerItem::Transform(TextTransform::ToFullWidth),
        ListerItem::Separator,
        ListerItem::SaveToFile,
        ListerItem::Separator,
        ListerItem::Command(HostCommand::EditConfig),
        ListerItem::Command(HostCommand::ReloadConfig),
    ];

    vec![
        ClipboardLister {
            name: "Fixed phrase".to_string(),
            items: fixed,
        },
        ClipboardLister {
            name: "Date-time".to_string(),
            items: date_time,
        },
        ClipboardLister {
            name: "Others".to_string(),
            items: others,
        },
    ]
}

/// Local wall-clock time
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
