//! Wikitext template scanner
//!
//! Single byte-level pass for `{{…}}` that respects nesting of `{{ }}` and
//! `[[ ]]` and skips `<!-- -->` comments. Open templates live on an explicit
//! stack, each recording its own top-level `|` and `=` positions, so every
//! byte is visited once whatever the nesting depth. Only ASCII delimiters are
//! matched, so every slice boundary falls on a UTF-8 character boundary.

use super::{TemplateInstance, TemplateParser};
use crate::error::ParseError;
use crate::sanitize::strip_comments;
use std::ops::Range;

/// Largest text accepted by default (bytes)
const DEFAULT_MAX_LEN: usize = 4 * 1024 * 1024;

/// Deepest template nesting accepted by default (the wiki's own expansion limit)
const DEFAULT_MAX_DEPTH: usize = 40;

/// Built-in wikitext template parser
#[derive(Debug, Clone, Copy)]
pub struct WikitextParser {
    max_len: usize,
    max_depth: usize,
}

impl WikitextParser {
    /// Parser with the default size and nesting limits
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Reject text longer than `max_len` bytes
    #[inline]
    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Reject templates nested deeper than `max_depth`
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for WikitextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateParser for WikitextParser {
    fn parse_instances(&self, text: &str, recursive: bool) -> Result<Vec<TemplateInstance>, ParseError> {
        if text.len() > self.max_len {
            return Err(ParseError::TooLarge {
                size: text.len(),
                limit: self.max_len,
            });
        }
        let mut closed = scan(text, self.max_depth)?;
        closed.sort_by_key(|region| region.span.start);
        if !recursive {
            let mut outer_end = 0;
            closed.retain(|region| {
                let outermost = region.span.start >= outer_end;
                if outermost {
                    outer_end = region.span.end;
                }
                outermost
            });
        }
        let instances: Vec<_> = closed.iter().filter_map(|region| region.instance(text)).collect();
        tracing::debug!(count = instances.len(), recursive, "Parsed template instances");
        Ok(instances)
    }
}

/// A `{{` still waiting for its `}}`
#[derive(Debug)]
struct OpenTemplate {
    start: usize,
    links: usize,
    /// Top-level `|` positions
    bars: Vec<usize>,
    /// First top-level `=` after each bar
    equals: Vec<Option<usize>>,
}

impl OpenTemplate {
    fn new(start: usize) -> Self {
        Self {
            start,
            links: 0,
            bars: Vec::new(),
            equals: Vec::new(),
        }
    }

    fn close(self, end: usize) -> Region {
        Region {
            span: self.start..end,
            bars: self.bars,
            equals: self.equals,
        }
    }
}

/// A matched `{{…}}` with its top-level separators
#[derive(Debug)]
struct Region {
    span: Range<usize>,
    bars: Vec<usize>,
    equals: Vec<Option<usize>>,
}

impl Region {
    fn instance(&self, text: &str) -> Option<TemplateInstance> {
        let inner_end = self.span.end - 2;
        let name_end = self.bars.first().copied().unwrap_or(inner_end);
        let name = strip_comments(&text[self.span.start + 2..name_end]).trim().to_string();
        if name.is_empty() || name.starts_with(['#', '{']) || name.contains(['[', ']', '<', '>', '\n']) {
            return None;
        }

        let mut positional = 0usize;
        let params = self
            .bars
            .iter()
            .zip(&self.equals)
            .enumerate()
            .map(|(n, (&bar, equals))| {
                let end = self.bars.get(n + 1).copied().unwrap_or(inner_end);
                match *equals {
                    Some(eq) => (
                        strip_comments(&text[bar + 1..eq]).trim().to_string(),
                        text[eq + 1..end].trim().to_string(),
                    ),
                    None => {
                        positional += 1;
                        (positional.to_string(), text[bar + 1..end].trim().to_string())
                    }
                }
            })
            .collect();

        Some(TemplateInstance::new(name, self.span.clone(), params))
    }
}

/// Every matched template region, innermost first
///
/// An unmatched `{{` is dropped at the end of input; templates closed inside
/// it are still reported.
fn scan(text: &str, max_depth: usize) -> Result<Vec<Region>, ParseError> {
    let bytes = text.as_bytes();
    let mut open: Vec<OpenTemplate> = Vec::new();
    let mut closed = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        if rest.starts_with(b"<!--") {
            i = comment_end(bytes, i);
            continue;
        }
        if rest.starts_with(b"{{") {
            if open.len() == max_depth {
                return Err(ParseError::TooDeep {
                    offset: i,
                    limit: max_depth,
                });
            }
            open.push(OpenTemplate::new(i));
            i += 2;
            continue;
        }
        let Some(current) = open.last_mut() else {
            i += 1;
            continue;
        };
        if rest.starts_with(b"}}") {
            if let Some(template) = open.pop() {
                closed.push(template.close(i + 2));
            }
            i += 2;
        } else if rest.starts_with(b"[[") {
            current.links += 1;
            i += 2;
        } else if rest.starts_with(b"]]") && current.links > 0 {
            current.links -= 1;
            i += 2;
        } else {
            if current.links == 0 {
                match bytes[i] {
                    b'|' => {
                        current.bars.push(i);
                        current.equals.push(None);
                    }
                    b'=' => {
                        if let Some(slot) = current.equals.last_mut() {
                            slot.get_or_insert(i);
                        }
                    }
                    _ => {}
                }
            }
            i += 1;
        }
    }
    Ok(closed)
}

/// Index just past the comment starting at `start`, or the end of input
fn comment_end(bytes: &[u8], start: usize) -> usize {
    bytes[start + 4..]
        .windows(3)
        .position(|w| w == b"-->")
        .map_or(bytes.len(), |p| start + 4 + p + 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str, recursive: bool) -> Vec<TemplateInstance> {
        WikitextParser::new().parse_instances(text, recursive).unwrap()
    }

    fn pairs(instance: &TemplateInstance) -> Vec<(&str, &str)> {
        instance
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn parses_named_and_positional() {
        let text = "Intro {{Infobox journal\n| title = Journal of Tests\n| frequency=Monthly\n| stray\n}} outro";
        let instances = parse(text, false);
        assert_eq!(instances.len(), 1);
        let infobox = &instances[0];
        assert_eq!(infobox.name(), "Infobox journal");
        assert_eq!(&text[infobox.span()], &text[6..text.len() - 6]);
        assert_eq!(
            pairs(infobox),
            vec![
                ("title", "Journal of Tests"),
                ("frequency", "Monthly"),
                ("1", "stray")
            ]
        );
    }

    #[test]
    fn nested_values_stay_intact() {
        let text = "{{Infobox journal|ISSN={{ISSN|0001-0001}}|website=[[Foo|bar]]|note=a=b}}";
        let instances = parse(text, false);
        assert_eq!(instances.len(), 1);
        assert_eq!(
            pairs(&instances[0]),
            vec![
                ("ISSN", "{{ISSN|0001-0001}}"),
                ("website", "[[Foo|bar]]"),
                ("note", "a=b")
            ]
        );
    }

    #[test]
    fn recursive_returns_nested_after_parent() {
        let text = "{{Infobox journal|ISSN={{ISSN|0001-0001}}}} {{eISSN|0002-0002}}";
        let instances = parse(text, true);
        let names: Vec<_> = instances.iter().map(TemplateInstance::name).collect();
        assert_eq!(names, vec!["Infobox journal", "ISSN", "eISSN"]);
        assert_eq!(&text[instances[1].span()], "{{ISSN|0001-0001}}");
        assert_eq!(instances[1].param("1"), Some("0001-0001"));
        assert_eq!(&text[instances[2].span()], "{{eISSN|0002-0002}}");
    }

    #[test]
    fn comments_are_skipped() {
        let text = "<!-- {{Not a template}} -->{{Real| a = 1 <!-- | b = 2 -->}}";
        let instances = parse(text, true);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name(), "Real");
        assert_eq!(pairs(&instances[0]), vec![("a", "1 <!-- | b = 2 -->")]);
    }

    #[test]
    fn parser_functions_and_broken_templates_are_ignored() {
        assert!(parse("{{#if: x | y }}", true).is_empty());
        assert!(parse("{{Broken | a = 1", true).is_empty());
    }

    #[test]
    fn duplicates_are_preserved() {
        let instances = parse("{{T|title=A|title=B}}", false);
        assert_eq!(pairs(&instances[0]), vec![("title", "A"), ("title", "B")]);
    }

    #[test]
    fn multibyte_text_is_sliced_safely() {
        let text = "Été {{Infobox journal|title=Économie appliquée}} fin";
        let instances = parse(text, false);
        assert_eq!(instances[0].param("title"), Some("Économie appliquée"));
        assert!(text[instances[0].span()].starts_with("{{"));
    }

    #[test]
    fn rejects_oversized_text() {
        let err = WikitextParser::new()
            .with_max_len(4)
            .parse_instances("{{abc}}", false)
            .unwrap_err();
        assert_eq!(err, ParseError::TooLarge { size: 7, limit: 4 });
    }

    fn nested(depth: usize) -> String {
        "{{a|".repeat(depth) + &"}}".repeat(depth)
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let text = nested(100_000);
        let err = WikitextParser::new().parse_instances(&text, true).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooDeep {
                offset: 4 * DEFAULT_MAX_DEPTH,
                limit: DEFAULT_MAX_DEPTH
            }
        );
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let text = nested(DEFAULT_MAX_DEPTH);
        let instances = parse(&text, true);
        assert_eq!(instances.len(), DEFAULT_MAX_DEPTH);
        assert_eq!(instances[0].span(), 0..text.len());
        let innermost = &instances[DEFAULT_MAX_DEPTH - 1];
        assert_eq!(&text[innermost.span()], "{{a|}}");
        assert_eq!(innermost.param("1"), Some(""));

        let outer = parse(&text, false);
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].param("1"), Some(&text[4..text.len() - 2]));
    }

    #[test]
    fn custom_depth_limit() {
        let parser = WikitextParser::new().with_max_depth(2);
        assert!(parser.parse_instances("{{a|{{b}}}}", true).is_ok());
        assert!(matches!(
            parser.parse_instances("{{a|{{b|{{c}}}}}}", true),
            Err(ParseError::TooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn unclosed_template_keeps_inner_ones() {
        let text = "{{Broken | {{ISSN|0001-0001}} and more";
        let instances = parse(text, false);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].name(), "ISSN");
        assert_eq!(&text[instances[0].span()], "{{ISSN|0001-0001}}");
    }
}
