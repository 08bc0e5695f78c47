//! Canonical template text emission

use crate::key::ParamKey;
use crate::schema::Schema;
use std::fmt::Write as _;

/// Column width display keys are padded to
pub const KEY_COLUMN_WIDTH: usize = 14;

impl Schema {
    /// Render a final selection as canonical template text
    ///
    /// `final_values` maps canonical keys to `(display key, display value)`.
    /// Entries are rendered in [`Schema::order`] order, one `| key = value`
    /// line each, with keys padded to [`KEY_COLUMN_WIDTH`].
    #[must_use]
    pub fn emit(
        &self,
        final_values: impl IntoIterator<Item = (ParamKey, (String, String))>,
        name: &str,
    ) -> String {
        self.emit_with_width(final_values, name, KEY_COLUMN_WIDTH)
    }

    /// [`Schema::emit`] with an explicit key column width
    #[must_use]
    pub fn emit_with_width(
        &self,
        final_values: impl IntoIterator<Item = (ParamKey, (String, String))>,
        name: &str,
        width: usize,
    ) -> String {
        let mut out = format!("{{{{{}\n", name.trim());
        for (canonical, (display_key, value)) in self.order(final_values) {
            let key = display_key.trim();
            if !is_emittable_key(key) {
                tracing::warn!(
                    template = name,
                    canonical = %canonical,
                    key = display_key.as_str(),
                    "Rejected parameter key at emission"
                );
                continue;
            }
            let mut line = String::new();
            // Writing into a String cannot fail
            let _ = write!(line, "| {key:<width$} = {}", value.trim());
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str("}}");
        out
    }
}

/// Check if a key can be written back into template syntax unchanged
fn is_emittable_key(key: &str) -> bool {
    !key.is_empty()
        && !key.contains(['|', '=', '{', '}', '\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ParameterDefinition;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::new(
            "Infobox journal",
            [
                ParameterDefinition::new("title"),
                ParameterDefinition::new("frequency"),
                ParameterDefinition::new("abbreviation"),
            ],
            ["title", "frequency"],
        )
        .unwrap()
    }

    fn entry(key: &str, display: &str, value: &str) -> (ParamKey, (String, String)) {
        (ParamKey::new(key), (display.to_string(), value.to_string()))
    }

    #[test]
    fn emits_in_declared_order_with_padding() {
        let text = schema().emit(
            vec![
                entry("abbreviation", "abbreviation", "J. Test"),
                entry("frequency", "frequency", " Quarterly "),
                entry("title", "title", "Journal of Tests"),
            ],
            "Infobox journal",
        );
        assert_eq!(
            text,
            "{{Infobox journal\n\
             | title          = Journal of Tests\n\
             | frequency      = Quarterly\n\
             | abbreviation   = J. Test\n\
             }}"
        );
    }

    #[test]
    fn empty_value_has_no_trailing_space() {
        let text = schema().emit(vec![entry("title", "title", "")], "T");
        assert_eq!(text, "{{T\n| title          =\n}}");
    }

    #[test]
    fn long_keys_are_not_truncated() {
        let text = schema().emit(vec![entry("x", "a_very_long_parameter", "v")], "T");
        assert!(text.contains("| a_very_long_parameter = v\n"));
    }

    #[test]
    fn rejects_keys_that_break_syntax() {
        let text = schema().emit(
            vec![
                entry("a", "a|b", "1"),
                entry("b", "", "2"),
                entry("c", "c", "3"),
            ],
            "T",
        );
        assert_eq!(text, "{{T\n| c              = 3\n}}");
    }

    #[test]
    fn positional_keys_are_emitted() {
        let text = schema().emit(vec![entry("1", "1", "first")], "T");
        assert_eq!(text, "{{T\n| 1              = first\n}}");
    }

    #[test]
    fn custom_width() {
        let text = schema().emit_with_width(vec![entry("title", "title", "X")], "T", 6);
        assert_eq!(text, "{{T\n| title  = X\n}}");
    }
}
